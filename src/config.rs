use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reward for each anchor/companion pair placed at the same target.
pub const DEFAULT_REWARD: f64 = 100.0;
pub const DEFAULT_COUNTRY: &str = "Netherlands";

/// Which objective the model is built with. The variants are alternatives,
/// never a fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Objective {
    /// Minimise the total distance travelled.
    MinDistance,
    /// Minimise the squared deviation of each trip from the candidate mean.
    Balanced,
    /// Minimise total distance minus a reward for every co-located affinity pair.
    #[default]
    Social,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::MinDistance => write!(f, "min-distance"),
            Objective::Balanced => write!(f, "balanced"),
            Objective::Social => write!(f, "social"),
        }
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min-distance" => Ok(Objective::MinDistance),
            "balanced" => Ok(Objective::Balanced),
            "social" => Ok(Objective::Social),
            other => Err(format!(
                "unknown objective {other:?}, expected min-distance, balanced or social"
            )),
        }
    }
}

/// Run settings, read from the `settings:` section of a problem file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub objective: Objective,

    /// Subtracted from the objective for every realized affinity pair. Should
    /// exceed any single distance so distance never outweighs it.
    pub reward: f64,

    /// Pairs farther apart than this get no decision variable at all.
    #[serde(rename = "maxDistance", alias = "max_distance")]
    pub max_distance: Option<f64>,

    /// Solver time limit in seconds.
    #[serde(rename = "timeLimit", alias = "time_limit")]
    pub time_limit: Option<f64>,

    /// Reject unknown names in dislike/friend lists instead of dropping them.
    #[serde(rename = "strictReferences", alias = "strict_references")]
    pub strict_references: bool,

    /// Country appended to employee geocoding queries.
    pub country: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            objective: Objective::default(),
            reward: DEFAULT_REWARD,
            max_distance: None,
            time_limit: None,
            strict_references: false,
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl Settings {
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_reward(mut self, reward: f64) -> Self {
        self.reward = reward;
        self
    }

    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_yaml::from_str("objective: balanced\n").unwrap();
        assert_eq!(settings.objective, Objective::Balanced);
        assert_eq!(settings.reward, DEFAULT_REWARD);
        assert_eq!(settings.max_distance, None);
        assert!(!settings.strict_references);
        assert_eq!(settings.country, DEFAULT_COUNTRY);
    }

    #[test]
    fn camel_case_keys_are_accepted() {
        let settings: Settings =
            serde_yaml::from_str("timeLimit: 2.5\nmaxDistance: 40\nstrictReferences: true\n")
                .unwrap();
        assert_eq!(settings.time_limit, Some(2.5));
        assert_eq!(settings.max_distance, Some(40.0));
        assert!(settings.strict_references);
    }

    #[rstest]
    #[case("min-distance", Objective::MinDistance)]
    #[case("balanced", Objective::Balanced)]
    #[case("social", Objective::Social)]
    fn objective_parses_from_its_display_name(#[case] name: &str, #[case] expected: Objective) {
        assert_eq!(name.parse::<Objective>().unwrap(), expected);
        assert_eq!(expected.to_string(), name);
    }

    #[test]
    fn unknown_objective_is_rejected() {
        assert!("fastest".parse::<Objective>().is_err());
    }
}
