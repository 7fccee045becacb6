use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::Objective;
use crate::error::Result;
use crate::model::{Instance, Outcome};
use crate::resolve::UnresolvedReference;
use crate::types::{EmployeeId, TargetId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    pub employee: EmployeeId,
    pub name: String,
    pub target: TargetId,
    pub address: String,
    pub distance: f64,
}

/// Human-facing summary of a solved run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub objective: Objective,
    /// Employee id to target number, `~` for unassigned.
    pub solution: BTreeMap<EmployeeId, Option<TargetId>>,
    pub lines: Vec<ReportLine>,
    pub unassigned: Vec<String>,
    #[serde(rename = "totalDistance")]
    pub total_distance: f64,
    #[serde(rename = "meanDistance")]
    pub mean_distance: f64,
    #[serde(rename = "maxDistance")]
    pub max_distance: f64,
    #[serde(rename = "affinityPairs")]
    pub affinity_pairs: usize,
    #[serde(rename = "droppedReferences", default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_references: Vec<String>,
}

impl Report {
    pub fn new(instance: &Instance, outcome: &Outcome) -> Self {
        let names: BTreeMap<EmployeeId, &str> = instance
            .employees()
            .iter()
            .map(|e| (e.id, e.name.as_str()))
            .collect();
        let addresses: BTreeMap<TargetId, &str> = instance
            .targets()
            .iter()
            .map(|t| (t.number, t.address.as_str()))
            .collect();

        let lines = outcome
            .placements
            .iter()
            .map(|p| ReportLine {
                employee: p.employee,
                name: names.get(&p.employee).copied().unwrap_or_default().to_string(),
                target: p.target,
                address: addresses.get(&p.target).copied().unwrap_or_default().to_string(),
                distance: p.distance,
            })
            .collect();

        let unassigned = outcome
            .assignments
            .iter()
            .filter(|(_, target)| target.is_none())
            .map(|(id, _)| names.get(id).copied().unwrap_or_default().to_string())
            .collect();

        Self {
            objective: outcome.objective,
            solution: outcome.assignments.clone(),
            lines,
            unassigned,
            total_distance: outcome.total_distance,
            mean_distance: outcome.mean_distance,
            max_distance: outcome.max_distance,
            affinity_pairs: outcome.affinity_pairs,
            dropped_references: Vec::new(),
        }
    }

    pub fn with_dropped_references(mut self, unresolved: &[UnresolvedReference]) -> Self {
        self.dropped_references = unresolved
            .iter()
            .map(|r| format!("{} {:?} of employee {}", r.kind, r.name, r.employee))
            .collect();
        self
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Assignment found ({})", self.objective)?;
        for line in &self.lines {
            writeln!(
                f,
                "employee {} assigned to target {} - {} (distance = {:.2} km)",
                line.name, line.target, line.address, line.distance
            )?;
        }
        if !self.unassigned.is_empty() {
            writeln!(f, "unassigned: {}", self.unassigned.join(", "))?;
        }
        for dropped in &self.dropped_references {
            writeln!(f, "ignored {dropped}")?;
        }
        if self.affinity_pairs > 0 {
            writeln!(f, "preferred pairs placed together: {}", self.affinity_pairs)?;
        }
        match self.objective {
            Objective::Balanced => write!(f, "average distance: {:.2} km", self.mean_distance),
            Objective::MinDistance | Objective::Social => {
                write!(f, "total distance: {:.2} km", self.total_distance)
            }
        }
    }
}
