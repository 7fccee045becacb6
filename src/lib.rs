pub mod cbc;
pub mod config;
pub mod distance;
pub mod engine;
pub mod error;
pub mod geocode;
pub mod lp;
pub mod model;
pub mod report;
pub mod resolve;
pub mod types;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

pub use cbc::CbcEngine;
pub use config::{Objective, Settings};
pub use distance::DistanceMatrix;
pub use engine::{Engine, EngineSolution, SolveStatus};
pub use error::{AssignError, Result};
pub use geocode::{Geocoder, PlaceBook};
pub use model::{AssignmentModel, Instance, Outcome, Placement, assign};
pub use report::Report;
pub use resolve::{Resolution, resolve};
pub use types::{
    AffinityGroup, ConflictPair, Coordinate, DistanceEntry, Employee, EmployeeId, Target, TargetId,
};

/// A complete problem file: settings, people, locations and optionally the
/// distances between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    #[serde(default)]
    pub settings: Settings,
    pub employees: Vec<Employee>,
    pub targets: Vec<Target>,
    /// Known coordinates for geocoding queries.
    #[serde(default, skip_serializing_if = "PlaceBook::is_empty")]
    pub places: PlaceBook,
    /// Employee id to target number to distance. Computed from coordinates
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distances: Option<BTreeMap<EmployeeId, BTreeMap<TargetId, f64>>>,
}

impl Problem {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Geocode, resolve references and build the distance matrix.
    pub fn prepare(&self) -> Result<(Instance, Resolution)> {
        let mut employees = self.employees.clone();
        let mut targets = self.targets.clone();
        info!(
            employees = employees.len(),
            targets = targets.len(),
            "preparing problem"
        );

        let resolution = resolve(&employees, self.settings.strict_references)?;

        let distances = match &self.distances {
            Some(table) => {
                let entries = table.iter().flat_map(|(&employee, row)| {
                    row.iter().map(move |(&target, &distance)| {
                        DistanceEntry::new(employee, target, distance)
                    })
                });
                DistanceMatrix::from_entries(&employees, &targets, entries)?
            }
            None => {
                geocode::geocode_all(
                    &self.places,
                    &mut employees,
                    &mut targets,
                    &self.settings.country,
                );
                DistanceMatrix::haversine(&employees, &targets)?
            }
        };

        let instance = Instance::new(
            employees,
            targets,
            distances,
            resolution.conflicts.clone(),
            resolution.affinities.clone(),
        )?;
        Ok((instance, resolution))
    }

    /// Solve with CBC, honouring the configured time limit.
    pub fn solve(&self) -> Result<Report> {
        let engine = match self.settings.time_limit {
            Some(seconds) => CbcEngine::new().with_time_limit(seconds),
            None => CbcEngine::new(),
        };
        self.solve_with(&engine)
    }

    pub fn solve_with(&self, engine: &impl Engine) -> Result<Report> {
        let (instance, resolution) = self.prepare()?;
        let outcome = assign(&instance, &self.settings, engine)?;
        Ok(Report::new(&instance, &outcome).with_dropped_references(&resolution.unresolved))
    }
}
