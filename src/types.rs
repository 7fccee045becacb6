use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AssignError, Result};

pub type EmployeeId = u32;
pub type TargetId = u32;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    /// Home location, `None` until geocoded.
    #[serde(default)]
    pub location: Option<Coordinate>,
    /// Names of people this employee must not share a target with.
    #[serde(default)]
    pub dislikes: Vec<String>,
    /// Names of people this employee would like to share a target with.
    #[serde(default)]
    pub friends: Vec<String>,
}

impl Employee {
    pub fn new(id: EmployeeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: String::new(),
            city: String::new(),
            location: None,
            dislikes: Vec::new(),
            friends: Vec::new(),
        }
    }

    pub fn at(mut self, location: Coordinate) -> Self {
        self.location = Some(location);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub number: TargetId,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    /// Exact headcount this location needs.
    pub required: u32,
    #[serde(default)]
    pub location: Option<Coordinate>,
}

impl Target {
    pub fn new(number: TargetId, required: u32) -> Self {
        Self {
            number,
            address: String::new(),
            city: String::new(),
            country: String::new(),
            required,
            location: None,
        }
    }

    pub fn at(mut self, location: Coordinate) -> Self {
        self.location = Some(location);
        self
    }
}

/// One cell of the employee × target distance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceEntry {
    pub employee: EmployeeId,
    pub target: TargetId,
    pub distance: f64,
}

impl DistanceEntry {
    pub fn new(employee: EmployeeId, target: TargetId, distance: f64) -> Self {
        Self {
            employee,
            target,
            distance,
        }
    }
}

/// Two employees that must never be placed at the same target. Unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConflictPair(pub EmployeeId, pub EmployeeId);

impl ConflictPair {
    /// The pair with its smaller id first, so `(a, b)` and `(b, a)` compare equal.
    pub fn normalized(self) -> Self {
        if self.0 <= self.1 {
            self
        } else {
            ConflictPair(self.1, self.0)
        }
    }

    pub fn is_self_pair(&self) -> bool {
        self.0 == self.1
    }
}

/// An anchor employee and the companions it is rewarded for sharing a target with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityGroup {
    pub anchor: EmployeeId,
    pub companions: Vec<EmployeeId>,
}

impl AffinityGroup {
    pub fn new(anchor: EmployeeId, companions: impl IntoIterator<Item = EmployeeId>) -> Self {
        Self {
            anchor,
            companions: companions.into_iter().collect(),
        }
    }
}

/// Map every employee id to its position, rejecting duplicate ids.
pub(crate) fn employee_index(employees: &[Employee]) -> Result<HashMap<EmployeeId, usize>> {
    let mut index = HashMap::with_capacity(employees.len());
    for (position, employee) in employees.iter().enumerate() {
        if index.insert(employee.id, position).is_some() {
            return Err(AssignError::DuplicateEmployee(employee.id));
        }
    }
    Ok(index)
}

/// Map every target number to its position, rejecting duplicate numbers.
pub(crate) fn target_index(targets: &[Target]) -> Result<HashMap<TargetId, usize>> {
    let mut index = HashMap::with_capacity(targets.len());
    for (position, target) in targets.iter().enumerate() {
        if index.insert(target.number, position).is_some() {
            return Err(AssignError::DuplicateTarget(target.number));
        }
    }
    Ok(index)
}
