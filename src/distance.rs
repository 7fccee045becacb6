use crate::error::{AssignError, Result};
use crate::types::{
    Coordinate, DistanceEntry, Employee, EmployeeId, Target, TargetId, employee_index,
    target_index,
};

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres. Ignores roads entirely.
pub fn haversine(from: Coordinate, to: Coordinate) -> f64 {
    let dlat = (to.lat - from.lat).to_radians();
    let dlon = (to.lon - from.lon).to_radians();
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Dense employee × target distances, indexed by position in the employee
/// and target slices it was built from. The ids are kept in that order so a
/// matrix can be checked against the slices it is used with.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    employee_ids: Vec<EmployeeId>,
    target_ids: Vec<TargetId>,
    cells: Vec<f64>,
}

impl DistanceMatrix {
    /// Build the matrix from explicit entries. Every (employee, target) pair
    /// must appear exactly once; a gap is an error rather than a zero.
    pub fn from_entries(
        employees: &[Employee],
        targets: &[Target],
        entries: impl IntoIterator<Item = DistanceEntry>,
    ) -> Result<Self> {
        let employee_positions = employee_index(employees)?;
        let target_positions = target_index(targets)?;
        let width = targets.len();
        let mut cells: Vec<Option<f64>> = vec![None; employees.len() * width];

        for entry in entries {
            let e = *employee_positions
                .get(&entry.employee)
                .ok_or(AssignError::UnknownEmployee(entry.employee))?;
            let t = *target_positions
                .get(&entry.target)
                .ok_or(AssignError::UnknownTarget(entry.target))?;

            if !entry.distance.is_finite() || entry.distance < 0.0 {
                return Err(AssignError::InvalidDistance {
                    employee: entry.employee,
                    target: entry.target,
                    distance: entry.distance,
                });
            }

            let cell = &mut cells[e * width + t];
            if cell.is_some() {
                return Err(AssignError::DuplicateDistance {
                    employee: entry.employee,
                    target: entry.target,
                });
            }
            *cell = Some(entry.distance);
        }

        let cells = cells
            .into_iter()
            .enumerate()
            .map(|(i, cell)| {
                cell.ok_or(AssignError::MissingDistance {
                    employee: employees[i / width].id,
                    target: targets[i % width].number,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            employee_ids: employees.iter().map(|e| e.id).collect(),
            target_ids: targets.iter().map(|t| t.number).collect(),
            cells,
        })
    }

    /// Compute every distance with [`haversine`]. All locations must be known.
    pub fn haversine(employees: &[Employee], targets: &[Target]) -> Result<Self> {
        let mut entries = Vec::with_capacity(employees.len() * targets.len());
        for target in targets {
            let target_location = target
                .location
                .ok_or_else(|| AssignError::MissingCoordinate(format!("target {}", target.number)))?;
            for employee in employees {
                let employee_location = employee.location.ok_or_else(|| {
                    AssignError::MissingCoordinate(format!(
                        "employee {} ({})",
                        employee.id, employee.name
                    ))
                })?;
                entries.push(DistanceEntry::new(
                    employee.id,
                    target.number,
                    haversine(employee_location, target_location),
                ));
            }
        }
        Self::from_entries(employees, targets, entries)
    }

    pub fn employees(&self) -> usize {
        self.employee_ids.len()
    }

    pub fn targets(&self) -> usize {
        self.target_ids.len()
    }

    pub fn employee_ids(&self) -> &[EmployeeId] {
        &self.employee_ids
    }

    pub fn target_ids(&self) -> &[TargetId] {
        &self.target_ids
    }

    /// True when rows follow `employees` and columns follow `targets`.
    pub fn is_laid_out_for(&self, employees: &[Employee], targets: &[Target]) -> bool {
        self.employee_ids.iter().eq(employees.iter().map(|e| &e.id))
            && self.target_ids.iter().eq(targets.iter().map(|t| &t.number))
    }

    #[inline]
    pub fn get(&self, employee: usize, target: usize) -> f64 {
        self.cells[employee * self.targets() + target]
    }

    /// Mean over every candidate pair, not just the realized ones.
    pub fn mean(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().sum::<f64>() / self.cells.len() as f64
    }

    pub fn max(&self) -> f64 {
        self.cells.iter().copied().fold(0.0, f64::max)
    }
}
