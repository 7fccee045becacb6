use thiserror::Error;

use crate::types::{EmployeeId, TargetId};

#[derive(Debug, Error)]
pub enum AssignError {
    #[error(
        "Not enough resources: targets require {required} employees but only {available} are available"
    )]
    NotEnoughEmployees { required: u64, available: usize },

    #[error("Target {0} must require at least one employee")]
    ZeroDemand(TargetId),

    #[error("Employee id {0} is used more than once")]
    DuplicateEmployee(EmployeeId),

    #[error("Target number {0} is used more than once")]
    DuplicateTarget(TargetId),

    #[error("Distance entry refers to unknown employee {0}")]
    UnknownEmployee(EmployeeId),

    #[error("Distance entry refers to unknown target {0}")]
    UnknownTarget(TargetId),

    #[error("No distance between employee {employee} and target {target}")]
    MissingDistance {
        employee: EmployeeId,
        target: TargetId,
    },

    #[error("Distance between employee {employee} and target {target} is given twice")]
    DuplicateDistance {
        employee: EmployeeId,
        target: TargetId,
    },

    #[error("Distance {distance} between employee {employee} and target {target} is not a finite non-negative number")]
    InvalidDistance {
        employee: EmployeeId,
        target: TargetId,
        distance: f64,
    },

    #[error(
        "Distance matrix is {rows}x{columns} but there are {employees} employees and {targets} targets"
    )]
    MatrixShape {
        rows: usize,
        columns: usize,
        employees: usize,
        targets: usize,
    },

    #[error("Distance matrix was built for a different employee or target order")]
    MatrixOrder,

    #[error("No coordinate known for {0}")]
    MissingCoordinate(String),

    #[error("Employee {employee} refers to unknown person {name:?}")]
    UnresolvedReference { employee: EmployeeId, name: String },

    #[error("No solution found: the constraints cannot all be satisfied")]
    Infeasible,

    #[error("Solver hit the time limit of {seconds}s before proving optimality")]
    TimedOut { seconds: f64 },

    #[error("Solver failed: {0}")]
    Solver(String),

    #[error("Variable {variable} has non-integral value {value}")]
    FractionalValue { variable: String, value: f64 },

    #[error("Solver returned an inconsistent assignment: {0}")]
    InconsistentSolution(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, AssignError>;
