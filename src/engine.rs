use crate::lp::{LinearModel, VarId};

#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    /// Stopped by the time limit before optimality was proven.
    TimedOut,
    Other(String),
}

/// What an engine hands back. Values are only readable after an optimal solve.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSolution {
    status: SolveStatus,
    values: Vec<f64>,
    objective: f64,
}

impl EngineSolution {
    pub fn optimal(values: Vec<f64>, objective: f64) -> Self {
        Self {
            status: SolveStatus::Optimal,
            values,
            objective,
        }
    }

    pub fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: f64::NAN,
        }
    }

    pub fn status(&self) -> &SolveStatus {
        &self.status
    }

    pub fn value(&self, var: VarId) -> Option<f64> {
        match self.status {
            SolveStatus::Optimal => self.values.get(var.index()).copied(),
            _ => None,
        }
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }
}

/// A mixed-integer solver that can run a [`LinearModel`] to completion.
pub trait Engine {
    fn solve(&self, model: &LinearModel) -> EngineSolution;
}
