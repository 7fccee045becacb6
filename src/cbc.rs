use good_lp::solvers::coin_cbc::{CoinCbcProblem, coin_cbc};
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus, SolverModel,
    Variable, WithTimeLimit, variable, variables,
};
use tracing::debug;

use crate::engine::{Engine, EngineSolution, SolveStatus};
use crate::lp::{LinearModel, Row, Sense};

/// Solves a [`LinearModel`] with COIN-OR CBC through `good_lp`.
#[derive(Debug, Clone, Default)]
pub struct CbcEngine {
    time_limit: Option<f64>,
}

impl CbcEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after `seconds`, rounded up to whole seconds by CBC. A stopped
    /// solve is reported as [`SolveStatus::TimedOut`], never as optimal.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }
}

impl Engine for CbcEngine {
    fn solve(&self, model: &LinearModel) -> EngineSolution {
        let (problem_vars, handles) = init_variables(model);
        let objective = create_objective_function(model, &handles);
        let cbc = create_model(problem_vars, objective, model.sense(), self.time_limit);
        let cbc = model
            .rows()
            .iter()
            .fold(cbc, |m, row| add_row(m, row, &handles));

        match cbc.solve() {
            Ok(solution) => match solution.status() {
                SolutionStatus::Optimal => {
                    let values: Vec<f64> = handles.iter().map(|&v| solution.value(v)).collect();
                    let objective = model.evaluate(&values);
                    debug!(objective, "cbc finished");
                    EngineSolution::optimal(values, objective)
                }
                SolutionStatus::TimeLimit => EngineSolution::failed(SolveStatus::TimedOut),
                SolutionStatus::GapLimit => {
                    EngineSolution::failed(SolveStatus::Other("stopped on gap".into()))
                }
            },
            Err(ResolutionError::Infeasible) => EngineSolution::failed(SolveStatus::Infeasible),
            Err(e) => EngineSolution::failed(SolveStatus::Other(e.to_string())),
        }
    }
}

fn init_variables(model: &LinearModel) -> (ProblemVariables, Vec<Variable>) {
    let mut problem_vars = variables!();
    let handles = model
        .variables()
        .map(|var| problem_vars.add(variable().binary().name(model.name(var))))
        .collect();
    (problem_vars, handles)
}

fn create_objective_function(model: &LinearModel, handles: &[Variable]) -> Expression {
    model
        .variables()
        .map(|var| (handles[var.index()], model.objective_coefficient(var)))
        .filter(|&(_, coefficient)| coefficient != 0.0)
        .fold(Expression::from(0.0), |sum, (handle, coefficient)| {
            sum + handle * coefficient
        })
}

fn create_model(
    variables: ProblemVariables,
    objective: Expression,
    sense: Sense,
    time_limit: Option<f64>,
) -> CoinCbcProblem {
    let mut model = match sense {
        Sense::Minimize => variables.minimise(objective).using(coin_cbc),
        Sense::Maximize => variables.maximise(objective).using(coin_cbc),
    };
    #[cfg(not(debug_assertions))]
    model.set_parameter("loglevel", "0");
    match time_limit {
        Some(seconds) => model.with_time_limit(seconds),
        None => model,
    }
}

fn add_row<Model: SolverModel>(model: Model, row: &Row, handles: &[Variable]) -> Model {
    let lhs = row
        .terms()
        .iter()
        .fold(Expression::from(0.0), |sum, &(var, coefficient)| {
            sum + handles[var.index()] * coefficient
        });

    if row.is_equality() {
        return model.with(lhs.eq(row.lower));
    }

    let model = if row.lower.is_finite() {
        model.with(lhs.clone().geq(row.lower))
    } else {
        model
    };
    if row.upper.is_finite() {
        model.with(lhs.leq(row.upper))
    } else {
        model
    }
}
