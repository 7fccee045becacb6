use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::{Objective, Settings};
use crate::distance::DistanceMatrix;
use crate::engine::{Engine, EngineSolution, SolveStatus};
use crate::error::{AssignError, Result};
use crate::lp::{LinearModel, VarId, link_and};
use crate::types::{
    AffinityGroup, ConflictPair, DistanceEntry, Employee, EmployeeId, Target, TargetId,
    employee_index, target_index,
};

/// Solved values further than this from 0 or 1 are a modeling or solver fault.
pub const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Validated input for one assignment run.
#[derive(Debug, Clone)]
pub struct Instance {
    employees: Vec<Employee>,
    targets: Vec<Target>,
    distances: DistanceMatrix,
    conflicts: Vec<ConflictPair>,
    affinities: Vec<AffinityGroup>,
    employee_index: HashMap<EmployeeId, usize>,
    target_index: HashMap<TargetId, usize>,
}

impl Instance {
    pub fn new(
        employees: Vec<Employee>,
        targets: Vec<Target>,
        distances: DistanceMatrix,
        conflicts: Vec<ConflictPair>,
        affinities: Vec<AffinityGroup>,
    ) -> Result<Self> {
        let employee_index = employee_index(&employees)?;
        let target_index = target_index(&targets)?;

        if let Some(target) = targets.iter().find(|t| t.required == 0) {
            return Err(AssignError::ZeroDemand(target.number));
        }
        if distances.employees() != employees.len() || distances.targets() != targets.len() {
            return Err(AssignError::MatrixShape {
                rows: distances.employees(),
                columns: distances.targets(),
                employees: employees.len(),
                targets: targets.len(),
            });
        }
        if !distances.is_laid_out_for(&employees, &targets) {
            return Err(AssignError::MatrixOrder);
        }

        Ok(Self {
            employees,
            targets,
            distances,
            conflicts,
            affinities,
            employee_index,
            target_index,
        })
    }

    /// Like [`Instance::new`], building the matrix from explicit entries.
    pub fn from_entries(
        employees: Vec<Employee>,
        targets: Vec<Target>,
        entries: impl IntoIterator<Item = DistanceEntry>,
        conflicts: Vec<ConflictPair>,
        affinities: Vec<AffinityGroup>,
    ) -> Result<Self> {
        let distances = DistanceMatrix::from_entries(&employees, &targets, entries)?;
        Self::new(employees, targets, distances, conflicts, affinities)
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    pub fn required(&self) -> u64 {
        self.targets.iter().map(|t| u64::from(t.required)).sum()
    }

    /// Fail fast when the targets need more people than there are.
    pub fn check_capacity(&self) -> Result<()> {
        let required = self.required();
        if required > self.employees.len() as u64 {
            return Err(AssignError::NotEnoughEmployees {
                required,
                available: self.employees.len(),
            });
        }
        Ok(())
    }
}

/// The anchor/companion/target triple behind one affinity indicator.
#[derive(Debug, Clone, Copy)]
struct AffinityLink {
    anchor: usize,
    companion: usize,
    target: usize,
    var: VarId,
}

/// One model over one [`Instance`]. Built, solved once, then dropped.
#[derive(Debug)]
pub struct AssignmentModel<'a> {
    instance: &'a Instance,
    objective: Objective,
    time_limit: Option<f64>,
    lp: LinearModel,
    assign: Vec<Option<VarId>>,
    links: Vec<AffinityLink>,
    candidate_mean: f64,
}

impl<'a> AssignmentModel<'a> {
    pub fn build(instance: &'a Instance, settings: &Settings) -> Result<Self> {
        instance.check_capacity()?;

        let mut model = Self {
            instance,
            objective: settings.objective,
            time_limit: settings.time_limit,
            lp: LinearModel::new(),
            assign: Vec::new(),
            links: Vec::new(),
            candidate_mean: instance.distances.mean(),
        };

        model.init_variables(settings.max_distance);
        model.check_eligible_headcount()?;
        model.constrain_at_most_one_target();
        model.constrain_demand_met();
        model.constrain_conflicts();

        match settings.objective {
            Objective::MinDistance => model.minimize_distance(),
            Objective::Balanced => model.minimize_deviation(),
            Objective::Social => {
                model.minimize_distance();
                model.reward_affinities(settings.reward);
            }
        }
        model.lp.set_minimize();

        debug!(objective = %model.objective, model = %model.lp, "built assignment model");
        Ok(model)
    }

    pub fn lp(&self) -> &LinearModel {
        &self.lp
    }

    /// The decision variable for a pair of positions, if that pair is eligible.
    pub fn assignment_var(&self, employee: usize, target: usize) -> Option<VarId> {
        self.assign[employee * self.width() + target]
    }

    /// The decision variable for a pair of ids, if both exist and the pair is eligible.
    pub fn assignment_var_by_id(&self, employee: EmployeeId, target: TargetId) -> Option<VarId> {
        let e = *self.instance.employee_index.get(&employee)?;
        let t = *self.instance.target_index.get(&target)?;
        self.assignment_var(e, t)
    }

    pub fn affinity_links(&self) -> usize {
        self.links.len()
    }

    fn width(&self) -> usize {
        self.instance.targets.len()
    }

    fn init_variables(&mut self, max_distance: Option<f64>) {
        let distances = &self.instance.distances;
        let width = self.width();
        self.assign = Vec::with_capacity(self.instance.employees.len() * width);

        for e in 0..self.instance.employees.len() {
            for t in 0..width {
                let eligible = max_distance.is_none_or(|radius| distances.get(e, t) <= radius);
                let var = eligible.then(|| self.lp.add_binary(format!("x_{e}_{t}")));
                self.assign.push(var);
            }
        }
    }

    /// A target that cannot possibly reach its headcount makes the whole
    /// model infeasible; no need to ask the engine.
    fn check_eligible_headcount(&self) -> Result<()> {
        for (t, target) in self.instance.targets.iter().enumerate() {
            let eligible = (0..self.instance.employees.len())
                .filter(|&e| self.assignment_var(e, t).is_some())
                .count();
            if (eligible as u64) < u64::from(target.required) {
                debug!(
                    number = target.number,
                    eligible,
                    required = target.required,
                    "not enough eligible employees for target"
                );
                return Err(AssignError::Infeasible);
            }
        }
        Ok(())
    }

    fn constrain_at_most_one_target(&mut self) {
        for e in 0..self.instance.employees.len() {
            let vars: Vec<VarId> = (0..self.width())
                .filter_map(|t| self.assignment_var(e, t))
                .collect();
            if !vars.is_empty() {
                self.lp.add_sum_row(vars, f64::NEG_INFINITY, 1.0);
            }
        }
    }

    fn constrain_demand_met(&mut self) {
        for (t, target) in self.instance.targets.iter().enumerate() {
            let vars: Vec<VarId> = (0..self.instance.employees.len())
                .filter_map(|e| self.assignment_var(e, t))
                .collect();
            let required = f64::from(target.required);
            self.lp.add_sum_row(vars, required, required);
        }
    }

    /// `x[p][t] + x[q][t] <= 1` for every conflict pair and target. Pairs
    /// naming someone outside the pool are vacuous and skipped.
    fn constrain_conflicts(&mut self) {
        let index = &self.instance.employee_index;
        let pairs: BTreeSet<(usize, usize)> = self
            .instance
            .conflicts
            .iter()
            .map(|pair| pair.normalized())
            .filter(|pair| !pair.is_self_pair())
            .filter_map(|ConflictPair(p, q)| Some((*index.get(&p)?, *index.get(&q)?)))
            .collect();

        let skipped = self.instance.conflicts.len() - pairs.len();
        if skipped > 0 {
            debug!(skipped, "ignored unknown, self or repeated conflict pairs");
        }

        for (p, q) in pairs {
            for t in 0..self.width() {
                if let (Some(first), Some(second)) =
                    (self.assignment_var(p, t), self.assignment_var(q, t))
                {
                    self.lp.add_sum_row([first, second], f64::NEG_INFINITY, 1.0);
                }
            }
        }
    }

    fn minimize_distance(&mut self) {
        for e in 0..self.instance.employees.len() {
            for t in 0..self.width() {
                if let Some(var) = self.assignment_var(e, t) {
                    self.lp
                        .set_objective_coefficient(var, self.instance.distances.get(e, t));
                }
            }
        }
    }

    /// Each pair costs its squared distance from the mean over all candidate
    /// pairs. The coefficient is a constant, so the objective stays linear.
    fn minimize_deviation(&mut self) {
        let mean = self.candidate_mean;
        for e in 0..self.instance.employees.len() {
            for t in 0..self.width() {
                if let Some(var) = self.assignment_var(e, t) {
                    let deviation = self.instance.distances.get(e, t) - mean;
                    self.lp.set_objective_coefficient(var, deviation * deviation);
                }
            }
        }
    }

    /// For every anchor/companion pair and every target where both could go,
    /// add `y = x[anchor][t] AND x[companion][t]` with objective `-reward`.
    fn reward_affinities(&mut self, reward: f64) {
        let index = &self.instance.employee_index;
        let mut pairs = Vec::new();
        for group in &self.instance.affinities {
            let Some(&anchor) = index.get(&group.anchor) else {
                continue;
            };
            let mut seen = HashSet::new();
            for companion in &group.companions {
                let Some(&companion) = index.get(companion) else {
                    continue;
                };
                if companion != anchor && seen.insert(companion) {
                    pairs.push((anchor, companion));
                }
            }
        }

        for (anchor, companion) in pairs {
            for t in 0..self.width() {
                let (Some(x_anchor), Some(x_companion)) =
                    (self.assignment_var(anchor, t), self.assignment_var(companion, t))
                else {
                    continue;
                };
                let y = self.lp.add_binary(format!("y_{anchor}_{companion}_{t}"));
                link_and(&mut self.lp, y, x_anchor, x_companion);
                self.lp.set_objective_coefficient(y, -reward);
                self.links.push(AffinityLink {
                    anchor,
                    companion,
                    target: t,
                    var: y,
                });
            }
        }

        if !self.links.is_empty() && reward <= self.instance.distances.max() {
            warn!(
                reward,
                max_distance = self.instance.distances.max(),
                "affinity reward does not exceed the largest distance and may be outweighed"
            );
        }
    }

    /// Run the engine once and turn its answer into an [`Outcome`].
    pub fn solve(self, engine: &impl Engine) -> Result<Outcome> {
        if self.lp.num_variables() == 0 {
            debug!("no decision variables, nothing to solve");
            return self.extract(&EngineSolution::optimal(Vec::new(), 0.0));
        }

        info!(objective = %self.objective, "solving assignment model");
        let solution = engine.solve(&self.lp);

        match solution.status() {
            SolveStatus::Optimal => self.extract(&solution),
            SolveStatus::Infeasible => Err(AssignError::Infeasible),
            SolveStatus::TimedOut => Err(AssignError::TimedOut {
                seconds: self.time_limit.unwrap_or_default(),
            }),
            SolveStatus::Other(reason) => Err(AssignError::Solver(reason.clone())),
        }
    }

    fn is_set(&self, solution: &EngineSolution, var: VarId) -> Result<bool> {
        let value = solution.value(var).ok_or_else(|| {
            AssignError::InconsistentSolution(format!("no value for {}", self.lp.name(var)))
        })?;
        let rounded = value.round();
        if (value - rounded).abs() > INTEGRALITY_TOLERANCE || !(rounded == 0.0 || rounded == 1.0) {
            return Err(AssignError::FractionalValue {
                variable: self.lp.name(var).to_string(),
                value,
            });
        }
        Ok(rounded == 1.0)
    }

    fn extract(&self, solution: &EngineSolution) -> Result<Outcome> {
        let employees = &self.instance.employees;
        let targets = &self.instance.targets;

        let mut assignments: BTreeMap<EmployeeId, Option<TargetId>> =
            employees.iter().map(|e| (e.id, None)).collect();
        let mut placements = Vec::new();
        let mut headcount = vec![0u32; targets.len()];

        for (e, employee) in employees.iter().enumerate() {
            for (t, target) in targets.iter().enumerate() {
                let Some(var) = self.assignment_var(e, t) else {
                    continue;
                };
                if !self.is_set(solution, var)? {
                    continue;
                }
                if let Some(Some(other)) = assignments.insert(employee.id, Some(target.number)) {
                    return Err(AssignError::InconsistentSolution(format!(
                        "employee {} placed at targets {other} and {}",
                        employee.id, target.number
                    )));
                }
                headcount[t] += 1;
                placements.push(Placement {
                    employee: employee.id,
                    target: target.number,
                    distance: self.instance.distances.get(e, t),
                });
            }
        }

        if let Some((target, count)) = targets
            .iter()
            .zip(&headcount)
            .find(|(target, count)| **count != target.required)
        {
            return Err(AssignError::InconsistentSolution(format!(
                "target {} got {count} employees but requires {}",
                target.number, target.required
            )));
        }

        let mut affinity_pairs = 0;
        for link in &self.links {
            if self.is_set(solution, link.var)? {
                debug!(
                    anchor = employees[link.anchor].id,
                    companion = employees[link.companion].id,
                    at = targets[link.target].number,
                    "affinity pair placed together"
                );
                affinity_pairs += 1;
            }
        }

        let total_distance: f64 = placements.iter().map(|p| p.distance).sum();
        let mean_distance = if placements.is_empty() {
            0.0
        } else {
            total_distance / placements.len() as f64
        };
        let max_distance = placements.iter().map(|p| p.distance).fold(0.0, f64::max);

        info!(
            assigned = placements.len(),
            total_distance, mean_distance, affinity_pairs, "assignment found"
        );

        Ok(Outcome {
            objective: self.objective,
            assignments,
            placements,
            total_distance,
            mean_distance,
            max_distance,
            objective_value: solution.objective(),
            candidate_mean: self.candidate_mean,
            affinity_pairs,
        })
    }
}

/// Build the model for `settings.objective` and solve it with `engine`.
pub fn assign(instance: &Instance, settings: &Settings, engine: &impl Engine) -> Result<Outcome> {
    AssignmentModel::build(instance, settings)?.solve(engine)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub employee: EmployeeId,
    pub target: TargetId,
    pub distance: f64,
}

/// A solved assignment and the metrics that describe it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub objective: Objective,
    /// Every employee, with `None` for those left unassigned.
    pub assignments: BTreeMap<EmployeeId, Option<TargetId>>,
    pub placements: Vec<Placement>,
    /// Realized distance. For the social objective this differs from
    /// `objective_value`, which has the affinity rewards subtracted.
    pub total_distance: f64,
    pub mean_distance: f64,
    pub max_distance: f64,
    pub objective_value: f64,
    /// Mean distance over every candidate pair.
    pub candidate_mean: f64,
    pub affinity_pairs: usize,
}

impl Outcome {
    pub fn target_of(&self, employee: EmployeeId) -> Option<TargetId> {
        self.assignments.get(&employee).copied().flatten()
    }

    pub fn employees_at(&self, target: TargetId) -> Vec<EmployeeId> {
        self.placements
            .iter()
            .filter(|p| p.target == target)
            .map(|p| p.employee)
            .collect()
    }

    /// Σ (distance − candidate mean)² over the realized placements.
    pub fn squared_deviation(&self) -> f64 {
        self.placements
            .iter()
            .map(|p| (p.distance - self.candidate_mean).powi(2))
            .sum()
    }
}
