use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

/// `lower <= Σ coefficient · variable <= upper`. Either bound may be infinite.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub lower: f64,
    pub upper: f64,
    terms: Vec<(VarId, f64)>,
}

impl Row {
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms
            .iter()
            .find(|(v, _)| *v == var)
            .map_or(0.0, |&(_, c)| c)
    }

    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }
}

/// Binary variables, bounded rows and a linear objective, independent of any
/// solver. Engines translate it into their own representation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearModel {
    names: Vec<String>,
    objective: Vec<f64>,
    rows: Vec<Row>,
    sense: Sense,
}

impl LinearModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.names.push(name.into());
        self.objective.push(0.0);
        VarId(self.names.len() - 1)
    }

    pub fn add_row(&mut self, lower: f64, upper: f64) -> RowId {
        self.rows.push(Row {
            lower,
            upper,
            terms: Vec::new(),
        });
        RowId(self.rows.len() - 1)
    }

    /// Set the coefficient of `var` in `row`, replacing any earlier value.
    pub fn set_coefficient(&mut self, row: RowId, var: VarId, value: f64) {
        let terms = &mut self.rows[row.0].terms;
        match terms.iter_mut().find(|(v, _)| *v == var) {
            Some(term) => term.1 = value,
            None => terms.push((var, value)),
        }
    }

    /// Add `lower <= Σ vars <= upper` with unit coefficients.
    pub fn add_sum_row(
        &mut self,
        vars: impl IntoIterator<Item = VarId>,
        lower: f64,
        upper: f64,
    ) -> RowId {
        let row = self.add_row(lower, upper);
        for var in vars {
            self.set_coefficient(row, var, 1.0);
        }
        row
    }

    pub fn set_objective_coefficient(&mut self, var: VarId, value: f64) {
        self.objective[var.0] = value;
    }

    pub fn objective_coefficient(&self, var: VarId) -> f64 {
        self.objective[var.0]
    }

    pub fn set_minimize(&mut self) {
        self.sense = Sense::Minimize;
    }

    pub fn set_maximize(&mut self) {
        self.sense = Sense::Maximize;
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn num_variables(&self) -> usize {
        self.names.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.names.len()).map(VarId)
    }

    pub fn name(&self, var: VarId) -> &str {
        &self.names[var.0]
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, row: RowId) -> &Row {
        &self.rows[row.0]
    }

    /// Objective value for a full vector of variable values.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .zip(values)
            .map(|(coefficient, value)| coefficient * value)
            .sum()
    }
}

impl fmt::Display for LinearModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variables, {} rows, {:?}",
            self.names.len(),
            self.rows.len(),
            self.sense
        )
    }
}

/// Constrain binary `out` to equal `a AND b`:
///
/// ```text
/// out <= a
/// out <= b
/// out >= a + b - 1
/// ```
///
/// All three rows are required. The first two cap `out` whatever the
/// objective wants; the last forces it up once both inputs are 1.
pub fn link_and(model: &mut LinearModel, out: VarId, a: VarId, b: VarId) -> [RowId; 3] {
    // out - a <= 0
    let below_a = model.add_row(f64::NEG_INFINITY, 0.0);
    model.set_coefficient(below_a, out, 1.0);
    model.set_coefficient(below_a, a, -1.0);

    // out - b <= 0
    let below_b = model.add_row(f64::NEG_INFINITY, 0.0);
    model.set_coefficient(below_b, out, 1.0);
    model.set_coefficient(below_b, b, -1.0);

    // out - a - b >= -1
    let above_both = model.add_row(-1.0, f64::INFINITY);
    model.set_coefficient(above_both, out, 1.0);
    model.set_coefficient(above_both, a, -1.0);
    model.set_coefficient(above_both, b, -1.0);

    [below_a, below_b, above_both]
}
