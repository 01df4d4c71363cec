//! Backend-neutral linear model handed to a [`SolverAdapter`](crate::SolverAdapter).
//!
//! The model is a plain description: variables with bounds and an integrality
//! flag, linear constraints tagged with the rule they encode, and a linear
//! objective. Adapters translate it into their own API.

/// Position of a variable inside a [`ConstraintModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableId(usize);

impl VariableId {
    /// Index of the variable in [`ConstraintModel::variables`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Decision variable definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Human-readable name, e.g. `x[R1,peak,Type-I]`.
    pub name: String,
    /// Inclusive lower bound.
    pub lower: f64,
    /// Inclusive upper bound, unbounded when absent.
    pub upper: Option<f64>,
    /// Whether the variable must take an integer value.
    pub integer: bool,
}

/// Relation between a constraint's left-hand side and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `lhs <= rhs`
    LessOrEqual,
    /// `lhs >= rhs`
    GreaterOrEqual,
    /// `lhs == rhs`
    Equal,
}

/// Scheduling rule a constraint encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// Delivered capacity covers demand minus the buffer.
    DemandFulfilment,
    /// Trips of one bus type stay within its fleet.
    FleetAvailability,
    /// Every operating route/shift pair receives its minimum trips.
    ShiftCoverage,
    /// A bus type's share of a route's trips stays within the policy range.
    AllocationRatio,
    /// All trips stay within the system-wide cap.
    TotalTrips,
    /// One bus type's trips on a route and shift stay within the route's
    /// share of that fleet.
    RouteTripCap,
}

/// Linear constraint `Σ coefficient × variable  (<=|>=|==)  rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// Human-readable name.
    pub name: String,
    /// Rule encoded by this constraint.
    pub kind: ConstraintKind,
    /// Coefficient per variable.
    pub terms: Vec<(VariableId, f64)>,
    /// Relation to the right-hand side.
    pub comparison: Comparison,
    /// Right-hand side constant.
    pub rhs: f64,
}

impl LinearConstraint {
    /// Evaluate the left-hand side for a full assignment of `values`.
    ///
    /// Variables missing from `values` count as zero.
    #[must_use]
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(id, coefficient)| coefficient * values.get(id.index()).copied().unwrap_or(0.0))
            .sum()
    }

    /// Whether `values` satisfy the constraint within `tolerance`.
    #[must_use]
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs(values);
        match self.comparison {
            Comparison::LessOrEqual => lhs <= self.rhs + tolerance,
            Comparison::GreaterOrEqual => lhs >= self.rhs - tolerance,
            Comparison::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// Optimisation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smaller objective values are better.
    Minimise,
    /// Larger objective values are better.
    Maximise,
}

/// Linear objective `Σ coefficient × variable`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearObjective {
    /// Optimisation direction.
    pub direction: Direction,
    /// Coefficient per variable.
    pub terms: Vec<(VariableId, f64)>,
}

/// Variables, constraints and objective of one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintModel {
    variables: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
    objective: LinearObjective,
}

impl Default for ConstraintModel {
    fn default() -> Self {
        Self::new(Direction::Minimise)
    }
}

impl ConstraintModel {
    /// Create an empty model optimising in `direction`.
    #[must_use]
    pub const fn new(direction: Direction) -> Self {
        Self {
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: LinearObjective {
                direction,
                terms: Vec::new(),
            },
        }
    }

    /// Register a variable and return its identifier.
    pub fn add_variable(&mut self, variable: Variable) -> VariableId {
        self.variables.push(variable);
        VariableId(self.variables.len() - 1)
    }

    /// Append a constraint.
    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    /// Add `coefficient × variable` to the objective.
    pub fn add_objective_term(&mut self, variable: VariableId, coefficient: f64) {
        self.objective.terms.push((variable, coefficient));
    }

    /// Variables in registration order.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Constraints in insertion order.
    #[must_use]
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Constraints encoding `kind`.
    pub fn constraints_of(&self, kind: ConstraintKind) -> impl Iterator<Item = &LinearConstraint> {
        self.constraints
            .iter()
            .filter(move |constraint| constraint.kind == kind)
    }

    /// Objective function.
    #[must_use]
    pub const fn objective(&self) -> &LinearObjective {
        &self.objective
    }

    /// Objective value of `values`.
    #[must_use]
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .terms
            .iter()
            .map(|(id, coefficient)| coefficient * values.get(id.index()).copied().unwrap_or(0.0))
            .sum()
    }

    /// Constraints or variable bounds that `values` violate beyond `tolerance`.
    ///
    /// Bound violations are reported by variable name.
    #[must_use]
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<String> {
        let bounds = self
            .variables
            .iter()
            .zip(values.iter().copied())
            .filter(|(variable, value)| {
                *value < variable.lower - tolerance
                    || variable.upper.is_some_and(|upper| *value > upper + tolerance)
            })
            .map(|(variable, _)| variable.name.clone());
        let constraints = self
            .constraints
            .iter()
            .filter(|constraint| !constraint.is_satisfied(values, tolerance))
            .map(|constraint| constraint.name.clone());
        bounds.chain(constraints).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn model() -> (ConstraintModel, VariableId, VariableId) {
        let mut model = ConstraintModel::default();
        let x = model.add_variable(Variable {
            name: "x".into(),
            lower: 0.0,
            upper: Some(4.0),
            integer: true,
        });
        let y = model.add_variable(Variable {
            name: "y".into(),
            lower: 0.0,
            upper: None,
            integer: false,
        });
        model.add_constraint(LinearConstraint {
            name: "cover".into(),
            kind: ConstraintKind::DemandFulfilment,
            terms: vec![(x, 2.0), (y, 1.0)],
            comparison: Comparison::GreaterOrEqual,
            rhs: 6.0,
        });
        model.add_objective_term(x, 1.0);
        model.add_objective_term(y, 3.0);
        (model, x, y)
    }

    #[rstest]
    fn identifiers_follow_registration_order(model: (ConstraintModel, VariableId, VariableId)) {
        let (_, x, y) = model;
        assert_eq!(x.index(), 0);
        assert_eq!(y.index(), 1);
    }

    #[rstest]
    fn objective_value_is_weighted_sum(model: (ConstraintModel, VariableId, VariableId)) {
        let (model, _, _) = model;
        assert!((model.objective_value(&[2.0, 1.0]) - 5.0).abs() < 1e-12);
    }

    #[rstest]
    #[case(vec![3.0, 0.0], true)]
    #[case(vec![2.0, 1.0], false)]
    #[case(vec![2.0, 1.9999999], true)]
    fn satisfaction_respects_tolerance(
        model: (ConstraintModel, VariableId, VariableId),
        #[case] values: Vec<f64>,
        #[case] expected: bool,
    ) {
        let (model, _, _) = model;
        let satisfied = model.violations(&values, 1e-6).is_empty();
        assert_eq!(satisfied, expected);
    }

    #[rstest]
    fn violations_report_bounds(model: (ConstraintModel, VariableId, VariableId)) {
        let (model, _, _) = model;
        let violations = model.violations(&[5.0, 0.0], 1e-6);
        assert_eq!(violations, vec!["x".to_owned()]);
    }

    #[rstest]
    fn constraints_of_filters_by_kind(model: (ConstraintModel, VariableId, VariableId)) {
        let (model, _, _) = model;
        assert_eq!(model.constraints_of(ConstraintKind::DemandFulfilment).count(), 1);
        assert_eq!(model.constraints_of(ConstraintKind::FleetAvailability).count(), 0);
    }
}
