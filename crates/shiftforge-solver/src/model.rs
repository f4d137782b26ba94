//! Boolean decision model with linear constraints and derived integers.
//!
//! A [`Model`] holds:
//! - Boolean decision variables ([`BoolVar`])
//! - Linear constraints `lo <= Σ c·x + k <= hi` over those variables
//! - Derived integer variables ([`IntVar`]) defined as a linear expression,
//!   the max or min of other integers, or the difference of two integers
//! - Frozen integer values and an optional objective to minimize
//!
//! Derived integers can only refer to integers created before them, so
//! evaluating them in creation order is always well defined.
//!
//! # Example
//!
//! ```
//! use shiftforge_solver::model::{LinearExpr, Model};
//!
//! let mut model = Model::new("pick-two");
//! let x: Vec<_> = (0..3).map(|i| model.new_bool(format!("x{}", i))).collect();
//! model.add_eq("exactly_two", LinearExpr::sum(x.iter().copied()), 2);
//!
//! let cost = model.new_linear_int(
//!     "cost",
//!     LinearExpr::weighted_sum([(x[0], 5), (x[1], 3), (x[2], 4)]),
//!     0,
//!     12,
//! );
//! model.minimize(cost);
//!
//! assert_eq!(model.bool_count(), 3);
//! assert!(model.validate().is_ok());
//! ```

use crate::error::ModelError;

/// A boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(pub(crate) usize);

impl BoolVar {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A derived integer variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVar(pub(crate) usize);

impl IntVar {
    pub fn index(self) -> usize {
        self.0
    }
}

/// `Σ coeff·var + constant` over boolean variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(BoolVar, i64)>,
    constant: i64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit-coefficient sum of `vars`.
    pub fn sum(vars: impl IntoIterator<Item = BoolVar>) -> Self {
        Self::weighted_sum(vars.into_iter().map(|v| (v, 1)))
    }

    pub fn weighted_sum(terms: impl IntoIterator<Item = (BoolVar, i64)>) -> Self {
        Self {
            terms: terms.into_iter().filter(|(_, c)| *c != 0).collect(),
            constant: 0,
        }
    }

    pub fn add_term(&mut self, var: BoolVar, coeff: i64) {
        if coeff != 0 {
            self.terms.push((var, coeff));
        }
    }

    pub fn with_term(mut self, var: BoolVar, coeff: i64) -> Self {
        self.add_term(var, coeff);
        self
    }

    pub fn with_constant(mut self, constant: i64) -> Self {
        self.constant = constant;
        self
    }

    pub fn terms(&self) -> &[(BoolVar, i64)] {
        &self.terms
    }

    pub fn constant(&self) -> i64 {
        self.constant
    }

    /// Smallest and largest values the expression can take.
    pub fn natural_bounds(&self) -> (i64, i64) {
        self.terms
            .iter()
            .fold((self.constant, self.constant), |(lo, hi), &(_, c)| {
                if c > 0 {
                    (lo, hi + c)
                } else {
                    (lo + c, hi)
                }
            })
    }

    /// Value under a complete assignment.
    pub fn evaluate(&self, values: &[bool]) -> i64 {
        self.terms
            .iter()
            .filter(|(v, _)| values[v.0])
            .map(|(_, c)| c)
            .sum::<i64>()
            + self.constant
    }
}

/// A linear constraint `lo <= expr <= hi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub lo: i64,
    pub hi: i64,
}

/// Definition of a derived integer variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntExpr {
    Linear(LinearExpr),
    Max(Vec<IntVar>),
    Min(Vec<IntVar>),
    Difference(IntVar, IntVar),
}

/// A named derived integer with its declared domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntVarDef {
    pub name: String,
    pub expr: IntExpr,
    pub lo: i64,
    pub hi: i64,
}

/// A constraint model over boolean decision variables.
#[derive(Debug, Clone, Default)]
pub struct Model {
    name: String,
    bools: Vec<String>,
    preferred: Vec<bool>,
    constraints: Vec<LinearConstraint>,
    ints: Vec<IntVarDef>,
    fixed: Vec<(IntVar, i64)>,
    objective: Option<IntVar>,
    branching: Option<Vec<BoolVar>>,
    hint: Option<Vec<bool>>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a boolean decision variable.
    pub fn new_bool(&mut self, name: impl Into<String>) -> BoolVar {
        self.bools.push(name.into());
        self.preferred.push(false);
        BoolVar(self.bools.len() - 1)
    }

    /// Adds `lo <= expr <= hi`.
    pub fn add_linear(&mut self, name: impl Into<String>, expr: LinearExpr, lo: i64, hi: i64) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            expr,
            lo,
            hi,
        });
    }

    /// Adds `expr == value`.
    pub fn add_eq(&mut self, name: impl Into<String>, expr: LinearExpr, value: i64) {
        self.add_linear(name, expr, value, value);
    }

    /// Adds `expr <= bound`.
    pub fn add_le(&mut self, name: impl Into<String>, expr: LinearExpr, bound: i64) {
        let lo = expr.natural_bounds().0.min(bound);
        self.add_linear(name, expr, lo, bound);
    }

    /// Adds `expr < bound`.
    pub fn add_lt(&mut self, name: impl Into<String>, expr: LinearExpr, bound: i64) {
        self.add_le(name, expr, bound - 1);
    }

    /// Adds `expr >= bound`.
    pub fn add_ge(&mut self, name: impl Into<String>, expr: LinearExpr, bound: i64) {
        let hi = expr.natural_bounds().1.max(bound);
        self.add_linear(name, expr, bound, hi);
    }

    /// Creates an integer equal to `expr`, restricted to `[lo, hi]`.
    ///
    /// The domain is enforced as a linear constraint when it is tighter
    /// than the expression's natural range.
    pub fn new_linear_int(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        lo: i64,
        hi: i64,
    ) -> IntVar {
        let name = name.into();
        let (nat_lo, nat_hi) = expr.natural_bounds();
        if lo > nat_lo || hi < nat_hi {
            self.add_linear(format!("{}_domain", name), expr.clone(), lo, hi);
        }
        self.push_int(name, IntExpr::Linear(expr), lo.max(nat_lo), hi.min(nat_hi))
    }

    /// Creates an integer equal to the maximum of `vars`.
    pub fn new_max(&mut self, name: impl Into<String>, vars: Vec<IntVar>) -> IntVar {
        let lo = vars.iter().filter_map(|v| self.domain_of(*v)).map(|d| d.0).max();
        let hi = vars.iter().filter_map(|v| self.domain_of(*v)).map(|d| d.1).max();
        self.push_int(
            name.into(),
            IntExpr::Max(vars),
            lo.unwrap_or(0),
            hi.unwrap_or(0),
        )
    }

    /// Creates an integer equal to the minimum of `vars`.
    pub fn new_min(&mut self, name: impl Into<String>, vars: Vec<IntVar>) -> IntVar {
        let lo = vars.iter().filter_map(|v| self.domain_of(*v)).map(|d| d.0).min();
        let hi = vars.iter().filter_map(|v| self.domain_of(*v)).map(|d| d.1).min();
        self.push_int(
            name.into(),
            IntExpr::Min(vars),
            lo.unwrap_or(0),
            hi.unwrap_or(0),
        )
    }

    /// Creates an integer equal to `a - b`.
    pub fn new_difference(&mut self, name: impl Into<String>, a: IntVar, b: IntVar) -> IntVar {
        let (a_lo, a_hi) = self.domain_of(a).unwrap_or((0, 0));
        let (b_lo, b_hi) = self.domain_of(b).unwrap_or((0, 0));
        self.push_int(name.into(), IntExpr::Difference(a, b), a_lo - b_hi, a_hi - b_lo)
    }

    fn push_int(&mut self, name: String, expr: IntExpr, lo: i64, hi: i64) -> IntVar {
        self.ints.push(IntVarDef { name, expr, lo, hi });
        IntVar(self.ints.len() - 1)
    }

    fn domain_of(&self, var: IntVar) -> Option<(i64, i64)> {
        self.ints.get(var.0).map(|d| (d.lo, d.hi))
    }

    /// Freezes `var` at `value`.
    ///
    /// Linear integers are also posted as an equality constraint so the
    /// frozen value takes part in propagation.
    pub fn fix_int(&mut self, var: IntVar, value: i64) {
        if let Some(IntVarDef {
            name,
            expr: IntExpr::Linear(expr),
            ..
        }) = self.ints.get(var.0)
        {
            let name = format!("{}_frozen", name);
            let expr = expr.clone();
            self.add_eq(name, expr, value);
        }
        self.fixed.push((var, value));
    }

    /// Sets the integer to minimize.
    pub fn minimize(&mut self, var: IntVar) {
        self.objective = Some(var);
    }

    /// Sets the order in which variables are branched on.
    ///
    /// Variables missing from `order` are branched on last, by index.
    pub fn set_branching_order(&mut self, order: Vec<BoolVar>) {
        self.branching = Some(order);
    }

    /// Sets the value tried first when branching on `var`.
    pub fn set_preferred_value(&mut self, var: BoolVar, value: bool) {
        if let Some(slot) = self.preferred.get_mut(var.0) {
            *slot = value;
        }
    }

    /// Sets a solution hint; hinted values override preferred values.
    pub fn set_hint(&mut self, values: Vec<bool>) {
        self.hint = Some(values);
    }

    pub fn bool_count(&self) -> usize {
        self.bools.len()
    }

    pub fn bool_name(&self, var: BoolVar) -> Option<&str> {
        self.bools.get(var.0).map(String::as_str)
    }

    pub fn int_count(&self) -> usize {
        self.ints.len()
    }

    pub fn int_var(&self, var: IntVar) -> Option<&IntVarDef> {
        self.ints.get(var.0)
    }

    pub fn int_vars(&self) -> &[IntVarDef] {
        &self.ints
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn fixed_ints(&self) -> &[(IntVar, i64)] {
        &self.fixed
    }

    pub fn objective(&self) -> Option<IntVar> {
        self.objective
    }

    /// The objective as a linear expression, if it is one.
    pub fn linear_objective(&self) -> Option<&LinearExpr> {
        match self.objective.and_then(|v| self.ints.get(v.0)) {
            Some(IntVarDef {
                expr: IntExpr::Linear(expr),
                ..
            }) => Some(expr),
            _ => None,
        }
    }

    /// Full branching order: explicit order first, then the rest by index.
    pub fn branching_order(&self) -> Vec<BoolVar> {
        let mut seen = vec![false; self.bools.len()];
        let mut order = Vec::with_capacity(self.bools.len());
        for var in self.branching.iter().flatten() {
            if var.0 < seen.len() && !seen[var.0] {
                seen[var.0] = true;
                order.push(*var);
            }
        }
        order.extend(
            (0..self.bools.len())
                .filter(|&i| !seen[i])
                .map(BoolVar),
        );
        order
    }

    /// Value tried first for `var`: the hint if present, else the preference.
    pub fn first_value(&self, var: BoolVar) -> bool {
        self.hint
            .as_ref()
            .and_then(|h| h.get(var.0).copied())
            .unwrap_or_else(|| self.preferred.get(var.0).copied().unwrap_or(false))
    }

    /// Value of `var` under a complete assignment.
    pub fn evaluate_int(&self, var: IntVar, values: &[bool]) -> i64 {
        match &self.ints[var.0].expr {
            IntExpr::Linear(expr) => expr.evaluate(values),
            IntExpr::Max(vars) => vars
                .iter()
                .map(|v| self.evaluate_int(*v, values))
                .max()
                .unwrap_or(0),
            IntExpr::Min(vars) => vars
                .iter()
                .map(|v| self.evaluate_int(*v, values))
                .min()
                .unwrap_or(0),
            IntExpr::Difference(a, b) => {
                self.evaluate_int(*a, values) - self.evaluate_int(*b, values)
            }
        }
    }

    /// Checks every reference and bound in the model.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.bools.len();
        let check_expr = |owner: &str, expr: &LinearExpr| -> Result<(), ModelError> {
            match expr.terms.iter().find(|(v, _)| v.0 >= n) {
                Some((v, _)) => Err(ModelError::UnknownBoolVar {
                    owner: owner.to_string(),
                    index: v.0,
                }),
                None => Ok(()),
            }
        };

        for c in &self.constraints {
            check_expr(&c.name, &c.expr)?;
            if c.lo > c.hi {
                return Err(ModelError::EmptyBounds {
                    owner: c.name.clone(),
                    lo: c.lo,
                    hi: c.hi,
                });
            }
        }

        for (idx, def) in self.ints.iter().enumerate() {
            let check_int = |v: &IntVar| -> Result<(), ModelError> {
                if v.0 >= idx {
                    Err(ModelError::UnknownIntVar {
                        owner: def.name.clone(),
                        index: v.0,
                    })
                } else {
                    Ok(())
                }
            };
            match &def.expr {
                IntExpr::Linear(expr) => check_expr(&def.name, expr)?,
                IntExpr::Max(vars) | IntExpr::Min(vars) => {
                    if vars.is_empty() {
                        return Err(ModelError::EmptyAggregate {
                            owner: def.name.clone(),
                        });
                    }
                    vars.iter().try_for_each(check_int)?;
                }
                IntExpr::Difference(a, b) => {
                    check_int(a)?;
                    check_int(b)?;
                }
            }
            if def.lo > def.hi {
                return Err(ModelError::EmptyBounds {
                    owner: def.name.clone(),
                    lo: def.lo,
                    hi: def.hi,
                });
            }
        }

        for var in self.fixed.iter().map(|(v, _)| v).chain(self.objective.as_ref()) {
            if var.0 >= self.ints.len() {
                return Err(ModelError::UnknownIntVar {
                    owner: self.name.clone(),
                    index: var.0,
                });
            }
        }

        if let Some(hint) = &self.hint {
            if hint.len() > n {
                return Err(ModelError::HintLength {
                    expected: n,
                    actual: hint.len(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_bounds() {
        let mut m = Model::new("t");
        let a = m.new_bool("a");
        let b = m.new_bool("b");
        let expr = LinearExpr::weighted_sum([(a, 3), (b, -2)]).with_constant(1);
        assert_eq!(expr.natural_bounds(), (-1, 4));
        assert_eq!(expr.evaluate(&[true, false]), 4);
        assert_eq!(expr.evaluate(&[false, true]), -1);
    }

    #[test]
    fn test_zero_coefficients_dropped() {
        let mut m = Model::new("t");
        let a = m.new_bool("a");
        let expr = LinearExpr::weighted_sum([(a, 0)]).with_term(a, 0);
        assert!(expr.terms().is_empty());
    }

    #[test]
    fn test_linear_int_domain_constraint() {
        let mut m = Model::new("t");
        let xs: Vec<_> = (0..3).map(|i| m.new_bool(format!("x{i}"))).collect();

        m.new_linear_int("loose", LinearExpr::sum(xs.clone()), 0, 10);
        assert_eq!(m.constraint_count(), 0);

        let tight = m.new_linear_int("tight", LinearExpr::sum(xs), 0, 2);
        assert_eq!(m.constraint_count(), 1);
        assert_eq!(m.constraints()[0].name, "tight_domain");
        let def = m.int_var(tight).unwrap();
        assert_eq!((def.lo, def.hi), (0, 2));
    }

    #[test]
    fn test_aggregate_domains_and_evaluation() {
        let mut m = Model::new("t");
        let xs: Vec<_> = (0..4).map(|i| m.new_bool(format!("x{i}"))).collect();
        let w0 = m.new_linear_int("w0", LinearExpr::sum(xs[0..2].to_vec()), 0, 2);
        let w1 = m.new_linear_int("w1", LinearExpr::sum(xs[2..4].to_vec()), 0, 2);
        let max = m.new_max("max", vec![w0, w1]);
        let min = m.new_min("min", vec![w0, w1]);
        let gap = m.new_difference("gap", max, min);

        let def = m.int_var(gap).unwrap();
        assert_eq!((def.lo, def.hi), (-2, 2));

        let values = [true, true, false, true];
        assert_eq!(m.evaluate_int(max, &values), 2);
        assert_eq!(m.evaluate_int(min, &values), 1);
        assert_eq!(m.evaluate_int(gap, &values), 1);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_fix_linear_int_posts_equality() {
        let mut m = Model::new("t");
        let a = m.new_bool("a");
        let b = m.new_bool("b");
        let cost = m.new_linear_int("cost", LinearExpr::weighted_sum([(a, 2), (b, 5)]), 0, 7);
        m.fix_int(cost, 5);

        assert_eq!(m.fixed_ints(), &[(cost, 5)]);
        let frozen = m.constraints().last().unwrap();
        assert_eq!(frozen.name, "cost_frozen");
        assert_eq!((frozen.lo, frozen.hi), (5, 5));
    }

    #[test]
    fn test_branching_order_completes_missing_vars() {
        let mut m = Model::new("t");
        let vars: Vec<_> = (0..4).map(|i| m.new_bool(format!("x{i}"))).collect();
        m.set_branching_order(vec![vars[2], vars[0], vars[2]]);
        assert_eq!(m.branching_order(), vec![vars[2], vars[0], vars[1], vars[3]]);
    }

    #[test]
    fn test_hint_overrides_preference() {
        let mut m = Model::new("t");
        let a = m.new_bool("a");
        let b = m.new_bool("b");
        m.set_preferred_value(a, true);
        assert!(m.first_value(a));
        assert!(!m.first_value(b));

        m.set_hint(vec![false]);
        assert!(!m.first_value(a));
        assert!(!m.first_value(b));
    }

    #[test]
    fn test_validate_rejects_bad_models() {
        let mut m = Model::new("t");
        let a = m.new_bool("a");
        m.add_linear("empty", LinearExpr::sum([a]), 2, 1);
        assert!(matches!(m.validate(), Err(ModelError::EmptyBounds { .. })));

        let mut m = Model::new("t");
        m.add_eq("ghost", LinearExpr::sum([BoolVar(7)]), 1);
        assert!(matches!(m.validate(), Err(ModelError::UnknownBoolVar { index: 7, .. })));

        let mut m = Model::new("t");
        m.new_max("max", vec![]);
        assert!(matches!(m.validate(), Err(ModelError::EmptyAggregate { .. })));

        let mut m = Model::new("t");
        m.new_bool("a");
        m.set_hint(vec![true, false]);
        assert!(matches!(m.validate(), Err(ModelError::HintLength { .. })));
    }

    #[test]
    fn test_validate_checks_objective_and_frozen_ints() {
        let mut m = Model::new("t");
        let a = m.new_bool("a");
        let cost = m.new_linear_int("cost", LinearExpr::sum([a]), 0, 1);
        m.fix_int(cost, 1);
        m.minimize(cost);
        assert!(m.validate().is_ok());

        let mut m = Model::new("t");
        m.minimize(IntVar(3));
        assert!(matches!(m.validate(), Err(ModelError::UnknownIntVar { index: 3, .. })));

        let mut m = Model::new("t");
        m.fix_int(IntVar(2), 0);
        assert!(matches!(m.validate(), Err(ModelError::UnknownIntVar { index: 2, .. })));
    }
}
