//! Bounds propagation over linear constraints.
//!
//! Each constraint `lo <= Σ c·x + k <= hi` is revised from the interval of
//! values its expression can still reach. A variable whose value would push
//! the interval outside `[lo, hi]` is fixed to the other value, and the
//! constraints watching it are revised in turn until nothing changes.
//!
//! Derived integers get interval bounds from the current partial assignment,
//! which is enough to reject frozen values and objective cuts early.

use crate::model::{IntExpr, LinearExpr, Model};

/// Propagation found the partial assignment inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conflict;

/// A partial assignment with an undo trail.
#[derive(Debug, Clone)]
pub(crate) struct Domains {
    values: Vec<Option<bool>>,
    trail: Vec<usize>,
    // Trail entries whose watchers have already been revised.
    head: usize,
}

impl Domains {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            values: vec![None; len],
            trail: Vec::with_capacity(len),
            head: 0,
        }
    }

    pub(crate) fn value(&self, var: usize) -> Option<bool> {
        self.values[var]
    }

    pub(crate) fn assign(&mut self, var: usize, value: bool) {
        debug_assert!(self.values[var].is_none(), "variable {} assigned twice", var);
        self.values[var] = Some(value);
        self.trail.push(var);
    }

    /// Position to undo back to.
    pub(crate) fn mark(&self) -> usize {
        self.trail.len()
    }

    pub(crate) fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some(var) = self.trail.pop() {
                self.values[var] = None;
            }
        }
        self.head = self.head.min(mark);
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.trail.len() == self.values.len()
    }

    pub(crate) fn to_values(&self) -> Vec<bool> {
        self.values.iter().map(|v| v.unwrap_or(false)).collect()
    }
}

#[derive(Debug, Clone)]
struct Row {
    terms: Vec<(usize, i64)>,
    constant: i64,
    lo: i64,
    hi: i64,
}

impl Row {
    fn from_expr(expr: &LinearExpr, lo: i64, hi: i64) -> Self {
        Self {
            terms: expr.terms().iter().map(|(v, c)| (v.index(), *c)).collect(),
            constant: expr.constant(),
            lo,
            hi,
        }
    }
}

/// Interval of values a linear expression can still take.
fn linear_bounds(expr: &LinearExpr, domains: &Domains) -> (i64, i64) {
    expr.terms()
        .iter()
        .fold((expr.constant(), expr.constant()), |(lo, hi), (v, c)| {
            match domains.value(v.index()) {
                Some(true) => (lo + c, hi + c),
                Some(false) => (lo, hi),
                None if *c > 0 => (lo, hi + c),
                None => (lo + c, hi),
            }
        })
}

/// Propagation engine compiled from a [`Model`].
#[derive(Debug)]
pub(crate) struct Propagator<'m> {
    model: &'m Model,
    rows: Vec<Row>,
    watches: Vec<Vec<usize>>,
    objective_row: Option<usize>,
}

impl<'m> Propagator<'m> {
    pub(crate) fn new(model: &'m Model) -> Self {
        let mut rows: Vec<Row> = model
            .constraints()
            .iter()
            .map(|c| Row::from_expr(&c.expr, c.lo, c.hi))
            .collect();

        // A linear objective is propagated as `expr <= best - 1`.
        let objective_row = model.linear_objective().map(|expr| {
            let (lo, hi) = expr.natural_bounds();
            rows.push(Row::from_expr(expr, lo, hi));
            rows.len() - 1
        });

        let mut watches = vec![Vec::new(); model.bool_count()];
        for (idx, row) in rows.iter().enumerate() {
            for &(var, _) in &row.terms {
                let watch: &mut Vec<usize> = &mut watches[var];
                if watch.last() != Some(&idx) {
                    watch.push(idx);
                }
            }
        }

        Self {
            model,
            rows,
            watches,
            objective_row,
        }
    }

    /// Revises every constraint, then propagates to fixpoint.
    pub(crate) fn propagate_all(
        &self,
        domains: &mut Domains,
        cap: Option<i64>,
    ) -> Result<(), Conflict> {
        for idx in 0..self.rows.len() {
            self.revise(idx, domains, cap)?;
        }
        self.propagate(domains, cap)
    }

    /// Propagates assignments made since the last call.
    ///
    /// `cap` is an inclusive upper bound on the objective.
    pub(crate) fn propagate(&self, domains: &mut Domains, cap: Option<i64>) -> Result<(), Conflict> {
        if let (Some(idx), Some(_)) = (self.objective_row, cap) {
            self.revise(idx, domains, cap)?;
        }
        while domains.head < domains.trail.len() {
            let var = domains.trail[domains.head];
            domains.head += 1;
            for &idx in &self.watches[var] {
                self.revise(idx, domains, cap)?;
            }
        }
        self.check_ints(domains, cap)
    }

    fn revise(&self, idx: usize, domains: &mut Domains, cap: Option<i64>) -> Result<(), Conflict> {
        let row = &self.rows[idx];
        let lo = row.lo;
        let hi = match cap {
            Some(cap) if self.objective_row == Some(idx) => row.hi.min(cap),
            _ => row.hi,
        };

        let (mut min, mut max) = (row.constant, row.constant);
        for &(var, c) in &row.terms {
            match domains.value(var) {
                Some(true) => {
                    min += c;
                    max += c;
                }
                Some(false) => {}
                None if c > 0 => max += c,
                None => min += c,
            }
        }
        if min > hi || max < lo {
            return Err(Conflict);
        }

        for &(var, c) in &row.terms {
            if domains.value(var).is_some() {
                continue;
            }
            let forced = if c > 0 {
                if min + c > hi {
                    Some(false)
                } else if max - c < lo {
                    Some(true)
                } else {
                    None
                }
            } else if min - c > hi {
                Some(true)
            } else if max + c < lo {
                Some(false)
            } else {
                None
            };

            if let Some(value) = forced {
                domains.assign(var, value);
                match (c > 0, value) {
                    (true, true) => min += c,
                    (true, false) => max -= c,
                    (false, true) => max += c,
                    (false, false) => min -= c,
                }
            }
        }

        if min > hi || max < lo {
            return Err(Conflict);
        }
        Ok(())
    }

    /// Checks derived integer bounds, frozen values and the objective cut.
    fn check_ints(&self, domains: &Domains, cap: Option<i64>) -> Result<(), Conflict> {
        if self.model.int_count() == 0 {
            return Ok(());
        }

        let mut bounds: Vec<(i64, i64)> = Vec::with_capacity(self.model.int_count());
        for def in self.model.int_vars() {
            let (lo, hi) = match &def.expr {
                IntExpr::Linear(expr) => linear_bounds(expr, domains),
                IntExpr::Max(vars) => vars.iter().fold((i64::MIN, i64::MIN), |(lo, hi), v| {
                    let (v_lo, v_hi) = bounds[v.index()];
                    (lo.max(v_lo), hi.max(v_hi))
                }),
                IntExpr::Min(vars) => vars.iter().fold((i64::MAX, i64::MAX), |(lo, hi), v| {
                    let (v_lo, v_hi) = bounds[v.index()];
                    (lo.min(v_lo), hi.min(v_hi))
                }),
                IntExpr::Difference(a, b) => {
                    let (a_lo, a_hi) = bounds[a.index()];
                    let (b_lo, b_hi) = bounds[b.index()];
                    (a_lo - b_hi, a_hi - b_lo)
                }
            };
            let (lo, hi) = (lo.max(def.lo), hi.min(def.hi));
            if lo > hi {
                return Err(Conflict);
            }
            bounds.push((lo, hi));
        }

        for &(var, value) in self.model.fixed_ints() {
            let (lo, hi) = bounds[var.index()];
            if value < lo || value > hi {
                return Err(Conflict);
            }
        }

        if let (Some(objective), Some(cap)) = (self.model.objective(), cap) {
            if bounds[objective.index()].0 > cap {
                return Err(Conflict);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;

    #[test]
    fn test_exact_sum_forces_remaining() {
        let mut m = Model::new("t");
        let xs: Vec<_> = (0..3).map(|i| m.new_bool(format!("x{i}"))).collect();
        m.add_eq("two", LinearExpr::sum(xs.clone()), 2);
        let prop = Propagator::new(&m);

        let mut d = Domains::new(3);
        assert!(prop.propagate_all(&mut d, None).is_ok());
        assert!(!d.is_complete());

        d.assign(0, false);
        assert!(prop.propagate(&mut d, None).is_ok());
        assert_eq!(d.value(1), Some(true));
        assert_eq!(d.value(2), Some(true));
        assert!(d.is_complete());
    }

    #[test]
    fn test_upper_bound_forces_false() {
        let mut m = Model::new("t");
        let xs: Vec<_> = (0..3).map(|i| m.new_bool(format!("x{i}"))).collect();
        m.add_le("at_most_one", LinearExpr::sum(xs), 1);
        let prop = Propagator::new(&m);

        let mut d = Domains::new(3);
        d.assign(1, true);
        assert!(prop.propagate(&mut d, None).is_ok());
        assert_eq!(d.value(0), Some(false));
        assert_eq!(d.value(2), Some(false));
    }

    #[test]
    fn test_conflict_and_undo() {
        let mut m = Model::new("t");
        let a = m.new_bool("a");
        let b = m.new_bool("b");
        m.add_eq("one", LinearExpr::sum([a, b]), 1);
        m.add_eq("a_true", LinearExpr::sum([a]), 1);
        let prop = Propagator::new(&m);

        let mut d = Domains::new(2);
        assert!(prop.propagate_all(&mut d, None).is_ok());
        assert_eq!(d.to_values(), vec![true, false]);

        let mut d = Domains::new(2);
        let mark = d.mark();
        d.assign(1, true);
        assert_eq!(prop.propagate(&mut d, None), Err(Conflict));
        d.undo_to(mark);
        assert_eq!(d.value(1), None);
        assert!(prop.propagate_all(&mut d, None).is_ok());
        assert!(d.is_complete());
    }

    #[test]
    fn test_negative_coefficients() {
        let mut m = Model::new("t");
        let a = m.new_bool("a");
        let b = m.new_bool("b");
        // a - b >= 1 forces a = 1, b = 0
        m.add_ge("diff", LinearExpr::weighted_sum([(a, 1), (b, -1)]), 1);
        let prop = Propagator::new(&m);

        let mut d = Domains::new(2);
        assert!(prop.propagate_all(&mut d, None).is_ok());
        assert_eq!(d.to_values(), vec![true, false]);
    }

    #[test]
    fn test_objective_cap_prunes() {
        let mut m = Model::new("t");
        let a = m.new_bool("a");
        let b = m.new_bool("b");
        m.add_ge("any", LinearExpr::sum([a, b]), 1);
        let cost = m.new_linear_int("cost", LinearExpr::weighted_sum([(a, 5), (b, 3)]), 0, 8);
        m.minimize(cost);
        let prop = Propagator::new(&m);

        let mut d = Domains::new(2);
        assert!(prop.propagate_all(&mut d, Some(4)).is_ok());
        assert_eq!(d.to_values(), vec![false, true]);

        let mut d = Domains::new(2);
        assert_eq!(prop.propagate_all(&mut d, Some(2)), Err(Conflict));
    }

    #[test]
    fn test_gap_bound_prunes() {
        let mut m = Model::new("t");
        let xs: Vec<_> = (0..4).map(|i| m.new_bool(format!("x{i}"))).collect();
        let w0 = m.new_linear_int("w0", LinearExpr::sum(xs[0..2].to_vec()), 0, 2);
        let w1 = m.new_linear_int("w1", LinearExpr::sum(xs[2..4].to_vec()), 0, 2);
        let max = m.new_max("max", vec![w0, w1]);
        let min = m.new_min("min", vec![w0, w1]);
        let gap = m.new_difference("gap", max, min);
        m.minimize(gap);
        let prop = Propagator::new(&m);

        let mut d = Domains::new(4);
        d.assign(0, true);
        d.assign(1, true);
        d.assign(2, false);
        d.assign(3, false);
        assert!(prop.propagate(&mut d, None).is_ok());
        assert_eq!(prop.propagate(&mut d, Some(1)), Err(Conflict));
    }

    #[test]
    fn test_frozen_value_checked() {
        let mut m = Model::new("t");
        let a = m.new_bool("a");
        let b = m.new_bool("b");
        let w = m.new_linear_int("w", LinearExpr::sum([a, b]), 0, 2);
        let top = m.new_max("top", vec![w]);
        m.fix_int(top, 2);
        let prop = Propagator::new(&m);

        let mut d = Domains::new(2);
        d.assign(0, false);
        assert_eq!(prop.propagate(&mut d, None), Err(Conflict));
    }
}
