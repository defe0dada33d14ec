//! Factor representation and operations.

use ndarray::{ArrayD, Axis, IxDyn};
use std::collections::HashMap;

use crate::error::{PgmError, Result};
use crate::index::{joint_size, permute};
use crate::variable::Variable;

/// A potential over a canonically ordered scope.
///
/// Represents φ(X₁, ..., Xₖ) → ℝ⁺ with X₁..Xₖ in ascending id order. The value
/// array is row-major over that order, so the highest-id variable varies fastest.
/// Values are not required to be normalized.
#[derive(Clone, Debug, PartialEq)]
pub struct Factor {
    variables: Vec<Variable>,
    values: ArrayD<f64>,
}

impl Factor {
    /// Create a factor over `variables`, with values addressed in the listed order.
    ///
    /// A scope that is not in ascending id order is sorted and the values are
    /// re-permuted to match, as [`Factor::from_declared`] does.
    pub fn new(mut variables: Vec<Variable>, values: Vec<f64>) -> Result<Self> {
        let declared: Vec<Variable> = variables.clone();
        variables.sort_by_key(Variable::id);
        if declared != variables {
            return Self::from_declared(&declared.iter().collect::<Vec<_>>(), values);
        }
        Self::build(variables, values)
    }

    /// Create a factor from values laid out in a declared (possibly non-canonical) order.
    ///
    /// The array is re-permuted into canonical order before the factor is built.
    pub fn from_declared(declared: &[&Variable], values: Vec<f64>) -> Result<Self> {
        let mut canonical: Vec<&Variable> = declared.to_vec();
        canonical.sort_by_key(|v| v.id());
        if let Some(w) = canonical.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(PgmError::DuplicateVariable(w[0].display_name()));
        }
        let expected = joint_size(declared.iter().map(|v| v.cardinality())).unwrap_or(usize::MAX);
        if values.len() != expected {
            return Err(PgmError::DimensionMismatch {
                expected,
                got: values.len(),
            });
        }

        let ids_match = declared
            .iter()
            .zip(&canonical)
            .all(|(d, c)| d.id() == c.id());
        let values = if ids_match {
            values
        } else {
            permute(&values, declared, &canonical)?
        };
        Self::build(canonical.into_iter().cloned().collect(), values)
    }

    fn build(variables: Vec<Variable>, values: Vec<f64>) -> Result<Self> {
        if let Some(w) = variables.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(PgmError::DuplicateVariable(w[0].display_name()));
        }
        if let Some(&value) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(PgmError::InvalidValue { value });
        }
        let shape: Vec<usize> = variables.iter().map(|v| v.cardinality()).collect();
        let expected = joint_size(shape.iter().copied()).unwrap_or(usize::MAX);
        if values.len() != expected {
            return Err(PgmError::DimensionMismatch {
                expected,
                got: values.len(),
            });
        }
        let values = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|_| {
            PgmError::DimensionMismatch {
                expected,
                got: 0,
            }
        })?;
        Ok(Self { variables, values })
    }

    /// Scope in canonical order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Number of variables in scope.
    pub fn scope_size(&self) -> usize {
        self.variables.len()
    }

    pub fn ids(&self) -> Vec<usize> {
        self.variables.iter().map(Variable::id).collect()
    }

    pub fn contains(&self, id: usize) -> bool {
        self.variables.iter().any(|v| v.id() == id)
    }

    /// Values as an n-dimensional array (one axis per scope variable).
    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    /// Values flattened row-major in canonical order.
    pub fn flat_values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Number of table entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all entries.
    pub fn total(&self) -> f64 {
        self.values.sum()
    }

    /// Variables shared with `other`, in canonical order.
    pub fn intersection(&self, other: &Factor) -> Vec<&Variable> {
        self.variables
            .iter()
            .filter(|v| other.contains(v.id()))
            .collect()
    }

    /// Variables not in `other`, in canonical order.
    pub fn difference(&self, other: &Factor) -> Vec<&Variable> {
        self.variables
            .iter()
            .filter(|v| !other.contains(v.id()))
            .collect()
    }

    /// Size of the scope intersection with `other`.
    pub fn overlap(&self, other: &Factor) -> usize {
        self.variables
            .iter()
            .filter(|v| other.contains(v.id()))
            .count()
    }
}

impl Factor {
    /// Fix variables to evidence: entries inconsistent with `evidence` become zero.
    ///
    /// The scope is kept; evidence on variables outside the scope is ignored.
    pub fn reduce(&self, evidence: &HashMap<usize, usize>) -> Factor {
        let fixed: Vec<(usize, usize)> = self
            .variables
            .iter()
            .enumerate()
            .filter_map(|(axis, v)| evidence.get(&v.id()).map(|&s| (axis, s)))
            .collect();

        let mut values = self.values.clone();
        for (idx, value) in values.indexed_iter_mut() {
            if fixed.iter().any(|&(axis, s)| idx[axis] != s) {
                *value = 0.0;
            }
        }
        Factor {
            variables: self.variables.clone(),
            values,
        }
    }

    /// Sum over the listed variables; ids outside the scope are ignored.
    ///
    /// ∑ₓ φ(X, Y) = φ(Y)
    pub fn sum_out(&self, ids: &[usize]) -> Factor {
        let mut axes: Vec<usize> = self
            .variables
            .iter()
            .enumerate()
            .filter(|(_, v)| ids.contains(&v.id()))
            .map(|(axis, _)| axis)
            .collect();
        // remove from the back so earlier axis numbers stay valid
        axes.sort_unstable_by(|a, b| b.cmp(a));

        let mut values = self.values.clone();
        for &axis in &axes {
            values = values.sum_axis(Axis(axis));
        }
        let variables = self
            .variables
            .iter()
            .filter(|v| !ids.contains(&v.id()))
            .cloned()
            .collect();
        Factor { variables, values }
    }

    /// Conditional table over `head` for one `tail` assignment.
    ///
    /// Reduces to the assignment, then sums out every scope variable that is
    /// not in `head`. The result is not renormalized.
    pub fn conditional(&self, head: &[&Variable], evidence: &HashMap<usize, usize>) -> Factor {
        let others: Vec<usize> = self
            .variables
            .iter()
            .map(Variable::id)
            .filter(|id| !head.iter().any(|h| h.id() == *id))
            .collect();
        self.reduce(evidence).sum_out(&others)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn xy() -> (Variable, Variable) {
        (
            Variable::new(0, 2, "x", false),
            Variable::new(1, 3, "y", false),
        )
    }

    #[test]
    fn test_factor_creation() {
        let (x, y) = xy();
        let f = Factor::new(vec![x, y], vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        assert_eq!(f.scope_size(), 2);
        assert_eq!(f.values().shape(), &[2, 3]);
        assert_eq!(f.values()[[1, 0]], 0.4);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let (x, y) = xy();
        assert!(matches!(
            Factor::new(vec![x, y], vec![0.5; 5]),
            Err(PgmError::DimensionMismatch {
                expected: 6,
                got: 5
            })
        ));
    }

    #[test]
    fn test_oversized_scope_is_dimension_error() {
        let huge: Vec<Variable> = (0..8)
            .map(|i| Variable::with_states(i, format!("v{}", i), vec!["s".to_string(); 1 << 16], false))
            .collect();
        let refs: Vec<&Variable> = huge.iter().collect();
        assert!(matches!(
            Factor::from_declared(&refs, vec![1.0; 4]),
            Err(PgmError::DimensionMismatch {
                expected: usize::MAX,
                got: 4
            })
        ));
    }

    #[test]
    fn test_rejects_negative_values() {
        let (x, _) = xy();
        assert!(matches!(
            Factor::new(vec![x], vec![0.5, -0.1]),
            Err(PgmError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unnormalized_values_pass_through() {
        let (x, _) = xy();
        let f = Factor::new(vec![x], vec![3.0, 7.5]).unwrap();
        assert_eq!(f.flat_values(), vec![3.0, 7.5]);
    }

    #[test]
    fn test_declared_order_is_canonicalized() {
        let (x, y) = xy();
        // declared (y, x): x fastest
        let f = Factor::from_declared(&[&y, &x], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(f.ids(), vec![0, 1]);
        assert_eq!(f.flat_values(), vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_new_sorts_scope() {
        let (x, y) = xy();
        let a = Factor::new(vec![y.clone(), x.clone()], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap();
        let b = Factor::from_declared(&[&y, &x], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_scope_rejected() {
        let (x, _) = xy();
        assert!(Factor::from_declared(&[&x, &x], vec![0.25; 4]).is_err());
    }

    #[test]
    fn test_reduce_keeps_scope() {
        let (x, y) = xy();
        let f = Factor::new(vec![x, y], vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        let evidence = HashMap::from([(1, 2)]);
        let r = f.reduce(&evidence);
        assert_eq!(r.scope_size(), 2);
        assert_eq!(r.flat_values(), vec![0.0, 0.0, 0.3, 0.0, 0.0, 0.6]);
        // original untouched
        assert_eq!(f.flat_values()[0], 0.1);
    }

    #[test]
    fn test_sum_out() {
        let (x, y) = xy();
        let f = Factor::new(vec![x, y], vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        let m = f.sum_out(&[1]);
        assert_eq!(m.ids(), vec![0]);
        assert_abs_diff_eq!(m.values()[[0]], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(m.values()[[1]], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_conditional_slices_tail_assignment() {
        let (x, y) = xy();
        let f = Factor::new(vec![x, y.clone()], vec![0.2, 0.3, 0.5, 0.6, 0.3, 0.1]).unwrap();
        let c = f.conditional(&[&y], &HashMap::from([(0, 1)]));
        assert_eq!(c.ids(), vec![1]);
        let vals = c.flat_values();
        assert_abs_diff_eq!(vals[0], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(vals[2], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(c.total(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_set_operations() {
        let (x, y) = xy();
        let z = Variable::new(2, 2, "z", true);
        let f = Factor::new(vec![x.clone(), y.clone()], vec![1.0; 6]).unwrap();
        let g = Factor::new(vec![y, z], vec![1.0; 6]).unwrap();
        assert_eq!(f.overlap(&g), 1);
        assert_eq!(f.intersection(&g)[0].name(), "y");
        assert_eq!(f.difference(&g)[0].name(), "x");
    }
}
