//! Joint-state enumeration under mixed-radix addressing.
//!
//! Every flat value array in the crate is addressed row-major: the **last**
//! variable of an ordering varies fastest. An [`Index`] walks the joint states
//! of an ordered variable list and reports, at each step, the flat offset of the
//! current assignment under a second (addressing) ordering. This is how tables
//! move between declared order, canonical order and each writer's order.
//!
//! ```text
//! vars = (A:2, B:3), addressing = (B, A)
//!
//! step   A B   position  offset
//!  0     0 0      0        0
//!  1     0 1      1        2
//!  2     0 2      2        4
//!  3     1 0      3        1
//!  ...
//! ```

use std::collections::HashMap;

use crate::error::{PgmError, Result};
use crate::variable::Variable;

/// Single-use enumerator over the joint states of an ordered variable list.
#[derive(Debug, Clone)]
pub struct Index {
    ids: Vec<usize>,
    cards: Vec<usize>,
    states: Vec<usize>,
    /// Stride of each enumerated variable in the addressing order (0 = not addressed)
    strides: Vec<usize>,
    /// Stride of each enumerated variable in its own enumeration order
    own_strides: Vec<usize>,
    /// Enumerated positions from slowest to fastest for linear advance
    linear_order: Vec<usize>,
    offset: usize,
    steps: usize,
    total: usize,
}

impl Index {
    /// Enumerate `vars`, reporting offsets in the same order.
    pub fn over<'a>(vars: impl IntoIterator<Item = &'a Variable>) -> Self {
        let vars: Vec<&Variable> = vars.into_iter().collect();
        let cards: Vec<usize> = vars.iter().map(|v| v.cardinality()).collect();
        let strides = row_major_strides(cards.iter().copied());
        Self {
            ids: vars.iter().map(|v| v.id()).collect(),
            total: saturating_size(&cards),
            states: vec![0; vars.len()],
            linear_order: (0..vars.len()).collect(),
            own_strides: strides.clone(),
            strides,
            cards,
            offset: 0,
            steps: 0,
        }
    }

    /// Enumerate `vars` in their listed order, reporting offsets under `addressing`.
    ///
    /// Every addressing variable must be enumerated. Enumerated variables that are
    /// not addressed do not contribute to the offset.
    pub fn new<'a, 'b>(
        vars: impl IntoIterator<Item = &'a Variable>,
        addressing: impl IntoIterator<Item = &'b Variable>,
    ) -> Result<Self> {
        let vars: Vec<&Variable> = vars.into_iter().collect();
        let addressing: Vec<&Variable> = addressing.into_iter().collect();
        Self::build(&vars, &addressing)
    }

    fn build(vars: &[&Variable], addressing: &[&Variable]) -> Result<Self> {
        let ids: Vec<usize> = vars.iter().map(|v| v.id()).collect();
        let cards: Vec<usize> = vars.iter().map(|v| v.cardinality()).collect();

        let addr_strides = row_major_strides(addressing.iter().map(|v| v.cardinality()));
        let mut strides = vec![0; vars.len()];
        let mut addressed_positions = Vec::with_capacity(addressing.len());
        for (a, var) in addressing.iter().enumerate() {
            let p = ids
                .iter()
                .position(|&id| id == var.id())
                .ok_or(PgmError::IndexMismatch(var.id()))?;
            strides[p] = addr_strides[a];
            addressed_positions.push(p);
        }

        let mut linear_order: Vec<usize> = (0..vars.len())
            .filter(|p| !addressed_positions.contains(p))
            .collect();
        linear_order.extend(addressed_positions);

        Ok(Self {
            own_strides: row_major_strides(cards.iter().copied()),
            total: saturating_size(&cards),
            states: vec![0; vars.len()],
            ids,
            cards,
            strides,
            linear_order,
            offset: 0,
            steps: 0,
        })
    }

    /// Flat offset of the current assignment in the addressing order.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Flat offset of the current assignment in the enumeration order.
    pub fn position(&self) -> usize {
        self.states
            .iter()
            .zip(&self.own_strides)
            .map(|(s, st)| s * st)
            .sum()
    }

    /// Number of joint assignments this index visits.
    pub fn total(&self) -> usize {
        self.total
    }

    /// True once every assignment has been visited.
    pub fn ended(&self) -> bool {
        self.steps >= self.total
    }

    /// Current state of each enumerated variable, in enumeration order.
    pub fn states(&self) -> &[usize] {
        &self.states
    }

    /// Current state index keyed by variable id.
    pub fn attribution(&self) -> HashMap<usize, usize> {
        self.ids
            .iter()
            .copied()
            .zip(self.states.iter().copied())
            .collect()
    }

    /// Outer-first advance: the first listed variable is the slowest loop.
    pub fn next(&mut self) {
        if self.ended() {
            return;
        }
        self.steps += 1;
        for p in (0..self.states.len()).rev() {
            if self.bump(p) {
                break;
            }
        }
    }

    /// Linear advance: the addressing offset grows by exactly one per step.
    pub fn next_linear(&mut self) {
        if self.ended() {
            return;
        }
        self.steps += 1;
        for i in (0..self.linear_order.len()).rev() {
            if self.bump(self.linear_order[i]) {
                break;
            }
        }
    }

    /// Increments position `p`; returns false on wrap-around (carry).
    fn bump(&mut self, p: usize) -> bool {
        self.states[p] += 1;
        self.offset += self.strides[p];
        if self.states[p] < self.cards[p] {
            return true;
        }
        self.offset -= self.strides[p] * self.cards[p];
        self.states[p] = 0;
        false
    }
}

/// Row-major strides: the last dimension has stride 1.
/// Number of joint states, or `None` when it does not fit in `usize`.
pub(crate) fn joint_size(cards: impl IntoIterator<Item = usize>) -> Option<usize> {
    cards.into_iter().try_fold(1usize, |acc, k| acc.checked_mul(k))
}

fn saturating_size(cards: &[usize]) -> usize {
    joint_size(cards.iter().copied()).unwrap_or(usize::MAX)
}

pub(crate) fn row_major_strides(cards: impl Iterator<Item = usize>) -> Vec<usize> {
    let cards: Vec<usize> = cards.collect();
    let mut strides = vec![1; cards.len()];
    for i in (0..cards.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * cards[i + 1];
    }
    strides
}

/// Re-address a flat array from `from` order into `to` order.
///
/// Both orderings must cover the same variables.
pub fn permute(values: &[f64], from: &[&Variable], to: &[&Variable]) -> Result<Vec<f64>> {
    if let Some(v) = from.iter().find(|v| !to.iter().any(|u| u.id() == v.id())) {
        return Err(PgmError::IndexMismatch(v.id()));
    }
    let mut ix = Index::new(from.iter().copied(), to.iter().copied())?;
    if values.len() != ix.total() {
        return Err(PgmError::DimensionMismatch {
            expected: ix.total(),
            got: values.len(),
        });
    }
    let mut arranged = Vec::with_capacity(values.len());
    while !ix.ended() {
        debug_assert_eq!(ix.offset(), arranged.len());
        arranged.push(values[ix.position()]);
        ix.next_linear();
    }
    Ok(arranged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(cards: &[usize]) -> Vec<Variable> {
        cards
            .iter()
            .enumerate()
            .map(|(i, &k)| Variable::new(i, k, format!("v{}", i), false))
            .collect()
    }

    #[test]
    fn test_enumerates_every_assignment_once() {
        let vs = vars(&[2, 3]);
        let mut ix = Index::over(&vs);
        let mut seen = Vec::new();
        while !ix.ended() {
            seen.push(ix.states().to_vec());
            ix.next();
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], vec![0, 0]);
        assert_eq!(seen[1], vec![0, 1]);
        assert_eq!(seen[3], vec![1, 0]);
        assert_eq!(seen[5], vec![1, 2]);
    }

    #[test]
    fn test_ended_only_after_last_assignment() {
        let vs = vars(&[2, 3]);
        let mut ix = Index::over(&vs);
        for _ in 0..5 {
            ix.next();
            assert!(!ix.ended());
        }
        ix.next();
        assert!(ix.ended());
        ix.next();
        assert!(ix.ended());
    }

    #[test]
    fn test_offsets_under_reversed_addressing() {
        let vs = vars(&[2, 3]);
        let rev = [&vs[1], &vs[0]];
        let mut ix = Index::new(&vs, rev).unwrap();
        let mut offsets = Vec::new();
        while !ix.ended() {
            offsets.push(ix.offset());
            ix.next();
        }
        assert_eq!(offsets, vec![0, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_linear_advance_increments_offset() {
        let vs = vars(&[2, 3, 2]);
        let addressing = [&vs[2], &vs[0], &vs[1]];
        let mut ix = Index::new(&vs, addressing).unwrap();
        let mut k = 0;
        while !ix.ended() {
            assert_eq!(ix.offset(), k);
            ix.next_linear();
            k += 1;
        }
        assert_eq!(k, 12);
    }

    #[test]
    fn test_unaddressed_variables_do_not_move_offset() {
        let vs = vars(&[2, 3]);
        let mut ix = Index::new(&vs, [&vs[0]]).unwrap();
        let mut offsets = Vec::new();
        while !ix.ended() {
            offsets.push(ix.offset());
            ix.next();
        }
        assert_eq!(offsets, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_addressing_must_be_enumerated() {
        let vs = vars(&[2, 3]);
        assert!(matches!(
            Index::new([&vs[0]], &vs),
            Err(PgmError::IndexMismatch(1))
        ));
    }

    #[test]
    fn test_attribution_by_id() {
        let vs = vars(&[2, 3]);
        let mut ix = Index::over(&vs);
        ix.next();
        ix.next();
        ix.next();
        let attr = ix.attribution();
        assert_eq!(attr[&0], 1);
        assert_eq!(attr[&1], 0);
    }

    #[test]
    fn test_empty_list_has_one_assignment() {
        let mut ix = Index::over(std::iter::empty::<&Variable>());
        assert!(!ix.ended());
        assert_eq!(ix.offset(), 0);
        ix.next();
        assert!(ix.ended());
    }

    #[test]
    fn test_over_matches_self_addressing() {
        let vs = vars(&[2, 3, 2]);
        let mut own = Index::over(&vs);
        let mut addressed = Index::new(&vs, &vs).unwrap();
        assert_eq!(own.total(), 12);
        while !addressed.ended() {
            assert_eq!(own.offset(), addressed.offset());
            assert_eq!(own.position(), addressed.position());
            own.next_linear();
            addressed.next_linear();
        }
        assert!(own.ended());
    }

    #[test]
    fn test_joint_size_overflow() {
        assert_eq!(joint_size([2, 3, 4]), Some(24));
        assert_eq!(joint_size([]), Some(1));
        assert_eq!(joint_size([usize::MAX, 2]), None);
    }

    #[test]
    fn test_permute_swaps_child_and_parent() {
        // declared (Y:3, X:2) with X fastest, canonical (X, Y) with Y fastest
        let vs = vars(&[2, 3]);
        let declared = [&vs[1], &vs[0]];
        let canonical = [&vs[0], &vs[1]];
        let values = [0.1, 0.9, 0.2, 0.8, 0.7, 0.3];
        let arranged = permute(&values, &declared, &canonical).unwrap();
        assert_eq!(arranged, vec![0.1, 0.2, 0.7, 0.9, 0.8, 0.3]);
    }

    #[test]
    fn test_permute_checks_length() {
        let vs = vars(&[2, 3]);
        let order = [&vs[0], &vs[1]];
        assert!(matches!(
            permute(&[1.0; 5], &order, &order),
            Err(PgmError::DimensionMismatch {
                expected: 6,
                got: 5
            })
        ));
    }
}
