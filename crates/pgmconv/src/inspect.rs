//! Normalization checks over a model's conditional tables.

use tracing::warn;

use crate::model::ModelView;

/// A conditional that does not sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationIssue {
    /// Position of the family in [`ModelView::families`] order
    pub family: usize,
    /// Head variable names
    pub head: Vec<String>,
    /// Tail state indices, in tail order
    pub tail_states: Vec<usize>,
    pub sum: f64,
}

/// Report every tail assignment whose conditional over the head does not sum
/// to 1 within `tolerance`.
///
/// Mismatches are logged and returned; they never abort a conversion.
pub fn inspect_normalization(model: &dyn ModelView, tolerance: f64) -> Vec<NormalizationIssue> {
    let mut issues = Vec::new();
    for (i, family) in model.families().iter().enumerate() {
        let head: Vec<String> = family.head.iter().map(|v| v.display_name()).collect();
        for row in family.conditionals() {
            let sum: f64 = row.values.iter().sum();
            if (sum - 1.0).abs() > tolerance {
                warn!(
                    family = i,
                    head = ?head,
                    tail = ?row.tail_states,
                    sum,
                    "conditional table is not normalized"
                );
                issues.push(NormalizationIssue {
                    family: i,
                    head: head.clone(),
                    tail_states: row.tail_states,
                    sum,
                });
            }
        }
    }
    issues
}
