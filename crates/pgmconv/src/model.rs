//! Read-only model view consumed by the format writers.

use crate::clique_tree::CliqueTree;
use crate::factor::Factor;
use crate::index::Index;
use crate::variable::Variable;

/// Network name used when the source carries none.
pub const DEFAULT_NETWORK_NAME: &str = "unknown";

/// One potential split into the variables it distributes (head) and the
/// variables it is conditioned on (tail).
///
/// For a clique tree node, head is the frontier and tail the separator. For a
/// network CPT, head is the child and tail its parents.
#[derive(Debug, Clone)]
pub struct Family<'a> {
    pub head: Vec<&'a Variable>,
    pub tail: Vec<&'a Variable>,
    pub potential: &'a Factor,
}

/// Conditional table for one tail assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalRow {
    /// Tail state indices, in tail order
    pub tail_states: Vec<usize>,
    /// Values over the head, row-major in canonical order
    pub values: Vec<f64>,
}

impl<'a> Family<'a> {
    /// Derive the conditional table over the head for every tail assignment.
    ///
    /// Tail assignments are enumerated with the first tail variable slowest.
    /// Each row reduces the potential to the assignment and sums out the tail.
    pub fn conditionals(&self) -> Vec<ConditionalRow> {
        let mut rows = Vec::new();
        let mut ix = Index::over(self.tail.iter().copied());
        while !ix.ended() {
            let table = self.potential.conditional(&self.head, &ix.attribution());
            rows.push(ConditionalRow {
                tail_states: ix.states().to_vec(),
                values: table.flat_values(),
            });
            ix.next();
        }
        rows
    }

    /// Id of the first head variable, used to order families by child.
    pub fn head_id(&self) -> Option<usize> {
        self.head.first().map(|v| v.id())
    }
}

/// Anything the writers can serialize.
pub trait ModelView {
    /// Network name for headers.
    fn name(&self) -> &str {
        DEFAULT_NETWORK_NAME
    }

    /// Variables in output order.
    fn variables(&self) -> Vec<&Variable>;

    /// Families in output order, one per potential.
    fn families(&self) -> Vec<Family<'_>>;
}

impl ModelView for CliqueTree {
    fn name(&self) -> &str {
        self.network_name()
    }

    fn variables(&self) -> Vec<&Variable> {
        CliqueTree::variables(self)
    }

    fn families(&self) -> Vec<Family<'_>> {
        self.nodes()
            .iter()
            .map(|n| Family {
                head: self.frontier(n.id()),
                tail: self.separator(n.id()),
                potential: n.potential(),
            })
            .collect()
    }
}
