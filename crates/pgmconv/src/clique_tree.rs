//! Clique tree synthesis for factor collections without explicit hierarchy.
//!
//! The tree is grown breadth-first from the factor with the smallest scope.
//! Each dequeued node adopts **every** remaining factor that achieves the
//! largest scope overlap with it:
//!
//! ```text
//! pool: {X}  {X,Y}  {X,Z}  {Z,W}
//!
//! {X} ── {X,Y}
//!   └─── {X,Z} ── {Z,W}
//! ```
//!
//! Overlap search is O(|pool|²), which is fine for models whose factor count is
//! close to their variable count.

use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

use crate::error::{PgmError, Result};
use crate::factor::Factor;
use crate::model::DEFAULT_NETWORK_NAME;
use crate::variable::Variable;

/// Index of a node inside its [`CliqueTree`].
pub type NodeId = usize;

/// A tree node owning exactly one factor.
#[derive(Debug, Clone)]
pub struct CliqueNode {
    id: NodeId,
    potential: Factor,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl CliqueNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn potential(&self) -> &Factor {
        &self.potential
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Rooted tree over a factor collection; nodes are stored in breadth-first order.
#[derive(Debug, Clone)]
pub struct CliqueTree {
    nodes: Vec<CliqueNode>,
    name: String,
}

impl CliqueTree {
    /// Build a tree that partitions `factors` into nodes.
    ///
    /// Fails with [`PgmError::UnreachableFactors`] when some factor shares no
    /// variable with any attached node.
    pub fn build(factors: Vec<Factor>) -> Result<Self> {
        // arena of factor handles; `None` marks an attached factor
        let mut pool: Vec<Option<Factor>> = factors.into_iter().map(Some).collect();
        let root_idx = pool
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.as_ref().map(|f| (i, f.scope_size())))
            .min_by_key(|&(_, size)| size)
            .map(|(i, _)| i)
            .ok_or(PgmError::EmptyModel)?;

        let root = pool[root_idx].take().ok_or(PgmError::EmptyModel)?;
        let mut remaining = pool.len() - 1;
        let mut nodes = vec![CliqueNode {
            id: 0,
            potential: root,
            parent: None,
            children: Vec::new(),
        }];
        let mut queue = VecDeque::from([0]);

        while let Some(nid) = queue.pop_front() {
            if remaining == 0 {
                break;
            }
            let current = &nodes[nid].potential;
            let overlaps: Vec<(usize, usize)> = pool
                .iter()
                .enumerate()
                .filter_map(|(i, f)| f.as_ref().map(|f| (i, current.overlap(f))))
                .collect();
            let best = overlaps.iter().map(|&(_, o)| o).max().unwrap_or(0);
            if best == 0 {
                continue;
            }

            for (idx, _) in overlaps.into_iter().filter(|&(_, o)| o == best) {
                let Some(potential) = pool[idx].take() else {
                    continue;
                };
                let child = nodes.len();
                debug!(node = child, parent = nid, overlap = best, scope = ?potential.ids(), "attached factor");
                nodes.push(CliqueNode {
                    id: child,
                    potential,
                    parent: Some(nid),
                    children: Vec::new(),
                });
                nodes[nid].children.push(child);
                queue.push_back(child);
                remaining -= 1;
            }
        }

        if remaining > 0 {
            return Err(PgmError::UnreachableFactors {
                attached: nodes.len(),
                unreachable: remaining,
            });
        }
        info!(nodes = nodes.len(), "built clique tree");
        Ok(Self {
            nodes,
            name: DEFAULT_NETWORK_NAME.to_string(),
        })
    }

    /// Set the network name written in output headers.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn network_name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &CliqueNode {
        &self.nodes[0]
    }

    /// Nodes in breadth-first (tree) order.
    pub fn nodes(&self) -> &[CliqueNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&CliqueNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Scope ∩ parent scope; empty for the root.
    pub fn separator(&self, id: NodeId) -> Vec<&Variable> {
        match self.parent_of(id) {
            Some(parent) => self.nodes[id].potential.intersection(&parent.potential),
            None => Vec::new(),
        }
    }

    /// Scope − parent scope; the whole scope for the root.
    pub fn frontier(&self, id: NodeId) -> Vec<&Variable> {
        match self.parent_of(id) {
            Some(parent) => self.nodes[id].potential.difference(&parent.potential),
            None => self.nodes[id].potential.variables().iter().collect(),
        }
    }

    fn parent_of(&self, id: NodeId) -> Option<&CliqueNode> {
        self.nodes
            .get(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.nodes.get(p))
    }

    /// Variables in order of first appearance along the tree.
    pub fn variables(&self) -> Vec<&Variable> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .flat_map(|n| n.potential.variables())
            .filter(|v| seen.insert(v.id()))
            .collect()
    }
}
