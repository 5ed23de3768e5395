/// Invalidation selector: choose the node that will produce invalid text and
/// force every ancestor to route generation through it.

use rand::Rng;
use tracing::debug;

use crate::ast::{Ast, NodeId};
use crate::error::GenError;

/// For every node on the path from the root to the invalid node, the child
/// the path continues through. Alternations take that child; repeats may not
/// iterate zero times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedPath {
    via: Vec<Option<NodeId>>,
}

impl ReservedPath {
    /// Mark the ancestors of `chosen`. The chosen node itself is not reserved.
    pub fn reserve(ast: &Ast, chosen: NodeId) -> Self {
        let mut via = vec![None; ast.len()];
        let mut child = chosen;
        while let Some(parent) = ast.parent(child) {
            via[parent.index()] = Some(child);
            child = parent;
        }
        ReservedPath { via }
    }

    /// The child an alternation must take, if it lies on the path.
    pub fn branch(&self, id: NodeId) -> Option<NodeId> {
        self.via.get(id.index()).copied().flatten()
    }

    pub fn is_reserved(&self, id: NodeId) -> bool {
        self.branch(id).is_some()
    }
}

/// Pick one invalidatable candidate uniformly at random.
pub fn select_invalid_node<R: Rng + ?Sized>(
    ast: &Ast,
    candidates: &[NodeId],
    pattern: &str,
    rng: &mut R,
) -> Result<NodeId, GenError> {
    let mut eligible: Vec<NodeId> = candidates
        .iter()
        .copied()
        .filter(|id| ast.is_invalidatable(*id))
        .collect();
    eligible.sort_unstable();
    eligible.dedup();

    if eligible.is_empty() {
        return Err(GenError::NoInvalidatableNode {
            pattern: pattern.to_string(),
        });
    }
    let chosen = eligible[rng.random_range(0..eligible.len())];
    debug!(
        pattern,
        eligible = eligible.len(),
        chosen = chosen.index(),
        "selected invalid node"
    );
    Ok(chosen)
}
