//! Applies the proving VM's output buffer to an [`OrderTree`].
//!
//! ## Classification
//!
//! Every complete 9-word group is classified against the tree as it stands
//! at that point in the pass, in buffer order:
//!
//! 1. memory location not in the tree → **insert**
//! 2. parent and both children zero → **delete**
//! 3. otherwise → **update** (full record replace)
//!
//! A node that is the only one left in the book legitimately has no
//! relatives, so for it rule 2 additionally requires a zero quantity; a live
//! lone root is updated instead.
//!
//! The VM pads its output buffer with zeros: a short tail stops the pass
//! without failing it, and an all-zero group is skipped.

use tracing::{debug, warn};

use crate::codec::GroupReader;
use crate::error::ReconcileError;
use crate::orderbook::{OrderNode, OrderTree};

/// What a decoded group does to the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Insert,
    Update,
    Delete,
}

/// Counts of what a reconciliation pass applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    /// All-zero groups skipped as padding
    pub padding_groups: usize,
    /// Trailing words that did not form a complete group
    pub discarded_words: usize,
}

impl ReconcileSummary {
    /// Complete groups applied
    pub fn groups(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

/// Decide how `candidate` applies to `tree`
pub fn classify(tree: &OrderTree, candidate: &OrderNode) -> Mutation {
    if !tree.contains(candidate.memory_location) {
        return Mutation::Insert;
    }
    if !candidate.is_unlinked() {
        return Mutation::Update;
    }
    if tree.len() == 1 && candidate.quantity != 0 {
        // Live lone root
        return Mutation::Update;
    }
    Mutation::Delete
}

/// Apply every complete group of `words` to `tree`, in order.
///
/// # Errors
///
/// A tree error aborts the pass. Groups before the failing one have already
/// been applied, so callers reconcile against a copy they can discard.
///
/// # Example
///
/// ```
/// use zkbook::engine::reconcile;
/// use zkbook::orderbook::{OrderNode, OrderTree};
///
/// let mut tree = OrderTree::new();
/// tree.insert(OrderNode::new(1, 10, 50, 1000, 1)).unwrap();
///
/// let output = [1, 1, 0, 2, 0, 5, 50, 1000, 1, 2, 0, 1, 0, 0, 0, 0, 0, 0];
/// let summary = reconcile(&mut tree, &output).unwrap();
///
/// assert_eq!((summary.updated, summary.inserted), (1, 1));
/// assert_eq!(tree.len(), 2);
/// ```
pub fn reconcile(tree: &mut OrderTree, words: &[u64]) -> Result<ReconcileSummary, ReconcileError> {
    let mut reader = GroupReader::new(words);
    let mut summary = ReconcileSummary::default();

    loop {
        let group = reader.groups_read();
        let candidate = match reader.next_group() {
            Ok(Some(node)) => node,
            Ok(None) => break,
            Err(err) => {
                // Only a partial tail group fails to decode
                summary.discarded_words = reader.remaining();
                warn!(%err, "discarding trailing words of output buffer");
                break;
            }
        };

        if candidate == OrderNode::default() {
            summary.padding_groups += 1;
            continue;
        }

        let key = candidate.memory_location;
        let mutation = classify(tree, &candidate);
        debug!(group, key, ?mutation, "applying group");

        let applied = match mutation {
            Mutation::Insert => tree.insert(candidate).map(|_| summary.inserted += 1),
            Mutation::Update => tree.update(candidate).map(|_| summary.updated += 1),
            Mutation::Delete => tree.remove(key).map(|_| summary.deleted += 1),
        };
        applied.map_err(|source| ReconcileError::Apply {
            group,
            memory_location: key,
            source,
        })?;
    }

    Ok(summary)
}

// ============================================================================
// Unit Tests
// ============================================================================
