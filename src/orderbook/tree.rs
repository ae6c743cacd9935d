//! Red-black tree of order nodes keyed by VM memory location.
//!
//! ## Storage
//!
//! Tree slots live in a [`Slab`]; links between slots are slab keys
//! (`usize`), not references. Cloning the tree is a flat copy of the slab,
//! which is what a proof session relies on to reconcile against a private
//! copy before committing.
//!
//! ## Two Topologies
//!
//! Each slot carries its own color and parent/child links, used only for
//! balancing. The stored [`OrderNode`] additionally carries the VM's view of
//! color and relatives; those are payload and are never consulted here.
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | find      | O(log n)   |
//! | insert    | O(log n)   |
//! | update    | O(log n)   |
//! | remove    | O(log n)   |
//! | iter      | O(n)       |

use std::cmp::Ordering;

use sha2::{Digest, Sha256};
use slab::Slab;

use crate::codec::encode_group;
use crate::error::TreeError;
use crate::orderbook::{Color, OrderNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Left,
    Right,
}

impl Dir {
    #[inline]
    fn flip(self) -> Self {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    node: OrderNode,
    color: Color,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

/// Balanced tree owning every live [`OrderNode`] of the book.
///
/// # Example
///
/// ```
/// use zkbook::orderbook::{OrderNode, OrderTree};
///
/// let mut tree = OrderTree::new();
/// tree.insert(OrderNode::new(271, 40, 49, 0, 1)).unwrap();
/// tree.insert(OrderNode::new(268, 2, 49, 0, 2)).unwrap();
///
/// let keys: Vec<u64> = tree.iter().map(|n| n.memory_location).collect();
/// assert_eq!(keys, vec![268, 271]);
/// assert!(tree.check_invariants().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrderTree {
    slots: Slab<Slot>,
    root: Option<usize>,
}

impl OrderTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Slab::with_capacity(capacity),
            root: None,
        }
    }

    // ========================================================================
    // Size
    // ========================================================================

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Key stored at the structural root, if any
    pub fn root_key(&self) -> Option<u64> {
        self.root.map(|i| self.slots[i].node.memory_location)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Look up a node by memory location
    pub fn find(&self, key: u64) -> Option<&OrderNode> {
        self.locate(key).map(|i| &self.slots[i].node)
    }

    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        self.locate(key).is_some()
    }

    /// Iterate nodes by ascending memory location.
    ///
    /// Every call starts a fresh traversal.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            tree: self,
            next: self.root.map(|r| self.minimum(r)),
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert a node under its memory location and rebalance.
    ///
    /// # Errors
    ///
    /// * [`TreeError::ReservedKey`] for memory location 0
    /// * [`TreeError::DuplicateKey`] if the key is already live
    pub fn insert(&mut self, node: OrderNode) -> Result<(), TreeError> {
        let key = node.memory_location;
        if key == 0 {
            return Err(TreeError::ReservedKey);
        }

        let mut parent = None;
        let mut dir = Dir::Left;
        let mut cur = self.root;
        while let Some(i) = cur {
            parent = Some(i);
            dir = match key.cmp(&self.slots[i].node.memory_location) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => return Err(TreeError::DuplicateKey(key)),
            };
            cur = self.child(i, dir);
        }

        let idx = self.slots.insert(Slot {
            node,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });
        match parent {
            None => self.root = Some(idx),
            Some(p) => self.set_child(p, dir, Some(idx)),
        }

        self.insert_fixup(idx);
        Ok(())
    }

    /// Replace the stored record for an existing key, returning the old one.
    ///
    /// The whole record is replaced, VM-reported links included; balancing
    /// structure is untouched.
    pub fn update(&mut self, node: OrderNode) -> Result<OrderNode, TreeError> {
        let key = node.memory_location;
        let i = self.locate(key).ok_or(TreeError::KeyNotFound(key))?;
        Ok(std::mem::replace(&mut self.slots[i].node, node))
    }

    /// Remove a node and rebalance, returning the removed record.
    pub fn remove(&mut self, key: u64) -> Result<OrderNode, TreeError> {
        let z = self.locate(key).ok_or(TreeError::KeyNotFound(key))?;
        let Slot {
            color: z_color,
            parent: z_parent,
            left: z_left,
            right: z_right,
            ..
        } = self.slots[z];

        // (color actually unlinked, node that took its place, that node's parent)
        let (removed_color, x, x_parent) = match (z_left, z_right) {
            (None, _) => {
                self.transplant(z, z_right);
                (z_color, z_right, z_parent)
            }
            (_, None) => {
                self.transplant(z, z_left);
                (z_color, z_left, z_parent)
            }
            (Some(l), Some(r)) => {
                // Successor takes z's place and color
                let y = self.minimum(r);
                let y_color = self.slots[y].color;
                let x = self.slots[y].right;
                let x_parent = if y == r {
                    Some(y)
                } else {
                    let y_parent = self.slots[y].parent;
                    self.transplant(y, x);
                    self.slots[y].right = Some(r);
                    self.slots[r].parent = Some(y);
                    y_parent
                };
                self.transplant(z, Some(y));
                self.slots[y].left = Some(l);
                self.slots[l].parent = Some(y);
                self.slots[y].color = z_color;
                (y_color, x, x_parent)
            }
        };

        let removed = self.slots.remove(z).node;
        if removed_color == Color::Black {
            self.remove_fixup(x, x_parent);
        }
        Ok(removed)
    }

    /// Remove every node
    pub fn clear(&mut self) {
        self.slots.clear();
        self.root = None;
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Check red-black and search-order invariants of the balancing structure.
    ///
    /// Returns the black height (nil leaves count as one).
    pub fn check_invariants(&self) -> Result<usize, TreeError> {
        let Some(root) = self.root else {
            return if self.slots.is_empty() {
                Ok(1)
            } else {
                Err(TreeError::Corrupted { key: 0, reason: "slots without a root" })
            };
        };
        let slot = &self.slots[root];
        if slot.color != Color::Black {
            return Err(self.corrupted(root, "red root"));
        }
        if slot.parent.is_some() {
            return Err(self.corrupted(root, "root has a parent"));
        }

        let (height, count) = self.check_subtree(root, None, None)?;
        if count != self.slots.len() {
            return Err(self.corrupted(root, "unreachable slots"));
        }
        Ok(height)
    }

    /// SHA-256 over the VM words of every live node in key order
    pub fn state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for node in self.iter() {
            for word in encode_group(node) {
                hasher.update(word.to_le_bytes());
            }
        }
        let result = hasher.finalize();

        let mut root = [0u8; 32];
        root.copy_from_slice(&result);
        root
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn locate(&self, key: u64) -> Option<usize> {
        let mut cur = self.root;
        while let Some(i) = cur {
            cur = match key.cmp(&self.slots[i].node.memory_location) {
                Ordering::Less => self.slots[i].left,
                Ordering::Greater => self.slots[i].right,
                Ordering::Equal => return Some(i),
            };
        }
        None
    }

    #[inline]
    fn child(&self, i: usize, dir: Dir) -> Option<usize> {
        match dir {
            Dir::Left => self.slots[i].left,
            Dir::Right => self.slots[i].right,
        }
    }

    #[inline]
    fn set_child(&mut self, i: usize, dir: Dir, child: Option<usize>) {
        match dir {
            Dir::Left => self.slots[i].left = child,
            Dir::Right => self.slots[i].right = child,
        }
    }

    /// Nil counts as black
    #[inline]
    fn color_of(&self, i: Option<usize>) -> Color {
        i.map_or(Color::Black, |i| self.slots[i].color)
    }

    #[inline]
    fn paint(&mut self, i: Option<usize>, color: Color) {
        if let Some(i) = i {
            self.slots[i].color = color;
        }
    }

    fn minimum(&self, mut i: usize) -> usize {
        while let Some(l) = self.slots[i].left {
            i = l;
        }
        i
    }

    fn successor(&self, i: usize) -> Option<usize> {
        if let Some(r) = self.slots[i].right {
            return Some(self.minimum(r));
        }
        let mut cur = i;
        let mut up = self.slots[i].parent;
        while let Some(p) = up {
            if self.slots[p].left == Some(cur) {
                return Some(p);
            }
            cur = p;
            up = self.slots[p].parent;
        }
        None
    }

    /// Rotate `x` down towards `dir`; its opposite child takes its place.
    fn rotate(&mut self, x: usize, dir: Dir) {
        let Some(y) = self.child(x, dir.flip()) else {
            return;
        };

        let inner = self.child(y, dir);
        self.set_child(x, dir.flip(), inner);
        if let Some(b) = inner {
            self.slots[b].parent = Some(x);
        }

        let x_parent = self.slots[x].parent;
        self.slots[y].parent = x_parent;
        match x_parent {
            None => self.root = Some(y),
            Some(p) if self.slots[p].left == Some(x) => self.slots[p].left = Some(y),
            Some(p) => self.slots[p].right = Some(y),
        }

        self.set_child(y, dir, Some(x));
        self.slots[x].parent = Some(y);
    }

    /// Put `v` where `u` hangs from its parent
    fn transplant(&mut self, u: usize, v: Option<usize>) {
        let parent = self.slots[u].parent;
        match parent {
            None => self.root = v,
            Some(p) if self.slots[p].left == Some(u) => self.slots[p].left = v,
            Some(p) => self.slots[p].right = v,
        }
        if let Some(v) = v {
            self.slots[v].parent = parent;
        }
    }

    fn insert_fixup(&mut self, mut z: usize) {
        while let Some(p) = self.slots[z].parent {
            if self.slots[p].color == Color::Black {
                break;
            }
            // A red parent is never the root
            let Some(g) = self.slots[p].parent else {
                break;
            };
            let side = if self.slots[g].left == Some(p) {
                Dir::Left
            } else {
                Dir::Right
            };

            let uncle = self.child(g, side.flip());
            if self.color_of(uncle) == Color::Red {
                self.slots[p].color = Color::Black;
                self.paint(uncle, Color::Black);
                self.slots[g].color = Color::Red;
                z = g;
                continue;
            }

            // Inner grandchild: straighten into the outer case first
            if self.child(p, side.flip()) == Some(z) {
                z = p;
                self.rotate(z, side);
            }

            let Some(p) = self.slots[z].parent else {
                break;
            };
            let Some(g) = self.slots[p].parent else {
                break;
            };
            self.slots[p].color = Color::Black;
            self.slots[g].color = Color::Red;
            self.rotate(g, side.flip());
        }

        let root = self.root;
        self.paint(root, Color::Black);
    }

    /// Resolve a double-black at `x` (possibly nil, hence the explicit parent)
    fn remove_fixup(&mut self, mut x: Option<usize>, mut parent: Option<usize>) {
        while x != self.root && self.color_of(x) == Color::Black {
            let Some(p) = parent else {
                break;
            };
            let side = if self.slots[p].left == x {
                Dir::Left
            } else {
                Dir::Right
            };

            let mut sibling = self.child(p, side.flip());
            if self.color_of(sibling) == Color::Red {
                self.paint(sibling, Color::Black);
                self.slots[p].color = Color::Red;
                self.rotate(p, side);
                sibling = self.child(p, side.flip());
            }

            // A double-black node always has a real sibling
            let Some(mut w) = sibling else {
                x = Some(p);
                parent = self.slots[p].parent;
                continue;
            };

            let near = self.child(w, side);
            let far = self.child(w, side.flip());
            if self.color_of(near) == Color::Black && self.color_of(far) == Color::Black {
                self.slots[w].color = Color::Red;
                x = Some(p);
                parent = self.slots[p].parent;
                continue;
            }

            if self.color_of(far) == Color::Black {
                self.paint(near, Color::Black);
                self.slots[w].color = Color::Red;
                self.rotate(w, side.flip());
                match self.child(p, side.flip()) {
                    Some(s) => w = s,
                    None => break,
                }
            }

            self.slots[w].color = self.slots[p].color;
            self.slots[p].color = Color::Black;
            let far = self.child(w, side.flip());
            self.paint(far, Color::Black);
            self.rotate(p, side);
            x = self.root;
            parent = None;
        }

        self.paint(x, Color::Black);
    }

    fn corrupted(&self, i: usize, reason: &'static str) -> TreeError {
        TreeError::Corrupted {
            key: self.slots[i].node.memory_location,
            reason,
        }
    }

    /// Returns (black height, node count) of the subtree at `i`
    fn check_subtree(
        &self,
        i: usize,
        low: Option<u64>,
        high: Option<u64>,
    ) -> Result<(usize, usize), TreeError> {
        let slot = &self.slots[i];
        let key = slot.node.memory_location;
        if key == 0 {
            return Err(self.corrupted(i, "reserved key in tree"));
        }
        if low.is_some_and(|low| key <= low) || high.is_some_and(|high| key >= high) {
            return Err(self.corrupted(i, "key out of order"));
        }

        let mut heights = [1usize; 2];
        let mut count = 1;
        for (n, (child, low, high)) in [(slot.left, low, Some(key)), (slot.right, Some(key), high)]
            .into_iter()
            .enumerate()
        {
            let Some(c) = child else {
                continue;
            };
            if self.slots[c].parent != Some(i) {
                return Err(self.corrupted(c, "broken parent link"));
            }
            if slot.color == Color::Red && self.slots[c].color == Color::Red {
                return Err(self.corrupted(i, "red node with red child"));
            }
            let (h, sub) = self.check_subtree(c, low, high)?;
            heights[n] = h;
            count += sub;
        }

        if heights[0] != heights[1] {
            return Err(self.corrupted(i, "unequal black height"));
        }
        let own = usize::from(slot.color == Color::Black);
        Ok((heights[0] + own, count))
    }
}

/// In-order iterator over an [`OrderTree`]
pub struct Iter<'a> {
    tree: &'a OrderTree,
    next: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a OrderNode;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.next?;
        self.next = self.tree.successor(i);
        Some(&self.tree.slots[i].node)
    }
}

impl<'a> IntoIterator for &'a OrderTree {
    type Item = &'a OrderNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: u64) -> OrderNode {
        OrderNode::new(key, key * 10, 49, 1688473000 + key, key + 1000)
    }

    fn keys(tree: &OrderTree) -> Vec<u64> {
        tree.iter().map(|n| n.memory_location).collect()
    }

    #[test]
    fn test_tree_new() {
        let tree = OrderTree::new();

        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(tree.root_key().is_none());
        assert_eq!(tree.iter().count(), 0);
        assert_eq!(tree.check_invariants(), Ok(1));
    }

    #[test]
    fn test_tree_insert_ascending() {
        let mut tree = OrderTree::with_capacity(64);

        for key in 1..=64 {
            tree.insert(node(key)).unwrap();
            tree.check_invariants().unwrap();
        }

        assert_eq!(tree.len(), 64);
        assert_eq!(keys(&tree), (1..=64).collect::<Vec<_>>());
    }

    #[test]
    fn test_tree_insert_descending() {
        let mut tree = OrderTree::new();

        for key in (1..=64).rev() {
            tree.insert(node(key)).unwrap();
            tree.check_invariants().unwrap();
        }

        assert_eq!(keys(&tree), (1..=64).collect::<Vec<_>>());
    }

    #[test]
    fn test_tree_insert_rebalances_root() {
        let mut tree = OrderTree::new();

        tree.insert(node(1)).unwrap();
        tree.insert(node(2)).unwrap();
        tree.insert(node(3)).unwrap();

        // Left rotation at 1 promotes 2
        assert_eq!(tree.root_key(), Some(2));
        assert_eq!(tree.check_invariants(), Ok(2));
    }

    #[test]
    fn test_tree_insert_duplicate() {
        let mut tree = OrderTree::new();

        tree.insert(node(268)).unwrap();
        assert_eq!(tree.insert(node(268)), Err(TreeError::DuplicateKey(268)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_tree_insert_reserved_key() {
        let mut tree = OrderTree::new();

        assert_eq!(tree.insert(node(0)), Err(TreeError::ReservedKey));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_tree_find() {
        let mut tree = OrderTree::new();
        for key in [271, 268, 274] {
            tree.insert(node(key)).unwrap();
        }

        assert_eq!(tree.find(268), Some(&node(268)));
        assert!(tree.contains(274));
        assert!(tree.find(300).is_none());
        assert!(!tree.contains(0));
    }

    #[test]
    fn test_tree_update_replaces_record() {
        let mut tree = OrderTree::new();
        for key in 1..=7 {
            tree.insert(node(key)).unwrap();
        }
        let root_before = tree.root_key();

        let replacement = OrderNode::new(5, 2, 48, 1, 2)
            .with_color(Color::Red)
            .with_links(4, 0, 6);
        let old = tree.update(replacement).unwrap();

        assert_eq!(old, node(5));
        assert_eq!(tree.find(5), Some(&replacement));
        assert_eq!(tree.root_key(), root_before);
        assert_eq!(keys(&tree), (1..=7).collect::<Vec<_>>());
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_tree_update_missing() {
        let mut tree = OrderTree::new();
        assert_eq!(tree.update(node(9)), Err(TreeError::KeyNotFound(9)));
    }

    #[test]
    fn test_tree_remove_leaf_internal_root() {
        let mut tree = OrderTree::new();
        for key in 1..=15 {
            tree.insert(node(key)).unwrap();
        }

        // Leaf
        assert_eq!(tree.remove(15).unwrap(), node(15));
        tree.check_invariants().unwrap();

        // Internal node with two children
        assert_eq!(tree.remove(4).unwrap(), node(4));
        tree.check_invariants().unwrap();

        // Root
        let root = tree.root_key().unwrap();
        assert_eq!(tree.remove(root).unwrap(), node(root));
        tree.check_invariants().unwrap();

        assert_eq!(tree.len(), 12);
        assert!(!tree.contains(4));
        assert!(!tree.contains(root));
    }

    #[test]
    fn test_tree_remove_missing() {
        let mut tree = OrderTree::new();
        tree.insert(node(1)).unwrap();

        assert_eq!(tree.remove(2), Err(TreeError::KeyNotFound(2)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_tree_remove_all_interleaved() {
        let mut tree = OrderTree::new();
        for key in 1..=100 {
            tree.insert(node(key * 3 % 101)).unwrap();
        }

        // Remove in a different scrambled order
        for key in 1..=100 {
            let key = key * 7 % 101;
            tree.remove(key).unwrap();
            tree.check_invariants().unwrap();
        }

        assert!(tree.is_empty());
        assert!(tree.root_key().is_none());
    }

    #[test]
    fn test_tree_reinsert_after_remove() {
        let mut tree = OrderTree::new();
        tree.insert(node(10)).unwrap();
        tree.remove(10).unwrap();
        tree.insert(node(10)).unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_key(), Some(10));
    }

    #[test]
    fn test_tree_iter_restartable() {
        let mut tree = OrderTree::new();
        for key in [5, 3, 8, 1, 4] {
            tree.insert(node(key)).unwrap();
        }

        let first: Vec<_> = tree.iter().collect();
        let second: Vec<_> = (&tree).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(keys(&tree), vec![1, 3, 4, 5, 8]);
    }

    #[test]
    fn test_tree_clone_is_independent() {
        let mut tree = OrderTree::new();
        tree.insert(node(1)).unwrap();
        tree.insert(node(2)).unwrap();

        let mut copy = tree.clone();
        copy.remove(1).unwrap();
        copy.insert(node(3)).unwrap();

        assert_eq!(keys(&tree), vec![1, 2]);
        assert_eq!(keys(&copy), vec![2, 3]);
    }

    #[test]
    fn test_tree_state_root() {
        let mut a = OrderTree::new();
        let mut b = OrderTree::new();
        for key in [1, 2, 3] {
            a.insert(node(key)).unwrap();
        }
        for key in [3, 1, 2] {
            b.insert(node(key)).unwrap();
        }

        // Insertion order does not matter, contents do
        assert_eq!(a.state_root(), b.state_root());

        b.update(OrderNode::new(2, 1, 1, 1, 1)).unwrap();
        assert_ne!(a.state_root(), b.state_root());
    }

    #[test]
    fn test_tree_clear() {
        let mut tree = OrderTree::new();
        tree.insert(node(1)).unwrap();
        tree.clear();

        assert!(tree.is_empty());
        assert!(tree.find(1).is_none());
        tree.check_invariants().unwrap();
    }
}
