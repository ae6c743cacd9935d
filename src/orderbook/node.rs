//! Order node as laid out in the proving VM's memory.
//!
//! ## Memory Layout
//!
//! The VM stores every order as one 9-word group:
//!
//! ```text
//! [memory_location, color, parent_id, left_child_id, right_child_id,
//!  quantity, price, timestamp, order_id]
//! ```
//!
//! The relational fields (`parent_id`, `left_child_id`, `right_child_id`) are
//! memory locations of other nodes, with `0` meaning "no link". They describe
//! the VM's own view of the tree and are stored verbatim: the host tree keeps
//! its balancing structure separately (see [`OrderTree`](super::OrderTree)).

/// Red-black coloring word.
///
/// The host tree only ever uses `Black` and `Red`. Payload colors are the
/// VM's words and are kept verbatim: the VM marks its init node with `2`,
/// which decodes to `Other(2)` and encodes back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Word value 0
    #[default]
    Black,
    /// Word value 1
    Red,
    /// Any word above 1
    Other(u64),
}

impl Color {
    /// Encode as a VM word
    #[inline]
    pub fn to_word(self) -> u64 {
        match self {
            Color::Black => 0,
            Color::Red => 1,
            Color::Other(word) => word,
        }
    }

    /// Decode from a VM word
    #[inline]
    pub fn from_word(word: u64) -> Self {
        match word {
            0 => Color::Black,
            1 => Color::Red,
            word => Color::Other(word),
        }
    }
}

/// One order in the book, exactly as the VM sees it.
///
/// # Example
///
/// ```
/// use zkbook::orderbook::{Color, OrderNode};
///
/// let node = OrderNode::new(268, 5, 49, 1688473018, 4929032);
///
/// assert_eq!(node.color, Color::Black);
/// assert!(node.is_unlinked());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OrderNode {
    /// VM memory address; doubles as the tree key
    pub memory_location: u64,

    /// Coloring bit as reported by the VM
    pub color: Color,

    /// Address of the parent node (0 for the VM's root)
    pub parent_id: u64,

    /// Address of the left child (0 if none)
    pub left_child_id: u64,

    /// Address of the right child (0 if none)
    pub right_child_id: u64,

    pub quantity: u64,
    pub price: u64,
    pub timestamp: u64,
    pub order_id: u64,
}

impl OrderNode {
    /// Create an unlinked black node carrying the given order payload
    pub fn new(
        memory_location: u64,
        quantity: u64,
        price: u64,
        timestamp: u64,
        order_id: u64,
    ) -> Self {
        Self {
            memory_location,
            quantity,
            price,
            timestamp,
            order_id,
            ..Self::default()
        }
    }

    /// Builder-style setter for the VM-reported relatives
    pub fn with_links(mut self, parent_id: u64, left_child_id: u64, right_child_id: u64) -> Self {
        self.parent_id = parent_id;
        self.left_child_id = left_child_id;
        self.right_child_id = right_child_id;
        self
    }

    /// Builder-style setter for the coloring bit
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// True when parent and both children are all zero.
    ///
    /// For a node that already exists in the book this is how the VM marks a
    /// deletion, but it is also what a lone root legitimately looks like.
    #[inline]
    pub fn is_unlinked(&self) -> bool {
        self.parent_id == 0 && self.left_child_id == 0 && self.right_child_id == 0
    }

    /// Tree key
    #[inline]
    pub fn key(&self) -> u64 {
        self.memory_location
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_words() {
        assert_eq!(Color::Black.to_word(), 0);
        assert_eq!(Color::Red.to_word(), 1);
        assert_eq!(Color::from_word(0), Color::Black);
        assert_eq!(Color::from_word(1), Color::Red);
        assert_eq!(Color::from_word(7), Color::Other(7));
    }

    #[test]
    fn test_color_marker_word_kept_verbatim() {
        let marker = Color::from_word(2);

        assert_eq!(marker, Color::Other(2));
        assert_ne!(marker, Color::Red);
        assert_eq!(marker.to_word(), 2);
    }

    #[test]
    fn test_order_node_new() {
        let node = OrderNode::new(271, 40, 49, 1688473214, 2697766);

        assert_eq!(node.key(), 271);
        assert_eq!(node.color, Color::Black);
        assert_eq!(node.quantity, 40);
        assert_eq!(node.price, 49);
        assert!(node.is_unlinked());
    }

    #[test]
    fn test_order_node_linking() {
        let node = OrderNode::new(271, 40, 49, 0, 1);
        assert!(node.is_unlinked());

        let node = node.with_links(277, 0, 0);
        assert!(!node.is_unlinked());

        let node = node.with_links(0, 280, 0);
        assert!(!node.is_unlinked());

        let node = node.with_links(0, 0, 0).with_color(Color::Red);
        assert!(node.is_unlinked());
        assert_eq!(node.color, Color::Red);
    }
}
