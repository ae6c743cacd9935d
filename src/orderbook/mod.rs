//! Order book storage for the proving VM.
//!
//! ## Architecture
//!
//! The book is a single red-black tree keyed by VM memory location:
//!
//! - **Slab-based storage**: tree slots live in a pre-allocatable arena
//! - **Key order**: in-order traversal yields ascending memory locations,
//!   which is the order nodes are laid out in the advice map
//!
//! ## Components
//!
//! - [`OrderNode`]: one 9-word VM memory group
//! - [`OrderTree`]: balanced tree owning every live node
//!
//! ## Example
//!
//! ```
//! use zkbook::orderbook::{OrderNode, OrderTree};
//!
//! let mut tree = OrderTree::with_capacity(1_000);
//! tree.insert(OrderNode::new(259, 10, 50, 1688473000, 1)).unwrap();
//!
//! assert_eq!(tree.find(259).map(|n| n.price), Some(50));
//! ```

pub mod node;
pub mod tree;

pub use node::{Color, OrderNode};
pub use tree::{Iter, OrderTree};
