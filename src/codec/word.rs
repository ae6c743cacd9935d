//! Fixed-stride word groups.
//!
//! The proving VM reports every node it touched as 9 consecutive words. The
//! output buffer is padded by the VM, so a short tail is expected and is
//! reported as [`CodecError::MalformedGroup`] by [`GroupReader`].

use crate::error::CodecError;
use crate::orderbook::{Color, OrderNode};

/// Words per node group
pub const GROUP_WORDS: usize = 9;

/// Encode a node as its VM word group
///
/// ```text
/// [memory_location, color, parent_id, left_child_id, right_child_id,
///  quantity, price, timestamp, order_id]
/// ```
pub fn encode_group(node: &OrderNode) -> [u64; GROUP_WORDS] {
    [
        node.memory_location,
        node.color.to_word(),
        node.parent_id,
        node.left_child_id,
        node.right_child_id,
        node.quantity,
        node.price,
        node.timestamp,
        node.order_id,
    ]
}

/// Decode a VM word group into a node. Positional, no validation; the exact
/// inverse of [`encode_group`].
pub fn decode_group(words: &[u64; GROUP_WORDS]) -> OrderNode {
    let [
        memory_location,
        color,
        parent_id,
        left_child_id,
        right_child_id,
        quantity,
        price,
        timestamp,
        order_id,
    ] = *words;
    OrderNode {
        memory_location,
        color: Color::from_word(color),
        parent_id,
        left_child_id,
        right_child_id,
        quantity,
        price,
        timestamp,
        order_id,
    }
}

/// Consumes a flat word buffer in strides of [`GROUP_WORDS`].
///
/// # Example
///
/// ```
/// use zkbook::codec::GroupReader;
///
/// let words = [1, 1, 0, 2, 0, 5, 50, 1000, 1, 7, 7];
/// let mut reader = GroupReader::new(&words);
///
/// let node = reader.next_group().unwrap().unwrap();
/// assert_eq!(node.memory_location, 1);
///
/// // Two stray words left over
/// assert!(reader.next_group().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct GroupReader<'a> {
    words: &'a [u64],
    offset: usize,
}

impl<'a> GroupReader<'a> {
    pub fn new(words: &'a [u64]) -> Self {
        Self { words, offset: 0 }
    }

    /// Decode the next group.
    ///
    /// Returns `Ok(None)` when the buffer is exhausted on a group boundary and
    /// [`CodecError::MalformedGroup`] when a partial group remains. The
    /// reader does not advance past a malformed tail.
    pub fn next_group(&mut self) -> Result<Option<OrderNode>, CodecError> {
        let rest = &self.words[self.offset..];
        if rest.is_empty() {
            return Ok(None);
        }
        let Some(group) = rest.first_chunk::<GROUP_WORDS>() else {
            return Err(CodecError::MalformedGroup {
                remaining: rest.len(),
                expected: GROUP_WORDS,
            });
        };
        self.offset += GROUP_WORDS;
        Ok(Some(decode_group(group)))
    }

    /// Words not yet consumed
    #[inline]
    pub fn remaining(&self) -> usize {
        self.words.len() - self.offset
    }

    /// Complete groups consumed so far
    #[inline]
    pub fn groups_read(&self) -> usize {
        self.offset / GROUP_WORDS
    }
}
