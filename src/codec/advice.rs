//! Advice map: the keyed tree snapshot the proving VM loads as input.
//!
//! ## Key Format
//!
//! Keys are 64 lowercase hex characters: the 1-based ordinal of the node in
//! key order, left-padded with zeros to 50 characters, followed by a fixed
//! 14-character zero suffix. Ordinal 0, the all-zero key, holds the control
//! record.
//!
//! ## Values
//!
//! ```text
//! node:    [0, 0, 0, memory_location, color, parent_id, left_child_id,
//!           right_child_id, quantity, price, timestamp, order_id]
//! control: [0, 0, 0, node_count]
//! ```
//!
//! Ordinals are reassigned on every encode; only the key to node mapping of
//! a single round is meaningful.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::word::{decode_group, encode_group, GROUP_WORDS};
use crate::error::CodecError;
use crate::orderbook::OrderTree;

/// Hex characters holding the ordinal
pub const KEY_ORDINAL_WIDTH: usize = 50;

/// Fixed zero suffix appended to every key
pub const KEY_SUFFIX: &str = "00000000000000";

/// Total key length in hex characters
pub const KEY_LEN: usize = KEY_ORDINAL_WIDTH + KEY_SUFFIX.len();

/// Reserved zero words in front of every value
pub const VALUE_PADDING: usize = 3;

/// Words in a node value
pub const NODE_VALUE_WORDS: usize = VALUE_PADDING + GROUP_WORDS;

/// Words in the control value
pub const CONTROL_VALUE_WORDS: usize = VALUE_PADDING + 1;

/// Build the advice key for an ordinal
///
/// ```
/// use zkbook::codec::advice_key;
///
/// let key = advice_key(26);
/// assert_eq!(key.len(), 64);
/// assert!(key.starts_with("000"));
/// assert!(key.ends_with("1a00000000000000"));
/// ```
pub fn advice_key(ordinal: u64) -> String {
    format!("{ordinal:0width$x}{KEY_SUFFIX}", width = KEY_ORDINAL_WIDTH)
}

/// The all-zero key of the control record
pub fn control_key() -> String {
    advice_key(0)
}

/// Recover the ordinal from an advice key
pub fn parse_advice_key(key: &str) -> Result<u64, CodecError> {
    let invalid = || CodecError::InvalidAdviceKey(key.to_string());

    if key.len() != KEY_LEN || !key.is_ascii() {
        return Err(invalid());
    }
    let (ordinal, suffix) = key.split_at(KEY_ORDINAL_WIDTH);
    if suffix != KEY_SUFFIX {
        return Err(invalid());
    }
    // Everything beyond the last 16 hex digits must be zero to fit a u64
    let (high, low) = ordinal.split_at(KEY_ORDINAL_WIDTH - 16);
    if high.bytes().any(|b| b != b'0') {
        return Err(invalid());
    }
    u64::from_str_radix(low, 16).map_err(|_| invalid())
}

/// Advice map keyed by hex key. Iteration is in key order, which for
/// fixed-width keys is ordinal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdviceMap(BTreeMap<String, Vec<u64>>);

impl AdviceMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[u64]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn insert(&mut self, key: String, value: Vec<u64>) -> Option<Vec<u64>> {
        self.0.insert(key, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Node count recorded in the control entry
    pub fn node_count(&self) -> Option<u64> {
        self.get(&control_key()).and_then(|v| v.get(VALUE_PADDING).copied())
    }
}

/// Encode every live node of `tree` plus the control record.
///
/// # Example
///
/// ```
/// use zkbook::codec::{control_key, encode_snapshot};
/// use zkbook::orderbook::OrderTree;
///
/// let map = encode_snapshot(&OrderTree::new());
///
/// assert_eq!(map.len(), 1);
/// assert_eq!(map.get(&control_key()), Some(&[0, 0, 0, 0][..]));
/// ```
pub fn encode_snapshot(tree: &OrderTree) -> AdviceMap {
    let mut map = AdviceMap::new();
    let mut count = 0u64;

    for node in tree.iter() {
        count += 1;
        let mut value = Vec::with_capacity(NODE_VALUE_WORDS);
        value.extend_from_slice(&[0; VALUE_PADDING]);
        value.extend_from_slice(&encode_group(node));
        map.insert(advice_key(count), value);
    }

    map.insert(control_key(), vec![0, 0, 0, count]);
    map
}

/// Rebuild a tree from an advice map.
///
/// Used to seed the book from an initial snapshot. The control record is
/// required and its count must match the node entries.
pub fn decode_snapshot(map: &AdviceMap) -> Result<OrderTree, CodecError> {
    let control = control_key();
    let expected = match map.get(&control) {
        Some(value) if value.len() == CONTROL_VALUE_WORDS => value[VALUE_PADDING],
        Some(value) => {
            return Err(CodecError::MalformedAdviceValue {
                key: control,
                len: value.len(),
            })
        }
        None => return Err(CodecError::MissingControlRecord),
    };

    let mut tree = OrderTree::with_capacity(map.len().saturating_sub(1));
    for (key, value) in map.iter() {
        if parse_advice_key(key)? == 0 {
            continue;
        }
        let group = value
            .get(VALUE_PADDING..)
            .and_then(|words| <&[u64; GROUP_WORDS]>::try_from(words).ok())
            .ok_or_else(|| CodecError::MalformedAdviceValue {
                key: key.to_string(),
                len: value.len(),
            })?;
        tree.insert(decode_group(group))?;
    }

    let actual = tree.len() as u64;
    if actual != expected {
        return Err(CodecError::NodeCountMismatch { expected, actual });
    }
    Ok(tree)
}
