//! Word codec between [`OrderNode`](crate::orderbook::OrderNode) records and
//! the proving VM's flat memory.
//!
//! - [`word`]: 9-word node groups, as emitted by the VM
//! - [`advice`]: keyed tree snapshot, as consumed by the VM

pub mod advice;
pub mod word;

pub use advice::{
    advice_key, control_key, decode_snapshot, encode_snapshot, parse_advice_key, AdviceMap,
};
pub use word::{decode_group, encode_group, GroupReader, GROUP_WORDS};
