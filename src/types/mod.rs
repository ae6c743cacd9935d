//! Core data types for zkbook.
//!
//! ## Types
//!
//! - [`PendingAction`]: an order waiting to be proven
//! - [`Side`]: Buy or Sell
//! - [`SessionReceipt`]: summary of a committed proving round

mod action;
mod receipt;

pub use action::{PendingAction, Side};
pub use receipt::SessionReceipt;
