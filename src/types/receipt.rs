//! Session receipt for a committed proving round.
//!
//! The receipt summarizes what a round did to the book and pins the
//! resulting book with a state root, so rounds can be audited without the
//! full advice map.

use ssz_rs::prelude::*;

/// Receipt for one committed proof session.
///
/// ## State Root
///
/// SHA-256 over the VM words of every live node in key order, see
/// [`OrderTree::state_root`](crate::orderbook::OrderTree::state_root).
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct SessionReceipt {
    /// Round sequence number (1-based)
    pub round: u64,

    /// Provisional order id of the action that was proven
    pub order_id: u64,

    /// Groups applied as inserts
    pub inserted: u64,

    /// Groups applied as full-record updates
    pub updated: u64,

    /// Groups applied as deletions
    pub deleted: u64,

    /// Live nodes after commit
    pub node_count: u64,

    /// Execution trace length reported by the prover
    pub trace_len: u64,

    /// Book state root after commit
    pub state_root: [u8; 32],

    /// Whether the proof verified against the proven input
    pub verified: bool,
}

impl SessionReceipt {
    /// Get the state root as a hex string
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }

    /// Total groups applied
    pub fn mutations(&self) -> u64 {
        self.inserted + self.updated + self.deleted
    }

    /// Deterministic SSZ encoding
    pub fn to_ssz_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        ssz_rs::serialize(self)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
