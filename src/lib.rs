//! # zkbook
//!
//! Red-black order book mirrored into a ZK proving VM's memory layout.
//!
//! ## Architecture
//!
//! - **Types**: Pending actions and session receipts
//! - **OrderBook**: Slab-backed red-black tree of order nodes
//! - **Codec**: 9-word node groups and the advice map the VM reads
//! - **Prover**: The proving engine boundary and a deterministic mock
//! - **Engine**: Proof sessions that reconcile VM output into the book
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Identical book and action produce an identical program input
//! 2. **Integer Words**: Every value is a `u64` word, exactly as the VM sees it
//! 3. **Atomic Commit**: The live tree only changes once a round fully reconciles
//! 4. **Synchronous Execution**: One session per book at a time, no async

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: PendingAction, Side, SessionReceipt
pub mod types;

/// Order tree: red-black tree with slab-based storage
pub mod orderbook;

/// Word and advice map encodings shared with the VM
pub mod codec;

/// Proving engine boundary
pub mod prover;

/// Session builder, reconciler and proof sessions
pub mod engine;

pub mod config;
pub mod error;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use codec::{decode_snapshot, encode_snapshot, AdviceMap};
pub use config::{SessionConfig, StackLayout};
pub use engine::{BookState, OrderBookEngine, ProofSession, SessionBuilder, SessionOutcome};
pub use error::{CodecError, ProverError, ReconcileError, SessionError, TreeError};
pub use orderbook::{Color, OrderNode, OrderTree};
pub use prover::{MockProver, ProgramInput, ProverOutput, ProvingEngine, Snapshot};
pub use types::{PendingAction, SessionReceipt, Side};
