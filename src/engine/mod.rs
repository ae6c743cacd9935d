//! Proof session engine.
//!
//! ## Flow
//!
//! 1. [`SessionBuilder`] turns a pending action and the book into the VM's
//!    program input
//! 2. the injected [`ProvingEngine`](crate::prover::ProvingEngine) executes
//!    and proves it
//! 3. [`reconcile`] applies the VM's output groups to a copy of the tree
//! 4. the copy is checked, encoded and committed to the [`BookState`]
//! 5. the proof is verified; a rejected proof is reported, not rolled back
//!
//! [`ProofSession`] runs those steps for one round and
//! [`OrderBookEngine`] owns the book across rounds.

pub mod builder;
pub mod reconciler;
pub mod session;

pub use builder::SessionBuilder;
pub use reconciler::{classify, reconcile, Mutation, ReconcileSummary};
pub use session::{BookState, OrderBookEngine, ProofSession, SessionOutcome, SessionStage};
