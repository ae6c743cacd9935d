//! Error types for zkbook.
//!
//! One enum per concern; [`SessionError`] composes the others for the
//! orchestrator.

use thiserror::Error;

/// Word codec and advice map errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Fewer than a full group of words left in a buffer consumed in strides.
    #[error("Malformed group: {remaining} trailing words, expected {expected}")]
    MalformedGroup { remaining: usize, expected: usize },

    #[error("Invalid advice key: {0:?}")]
    InvalidAdviceKey(String),

    #[error("Malformed advice value at {key}: {len} words")]
    MalformedAdviceValue { key: String, len: usize },

    #[error("Advice map has no control record")]
    MissingControlRecord,

    #[error("Node count mismatch: control record says {expected}, found {actual}")]
    NodeCountMismatch { expected: u64, actual: u64 },

    #[error("Tree error while decoding snapshot: {0}")]
    Tree(#[from] TreeError),
}

/// Order tree errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(u64),

    #[error("Key not found: {0}")]
    KeyNotFound(u64),

    /// Address 0 means "no link" and can never be a node.
    #[error("Memory location 0 is reserved")]
    ReservedKey,

    #[error("Tree corrupted at key {key}: {reason}")]
    Corrupted { key: u64, reason: &'static str },
}

/// Failure while applying a proving output buffer to a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("Group {group} (memory location {memory_location}) failed: {source}")]
    Apply {
        group: usize,
        memory_location: u64,
        #[source]
        source: TreeError,
    },
}

/// Errors reported by a proving engine.
#[derive(Debug, Error)]
pub enum ProverError {
    #[error("Proving engine failed: {0}")]
    Engine(String),

    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    #[error("Proof rejected")]
    Rejected,

    #[error("Input serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that abort a proof session before commit.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Proving failure: {0}")]
    Proving(#[source] ProverError),

    #[error("Reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Tree invariant check failed: {0}")]
    Tree(#[from] TreeError),
}

/// Configuration and snapshot file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot error: {0}")]
    Codec(#[from] CodecError),
}
