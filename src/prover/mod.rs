//! Boundary to the external proving VM.
//!
//! The proving engine is an injected capability: anything implementing
//! [`ProvingEngine`] can drive a [`ProofSession`](crate::engine::ProofSession).
//! The engine receives a [`ProgramInput`] (operand stack plus advice map) and
//! returns the VM's flat output words together with the proof.
//!
//! ## Wire Format
//!
//! ```json
//! {
//!   "operand_stack": ["9999999", "1688473018", "49", "25", "1"],
//!   "advice_map": {
//!     "0000…0000": [0, 0, 0, 1],
//!     "0000…0100000000000000": [0, 0, 0, 268, 1, 259, 0, 0, 2, 49, 1688473018, 4929032]
//!   }
//! }
//! ```

pub mod mock;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::{decode_snapshot, AdviceMap};
use crate::error::{CodecError, ConfigError, ProverError};
use crate::orderbook::OrderTree;

pub use mock::MockProver;

/// Operand stack slots read by the VM program
pub const OPERAND_SLOTS: usize = 5;

/// Input of one proving call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgramInput {
    pub operand_stack: [String; OPERAND_SLOTS],
    pub advice_map: AdviceMap,
}

/// The initial book snapshot has the same shape as a program input.
pub type Snapshot = ProgramInput;

impl ProgramInput {
    /// JSON document handed to the proving engine
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Operand stack alone, as published next to a proof
    pub fn operand_stack_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&serde_json::json!({ "operand_stack": self.operand_stack }))
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Rebuild the book tree encoded in the advice map
    pub fn decode_tree(&self) -> Result<OrderTree, CodecError> {
        decode_snapshot(&self.advice_map)
    }
}

/// Result of one proving call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProverOutput {
    /// Modified memory words, in 9-word groups plus padding
    pub stack_output: Vec<u64>,
    pub overflow_addrs: Vec<u64>,
    pub trace_len: usize,
    pub proof: Vec<u8>,
}

impl ProverOutput {
    /// Proof bytes as lowercase hex, two characters per byte
    pub fn proof_hex(&self) -> String {
        hex::encode(&self.proof)
    }
}

/// An engine able to prove and verify executions of the book program.
///
/// Calls are synchronous and may take a long time; the caller serializes
/// them per book.
pub trait ProvingEngine {
    /// Execute the program on `input` and prove the execution
    fn prove(&mut self, input: &ProgramInput) -> Result<ProverOutput, ProverError>;

    /// Check `proof` against the input and claimed outputs.
    ///
    /// `Ok(())` means the proof verified.
    fn verify(
        &mut self,
        input: &ProgramInput,
        proof: &[u8],
        stack_output: &[u64],
        overflow_addrs: &[u64],
    ) -> Result<(), ProverError>;
}

impl<E: ProvingEngine + ?Sized> ProvingEngine for Box<E> {
    fn prove(&mut self, input: &ProgramInput) -> Result<ProverOutput, ProverError> {
        (**self).prove(input)
    }

    fn verify(
        &mut self,
        input: &ProgramInput,
        proof: &[u8],
        stack_output: &[u64],
        overflow_addrs: &[u64],
    ) -> Result<(), ProverError> {
        (**self).verify(input, proof, stack_output, overflow_addrs)
    }
}
