//! Deterministic stand-in for the proving VM.
//!
//! `MockProver` replays scripted output buffers, one per `prove` call, and
//! "proves" by hashing the input document together with the outputs. The
//! matching `verify` recomputes that digest, so a proof only verifies for the
//! exact input and outputs it was produced from.

use std::collections::VecDeque;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ProverError;
use crate::prover::{ProgramInput, ProverOutput, ProvingEngine};

/// Trace length reported for every mock execution
pub const MOCK_TRACE_LEN: usize = 64;

/// Proof length in bytes (one SHA-256 digest)
pub const MOCK_PROOF_LEN: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct MockProver {
    rounds: VecDeque<Vec<u64>>,
    failure: Option<String>,
}

impl MockProver {
    /// A prover whose executions modify nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// A prover that replays `rounds` in order
    pub fn with_rounds(rounds: impl IntoIterator<Item = Vec<u64>>) -> Self {
        Self {
            rounds: rounds.into_iter().collect(),
            failure: None,
        }
    }

    /// Queue the output buffer of a future `prove` call
    pub fn push_round(&mut self, stack_output: Vec<u64>) {
        self.rounds.push_back(stack_output);
    }

    /// Make the next `prove` call fail with `message`
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    /// Scripted rounds not consumed yet
    pub fn pending_rounds(&self) -> usize {
        self.rounds.len()
    }

    fn digest(input_json: &str, stack_output: &[u64], overflow_addrs: &[u64]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(input_json.as_bytes());
        for word in stack_output.iter().chain(overflow_addrs) {
            hasher.update(word.to_le_bytes());
        }
        hasher.finalize().to_vec()
    }
}

impl ProvingEngine for MockProver {
    fn prove(&mut self, input: &ProgramInput) -> Result<ProverOutput, ProverError> {
        let json = input.to_json()?;
        if let Some(message) = self.failure.take() {
            return Err(ProverError::Engine(message));
        }

        // Exhausted script: an execution that changed nothing
        let stack_output = self.rounds.pop_front().unwrap_or_default();
        let overflow_addrs = Vec::new();
        let proof = Self::digest(&json, &stack_output, &overflow_addrs);
        debug!(words = stack_output.len(), "mock execution proven");

        Ok(ProverOutput {
            stack_output,
            overflow_addrs,
            trace_len: MOCK_TRACE_LEN,
            proof,
        })
    }

    fn verify(
        &mut self,
        input: &ProgramInput,
        proof: &[u8],
        stack_output: &[u64],
        overflow_addrs: &[u64],
    ) -> Result<(), ProverError> {
        if proof.len() != MOCK_PROOF_LEN {
            return Err(ProverError::MalformedProof(format!(
                "expected {MOCK_PROOF_LEN} bytes, got {}",
                proof.len()
            )));
        }
        let expected = Self::digest(&input.to_json()?, stack_output, overflow_addrs);
        if expected == proof {
            Ok(())
        } else {
            Err(ProverError::Rejected)
        }
    }
}
