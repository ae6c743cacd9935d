//! One proving round over the book.
//!
//! ## Stages
//!
//! ```text
//! Idle → Built → Proved → Reconciled → Encoded → Verified | VerifyFailed
//! ```
//!
//! The live tree is only touched at the end of `Encoded`: reconciliation runs
//! against a copy, and the copy plus its advice map replace the book's state
//! in one step once the tree invariants hold. A session that fails or is
//! dropped before that point leaves the book exactly as it was.
//!
//! Verification runs after the commit and never rolls it back.

use tracing::{debug, info, warn};

use crate::codec::{encode_snapshot, AdviceMap};
use crate::config::SessionConfig;
use crate::engine::builder::SessionBuilder;
use crate::engine::reconciler::{reconcile, ReconcileSummary};
use crate::error::{CodecError, SessionError};
use crate::orderbook::OrderTree;
use crate::prover::{ProgramInput, ProverOutput, ProvingEngine, Snapshot};
use crate::types::{PendingAction, SessionReceipt};

/// Progress of a [`ProofSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStage {
    #[default]
    Idle,
    Built,
    Proved,
    Reconciled,
    Encoded,
    Verified,
    VerifyFailed,
}

impl SessionStage {
    /// Whether the session got as far as committing
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Encoded | Self::Verified | Self::VerifyFailed)
    }
}

/// The book: live tree, its encoding and the committed round count.
#[derive(Debug, Clone, Default)]
pub struct BookState {
    tree: OrderTree,
    advice_map: AdviceMap,
    round: u64,
}

impl BookState {
    /// An empty book
    pub fn new() -> Self {
        Self::from_tree(OrderTree::new())
    }

    pub fn from_tree(tree: OrderTree) -> Self {
        let advice_map = encode_snapshot(&tree);
        Self {
            tree,
            advice_map,
            round: 0,
        }
    }

    /// Load the book encoded in a snapshot's advice map
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, CodecError> {
        Ok(Self::from_tree(snapshot.decode_tree()?))
    }

    #[inline]
    pub fn tree(&self) -> &OrderTree {
        &self.tree
    }

    #[inline]
    pub fn advice_map(&self) -> &AdviceMap {
        &self.advice_map
    }

    /// Committed rounds so far
    #[inline]
    pub fn round(&self) -> u64 {
        self.round
    }

    fn commit(&mut self, tree: OrderTree, advice_map: AdviceMap) -> u64 {
        self.tree = tree;
        self.advice_map = advice_map;
        self.round += 1;
        self.round
    }
}

/// Everything a committed session produced.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// The input that was proven
    pub input: ProgramInput,
    pub proof: Vec<u8>,
    pub stack_output: Vec<u64>,
    pub overflow_addrs: Vec<u64>,
    pub trace_len: usize,
    pub summary: ReconcileSummary,
    pub verified: bool,
    pub receipt: SessionReceipt,
}

impl SessionOutcome {
    pub fn proof_hex(&self) -> String {
        hex::encode(&self.proof)
    }
}

/// A single round: build, prove, reconcile, commit, verify.
///
/// The session borrows the engine and builder; the book is lent to [`run`]
/// so only one session can mutate it at a time.
///
/// [`run`]: ProofSession::run
pub struct ProofSession<'a, E: ProvingEngine + ?Sized> {
    engine: &'a mut E,
    builder: &'a SessionBuilder,
    stage: SessionStage,
}

impl<'a, E: ProvingEngine + ?Sized> ProofSession<'a, E> {
    pub fn new(engine: &'a mut E, builder: &'a SessionBuilder) -> Self {
        Self {
            engine,
            builder,
            stage: SessionStage::Idle,
        }
    }

    /// Last stage reached
    #[inline]
    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    fn advance(&mut self, stage: SessionStage) {
        debug!(from = ?self.stage, to = ?stage, "session stage");
        self.stage = stage;
    }

    /// Run the round for `action` against `book`.
    ///
    /// # Errors
    ///
    /// Proving, reconciliation and invariant failures abort the session
    /// before commit. A failed verification does not: the outcome reports
    /// `verified: false`.
    pub fn run(
        &mut self,
        book: &mut BookState,
        action: &PendingAction,
    ) -> Result<SessionOutcome, SessionError> {
        info!(
            order_id = action.order_id,
            side = %action.side,
            quantity = action.quantity,
            nodes = book.tree().len(),
            "starting proof session"
        );

        let input = self.builder.build(action, book.tree());
        self.advance(SessionStage::Built);

        let output = self.engine.prove(&input).map_err(SessionError::Proving)?;
        self.advance(SessionStage::Proved);

        let mut tree = book.tree().clone();
        let summary = reconcile(&mut tree, &output.stack_output)?;
        self.advance(SessionStage::Reconciled);

        let advice_map = encode_snapshot(&tree);
        tree.check_invariants()?;
        let round = book.commit(tree, advice_map);
        self.advance(SessionStage::Encoded);
        info!(
            round,
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            nodes = book.tree().len(),
            "book committed"
        );

        let verified = self.verify(&input, &output);

        let receipt = SessionReceipt {
            round,
            order_id: action.order_id,
            inserted: summary.inserted as u64,
            updated: summary.updated as u64,
            deleted: summary.deleted as u64,
            node_count: book.tree().len() as u64,
            trace_len: output.trace_len as u64,
            state_root: book.tree().state_root(),
            verified,
        };

        let ProverOutput {
            stack_output,
            overflow_addrs,
            trace_len,
            proof,
        } = output;

        Ok(SessionOutcome {
            input,
            proof,
            stack_output,
            overflow_addrs,
            trace_len,
            summary,
            verified,
            receipt,
        })
    }

    fn verify(&mut self, input: &ProgramInput, output: &ProverOutput) -> bool {
        match self
            .engine
            .verify(input, &output.proof, &output.stack_output, &output.overflow_addrs)
        {
            Ok(()) => {
                self.advance(SessionStage::Verified);
                true
            }
            Err(err) => {
                warn!(%err, "proof verification failed");
                self.advance(SessionStage::VerifyFailed);
                false
            }
        }
    }
}

/// Owns a book and the engine that proves its rounds.
///
/// # Example
///
/// ```
/// use zkbook::engine::OrderBookEngine;
/// use zkbook::prover::MockProver;
/// use zkbook::types::{PendingAction, Side};
///
/// let prover = MockProver::with_rounds([vec![259, 0, 0, 0, 0, 25, 49, 1000, 1]]);
/// let mut engine = OrderBookEngine::new(prover);
///
/// let outcome = engine.submit(&PendingAction::limit(Side::Buy, 25, 49, 1000, 1)).unwrap();
///
/// assert!(outcome.verified);
/// assert_eq!(engine.book().tree().len(), 1);
/// ```
#[derive(Debug)]
pub struct OrderBookEngine<E: ProvingEngine> {
    book: BookState,
    engine: E,
    builder: SessionBuilder,
    receipts: Vec<SessionReceipt>,
}

impl<E: ProvingEngine> OrderBookEngine<E> {
    /// An empty book with the default configuration
    pub fn new(engine: E) -> Self {
        Self::with_book(engine, BookState::new(), &SessionConfig::default())
    }

    pub fn with_book(engine: E, book: BookState, config: &SessionConfig) -> Self {
        Self {
            book,
            engine,
            builder: SessionBuilder::new(config),
            receipts: Vec::new(),
        }
    }

    /// Prove and apply one action
    pub fn submit(&mut self, action: &PendingAction) -> Result<SessionOutcome, SessionError> {
        let mut session = ProofSession::new(&mut self.engine, &self.builder);
        let outcome = session.run(&mut self.book, action)?;
        self.receipts.push(outcome.receipt.clone());
        Ok(outcome)
    }

    #[inline]
    pub fn book(&self) -> &BookState {
        &self.book
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[inline]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Receipts of committed rounds not yet drained, oldest first
    pub fn receipts(&self) -> &[SessionReceipt] {
        &self.receipts
    }

    /// Take the buffered receipts, leaving the buffer empty
    pub fn drain_receipts(&mut self) -> Vec<SessionReceipt> {
        std::mem::take(&mut self.receipts)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
