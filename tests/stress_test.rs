//! Stress tests for zkbook reconciliation.
//!
//! These tests verify:
//! 1. The tree stays a valid red-black tree after every committed round
//! 2. The committed book matches a reference model of the applied groups
//! 3. Determinism is preserved across runs
//!
//! ## Running Stress Tests
//!
//! ```bash
//! # Run all stress tests (release mode recommended)
//! cargo test --release --test stress_test -- --nocapture
//!
//! # Run specific test
//! cargo test --release --test stress_test stress_random_rounds -- --nocapture
//! ```

use std::collections::BTreeMap;
use std::time::Instant;

use zkbook::codec::{decode_snapshot, encode_group};
use zkbook::{Color, MockProver, OrderBookEngine, OrderNode, OrderTree, PendingAction, Side};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

/// Proving rounds per random run
const ROUND_COUNT: usize = 2_000;

/// Upper bound on groups the VM reports per round
const MAX_GROUPS_PER_ROUND: usize = 8;

/// Direct tree operations for the insert/remove churn test
const CHURN_OPS: usize = 200_000;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Generate one round of VM output and apply it to `model` with the same
/// rules the reconciler uses.
///
/// Deletes always carry a zero quantity so they apply even to a lone root.
fn generate_round(
    rng: &mut ChaCha8Rng,
    model: &mut BTreeMap<u64, OrderNode>,
    next_key: &mut u64,
) -> Vec<u64> {
    let groups = rng.gen_range(0..=MAX_GROUPS_PER_ROUND);
    let mut words = Vec::with_capacity(groups * 9 + 9);

    for _ in 0..groups {
        let roll = rng.gen_range(0..10);
        let existing: Vec<u64> = model.keys().copied().collect();

        let node = if existing.is_empty() || roll < 4 {
            *next_key += rng.gen_range(1..=16);
            OrderNode::new(
                *next_key,
                rng.gen_range(1..=1_000),
                rng.gen_range(40..=60),
                rng.gen_range(1_688_000_000..=1_689_000_000),
                rng.gen_range(1..=10_000_000),
            )
            .with_color(if rng.gen_bool(0.5) { Color::Red } else { Color::Black })
            .with_links(rng.gen_range(0..=*next_key), 0, 0)
        } else {
            let key = existing[rng.gen_range(0..existing.len())];
            let current = model[&key];
            if roll < 7 {
                OrderNode {
                    quantity: rng.gen_range(1..=current.quantity.max(1)),
                    ..current
                }
                .with_links(rng.gen_range(1..=*next_key), rng.gen_range(0..=*next_key), 0)
            } else {
                OrderNode {
                    quantity: 0,
                    ..current
                }
                .with_links(0, 0, 0)
            }
        };

        if node.is_unlinked() && model.contains_key(&node.memory_location) {
            model.remove(&node.memory_location);
        } else {
            model.insert(node.memory_location, node);
        }
        words.extend(encode_group(&node));
    }

    // VM padding: sometimes a full zero group, sometimes a short tail
    let padding = rng.gen_range(0..=12);
    words.extend(std::iter::repeat(0).take(padding));
    words
}

/// Run `rounds` random rounds through the engine and return the final state root.
fn run_random_rounds(seed: u64, rounds: usize) -> [u8; 32] {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut model = BTreeMap::new();
    let mut next_key = 0u64;
    let mut engine = OrderBookEngine::new(MockProver::new());

    for round in 0..rounds {
        let words = generate_round(&mut rng, &mut model, &mut next_key);
        engine.engine_mut().push_round(words);

        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let action = PendingAction::market(side, 1, round as u64, round as u64 + 1);
        let outcome = engine
            .submit(&action)
            .unwrap_or_else(|e| panic!("round {round} failed: {e}"));

        assert!(outcome.verified, "round {round} did not verify");
        engine
            .book()
            .tree()
            .check_invariants()
            .unwrap_or_else(|e| panic!("round {round} broke the tree: {e}"));

        let committed: Vec<OrderNode> = engine.book().tree().iter().copied().collect();
        let expected: Vec<OrderNode> = model.values().copied().collect();
        assert_eq!(committed, expected, "round {round} diverged from the model");
    }

    let book = engine.book();
    assert_eq!(book.round(), rounds as u64);
    let rebuilt = decode_snapshot(book.advice_map()).expect("committed advice map decodes");
    assert_eq!(rebuilt.state_root(), book.tree().state_root());

    book.tree().state_root()
}

// ============================================================================
// STRESS TESTS
// ============================================================================

/// Replay random mutation buffers and check the tree after every commit.
#[test]
fn stress_random_rounds() {
    println!("\n=== STRESS TEST: {} Random Rounds ===\n", ROUND_COUNT);

    let start = Instant::now();
    let root = run_random_rounds(42, ROUND_COUNT);
    let elapsed = start.elapsed();

    println!("  Rounds committed:  {:>12}", ROUND_COUNT);
    println!("  Elapsed time:      {:>12.2?}", elapsed);
    println!("  State root:        {}", hex::encode(root));

    println!("\n=== STRESS TEST PASSED ===\n");
}

/// Same seed, same final book.
#[test]
fn verify_determinism() {
    const TEST_ROUNDS: usize = 300;
    const SEED: u64 = 12345;

    let root1 = run_random_rounds(SEED, TEST_ROUNDS);
    let root2 = run_random_rounds(SEED, TEST_ROUNDS);
    assert_eq!(root1, root2, "State roots must match for determinism");

    let root3 = run_random_rounds(SEED + 1, TEST_ROUNDS);
    assert_ne!(root1, root3, "Different seeds should produce different roots");
}

/// Heavy insert/remove churn directly on the tree.
#[test]
fn stress_tree_churn() {
    println!("\n=== TREE CHURN TEST ===\n");

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut tree = OrderTree::with_capacity(CHURN_OPS);
    let mut live: Vec<u64> = Vec::new();
    let mut next_key = 0u64;

    let start = Instant::now();
    for i in 0..CHURN_OPS {
        if !live.is_empty() && rng.gen_bool(0.45) {
            let idx = rng.gen_range(0..live.len());
            let key = live.swap_remove(idx);
            tree.remove(key).expect("live key removes");
        } else {
            next_key += rng.gen_range(1..=4);
            tree.insert(OrderNode::new(next_key, 1, 50, i as u64, i as u64))
                .expect("fresh key inserts");
            live.push(next_key);
        }

        if i % 10_000 == 0 {
            tree.check_invariants().expect("valid red-black tree");
        }
    }
    let elapsed = start.elapsed();

    let black_height = tree.check_invariants().expect("valid red-black tree");
    assert_eq!(tree.len(), live.len());

    println!("  Operations:        {:>12}", CHURN_OPS);
    println!("  Final size:        {:>12}", tree.len());
    println!("  Black height:      {:>12}", black_height);
    println!("  Elapsed time:      {:>12.2?}", elapsed);

    println!("\n=== TREE CHURN PASSED ===\n");
}
