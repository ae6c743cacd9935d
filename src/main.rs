//! zkbook - Binary Entry Point
//!
//! Runs one proof session against a book snapshot using the mock prover,
//! replaying a recorded VM output buffer.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zkbook::config::SessionConfig;
use zkbook::engine::{BookState, OrderBookEngine};
use zkbook::prover::{MockProver, Snapshot};
use zkbook::types::{PendingAction, Side};

#[derive(Debug, Parser)]
#[command(name = "zkbook", about = "Prove one order against a book snapshot")]
struct Args {
    /// Book snapshot JSON (`operand_stack` + `advice_map`); empty book if omitted
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Session configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON array of VM output words to replay as the execution result
    #[arg(long)]
    replay: Option<PathBuf>,

    /// buy or sell
    #[arg(long, default_value = "buy")]
    side: Side,

    #[arg(long)]
    quantity: u64,

    /// Limit price; market order if omitted
    #[arg(long)]
    price: Option<u64>,

    #[arg(long, default_value_t = 1)]
    order_id: u64,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let book = match &args.snapshot {
        Some(path) => {
            let snapshot = Snapshot::from_json_file(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
            BookState::from_snapshot(&snapshot).context("Failed to decode snapshot")?
        }
        None => BookState::new(),
    };

    let mut prover = MockProver::new();
    if let Some(path) = &args.replay {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay {}", path.display()))?;
        let words: Vec<u64> =
            serde_json::from_str(&raw).context("Replay must be a JSON array of words")?;
        prover.push_round(words);
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock before Unix epoch")?
        .as_secs();
    let action = match args.price {
        Some(price) => {
            PendingAction::limit(args.side, args.quantity, price, timestamp, args.order_id)
        }
        None => PendingAction::market(args.side, args.quantity, timestamp, args.order_id),
    };

    let mut engine = OrderBookEngine::with_book(prover, book, &config);
    let outcome = engine.submit(&action).context("Proof session failed")?;

    println!("===========================================");
    println!("  zkbook - proof session");
    println!("===========================================");
    println!();
    println!("Operand stack: {}", outcome.input.operand_stack_json()?);
    println!("Trace length:  {}", outcome.trace_len);
    println!(
        "Mutations:     {} inserted, {} updated, {} deleted",
        outcome.summary.inserted, outcome.summary.updated, outcome.summary.deleted
    );
    println!("Proof:         {}", outcome.proof_hex());
    println!("Verified:      {}", outcome.verified);
    println!("Live nodes:    {}", engine.book().tree().len());
    println!("State root:    {}", outcome.receipt.state_root_hex());

    Ok(())
}

fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("zkbook={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
