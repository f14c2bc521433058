//! engine-cli
//!
//! Replays an operations file through a fresh engine and writes the
//! resulting trades and final order book:
//!
//! ```text
//! io/orders.json  ->  io/output/trades.json
//!                     io/output/orderbook.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use engine_core::{BookSnapshot, MatchingEngine, OperationStatus};
use engine_protocol::json_codec;
use engine_protocol::WireTrade;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub const TRADES_FILE: &str = "trades.json";
pub const ORDERBOOK_FILE: &str = "orderbook.json";

#[derive(Parser, Debug, Clone)]
#[command(name = "engine-cli")]
#[command(about = "Process a JSON operations file through the matching engine", long_about = None)]
pub struct Cli {
    /// JSON array of CREATE / DELETE operations
    #[arg(short, long, default_value = "io/orders.json")]
    pub input: PathBuf,

    /// Directory for trades.json and orderbook.json (created if missing)
    #[arg(short, long, default_value = "io/output")]
    pub output_dir: PathBuf,

    /// Only accept CREATEs for this pair
    #[arg(short, long)]
    pub pair: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,
}

/// What a batch run produced.
#[derive(Debug, Default)]
pub struct BatchOutput {
    pub trades: Vec<WireTrade>,
    pub book: BookSnapshot,

    /// Operations the engine accepted (CREATE accepted or DELETE applied).
    pub applied: usize,
    /// CREATEs that failed validation.
    pub rejected: usize,
    /// DELETEs for orders that were not live.
    pub not_found: usize,
    /// Entries that could not be decoded, by position in the file.
    pub skipped: Vec<usize>,
}

/// Process an operations document in memory.
///
/// Fails only if the document is not a JSON array; bad entries are
/// logged, counted and skipped.
pub fn run_batch(input: &str, pair: Option<&str>) -> Result<BatchOutput> {
    let entries = json_codec::decode_operations(input).context("reading operations")?;
    info!(operations = entries.len(), "parsed operations");

    let mut engine = match pair {
        Some(pair) => MatchingEngine::for_pair(pair),
        None => MatchingEngine::new(),
    };
    let mut output = BatchOutput::default();

    for (index, entry) in entries.into_iter().enumerate() {
        let op = match entry {
            Ok(op) => op,
            Err(e) => {
                warn!(index, error = %e, "skipping invalid operation");
                output.skipped.push(index);
                continue;
            }
        };

        let outcome = engine.process_operation(op);
        match outcome.status {
            OperationStatus::Accepted { .. } | OperationStatus::Deleted => output.applied += 1,
            OperationStatus::NotFound => output.not_found += 1,
            OperationStatus::Rejected(_) => output.rejected += 1,
        }
        output.trades.extend(json_codec::trades_to_wire(&outcome.trades));
    }

    output.book = engine.snapshot();
    info!(
        applied = output.applied,
        rejected = output.rejected,
        not_found = output.not_found,
        skipped = output.skipped.len(),
        trades = output.trades.len(),
        "processing complete"
    );
    Ok(output)
}

pub fn write_outputs(dir: &Path, output: &BatchOutput) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let trades_path = dir.join(TRADES_FILE);
    fs::write(&trades_path, json_codec::encode_trades(&output.trades)?)
        .with_context(|| format!("writing {}", trades_path.display()))?;

    let book_path = dir.join(ORDERBOOK_FILE);
    fs::write(&book_path, json_codec::encode_book(&output.book)?)
        .with_context(|| format!("writing {}", book_path.display()))?;

    info!(trades = %trades_path.display(), book = %book_path.display(), "outputs written");
    Ok(())
}

pub fn run(cli: &Cli) -> Result<BatchOutput> {
    let input = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let output = run_batch(&input, cli.pair.as_deref())
        .with_context(|| format!("processing {}", cli.input.display()))?;
    write_outputs(&cli.output_dir, &output)?;
    Ok(output)
}

pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
