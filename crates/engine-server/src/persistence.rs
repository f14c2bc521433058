//! Book and trade-history files in the data directory.
//!
//! - `orderbook.json`: `{ "bids": [...], "asks": [...] }`
//! - `trades.json`: array of trades, oldest first
//!
//! A missing or undecodable file at startup means "start empty" and is
//! only logged.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use engine_core::BookSnapshot;
use engine_protocol::json_codec;
use engine_protocol::{ProtocolError, WireTrade};
use tokio::fs;
use tracing::{error, info, warn};

pub const ORDERBOOK_FILE: &str = "orderbook.json";
pub const TRADES_FILE: &str = "trades.json";

/// State read back from the data directory.
#[derive(Debug, Default)]
pub struct PersistedState {
    pub book: Option<BookSnapshot>,
    pub trades: Vec<WireTrade>,
}

/// Read the book and trade history from `dir`.
///
/// Missing or undecodable files load as empty. An undecodable file is
/// renamed to `<name>.corrupt` first, so the next save does not
/// overwrite it. Only I/O failures are errors.
pub async fn load_state(dir: &Path) -> Result<PersistedState> {
    let book_path = dir.join(ORDERBOOK_FILE);
    let book = match read_optional(&book_path).await? {
        Some(text) => match json_codec::decode_book(&text) {
            Ok(book) => Some(book),
            Err(e) => {
                set_aside(&book_path, &e).await;
                None
            }
        },
        None => None,
    };

    let trades_path = dir.join(TRADES_FILE);
    let trades = match read_optional(&trades_path).await? {
        Some(text) => match json_codec::decode_trades(&text) {
            Ok(trades) => trades,
            Err(e) => {
                set_aside(&trades_path, &e).await;
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    info!(
        dir = %dir.display(),
        book_orders = book.as_ref().map_or(0, BookSnapshot::len),
        trades = trades.len(),
        "loaded persisted state"
    );
    Ok(PersistedState { book, trades })
}

async fn set_aside(path: &Path, reason: &ProtocolError) {
    let mut aside = path.as_os_str().to_owned();
    aside.push(".corrupt");
    let aside = PathBuf::from(aside);

    error!(path = %path.display(), error = %reason, "cannot decode file, starting empty");
    match fs::rename(path, &aside).await {
        Ok(()) => warn!(from = %path.display(), to = %aside.display(), "moved undecodable file aside"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not move undecodable file aside"),
    }
}

pub async fn save_state(dir: &Path, book: &BookSnapshot, trades: &[WireTrade]) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;

    let book_path = dir.join(ORDERBOOK_FILE);
    fs::write(&book_path, json_codec::encode_book(book)?)
        .await
        .with_context(|| format!("writing {}", book_path.display()))?;

    let trades_path = dir.join(TRADES_FILE);
    fs::write(&trades_path, json_codec::encode_trades(trades)?)
        .await
        .with_context(|| format!("writing {}", trades_path.display()))?;

    info!(dir = %dir.display(), orders = book.len(), trades = trades.len(), "state saved");
    Ok(())
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "file not found, starting empty");
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}
