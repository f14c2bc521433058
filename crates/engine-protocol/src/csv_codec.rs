// crates/engine-protocol/src/csv_codec.rs

//! CSV line protocol for interactive (netcat-style) clients.
//!
//! Input format (line → [`ClientRequest`]):
//!
//! - Create:
//!   `CREATE, order_id, account_id, pair, side(BUY|SELL), amount, limit_price`
//!
//! - Delete:
//!   `DELETE, order_id`
//!
//! - Book / trade history query:
//!   `BOOK` / `TRADES`
//!
//! Output format:
//!
//! - Trade:       `T, tradeId, buyOrderId, sellOrderId, price, quantity, timestamp`
//! - Accepted:    `A, order_id, remaining, RESTING|FILLED`
//! - Deleted:     `A, order_id, DELETED`
//! - Not found:   `N, order_id`
//! - Rejected:    `R, order_id, reason`
//! - Book order:  `O, side, order_id, account_id, price, quantity`
//! - Book end:    `B, bidCount, askCount`
//! - Error:       `E, message`

use crate::error::ProtocolError;
use crate::wire_types::{ClientRequest, IncomingOperation, WireAck, WireBook, WireOrder, WireTrade};

/// Parse a single CSV line.
///
/// Returns `Ok(None)` for blank lines or comments (starting with `#`).
pub fn parse_input_line(line: &str) -> Result<Option<ClientRequest>, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens = split_and_trim(trimmed, ',');
    let command = tokens[0].to_ascii_uppercase();

    let request = match command.as_str() {
        "CREATE" => {
            expect_fields("CREATE", &tokens, 7)?;
            ClientRequest::Submit(IncomingOperation {
                type_op: Some("CREATE".to_string()),
                order_id: Some(tokens[1].clone()),
                account_id: Some(tokens[2].clone()),
                pair: Some(tokens[3].clone()),
                side: Some(tokens[4].clone()),
                amount: Some(tokens[5].clone()),
                limit_price: Some(tokens[6].clone()),
            })
        }
        "DELETE" => {
            expect_fields("DELETE", &tokens, 2)?;
            ClientRequest::Cancel {
                order_id: tokens[1].clone(),
            }
        }
        "BOOK" => {
            expect_fields("BOOK", &tokens, 1)?;
            ClientRequest::Book
        }
        "TRADES" => {
            expect_fields("TRADES", &tokens, 1)?;
            ClientRequest::Trades
        }
        _ => return Err(ProtocolError::UnknownCommand(tokens[0].clone())),
    };

    Ok(Some(request))
}

pub fn format_trade(trade: &WireTrade) -> String {
    format!(
        "T, {}, {}, {}, {}, {}, {}",
        trade.trade_id,
        trade.buy_order_id,
        trade.sell_order_id,
        trade.price,
        trade.quantity,
        trade.timestamp
    )
}

pub fn format_ack(ack: &WireAck) -> String {
    match ack.status.as_str() {
        "accepted" => {
            let state = if ack.resting == Some(true) { "RESTING" } else { "FILLED" };
            let remaining = ack.remaining.as_deref().unwrap_or("-");
            format!("A, {}, {}, {}", ack.order_id, remaining, state)
        }
        "deleted" => format!("A, {}, DELETED", ack.order_id),
        "not_found" => format!("N, {}", ack.order_id),
        _ => format!(
            "R, {}, {}",
            ack.order_id,
            ack.reason.as_deref().unwrap_or("rejected")
        ),
    }
}

/// One `O` line per order (bids first, then asks) and a closing `B` line.
pub fn format_book(book: &WireBook) -> Vec<String> {
    book.bids
        .iter()
        .chain(book.asks.iter())
        .map(format_order)
        .chain(std::iter::once(format!(
            "B, {}, {}",
            book.bids.len(),
            book.asks.len()
        )))
        .collect()
}

fn format_order(order: &WireOrder) -> String {
    format!(
        "O, {}, {}, {}, {}, {}",
        order.side, order.order_id, order.account_id, order.price, order.quantity
    )
}

pub fn format_error(message: &str) -> String {
    format!("E, {}", message)
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn split_and_trim(s: &str, delimiter: char) -> Vec<String> {
    s.split(delimiter)
        .map(|tok| tok.trim().to_string())
        .collect()
}

fn expect_fields(
    command: &'static str,
    tokens: &[String],
    expected: usize,
) -> Result<(), ProtocolError> {
    if tokens.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::FieldCount {
            command,
            expected,
            got: tokens.len(),
        })
    }
}
