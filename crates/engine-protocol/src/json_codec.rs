//! JSON documents: operation files, book and trade files, server events.
//!
//! File documents are pretty-printed (they are meant to be read by
//! people); server events are one compact object per line.

use engine_core::{BookSnapshot, Operation, Trade};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::wire_types::{ClientRequest, IncomingOperation, ServerEvent, WireBook, WireTrade};

/// Decode a single operation object.
pub fn decode_operation(text: &str) -> Result<Operation, ProtocolError> {
    let incoming: IncomingOperation = serde_json::from_str(text)?;
    incoming.into_operation()
}

/// Decode an operations file.
///
/// The document itself must be a JSON array; anything else is an error
/// for the whole file. Each element is then decoded on its own, so one
/// bad entry does not hide the rest.
pub fn decode_operations(
    text: &str,
) -> Result<Vec<Result<Operation, ProtocolError>>, ProtocolError> {
    let Value::Array(entries) = serde_json::from_str::<Value>(text)? else {
        return Err(ProtocolError::NotAnArray);
    };

    Ok(entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value::<IncomingOperation>(entry)
                .map_err(ProtocolError::from)
                .and_then(IncomingOperation::into_operation)
        })
        .collect())
}

pub fn trades_to_wire(trades: &[Trade]) -> Vec<WireTrade> {
    trades.iter().map(WireTrade::from).collect()
}

pub fn encode_trades(trades: &[WireTrade]) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string_pretty(trades)?)
}

pub fn decode_trades(text: &str) -> Result<Vec<WireTrade>, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_book(snapshot: &BookSnapshot) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string_pretty(&WireBook::from(snapshot))?)
}

/// Decode a book file. Row contents are not validated here;
/// `OrderBook::restore` skips the rows it cannot use.
pub fn decode_book(text: &str) -> Result<BookSnapshot, ProtocolError> {
    let book: WireBook = serde_json::from_str(text)?;
    Ok(book.into())
}

/// Decode one line from a JSON client.
///
/// Objects with an `op` field are [`ClientRequest`]s; anything else is
/// taken as a bare operation, as found in an operations file.
pub fn decode_request(line: &str) -> Result<ClientRequest, ProtocolError> {
    let value: Value = serde_json::from_str(line)?;
    if value.get("op").is_some() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(ClientRequest::Submit(serde_json::from_value(value)?))
    }
}

/// Encode one event as a single line (no trailing newline).
pub fn encode_event(event: &ServerEvent) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(event)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{OutputOrder, Side};

    #[test]
    fn decodes_create_with_string_and_number_values() {
        let op = decode_operation(
            r#"{"type_op":"CREATE","order_id":"1","account_id":"a","pair":"BTC/USD",
                "side":"buy","amount":0.5,"limit_price":"100.25"}"#,
        )
        .unwrap();

        match op {
            Operation::Create(create) => {
                assert_eq!(create.side, Side::Buy);
                assert_eq!(create.amount, "0.5");
                assert_eq!(create.limit_price, "100.25");
            }
            other => panic!("expected CREATE, got {other:?}"),
        }
    }

    #[test]
    fn delete_needs_only_id() {
        let op = decode_operation(r#"{"type_op":"DELETE","order_id":"42"}"#).unwrap();
        assert_eq!(op.order_id(), "42");
        assert!(matches!(op, Operation::Delete(_)));
    }

    #[test]
    fn operations_file_reports_bad_entries_individually() {
        let results = decode_operations(
            r#"[
                {"type_op":"CREATE","order_id":"1","account_id":"a","pair":"P","side":"SELL","amount":"1","limit_price":"1"},
                {"type_op":"UPDATE","order_id":"2"},
                {"type_op":"CREATE","order_id":"3","side":"HOLD"},
                {"order_id":"4"},
                {"type_op":"DELETE","order_id":"1"}
            ]"#,
        )
        .unwrap();

        assert_eq!(results.len(), 5);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ProtocolError::UnknownOperation(_))));
        assert!(matches!(results[2], Err(ProtocolError::InvalidSide(_))));
        assert!(matches!(results[3], Err(ProtocolError::MissingField("type_op"))));
        assert!(results[4].is_ok());
    }

    #[test]
    fn operations_file_must_be_an_array() {
        assert!(matches!(
            decode_operations(r#"{"type_op":"DELETE"}"#),
            Err(ProtocolError::NotAnArray)
        ));
        assert!(matches!(decode_operations("not json"), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn book_uses_type_field_for_side() {
        let snapshot = BookSnapshot {
            bids: vec![OutputOrder {
                order_id: "b1".to_string(),
                account_id: "acc".to_string(),
                pair: "BTC/USD".to_string(),
                side: "BUY".to_string(),
                price: "98.50000000".to_string(),
                quantity: "5.00000000".to_string(),
            }],
            asks: Vec::new(),
        };

        let text = encode_book(&snapshot).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["bids"][0]["type"], "BUY");
        assert_eq!(value["bids"][0]["price"], "98.50000000");
        assert_eq!(value["asks"], Value::Array(Vec::new()));

        assert_eq!(decode_book(&text).unwrap(), snapshot);
    }

    #[test]
    fn trades_use_camel_case() {
        let trade = WireTrade {
            trade_id: "t1".to_string(),
            buy_order_id: "b".to_string(),
            sell_order_id: "s".to_string(),
            price: "100.00000000".to_string(),
            quantity: "1.00000000".to_string(),
            timestamp: 1_700_000_000_000,
        };
        let text = encode_trades(std::slice::from_ref(&trade)).unwrap();
        assert!(text.contains("\"tradeId\""));
        assert!(text.contains("\"buyOrderId\""));
        assert_eq!(decode_trades(&text).unwrap(), vec![trade]);
    }

    #[test]
    fn requests_accept_op_tag_or_bare_operation() {
        assert_eq!(decode_request(r#"{"op":"book"}"#).unwrap(), ClientRequest::Book);
        assert_eq!(
            decode_request(r#"{"op":"cancel","order_id":"9"}"#).unwrap(),
            ClientRequest::Cancel {
                order_id: "9".to_string()
            }
        );

        let ClientRequest::Submit(incoming) =
            decode_request(r#"{"type_op":"DELETE","order_id":"9"}"#).unwrap()
        else {
            panic!("expected submit");
        };
        assert_eq!(incoming.order_id.as_deref(), Some("9"));

        assert!(matches!(
            decode_request(r#"{"op":"submit","type_op":"CREATE","order_id":"1","side":"SELL"}"#)
                .unwrap(),
            ClientRequest::Submit(_)
        ));
    }

    #[test]
    fn events_are_type_and_payload() {
        let line = encode_event(&ServerEvent::Orderbook(WireBook::default())).unwrap();
        assert_eq!(line, r#"{"type":"orderbook","payload":{"bids":[],"asks":[]}}"#);

        let line = encode_event(&ServerEvent::Trades(Vec::new())).unwrap();
        assert_eq!(line, r#"{"type":"trades","payload":[]}"#);
    }
}
