//! engine-protocol
//!
//! Wire-level encoding/decoding for the matching engine.
//!
//! This crate turns logical engine types (`engine_core::Operation`,
//! `Trade`, `BookSnapshot`, `OperationOutcome`) into text and back:
//!
//! - [`wire_types`] : serde shapes of the external JSON documents
//! - [`json_codec`] : operation files, book/trade files, server events
//! - [`csv_codec`]  : line protocol for netcat-style clients

pub mod error;
pub mod wire_types;
pub mod json_codec;
pub mod csv_codec;

pub use error::ProtocolError;

pub use wire_types::{
    ClientRequest,
    IncomingOperation,
    ServerEvent,
    WireAck,
    WireBook,
    WireOrder,
    WireTrade,
};
