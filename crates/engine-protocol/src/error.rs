use thiserror::Error;

/// Errors that can arise when decoding a JSON document or a CSV line.
///
/// These are transport-level problems. A well-formed CREATE with a bad
/// amount still decodes; the engine rejects it.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a top-level JSON array of operations")]
    NotAnArray,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("unknown operation type: {0:?}")]
    UnknownOperation(String),

    #[error("invalid side: {0:?}")]
    InvalidSide(String),

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("expected {expected} fields for {command}, got {got}")]
    FieldCount {
        command: &'static str,
        expected: usize,
        got: usize,
    },
}
