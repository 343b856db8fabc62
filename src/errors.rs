//! The single error type returned by every fallible operation in this crate.

use thiserror::Error;

/// Errors produced while decoding a wire-format record, parsing JSON, or
/// parsing a human-readable [`crate::target::Target`] string.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unknown record version {0}, expected 0")]
    UnknownVersion(u8),

    #[error("duplicate CANONICAL record")]
    DuplicateCanonical,

    #[error("duplicate DELEGATE record")]
    DuplicateDelegate,

    #[error("field of length {0} exceeds the 255-byte wire cap")]
    FieldTooLong(usize),

    #[error("unrecognised target address form: {0}")]
    InvalidTarget(String),

    #[error("a host-kind tag was used for a name target")]
    HostTagOnName,

    #[error("invalid {0} hex string: {1}")]
    InvalidHex(&'static str, #[source] hex::FromHexError),

    #[error("trailing garbage after fully-parsed record ({0} bytes left)")]
    TrailingGarbage(usize),

    #[error("invalid compressor table reference {0}")]
    BadTableReference(usize),

    #[error("failed to parse address {0:?}: {1}")]
    AddrParse(String, String),
}
