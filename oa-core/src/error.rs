//! Errors surfaced by the pure codecs and resolver in this crate.
//!
//! Marker-parse and resolver failures are deliberately NOT represented
//! here: per the protocol, a malformed marker or an inconsistent resolver
//! run means the output is uncolored, not that an operation failed. Those
//! paths return `Option::None`. `CoreError` exists only for the var-int
//! codecs, the one place this crate reads and writes an external byte
//! stream rather than in-memory values it already trusts.

use thiserror::Error;

/// Errors produced by the var-int/LEB128 codecs in `oa-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A LEB128 or compact-size var-int stream ended before a terminator
    /// byte (LEB128) or before its declared body length (var-int) was read.
    #[error("truncated variable-length integer")]
    Truncated,

    /// A compact-size var-int was encoded using more bytes than the
    /// minimal encoding for its value requires.
    #[error("non-minimal variable-length integer")]
    NonMinimalVarInt,

    /// An I/O error bubbled up from a `Read`/`Write` passed to a codec.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;
