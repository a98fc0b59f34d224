//! Leaf types and pure codecs for the Open Assets protocol.
//!
//! Everything in this crate is synchronous and does no I/O beyond reading
//! and writing in-memory buffers: the LEB128 and Bitcoin-style var-int
//! codecs, the marker output payload, the `OP_RETURN` script matcher, the
//! asset-ID hash, and the asset-ID resolver. The coloring engine and
//! transaction builder that drive these types via a host-supplied
//! transaction provider live in `oa-engine`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// LEB128 and Bitcoin compact-size variable-length integer codecs.
pub mod varint;

/// RIPEMD160(SHA256(..)) asset-ID hashing.
pub mod hashes;

/// The `OP_RETURN <pushdata>` marker script pattern.
pub mod script;

/// The Open Assets marker output payload codec.
pub mod marker;

/// Domain types: colored outputs, decoded transactions, outpoints.
pub mod types;

/// The asset-ID resolver.
pub mod resolver;

/// Crate-wide error type.
pub mod error;

pub use error::CoreError;
pub use hashes::AssetId;
pub use marker::MarkerPayload;
pub use resolver::color_transaction;
pub use types::{ColoredOutput, DecodedTransaction, Outpoint, OutputType, Script, TxIn, TxOut};
