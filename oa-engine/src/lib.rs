//! The coloring engine, the `TransactionProvider`/`OutputCache`
//! capability traits the host implements, and the Open Assets
//! transaction builder.
//!
//! This crate is the async, I/O-adjacent half of the workspace: it never
//! decodes or hashes Bitcoin transactions itself (that's `oa-core`), it
//! only drives `oa-core`'s pure codecs and resolver against a
//! host-supplied transaction source and cache.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// The `TransactionProvider` and `OutputCache` capability traits.
pub mod provider;

/// The recursive (iteratively-implemented) coloring engine.
pub mod engine;

/// The transaction builder: issuance, transfer, and swap composition.
pub mod builder;

/// Crate-wide error types.
pub mod error;

pub use builder::{SpendableOutput, TransferSpec, TxBuilder};
pub use engine::ColoringEngine;
pub use error::{BuilderError, EngineError};
pub use provider::{NullCache, OutputCache, TransactionProvider};
