//! Errors surfaced at the engine and builder boundaries. See `spec.md`
//! §7: these are the only hard failures in the system -- everything the
//! marker codec and resolver reject is instead reported as an uncolored
//! transaction, never an `Err`.

use oa_core::hashes::AssetId;
use thiserror::Error;

/// Errors the coloring engine can return, parameterized by the host's
/// [`crate::TransactionProvider::Error`] so provider failures are
/// surfaced with their original type rather than erased -- following
/// `bitcoins_provider::BTCProvider`'s convention of leaving `Self::Error`
/// in callers' result types instead of boxing it away.
#[derive(Debug, Error)]
pub enum EngineError<E> {
    /// The transaction provider reported that a transaction the engine
    /// needed was not available.
    #[error("transaction {} is unavailable", hex::encode(txid))]
    TxUnavailable {
        /// The hash of the transaction that could not be fetched.
        txid: [u8; 32],
    },

    /// The transaction provider itself failed (a network error, a
    /// malformed response, ...), as opposed to merely reporting a
    /// transaction as missing.
    #[error("transaction provider failed: {0}")]
    Provider(#[source] E),

    /// A caller-initiated cancellation was observed at a suspension
    /// point.
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors the transaction builder can return.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// Not enough uncolored value was found among the available
    /// spendable outputs to satisfy a bitcoin requirement.
    #[error("insufficient uncolored funds: needed {needed}, found {found}")]
    InsufficientFunds {
        /// The amount that was required.
        needed: u64,
        /// The amount actually available.
        found: u64,
    },

    /// Not enough colored value of a given asset was found among the
    /// available spendable outputs.
    #[error("insufficient units of asset {asset_id}: needed {needed}, found {found}")]
    InsufficientAsset {
        /// The asset that fell short.
        asset_id: AssetId,
        /// The amount that was required.
        needed: u64,
        /// The amount actually available.
        found: u64,
    },

    /// A non-marker output below the dust threshold was about to be
    /// created.
    #[error("output value {value} is below the dust limit of {dust_limit}")]
    DustOutput {
        /// The value that would have been used.
        value: i64,
        /// The configured dust threshold.
        dust_limit: i64,
    },
}
