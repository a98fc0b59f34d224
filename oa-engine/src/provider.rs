//! The two capability traits the coloring engine is parameterized over.
//! Both are narrow, function-like contracts passed in as type parameters
//! rather than globals or singletons, following
//! `bitcoins_provider::BTCProvider`'s convention of passing capabilities
//! by type.

use async_trait::async_trait;
use oa_core::types::{DecodedTransaction, Outpoint};
use oa_core::ColoredOutput;

/// Resolves a transaction hash to its decoded contents. The host owns
/// transaction fetching, decoding, and any chain-validity checks; the
/// engine only ever asks "what are this transaction's inputs and
/// outputs".
#[async_trait]
pub trait TransactionProvider: Send + Sync {
    /// An error type for provider-internal failures unrelated to
    /// "transaction not found" (e.g. a network error talking to a node).
    /// `get_transaction` itself never returns this for a merely-missing
    /// transaction -- that case is `Ok(None)`, per `spec.md` §6.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches and decodes the transaction with hash `txid`. `Ok(None)`
    /// means the provider could not find it; the engine turns that into
    /// [`crate::EngineError::TxUnavailable`].
    async fn get_transaction(
        &self,
        txid: [u8; 32],
    ) -> Result<Option<DecodedTransaction>, Self::Error>;
}

/// A caller-supplied key-value store of already-colored outputs, keyed by
/// `(txid, vout)`. Has no coherence requirements beyond "a `put` followed
/// by an equivalent `get` may return the stored value" (`spec.md` §4.6):
/// implementations may evict arbitrarily, and correctness never depends
/// on a hit.
#[async_trait]
pub trait OutputCache: Send + Sync {
    /// Looks up a previously colored output.
    async fn get(&self, outpoint: Outpoint) -> Option<ColoredOutput>;

    /// Stores a colored output.
    async fn put(&self, outpoint: Outpoint, output: ColoredOutput);
}

/// The default [`OutputCache`]: `get` always misses, `put` is a no-op.
/// Exactly the "default implementation" called for in `spec.md` §4.6.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

#[async_trait]
impl OutputCache for NullCache {
    async fn get(&self, _outpoint: Outpoint) -> Option<ColoredOutput> {
        None
    }

    async fn put(&self, _outpoint: Outpoint, _output: ColoredOutput) {}
}
