//! The coloring engine: resolves the [`oa_core::OutputType`] of any
//! output by walking its provenance DAG through a host-supplied
//! [`TransactionProvider`] and [`OutputCache`].
//!
//! `get_output` and `color_transaction` are mutually recursive in
//! `openassets.protocol.ColoringEngine` (color_transaction resolves an
//! input by calling get_output, which calls color_transaction on the
//! fetched parent). A chain of a thousand unconfirmed transactions would
//! recurse a thousand `async fn` frames deep under a direct port. Instead
//! both public methods drive a single internal loop over an explicit
//! stack of pending transactions, so provenance depth is bounded only by
//! heap, never by the poll-time call stack.

use oa_core::types::{ColoredOutput, DecodedTransaction, Outpoint};
use oa_core::OutputType;
use tracing::trace;

use crate::error::EngineError;
use crate::provider::{OutputCache, TransactionProvider};

/// Colors transaction outputs against a [`TransactionProvider`] and
/// [`OutputCache`] pair. Stateless beyond those two handles: all
/// memoization of already-colored outputs lives in `cache`, not here.
///
/// `cancel` is the poll-for-cancelled hook: a minimal,
/// `tokio_util::sync::CancellationToken`-shaped callback checked at
/// every suspension point in [`Self::run`] (cache lookup, provider
/// fetch, cache store), since this crate does not otherwise depend on
/// an async runtime. `None` means the engine never cancels itself.
pub struct ColoringEngine<'a, P, C> {
    provider: P,
    cache: C,
    cancel: Option<&'a (dyn Fn() -> bool + Send + Sync)>,
}

impl<'a, P, C> std::fmt::Debug for ColoringEngine<'a, P, C>
where
    P: std::fmt::Debug,
    C: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColoringEngine")
            .field("provider", &self.provider)
            .field("cache", &self.cache)
            .field("cancel", &self.cancel.map(|_| "<hook>"))
            .finish()
    }
}

/// One transaction's worth of in-progress coloring work. `input_colors`
/// accumulates as each of `tx`'s inputs is resolved, in order;
/// `next_input` is the index of the next input still needing resolution.
struct Frame {
    txid: [u8; 32],
    tx: DecodedTransaction,
    input_colors: Vec<ColoredOutput>,
    next_input: usize,
    /// Whether this frame's resolved outputs should be written to the
    /// cache on completion. `false` only for the synthetic root frame
    /// seeded by [`ColoringEngine::color_transaction`], which has no
    /// hash of its own to key a cache entry with.
    cache_on_finish: bool,
}

impl<'a, P, C> ColoringEngine<'a, P, C>
where
    P: TransactionProvider,
    C: OutputCache,
{
    /// Builds an engine over a transaction provider and output cache,
    /// with no cancellation hook installed.
    pub fn new(provider: P, cache: C) -> Self {
        Self {
            provider,
            cache,
            cancel: None,
        }
    }

    /// Installs a poll-for-cancelled hook: called at every suspension
    /// point during coloring, an `Ok` result from `true` short-circuits
    /// the run with [`EngineError::Cancelled`].
    pub fn with_cancellation(mut self, hook: &'a (dyn Fn() -> bool + Send + Sync)) -> Self {
        self.cancel = Some(hook);
        self
    }

    fn check_cancelled(&self) -> Result<(), EngineError<P::Error>> {
        if let Some(hook) = self.cancel {
            if hook() {
                return Err(EngineError::Cancelled);
            }
        }
        Ok(())
    }

    /// Resolves the colored output at `(txid, vout)`.
    ///
    /// Checks the cache first. On a miss, fetches the transaction,
    /// colors it (recursively resolving its inputs' colors through this
    /// same cache-then-fetch path), stores every one of its outputs in
    /// the cache, and returns the requested one.
    pub async fn get_output(&self, txid: [u8; 32], vout: usize) -> Result<ColoredOutput, EngineError<P::Error>> {
        let outpoint = Outpoint::new(txid, vout as u32);
        self.check_cancelled()?;
        if let Some(cached) = self.cache.get(outpoint).await {
            trace!(txid = %hex::encode(txid), vout, "coloring cache hit");
            return Ok(cached);
        }
        trace!(txid = %hex::encode(txid), vout, "coloring cache miss");

        let tx = self.fetch(txid).await?;
        let colored = self.run(Some(txid), tx).await?;

        for (i, output) in colored.iter().enumerate() {
            self.check_cancelled()?;
            self.cache
                .put(Outpoint::new(txid, i as u32), output.clone())
                .await;
        }

        colored
            .into_iter()
            .nth(vout)
            .ok_or(EngineError::TxUnavailable { txid })
    }

    /// Colors every output of a caller-supplied transaction, resolving
    /// its inputs' colors through the cache and provider as needed.
    /// Unlike [`Self::get_output`], the result is never cached here: the
    /// caller has no guaranteed hash to key it with (that's what
    /// [`Self::get_output`] is for).
    pub async fn color_transaction(
        &self,
        tx: &DecodedTransaction,
    ) -> Result<Vec<ColoredOutput>, EngineError<P::Error>> {
        self.run(None, tx.clone()).await
    }

    async fn fetch(&self, txid: [u8; 32]) -> Result<DecodedTransaction, EngineError<P::Error>> {
        self.check_cancelled()?;
        trace!(txid = %hex::encode(txid), "provider fetch start");
        match self.provider.get_transaction(txid).await {
            Ok(Some(tx)) => Ok(tx),
            Ok(None) => Err(EngineError::TxUnavailable { txid }),
            Err(err) => {
                trace!(txid = %hex::encode(txid), error = %err, "provider fetch failed");
                Err(EngineError::Provider(err))
            }
        }
    }

    /// The iterative work-stack driving both public methods. `root_txid`
    /// is `Some` for `get_output` (the root's outputs get cached once
    /// resolved) and `None` for `color_transaction` (they don't).
    async fn run(
        &self,
        root_txid: Option<[u8; 32]>,
        root_tx: DecodedTransaction,
    ) -> Result<Vec<ColoredOutput>, EngineError<P::Error>> {
        let mut stack = vec![Frame {
            txid: root_txid.unwrap_or([0u8; 32]),
            tx: root_tx,
            input_colors: Vec::new(),
            next_input: 0,
            cache_on_finish: root_txid.is_some(),
        }];

        let mut root_result = None;

        // Indexes into `stack` rather than holding a `&mut Frame` across
        // the loop body: a live reference from `last_mut()` would still
        // be considered in scope at the `stack.push`/`finish_top` calls
        // below, which themselves need to borrow `stack` mutably.
        while !stack.is_empty() {
            self.check_cancelled()?;
            let top = stack.len() - 1;

            if stack[top].tx.is_coinbase() {
                trace!(txid = %hex::encode(stack[top].txid), "coinbase short-circuit: all outputs uncolored");
                let colored = oa_core::color_transaction(&stack[top].tx, &[]);
                self.finish_top(&mut stack, colored, &mut root_result).await?;
                continue;
            }

            let next_input = stack[top].next_input;
            if next_input < stack[top].tx.inputs.len() {
                let outpoint = stack[top].tx.inputs[next_input].previous_output;

                self.check_cancelled()?;
                if let Some(cached) = self.cache.get(outpoint).await {
                    stack[top].input_colors.push(cached);
                    stack[top].next_input += 1;
                    continue;
                }

                let parent_tx = self.fetch(outpoint.txid).await?;
                stack.push(Frame {
                    txid: outpoint.txid,
                    tx: parent_tx,
                    input_colors: Vec::new(),
                    next_input: 0,
                    cache_on_finish: true,
                });
                continue;
            }

            let colored = oa_core::color_transaction(&stack[top].tx, &stack[top].input_colors);
            let marker_found = colored.iter().any(|o| o.output_type != OutputType::Uncolored);
            trace!(
                txid = %hex::encode(stack[top].txid),
                marker_found,
                "marker scan complete"
            );
            self.finish_top(&mut stack, colored, &mut root_result).await?;
        }

        Ok(root_result.expect("loop only exits once the root frame has finished"))
    }

    /// Completes the top-of-stack frame: caches its outputs if
    /// applicable, pops it, and either stores the final result (stack
    /// now empty) or feeds the output its parent's pending input needed
    /// back into the parent frame.
    async fn finish_top(
        &self,
        stack: &mut Vec<Frame>,
        colored: Vec<ColoredOutput>,
        root_result: &mut Option<Vec<ColoredOutput>>,
    ) -> Result<(), EngineError<P::Error>> {
        let finished = stack.pop().expect("frame present");

        if finished.cache_on_finish {
            for (i, output) in colored.iter().enumerate() {
                self.check_cancelled()?;
                self.cache
                    .put(Outpoint::new(finished.txid, i as u32), output.clone())
                    .await;
            }
        }

        match stack.last_mut() {
            None => *root_result = Some(colored),
            Some(parent) => {
                let wanted_vout = parent.tx.inputs[parent.next_input].previous_output.vout as usize;
                let output = colored
                    .get(wanted_vout)
                    .cloned()
                    .unwrap_or_else(|| ColoredOutput::uncolored(-1, Vec::new()));
                parent.input_colors.push(output);
                parent.next_input += 1;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use oa_core::types::{Outpoint, Script, TxIn, TxOut};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("mock provider: transaction not registered")]
    struct MockError;

    #[derive(Default)]
    struct MockProvider {
        txs: HashMap<[u8; 32], DecodedTransaction>,
        fetches: AtomicUsize,
    }

    impl MockProvider {
        fn insert(&mut self, txid: [u8; 32], tx: DecodedTransaction) {
            self.txs.insert(txid, tx);
        }
    }

    #[async_trait]
    impl TransactionProvider for MockProvider {
        type Error = MockError;

        async fn get_transaction(&self, txid: [u8; 32]) -> Result<Option<DecodedTransaction>, Self::Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.txs.get(&txid).cloned())
        }
    }

    #[derive(Default)]
    struct MockCache {
        entries: Mutex<HashMap<Outpoint, ColoredOutput>>,
    }

    #[async_trait]
    impl OutputCache for MockCache {
        async fn get(&self, outpoint: Outpoint) -> Option<ColoredOutput> {
            self.entries.lock().unwrap().get(&outpoint).cloned()
        }

        async fn put(&self, outpoint: Outpoint, output: ColoredOutput) {
            self.entries.lock().unwrap().insert(outpoint, output);
        }
    }

    fn txid_of(n: u32) -> [u8; 32] {
        let mut id = [0u8; 32];
        id[..4].copy_from_slice(&n.to_le_bytes());
        id
    }

    #[tokio::test]
    async fn coinbase_output_is_always_uncolored() {
        let mut provider = MockProvider::default();
        let coinbase_id = txid_of(1);
        provider.insert(
            coinbase_id,
            DecodedTransaction::new(
                vec![TxIn::new(Outpoint::null())],
                vec![TxOut::new(50_0000_0000, Script::default())],
            ),
        );

        let engine = ColoringEngine::new(provider, MockCache::default());
        let output = engine.get_output(coinbase_id, 0).await.unwrap();
        assert_eq!(output.output_type, oa_core::OutputType::Uncolored);
    }

    #[tokio::test]
    async fn missing_transaction_is_a_tx_unavailable_error() {
        let engine = ColoringEngine::new(MockProvider::default(), MockCache::default());
        let err = engine.get_output(txid_of(9), 0).await.unwrap_err();
        assert!(matches!(err, EngineError::TxUnavailable { .. }));
    }

    #[tokio::test]
    async fn a_thousand_level_deep_chain_resolves_with_one_fetch_per_link_and_is_warm_on_replay() {
        // Build a chain tx_0 (coinbase) -> tx_1 -> tx_2 -> ... -> tx_999,
        // where tx_i spends tx_{i-1}'s only output and carries no marker,
        // so every output is uncolored. This just exercises depth, not
        // asset semantics.
        const DEPTH: u32 = 1000;
        let mut provider = MockProvider::default();

        let root_id = txid_of(0);
        provider.insert(
            root_id,
            DecodedTransaction::new(
                vec![TxIn::new(Outpoint::null())],
                vec![TxOut::new(1000, Script::default())],
            ),
        );

        let mut prev_id = root_id;
        let mut tip_id = root_id;
        for i in 1..DEPTH {
            let this_id = txid_of(i);
            provider.insert(
                this_id,
                DecodedTransaction::new(
                    vec![TxIn::new(Outpoint::new(prev_id, 0))],
                    vec![TxOut::new(1000, Script::default())],
                ),
            );
            prev_id = this_id;
            tip_id = this_id;
        }

        let engine = ColoringEngine::new(provider, MockCache::default());

        let output = engine.get_output(tip_id, 0).await.unwrap();
        assert_eq!(output.output_type, oa_core::OutputType::Uncolored);
        assert_eq!(
            engine.provider.fetches.load(Ordering::SeqCst) as u32,
            DEPTH,
            "every link in the chain should be fetched exactly once cold"
        );

        let fetches_before_replay = engine.provider.fetches.load(Ordering::SeqCst);
        let replayed = engine.get_output(tip_id, 0).await.unwrap();
        assert_eq!(replayed.output_type, oa_core::OutputType::Uncolored);
        assert_eq!(
            engine.provider.fetches.load(Ordering::SeqCst),
            fetches_before_replay,
            "a warm tip lookup must not touch the provider at all"
        );
    }

    #[tokio::test]
    async fn color_transaction_does_not_cache_the_callers_own_transaction() {
        let mut provider = MockProvider::default();
        let parent_id = txid_of(5);
        provider.insert(
            parent_id,
            DecodedTransaction::new(
                vec![TxIn::new(Outpoint::null())],
                vec![TxOut::new(1000, Script::from(b"abcdef".to_vec()))],
            ),
        );

        let engine = ColoringEngine::new(provider, MockCache::default());
        let child = DecodedTransaction::new(
            vec![TxIn::new(Outpoint::new(parent_id, 0))],
            vec![TxOut::new(1000, Script::default())],
        );

        let colored = engine.color_transaction(&child).await.unwrap();
        assert_eq!(colored[0].output_type, oa_core::OutputType::Uncolored);

        // The synthetic child transaction has no hash, so nothing about
        // it was written to the cache; only its fetched parent was.
        assert!(engine.cache.get(Outpoint::new(parent_id, 0)).await.is_some());
    }

    #[tokio::test]
    async fn an_already_tripped_cancellation_hook_stops_the_run_before_any_fetch() {
        let mut provider = MockProvider::default();
        let txid = txid_of(7);
        provider.insert(
            txid,
            DecodedTransaction::new(
                vec![TxIn::new(Outpoint::null())],
                vec![TxOut::new(1000, Script::default())],
            ),
        );

        let hook = || true;
        let engine = ColoringEngine::new(provider, MockCache::default()).with_cancellation(&hook);

        let err = engine.get_output(txid, 0).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
        assert_eq!(
            engine.provider.fetches.load(Ordering::SeqCst),
            0,
            "cancellation must be observed before the first suspension point"
        );
    }
}
