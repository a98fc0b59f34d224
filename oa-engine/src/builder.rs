//! The Open Assets transaction builder: issuance, transfer, and the
//! swap parameterizations of transfer.
//!
//! Purely functional over its caller-supplied inputs -- no provider, no
//! cache, no `await` anywhere in this module. Grounded on
//! `openassets.transactions.TransactionBuilder`, generalized to the full
//! bitcoin-leg and swap handling `spec.md` §4.7 describes (the Python
//! original's `send` stops short of emitting the marker output or
//! balancing bitcoin; see `SPEC_FULL.md` §9 and `DESIGN.md`).

use std::collections::HashSet;

use tracing::trace;

use oa_core::script::build_marker_script;
use oa_core::types::{DecodedTransaction, Outpoint, OutputType, Script, TxIn, TxOut};
use oa_core::{AssetId, ColoredOutput, MarkerPayload};

use crate::error::BuilderError;

/// A previously colored output the builder may spend, along with the
/// coordinates needed to reference it as an input. Named after
/// `openassets.transactions.SpendableOutput`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpendableOutput {
    /// The coordinates of the output.
    pub outpoint: Outpoint,
    /// The output itself, with its coloring already resolved.
    pub output: ColoredOutput,
}

impl SpendableOutput {
    /// Builds a spendable output.
    pub fn new(outpoint: Outpoint, output: ColoredOutput) -> Self {
        Self { outpoint, output }
    }
}

/// One leg of a transfer: where the requested amount goes, where any
/// excess goes, and how much is requested. Used for both the asset legs
/// and the bitcoin leg of [`TxBuilder::transfer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferSpec {
    /// The script receiving `amount`.
    pub to_script: Script,
    /// The script receiving any excess collected beyond `amount`.
    pub change_script: Script,
    /// The amount requested.
    pub amount: u64,
}

impl TransferSpec {
    /// Builds a transfer spec.
    pub fn new(to_script: impl Into<Script>, change_script: impl Into<Script>, amount: u64) -> Self {
        Self {
            to_script: to_script.into(),
            change_script: change_script.into(),
            amount,
        }
    }
}

/// Builds Open Assets transactions over a caller-supplied pool of
/// spendable outputs. Its only configuration is the dust threshold: the
/// minimum satoshi value a non-marker output may carry.
#[derive(Debug, Clone, Copy)]
pub struct TxBuilder {
    dust_amount: i64,
}

impl TxBuilder {
    /// Builds a `TxBuilder` enforcing `dust_amount` as the minimum
    /// non-marker output value.
    pub fn new(dust_amount: i64) -> Self {
        Self { dust_amount }
    }

    /// Builds a transaction issuing `amount` new units of an asset.
    ///
    /// Selects uncolored outputs from `spendable`, in order, until their
    /// cumulative value covers `2 * dust_amount + fees`. Emits, in
    /// order: the new colored output, the marker, and the uncolored
    /// change.
    pub fn issue(
        &self,
        spendable: &[SpendableOutput],
        amount: u64,
        metadata: Vec<u8>,
        spec: &TransferSpec,
        fees: i64,
    ) -> Result<DecodedTransaction, BuilderError> {
        let needed = 2 * self.dust_amount + fees;
        let mut used = HashSet::new();
        let (picked, total) = Self::collect_uncolored(spendable, needed, &mut used)?;

        let marker_script = build_marker_output_script(&[amount], metadata);

        let mut outputs = Vec::with_capacity(3);
        self.push_checked(&mut outputs, self.dust_amount, spec.to_script.clone())?;
        outputs.push(TxOut::new(0, marker_script));
        self.push_checked(&mut outputs, total - self.dust_amount - fees, spec.change_script.clone())?;

        trace!(amount, inputs = picked.len(), "builder emitted issuance marker");
        Ok(DecodedTransaction::new(to_inputs(picked), outputs))
    }

    /// Builds a transaction transferring any combination of assets and
    /// bitcoin in one pass.
    ///
    /// For each `(asset_id, spec)`: selects colored outputs carrying
    /// `asset_id` until `spec.amount` units are covered, appends a
    /// colored output for `spec.amount` and, if over-selected, a colored
    /// change output for the excess. Then balances the bitcoin leg:
    /// selects uncolored outputs if the colored inputs' combined value
    /// doesn't already cover `btc_spec.amount + fees`, appends bitcoin
    /// change for any remainder, and appends the bitcoin payment output
    /// if `btc_spec.amount > 0`. If any assets moved, inserts the marker
    /// output at index 0.
    pub fn transfer(
        &self,
        spendable: &[SpendableOutput],
        asset_specs: &[(AssetId, TransferSpec)],
        btc_spec: &TransferSpec,
        metadata: Vec<u8>,
        fees: i64,
    ) -> Result<DecodedTransaction, BuilderError> {
        let mut used = HashSet::new();
        let mut picked = Vec::new();
        let mut outputs = Vec::new();
        let mut asset_quantities = Vec::new();
        let mut input_value: i64 = 0;
        let mut colored_output_value: i64 = 0;

        for (asset_id, spec) in asset_specs {
            let (leg_picked, collected_qty, collected_value) =
                Self::collect_colored(spendable, *asset_id, spec.amount, &mut used)?;
            picked.extend(leg_picked);
            input_value += collected_value;

            self.push_checked(&mut outputs, self.dust_amount, spec.to_script.clone())?;
            colored_output_value += self.dust_amount;
            asset_quantities.push(spec.amount);

            if collected_qty > spec.amount {
                self.push_checked(&mut outputs, self.dust_amount, spec.change_script.clone())?;
                colored_output_value += self.dust_amount;
                asset_quantities.push(collected_qty - spec.amount);
            }
        }

        let required = btc_spec.amount as i64 + fees;
        let mut btc_excess = input_value - colored_output_value;
        if btc_excess < required {
            let gap = required - btc_excess;
            let (leg_picked, collected_value) = Self::collect_uncolored(spendable, gap, &mut used)?;
            picked.extend(leg_picked);
            input_value += collected_value;
            btc_excess = input_value - colored_output_value;
        }

        let excess_remaining = btc_excess - required;
        if excess_remaining > 0 {
            self.push_checked(&mut outputs, excess_remaining, btc_spec.change_script.clone())?;
        }
        if btc_spec.amount > 0 {
            self.push_checked(&mut outputs, btc_spec.amount as i64, btc_spec.to_script.clone())?;
        }

        if !asset_quantities.is_empty() {
            let marker_script = build_marker_output_script(&asset_quantities, metadata);
            outputs.insert(0, TxOut::new(0, marker_script));
            trace!(?asset_quantities, "builder emitted transfer marker");
        } else {
            trace!("builder transfer carries no assets, no marker emitted");
        }

        Ok(DecodedTransaction::new(to_inputs(picked), outputs))
    }

    /// `Transfer_bitcoin`: a pure bitcoin payment, no assets involved.
    pub fn transfer_bitcoin(
        &self,
        spendable: &[SpendableOutput],
        btc_spec: &TransferSpec,
        fees: i64,
    ) -> Result<DecodedTransaction, BuilderError> {
        self.transfer(spendable, &[], btc_spec, Vec::new(), fees)
    }

    /// `Transfer_assets`: moves one or more assets, using bitcoin only
    /// to cover fees. `btc_change_script` receives any leftover value.
    pub fn transfer_assets(
        &self,
        spendable: &[SpendableOutput],
        asset_specs: &[(AssetId, TransferSpec)],
        btc_change_script: impl Into<Script>,
        metadata: Vec<u8>,
        fees: i64,
    ) -> Result<DecodedTransaction, BuilderError> {
        let btc_spec = TransferSpec::new(Script::default(), btc_change_script, 0);
        self.transfer(spendable, asset_specs, &btc_spec, metadata, fees)
    }

    /// `Btc_asset_swap`: one party's bitcoin for the other's asset
    /// units, settled in a single transaction.
    pub fn btc_asset_swap(
        &self,
        spendable: &[SpendableOutput],
        asset_id: AssetId,
        asset_spec: &TransferSpec,
        btc_spec: &TransferSpec,
        fees: i64,
    ) -> Result<DecodedTransaction, BuilderError> {
        self.transfer(spendable, &[(asset_id, asset_spec.clone())], btc_spec, Vec::new(), fees)
    }

    /// `Asset_asset_swap`: two parties' asset units for each other,
    /// settled in a single transaction. Bitcoin only covers fees.
    pub fn asset_asset_swap(
        &self,
        spendable: &[SpendableOutput],
        asset_specs: &[(AssetId, TransferSpec)],
        btc_change_script: impl Into<Script>,
        fees: i64,
    ) -> Result<DecodedTransaction, BuilderError> {
        let btc_spec = TransferSpec::new(Script::default(), btc_change_script, 0);
        self.transfer(spendable, asset_specs, &btc_spec, Vec::new(), fees)
    }

    fn push_checked(&self, outputs: &mut Vec<TxOut>, value: i64, script: Script) -> Result<(), BuilderError> {
        if value < self.dust_amount {
            trace!(value, dust_limit = self.dust_amount, "builder rejected output below dust limit");
            return Err(BuilderError::DustOutput {
                value,
                dust_limit: self.dust_amount,
            });
        }
        outputs.push(TxOut::new(value, script));
        Ok(())
    }

    fn collect_uncolored(
        spendable: &[SpendableOutput],
        amount: i64,
        used: &mut HashSet<Outpoint>,
    ) -> Result<(Vec<Outpoint>, i64), BuilderError> {
        let mut collected = 0i64;
        let mut picked = Vec::new();
        for candidate in spendable {
            if used.contains(&candidate.outpoint) {
                continue;
            }
            if candidate.output.output_type != OutputType::Uncolored {
                continue;
            }
            picked.push(candidate.outpoint);
            used.insert(candidate.outpoint);
            collected += candidate.output.value;
            trace!(
                outpoint_vout = candidate.outpoint.vout,
                value = candidate.output.value,
                collected,
                needed = amount,
                "builder selected uncolored input"
            );
            if collected >= amount {
                return Ok((picked, collected));
            }
        }
        trace!(collected, needed = amount, "builder ran out of uncolored inputs");
        Err(BuilderError::InsufficientFunds {
            needed: amount.max(0) as u64,
            found: collected.max(0) as u64,
        })
    }

    fn collect_colored(
        spendable: &[SpendableOutput],
        asset_id: AssetId,
        amount: u64,
        used: &mut HashSet<Outpoint>,
    ) -> Result<(Vec<Outpoint>, u64, i64), BuilderError> {
        let mut collected_qty = 0u64;
        let mut collected_value = 0i64;
        let mut picked = Vec::new();
        for candidate in spendable {
            if used.contains(&candidate.outpoint) {
                continue;
            }
            if candidate.output.asset_id() != Some(asset_id) {
                continue;
            }
            picked.push(candidate.outpoint);
            used.insert(candidate.outpoint);
            collected_qty += candidate.output.asset_quantity();
            collected_value += candidate.output.value;
            trace!(
                outpoint_vout = candidate.outpoint.vout,
                %asset_id,
                quantity = candidate.output.asset_quantity(),
                collected_qty,
                needed = amount,
                "builder selected colored input"
            );
            if collected_qty >= amount {
                return Ok((picked, collected_qty, collected_value));
            }
        }
        trace!(%asset_id, collected_qty, needed = amount, "builder ran out of matching colored inputs");
        Err(BuilderError::InsufficientAsset {
            asset_id,
            needed: amount,
            found: collected_qty,
        })
    }
}

fn to_inputs(outpoints: Vec<Outpoint>) -> Vec<TxIn> {
    outpoints.into_iter().map(TxIn::new).collect()
}

fn build_marker_output_script(asset_quantities: &[u64], metadata: Vec<u8>) -> Script {
    let payload = MarkerPayload::new(asset_quantities.to_vec(), metadata).serialize();
    build_marker_script(&payload).into()
}
