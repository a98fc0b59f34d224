//! The asset-ID resolver: given the colored outputs referenced by a
//! transaction's inputs, the index of its marker output, and the marker's
//! asset-quantity list, assigns an [`OutputType`] to every output of the
//! transaction.
//!
//! Ported from `openassets.protocol.ColoringEngine._compute_asset_addresses`
//! (see `SPEC_FULL.md` §9): the transfer phase's `next(iterator, None)`
//! idiom becomes a `Peekable` iterator over `&ColoredOutput` references
//! here.

use crate::hashes::AssetId;
use crate::marker::MarkerPayload;
use crate::script::parse_marker_script;
use crate::types::{ColoredOutput, DecodedTransaction, OutputType, Script, TxOut};

/// Resolves the [`OutputType`] of every output in a transaction, given
/// the colored outputs referenced by its inputs and the marker output's
/// position and asset-quantity list.
///
/// Returns `None` (an "invalid marker", never an error -- see `spec.md`
/// §4.4 and §7) if:
/// - `asset_quantities.len() > outputs.len() - 1`,
/// - `inputs` is empty,
/// - the transfer phase runs out of input units before an output's
///   declared quantity is fully covered, or
/// - a single output would need to draw colored units from more than one
///   distinct asset ID.
pub fn resolve_outputs(
    inputs: &[ColoredOutput],
    marker_index: usize,
    outputs: &[TxOut],
    asset_quantities: &[u64],
) -> Option<Vec<ColoredOutput>> {
    if asset_quantities.len() > outputs.len().saturating_sub(1) {
        return None;
    }
    if inputs.is_empty() {
        return None;
    }

    let mut result = Vec::with_capacity(outputs.len());

    // Issuance phase: outputs before the marker.
    let issuance_asset_id = AssetId::from_issuing_script(inputs[0].script.as_ref());
    for (i, output) in outputs.iter().enumerate().take(marker_index) {
        let colored = match asset_quantities.get(i) {
            Some(&quantity) if quantity > 0 => {
                ColoredOutput::issuance(output.value, output.script.clone(), issuance_asset_id, quantity)
            }
            _ => ColoredOutput::uncolored(output.value, output.script.clone()),
        };
        result.push(colored);
    }

    // The marker output itself.
    let marker_output = &outputs[marker_index];
    result.push(ColoredOutput::marker(marker_output.value, marker_output.script.clone()));

    // Transfer phase: outputs after the marker, drawing from the input
    // stream in order. `current` is the input currently being consumed;
    // `input_units_left` is how many of its units remain unconsumed.
    let mut input_iter = inputs.iter();
    let mut current: Option<&ColoredOutput> = None;
    let mut input_units_left: u64 = 0;

    for (i, output) in outputs.iter().enumerate().skip(marker_index + 1) {
        let out_qty = asset_quantities.get(i - 1).copied().unwrap_or(0);
        let mut units_left = out_qty;
        let mut asset_id: Option<AssetId> = None;

        while units_left > 0 {
            if input_units_left == 0 {
                current = Some(input_iter.next()?);
                input_units_left = current.unwrap().asset_quantity();
            }

            let progress = input_units_left.min(units_left);
            units_left -= progress;
            input_units_left -= progress;

            if let Some(current_asset_id) = current.and_then(ColoredOutput::asset_id) {
                match asset_id {
                    None => asset_id = Some(current_asset_id),
                    Some(existing) if existing != current_asset_id => return None,
                    Some(_) => {}
                }
            }
        }

        result.push(ColoredOutput::transfer(
            output.value,
            output.script.clone(),
            asset_id,
            out_qty,
        ));
    }

    Some(result)
}

/// Colors every output of `tx`, given the already-colored outputs its
/// inputs reference, in input order.
///
/// A coinbase transaction's outputs are always [`OutputType::Uncolored`]:
/// it has no real input to derive an issuance ID from. Otherwise, scans
/// outputs left to right for the first one whose script matches the
/// marker pattern *and* whose payload parses *and* whose asset-quantity
/// list is accepted by [`resolve_outputs`]; the first such output wins
/// and its resolution is returned. If no output qualifies, every output
/// is [`OutputType::Uncolored`] and the transaction carries no assets.
///
/// `input_colors[i]` must be the colored output `tx.inputs[i]` spends;
/// callers (the coloring engine) are responsible for resolving those
/// first.
pub fn color_transaction(tx: &DecodedTransaction, input_colors: &[ColoredOutput]) -> Vec<ColoredOutput> {
    if tx.is_coinbase() {
        return tx
            .outputs
            .iter()
            .map(|o| ColoredOutput::uncolored(o.value, o.script.clone()))
            .collect();
    }

    for (i, candidate) in tx.outputs.iter().enumerate() {
        let Some(payload) = parse_marker_script(candidate.script.as_ref()) else {
            continue;
        };
        let Some(marker) = MarkerPayload::parse(&payload) else {
            continue;
        };
        if let Some(resolved) = resolve_outputs(input_colors, i, &tx.outputs, &marker.asset_quantities) {
            return resolved;
        }
    }

    tx.outputs
        .iter()
        .map(|o| ColoredOutput::uncolored(o.value, o.script.clone()))
        .collect()
}
