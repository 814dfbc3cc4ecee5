// std
use std::collections::HashMap;
// crates.io
use bitcoin::{Network, OutPoint};
// self
use super::{api::Tx, types::*};

/// Replay `txs` (oldest first) into the set of outputs `address` can still spend.
///
/// Transactions below `min_confirmations` are treated as if they had not happened yet, neither
/// their spends nor their outputs are applied.
pub fn reconstruct(
	txs: &[Tx],
	address: &str,
	min_confirmations: u64,
	network: Network,
) -> HashMap<OutPoint, Utxo> {
	let mut utxos = HashMap::new();

	for tx in txs {
		if tx.confirmations < min_confirmations {
			tracing::debug!(
				"skip {} with {} of {min_confirmations} confirmations",
				tx.txid,
				tx.confirmations
			);

			continue;
		}

		tx.vin.iter().filter_map(|i| i.outpoint()).for_each(|o| {
			utxos.remove(&o);
		});

		for o in &tx.vout {
			if o.address(network).as_deref() == Some(address) {
				let outpoint = OutPoint::new(tx.txid, o.n);

				utxos.insert(
					outpoint,
					Utxo { outpoint, value: o.value.to_sat(), address: address.into() },
				);
			}
		}
	}

	utxos
}

pub fn balance<'a, I>(utxos: I) -> Satoshi
where
	I: IntoIterator<Item = &'a Utxo>,
{
	utxos.into_iter().map(|u| u.value).sum()
}

#[cfg(test)]
use super::api::mock::*;

#[test]
fn reconstruct_should_work() {
	let txs = [
		tx(1, 6, &[(9, 0)], &[(TRACKED, 10_000_000), (OTHER, 1_000)]),
		tx(2, 3, &[(1, 0)], &[(OTHER, 6_990_000), (TRACKED, 3_000_000)]),
	];
	let utxos = reconstruct(&txs, TRACKED, 1, Network::Testnet);

	assert_eq!(utxos.len(), 1);
	assert!(!utxos.contains_key(&OutPoint::new(txid(1), 0)));
	assert_eq!(utxos[&OutPoint::new(txid(2), 1)].value, 3_000_000);
	assert_eq!(balance(utxos.values()), 3_000_000);

	// Replaying is deterministic.
	assert_eq!(utxos, reconstruct(&txs, TRACKED, 1, Network::Testnet));
}

#[test]
fn reconstruct_should_skip_unconfirmed() {
	let txs = [
		tx(1, 6, &[], &[(TRACKED, 10_000_000)]),
		tx(2, 0, &[(1, 0)], &[(TRACKED, 3_000_000)]),
		tx(3, 0, &[], &[(TRACKED, 5_000)]),
	];

	// The pending spend has not happened yet, neither has the pending receive.
	let utxos = reconstruct(&txs, TRACKED, 1, Network::Testnet);
	assert_eq!(utxos.keys().collect::<Vec<_>>(), [&OutPoint::new(txid(1), 0)]);

	let utxos = reconstruct(&txs, TRACKED, 0, Network::Testnet);
	assert_eq!(utxos.len(), 2);
	assert_eq!(balance(utxos.values()), 3_005_000);
}

#[test]
fn reconstruct_should_ignore_foreign_and_coinbase() {
	let mut coinbase = tx(1, 100, &[], &[(TRACKED, 50_000), (OTHER, 1)]);

	coinbase.vin.push(super::api::Vin { coinbase: Some("00".into()), txid: None, vout: None });

	let utxos = reconstruct(&[coinbase, op_return_tx()], TRACKED, 1, Network::Testnet);

	assert_eq!(utxos.len(), 1);
	assert_eq!(balance(utxos.values()), 50_000);
}
#[cfg(test)]
fn op_return_tx() -> Tx {
	let mut t = tx(2, 1, &[], &[]);

	t.vout.push(op_return(b"mark"));

	t
}
