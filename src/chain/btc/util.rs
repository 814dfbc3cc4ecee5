// std
use std::collections::{HashMap, HashSet};
// crates.io
use bitcoin::{address::NetworkUnchecked, Address, Network, OutPoint};
// self
use super::types::*;
use crate::prelude::*;

pub fn addr_from_str(s: &str, network: Network) -> Result<Address> {
	let invalid = |source| ChainError::InvalidAddress { address: s.into(), source };

	Ok(s.trim()
		.parse::<Address<NetworkUnchecked>>()
		.map_err(invalid)?
		.require_network(network)
		.map_err(invalid)?)
}
#[test]
fn addr_from_str_should_work() {
	assert!(addr_from_str("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx", Network::Testnet).is_ok());
	assert!(matches!(
		addr_from_str("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", Network::Testnet),
		Err(Error::Chain(ChainError::InvalidAddress { .. }))
	));
	assert!(matches!(
		addr_from_str("", Network::Testnet),
		Err(Error::Chain(ChainError::InvalidAddress { .. }))
	));
}

// Tiered greedy selection, first match wins:
//
// 1. A single output worth exactly `target`. When several qualify the pick is arbitrary, callers
//    must not depend on which one comes back.
// 2. Outputs below `target`, largest first, until their sum reaches `target`.
// 3. The smallest single output above `target`.
//
// This favours few large inputs over minimal change, it is not a subset-sum optimizer.
pub fn select_utxos(
	utxos: &HashMap<OutPoint, Utxo>,
	excluded: &HashSet<OutPoint>,
	target: Satoshi,
) -> Result<Selection> {
	if target == 0 {
		Err(ChainError::InvalidAmount("target must be positive".into()))?;
	}

	let mut candidates =
		utxos.values().filter(|u| !excluded.contains(&u.outpoint)).collect::<Vec<_>>();

	// The map iterates in no particular order.
	candidates.sort_unstable_by_key(|u| u.outpoint);

	if let Some(u) = candidates.iter().find(|u| u.value == target) {
		return Ok(Selection { utxos: vec![(*u).to_owned()], total: target });
	}

	let (mut small, big) = candidates.into_iter().partition::<Vec<_>, _>(|u| u.value < target);

	small.sort_by(|a, b| b.value.cmp(&a.value));

	let mut total = 0;
	let mut selected = Vec::new();

	for u in &small {
		total += u.value;
		selected.push((*u).to_owned());

		if total >= target {
			return Ok(Selection { utxos: selected, total });
		}
	}

	if let Some(u) = big.into_iter().min_by_key(|u| u.value) {
		return Ok(Selection { utxos: vec![u.to_owned()], total: u.value });
	}

	Err(ChainError::InsufficientFunds { required: target, available: total })?
}
#[cfg(test)]
fn utxo_set<const N: usize>(utxos: [Utxo; N]) -> HashMap<OutPoint, Utxo> {
	utxos.into_iter().map(|u| (u.outpoint, u)).collect()
}
#[test]
fn select_utxos_should_work() {
	// Exact match.
	let utxos = utxo_set([Utxo::new(0xa, 0, 50_000_000), Utxo::new(0xb, 0, 70_000_000)]);
	let s = select_utxos(&utxos, &HashSet::new(), 50_000_000).unwrap();
	assert_eq!(s, Selection { utxos: vec![Utxo::new(0xa, 0, 50_000_000)], total: 50_000_000 });

	// Descending accumulation stops as soon as the target is reached.
	let utxos = utxo_set([
		Utxo::new(0xa, 0, 10_000_000),
		Utxo::new(0xb, 0, 20_000_000),
		Utxo::new(0xc, 0, 5_000_000),
	]);
	let s = select_utxos(&utxos, &HashSet::new(), 25_000_000).unwrap();
	assert_eq!(s.total, 30_000_000);
	assert_eq!(s.utxos, [Utxo::new(0xb, 0, 20_000_000), Utxo::new(0xa, 0, 10_000_000)]);

	// Falls back to the smallest output covering the target on its own.
	let utxos = utxo_set([
		Utxo::new(0xa, 0, 1),
		Utxo::new(0xb, 0, 2),
		Utxo::new(0xc, 0, 3),
		Utxo::new(0xd, 0, 9),
		Utxo::new(0xe, 0, 8),
	]);
	let s = select_utxos(&utxos, &HashSet::new(), 7).unwrap();
	assert_eq!(s, Selection { utxos: vec![Utxo::new(0xe, 0, 8)], total: 8 });

	// Below-target outputs are preferred over a single bigger one whenever they suffice.
	let s = select_utxos(&utxos, &HashSet::new(), 5).unwrap();
	assert_eq!(s.utxos, [Utxo::new(0xc, 0, 3), Utxo::new(0xb, 0, 2)]);
}
#[test]
fn select_utxos_should_break_ties_by_outpoint() {
	let utxos = utxo_set([
		Utxo::new(0xc, 0, 4),
		Utxo::new(0xa, 1, 4),
		Utxo::new(0xa, 0, 4),
		Utxo::new(0xb, 0, 1),
	]);
	let s = select_utxos(&utxos, &HashSet::new(), 9).unwrap();
	let outpoint = |txid, vout| Utxo::new(txid, vout, 0).outpoint;

	assert_eq!(s.total, 12);
	assert_eq!(
		s.outpoints().collect::<Vec<_>>(),
		[outpoint(0xa, 0), outpoint(0xa, 1), outpoint(0xc, 0)]
	);
}
#[test]
fn select_utxos_should_fail() {
	let utxos = utxo_set([Utxo::new(0xa, 0, 5_000_000)]);
	assert!(matches!(
		select_utxos(&utxos, &HashSet::new(), 25_000_000),
		Err(Error::Chain(ChainError::InsufficientFunds {
			required: 25_000_000,
			available: 5_000_000
		}))
	));

	let utxos = utxo_set([
		Utxo::new(0xa, 0, 10_000_000),
		Utxo::new(0xb, 0, 20_000_000),
		Utxo::new(0xc, 0, 5_000_000),
	]);
	let excluded = HashSet::from([Utxo::new(0xb, 0, 0).outpoint]);
	assert!(matches!(
		select_utxos(&utxos, &excluded, 25_000_000),
		Err(Error::Chain(ChainError::InsufficientFunds { available: 15_000_000, .. }))
	));

	// Nothing left once everything is excluded.
	let excluded = utxos.keys().copied().collect();
	assert!(matches!(
		select_utxos(&utxos, &excluded, 1),
		Err(Error::Chain(ChainError::InsufficientFunds { available: 0, .. }))
	));

	assert!(matches!(
		select_utxos(&utxos, &HashSet::new(), 0),
		Err(Error::Chain(ChainError::InvalidAmount(_)))
	));
}
