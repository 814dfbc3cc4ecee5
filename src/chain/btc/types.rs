// crates.io
#[cfg(test)] use bitcoin::{hashes::Hash, Txid};
use bitcoin::OutPoint;
use serde::Serialize;

pub type Satoshi = u64;
#[test]
fn max_btc_in_satoshi_should_work() {
	let max_btc = 21_000_000_u64 * 100_000_000;

	assert!(Satoshi::MAX > max_btc);
	assert!(SignedSatoshi::MAX as Satoshi > max_btc);
}

/// Balance deltas may be negative.
pub type SignedSatoshi = i64;

pub type Index = u32;

/// A spendable output owned by the tracked address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Utxo {
	pub outpoint: OutPoint,
	pub value: Satoshi,
	pub address: String,
}
#[cfg(test)]
impl Utxo {
	pub fn new(txid: u8, vout: Index, value: Satoshi) -> Self {
		Self {
			outpoint: OutPoint::new(Txid::from_byte_array([txid; 32]), vout),
			value,
			address: "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx".into(),
		}
	}
}

/// Outputs picked by the coin selector, in the order they become inputs.
#[derive(Debug, PartialEq, Eq)]
pub struct Selection {
	pub utxos: Vec<Utxo>,
	pub total: Satoshi,
}
impl Selection {
	pub fn outpoints(&self) -> impl Iterator<Item = OutPoint> + '_ {
		self.utxos.iter().map(|u| u.outpoint)
	}
}
