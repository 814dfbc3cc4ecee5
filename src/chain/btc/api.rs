//! Read-only view of the ledger that every operation reconstructs its state from.

pub mod node;

// crates.io
use bitcoin::{Address, Amount, BlockHash, Network, OutPoint, ScriptBuf, TxMerkleNode, Txid};
use serde::Deserialize;
// self
use super::types::*;
use crate::prelude::*;

pub trait LedgerQuery {
	/// Transactions touching `address`, at most `count` of them.
	async fn search_transactions(
		&self,
		address: &str,
		count: u32,
		order: HistoryOrder,
	) -> Result<Vec<Tx>>;

	async fn get_transaction(&self, txid: &Txid) -> Result<Tx>;

	async fn get_block(&self, id: BlockId) -> Result<Block>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryOrder {
	OldestFirst,
	NewestFirst,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockId {
	Latest,
	Hash(BlockHash),
	Height(u64),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Tx {
	pub txid: Txid,
	#[serde(default)]
	pub vin: Vec<Vin>,
	#[serde(default)]
	pub vout: Vec<Vout>,
	// Absent while the transaction sits in the mempool.
	#[serde(default)]
	pub confirmations: u64,
	#[serde(default)]
	pub blockhash: Option<BlockHash>,
	#[serde(default)]
	pub blocktime: Option<i64>,
}
impl Tx {
	pub fn output(&self, index: Index) -> Option<&Vout> {
		self.vout.iter().find(|o| o.n == index)
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Vin {
	#[serde(default)]
	pub coinbase: Option<String>,
	#[serde(default)]
	pub txid: Option<Txid>,
	#[serde(default)]
	pub vout: Option<Index>,
}
impl Vin {
	/// The output this input spends, `None` for a coinbase input.
	pub fn outpoint(&self) -> Option<OutPoint> {
		match (self.txid, self.vout) {
			(Some(txid), Some(vout)) if self.coinbase.is_none() => Some(OutPoint::new(txid, vout)),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Vout {
	#[serde(with = "bitcoin::amount::serde::as_btc")]
	pub value: Amount,
	pub n: Index,
	#[serde(rename = "scriptPubKey")]
	pub script_pubkey: ScriptPubKey,
}
impl Vout {
	/// Prefer what the node reports; fall back to decoding the script ourselves.
	pub fn address(&self, network: Network) -> Option<String> {
		let spk = &self.script_pubkey;

		spk.address.clone().or_else(|| spk.addresses.first().cloned()).or_else(|| {
			Address::from_script(&spk.hex, network).ok().map(|a| a.to_string())
		})
	}

	pub fn is_op_return(&self) -> bool {
		self.script_pubkey.kind == "nulldata" || self.script_pubkey.hex.is_op_return()
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScriptPubKey {
	#[serde(default)]
	pub hex: ScriptBuf,
	#[serde(default, rename = "type")]
	pub kind: String,
	// bitcoind >= 22.
	#[serde(default)]
	pub address: Option<String>,
	// btcd and older bitcoind.
	#[serde(default)]
	pub addresses: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Block {
	pub hash: BlockHash,
	// `-1` once the block is no longer on the main chain.
	pub confirmations: i64,
	pub height: u64,
	pub time: i64,
	pub merkleroot: TxMerkleNode,
	#[serde(default)]
	pub previousblockhash: Option<BlockHash>,
}

#[cfg(test)]
pub mod mock {
	// crates.io
	use bitcoin::hashes::Hash;
	// self
	use super::*;

	pub const TRACKED: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";
	pub const OTHER: &str = "tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q0sl5k7";

	pub fn txid(n: u8) -> Txid {
		Txid::from_byte_array([n; 32])
	}

	/// `vin` lists `(origin tx, output index)`, `vout` lists `(address, value)`.
	pub fn tx(id: u8, confirmations: u64, vin: &[(u8, Index)], vout: &[(&str, Satoshi)]) -> Tx {
		Tx {
			txid: txid(id),
			vin: vin
				.iter()
				.map(|&(t, v)| Vin { coinbase: None, txid: Some(txid(t)), vout: Some(v) })
				.collect(),
			vout: vout
				.iter()
				.enumerate()
				.map(|(n, &(a, v))| Vout {
					value: Amount::from_sat(v),
					n: n as _,
					script_pubkey: ScriptPubKey { address: Some(a.into()), ..Default::default() },
				})
				.collect(),
			confirmations,
			blockhash: None,
			blocktime: None,
		}
	}

	pub fn op_return(data: &[u8]) -> Vout {
		let data: &bitcoin::script::PushBytes = data.try_into().unwrap();

		Vout {
			value: Amount::ZERO,
			n: 0,
			script_pubkey: ScriptPubKey {
				hex: ScriptBuf::new_op_return(data),
				kind: "nulldata".into(),
				..Default::default()
			},
		}
	}

	/// `history` is what the tracked address sees, `others` are only reachable by id.
	#[derive(Debug, Default)]
	pub struct MockLedger {
		pub history: Vec<Tx>,
		pub others: Vec<Tx>,
		pub blocks: Vec<Block>,
	}
	impl LedgerQuery for MockLedger {
		async fn search_transactions(
			&self,
			_: &str,
			count: u32,
			order: HistoryOrder,
		) -> Result<Vec<Tx>> {
			let txs = self.history.iter().cloned();
			let txs = match order {
				HistoryOrder::OldestFirst => txs.take(count as _).collect(),
				HistoryOrder::NewestFirst => txs.rev().take(count as _).collect(),
			};

			Ok(txs)
		}

		async fn get_transaction(&self, txid: &Txid) -> Result<Tx> {
			self.history
				.iter()
				.chain(self.others.iter())
				.find(|tx| &tx.txid == txid)
				.cloned()
				.ok_or_else(|| {
					ApiError::Rpc {
						method: "getrawtransaction",
						code: -5,
						message: "No information available about transaction".into(),
					}
					.into()
				})
		}

		async fn get_block(&self, id: BlockId) -> Result<Block> {
			let block = match id {
				BlockId::Latest => self.blocks.iter().max_by_key(|b| b.height),
				BlockId::Hash(h) => self.blocks.iter().find(|b| b.hash == h),
				BlockId::Height(h) => self.blocks.iter().find(|b| b.height == h),
			};

			block.cloned().ok_or_else(|| {
				ApiError::Rpc { method: "getblock", code: -5, message: "Block not found".into() }
					.into()
			})
		}
	}
}
