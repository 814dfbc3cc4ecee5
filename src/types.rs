//! Chain-neutral shapes of the multi-chain adaptor interface.

// crates.io
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Smallest currency unit of the chain.
pub type Amount = u64;
pub type SignedAmount = i64;

#[derive(Debug, Default)]
pub struct TransferRequest {
	pub from: String,
	pub to: String,
	pub amount: Amount,
	/// `consumed_refs` of earlier transfers whose spends the ledger may not show yet.
	pub excluded: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct TransferTx {
	pub txid: String,
	#[serde(serialize_with = "hex")]
	pub tx: Vec<u8>,
	#[serde(serialize_with = "hex")]
	pub consumed_refs: Vec<u8>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TxRecord {
	pub txid: String,
	pub confirmations: u64,
	pub inputs: Vec<InputRecord>,
	pub outputs: Vec<OutputRecord>,
	pub balance_delta: SignedAmount,
}
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct InputRecord {
	pub txid: String,
	pub index: u32,
	pub address: String,
	pub value: Amount,
}
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
	pub index: u32,
	pub address: String,
	pub value: Amount,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct UnspentOutput {
	pub txid: String,
	pub index: u32,
	pub value: Amount,
}

#[derive(Debug, Serialize)]
pub struct DecodedTx {
	pub txid: String,
	pub inputs: Vec<String>,
	pub outputs: Vec<DecodedOutput>,
}
#[derive(Debug, Serialize)]
pub struct DecodedOutput {
	pub address: Option<String>,
	pub value: Amount,
}

#[derive(Debug, Serialize)]
pub struct BlockInfo {
	pub id: String,
	pub parent_id: Option<String>,
	pub height: u64,
	pub timestamp: Option<DateTime<Utc>>,
	pub txs_root: String,
	pub confirmations: i64,
	pub is_stable: bool,
}

#[derive(Debug, Serialize)]
pub struct TransferInfo {
	pub txid: String,
	pub creator: String,
	pub target: Option<String>,
	pub amount: Amount,
	pub fee: Amount,
	#[serde(serialize_with = "hex")]
	pub attach_data: Vec<u8>,
	pub block_id: Option<String>,
	pub block_height: Option<u64>,
	pub timestamp: Option<DateTime<Utc>>,
	pub confirmations: u64,
	pub is_stable: bool,
}

fn hex<B, S>(bytes: B, serializer: S) -> Result<S::Ok, S::Error>
where
	B: AsRef<[u8]>,
	S: Serializer,
{
	serializer.serialize_str(&array_bytes::bytes2hex("0x", bytes))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockRef {
	Latest,
	/// Hex encoded block id.
	Id(String),
	Height(u64),
}
