//! Wire format of the ledger.
//!
//! Transactions use the consensus encoding. The consumed-refs blob handed back to callers is a
//! plain concatenation of fixed-size outpoint records:
//!
//! `[0..32](txid) ++ [32..36](vout, little endian)` repeated once per consumed output.

// std
use std::collections::HashSet;
// crates.io
use bitcoin::{consensus, OutPoint, Transaction, Txid};
// self
use crate::prelude::*;

pub const REF_SIZE: usize = 36;

pub fn encode(tx: &Transaction) -> Vec<u8> {
	consensus::serialize(tx)
}

pub fn decode<S>(s: S) -> Result<Transaction>
where
	S: AsRef<[u8]>,
{
	Ok(consensus::deserialize(s.as_ref()).map_err(BitcoinError::Encode)?)
}

pub fn hash<S>(s: S) -> Result<Txid>
where
	S: AsRef<[u8]>,
{
	Ok(decode(s)?.compute_txid())
}

pub fn encode_refs<I>(refs: I) -> Vec<u8>
where
	I: IntoIterator<Item = OutPoint>,
{
	refs.into_iter().flat_map(|r| consensus::serialize(&r)).collect()
}

pub fn decode_refs<S>(s: S) -> Result<HashSet<OutPoint>>
where
	S: AsRef<[u8]>,
{
	let s = s.as_ref();

	if s.len() % REF_SIZE != 0 {
		Err(ChainError::InvalidAmount(format!(
			"excluded refs must be a multiple of {REF_SIZE} bytes, got {}",
			s.len()
		)))?;
	}

	s.chunks_exact(REF_SIZE)
		.map(|r| Ok(consensus::deserialize(r).map_err(BitcoinError::Encode)?))
		.collect()
}

#[cfg(test)]
use super::types::Utxo;

#[test]
fn refs_codec_should_work() {
	let refs = [
		Utxo::new(1, 0, 0).outpoint,
		Utxo::new(2, 7, 0).outpoint,
		Utxo::new(3, 256, 0).outpoint,
	];
	let encoded = encode_refs(refs);

	assert_eq!(encoded.len(), 3 * REF_SIZE);
	assert_eq!(&encoded[..32], &[1; 32]);
	assert_eq!(&encoded[32..36], &[0, 0, 0, 0]);
	assert_eq!(&encoded[REF_SIZE + 32..2 * REF_SIZE], &[7, 0, 0, 0]);
	assert_eq!(&encoded[2 * REF_SIZE + 32..], &[0, 1, 0, 0]);
	// Every record is read, not just the first one.
	assert_eq!(decode_refs(&encoded).unwrap(), HashSet::from(refs));
	assert!(decode_refs(b"").unwrap().is_empty());
}

#[test]
fn decode_refs_should_reject_truncated_records() {
	let mut encoded = encode_refs([Utxo::new(1, 0, 0).outpoint]);

	encoded.pop();

	assert!(matches!(decode_refs(&encoded), Err(Error::Chain(ChainError::InvalidAmount(_)))));
}

#[test]
fn decode_should_reject_garbage() {
	assert!(matches!(decode([0xff_u8; 3]), Err(Error::Bitcoin(BitcoinError::Encode(_)))));
}
