pub mod api;
pub mod codec;
pub mod history;
pub mod types;
pub mod util;
pub mod utxo;

use types::*;

// crates.io
use bitcoin::{
	blockdata::{
		locktime::absolute::LockTime,
		transaction::{Transaction, Version},
	},
	Amount, Network, TxIn, TxOut,
};
// self
use crate::prelude::*;

/// Turns a coin selection into an unsigned transfer.
#[derive(Debug)]
pub struct TransferTxBuilder<'a> {
	pub network: Network,
	pub selection: &'a Selection,
	pub sender: &'a str,
	pub recipient: &'a str,
	pub amount: Satoshi,
}
impl TransferTxBuilder<'_> {
	const LOCK_TIME: LockTime = LockTime::ZERO;
	const VERSION: Version = Version::TWO;

	pub fn build(self) -> Result<UnsignedTransfer> {
		let Self { network, selection, sender, recipient, amount } = self;
		let sender_addr = util::addr_from_str(sender, network)?;
		let recipient_addr = util::addr_from_str(recipient, network)?;
		let input = selection
			.outpoints()
			.map(|o| TxIn { previous_output: o, ..Default::default() })
			.collect::<Vec<_>>();

		if input.is_empty() {
			Err(ChainError::NoInputsSelected)?;
		}

		// A zero value payment would leave the transfer without its payment output.
		if amount == 0 {
			Err(ChainError::NoOutputsProduced)?;
		}

		let mut output = vec![TxOut {
			script_pubkey: recipient_addr.script_pubkey(),
			value: Amount::from_sat(amount),
		}];
		let charge = selection.total.checked_sub(amount).ok_or(ChainError::InsufficientFunds {
			required: amount,
			available: selection.total,
		})?;

		if charge != 0 {
			output.push(TxOut {
				script_pubkey: sender_addr.script_pubkey(),
				value: Amount::from_sat(charge),
			});
		}

		tracing::info!(
			"spend {} inputs worth {}, pay {amount}, charge {charge}",
			input.len(),
			selection.total
		);

		let tx = Transaction { version: Self::VERSION, lock_time: Self::LOCK_TIME, input, output };

		tracing::debug!("{tx:?}");

		Ok(UnsignedTransfer { tx, consumed_refs: codec::encode_refs(selection.outpoints()) })
	}
}

#[derive(Debug)]
pub struct UnsignedTransfer {
	pub tx: Transaction,
	/// Outpoints spent by `tx`, in input order.
	pub consumed_refs: Vec<u8>,
}

#[cfg(test)]
use api::mock::{OTHER, TRACKED};

#[test]
fn build_should_work() {
	let selection = Selection {
		utxos: vec![Utxo::new(0xb, 0, 20_000_000), Utxo::new(0xa, 0, 10_000_000)],
		total: 30_000_000,
	};
	let UnsignedTransfer { tx, consumed_refs } = TransferTxBuilder {
		network: Network::Testnet,
		selection: &selection,
		sender: TRACKED,
		recipient: OTHER,
		amount: 25_000_000,
	}
	.build()
	.unwrap();

	assert_eq!(
		tx.input.iter().map(|i| i.previous_output).collect::<Vec<_>>(),
		selection.outpoints().collect::<Vec<_>>()
	);
	assert_eq!(tx.output.len(), 2);
	assert_eq!(
		tx.output[0].script_pubkey,
		util::addr_from_str(OTHER, Network::Testnet).unwrap().script_pubkey()
	);
	assert_eq!(tx.output[0].value.to_sat(), 25_000_000);
	// The change is what is left over, not the amount paid.
	assert_eq!(
		tx.output[1].script_pubkey,
		util::addr_from_str(TRACKED, Network::Testnet).unwrap().script_pubkey()
	);
	assert_eq!(tx.output[1].value.to_sat(), 5_000_000);
	assert_eq!(consumed_refs, codec::encode_refs(selection.outpoints()));
	assert_eq!(codec::decode(codec::encode(&tx)).unwrap(), tx);
	assert_eq!(
		codec::hash(codec::encode(&tx)).unwrap(),
		codec::hash(codec::encode(&tx)).unwrap()
	);
	assert_eq!(codec::hash(codec::encode(&tx)).unwrap(), tx.compute_txid());
}

#[test]
fn build_should_skip_charge_on_exact_match() {
	let selection = Selection { utxos: vec![Utxo::new(0xa, 0, 50_000_000)], total: 50_000_000 };
	let transfer = TransferTxBuilder {
		network: Network::Testnet,
		selection: &selection,
		sender: TRACKED,
		recipient: OTHER,
		amount: 50_000_000,
	}
	.build()
	.unwrap();

	assert_eq!(transfer.tx.output.len(), 1);
	assert_eq!(transfer.consumed_refs.len(), codec::REF_SIZE);
}

#[test]
fn build_should_fail() {
	let selection = Selection { utxos: vec![Utxo::new(0xa, 0, 1)], total: 1 };
	fn builder<'a>(recipient: &'a str, selection: &'a Selection) -> TransferTxBuilder<'a> {
		TransferTxBuilder {
			network: Network::Testnet,
			selection,
			sender: TRACKED,
			recipient,
			amount: 1,
		}
	}

	assert!(matches!(
		builder("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", &selection).build(),
		Err(Error::Chain(ChainError::InvalidAddress { .. }))
	));
	assert!(matches!(
		builder(OTHER, &Selection { utxos: Vec::new(), total: 0 }).build(),
		Err(Error::Chain(ChainError::NoInputsSelected))
	));
	assert!(matches!(
		TransferTxBuilder { amount: 0, ..builder(OTHER, &selection) }.build(),
		Err(Error::Chain(ChainError::NoOutputsProduced))
	));
}
