// std
use std::collections::HashMap;
// crates.io
use bitcoin::{script::Instruction, Network, OutPoint, Script, Txid};
// self
use super::{api::*, types::*};
use crate::{prelude::*, types::*};

/// The most recent `count` transactions of `address`, oldest first.
pub async fn list_transactions<L>(
	ledger: &L,
	address: &str,
	count: u32,
	network: Network,
) -> Result<Vec<TxRecord>>
where
	L: LedgerQuery,
{
	let mut txs = ledger.search_transactions(address, count, HistoryOrder::NewestFirst).await?;

	txs.reverse();

	// Every output met so far in this walk, spares a lookup for each input spending one of them.
	let mut observed = <HashMap<OutPoint, (String, Satoshi)>>::new();
	let mut records = Vec::with_capacity(txs.len());

	for tx in txs {
		let mut is_spend = false;
		let mut inputs = Vec::with_capacity(tx.vin.len());

		for outpoint in tx.vin.iter().filter_map(Vin::outpoint) {
			let (a, value) = match observed.get(&outpoint) {
				Some((a, v)) => {
					is_spend |= a == address;

					(a.to_owned(), *v)
				},
				None => resolve(ledger, outpoint, network).await?,
			};

			inputs.push(InputRecord {
				txid: outpoint.txid.to_string(),
				index: outpoint.vout,
				address: a,
				value,
			});
		}

		let mut outputs = Vec::with_capacity(tx.vout.len());

		for o in &tx.vout {
			let Some(a) = o.address(network) else {
				if o.is_op_return() {
					continue;
				}

				return Err(ChainError::MalformedLedgerData(format!(
					"output {} of {} has no address",
					o.n, tx.txid
				))
				.into());
			};
			let value = o.value.to_sat();

			observed.insert(OutPoint::new(tx.txid, o.n), (a.clone(), value));
			outputs.push(OutputRecord { index: o.n, address: a, value });
		}

		let received = outputs
			.iter()
			.filter(|o| o.address == address)
			.map(|o| o.value as SignedSatoshi)
			.sum::<SignedSatoshi>();
		let balance_delta = if is_spend {
			destination(&tx.txid, outputs.iter().map(|o| o.address.as_str()), address)?;

			received
				- inputs
					.iter()
					.filter(|i| i.address == address)
					.map(|i| i.value as SignedSatoshi)
					.sum::<SignedSatoshi>()
		} else {
			received
		};

		records.push(TxRecord {
			txid: tx.txid.to_string(),
			confirmations: tx.confirmations,
			inputs,
			outputs,
			balance_delta,
		});
	}

	Ok(records)
}

/// Who created `txid`, whom it paid and how much.
pub async fn transfer_info<L>(
	ledger: &L,
	txid: &Txid,
	network: Network,
	stable_confirmations: u64,
) -> Result<TransferInfo>
where
	L: LedgerQuery,
{
	let tx = ledger.get_transaction(txid).await?;
	let mut creator = None;
	let mut inputs_total = 0;

	for outpoint in tx.vin.iter().filter_map(Vin::outpoint) {
		let (a, value) = resolve(ledger, outpoint, network).await?;

		creator.get_or_insert(a);
		inputs_total += value;
	}

	let creator = creator.ok_or_else(|| {
		ChainError::MalformedLedgerData(format!("{txid} does not spend any previous output"))
	})?;
	let mut outputs_total = 0;
	let mut attach_data = Vec::new();
	let mut payments = Vec::new();

	for o in &tx.vout {
		let value = o.value.to_sat();

		outputs_total += value;

		if o.is_op_return() {
			attach_data = op_return_data(&o.script_pubkey.hex);

			continue;
		}

		let a = o.address(network).ok_or_else(|| {
			ChainError::MalformedLedgerData(format!("output {} of {txid} has no address", o.n))
		})?;

		if a != creator {
			payments.push((a, value));
		}
	}

	let target = destination(txid, payments.iter().map(|(a, _)| a.as_str()), &creator)?
		.map(ToOwned::to_owned);
	let amount = payments.iter().map(|(_, v)| v).sum();
	let fee = inputs_total.checked_sub(outputs_total).ok_or_else(|| {
		ChainError::MalformedLedgerData(format!(
			"{txid} pays {outputs_total} out of {inputs_total}"
		))
	})?;
	let block_height = match tx.blockhash {
		Some(h) => Some(ledger.get_block(BlockId::Hash(h)).await?.height),
		None => None,
	};

	Ok(TransferInfo {
		txid: txid.to_string(),
		creator,
		target,
		amount,
		fee,
		attach_data,
		block_id: tx.blockhash.map(|h| h.to_string()),
		block_height,
		timestamp: tx.blocktime.and_then(|t| chrono::DateTime::from_timestamp(t, 0)),
		confirmations: tx.confirmations,
		is_stable: tx.confirmations >= stable_confirmations,
	})
}

async fn resolve<L>(ledger: &L, outpoint: OutPoint, network: Network) -> Result<(String, Satoshi)>
where
	L: LedgerQuery,
{
	let prev = ledger.get_transaction(&outpoint.txid).await?;
	let o = prev.output(outpoint.vout).ok_or_else(|| {
		ChainError::MalformedLedgerData(format!(
			"{} has no output {}",
			outpoint.txid, outpoint.vout
		))
	})?;
	let a = o.address(network).ok_or_else(|| {
		ChainError::MalformedLedgerData(format!("{outpoint} pays no resolvable address"))
	})?;

	Ok((a, o.value.to_sat()))
}

// The one external address paid, `change` outputs aside. Refuses to guess between several.
fn destination<'a, I>(txid: &Txid, addresses: I, change: &str) -> Result<Option<&'a str>>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut target = None;

	for a in addresses.into_iter().filter(|a| *a != change) {
		match target {
			Some(t) if t != a => Err(ChainError::MalformedLedgerData(format!(
				"{txid} pays more than one destination, {t} and {a}"
			)))?,
			_ => target = Some(a),
		}
	}

	Ok(target)
}

fn op_return_data(script: &Script) -> Vec<u8> {
	script
		.instructions()
		.skip(1)
		.filter_map(|i| match i {
			Ok(Instruction::PushBytes(b)) => Some(b.as_bytes().to_vec()),
			_ => None,
		})
		.flatten()
		.collect()
}

#[cfg(test)]
use super::api::mock::*;

#[tokio::test]
async fn list_transactions_should_work() {
	const PAYEE: &str = "tb1q0sqzfp3zj42u0perxr6jahhu4y03uw4dypk6sc";

	let ledger = MockLedger {
		history: vec![
			tx(1, 9, &[(9, 0)], &[(TRACKED, 10_000_000)]),
			tx(2, 5, &[(1, 0)], &[(PAYEE, 6_990_000), (TRACKED, 3_000_000)]),
		],
		others: vec![tx(9, 20, &[], &[(OTHER, 10_010_000)])],
		..Default::default()
	};
	let records = list_transactions(&ledger, TRACKED, 10, bitcoin::Network::Testnet).await.unwrap();

	assert_eq!(records.len(), 2);
	// Receive, the funding input is looked up.
	assert_eq!(records[0].txid, txid(1).to_string());
	assert_eq!(records[0].confirmations, 9);
	assert_eq!(
		records[0].inputs,
		[InputRecord {
			txid: txid(9).to_string(),
			index: 0,
			address: OTHER.into(),
			value: 10_010_000
		}]
	);
	assert_eq!(records[0].balance_delta, 10_000_000);
	// Spend, the input comes from the walk itself.
	assert_eq!(records[1].inputs[0].address, TRACKED);
	assert_eq!(records[1].outputs.len(), 2);
	assert_eq!(records[1].balance_delta, -7_000_000);

	// Only the most recent one.
	let records = list_transactions(&ledger, TRACKED, 1, bitcoin::Network::Testnet).await.unwrap();

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].txid, txid(2).to_string());
	// Its input was never observed in this walk, so it counts as a receive.
	assert_eq!(records[0].balance_delta, 3_000_000);
}

#[tokio::test]
async fn list_transactions_should_reject_multiple_destinations() {
	let ledger = MockLedger {
		history: vec![
			tx(1, 9, &[], &[(TRACKED, 10_000_000)]),
			tx(
				2,
				5,
				&[(1, 0)],
				&[
					(OTHER, 1_000_000),
					("tb1q0sqzfp3zj42u0perxr6jahhu4y03uw4dypk6sc", 1_000_000),
					(TRACKED, 7_990_000),
				],
			),
		],
		..Default::default()
	};

	assert!(matches!(
		list_transactions(&ledger, TRACKED, 10, bitcoin::Network::Testnet).await,
		Err(Error::Chain(ChainError::MalformedLedgerData(_)))
	));
}

#[tokio::test]
async fn list_transactions_should_propagate_lookup_failure() {
	let ledger =
		MockLedger { history: vec![tx(1, 9, &[(9, 0)], &[(TRACKED, 1)])], ..Default::default() };

	assert!(matches!(
		list_transactions(&ledger, TRACKED, 10, bitcoin::Network::Testnet).await,
		Err(Error::Api(ApiError::Rpc { .. }))
	));
}

#[tokio::test]
async fn transfer_info_should_work() {
	let mut transfer = tx(2, 7, &[(1, 0), (1, 1)], &[(OTHER, 6_000_000), (TRACKED, 3_990_000)]);

	transfer.vout.push(op_return(b"x-target"));

	let ledger = MockLedger {
		history: vec![tx(1, 9, &[], &[(TRACKED, 8_000_000), (TRACKED, 2_000_000)]), transfer],
		..Default::default()
	};
	let info = transfer_info(&ledger, &txid(2), bitcoin::Network::Testnet, 6).await.unwrap();

	assert_eq!(info.creator, TRACKED);
	assert_eq!(info.target.as_deref(), Some(OTHER));
	assert_eq!(info.amount, 6_000_000);
	assert_eq!(info.fee, 10_000);
	assert_eq!(info.attach_data, b"x-target");
	assert!(info.is_stable);
	assert!(info.block_height.is_none());
}

#[test]
fn destination_should_work() {
	let t = txid(1);

	assert_eq!(destination(&t, ["a", "c", "a"], "c").unwrap(), Some("a"));
	assert_eq!(destination(&t, ["c"], "c").unwrap(), None);
	assert!(destination(&t, ["a", "b", "c"], "c").is_err());
}
