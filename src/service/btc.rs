// std
use std::{collections::HashMap, fs, str::FromStr};
// crates.io
use bitcoin::{Address, BlockHash, Network, OutPoint, Txid};
use reqwest::{Certificate, ClientBuilder};
// self
use crate::{
	chain::btc::{
		api::{node::Api, *},
		codec, history, types::Utxo, util, utxo, TransferTxBuilder, UnsignedTransfer,
	},
	conf::btc::*,
	http::{Client, Credentials},
	prelude::*,
	types::*,
};

pub(super) type NodeAdaptor = Adaptor<Api<Client>>;

#[derive(Debug)]
pub(super) struct Adaptor<L> {
	ledger: L,
	network: Network,
	min_confirmations: u64,
	history_limit: u32,
	stable_confirmations: u64,
}
impl<L> Adaptor<L> {
	const NAME: &'static str = "btc-adaptor";
}
impl TryFrom<Conf> for NodeAdaptor {
	type Error = Error;

	fn try_from(conf: Conf) -> Result<Self> {
		let Conf { network, min_confirmations, history_limit, stable_confirmations, rpc } = conf;
		let mut builder = ClientBuilder::new().user_agent(Self::NAME);

		if let Some(p) = &rpc.cert_path {
			builder = builder.add_root_certificate(Certificate::from_pem(&fs::read(p)?)?);
		}

		let credentials = (!rpc.user.is_empty()).then(|| Credentials {
			user: rpc.user,
			password: (!rpc.password.is_empty()).then_some(rpc.password),
		});
		let ledger = Api { http: Client { inner: builder.build()?, credentials }, uri: rpc.host };

		Ok(Self { ledger, network, min_confirmations, history_limit, stable_confirmations })
	}
}
impl<L> Adaptor<L>
where
	L: LedgerQuery,
{
	async fn utxos_of(
		&self,
		address: &str,
		min_confirmations: u64,
	) -> Result<HashMap<OutPoint, Utxo>> {
		let address = util::addr_from_str(address, self.network)?.to_string();
		let txs = self
			.ledger
			.search_transactions(&address, self.history_limit, HistoryOrder::OldestFirst)
			.await?;

		Ok(utxo::reconstruct(&txs, &address, min_confirmations, self.network))
	}
}
impl<L> super::Adaptor for Adaptor<L>
where
	L: LedgerQuery,
{
	fn name(&self) -> &'static str {
		Self::NAME
	}

	async fn create_transfer_tx(&self, request: TransferRequest) -> Result<TransferTx> {
		let TransferRequest { from, to, amount, excluded } = request;

		if amount == 0 {
			Err(ChainError::InvalidAmount("transfer amount must be positive".into()))?;
		}

		let from = util::addr_from_str(&from, self.network)?.to_string();
		let excluded = codec::decode_refs(excluded)?;
		let txs = self
			.ledger
			.search_transactions(&from, self.history_limit, HistoryOrder::OldestFirst)
			.await?;
		let utxos = utxo::reconstruct(&txs, &from, self.min_confirmations, self.network);

		tracing::info!(
			"{from} owns {} spendable outputs, {} excluded",
			utxos.len(),
			excluded.len()
		);

		let selection = util::select_utxos(&utxos, &excluded, amount)?;
		let UnsignedTransfer { tx, consumed_refs } = TransferTxBuilder {
			network: self.network,
			selection: &selection,
			sender: &from,
			recipient: &to,
			amount,
		}
		.build()?;
		let tx = codec::encode(&tx);
		let txid = codec::hash(&tx)?;

		tracing::info!("unsigned tx {txid} hex: {}", array_bytes::bytes2hex("", &tx));

		Ok(TransferTx { txid: txid.to_string(), tx, consumed_refs })
	}

	async fn get_balance(&self, address: &str, min_confirmations: u64) -> Result<Amount> {
		let utxos = self.utxos_of(address, min_confirmations).await?;

		Ok(utxo::balance(utxos.values()))
	}

	async fn get_utxos(&self, address: &str, min_confirmations: u64) -> Result<Vec<UnspentOutput>> {
		let mut utxos =
			self.utxos_of(address, min_confirmations).await?.into_values().collect::<Vec<_>>();

		utxos.sort_unstable_by_key(|u| u.outpoint);

		Ok(utxos
			.into_iter()
			.map(|u| UnspentOutput {
				txid: u.outpoint.txid.to_string(),
				index: u.outpoint.vout,
				value: u.value,
			})
			.collect())
	}

	async fn get_transactions(&self, address: &str, count: u32) -> Result<Vec<TxRecord>> {
		let address = util::addr_from_str(address, self.network)?.to_string();

		history::list_transactions(&self.ledger, &address, count, self.network).await
	}

	async fn get_block_info(&self, block: BlockRef) -> Result<BlockInfo> {
		let id = match block {
			BlockRef::Latest => BlockId::Latest,
			BlockRef::Id(id) =>
				BlockId::Hash(BlockHash::from_str(&id).map_err(BitcoinError::HexToArray)?),
			BlockRef::Height(h) => BlockId::Height(h),
		};
		let block = self.ledger.get_block(id).await?;

		Ok(BlockInfo {
			id: block.hash.to_string(),
			parent_id: block.previousblockhash.map(|h| h.to_string()),
			height: block.height,
			timestamp: chrono::DateTime::from_timestamp(block.time, 0),
			txs_root: block.merkleroot.to_string(),
			confirmations: block.confirmations,
			is_stable: block.confirmations >= self.stable_confirmations as i64,
		})
	}

	async fn get_transfer_tx(&self, txid: &str) -> Result<TransferInfo> {
		let txid = Txid::from_str(txid).map_err(BitcoinError::HexToArray)?;

		history::transfer_info(&self.ledger, &txid, self.network, self.stable_confirmations).await
	}

	fn decode_tx(&self, tx: &[u8]) -> Result<DecodedTx> {
		let tx = codec::decode(tx)?;

		Ok(DecodedTx {
			txid: tx.compute_txid().to_string(),
			inputs: tx.input.iter().map(|i| i.previous_output.to_string()).collect(),
			outputs: tx
				.output
				.iter()
				.map(|o| DecodedOutput {
					address: Address::from_script(&o.script_pubkey, self.network)
						.ok()
						.map(|a| a.to_string()),
					value: o.value.to_sat(),
				})
				.collect(),
		})
	}

	fn calc_tx_hash(&self, tx: &[u8]) -> Result<String> {
		Ok(codec::hash(tx)?.to_string())
	}
}

#[cfg(test)]
use crate::{chain::btc::api::mock::*, service::Adaptor as _};

#[cfg(test)]
fn adaptor(history: Vec<Tx>) -> Adaptor<MockLedger> {
	Adaptor {
		ledger: MockLedger { history, ..Default::default() },
		network: Network::Testnet,
		min_confirmations: 1,
		history_limit: 999_999,
		stable_confirmations: 6,
	}
}

#[tokio::test]
async fn create_transfer_tx_should_work() {
	let adaptor = adaptor(vec![
		tx(0xa, 9, &[], &[(TRACKED, 10_000_000)]),
		tx(0xb, 9, &[], &[(OTHER, 1), (TRACKED, 20_000_000)]),
		tx(0xc, 9, &[], &[(TRACKED, 5_000_000)]),
	]);
	let request = || TransferRequest {
		from: TRACKED.into(),
		to: OTHER.into(),
		amount: 25_000_000,
		..Default::default()
	};
	let transfer = adaptor.create_transfer_tx(request()).await.unwrap();
	let tx = codec::decode(&transfer.tx).unwrap();

	assert_eq!(transfer.txid, tx.compute_txid().to_string());
	assert_eq!(transfer.txid, adaptor.calc_tx_hash(&transfer.tx).unwrap());
	assert_eq!(
		tx.input.iter().map(|i| i.previous_output.to_string()).collect::<Vec<_>>(),
		[format!("{}:1", txid(0xb)), format!("{}:0", txid(0xa))]
	);
	assert_eq!(
		tx.output.iter().map(|o| o.value.to_sat()).collect::<Vec<_>>(),
		[25_000_000, 5_000_000]
	);

	let decoded = adaptor.decode_tx(&transfer.tx).unwrap();

	assert_eq!(decoded.outputs[0].address.as_deref(), Some(OTHER));
	assert_eq!(decoded.outputs[1].address.as_deref(), Some(TRACKED));

	// A retry excluding what the first attempt consumed has nothing left to cover the amount.
	assert!(matches!(
		adaptor
			.create_transfer_tx(TransferRequest { excluded: transfer.consumed_refs, ..request() })
			.await,
		Err(Error::Chain(ChainError::InsufficientFunds { available: 5_000_000, .. }))
	));
}

#[tokio::test]
async fn create_transfer_tx_should_fail() {
	let adaptor = adaptor(vec![tx(0xa, 9, &[], &[(TRACKED, 5_000_000)])]);
	let request = |to: &str, amount, excluded| TransferRequest {
		from: TRACKED.into(),
		to: to.into(),
		amount,
		excluded,
	};

	assert!(matches!(
		adaptor.create_transfer_tx(request(OTHER, 25_000_000, Vec::new())).await,
		Err(Error::Chain(ChainError::InsufficientFunds { .. }))
	));
	assert!(matches!(
		adaptor.create_transfer_tx(request(OTHER, 0, Vec::new())).await,
		Err(Error::Chain(ChainError::InvalidAmount(_)))
	));
	assert!(matches!(
		adaptor.create_transfer_tx(request(OTHER, 1, vec![0; 33])).await,
		Err(Error::Chain(ChainError::InvalidAmount(_)))
	));
	assert!(matches!(
		adaptor.create_transfer_tx(request("not an address", 1, Vec::new())).await,
		Err(Error::Chain(ChainError::InvalidAddress { .. }))
	));
}

#[tokio::test]
async fn get_balance_should_work() {
	let adaptor = adaptor(vec![
		tx(1, 9, &[], &[(TRACKED, 10_000_000)]),
		tx(2, 3, &[(1, 0)], &[(OTHER, 6_990_000), (TRACKED, 3_000_000)]),
		tx(3, 0, &[], &[(TRACKED, 1_000)]),
	]);

	assert_eq!(adaptor.get_balance(TRACKED, 1).await.unwrap(), 3_000_000);
	assert_eq!(adaptor.get_balance(TRACKED, 0).await.unwrap(), 3_001_000);
	// Seen from 4 confirmations on, the spend has not happened yet.
	assert_eq!(adaptor.get_balance(TRACKED, 4).await.unwrap(), 10_000_000);
	assert!(adaptor.get_balance("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", 1).await.is_err());
}

#[tokio::test]
async fn get_utxos_should_work() {
	let adaptor = adaptor(vec![
		tx(3, 7, &[], &[(TRACKED, 2_000), (TRACKED, 1_000)]),
		tx(1, 6, &[(9, 0)], &[(TRACKED, 10_000_000), (OTHER, 1_000)]),
		tx(2, 3, &[(1, 0)], &[(OTHER, 6_990_000), (TRACKED, 3_000_000)]),
	]);
	let unspent = |t, index, value| UnspentOutput { txid: txid(t).to_string(), index, value };

	assert_eq!(
		adaptor.get_utxos(TRACKED, 1).await.unwrap(),
		[unspent(2, 1, 3_000_000), unspent(3, 0, 2_000), unspent(3, 1, 1_000)]
	);
	assert_eq!(
		adaptor.get_utxos(TRACKED, 4).await.unwrap(),
		[unspent(1, 0, 10_000_000), unspent(3, 0, 2_000), unspent(3, 1, 1_000)]
	);
	assert!(adaptor.get_utxos(TRACKED, 8).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_block_info_should_work() {
	let mut adaptor = adaptor(Vec::new());
	let block = |height, confirmations| Block {
		hash: BlockHash::from_str(&format!("{height:064x}")).unwrap(),
		confirmations,
		height,
		time: 1_700_000_000,
		merkleroot: bitcoin::TxMerkleNode::from_str(&"00".repeat(32)).unwrap(),
		previousblockhash: None,
	};

	adaptor.ledger.blocks = vec![block(7, 6), block(8, 5)];

	let latest = adaptor.get_block_info(BlockRef::Latest).await.unwrap();

	assert_eq!(latest.height, 8);
	assert!(!latest.is_stable);

	let info = adaptor.get_block_info(BlockRef::Height(7)).await.unwrap();

	assert!(info.is_stable);
	assert_eq!(adaptor.get_block_info(BlockRef::Id(info.id)).await.unwrap().height, 7);
	assert!(adaptor.get_block_info(BlockRef::Id("zz".into())).await.is_err());
}

#[tokio::test]
async fn placeholders_should_not_be_implemented() {
	let adaptor = adaptor(Vec::new());

	assert!(matches!(
		adaptor.sign_tx(&[], &[]).await,
		Err(Error::Chain(ChainError::NotImplemented("sign_tx")))
	));
	assert!(matches!(
		adaptor.send_tx(&[]).await,
		Err(Error::Chain(ChainError::NotImplemented("send_tx")))
	));
	assert!(matches!(
		adaptor.get_block_producer(BlockRef::Latest).await,
		Err(Error::Chain(ChainError::NotImplemented(_)))
	));
}
