mod btc;

// std
use std::path::PathBuf;
// crates.io
use serde::Serialize;
use serde_json::json;
use tokio::runtime::Runtime;
// self
use crate::{conf::Conf, prelude::*, types::*, Command};

/// Multi-chain transfer interface, every capability exposed exactly once.
pub trait Adaptor {
	fn name(&self) -> &'static str;

	/// Unsigned transfer of `amount` plus the outpoints it consumes.
	async fn create_transfer_tx(&self, request: TransferRequest) -> Result<TransferTx>;

	async fn get_balance(&self, address: &str, min_confirmations: u64) -> Result<Amount>;

	/// Spendable outputs ordered by outpoint.
	async fn get_utxos(&self, address: &str, min_confirmations: u64) -> Result<Vec<UnspentOutput>>;

	async fn get_transactions(&self, address: &str, count: u32) -> Result<Vec<TxRecord>>;

	async fn get_block_info(&self, block: BlockRef) -> Result<BlockInfo>;

	async fn get_transfer_tx(&self, txid: &str) -> Result<TransferInfo>;

	fn decode_tx(&self, tx: &[u8]) -> Result<DecodedTx>;

	fn calc_tx_hash(&self, tx: &[u8]) -> Result<String>;

	// Key management and network submission live outside of this adaptor.

	#[allow(unused)]
	async fn sign_tx(&self, _tx: &[u8], _secret_key: &[u8]) -> Result<Vec<u8>> {
		Err(ChainError::NotImplemented("sign_tx").into())
	}

	#[allow(unused)]
	async fn bind_sig(&self, _tx: &[u8], _signatures: &[Vec<u8>]) -> Result<Vec<u8>> {
		Err(ChainError::NotImplemented("bind_sig").into())
	}

	#[allow(unused)]
	async fn send_tx(&self, _tx: &[u8]) -> Result<String> {
		Err(ChainError::NotImplemented("send_tx").into())
	}

	#[allow(unused)]
	async fn create_multisig(&self, _public_keys: &[Vec<u8>], _required: usize) -> Result<String> {
		Err(ChainError::NotImplemented("create_multisig").into())
	}

	#[allow(unused)]
	async fn get_block_producer(&self, _block: BlockRef) -> Result<String> {
		Err(ChainError::NotImplemented("get_block_producer").into())
	}
}

pub fn run(conf_path: Option<PathBuf>, command: Command) -> Result<()> {
	let p = match conf_path {
		Some(p) => p,
		None => Conf::default_path()?,
	};
	let Some(conf) = Conf::load_from(&p)? else {
		return Ok(());
	};
	let adaptor = match btc::NodeAdaptor::try_from(conf.btc) {
		Ok(a) => a,
		Err(e) => {
			tracing::error!(
				"an error occurred while parsing the configuration, \
				please check the {p:?}",
			);

			Err(e)?
		},
	};

	tracing::info!("running {}", adaptor.name());

	Runtime::new()?.block_on(execute(&adaptor, command))
}

async fn execute<A>(adaptor: &A, command: Command) -> Result<()>
where
	A: Adaptor,
{
	match command {
		Command::Balance { address, min_confirmations } => {
			let balance = adaptor.get_balance(&address, min_confirmations).await?;

			print(&json!({ "address": address, "balance": balance }))
		},
		Command::Utxos { address, min_confirmations } =>
			print(&adaptor.get_utxos(&address, min_confirmations).await?),
		Command::History { address, count } =>
			print(&adaptor.get_transactions(&address, count).await?),
		Command::Transfer { from, to, amount, exclude } => {
			let excluded = match exclude {
				Some(e) => array_bytes::hex2bytes(e).map_err(Error::ArrayBytes)?,
				None => Vec::new(),
			};

			print(
				&adaptor.create_transfer_tx(TransferRequest { from, to, amount, excluded }).await?,
			)
		},
		Command::Inspect { tx } =>
			print(&adaptor.decode_tx(&array_bytes::hex2bytes(tx).map_err(Error::ArrayBytes)?)?),
		Command::TxHash { tx } => print(
			&adaptor.calc_tx_hash(&array_bytes::hex2bytes(tx).map_err(Error::ArrayBytes)?)?,
		),
		Command::TransferInfo { txid } => print(&adaptor.get_transfer_tx(&txid).await?),
		Command::Block { height, id } => {
			let block = match (height, id) {
				(Some(h), _) => BlockRef::Height(h),
				(_, Some(id)) => BlockRef::Id(id),
				_ => BlockRef::Latest,
			};

			print(&adaptor.get_block_info(block).await?)
		},
	}
}

fn print<T>(value: &T) -> Result<()>
where
	T: Serialize,
{
	println!("{}", serde_json::to_string_pretty(value)?);

	Ok(())
}
