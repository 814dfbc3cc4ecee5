//! Rust bindings for the JSON-RPC API of a
//! [btcd](https://github.com/btcsuite/btcd/blob/master/docs/json_rpc_api.md) compatible node.

// crates.io
use bitcoin::{BlockHash, Txid};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
// self
use super::*;
use crate::http::*;

// `ErrRPCNoTxInfo`, returned by `searchrawtransactions` for an address without history.
const NO_TX_INFO: i64 = -5;

#[derive(Debug)]
pub struct Api<H>
where
	H: Http,
{
	pub http: H,
	pub uri: String,
}
impl<H> Api<H>
where
	H: Http,
{
	async fn call<D>(&self, method: &'static str, params: Value) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let lookup = |e| ApiError::Lookup { method, source: Box::new(e) };
		let body = serde_json::to_vec(
			&json!({ "jsonrpc": "1.0", "id": method, "method": method, "params": params }),
		)?;
		let resp = self.http.post(self.uri.as_str(), body).await.map_err(lookup)?;

		tracing::debug!("{method}\n{}", resp.text());

		match resp.json::<RpcResponse<D>>().map_err(lookup)? {
			RpcResponse { error: Some(RpcError { code, message }), .. } =>
				Err(ApiError::Rpc { method, code, message })?,
			RpcResponse { result: Some(r), .. } => Ok(r),
			_ => Err(ApiError::EmptyResponse { method })?,
		}
	}
}
impl<H> LedgerQuery for Api<H>
where
	H: Http,
{
	async fn search_transactions(
		&self,
		address: &str,
		count: u32,
		order: HistoryOrder,
	) -> Result<Vec<Tx>> {
		let reverse = matches!(order, HistoryOrder::NewestFirst);
		// address, verbose, skip, count, vinextra, reverse, filteraddrs
		let params = json!([address, 1, 0, count, 0, reverse, []]);

		match self.call("searchrawtransactions", params).await {
			Err(Error::Api(ApiError::Rpc { code: NO_TX_INFO, .. })) => Ok(Vec::new()),
			r => r,
		}
	}

	async fn get_transaction(&self, txid: &Txid) -> Result<Tx> {
		self.call("getrawtransaction", json!([txid, 1])).await
	}

	async fn get_block(&self, id: BlockId) -> Result<Block> {
		let hash = match id {
			BlockId::Latest => self.call::<BlockHash>("getbestblockhash", json!([])).await?,
			BlockId::Hash(h) => h,
			BlockId::Height(h) => self.call("getblockhash", json!([h])).await?,
		};

		self.call("getblock", json!([hash, true])).await
	}
}

#[derive(Debug, Deserialize)]
struct RpcResponse<D> {
	result: Option<D>,
	error: Option<RpcError>,
}
#[derive(Debug, Deserialize)]
struct RpcError {
	code: i64,
	message: String,
}

#[test]
fn verbose_tx_should_deserialize() {
	let tx = serde_json::from_str::<Tx>(
		r#"{
			"hex": "",
			"txid": "0101010101010101010101010101010101010101010101010101010101010101",
			"vin": [
				{ "coinbase": "03a0bb0d", "sequence": 4294967295 },
				{
					"txid": "0202020202020202020202020202020202020202020202020202020202020202",
					"vout": 3,
					"scriptSig": { "asm": "", "hex": "" },
					"sequence": 4294967295
				}
			],
			"vout": [
				{
					"value": 0.1,
					"n": 0,
					"scriptPubKey": {
						"asm": "0 751e76e8199196d454941c45d1b3a323f1433bd6",
						"hex": "0014751e76e8199196d454941c45d1b3a323f1433bd6",
						"type": "witness_v0_keyhash",
						"addresses": ["tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"]
					}
				},
				{
					"value": 0.00000546,
					"n": 1,
					"scriptPubKey": {
						"asm": "0 751e76e8199196d454941c45d1b3a323f1433bd6",
						"hex": "0014751e76e8199196d454941c45d1b3a323f1433bd6",
						"type": "witness_v0_keyhash"
					}
				}
			],
			"confirmations": 7
		}"#,
	)
	.unwrap();

	assert_eq!(tx.confirmations, 7);
	assert!(tx.vin[0].outpoint().is_none());
	assert_eq!(tx.vin[1].outpoint().unwrap().vout, 3);
	assert_eq!(tx.vout[0].value.to_sat(), 10_000_000);
	assert_eq!(tx.vout[1].value.to_sat(), 546);
	// Decoded from the script when the node leaves the address out.
	assert_eq!(
		tx.vout[1].address(bitcoin::Network::Testnet).unwrap(),
		"tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"
	);
	assert!(tx.output(1).is_some());
	assert!(tx.output(2).is_none());
}

#[test]
fn rpc_error_should_deserialize() {
	let resp = serde_json::from_str::<RpcResponse<Vec<Tx>>>(
		r#"{
			"result": null,
			"error": { "code": -5, "message": "No information available about address" },
			"id": "searchrawtransactions"
		}"#,
	)
	.unwrap();

	assert!(resp.result.is_none());
	assert_eq!(resp.error.unwrap().code, NO_TX_INFO);
}

#[cfg(test)]
#[derive(Debug)]
struct Canned(std::sync::Mutex<Vec<&'static str>>);
#[cfg(test)]
impl Canned {
	fn api(bodies: &[&'static str]) -> Api<Self> {
		Api {
			http: Self(std::sync::Mutex::new(bodies.to_vec())),
			uri: "http://127.0.0.1:18334".into(),
		}
	}
}
#[cfg(test)]
impl Http for Canned {
	async fn post<U, B>(&self, _: U, _: B) -> Result<bytes::Bytes>
	where
		U: reqwest::IntoUrl,
		B: Into<reqwest::Body>,
	{
		Ok(bytes::Bytes::from_static(self.0.lock().unwrap().remove(0).as_bytes()))
	}
}

#[tokio::test]
async fn api_should_work() {
	use bitcoin::hashes::Hash;

	const NO_INFO: &str = r#"{
		"result": null,
		"error": { "code": -5, "message": "No information available about address" },
		"id": "x"
	}"#;

	// An address without history is an empty history, a missing transaction is an error.
	assert!(Canned::api(&[NO_INFO])
		.search_transactions("tb1q", 10, HistoryOrder::NewestFirst)
		.await
		.unwrap()
		.is_empty());
	assert!(matches!(
		Canned::api(&[NO_INFO]).get_transaction(&Txid::all_zeros()).await,
		Err(Error::Api(ApiError::Rpc { method: "getrawtransaction", code: NO_TX_INFO, .. }))
	));
	assert!(matches!(
		Canned::api(&[r#"{ "result": null, "error": null, "id": "x" }"#])
			.get_transaction(&Txid::all_zeros())
			.await,
		Err(Error::Api(ApiError::EmptyResponse { method: "getrawtransaction" }))
	));
	match Canned::api(&["<html>bad gateway</html>"]).get_transaction(&Txid::all_zeros()).await {
		Err(Error::Api(ApiError::Lookup { method, source })) => {
			assert_eq!(method, "getrawtransaction");
			assert!(matches!(*source, Error::SerdeJson(_)));
		},
		r => panic!("unexpected {r:?}"),
	}

	// The latest block is looked up through the best block hash.
	let block = Canned::api(&[
		r#"{
			"result": "0000000000000000000000000000000000000000000000000000000000000008",
			"error": null,
			"id": "getbestblockhash"
		}"#,
		r#"{
			"result": {
				"hash": "0000000000000000000000000000000000000000000000000000000000000008",
				"confirmations": 1,
				"height": 8,
				"time": 1700000000,
				"merkleroot": "0000000000000000000000000000000000000000000000000000000000000000"
			},
			"error": null,
			"id": "getblock"
		}"#,
	])
	.get_block(BlockId::Latest)
	.await
	.unwrap();

	assert_eq!(block.height, 8);
	assert!(block.previousblockhash.is_none());
}
