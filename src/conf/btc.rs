// std
use std::path::PathBuf;
// crates.io
use bitcoin::Network;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Conf {
	pub network: Network,
	#[serde(default = "min_confirmations")]
	pub min_confirmations: u64,
	#[serde(default = "history_limit")]
	pub history_limit: u32,
	#[serde(default = "stable_confirmations")]
	pub stable_confirmations: u64,
	pub rpc: RpcConf,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RpcConf {
	pub host: String,
	#[serde(default)]
	pub user: String,
	#[serde(default)]
	pub password: String,
	pub cert_path: Option<PathBuf>,
}

fn min_confirmations() -> u64 {
	1
}

fn history_limit() -> u32 {
	999_999
}

fn stable_confirmations() -> u64 {
	6
}
