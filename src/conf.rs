pub mod btc;

// std
use std::{
	fs,
	path::{Path, PathBuf},
};
// crates.io
use app_dirs2::{AppDataType, AppInfo};
use serde::{Deserialize, Serialize};
// self
use crate::prelude::*;

const APP_INFO: AppInfo = AppInfo { name: "btc-adaptor", author: "btc-adaptor" };
const DEFAULT_CONF: &str = r#"[btc]
# Network configuration.
# Possible values: "bitcoin", "testnet", "signet", "regtest".
network = "testnet"

# Transactions with fewer confirmations are ignored when collecting spendable outputs.
min-confirmations = 1

# Maximum number of transactions replayed per address.
history-limit = 999999

# Blocks and transactions with at least this many confirmations are reported as stable.
stable-confirmations = 6

[btc.rpc]
# Node JSON-RPC endpoint.
host = "http://127.0.0.1:18334"

user = ""
password = ""

# PEM encoded root certificate of the node's TLS endpoint (optional).
# cert-path = "/path/to/rpc.cert"
"#;

#[derive(Debug, Serialize, Deserialize)]
pub struct Conf {
	pub btc: btc::Conf,
}
impl Conf {
	pub fn default_path() -> Result<PathBuf> {
		Ok(app_dirs2::app_root(AppDataType::UserConfig, &APP_INFO)?.join("conf.toml"))
	}

	/// `None` means no configuration existed, a template has been written to `path` instead.
	pub fn load_from(path: &Path) -> Result<Option<Self>> {
		if path.is_file() {
			Ok(Some(toml::from_str(&fs::read_to_string(path)?)?))
		} else {
			tracing::info!(
				"no configuration file found, \
				use the template to generate a new one, \
				please configure it at {path:?}"
			);

			if let Some(dir) = path.parent() {
				fs::create_dir_all(dir)?;
			}

			fs::write(path, DEFAULT_CONF)?;

			Ok(None)
		}
	}
}
#[cfg(test)]
impl Default for Conf {
	fn default() -> Self {
		toml::from_str(DEFAULT_CONF).unwrap()
	}
}
#[test]
fn default_conf_should_work() {
	let conf = Conf::default();

	assert_eq!(conf.btc.network, bitcoin::Network::Testnet);
	assert_eq!(conf.btc.min_confirmations, 1);
	assert_eq!(conf.btc.history_limit, 999_999);
	assert_eq!(conf.btc.stable_confirmations, 6);
	assert_eq!(conf.btc.rpc.host, "http://127.0.0.1:18334");
	assert!(conf.btc.rpc.cert_path.is_none());
}
