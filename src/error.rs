pub mod api;
pub use api::*;

pub mod chain;
pub use chain::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	AppDirs2(#[from] app_dirs2::AppDirsError),
	#[error("{0:?}")]
	ArrayBytes(array_bytes::Error),
	#[error(transparent)]
	Bitcoin(#[from] BitcoinError),
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	Toml(#[from] toml::de::Error),

	#[error(transparent)]
	Api(#[from] ApiError),
	#[error(transparent)]
	Chain(#[from] ChainError),
}

#[derive(Debug, thiserror::Error)]
pub enum BitcoinError {
	#[error(transparent)]
	Encode(#[from] bitcoin::consensus::encode::Error),
	#[error(transparent)]
	HexToArray(#[from] bitcoin::hex::HexToArrayError),
}
