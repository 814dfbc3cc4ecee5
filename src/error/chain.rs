#[derive(Debug, thiserror::Error)]
pub enum ChainError {
	#[error("[chain] invalid address {address}: {source}")]
	InvalidAddress { address: String, source: bitcoin::address::ParseError },
	#[error("[chain] invalid amount: {0}")]
	InvalidAmount(String),
	#[error("[chain] insufficient funds: required {required}, available {available}")]
	InsufficientFunds { required: u64, available: u64 },
	#[error("[chain] malformed ledger data: {0}")]
	MalformedLedgerData(String),
	#[error("[chain] no inputs selected")]
	NoInputsSelected,
	#[error("[chain] no outputs produced")]
	NoOutputsProduced,
	#[error("[chain] {0} is not implemented")]
	NotImplemented(&'static str),
}
