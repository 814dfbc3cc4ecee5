#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("[api] {method} failed: {source}")]
	Lookup { method: &'static str, source: Box<super::Error> },
	#[error("[api] {method} returned error {code}: {message}")]
	Rpc { method: &'static str, code: i64, message: String },
	#[error("[api] {method} returned neither a result nor an error")]
	EmptyResponse { method: &'static str },
	#[error("[api] node rejected the rpc credentials")]
	Unauthorized,
}
