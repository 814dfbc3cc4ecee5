// crates.io
use bytes::Bytes;
use reqwest::{Body, Client as RClient, IntoUrl, StatusCode};
use serde::de::DeserializeOwned;
// self
use crate::prelude::*;

pub trait Http {
	async fn post<U, B>(&self, uri: U, body: B) -> Result<Bytes>
	where
		U: IntoUrl,
		B: Into<Body>;
}

pub trait Response
where
	Self: AsRef<[u8]>,
{
	fn json<D>(&self) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let s = self.as_ref();

		match serde_json::from_slice(s) {
			Ok(d) => Ok(d),
			Err(e) => {
				tracing::error!("{}", String::from_utf8_lossy(s));

				Err(e)?
			},
		}
	}

	fn text(&self) -> String {
		String::from_utf8_lossy(self.as_ref()).into()
	}
}
impl Response for Bytes {}

#[derive(Debug)]
pub struct Credentials {
	pub user: String,
	pub password: Option<String>,
}

#[derive(Debug)]
pub struct Client {
	pub inner: RClient,
	pub credentials: Option<Credentials>,
}
impl Http for Client {
	async fn post<U, B>(&self, uri: U, body: B) -> Result<Bytes>
	where
		U: IntoUrl,
		B: Into<Body>,
	{
		let mut req = self.inner.post(uri).body(body);

		if let Some(Credentials { user, password }) = &self.credentials {
			req = req.basic_auth(user, password.as_ref());
		}

		let resp = req.send().await?;

		if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
			Err(ApiError::Unauthorized)?;
		}

		Ok(resp.bytes().await?)
	}
}
