//! Transport primitives shared by the auth, document, and storage clients.
//!
//! Every client funnels its responses through [`read_json`] or [`read_bytes`], which capture
//! [`ResponseMetadata`] and classify failures: throttling and server errors become
//! [`TransientError::Upstream`], everything else is handed back to the caller as an
//! [`ApiFailure`] so each client can map it into its own error taxonomy.

// std
use std::ops::Deref;
// crates.io
use reqwest::{
	Response, StatusCode,
	header::{HeaderMap, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{TransientError, TransportError},
};

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Metadata captured from the most recent HTTP response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	fn capture(response: &Response) -> Self {
		Self {
			status: Some(response.status().as_u16()),
			retry_after: parse_retry_after(response.headers()),
		}
	}
}

/// Non-success response that is not retryable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiFailure {
	/// HTTP status code.
	pub status: u16,
	/// `error.message` from the Google API error envelope, or a body preview.
	pub message: String,
}

/// Google API error envelope: `{"error":{"code":400,"message":"..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
	error: ErrorBody,
}
#[derive(Debug, Deserialize)]
struct ErrorBody {
	#[serde(default)]
	message: String,
}

const BODY_PREVIEW_LIMIT: usize = 256;

/// Sends `request`, mapping network failures into [`TransportError`].
pub(crate) async fn send(request: reqwest::RequestBuilder) -> Result<Response> {
	request.send().await.map_err(|e| TransportError::from(e).into())
}

/// Reads a JSON body from a successful response.
///
/// Returns `Ok(Err(failure))` for non-retryable provider errors.
pub(crate) async fn read_json<T>(
	service: &'static str,
	response: Response,
) -> Result<Result<T, ApiFailure>>
where
	T: DeserializeOwned,
{
	let (meta, status, body) = read(response).await?;

	if !status.is_success() {
		return classify(service, meta, status, &body).map(Err);
	}

	let mut de = serde_json::Deserializer::from_slice(&body);
	let value = serde_path_to_error::deserialize(&mut de).map_err(|source| {
		TransientError::ResponseParse { service, source, status: meta.status }
	})?;

	Ok(Ok(value))
}

/// Reads a raw body from a successful response.
pub(crate) async fn read_bytes(
	service: &'static str,
	response: Response,
) -> Result<Result<Vec<u8>, ApiFailure>> {
	let (meta, status, body) = read(response).await?;

	if !status.is_success() {
		return classify(service, meta, status, &body).map(Err);
	}

	Ok(Ok(body))
}

async fn read(response: Response) -> Result<(ResponseMetadata, StatusCode, Vec<u8>)> {
	let meta = ResponseMetadata::capture(&response);
	let status = response.status();
	let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

	Ok((meta, status, body))
}

fn classify(
	service: &'static str,
	meta: ResponseMetadata,
	status: StatusCode,
	body: &[u8],
) -> Result<ApiFailure> {
	let message = error_message(body);

	if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
		tracing::warn!(service, status = status.as_u16(), %message, "Upstream failure.");

		return Err(TransientError::Upstream {
			service,
			message,
			status: status.as_u16(),
			retry_after: meta.retry_after,
		}
		.into());
	}

	Ok(ApiFailure { status: status.as_u16(), message })
}

fn error_message(body: &[u8]) -> String {
	if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body)
		&& !envelope.error.message.is_empty()
	{
		return envelope.error.message;
	}

	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if text.len() > BODY_PREVIEW_LIMIT {
		let mut end = BODY_PREVIEW_LIMIT;

		while !text.is_char_boundary(end) {
			end -= 1;
		}

		text[..end].to_owned()
	} else {
		text.to_owned()
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return i64::try_from(secs).ok().map(Duration::seconds);
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
