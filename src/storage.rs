//! File storage client derived from an [`App`].

// self
use crate::{
	_prelude::*,
	app::App,
	auth::SessionHandle,
	error::ClientError,
	http::{self, ApiFailure},
	obs::{self, OpKind},
};

const SERVICE: &str = "storage";

/// Metadata returned after an upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
	/// Object name (path inside the bucket).
	pub name: String,
	/// Bucket holding the object.
	pub bucket: String,
	/// MIME type recorded for the object.
	#[serde(default)]
	pub content_type: Option<String>,
	/// Size in bytes; the service reports it as a decimal string.
	#[serde(default)]
	pub size: Option<String>,
}

/// File storage client bound to one app.
#[derive(Clone, Debug)]
pub struct Storage {
	app: Arc<App>,
	session: Option<SessionHandle>,
}
impl Storage {
	/// Derives the storage client from `app`.
	pub fn new(app: Arc<App>) -> Self {
		Self { app, session: None }
	}

	/// Sends the signed-in user's ID token with every request.
	pub fn with_session(mut self, session: SessionHandle) -> Self {
		self.session = Some(session);

		self
	}

	/// Configured bucket.
	pub fn bucket(&self) -> Result<&str, ClientError> {
		let bucket = self.app.config().storage_bucket.trim();

		if bucket.is_empty() { Err(ClientError::MissingBucket) } else { Ok(bucket) }
	}

	/// Download URL for the object at `path`.
	///
	/// The object name is encoded as a single segment, so `a/b.png` becomes `a%2Fb.png`.
	pub fn object_url(&self, path: &str) -> Result<Url> {
		let name = object_name(path)?;
		let mut url = self.objects_url()?;

		url.path_segments_mut()
			.map_err(|_| ClientError::InvalidConfig {
				field: "storage",
				reason: "must be a hierarchical URL",
			})?
			.push(name);
		url.query_pairs_mut().append_pair("alt", "media");

		Ok(url)
	}

	/// Uploads `bytes` to `path`.
	pub async fn upload(
		&self,
		path: &str,
		bytes: Vec<u8>,
		content_type: &str,
	) -> Result<ObjectMetadata> {
		obs::observe(OpKind::Upload, "storage.upload", async {
			let name = object_name(path)?;
			let mut url = self.objects_url()?;

			url.query_pairs_mut().append_pair("name", name);

			let request = self
				.app
				.http_client()
				.post(url)
				.header(reqwest::header::CONTENT_TYPE, content_type)
				.body(bytes);
			let response = http::send(self.authorize(request)).await?;

			http::read_json::<ObjectMetadata>(SERVICE, response).await?.map_err(service_error)
		})
		.await
	}

	/// Downloads the object at `path`.
	pub async fn download(&self, path: &str) -> Result<Vec<u8>> {
		obs::observe(OpKind::Download, "storage.download", async {
			let url = self.object_url(path)?;
			let response = http::send(self.authorize(self.app.http_client().get(url))).await?;

			http::read_bytes(SERVICE, response).await?.map_err(service_error)
		})
		.await
	}

	fn objects_url(&self) -> Result<Url> {
		let bucket = self.bucket()?;
		let url = self
			.app
			.endpoints()
			.storage
			.join(&format!("v0/b/{bucket}/o"))
			.map_err(|source| ClientError::InvalidEndpoint { endpoint: SERVICE, source })?;

		Ok(url)
	}

	fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match self.session.as_ref().and_then(SessionHandle::id_token) {
			Some(token) => request.header(
				reqwest::header::AUTHORIZATION,
				format!("Firebase {}", token.expose()),
			),
			None => request,
		}
	}
}

// `.` and `..` would be dropped by the URL encoder and address the bucket listing instead.
fn object_name(path: &str) -> Result<&str, ClientError> {
	let name = path.trim_start_matches('/');

	if matches!(name, "" | "." | "..") {
		return Err(ClientError::InvalidConfig { field: "path", reason: "must name an object" });
	}

	Ok(name)
}

fn service_error(failure: ApiFailure) -> Error {
	Error::Service { service: SERVICE, status: failure.status, message: failure.message }
}
