//! Document-store client derived from an [`App`].
//!
//! Documents are exchanged in the REST API's typed-value form (`{"fields":{"name":{"stringValue":
//! "..."}}}`); this client does not convert them to or from native types.

// self
use crate::{
	_prelude::*,
	app::App,
	auth::SessionHandle,
	error::ClientError,
	http::{self, ApiFailure},
	obs::{self, OpKind},
};

const SERVICE: &str = "firestore";

/// Typed-value field map as sent and received by the REST API.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// One stored document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
	/// Full resource name (`projects/{p}/databases/(default)/documents/{path}`).
	pub name: String,
	/// Field values.
	#[serde(default)]
	pub fields: Fields,
	/// Creation timestamp (RFC 3339), as reported by the service.
	#[serde(default)]
	pub create_time: Option<String>,
	/// Last update timestamp (RFC 3339), as reported by the service.
	#[serde(default)]
	pub update_time: Option<String>,
}

#[derive(Serialize)]
struct DocumentWrite<'a> {
	fields: &'a Fields,
}

/// Document-store client bound to one app.
#[derive(Clone, Debug)]
pub struct Firestore {
	app: Arc<App>,
	session: Option<SessionHandle>,
}
impl Firestore {
	/// Derives the document client from `app`.
	pub fn new(app: Arc<App>) -> Self {
		Self { app, session: None }
	}

	/// Sends the signed-in user's ID token with every request.
	pub fn with_session(mut self, session: SessionHandle) -> Self {
		self.session = Some(session);

		self
	}

	/// Full resource name of the document at `path`.
	///
	/// `path` is slash-separated; empty, `.` and `..` segments are rejected so the name cannot
	/// leave the project's document root.
	pub fn document_name(&self, path: &str) -> Result<String, ClientError> {
		let segments = document_segments(path)?;

		Ok(format!(
			"projects/{}/databases/(default)/documents/{}",
			self.app.config().project_id,
			segments.join("/")
		))
	}

	/// Reads the document at `path`; `None` when it does not exist.
	pub async fn get_document(&self, path: &str) -> Result<Option<Document>> {
		obs::observe(OpKind::GetDocument, "firestore.get_document", async {
			let url = self.document_url(path)?;
			let response = http::send(self.authorize(self.app.http_client().get(url))).await?;

			match http::read_json::<Document>(SERVICE, response).await? {
				Ok(document) => Ok(Some(document)),
				Err(ApiFailure { status: 404, .. }) => Ok(None),
				Err(failure) => Err(service_error(failure)),
			}
		})
		.await
	}

	/// Creates or replaces the document at `path`.
	pub async fn set_document(&self, path: &str, fields: &Fields) -> Result<Document> {
		obs::observe(OpKind::SetDocument, "firestore.set_document", async {
			let url = self.document_url(path)?;
			let request = self.app.http_client().patch(url).json(&DocumentWrite { fields });
			let response = http::send(self.authorize(request)).await?;

			http::read_json::<Document>(SERVICE, response).await?.map_err(service_error)
		})
		.await
	}

	fn document_url(&self, path: &str) -> Result<Url> {
		let segments = document_segments(path)?;
		let config = self.app.config();
		let mut url = self.app.endpoints().firestore.clone();

		// Each segment is pushed on its own so `?`, `#` and `%` stay inside the document ID.
		url.path_segments_mut()
			.map_err(|_| ClientError::InvalidConfig {
				field: "firestore",
				reason: "must be a hierarchical URL",
			})?
			.pop_if_empty()
			.extend(["v1", "projects", config.project_id.as_str()])
			.extend(["databases", "(default)", "documents"])
			.extend(segments);
		url.query_pairs_mut().append_pair("key", &config.api_key);

		Ok(url)
	}

	fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match self.session.as_ref().and_then(SessionHandle::id_token) {
			Some(token) => request.bearer_auth(token.expose()),
			None => request,
		}
	}
}

fn document_segments(path: &str) -> Result<Vec<&str>, ClientError> {
	let segments = path.trim_matches('/').split('/').collect::<Vec<_>>();

	if segments.iter().any(|segment| matches!(*segment, "" | "." | "..")) {
		return Err(ClientError::InvalidConfig {
			field: "path",
			reason: "must not contain empty, `.` or `..` segments",
		});
	}

	Ok(segments)
}

fn service_error(failure: ApiFailure) -> Error {
	Error::Service { service: SERVICE, status: failure.status, message: failure.message }
}
