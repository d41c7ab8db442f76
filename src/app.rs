//! Root client construction and the process-wide app registry.

// std
use std::borrow::Borrow;
// self
use crate::{
	_prelude::*,
	config::{ConnectionConfig, EnvSource},
	error::ClientError,
	http::ReqwestHttpClient,
};

/// Name given to apps built without an explicit name.
pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/";
const FIRESTORE_URL: &str = "https://firestore.googleapis.com/";
const STORAGE_URL: &str = "https://firebasestorage.googleapis.com/";

/// Validated app name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppName(String);
impl AppName {
	/// Creates a new name after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, ClientError> {
		let view = value.as_ref();

		if view.trim().is_empty() {
			return Err(ClientError::InvalidConfig { field: "name", reason: "must not be empty" });
		}

		Ok(Self(view.to_owned()))
	}
}
impl Default for AppName {
	fn default() -> Self {
		Self(DEFAULT_APP_NAME.to_owned())
	}
}
impl AsRef<str> for AppName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for AppName {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for AppName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "AppName({})", self.0)
	}
}
impl Display for AppName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for AppName {
	type Err = ClientError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

/// Base URLs of the REST services the dependent clients talk to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceEndpoints {
	/// Identity Toolkit (auth) base URL.
	pub identity_toolkit: Url,
	/// Firestore base URL.
	pub firestore: Url,
	/// Firebase Storage base URL.
	pub storage: Url,
}
impl ServiceEndpoints {
	/// Points every service at `base` (mock servers, local proxies).
	pub fn uniform(base: Url) -> Self {
		Self { identity_toolkit: base.clone(), firestore: base.clone(), storage: base }
	}

	/// Production endpoints, redirected to emulators when the emulator host variables are set.
	///
	/// Reads `FIREBASE_AUTH_EMULATOR_HOST`, `FIRESTORE_EMULATOR_HOST`, and
	/// `FIREBASE_STORAGE_EMULATOR_HOST` (each `host:port`).
	pub fn from_env(env: &dyn EnvSource) -> Result<Self, ClientError> {
		let mut endpoints = Self::default();
		let emulator = |key: &str| env.var(key).filter(|host| !host.is_empty());

		if let Some(host) = emulator("FIREBASE_AUTH_EMULATOR_HOST") {
			// The auth emulator serves the production path layout under this prefix.
			endpoints.identity_toolkit =
				emulator_url("identity_toolkit", &host, "identitytoolkit.googleapis.com/")?;
		}
		if let Some(host) = emulator("FIRESTORE_EMULATOR_HOST") {
			endpoints.firestore = emulator_url("firestore", &host, "")?;
		}
		if let Some(host) = emulator("FIREBASE_STORAGE_EMULATOR_HOST") {
			endpoints.storage = emulator_url("storage", &host, "")?;
		}

		Ok(endpoints)
	}

	fn validate(&self) -> Result<(), ClientError> {
		for (field, url) in [
			("identity_toolkit", &self.identity_toolkit),
			("firestore", &self.firestore),
			("storage", &self.storage),
		] {
			if !matches!(url.scheme(), "http" | "https") {
				return Err(ClientError::InvalidConfig { field, reason: "must use http or https" });
			}
		}

		Ok(())
	}
}
impl Default for ServiceEndpoints {
	fn default() -> Self {
		let parse = |raw| Url::parse(raw).unwrap_or_else(|_| unreachable!("constant URL"));

		Self {
			identity_toolkit: parse(IDENTITY_TOOLKIT_URL),
			firestore: parse(FIRESTORE_URL),
			storage: parse(STORAGE_URL),
		}
	}
}

fn emulator_url(endpoint: &'static str, host: &str, prefix: &str) -> Result<Url, ClientError> {
	let host = host.trim_start_matches("http://").trim_end_matches('/');

	Url::parse(&format!("http://{host}/{prefix}"))
		.map_err(|source| ClientError::InvalidEndpoint { endpoint, source })
}

/// Root client: one configured connection to the backend project.
pub struct App {
	name: AppName,
	config: ConnectionConfig,
	endpoints: ServiceEndpoints,
	http_client: ReqwestHttpClient,
}
impl App {
	/// Creates a new builder for the provided config.
	pub fn builder(config: ConnectionConfig) -> AppBuilder {
		AppBuilder::new(config)
	}

	/// App name.
	pub fn name(&self) -> &AppName {
		&self.name
	}

	/// Connection parameters the app was built with.
	pub fn config(&self) -> &ConnectionConfig {
		&self.config
	}

	/// Service base URLs.
	pub fn endpoints(&self) -> &ServiceEndpoints {
		&self.endpoints
	}

	/// Shared HTTP client.
	pub fn http_client(&self) -> &ReqwestHttpClient {
		&self.http_client
	}
}
impl Debug for App {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("App")
			.field("name", &self.name)
			.field("project_id", &self.config.project_id)
			.field("placeholder", &self.config.is_placeholder())
			.finish()
	}
}

/// Builder for [`App`] values.
#[derive(Debug)]
pub struct AppBuilder {
	/// Connection parameters.
	pub config: ConnectionConfig,
	/// App name (defaults to [`DEFAULT_APP_NAME`]).
	pub name: AppName,
	/// Service base URLs.
	pub endpoints: ServiceEndpoints,
	/// Optional caller-provided HTTP client.
	pub http_client: Option<ReqwestHttpClient>,
}
impl AppBuilder {
	/// Creates a new builder seeded with the provided config.
	pub fn new(config: ConnectionConfig) -> Self {
		Self {
			config,
			name: AppName::default(),
			endpoints: ServiceEndpoints::default(),
			http_client: None,
		}
	}

	/// Sets the app name.
	pub fn name(mut self, name: AppName) -> Self {
		self.name = name;

		self
	}

	/// Overrides the service base URLs.
	pub fn endpoints(mut self, endpoints: ServiceEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Reuses a caller-provided HTTP client.
	pub fn http_client(mut self, http_client: ReqwestHttpClient) -> Self {
		self.http_client = Some(http_client);

		self
	}

	/// Consumes the builder and validates the resulting app.
	///
	/// Placeholder configs are well-shaped and therefore accepted; the auth client rejects them
	/// before any request is sent.
	pub fn build(self) -> Result<App, ClientError> {
		validate_token("api_key", &self.config.api_key)?;
		validate_token("project_id", &self.config.project_id)?;
		self.endpoints.validate()?;

		if self.config.is_placeholder() {
			tracing::warn!(app = %self.name, "Building app with placeholder configuration.");
		}

		Ok(App {
			name: self.name,
			config: self.config,
			endpoints: self.endpoints,
			http_client: self.http_client.unwrap_or_default(),
		})
	}
}

fn validate_token(field: &'static str, value: &str) -> Result<(), ClientError> {
	if value.is_empty() {
		return Err(ClientError::InvalidConfig { field, reason: "must not be empty" });
	}
	if value.chars().any(char::is_whitespace) {
		return Err(ClientError::InvalidConfig { field, reason: "must not contain whitespace" });
	}

	Ok(())
}

/// Named registry of root clients.
///
/// Registering two apps under one name is an error, so callers that may run their setup more
/// than once should go through [`AppRegistry::get_or_initialize`].
#[derive(Debug)]
pub struct AppRegistry {
	apps: RwLock<BTreeMap<AppName, Arc<App>>>,
}
impl AppRegistry {
	/// Creates an empty registry.
	pub const fn new() -> Self {
		Self { apps: parking_lot::const_rwlock(BTreeMap::new()) }
	}

	/// Process-wide registry.
	pub fn global() -> &'static Self {
		static GLOBAL: AppRegistry = AppRegistry::new();

		&GLOBAL
	}

	/// Builds and registers a new app; fails if the name is taken.
	pub fn initialize_app(&self, builder: AppBuilder) -> Result<Arc<App>, ClientError> {
		let mut apps = self.apps.write();

		if apps.contains_key(&builder.name) {
			return Err(ClientError::DuplicateApp { name: builder.name.to_string() });
		}

		let app = Arc::new(builder.build()?);

		apps.insert(app.name.clone(), app.clone());
		tracing::debug!(app = %app.name, "Registered app.");

		Ok(app)
	}

	/// Returns the app registered under `name`.
	pub fn get_app(&self, name: &str) -> Result<Arc<App>, ClientError> {
		self.apps
			.read()
			.get(name)
			.cloned()
			.ok_or_else(|| ClientError::NoApp { name: name.to_owned() })
	}

	/// Returns the registered app with the builder's name, or builds and registers it.
	///
	/// An existing app is returned unchanged even if the builder's config differs.
	pub fn get_or_initialize(&self, builder: AppBuilder) -> Result<Arc<App>, ClientError> {
		if let Some(app) = self.apps.read().get(&builder.name) {
			return Ok(app.clone());
		}

		match self.initialize_app(builder) {
			Err(ClientError::DuplicateApp { name }) => self.get_app(&name),
			result => result,
		}
	}

	/// Snapshot of every registered app.
	pub fn apps(&self) -> Vec<Arc<App>> {
		self.apps.read().values().cloned().collect()
	}

	/// Removes the app registered under `name`, returning it.
	pub fn delete_app(&self, name: &str) -> Option<Arc<App>> {
		self.apps.write().remove(name)
	}
}
impl Default for AppRegistry {
	fn default() -> Self {
		Self::new()
	}
}
