//! Connection configuration resolution.
//!
//! Values are taken from the first source that provides them:
//!
//! 1. The injected override slot ([`inject_config`]). Text is parsed as JSON; structured values are
//!    validated directly. The override replaces the whole record, so fields it omits take their
//!    placeholders and the environment is not consulted.
//! 2. Environment variables, per field, under `FIREBASE_*`, `REACT_APP_FIREBASE_*`, and
//!    `VITE_FIREBASE_*` (checked in that order; empty values are skipped).
//! 3. Placeholder values. A record built from placeholders is well-shaped but non-functional: the
//!    auth client refuses to send requests with the placeholder API key.
//!
//! The application identifier has its own chain ([`ConfigSources::resolve_app_id`]) and ignores
//! the override object.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Placeholder API key used when no source provides one.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";
/// Application identifier used when no source provides one.
pub const DEFAULT_APP_ID: &str = "default-app-id";

const ENV_PREFIXES: [&str; 3] = ["", "REACT_APP_", "VITE_"];

static INJECTIONS: RwLock<Injections> =
	parking_lot::const_rwlock(Injections { config: None, app_id: None });

/// Fully resolved connection parameters for one backend project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
	/// Browser API key sent with every identity request.
	pub api_key: String,
	/// Auth domain used for hosted sign-in pages.
	pub auth_domain: String,
	/// Project identifier.
	pub project_id: String,
	/// Default storage bucket.
	pub storage_bucket: String,
	/// Messaging sender identifier.
	pub messaging_sender_id: String,
	/// Application identifier.
	pub app_id: String,
}
impl ConnectionConfig {
	/// Returns the placeholder record used in degraded mode.
	pub fn placeholder() -> Self {
		PartialConnectionConfig::default().complete()
	}

	/// Whether the record still carries the placeholder API key.
	pub fn is_placeholder(&self) -> bool {
		self.api_key == PLACEHOLDER_API_KEY
	}
}

/// Shape accepted from the override slot; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialConnectionConfig {
	api_key: Option<String>,
	auth_domain: Option<String>,
	project_id: Option<String>,
	storage_bucket: Option<String>,
	messaging_sender_id: Option<String>,
	app_id: Option<String>,
}
impl PartialConnectionConfig {
	fn from_env(env: &dyn EnvSource) -> Self {
		Self {
			api_key: ConfigField::ApiKey.from_env(env),
			auth_domain: ConfigField::AuthDomain.from_env(env),
			project_id: ConfigField::ProjectId.from_env(env),
			storage_bucket: ConfigField::StorageBucket.from_env(env),
			messaging_sender_id: ConfigField::MessagingSenderId.from_env(env),
			app_id: ConfigField::AppId.from_env(env),
		}
	}

	fn is_empty(&self) -> bool {
		self.api_key.is_none()
			&& self.auth_domain.is_none()
			&& self.project_id.is_none()
			&& self.storage_bucket.is_none()
			&& self.messaging_sender_id.is_none()
			&& self.app_id.is_none()
	}

	fn complete(self) -> ConnectionConfig {
		let fill = |value: Option<String>, field: ConfigField| {
			value.unwrap_or_else(|| field.placeholder().to_owned())
		};

		ConnectionConfig {
			api_key: fill(self.api_key, ConfigField::ApiKey),
			auth_domain: fill(self.auth_domain, ConfigField::AuthDomain),
			project_id: fill(self.project_id, ConfigField::ProjectId),
			storage_bucket: fill(self.storage_bucket, ConfigField::StorageBucket),
			messaging_sender_id: fill(self.messaging_sender_id, ConfigField::MessagingSenderId),
			app_id: fill(self.app_id, ConfigField::AppId),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConfigField {
	ApiKey,
	AuthDomain,
	ProjectId,
	StorageBucket,
	MessagingSenderId,
	AppId,
}
impl ConfigField {
	const fn env_suffix(self) -> &'static str {
		match self {
			Self::ApiKey => "API_KEY",
			Self::AuthDomain => "AUTH_DOMAIN",
			Self::ProjectId => "PROJECT_ID",
			Self::StorageBucket => "STORAGE_BUCKET",
			Self::MessagingSenderId => "MESSAGING_SENDER_ID",
			Self::AppId => "APP_ID",
		}
	}

	const fn placeholder(self) -> &'static str {
		match self {
			Self::ApiKey => PLACEHOLDER_API_KEY,
			Self::AuthDomain => "YOUR_AUTH_DOMAIN",
			Self::ProjectId => "YOUR_PROJECT_ID",
			Self::StorageBucket => "YOUR_STORAGE_BUCKET",
			Self::MessagingSenderId => "YOUR_MESSAGING_SENDER_ID",
			Self::AppId => "YOUR_APP_ID",
		}
	}

	fn env_names(self) -> impl Iterator<Item = String> {
		ENV_PREFIXES.iter().map(move |prefix| format!("{prefix}FIREBASE_{}", self.env_suffix()))
	}

	fn from_env(self, env: &dyn EnvSource) -> Option<String> {
		first_non_empty(env, self.env_names())
	}
}

/// Read-only view of environment variables.
pub trait EnvSource
where
	Self: Send + Sync,
{
	/// Returns the value of `key`, if set.
	fn var(&self, key: &str) -> Option<String>;
}

/// [`EnvSource`] backed by the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;
impl EnvSource for ProcessEnv {
	fn var(&self, key: &str) -> Option<String> {
		env::var(key).ok()
	}
}
impl EnvSource for HashMap<String, String> {
	fn var(&self, key: &str) -> Option<String> {
		self.get(key).cloned()
	}
}
impl EnvSource for BTreeMap<String, String> {
	fn var(&self, key: &str) -> Option<String> {
		self.get(key).cloned()
	}
}

/// Configuration supplied by the host at runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum InjectedConfig {
	/// Serialized JSON object.
	Text(String),
	/// Already-structured JSON value.
	Object(serde_json::Value),
}
impl InjectedConfig {
	fn is_absent(&self) -> bool {
		match self {
			Self::Text(text) => text.is_empty(),
			Self::Object(value) => value.is_null(),
		}
	}

	fn parse(&self) -> Result<PartialConnectionConfig, ConfigError> {
		let value = match self {
			Self::Text(text) =>
				serde_json::from_str(text).map_err(|source| ConfigError::Parse { source })?,
			Self::Object(value) => value.clone(),
		};
		// Checked as a map first so positional (array) input is rejected.
		let map = serde_path_to_error::deserialize::<_, serde_json::Map<String, serde_json::Value>>(
			value,
		)
		.map_err(|source| ConfigError::Shape { source })?;

		serde_path_to_error::deserialize(serde_json::Value::Object(map))
			.map_err(|source| ConfigError::Shape { source })
	}
}
impl From<ConnectionConfig> for InjectedConfig {
	fn from(config: ConnectionConfig) -> Self {
		Self::Object(serde_json::to_value(config).unwrap_or(serde_json::Value::Null))
	}
}

/// Contents of the process-wide override slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Injections {
	/// Connection config override.
	pub config: Option<InjectedConfig>,
	/// Application identifier override.
	pub app_id: Option<String>,
}

/// Stores a connection config override for subsequent resolutions.
///
/// Has no effect on a value already memoized by [`connection_config`].
pub fn inject_config(config: InjectedConfig) {
	INJECTIONS.write().config = Some(config);
}

/// Stores an application identifier override.
pub fn inject_app_id(app_id: impl Into<String>) {
	INJECTIONS.write().app_id = Some(app_id.into());
}

/// Empties the override slot.
pub fn clear_injections() {
	*INJECTIONS.write() = Injections::default();
}

/// Returns a snapshot of the override slot.
pub fn injections() -> Injections {
	INJECTIONS.read().clone()
}

/// Where a resolved config came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigOrigin {
	/// Override slot.
	Injected,
	/// At least one environment variable.
	///
	/// Fields resolve independently, so the record may mix real values with placeholders.
	/// Without an API key variable it stays in degraded mode:
	/// [`ConnectionConfig::is_placeholder`] holds and backend requests are refused.
	Environment,
	/// Placeholders only.
	Placeholder,
}
impl ConfigOrigin {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ConfigOrigin::Injected => "injected",
			ConfigOrigin::Environment => "environment",
			ConfigOrigin::Placeholder => "placeholder",
		}
	}
}
impl Display for ConfigOrigin {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Resolver output paired with its origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
	/// Complete connection parameters.
	pub config: ConnectionConfig,
	/// Source that produced them.
	pub origin: ConfigOrigin,
}

/// Explicit inputs for one resolution.
pub struct ConfigSources<'a> {
	/// Connection config override.
	pub injected: Option<InjectedConfig>,
	/// Application identifier override.
	pub injected_app_id: Option<String>,
	/// Environment to read from.
	pub env: &'a dyn EnvSource,
}
impl<'a> ConfigSources<'a> {
	/// Creates sources reading only from `env`.
	pub fn new(env: &'a dyn EnvSource) -> Self {
		Self { injected: None, injected_app_id: None, env }
	}

	/// Sets the connection config override.
	pub fn with_injected(mut self, injected: InjectedConfig) -> Self {
		self.injected = Some(injected);

		self
	}

	/// Sets the application identifier override.
	pub fn with_injected_app_id(mut self, app_id: impl Into<String>) -> Self {
		self.injected_app_id = Some(app_id.into());

		self
	}

	/// Resolves a complete connection config.
	pub fn resolve(&self) -> Result<ResolvedConfig> {
		let resolved = match self.injected.as_ref().filter(|injected| !injected.is_absent()) {
			Some(injected) => ResolvedConfig {
				config: injected.parse()?.complete(),
				origin: ConfigOrigin::Injected,
			},
			None => {
				let partial = PartialConnectionConfig::from_env(self.env);
				let origin = if partial.is_empty() {
					ConfigOrigin::Placeholder
				} else {
					ConfigOrigin::Environment
				};

				ResolvedConfig { config: partial.complete(), origin }
			},
		};

		tracing::debug!(
			origin = resolved.origin.as_str(),
			project_id = %resolved.config.project_id,
			"Resolved connection configuration."
		);

		if resolved.config.is_placeholder() {
			tracing::warn!(
				origin = resolved.origin.as_str(),
				"No API key configured; backend requests will be rejected."
			);
		}

		Ok(resolved)
	}

	/// Resolves the application identifier.
	///
	/// Order: override, `FIREBASE_APP_ID`, `REACT_APP_FIREBASE_APP_ID`, `VITE_FIREBASE_APP_ID`,
	/// then [`DEFAULT_APP_ID`].
	pub fn resolve_app_id(&self) -> String {
		self.injected_app_id
			.clone()
			.filter(|app_id| !app_id.is_empty())
			.or_else(|| ConfigField::AppId.from_env(self.env))
			.unwrap_or_else(|| DEFAULT_APP_ID.to_owned())
	}
}
impl ConfigSources<'static> {
	/// Sources backed by the override slot and the process environment.
	pub fn process() -> Self {
		static PROCESS_ENV: ProcessEnv = ProcessEnv;

		let Injections { config, app_id } = injections();

		Self { injected: config, injected_app_id: app_id, env: &PROCESS_ENV }
	}
}

/// Resolves the connection config from the override slot and the process environment.
pub fn resolve() -> Result<ConnectionConfig> {
	ConfigSources::process().resolve().map(|resolved| resolved.config)
}

/// Process-wide connection config, resolved on first call and fixed afterwards.
///
/// A failed resolution is not memoized.
pub fn connection_config() -> Result<&'static ConnectionConfig> {
	static CONFIG: OnceCell<ConnectionConfig> = OnceCell::new();

	CONFIG.get_or_try_init(resolve)
}

/// Process-wide application identifier, resolved on first call.
pub fn app_id() -> &'static str {
	static APP_ID: OnceCell<String> = OnceCell::new();

	APP_ID.get_or_init(|| ConfigSources::process().resolve_app_id())
}

fn first_non_empty(env: &dyn EnvSource, names: impl IntoIterator<Item = String>) -> Option<String> {
	names.into_iter().filter_map(|name| env.var(&name)).find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn vite_prefix_is_used_when_it_is_the_only_variant() {
		let env = env(&[("VITE_FIREBASE_API_KEY", "abc123")]);
		let resolved = ConfigSources::new(&env).resolve().expect("Resolution should succeed.");

		assert_eq!(resolved.config.api_key, "abc123");
		assert_eq!(resolved.config.project_id, "YOUR_PROJECT_ID");
		assert_eq!(resolved.origin, ConfigOrigin::Environment);
	}

	#[test]
	fn environment_variants_are_checked_in_order_per_field() {
		let env = env(&[
			("FIREBASE_API_KEY", "bare-key"),
			("REACT_APP_FIREBASE_API_KEY", "react-key"),
			("VITE_FIREBASE_API_KEY", "vite-key"),
			("FIREBASE_PROJECT_ID", ""),
			("REACT_APP_FIREBASE_PROJECT_ID", "react-project"),
			("VITE_FIREBASE_PROJECT_ID", "vite-project"),
			("VITE_FIREBASE_STORAGE_BUCKET", "vite.appspot.com"),
		]);
		let config = ConfigSources::new(&env).resolve().expect("Resolution should succeed.").config;

		assert_eq!(config.api_key, "bare-key");
		assert_eq!(config.project_id, "react-project", "Empty values must be skipped.");
		assert_eq!(config.storage_bucket, "vite.appspot.com");
		assert_eq!(config.auth_domain, "YOUR_AUTH_DOMAIN");
	}

	#[test]
	fn environment_without_api_key_stays_degraded() {
		let env = env(&[("FIREBASE_PROJECT_ID", "coop")]);
		let resolved = ConfigSources::new(&env).resolve().expect("Resolution should succeed.");

		assert_eq!(resolved.origin, ConfigOrigin::Environment);
		assert_eq!(resolved.config.project_id, "coop");
		assert!(resolved.config.is_placeholder());
	}

	#[test]
	fn empty_environment_yields_placeholders() {
		let env = env(&[]);
		let resolved = ConfigSources::new(&env).resolve().expect("Resolution should succeed.");

		assert_eq!(resolved.config, ConnectionConfig::placeholder());
		assert_eq!(resolved.origin, ConfigOrigin::Placeholder);
		assert!(resolved.config.is_placeholder());
		assert_eq!(resolved.config.messaging_sender_id, "YOUR_MESSAGING_SENDER_ID");
		assert_eq!(resolved.config.app_id, "YOUR_APP_ID");
	}

	#[test]
	fn injected_object_takes_full_precedence() {
		let env = env(&[("FIREBASE_API_KEY", "env-key"), ("FIREBASE_PROJECT_ID", "env-project")]);
		let injected = ConnectionConfig {
			api_key: "inj-key".into(),
			auth_domain: "demo.firebaseapp.com".into(),
			project_id: "demo".into(),
			storage_bucket: "demo.appspot.com".into(),
			messaging_sender_id: "1234".into(),
			app_id: "1:1234:web:abcd".into(),
		};
		let resolved = ConfigSources::new(&env)
			.with_injected(injected.clone().into())
			.resolve()
			.expect("Resolution should succeed.");

		assert_eq!(resolved.config, injected);
		assert_eq!(resolved.origin, ConfigOrigin::Injected);
	}

	#[test]
	fn injected_text_fills_missing_fields_with_placeholders() {
		let env = env(&[("FIREBASE_PROJECT_ID", "env-project")]);
		let config = ConfigSources::new(&env)
			.with_injected(InjectedConfig::Text(r#"{"apiKey":"xyz"}"#.into()))
			.resolve()
			.expect("Resolution should succeed.")
			.config;

		assert_eq!(config.api_key, "xyz");
		assert_eq!(config.project_id, "YOUR_PROJECT_ID", "Override replaces the whole record.");
	}

	#[test]
	fn malformed_injected_text_fails_instead_of_falling_back() {
		let env = env(&[("FIREBASE_API_KEY", "env-key")]);
		let err = ConfigSources::new(&env)
			.with_injected(InjectedConfig::Text("{\"apiKey\":".into()))
			.resolve()
			.expect_err("Malformed text must not fall back.");

		assert!(matches!(err, Error::Config(ConfigError::Parse { .. })));
	}

	#[test]
	fn mistyped_injected_fields_are_rejected_with_their_path() {
		let env = env(&[]);
		let err = ConfigSources::new(&env)
			.with_injected(InjectedConfig::Object(json!({ "apiKey": 42 })))
			.resolve()
			.expect_err("Non-string fields must be rejected.");
		let Error::Config(ConfigError::Shape { source }) = err else {
			panic!("Expected a shape error, got {err:?}.");
		};

		assert_eq!(source.path().to_string(), "apiKey");

		let err = ConfigSources::new(&env)
			.with_injected(InjectedConfig::Object(json!(["k", "d"])))
			.resolve()
			.expect_err("Arrays must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::Shape { .. })));
	}

	#[test]
	fn absent_injections_fall_through_to_environment() {
		let env = env(&[("FIREBASE_API_KEY", "env-key")]);

		for injected in [InjectedConfig::Text(String::new()), InjectedConfig::Object(json!(null))] {
			let config = ConfigSources::new(&env)
				.with_injected(injected)
				.resolve()
				.expect("Resolution should succeed.")
				.config;

			assert_eq!(config.api_key, "env-key");
		}
	}

	#[test]
	fn unknown_injected_fields_are_ignored() {
		let env = env(&[]);
		let config = ConfigSources::new(&env)
			.with_injected(InjectedConfig::Object(
				json!({ "apiKey": "k", "measurementId": "G-123" }),
			))
			.resolve()
			.expect("Unknown fields should be ignored.")
			.config;

		assert_eq!(config.api_key, "k");
	}

	#[test]
	fn app_id_chain_is_independent_of_the_override_object() {
		let injected = InjectedConfig::Object(json!({ "appId": "from-object" }));
		let empty = env(&[]);

		assert_eq!(
			ConfigSources::new(&empty).with_injected(injected.clone()).resolve_app_id(),
			DEFAULT_APP_ID
		);

		let vite = env(&[("VITE_FIREBASE_APP_ID", "vite-app")]);

		assert_eq!(ConfigSources::new(&vite).resolve_app_id(), "vite-app");

		let both = env(&[("FIREBASE_APP_ID", "bare-app"), ("VITE_FIREBASE_APP_ID", "vite-app")]);

		assert_eq!(ConfigSources::new(&both).resolve_app_id(), "bare-app");
		assert_eq!(
			ConfigSources::new(&both).with_injected_app_id("slot-app").resolve_app_id(),
			"slot-app"
		);
		assert_eq!(ConfigSources::new(&both).with_injected_app_id("").resolve_app_id(), "bare-app");
	}

	#[test]
	fn connection_config_serializes_in_camel_case() {
		let value = serde_json::to_value(ConnectionConfig::placeholder())
			.expect("Config should serialize.");

		assert_eq!(value["apiKey"], "YOUR_API_KEY");
		assert_eq!(value["messagingSenderId"], "YOUR_MESSAGING_SENDER_ID");
	}
}
