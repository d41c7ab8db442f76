//! Crate-level error types shared by the resolver, the client cache, and the service clients.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Connection configuration could not be resolved.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Root or dependent client could not be constructed.
	#[error(transparent)]
	Client(#[from] ClientError),
	/// Identity provider rejected an auth call.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Document or storage service answered with a non-success status.
	#[error("The {service} service responded with status {status}: {message}.")]
	Service {
		/// Service label (`firestore`, `storage`).
		service: &'static str,
		/// HTTP status code.
		status: u16,
		/// Provider-supplied message.
		message: String,
	},
}

/// Failures raised while resolving the connection configuration.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Injected configuration text is not valid JSON.
	#[error("Injected configuration text is malformed.")]
	Parse {
		/// JSON syntax failure (carries line and column).
		#[source]
		source: serde_json::Error,
	},
	/// Injected configuration does not match the connection config shape.
	#[error("Injected configuration does not match the expected shape.")]
	Shape {
		/// Structured validation failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Failures raised while constructing or looking up clients.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientError {
	/// A configuration field was rejected by validation.
	#[error("Configuration field `{field}` is invalid: {reason}.")]
	InvalidConfig {
		/// Offending field name.
		field: &'static str,
		/// Validation failure reason.
		reason: &'static str,
	},
	/// An app with this name is already registered.
	#[error("An app named `{name}` already exists.")]
	DuplicateApp {
		/// App name.
		name: String,
	},
	/// No app with this name is registered.
	#[error("No app named `{name}` has been created.")]
	NoApp {
		/// App name.
		name: String,
	},
	/// Storage operations need a bucket but the configuration has none.
	#[error("No storage bucket is configured.")]
	MissingBucket,
	/// A service endpoint could not be parsed or joined.
	#[error("Service endpoint `{endpoint}` is invalid: {source}.")]
	InvalidEndpoint {
		/// Endpoint label.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Identity provider error codes surfaced by sign-in and sign-up.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
	/// No account exists for the email.
	EmailNotFound,
	/// Password does not match.
	InvalidPassword,
	/// Email or password is wrong (enumeration-protected projects).
	InvalidLoginCredentials,
	/// Account was disabled by an administrator.
	UserDisabled,
	/// Sign-up email is already registered.
	EmailExists,
	/// Sign-up password is too weak.
	WeakPassword,
	/// Email is badly formatted.
	InvalidEmail,
	/// Password field is empty.
	MissingPassword,
	/// Too many failed attempts; the provider is throttling this account.
	TooManyAttempts,
	/// Email/password sign-in is disabled for the project.
	OperationNotAllowed,
	/// API key is missing, invalid, or a placeholder.
	InvalidApiKey,
	/// Any code this crate does not know about.
	Other(String),
}
impl AuthErrorCode {
	/// Maps a provider code string (e.g. `EMAIL_NOT_FOUND`) to a known variant.
	pub fn from_provider(code: &str) -> Self {
		match code {
			"EMAIL_NOT_FOUND" => Self::EmailNotFound,
			"INVALID_PASSWORD" => Self::InvalidPassword,
			"INVALID_LOGIN_CREDENTIALS" => Self::InvalidLoginCredentials,
			"USER_DISABLED" => Self::UserDisabled,
			"EMAIL_EXISTS" => Self::EmailExists,
			"WEAK_PASSWORD" => Self::WeakPassword,
			"INVALID_EMAIL" => Self::InvalidEmail,
			"MISSING_PASSWORD" => Self::MissingPassword,
			"TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
			"OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => Self::OperationNotAllowed,
			"INVALID_API_KEY" | "API_KEY_INVALID" => Self::InvalidApiKey,
			other if other.starts_with("API key not valid") => Self::InvalidApiKey,
			other => Self::Other(other.to_owned()),
		}
	}

	/// Returns a short, user-facing message for the code.
	pub fn default_message(&self) -> &str {
		match self {
			Self::EmailNotFound => "No account exists for this email.",
			Self::InvalidPassword => "The password is incorrect.",
			Self::InvalidLoginCredentials => "The email or password is incorrect.",
			Self::UserDisabled => "This account has been disabled.",
			Self::EmailExists => "An account with this email already exists.",
			Self::WeakPassword => "Password should be at least 6 characters.",
			Self::InvalidEmail => "The email address is badly formatted.",
			Self::MissingPassword => "A password is required.",
			Self::TooManyAttempts => "Too many attempts. Try again later.",
			Self::OperationNotAllowed => "Email and password sign-in is disabled.",
			Self::InvalidApiKey => "The API key is not valid. Check the app configuration.",
			Self::Other(_) => "Authentication failed.",
		}
	}
}

/// Auth failure carrying a message meant to be shown to the end user verbatim.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct AuthError {
	/// Classified provider code.
	pub code: AuthErrorCode,
	/// Human-readable message.
	pub message: String,
}
impl AuthError {
	/// Builds an error with an explicit message.
	pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
		Self { code, message: message.into() }
	}

	/// Builds an error from the provider's raw `message` field.
	///
	/// The provider sometimes appends detail after ` : ` (e.g.
	/// `WEAK_PASSWORD : Password should be at least 6 characters`); the detail is preferred
	/// over the canned message when present.
	pub fn from_provider_message(raw: &str) -> Self {
		let (code, detail) = match raw.split_once(" : ") {
			Some((code, detail)) => (code.trim(), Some(detail.trim())),
			None => (raw.trim(), None),
		};
		let code = AuthErrorCode::from_provider(code);
		let message = match detail {
			Some(detail) if !detail.is_empty() => detail.to_owned(),
			_ => code.default_message().to_owned(),
		};

		Self { code, message }
	}
}
impl From<AuthErrorCode> for AuthError {
	fn from(code: AuthErrorCode) -> Self {
		let message = code.default_message().to_owned();

		Self { code, message }
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned a throttling or server error.
	#[error("The {service} service is temporarily unavailable: {message}.")]
	Upstream {
		/// Service label.
		service: &'static str,
		/// Provider-supplied message summarizing the failure.
		message: String,
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Provider responded with a body that could not be parsed.
	#[error("The {service} service returned a malformed response.")]
	ResponseParse {
		/// Service label.
		service: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		TransportError::from(e).into()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn provider_message_detail_overrides_canned_text() {
		let err = AuthError::from_provider_message(
			"WEAK_PASSWORD : Password should be at least 6 characters",
		);

		assert_eq!(err.code, AuthErrorCode::WeakPassword);
		assert_eq!(err.to_string(), "Password should be at least 6 characters");

		let err = AuthError::from_provider_message("EMAIL_NOT_FOUND");

		assert_eq!(err.code, AuthErrorCode::EmailNotFound);
		assert_eq!(err.message, "No account exists for this email.");
	}

	#[test]
	fn unknown_codes_keep_raw_value() {
		let err = AuthError::from_provider_message("SOMETHING_NEW");

		assert_eq!(err.code, AuthErrorCode::Other("SOMETHING_NEW".into()));
		assert_eq!(err.message, "Authentication failed.");
	}

	#[test]
	fn api_key_messages_classify_as_invalid_key() {
		let err =
			AuthError::from_provider_message("API key not valid. Please pass a valid API key.");

		assert_eq!(err.code, AuthErrorCode::InvalidApiKey);
	}

	#[test]
	fn auth_error_converts_into_crate_error_transparently() {
		let err: Error = AuthError::from(AuthErrorCode::EmailExists).into();

		assert!(matches!(err, Error::Auth(_)));
		assert_eq!(err.to_string(), "An account with this email already exists.");
	}
}
