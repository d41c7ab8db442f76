//! Email/password auth client derived from an [`App`].
//!
//! Calls the Identity Toolkit REST API (`accounts:signInWithPassword`, `accounts:signUp`) and keeps
//! the last successful credential as the current session, shared with the document and storage
//! clients through [`SessionHandle`].

// self
use crate::{
	_prelude::*,
	app::App,
	error::{AuthError, AuthErrorCode, ClientError},
	http::{self, ApiFailure},
	obs::{self, OpKind},
};

const SERVICE: &str = "identity_toolkit";
// ID tokens live for one hour; anything outside a day is treated as garbage.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3_600;
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// Redacted secret wrapper keeping tokens out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Signed-in account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// Provider-assigned user identifier.
	pub uid: String,
	/// Account email, when the provider echoes it.
	pub email: Option<String>,
}

/// Result of a successful sign-in or sign-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserCredential {
	/// Signed-in account.
	pub user: User,
	/// Short-lived ID token.
	pub id_token: Secret,
	/// Refresh token.
	pub refresh_token: Secret,
	/// Instant the ID token expires.
	pub expires_at: OffsetDateTime,
	/// Whether the call created the account.
	pub is_new_user: bool,
}
impl UserCredential {
	/// Whether the ID token has expired at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}

/// Shared view of the current session.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle(Arc<RwLock<Option<UserCredential>>>);
impl SessionHandle {
	/// Current credential, if any.
	pub fn current(&self) -> Option<UserCredential> {
		self.0.read().clone()
	}

	/// ID token of the current credential, if any.
	pub fn id_token(&self) -> Option<Secret> {
		self.0.read().as_ref().map(|credential| credential.id_token.clone())
	}

	fn replace(&self, credential: Option<UserCredential>) {
		*self.0.write() = credential;
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
	email: &'a str,
	password: &'a str,
	return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
	id_token: String,
	refresh_token: String,
	expires_in: String,
	local_id: String,
	#[serde(default)]
	email: Option<String>,
}

/// Auth client bound to one app.
#[derive(Clone, Debug)]
pub struct Auth {
	app: Arc<App>,
	session: SessionHandle,
}
impl Auth {
	/// Derives the auth client from `app`.
	pub fn new(app: Arc<App>) -> Self {
		Self { app, session: SessionHandle::default() }
	}

	/// App this client was derived from.
	pub fn app(&self) -> &Arc<App> {
		&self.app
	}

	/// Handle other clients use to read the current session.
	pub fn session(&self) -> SessionHandle {
		self.session.clone()
	}

	/// Currently signed-in user, if any.
	pub fn current_user(&self) -> Option<User> {
		self.session.current().map(|credential| credential.user)
	}

	/// Forgets the current session. No request is made.
	pub fn sign_out(&self) {
		self.session.replace(None);
	}

	/// Signs in an existing account.
	pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserCredential> {
		obs::observe(
			OpKind::SignIn,
			"auth.sign_in",
			self.password_call("v1/accounts:signInWithPassword", email, password, false),
		)
		.await
	}

	/// Creates an account and signs it in.
	pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserCredential> {
		obs::observe(
			OpKind::SignUp,
			"auth.sign_up",
			self.password_call("v1/accounts:signUp", email, password, true),
		)
		.await
	}

	async fn password_call(
		&self,
		path: &'static str,
		email: &str,
		password: &str,
		is_new_user: bool,
	) -> Result<UserCredential> {
		let config = self.app.config();

		if config.is_placeholder() {
			tracing::warn!(app = %self.app.name(), "Refusing auth call with placeholder API key.");

			return Err(AuthError::from(AuthErrorCode::InvalidApiKey).into());
		}

		let mut url = self
			.app
			.endpoints()
			.identity_toolkit
			.join(path)
			.map_err(|source| ClientError::InvalidEndpoint { endpoint: SERVICE, source })?;

		url.query_pairs_mut().append_pair("key", &config.api_key);

		let body = PasswordRequest { email, password, return_secure_token: true };
		let response = http::send(self.app.http_client().post(url).json(&body)).await?;
		let payload = match http::read_json::<PasswordResponse>(SERVICE, response).await? {
			Ok(payload) => payload,
			Err(ApiFailure { message, .. }) => {
				let err = AuthError::from_provider_message(&message);

				tracing::debug!(code = ?err.code, "Identity provider rejected the request.");

				return Err(err.into());
			},
		};
		let credential = credential_from(payload, is_new_user, OffsetDateTime::now_utc());

		self.session.replace(Some(credential.clone()));

		Ok(credential)
	}
}

fn credential_from(
	payload: PasswordResponse,
	is_new_user: bool,
	now: OffsetDateTime,
) -> UserCredential {
	// The provider sends `expiresIn` as a decimal string.
	let lifetime = match payload.expires_in.trim().parse::<i64>() {
		Ok(secs) if (1..=MAX_TOKEN_LIFETIME_SECS).contains(&secs) => secs,
		_ => {
			tracing::warn!(
				expires_in = %payload.expires_in,
				"Unusable token lifetime; assuming the default."
			);

			DEFAULT_TOKEN_LIFETIME_SECS
		},
	};
	// An unrepresentable expiry leaves the token already expired.
	let expires_at = now.checked_add(Duration::seconds(lifetime)).unwrap_or(now);

	UserCredential {
		user: User { uid: payload.local_id, email: payload.email },
		id_token: Secret::new(payload.id_token),
		refresh_token: Secret::new(payload.refresh_token),
		expires_at,
		is_new_user,
	}
}
