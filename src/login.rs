//! Login form submission boundary.
//!
//! [`submit`] is where auth failures stop propagating: every error is logged and turned into a
//! message the form can show inline.

// self
use crate::{
	_prelude::*,
	auth::{Auth, UserCredential},
};

/// Message shown when an error carries no text of its own.
pub const FALLBACK_MESSAGE: &str = "Authentication failed.";
/// Message shown when a required field is blank.
pub const MISSING_FIELDS_MESSAGE: &str = "Email and password are required.";

/// Which auth call the form performs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginMode {
	/// Sign in to an existing account.
	#[default]
	SignIn,
	/// Create a new account.
	SignUp,
}
impl LoginMode {
	/// The other mode.
	pub const fn toggle(self) -> Self {
		match self {
			LoginMode::SignIn => LoginMode::SignUp,
			LoginMode::SignUp => LoginMode::SignIn,
		}
	}
}

/// One form submission.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
	/// Selected mode.
	pub mode: LoginMode,
	/// Email field.
	pub email: String,
	/// Password field.
	pub password: String,
}
impl LoginRequest {
	/// Creates a sign-in request.
	pub fn sign_in(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { mode: LoginMode::SignIn, email: email.into(), password: password.into() }
	}

	/// Creates a sign-up request.
	pub fn sign_up(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { mode: LoginMode::SignUp, email: email.into(), password: password.into() }
	}
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("mode", &self.mode)
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// What the form should do after a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
	/// Signed in; the caller navigates away.
	SignedIn(UserCredential),
	/// Account created.
	SignedUp(UserCredential),
	/// Show `message` inline.
	Failed {
		/// User-facing text.
		message: String,
	},
}
impl LoginOutcome {
	/// Inline error text, if the submission failed.
	pub fn error_message(&self) -> Option<&str> {
		match self {
			LoginOutcome::Failed { message } => Some(message),
			_ => None,
		}
	}
}

/// Runs the auth call for `request` and converts any failure into displayable text.
pub async fn submit(auth: &Auth, request: &LoginRequest) -> LoginOutcome {
	let email = request.email.trim();

	if email.is_empty() || request.password.is_empty() {
		return LoginOutcome::Failed { message: MISSING_FIELDS_MESSAGE.to_owned() };
	}

	let result = match request.mode {
		LoginMode::SignIn =>
			auth.sign_in(email, &request.password).await.map(LoginOutcome::SignedIn),
		LoginMode::SignUp =>
			auth.sign_up(email, &request.password).await.map(LoginOutcome::SignedUp),
	};

	result.unwrap_or_else(|e| {
		tracing::error!(mode = ?request.mode, error = %e, "Auth error.");

		LoginOutcome::Failed { message: user_message(&e) }
	})
}

/// Text to show for `error`.
pub fn user_message(error: &Error) -> String {
	let message = match error {
		Error::Auth(auth) => auth.message.clone(),
		other => other.to_string(),
	};

	if message.trim().is_empty() { FALLBACK_MESSAGE.to_owned() } else { message }
}
