//! Observability for backend calls.
//!
//! Every network call runs inside a `firebase_services.op` span carrying `service`, `op` and
//! `stage`. With the `metrics` feature, `firebase_services_op_total` counts attempts, successes and
//! failures per `service` + `op`, and `firebase_services_op_failures_total` breaks failures down by
//! [`FailureClass`].

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Backend operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Email/password sign-in.
	SignIn,
	/// Email/password account creation.
	SignUp,
	/// Document read.
	GetDocument,
	/// Document write.
	SetDocument,
	/// Object upload.
	Upload,
	/// Object download.
	Download,
}
impl OpKind {
	/// Operation label.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::SignIn => "sign_in",
			OpKind::SignUp => "sign_up",
			OpKind::GetDocument => "get_document",
			OpKind::SetDocument => "set_document",
			OpKind::Upload => "upload",
			OpKind::Download => "download",
		}
	}

	/// Backend the operation talks to; matches the `service` field of [`Error::Service`].
	pub const fn service(self) -> &'static str {
		match self {
			OpKind::SignIn | OpKind::SignUp => "identity_toolkit",
			OpKind::GetDocument | OpKind::SetDocument => "firestore",
			OpKind::Upload | OpKind::Download => "storage",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}.{}", self.service(), self.as_str())
	}
}

/// Coarse grouping of [`Error`] for dashboards and log filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureClass {
	/// Bad local input or configuration; retrying will not help.
	Local,
	/// Identity provider refused the credentials.
	Rejected,
	/// Throttling, 5xx or an unreadable body.
	Transient,
	/// Network never produced a response.
	Transport,
	/// Document or storage service refused the request.
	Service,
}
impl FailureClass {
	/// Classifies `error`.
	pub fn of(error: &Error) -> Self {
		match error {
			Error::Config(_) | Error::Client(_) => FailureClass::Local,
			Error::Auth(_) => FailureClass::Rejected,
			Error::Transient(_) => FailureClass::Transient,
			Error::Transport(_) => FailureClass::Transport,
			Error::Service { .. } => FailureClass::Service,
		}
	}

	/// Metric and log label.
	pub const fn as_str(self) -> &'static str {
		match self {
			FailureClass::Local => "local",
			FailureClass::Rejected => "rejected",
			FailureClass::Transient => "transient",
			FailureClass::Transport => "transport",
			FailureClass::Service => "service",
		}
	}
}

/// Runs `fut` inside an [`OpSpan`] and records how it ended.
pub(crate) async fn observe<T, Fut>(kind: OpKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OpSpan::new(kind, stage);

	record_attempt(kind);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_completion(kind, None),
		Err(e) => {
			let class = FailureClass::of(e);

			record_completion(kind, Some(class));
			::tracing::debug!(
				op = %kind,
				class = class.as_str(),
				error = %e,
				"Backend call failed."
			);
		},
	}

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{AuthError, AuthErrorCode, ClientError};

	#[test]
	fn kinds_name_their_backend() {
		assert_eq!(OpKind::SignUp.to_string(), "identity_toolkit.sign_up");
		assert_eq!(OpKind::SetDocument.service(), "firestore");
		assert_eq!(OpKind::Download.service(), "storage");
	}

	#[test]
	fn failures_are_classified_by_error_layer() {
		assert_eq!(FailureClass::of(&ClientError::MissingBucket.into()), FailureClass::Local);
		assert_eq!(
			FailureClass::of(&AuthError::from(AuthErrorCode::InvalidPassword).into()),
			FailureClass::Rejected
		);
		assert_eq!(
			FailureClass::of(&Error::Service {
				service: "storage",
				status: 403,
				message: "denied".into()
			}),
			FailureClass::Service
		);
	}

	#[tokio::test]
	async fn observe_passes_the_result_through() {
		let ok = observe(OpKind::GetDocument, "test", async { Ok(7) }).await;

		assert_eq!(ok.ok(), Some(7));

		let err = observe::<(), _>(OpKind::Upload, "test", async {
			Err(ClientError::MissingBucket.into())
		})
		.await;

		assert!(matches!(err, Err(Error::Client(ClientError::MissingBucket))));
	}
}
