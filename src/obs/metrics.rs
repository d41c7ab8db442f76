// self
use crate::obs::{FailureClass, OpKind};

/// Counts a backend call as it starts.
pub fn record_attempt(kind: OpKind) {
	count_call(kind, "attempt");
}

/// Counts a finished backend call; `failure` is `None` on success.
pub fn record_completion(kind: OpKind, failure: Option<FailureClass>) {
	match failure {
		None => count_call(kind, "success"),
		Some(class) => {
			count_call(kind, "failure");

			#[cfg(feature = "metrics")]
			metrics::counter!(
				"firebase_services_op_failures_total",
				"service" => kind.service(),
				"op" => kind.as_str(),
				"class" => class.as_str()
			)
			.increment(1);
			#[cfg(not(feature = "metrics"))]
			let _ = class;
		},
	}
}

fn count_call(kind: OpKind, outcome: &'static str) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"firebase_services_op_total",
		"service" => kind.service(),
		"op" => kind.as_str(),
		"outcome" => outcome
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}
