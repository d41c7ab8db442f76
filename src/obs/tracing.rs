// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::OpKind};

/// Span wrapped around one backend call.
#[derive(Clone, Debug)]
pub struct OpSpan {
	span: Span,
}
impl OpSpan {
	/// Opens a `firebase_services.op` span; `stage` names the calling method.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		let span = tracing::info_span!(
			"firebase_services.op",
			service = kind.service(),
			op = kind.as_str(),
			stage
		);

		Self { span }
	}

	/// Runs `fut` inside the span.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}
