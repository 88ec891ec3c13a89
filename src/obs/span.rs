// crates.io
use tracing::{Span, instrument::Instrumented};
// self
use crate::{_prelude::*, account::AccountId, obs::CredentialFlow};

/// A span builder used by credential flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: CredentialFlow, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("account_runner.credential", flow = kind.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}

/// Returns the span wrapping all work done for one account.
pub fn account_span(account_id: Option<&AccountId>) -> Span {
	match account_id {
		Some(account_id) => tracing::info_span!("account_runner.account", account = %account_id),
		None => tracing::info_span!("account_runner.account", account = tracing::field::Empty),
	}
}
