// self
use crate::obs::{CredentialFlow, FlowOutcome};

/// Records a credential flow outcome via the global metrics recorder (when enabled).
pub fn record_credential_outcome(kind: CredentialFlow, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"account_runner_credential_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records the final outcome of one account's execution (when metrics are enabled).
pub fn record_account_outcome(outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("account_runner_account_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
