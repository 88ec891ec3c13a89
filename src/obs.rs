//! Observability helpers for credential flows and per-account runs.
//!
//! Spans named `account_runner.credential` carry the `flow` and `stage` fields; each account
//! runs inside an `account_runner.account` span. Enable the `metrics` feature to increment the
//! `account_runner_credential_total` (`flow`, `outcome`) and `account_runner_account_total`
//! (`outcome`) counters.

mod metrics;
mod span;

pub use metrics::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Credential flow kinds observed by the session providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialFlow {
	/// Shared-config profile lookup.
	Profile,
	/// SAML assertion fetch from the identity provider.
	SamlAssertion,
	/// SAML assertion exchanged for role credentials.
	SamlExchange,
	/// Role chained from a base account.
	CrossAccount,
}
impl CredentialFlow {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialFlow::Profile => "profile",
			CredentialFlow::SamlAssertion => "saml_assertion",
			CredentialFlow::SamlExchange => "saml_exchange",
			CredentialFlow::CrossAccount => "cross_account",
		}
	}
}
impl Display for CredentialFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a finished result onto [`FlowOutcome::Success`] or [`FlowOutcome::Failure`].
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
