//! Security token service seam used to mint temporary credentials.
//!
//! Providers depend on [`StsClient`] rather than a concrete SDK so tests and alternative
//! backends can stand in for the real service. The default implementation lives behind the
//! `aws` feature.

#[cfg(feature = "aws")] pub mod sdk;
#[cfg(feature = "aws")] pub use sdk::SdkStsClient;

// self
use crate::{_prelude::*, credential::{Credentials, Secret}, session::Session};

/// Boxed future returned by [`StsClient`] calls.
///
/// `Ok(None)` means the service answered without credentials.
pub type StsFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<Credentials>>> + 'a + Send>>;

/// Minimal STS contract consumed by the federated and cross-account providers.
pub trait StsClient
where
	Self: 'static + Send + Sync,
{
	/// Assumes `request.role_arn` using the credentials carried by `base`.
	fn assume_role<'a>(&'a self, base: &'a Session, request: AssumeRoleRequest) -> StsFuture<'a>;

	/// Exchanges a SAML assertion for role credentials; no base credentials are needed.
	fn assume_role_with_saml<'a>(&'a self, request: AssumeRoleWithSamlRequest) -> StsFuture<'a>;
}

/// Parameters for a role assumption from existing credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssumeRoleRequest {
	/// Role to assume.
	pub role_arn: String,
	/// Session name recorded by the service.
	pub role_session_name: String,
	/// Requested credential lifetime.
	pub duration: Duration,
	/// External id required by the role's trust policy, if any.
	pub external_id: Option<String>,
}

/// Parameters for a SAML federation exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssumeRoleWithSamlRequest {
	/// Role to assume.
	pub role_arn: String,
	/// SAML provider ARN that issued the assertion.
	pub principal_arn: String,
	/// Base64 encoded assertion; callers must avoid logging it.
	pub saml_assertion: Secret,
	/// Requested credential lifetime.
	pub duration: Duration,
}
