//! Sessions handed to commands and the providers that produce them.
//!
//! Three strategies sit behind [`SessionProvider`]:
//!
//! - [`ProfileSessionProvider`] looks up a shared-config profile named after the account.
//! - [`SamlSessionProvider`] federates through an identity provider and STS.
//! - [`CrossAccountSessionProvider`] assumes a role from another provider's base session.
//!
//! The latter two cache credentials through [`CredentialCache`] at half their lifetime.

pub mod caching;
pub mod cross_account;
pub mod profile;
pub mod saml;

pub use caching::{CredentialCache, CredentialFuture, CredentialSource};
pub use cross_account::{CrossAccountExchange, CrossAccountSessionProvider};
pub use profile::ProfileSessionProvider;
pub use saml::{SamlExchange, SamlSessionProvider};

// self
use crate::{_prelude::*, account::AccountId, credential::Credentials};

/// Boxed future returned by [`SessionProvider::session`].
pub type SessionFuture<'a> = Pin<Box<dyn Future<Output = Result<Session>> + 'a + Send>>;

/// Produces a ready-to-use session for an account.
pub trait SessionProvider
where
	Self: Send + Sync,
{
	/// Returns a session for `account_id`.
	fn session<'a>(&'a self, account_id: &'a AccountId) -> SessionFuture<'a>;
}
impl<P> SessionProvider for Arc<P>
where
	P: ?Sized + SessionProvider,
{
	fn session<'a>(&'a self, account_id: &'a AccountId) -> SessionFuture<'a> {
		(**self).session(account_id)
	}
}

/// Where a session's credentials come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionSource {
	/// A named profile from the shared config files.
	Profile(String),
	/// The default credential chain.
	DefaultProfile,
	/// Temporary credentials minted by STS.
	Temporary(Credentials),
}

/// Credential-bearing handle a command uses to call cloud APIs for one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
	account_id: AccountId,
	source: SessionSource,
}
impl Session {
	/// Session backed by the named shared-config profile.
	pub fn profile(account_id: AccountId, name: impl Into<String>) -> Self {
		Self { account_id, source: SessionSource::Profile(name.into()) }
	}

	/// Session backed by the default credential chain.
	pub fn default_profile(account_id: AccountId) -> Self {
		Self { account_id, source: SessionSource::DefaultProfile }
	}

	/// Session backed by temporary credentials.
	pub fn temporary(account_id: AccountId, credentials: Credentials) -> Self {
		Self { account_id, source: SessionSource::Temporary(credentials) }
	}

	/// Account this session acts on.
	pub fn account_id(&self) -> &AccountId {
		&self.account_id
	}

	/// Credential source of this session.
	pub fn source(&self) -> &SessionSource {
		&self.source
	}

	/// Temporary credentials, when the session carries them.
	pub fn credentials(&self) -> Option<&Credentials> {
		match &self.source {
			SessionSource::Temporary(credentials) => Some(credentials),
			_ => None,
		}
	}

	/// Builds an SDK configuration for this session, optionally pinned to `region`.
	#[cfg(feature = "aws")]
	pub async fn sdk_config(&self, region: Option<&str>) -> aws_config::SdkConfig {
		let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

		if let Some(region) = region {
			loader = loader.region(aws_config::Region::new(region.to_owned()));
		}

		match &self.source {
			SessionSource::Profile(name) => loader = loader.profile_name(name),
			SessionSource::DefaultProfile => {},
			SessionSource::Temporary(credentials) =>
				loader = loader
					.credentials_provider(aws_credential_types::Credentials::from(credentials)),
		}

		loader.load().await
	}
}
