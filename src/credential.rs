//! Temporary credential bundles and the keys they are cached under.

pub mod record;
pub mod secret;

pub use record::*;
pub use secret::*;

// self
use crate::{_prelude::*, account::AccountId};

/// Cache key for temporary credentials: one entry per account and role pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialKey {
	/// Account the credentials belong to.
	pub account_id: AccountId,
	/// Role name (not ARN) the credentials were minted for.
	pub role: String,
}
impl CredentialKey {
	/// Builds a key for the provided account and role.
	pub fn new(account_id: &AccountId, role: impl Into<String>) -> Self {
		Self { account_id: account_id.clone(), role: role.into() }
	}
}
impl Display for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}", self.account_id, self.role)
	}
}
