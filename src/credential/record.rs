//! Temporary credential bundle plus its validating builder.

// self
use crate::{_prelude::*, credential::secret::Secret};

/// Errors produced by [`CredentialsBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialsBuilderError {
	/// Issued when no access key id was provided.
	#[error("Access key id is required.")]
	MissingAccessKeyId,
	/// Issued when no secret access key was provided.
	#[error("Secret access key is required.")]
	MissingSecretAccessKey,
}

/// Short-lived secret bundle minted by STS (or read from a profile).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Access key id; safe to log.
	pub access_key_id: String,
	/// Secret access key; callers must avoid logging it.
	pub secret_access_key: Secret,
	/// Session token, present for temporary credentials.
	pub session_token: Option<Secret>,
	/// Expiry instant reported by the issuer, if any.
	#[serde(default)]
	pub expires_at: Option<OffsetDateTime>,
}
impl Credentials {
	/// Returns a builder for credential bundles.
	pub fn builder() -> CredentialsBuilder {
		CredentialsBuilder::default()
	}

	/// Returns `true` if the issuer-reported expiry has passed at the provided instant.
	///
	/// Credentials without an expiry never expire.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Returns `true` if the credentials are expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("access_key_id", &self.access_key_id)
			.field("secret_access_key", &"<redacted>")
			.field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Credentials`].
#[derive(Clone, Debug, Default)]
pub struct CredentialsBuilder {
	access_key_id: Option<String>,
	secret_access_key: Option<Secret>,
	session_token: Option<Secret>,
	expires_at: Option<OffsetDateTime>,
}
impl CredentialsBuilder {
	/// Sets the access key id.
	pub fn access_key_id(mut self, value: impl Into<String>) -> Self {
		self.access_key_id = Some(value.into());

		self
	}

	/// Sets the secret access key.
	pub fn secret_access_key(mut self, value: impl Into<String>) -> Self {
		self.secret_access_key = Some(Secret::new(value));

		self
	}

	/// Sets the session token.
	pub fn session_token(mut self, value: impl Into<String>) -> Self {
		self.session_token = Some(Secret::new(value));

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Builds the credentials.
	pub fn build(self) -> Result<Credentials, CredentialsBuilderError> {
		let access_key_id = self
			.access_key_id
			.filter(|value| !value.is_empty())
			.ok_or(CredentialsBuilderError::MissingAccessKeyId)?;
		let secret_access_key = self
			.secret_access_key
			.filter(|value| !value.expose().is_empty())
			.ok_or(CredentialsBuilderError::MissingSecretAccessKey)?;

		Ok(Credentials {
			access_key_id,
			secret_access_key,
			session_token: self.session_token,
			expires_at: self.expires_at,
		})
	}
}

#[cfg(feature = "aws")]
impl From<&Credentials> for aws_credential_types::Credentials {
	fn from(value: &Credentials) -> Self {
		aws_credential_types::Credentials::new(
			value.access_key_id.clone(),
			value.secret_access_key.expose(),
			value.session_token.as_ref().map(|token| token.expose().to_owned()),
			value.expires_at.map(std::time::SystemTime::from),
			"account-runner",
		)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn builder_requires_key_pair() {
		assert_eq!(
			Credentials::builder().secret_access_key("s").build().unwrap_err(),
			CredentialsBuilderError::MissingAccessKeyId
		);
		assert_eq!(
			Credentials::builder().access_key_id("AKIA").build().unwrap_err(),
			CredentialsBuilderError::MissingSecretAccessKey
		);
		assert_eq!(
			Credentials::builder().access_key_id("").secret_access_key("s").build().unwrap_err(),
			CredentialsBuilderError::MissingAccessKeyId
		);
	}

	#[test]
	fn expiry_is_inclusive_and_optional() {
		let expires_at = macros::datetime!(2025-01-01 00:00 UTC);
		let credentials = Credentials::builder()
			.access_key_id("ASIA")
			.secret_access_key("secret")
			.session_token("token")
			.expires_at(expires_at)
			.build()
			.expect("Credentials should build.");

		assert!(!credentials.is_expired_at(expires_at - Duration::seconds(1)));
		assert!(credentials.is_expired_at(expires_at));

		let static_credentials = Credentials::builder()
			.access_key_id("AKIA")
			.secret_access_key("secret")
			.build()
			.expect("Static credentials should build.");

		assert!(!static_credentials.is_expired_at(expires_at + Duration::days(3650)));
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let credentials = Credentials::builder()
			.access_key_id("ASIAEXAMPLE")
			.secret_access_key("super-secret")
			.session_token("session-secret")
			.build()
			.expect("Credentials should build.");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("ASIAEXAMPLE"));
		assert!(!rendered.contains("super-secret"));
		assert!(!rendered.contains("session-secret"));
	}

	#[test]
	fn credentials_survive_json_persistence() {
		let credentials = Credentials::builder()
			.access_key_id("ASIA")
			.secret_access_key("secret")
			.session_token("token")
			.expires_at(macros::datetime!(2030-06-01 12:00 UTC))
			.build()
			.expect("Credentials should build.");
		let json = serde_json::to_string(&credentials).expect("Credentials should serialize.");
		let decoded: Credentials = serde_json::from_str(&json).expect("Credentials should deserialize.");

		assert_eq!(decoded, credentials);
	}
}
