//! Provider and runner configuration with builders and validation.
//!
//! Every type deserializes from an external config document; call `validate` (or go through
//! the builders, which validate on `build`) before handing a deserialized value to a provider.

// self
use crate::{
	_prelude::*,
	account::AccountId,
	credential::Secret,
	error::ConfigError,
	idp::{IdpAuth, IdpMethod, IdpRequest},
};

/// Shortest credential lifetime STS accepts.
pub const MIN_CREDENTIAL_DURATION: Duration = Duration::seconds(900);
/// Longest credential lifetime STS accepts.
pub const MAX_CREDENTIAL_DURATION: Duration = Duration::seconds(43_200);
/// Default credential lifetime.
pub const DEFAULT_CREDENTIAL_DURATION: Duration = Duration::seconds(3_600);
/// Default SAML assertion cache lifetime.
pub const DEFAULT_ASSERTION_DURATION: Duration = Duration::seconds(300);
/// Default worker pool size.
pub const DEFAULT_MAX_WORKERS: usize = 10;
/// Default partition used when building role ARNs.
pub const DEFAULT_PARTITION: &str = "aws";

/// SAML federation settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamlConfig {
	/// Role name (not ARN) to assume in every account.
	pub role: String,
	/// Identity provider sign-on URL.
	pub url: Url,
	/// HTTP method used against the identity provider.
	#[serde(default)]
	pub method: IdpMethod,
	/// Extra headers sent to the identity provider.
	#[serde(default)]
	pub headers: BTreeMap<String, String>,
	/// Identity provider authentication.
	#[serde(default)]
	pub auth: IdpAuth,
	/// Requested credential lifetime.
	#[serde(default = "default_credential_duration", with = "seconds")]
	pub duration: Duration,
	/// How long one assertion is reused across exchanges.
	#[serde(default = "default_assertion_duration", with = "seconds")]
	pub assertion_duration: Duration,
	/// Verify the identity provider's TLS certificate.
	#[serde(default = "default_verify_tls")]
	pub verify_tls: bool,
}
impl SamlConfig {
	/// Returns a builder seeded with defaults.
	pub fn builder() -> SamlConfigBuilder {
		SamlConfigBuilder::default()
	}

	/// Validates durations and required fields.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.role.is_empty() {
			return Err(ConfigError::MissingField { field: "role" });
		}

		validate_credential_duration(self.duration)?;

		if self.assertion_duration.is_negative() {
			return Err(ConfigError::NegativeDuration { field: "assertion" });
		}

		Ok(())
	}

	/// Identity provider request described by this configuration.
	pub fn idp_request(&self) -> IdpRequest {
		IdpRequest {
			url: self.url.clone(),
			method: self.method,
			headers: self.headers.clone(),
			auth: self.auth.clone(),
		}
	}
}

/// Builder for [`SamlConfig`].
#[derive(Clone, Debug)]
pub struct SamlConfigBuilder {
	role: Option<String>,
	url: Option<Url>,
	method: IdpMethod,
	headers: BTreeMap<String, String>,
	auth: IdpAuth,
	duration: Duration,
	assertion_duration: Duration,
	verify_tls: bool,
}
impl SamlConfigBuilder {
	/// Sets the role name.
	pub fn role(mut self, role: impl Into<String>) -> Self {
		self.role = Some(role.into());

		self
	}

	/// Sets the identity provider URL.
	pub fn url(mut self, url: Url) -> Self {
		self.url = Some(url);

		self
	}

	/// Sets the HTTP method.
	pub fn method(mut self, method: IdpMethod) -> Self {
		self.method = method;

		self
	}

	/// Adds a header sent to the identity provider.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Uses HTTP basic authentication.
	pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
		self.auth = IdpAuth::Basic { username: username.into(), password: Secret::new(password) };

		self
	}

	/// Sets the requested credential lifetime.
	pub fn duration(mut self, duration: Duration) -> Self {
		self.duration = duration;

		self
	}

	/// Sets how long an assertion is reused.
	pub fn assertion_duration(mut self, duration: Duration) -> Self {
		self.assertion_duration = duration;

		self
	}

	/// Toggles TLS certificate verification.
	pub fn verify_tls(mut self, verify: bool) -> Self {
		self.verify_tls = verify;

		self
	}

	/// Builds and validates the configuration.
	pub fn build(self) -> Result<SamlConfig, ConfigError> {
		let config = SamlConfig {
			role: self.role.ok_or(ConfigError::MissingField { field: "role" })?,
			url: self.url.ok_or(ConfigError::MissingField { field: "url" })?,
			method: self.method,
			headers: self.headers,
			auth: self.auth,
			duration: self.duration,
			assertion_duration: self.assertion_duration,
			verify_tls: self.verify_tls,
		};

		config.validate()?;

		Ok(config)
	}
}
impl Default for SamlConfigBuilder {
	fn default() -> Self {
		Self {
			role: None,
			url: None,
			method: IdpMethod::default(),
			headers: BTreeMap::new(),
			auth: IdpAuth::default(),
			duration: DEFAULT_CREDENTIAL_DURATION,
			assertion_duration: DEFAULT_ASSERTION_DURATION,
			verify_tls: true,
		}
	}
}

/// Cross-account role chaining settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossAccountConfig {
	/// Account whose session is used to assume the target role.
	pub base_account: AccountId,
	/// Role name (not ARN) to assume in every target account.
	pub role: String,
	/// External id required by the role's trust policy.
	#[serde(default)]
	pub external_id: Option<String>,
	/// Requested credential lifetime.
	#[serde(default = "default_credential_duration", with = "seconds")]
	pub duration: Duration,
	/// Partition used in role ARNs.
	#[serde(default = "default_partition")]
	pub partition: String,
}
impl CrossAccountConfig {
	/// Returns a builder for the given base account and role.
	pub fn builder(base_account: AccountId, role: impl Into<String>) -> CrossAccountConfigBuilder {
		CrossAccountConfigBuilder {
			base_account,
			role: role.into(),
			external_id: None,
			duration: DEFAULT_CREDENTIAL_DURATION,
			partition: DEFAULT_PARTITION.into(),
		}
	}

	/// Validates the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.role.is_empty() {
			return Err(ConfigError::MissingField { field: "role" });
		}
		if self.partition.is_empty() {
			return Err(ConfigError::MissingField { field: "partition" });
		}

		validate_credential_duration(self.duration)
	}

	/// Role ARN assumed in `account_id`.
	pub fn role_arn(&self, account_id: &AccountId) -> String {
		format!("arn:{}:iam::{account_id}:role/{}", self.partition, self.role)
	}
}

/// Builder for [`CrossAccountConfig`].
#[derive(Clone, Debug)]
pub struct CrossAccountConfigBuilder {
	base_account: AccountId,
	role: String,
	external_id: Option<String>,
	duration: Duration,
	partition: String,
}
impl CrossAccountConfigBuilder {
	/// Sets the external id.
	pub fn external_id(mut self, external_id: impl Into<String>) -> Self {
		self.external_id = Some(external_id.into());

		self
	}

	/// Sets the requested credential lifetime.
	pub fn duration(mut self, duration: Duration) -> Self {
		self.duration = duration;

		self
	}

	/// Sets the ARN partition (`aws`, `aws-cn`, `aws-us-gov`).
	pub fn partition(mut self, partition: impl Into<String>) -> Self {
		self.partition = partition.into();

		self
	}

	/// Builds and validates the configuration.
	pub fn build(self) -> Result<CrossAccountConfig, ConfigError> {
		let config = CrossAccountConfig {
			base_account: self.base_account,
			role: self.role,
			external_id: self.external_id,
			duration: self.duration,
			partition: self.partition,
		};

		config.validate()?;

		Ok(config)
	}
}

/// Execution engine settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
	/// Maximum number of accounts processed concurrently.
	#[serde(default = "default_max_workers")]
	pub max_workers: usize,
}
impl RunnerConfig {
	/// Validates the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_workers == 0 {
			return Err(ConfigError::NoWorkers);
		}

		Ok(())
	}
}
impl Default for RunnerConfig {
	fn default() -> Self {
		Self { max_workers: DEFAULT_MAX_WORKERS }
	}
}

fn validate_credential_duration(duration: Duration) -> Result<(), ConfigError> {
	if !(MIN_CREDENTIAL_DURATION..=MAX_CREDENTIAL_DURATION).contains(&duration) {
		return Err(ConfigError::DurationOutOfRange {
			min: MIN_CREDENTIAL_DURATION.whole_seconds(),
			max: MAX_CREDENTIAL_DURATION.whole_seconds(),
			actual: duration.whole_seconds(),
		});
	}

	Ok(())
}

fn default_credential_duration() -> Duration {
	DEFAULT_CREDENTIAL_DURATION
}

fn default_assertion_duration() -> Duration {
	DEFAULT_ASSERTION_DURATION
}

fn default_verify_tls() -> bool {
	true
}

fn default_partition() -> String {
	DEFAULT_PARTITION.into()
}

fn default_max_workers() -> usize {
	DEFAULT_MAX_WORKERS
}

// Durations are written as whole seconds in config documents.
mod seconds {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(duration.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet;

	fn idp_url() -> Url {
		Url::parse("https://adfs.example.com/adfs/ls/IdpInitiatedSignOn.aspx")
			.expect("IdP URL fixture should parse.")
	}

	#[test]
	fn saml_builder_applies_defaults() {
		let config = SamlConfig::builder()
			.role("Admin")
			.url(idp_url())
			.header("User-Agent", "account-runner")
			.build()
			.expect("Config should build.");

		assert_eq!(config.duration, Duration::hours(1));
		assert_eq!(config.assertion_duration, Duration::minutes(5));
		assert!(config.verify_tls);
		assert_eq!(config.idp_request().headers.get("User-Agent").map(String::as_str), Some("account-runner"));
	}

	#[test]
	fn saml_builder_rejects_missing_fields_and_bad_durations() {
		assert!(matches!(
			SamlConfig::builder().url(idp_url()).build(),
			Err(ConfigError::MissingField { field: "role" })
		));
		assert!(matches!(
			SamlConfig::builder().role("Admin").build(),
			Err(ConfigError::MissingField { field: "url" })
		));
		assert!(matches!(
			SamlConfig::builder().role("Admin").url(idp_url()).duration(Duration::seconds(899)).build(),
			Err(ConfigError::DurationOutOfRange { actual: 899, .. })
		));
		assert!(matches!(
			SamlConfig::builder()
				.role("Admin")
				.url(idp_url())
				.assertion_duration(Duration::seconds(-1))
				.build(),
			Err(ConfigError::NegativeDuration { field: "assertion" })
		));

		SamlConfig::builder()
			.role("Admin")
			.url(idp_url())
			.duration(MAX_CREDENTIAL_DURATION)
			.assertion_duration(Duration::ZERO)
			.build()
			.expect("Boundary values should be accepted.");
	}

	#[test]
	fn saml_config_deserializes_with_defaults() {
		let config: SamlConfig = serde_json::from_str(
			r#"{"role":"Admin","url":"https://idp.example.com/sso","method":"POST","duration":7200}"#,
		)
		.expect("Config should deserialize.");

		assert_eq!(config.method, IdpMethod::Post);
		assert_eq!(config.duration, Duration::hours(2));
		assert_eq!(config.assertion_duration, DEFAULT_ASSERTION_DURATION);
		assert_eq!(config.auth, IdpAuth::None);
		config.validate().expect("Deserialized config should validate.");
	}

	#[test]
	fn cross_account_arns_follow_partition() {
		let config = CrossAccountConfig::builder(_preludet::account("111111111111"), "Auditor")
			.external_id("ext-123")
			.build()
			.expect("Config should build.");

		assert_eq!(config.role_arn(&_preludet::account("222222222222")), "arn:aws:iam::222222222222:role/Auditor");

		let china = CrossAccountConfig::builder(_preludet::account("111111111111"), "Auditor")
			.partition("aws-cn")
			.build()
			.expect("Config should build.");

		assert_eq!(china.role_arn(&_preludet::account("3")), "arn:aws-cn:iam::3:role/Auditor");
		assert!(matches!(
			CrossAccountConfig::builder(_preludet::account("1"), "").build(),
			Err(ConfigError::MissingField { field: "role" })
		));
	}

	#[test]
	fn runner_config_needs_a_worker() {
		assert_eq!(RunnerConfig::default().max_workers, 10);
		assert!(matches!(RunnerConfig { max_workers: 0 }.validate(), Err(ConfigError::NoWorkers)));

		let parsed: RunnerConfig = serde_json::from_str("{}").expect("Empty config should parse.");

		assert_eq!(parsed, RunnerConfig::default());
	}
}
