//! Sessions obtained by assuming a role from a base account.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	account::AccountId,
	cache::{Clock, SystemClock},
	config::CrossAccountConfig,
	credential::Credentials,
	obs::{self, CredentialFlow, FlowOutcome, FlowSpan},
	session::{CredentialCache, CredentialFuture, CredentialSource, SessionFuture, SessionProvider},
	sts::{AssumeRoleRequest, StsClient},
};

const KIND: CredentialFlow = CredentialFlow::CrossAccount;

/// Assumes the configured role in a target account using the base account's session.
///
/// The base session comes from another [`SessionProvider`], which may itself be cached or
/// federated; each hop is cached at its own granularity.
pub struct CrossAccountExchange {
	config: CrossAccountConfig,
	base: Arc<dyn SessionProvider>,
	sts: Arc<dyn StsClient>,
}
impl CrossAccountExchange {
	/// Validates `config` and wires the exchange to its base provider and STS transport.
	pub fn new(
		config: CrossAccountConfig,
		base: Arc<dyn SessionProvider>,
		sts: Arc<dyn StsClient>,
	) -> Result<Self> {
		config.validate()?;

		Ok(Self { config, base, sts })
	}

	/// Configuration this exchange was built from.
	pub fn config(&self) -> &CrossAccountConfig {
		&self.config
	}

	async fn exchange(&self, account_id: &AccountId) -> Result<Credentials> {
		let base = self.base.session(&self.config.base_account).await?;
		let role_arn = self.config.role_arn(account_id);

		tracing::info!(%role_arn, base_account = %self.config.base_account, "assuming role");

		let request = AssumeRoleRequest {
			role_arn: role_arn.clone(),
			role_session_name: session_name(),
			duration: self.config.duration,
			external_id: self.config.external_id.clone(),
		};

		self.sts.assume_role(&base, request).await?.ok_or(Error::AssumeRole { role_arn })
	}
}
impl CredentialSource for CrossAccountExchange {
	fn role(&self) -> &str {
		&self.config.role
	}

	fn duration(&self) -> Duration {
		self.config.duration
	}

	fn credentials<'a>(&'a self, account_id: &'a AccountId) -> CredentialFuture<'a> {
		let span = FlowSpan::new(KIND, "assume_role");

		obs::record_credential_outcome(KIND, FlowOutcome::Attempt);

		Box::pin(span.instrument(async move {
			let result = self.exchange(account_id).await;

			obs::record_credential_outcome(KIND, FlowOutcome::of(&result));

			result
		}))
	}
}
impl Debug for CrossAccountExchange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CrossAccountExchange").field("config", &self.config).finish_non_exhaustive()
	}
}

/// Session provider chaining a role assumption onto a base provider, cached at half the
/// credential lifetime.
#[derive(Debug)]
pub struct CrossAccountSessionProvider {
	cache: CredentialCache<CrossAccountExchange>,
}
impl CrossAccountSessionProvider {
	/// Builds a provider over a base provider and a custom STS transport.
	pub fn new(
		config: CrossAccountConfig,
		base: Arc<dyn SessionProvider>,
		sts: Arc<dyn StsClient>,
	) -> Result<Self> {
		Self::new_with_clock(config, base, sts, Arc::new(SystemClock))
	}

	/// Same as [`CrossAccountSessionProvider::new`], evaluating expiry against `clock`.
	pub fn new_with_clock(
		config: CrossAccountConfig,
		base: Arc<dyn SessionProvider>,
		sts: Arc<dyn StsClient>,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		let exchange = CrossAccountExchange::new(config, base, sts)?;

		Ok(Self { cache: CredentialCache::new(exchange).with_clock(clock) })
	}

	/// Builds a provider that calls STS through the AWS SDK.
	#[cfg(feature = "aws")]
	pub fn from_config(config: CrossAccountConfig, base: Arc<dyn SessionProvider>) -> Result<Self> {
		Self::new(config, base, Arc::new(crate::sts::SdkStsClient::new()))
	}

	/// Credential cache backing this provider.
	pub fn cache(&self) -> &CredentialCache<CrossAccountExchange> {
		&self.cache
	}
}
impl SessionProvider for CrossAccountSessionProvider {
	fn session<'a>(&'a self, account_id: &'a AccountId) -> SessionFuture<'a> {
		self.cache.session(account_id)
	}
}

fn session_name() -> String {
	format!("AccountRunner{}", rand::rng().random_range(10_000..=99_999))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{self, RecordingSts, StaticSessionProvider};

	fn config() -> CrossAccountConfig {
		CrossAccountConfig::builder(_preludet::account("111111111111"), "Auditor")
			.external_id("ext-123")
			.build()
			.expect("Config fixture should build.")
	}

	#[test]
	fn session_names_are_bounded() {
		for _ in 0..100 {
			let name = session_name();
			let suffix: u32 = name
				.strip_prefix("AccountRunner")
				.and_then(|digits| digits.parse().ok())
				.expect("Session name should end in digits.");

			assert!((10_000..=99_999).contains(&suffix), "unexpected session name {name}");
		}
	}

	#[tokio::test]
	async fn base_session_is_chained_into_assume_role() {
		let base = Arc::new(StaticSessionProvider::default());
		let sts = Arc::new(RecordingSts::default());
		let provider = CrossAccountSessionProvider::new(config(), base.clone(), sts.clone())
			.expect("Provider should build.");
		let target = _preludet::account("222222222222");
		let session = provider.session(&target).await.expect("Role chaining should succeed.");

		assert_eq!(session.account_id(), &target);
		assert_eq!(base.calls.lock().as_slice(), [_preludet::account("111111111111")]);

		let requests = sts.assume_role.lock();

		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].role_arn, "arn:aws:iam::222222222222:role/Auditor");
		assert_eq!(requests[0].external_id.as_deref(), Some("ext-123"));
		assert!(requests[0].role_session_name.starts_with("AccountRunner"));
	}

	#[tokio::test]
	async fn empty_result_is_an_assume_role_error() {
		let sts = Arc::new(RecordingSts { empty: true, ..Default::default() });
		let provider = CrossAccountSessionProvider::new(
			config(),
			Arc::new(StaticSessionProvider::default()),
			sts,
		)
		.expect("Provider should build.");

		assert!(matches!(
			provider.session(&_preludet::account("222222222222")).await,
			Err(Error::AssumeRole { .. })
		));
	}
}
