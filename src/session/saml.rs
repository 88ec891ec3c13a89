//! SAML federated sessions.

// self
use crate::{
	_prelude::*,
	account::AccountId,
	cache::{Clock, ExpiringValue, SystemClock},
	config::SamlConfig,
	credential::{Credentials, Secret},
	idp::{self, IdpClient},
	obs::{self, CredentialFlow, FlowOutcome, FlowSpan},
	session::{CredentialCache, CredentialFuture, CredentialSource, SessionFuture, SessionProvider},
	sts::{AssumeRoleWithSamlRequest, StsClient},
};

/// Fetches assertions from the identity provider and exchanges them for role credentials.
///
/// One assertion grants many account/role pairs, so it is cached on its own (shorter)
/// schedule and reused across exchanges.
pub struct SamlExchange {
	config: SamlConfig,
	sts: Arc<dyn StsClient>,
	assertion: ExpiringValue<Secret>,
}
impl SamlExchange {
	/// Validates `config` and wires the exchange to the provided transports.
	pub fn new(
		config: SamlConfig,
		idp: Arc<dyn IdpClient>,
		sts: Arc<dyn StsClient>,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		config.validate()?;

		let request = config.idp_request();
		let assertion = ExpiringValue::new(config.assertion_duration, move || {
			let client = idp.clone();
			let request = request.clone();

			async move {
				const KIND: CredentialFlow = CredentialFlow::SamlAssertion;

				obs::record_credential_outcome(KIND, FlowOutcome::Attempt);

				let result = FlowSpan::new(KIND, "fetch_assertion")
					.instrument(idp::fetch_assertion(&*client, &request))
					.await;

				obs::record_credential_outcome(KIND, FlowOutcome::of(&result));

				result
			}
		})
		.with_clock(clock);

		Ok(Self { config, sts, assertion })
	}

	/// Returns the cached assertion, fetching a new one when stale or when `refresh` is set.
	pub async fn assertion(&self, refresh: bool) -> Result<Secret> {
		self.assertion.value(refresh).await
	}

	/// Configuration this exchange was built from.
	pub fn config(&self) -> &SamlConfig {
		&self.config
	}

	async fn exchange(&self, account_id: &AccountId) -> Result<Credentials> {
		let assertion = self.assertion(false).await?;
		let pair = idp::select_role(assertion.expose(), account_id, &self.config.role)?;

		tracing::info!(
			role_arn = %pair.role_arn,
			principal_arn = %pair.principal_arn,
			"assuming role with SAML"
		);

		let request = AssumeRoleWithSamlRequest {
			role_arn: pair.role_arn.clone(),
			principal_arn: pair.principal_arn,
			saml_assertion: assertion,
			duration: self.config.duration,
		};

		self.sts
			.assume_role_with_saml(request)
			.await?
			.ok_or(Error::AssumeRole { role_arn: pair.role_arn })
	}
}
impl CredentialSource for SamlExchange {
	fn role(&self) -> &str {
		&self.config.role
	}

	fn duration(&self) -> Duration {
		self.config.duration
	}

	fn credentials<'a>(&'a self, account_id: &'a AccountId) -> CredentialFuture<'a> {
		const KIND: CredentialFlow = CredentialFlow::SamlExchange;

		let span = FlowSpan::new(KIND, "assume_role_with_saml");

		obs::record_credential_outcome(KIND, FlowOutcome::Attempt);

		Box::pin(span.instrument(async move {
			let result = self.exchange(account_id).await;

			obs::record_credential_outcome(KIND, FlowOutcome::of(&result));

			result
		}))
	}
}
impl Debug for SamlExchange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SamlExchange")
			.field("config", &self.config)
			.field("assertion", &self.assertion)
			.finish_non_exhaustive()
	}
}

/// Session provider federating through a SAML identity provider, cached at half the
/// credential lifetime.
#[derive(Debug)]
pub struct SamlSessionProvider {
	cache: CredentialCache<SamlExchange>,
}
impl SamlSessionProvider {
	/// Builds a provider over custom identity provider and STS transports.
	pub fn new(config: SamlConfig, idp: Arc<dyn IdpClient>, sts: Arc<dyn StsClient>) -> Result<Self> {
		Self::new_with_clock(config, idp, sts, Arc::new(SystemClock))
	}

	/// Same as [`SamlSessionProvider::new`], evaluating every expiry against `clock`.
	pub fn new_with_clock(
		config: SamlConfig,
		idp: Arc<dyn IdpClient>,
		sts: Arc<dyn StsClient>,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		let exchange = SamlExchange::new(config, idp, sts, clock.clone())?;

		Ok(Self { cache: CredentialCache::new(exchange).with_clock(clock) })
	}

	/// Builds a provider using reqwest for the identity provider and the AWS SDK for STS.
	#[cfg(all(feature = "aws", feature = "reqwest"))]
	pub fn from_config(config: SamlConfig) -> Result<Self> {
		let idp = crate::idp::ReqwestIdpClient::new(config.verify_tls)?;

		Self::new(config, Arc::new(idp), Arc::new(crate::sts::SdkStsClient::new()))
	}

	/// Returns the cached assertion, fetching a new one when stale or when `refresh` is set.
	pub async fn assertion(&self, refresh: bool) -> Result<Secret> {
		self.cache.source().assertion(refresh).await
	}

	/// Credential cache backing this provider.
	pub fn cache(&self) -> &CredentialCache<SamlExchange> {
		&self.cache
	}
}
impl SessionProvider for SamlSessionProvider {
	fn session<'a>(&'a self, account_id: &'a AccountId) -> SessionFuture<'a> {
		self.cache.session(account_id)
	}
}
