//! [`StsClient`] backed by `aws-sdk-sts`.

// crates.io
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::{Client, error::DisplayErrorContext, types::Credentials as SdkCredentials};
// self
use crate::{
	_prelude::*,
	credential::Credentials,
	error::StsError,
	session::Session,
	sts::{AssumeRoleRequest, AssumeRoleWithSamlRequest, StsClient, StsFuture},
};

/// STS client that builds an SDK client per call from the relevant credentials.
#[derive(Clone, Debug, Default)]
pub struct SdkStsClient {
	region: Option<String>,
}
impl SdkStsClient {
	/// Creates a client that resolves the region from the environment.
	pub fn new() -> Self {
		Self::default()
	}

	/// Pins every STS call to `region`.
	pub fn with_region(mut self, region: impl Into<String>) -> Self {
		self.region = Some(region.into());

		self
	}

	fn convert(credentials: Option<&SdkCredentials>) -> Result<Option<Credentials>> {
		let Some(credentials) = credentials else { return Ok(None) };
		let expires_at = OffsetDateTime::from_unix_timestamp(credentials.expiration().secs())
			.map_err(|e| StsError::Service {
				operation: "Credentials",
				message: format!("expiration out of range: {e}"),
			})?;
		let credentials = Credentials::builder()
			.access_key_id(credentials.access_key_id())
			.secret_access_key(credentials.secret_access_key())
			.session_token(credentials.session_token())
			.expires_at(expires_at)
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Some(credentials))
	}
}
impl StsClient for SdkStsClient {
	fn assume_role<'a>(&'a self, base: &'a Session, request: AssumeRoleRequest) -> StsFuture<'a> {
		Box::pin(async move {
			let config = base.sdk_config(self.region.as_deref()).await;
			let output = Client::new(&config)
				.assume_role()
				.role_arn(request.role_arn)
				.role_session_name(request.role_session_name)
				.duration_seconds(duration_seconds(request.duration))
				.set_external_id(request.external_id)
				.send()
				.await
				.map_err(|e| StsError::Service {
					operation: "AssumeRole",
					message: DisplayErrorContext(&e).to_string(),
				})?;

			Self::convert(output.credentials())
		})
	}

	fn assume_role_with_saml<'a>(&'a self, request: AssumeRoleWithSamlRequest) -> StsFuture<'a> {
		Box::pin(async move {
			let mut loader = aws_config::defaults(BehaviorVersion::latest()).no_credentials();

			if let Some(region) = &self.region {
				loader = loader.region(Region::new(region.clone()));
			}

			let config = loader.load().await;
			let output = Client::new(&config)
				.assume_role_with_saml()
				.role_arn(request.role_arn)
				.principal_arn(request.principal_arn)
				.saml_assertion(request.saml_assertion.expose())
				.duration_seconds(duration_seconds(request.duration))
				.send()
				.await
				.map_err(|e| StsError::Service {
					operation: "AssumeRoleWithSAML",
					message: DisplayErrorContext(&e).to_string(),
				})?;

			Self::convert(output.credentials())
		})
	}
}

fn duration_seconds(duration: Duration) -> i32 {
	duration.whole_seconds().clamp(0, i64::from(i32::MAX)) as i32
}
