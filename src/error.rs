//! Crate-level error types shared by caches, session providers, and the runner.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error accepted from commands and key functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error surfaced by providers, caches, and the runner.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Cache persistence failure.
	#[error(transparent)]
	Cache(#[from] CacheError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Identity provider failure while fetching or reading a SAML assertion.
	#[error(transparent)]
	Idp(#[from] IdpError),
	/// Security token service call failed.
	#[error(transparent)]
	Sts(#[from] StsError),
	/// Transport failure (DNS, TCP, TLS, IO).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The SAML assertion does not grant exactly one matching role.
	#[error("Cannot find {account_id}/{role} in the SAML assertion.")]
	InvalidRole {
		/// Account the role was requested for.
		account_id: String,
		/// Role name (not ARN) that was requested.
		role: String,
	},
	/// The role exchange returned no credentials.
	#[error("Cannot assume role: {role_arn}.")]
	AssumeRole {
		/// Role ARN that could not be assumed.
		role_arn: String,
	},
	/// The key function misbehaved for an account reference.
	#[error("Invalid account id: {reason}.")]
	InvalidAccountId {
		/// Description of what the key function did wrong.
		reason: String,
	},
	/// The command failed while executing against an account.
	#[error("{0}")]
	Command(#[source] BoxError),
	/// The command panicked while executing against an account.
	#[error("Command panicked: {message}.")]
	Panicked {
		/// Panic payload rendered as text.
		message: String,
	},
}
impl Error {
	/// Wraps a command failure.
	pub fn command(src: impl Into<BoxError>) -> Self {
		Self::Command(src.into())
	}

	pub(crate) fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
		let message = payload
			.downcast_ref::<&str>()
			.map(|s| (*s).to_owned())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "non-string panic payload".into());

		Self::Panicked { message }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required field was not supplied.
	#[error("Missing required field `{field}`.")]
	MissingField {
		/// Field name.
		field: &'static str,
	},
	/// Requested credential duration is outside what STS accepts.
	#[error("Credential duration must be between {min} and {max} seconds, got {actual}.")]
	DurationOutOfRange {
		/// Lower bound in seconds.
		min: i64,
		/// Upper bound in seconds.
		max: i64,
		/// Supplied value in seconds.
		actual: i64,
	},
	/// A cache duration was negative.
	#[error("The {field} duration must not be negative.")]
	NegativeDuration {
		/// Which duration failed validation.
		field: &'static str,
	},
	/// Worker pool must contain at least one worker.
	#[error("The runner needs at least one worker.")]
	NoWorkers,
	/// Regional commands need at least one region.
	#[error("No regions specified.")]
	NoRegions,
	/// A concurrency limit must admit at least one caller.
	#[error("The concurrency limit must allow at least one concurrent call.")]
	ZeroConcurrencyLimit,
	/// Identifier validation failed.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::account::IdentifierError),
	/// Credential builder validation failed.
	#[error("Unable to build credentials.")]
	CredentialBuild(#[from] crate::credential::CredentialsBuilderError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Identity provider failures.
#[derive(Debug, ThisError)]
pub enum IdpError {
	/// The IdP rejected the supplied credentials.
	#[error("Could not authenticate with the identity provider.")]
	AccessDenied,
	/// The IdP answered, but not with a usable SAML assertion.
	#[error("Invalid identity provider response: {message}.")]
	InvalidResponse {
		/// What was wrong with the response.
		message: String,
	},
}
impl IdpError {
	/// Builds an [`IdpError::InvalidResponse`].
	pub fn invalid_response(message: impl Into<String>) -> Self {
		Self::InvalidResponse { message: message.into() }
	}
}

/// Cache persistence failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Filesystem failure.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Security token service failures.
#[derive(Debug, ThisError)]
pub enum StsError {
	/// The service rejected or failed the call.
	#[error("STS {operation} failed: {message}.")]
	Service {
		/// STS operation name.
		operation: &'static str,
		/// Service-supplied error rendering.
		message: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn cache_error_converts_into_crate_error_with_source() {
		let cache_error = CacheError::Backend { message: "disk full".into() };
		let error: Error = cache_error.clone().into();

		assert!(matches!(error, Error::Cache(_)));
		assert_eq!(error.to_string(), cache_error.to_string());
	}

	#[test]
	fn command_errors_keep_their_source() {
		let error = Error::command("bucket listing failed");

		assert_eq!(error.to_string(), "bucket listing failed");
		assert!(StdError::source(&error).is_some());
	}

	#[test]
	fn panic_payloads_render_as_text() {
		let static_payload: Box<dyn std::any::Any + Send> = Box::new("boom");
		let owned_payload: Box<dyn std::any::Any + Send> = Box::new(String::from("kaboom"));

		assert_eq!(Error::panicked(&*static_payload).to_string(), "Command panicked: boom.");
		assert_eq!(
			Error::panicked(&*owned_payload).to_string(),
			"Command panicked: kaboom."
		);
	}
}
