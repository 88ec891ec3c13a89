//! [`IdpClient`] backed by `reqwest`.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	idp::{IdpAuth, IdpClient, IdpFuture, IdpMethod, IdpRequest, IdpResponse},
};

/// Thin wrapper around [`ReqwestClient`] so identity provider calls share one connection pool.
#[derive(Clone, Debug, Default)]
pub struct ReqwestIdpClient(pub ReqwestClient);
impl ReqwestIdpClient {
	/// Builds a client; `verify_tls = false` accepts any server certificate.
	pub fn new(verify_tls: bool) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().danger_accept_invalid_certs(!verify_tls).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl IdpClient for ReqwestIdpClient {
	fn send<'a>(&'a self, request: &'a IdpRequest) -> IdpFuture<'a> {
		Box::pin(async move {
			let mut builder = match request.method {
				IdpMethod::Get => self.0.get(request.url.clone()),
				IdpMethod::Post => {
					let mut form = vec![("AuthMethod", "FormsAuthentication")];

					if let IdpAuth::Basic { username, password } = &request.auth {
						form.push(("UserName", username.as_str()));
						form.push(("Password", password.expose()));
					}

					self.0.post(request.url.clone()).form(&form)
				},
			};

			for (name, value) in &request.headers {
				builder = builder.header(name, value);
			}

			if let IdpAuth::Basic { username, password } = &request.auth {
				builder = builder.basic_auth(username, Some(password.expose()));
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.text().await.map_err(TransportError::from)?;

			Ok(IdpResponse { status, body })
		})
	}
}
