//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration as StdDuration,
};
// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use parking_lot::Mutex;
// self
use account_runner::{
	account::AccountId,
	credential::Credentials,
	session::{Session, SessionFuture, SessionProvider},
	sts::{AssumeRoleRequest, AssumeRoleWithSamlRequest, StsClient, StsFuture},
};

pub fn account(id: &str) -> AccountId {
	AccountId::new(id).expect("Account fixture should be valid.")
}

pub fn credentials(access_key_id: &str) -> Credentials {
	Credentials::builder()
		.access_key_id(access_key_id)
		.secret_access_key("fixture-secret")
		.session_token("fixture-token")
		.build()
		.expect("Credential fixture should build.")
}

/// Base64 assertion granting the provided raw `role,principal` attribute values.
pub fn encoded_assertion(values: &[&str]) -> String {
	let values: String = values
		.iter()
		.map(|value| format!("<saml2:AttributeValue>{value}</saml2:AttributeValue>"))
		.collect();

	STANDARD.encode(format!(
		r#"<saml2p:Response xmlns:saml2p="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion"><saml2:Assertion><saml2:AttributeStatement><saml2:Attribute Name="https://aws.amazon.com/SAML/Attributes/Role">{values}</saml2:Attribute></saml2:AttributeStatement></saml2:Assertion></saml2p:Response>"#
	))
}

/// HTML login result page embedding `assertion`.
pub fn saml_page(assertion: &str) -> String {
	format!(
		r#"<html><body><form method="POST" action="https://signin.aws.amazon.com/saml"><input type="hidden" name="SAMLResponse" value="{assertion}" /><noscript><input type="submit" value="Continue" /></noscript></form></body></html>"#
	)
}

/// STS double that records every call and mints sequentially numbered credentials.
#[derive(Debug, Default)]
pub struct FakeSts {
	pub assumed: Mutex<Vec<(AccountId, AssumeRoleRequest)>>,
	pub federated: Mutex<Vec<AssumeRoleWithSamlRequest>>,
	pub empty: bool,
	issued: AtomicUsize,
}
impl FakeSts {
	pub fn empty() -> Self {
		Self { empty: true, ..Default::default() }
	}

	fn issue(&self, prefix: &str) -> Option<Credentials> {
		let serial = self.issued.fetch_add(1, Ordering::SeqCst);

		if self.empty { None } else { Some(credentials(&format!("{prefix}{serial}"))) }
	}
}
impl StsClient for FakeSts {
	fn assume_role<'a>(&'a self, base: &'a Session, request: AssumeRoleRequest) -> StsFuture<'a> {
		Box::pin(async move {
			self.assumed.lock().push((base.account_id().clone(), request));

			Ok(self.issue("ASIAROLE"))
		})
	}

	fn assume_role_with_saml<'a>(&'a self, request: AssumeRoleWithSamlRequest) -> StsFuture<'a> {
		Box::pin(async move {
			self.federated.lock().push(request);

			Ok(self.issue("ASIASAML"))
		})
	}
}

/// Session provider returning temporary sessions, optionally slowed down or failing for some
/// accounts.
#[derive(Debug, Default)]
pub struct StaticProvider {
	pub calls: Mutex<Vec<AccountId>>,
	pub failing: Vec<String>,
	pub delay: Option<StdDuration>,
}
impl StaticProvider {
	pub fn failing_for(accounts: &[&str]) -> Self {
		Self { failing: accounts.iter().map(|id| (*id).to_owned()).collect(), ..Default::default() }
	}
}
impl SessionProvider for StaticProvider {
	fn session<'a>(&'a self, account_id: &'a AccountId) -> SessionFuture<'a> {
		Box::pin(async move {
			self.calls.lock().push(account_id.clone());

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if self.failing.iter().any(|id| id == account_id.as_str()) {
				return Err(account_runner::error::Error::command(format!(
					"no credentials for {account_id}"
				)));
			}

			Ok(Session::temporary(account_id.clone(), credentials(&format!("AKIA{account_id}"))))
		})
	}
}
