//! Identity provider transport and SAML assertion handling.
//!
//! [`IdpClient`] is the only dependency the federated provider has on an HTTP stack. The
//! bundled [`ReqwestIdpClient`] covers anonymous and basic authentication (optionally posting
//! an ADFS-style login form); schemes such as digest or NTLM plug in through a custom
//! implementation.

pub mod assertion;
#[cfg(feature = "reqwest")] pub mod http;

pub use assertion::*;
#[cfg(feature = "reqwest")] pub use http::ReqwestIdpClient;

// self
use crate::{_prelude::*, credential::Secret, error::IdpError};

/// Form field that carries the assertion in an IdP response page.
pub const SAML_RESPONSE_FIELD: &str = "SAMLResponse";

/// Boxed future returned by [`IdpClient::send`].
pub type IdpFuture<'a> = Pin<Box<dyn Future<Output = Result<IdpResponse>> + 'a + Send>>;

/// Executes identity provider requests.
pub trait IdpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and returns the raw response; status handling is left to the caller.
	fn send<'a>(&'a self, request: &'a IdpRequest) -> IdpFuture<'a>;
}

/// HTTP method used to authenticate with the identity provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdpMethod {
	/// Plain `GET` with the configured authentication attached.
	#[default]
	Get,
	/// Form `POST` carrying `UserName`, `Password`, and `AuthMethod=FormsAuthentication`.
	Post,
}

/// Authentication attached to identity provider requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdpAuth {
	/// No authentication.
	#[default]
	None,
	/// HTTP basic authentication.
	Basic {
		/// Login name.
		username: String,
		/// Password; never logged.
		password: Secret,
	},
}

/// Fully described identity provider request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdpRequest {
	/// Sign-on endpoint.
	pub url: Url,
	/// HTTP method.
	pub method: IdpMethod,
	/// Extra headers sent with the request.
	pub headers: BTreeMap<String, String>,
	/// Authentication scheme.
	pub auth: IdpAuth,
}

/// Raw identity provider response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body decoded as text.
	pub body: String,
}

/// Requests a fresh assertion from the identity provider.
///
/// A `401` maps to [`IdpError::AccessDenied`]; any other non-2xx status, or a page without
/// exactly one `SAMLResponse` field, maps to [`IdpError::InvalidResponse`].
pub async fn fetch_assertion<C>(client: &C, request: &IdpRequest) -> Result<Secret>
where
	C: ?Sized + IdpClient,
{
	tracing::info!(url = %request.url, "fetching SAML assertion");

	let response = client.send(request).await?;

	if response.status == 401 {
		return Err(IdpError::AccessDenied.into());
	}
	if !(200..300).contains(&response.status) {
		return Err(IdpError::invalid_response(format!(
			"{} response from {}",
			response.status, request.url
		))
		.into());
	}

	Ok(Secret::new(extract_saml_response(&response.body)?))
}

/// Returns the value of the single `<input name="SAMLResponse">` field in `html`.
pub fn extract_saml_response(html: &str) -> Result<String, IdpError> {
	let mut values = input_tags(html)
		.into_iter()
		.filter(|attributes| attributes.get("name").map(String::as_str) == Some(SAML_RESPONSE_FIELD))
		.map(|mut attributes| attributes.remove("value").unwrap_or_default());

	match (values.next(), values.next()) {
		(Some(value), None) => Ok(value),
		_ => Err(IdpError::invalid_response("Cannot extract SAML assertion from response")),
	}
}

// Attribute maps (lowercased names, unescaped values) for every `<input>` tag in `html`.
fn input_tags(html: &str) -> Vec<BTreeMap<String, String>> {
	let lowered = html.to_ascii_lowercase();
	let mut tags = Vec::new();
	let mut cursor = 0;

	while let Some(offset) = lowered[cursor..].find("<input") {
		let start = cursor + offset + "<input".len();

		cursor = start;

		if html[start..].starts_with(|c: char| c.is_ascii_alphanumeric()) {
			continue;
		}

		let (attributes, consumed) = parse_attributes(&html[start..]);

		tags.push(attributes);
		cursor += consumed;
	}

	tags
}

fn parse_attributes(tag: &str) -> (BTreeMap<String, String>, usize) {
	let bytes = tag.as_bytes();
	let mut attributes = BTreeMap::new();
	let mut i = 0;

	loop {
		while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
			i += 1;
		}
		if i >= bytes.len() || bytes[i] == b'>' {
			return (attributes, i);
		}

		let name_start = i;

		while i < bytes.len() && !matches!(bytes[i], b'=' | b'>' | b'/') && !bytes[i].is_ascii_whitespace() {
			i += 1;
		}

		let name = tag[name_start..i].to_ascii_lowercase();

		while i < bytes.len() && bytes[i].is_ascii_whitespace() {
			i += 1;
		}

		let mut value = String::new();

		if i < bytes.len() && bytes[i] == b'=' {
			i += 1;

			while i < bytes.len() && bytes[i].is_ascii_whitespace() {
				i += 1;
			}

			let raw = match bytes.get(i) {
				Some(&quote @ (b'"' | b'\'')) => {
					let value_start = i + 1;
					let value_end = tag[value_start..]
						.find(quote as char)
						.map_or(bytes.len(), |end| value_start + end);

					i = (value_end + 1).min(bytes.len());

					&tag[value_start..value_end]
				},
				_ => {
					let value_start = i;

					while i < bytes.len() && bytes[i] != b'>' && !bytes[i].is_ascii_whitespace() {
						i += 1;
					}

					&tag[value_start..i]
				},
			};

			value = quick_xml::escape::unescape(raw).map_or_else(|_| raw.to_owned(), |v| v.into_owned());
		}
		if !name.is_empty() {
			attributes.entry(name).or_insert(value);
		}
	}
}
