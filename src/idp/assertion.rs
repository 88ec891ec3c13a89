//! SAML assertion decoding and role selection.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use quick_xml::{Reader, events::Event};
// self
use crate::{_prelude::*, account::AccountId, error::IdpError};

/// SAML attribute listing the roles an assertion grants.
pub const ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

const PROVIDER_SEGMENT: &str = ":saml-provider/";

/// Role ARN plus the SAML provider ARN that vouches for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RolePair {
	/// Role to assume.
	pub role_arn: String,
	/// SAML provider principal.
	pub principal_arn: String,
}
impl RolePair {
	/// Parses a `role_arn,principal_arn` attribute value.
	///
	/// Identity providers emit the two ARNs in either order; the member containing
	/// `:saml-provider/` is taken as the principal.
	pub fn parse(value: &str) -> Result<Self, IdpError> {
		let mut parts = value.split(',').map(str::trim);
		let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next()) else {
			return Err(IdpError::invalid_response(format!("Malformed role attribute value {value:?}")));
		};
		let (role_arn, principal_arn) =
			if first.contains(PROVIDER_SEGMENT) { (second, first) } else { (first, second) };

		Ok(Self { role_arn: role_arn.to_owned(), principal_arn: principal_arn.to_owned() })
	}

	/// Returns `true` if the role ARN names `role` in `account_id`.
	pub fn matches(&self, account_id: &str, role: &str) -> bool {
		self.role_arn.ends_with(&format!(":{account_id}:role/{role}"))
	}
}

/// Decodes a base64 assertion and returns every role pair it grants.
pub fn role_pairs(assertion: &str) -> Result<Vec<RolePair>, IdpError> {
	let cleaned: String = assertion.chars().filter(|c| !c.is_ascii_whitespace()).collect();
	let decoded = STANDARD
		.decode(cleaned)
		.map_err(|e| IdpError::invalid_response(format!("SAML assertion is not base64: {e}")))?;
	let xml = String::from_utf8(decoded)
		.map_err(|e| IdpError::invalid_response(format!("SAML assertion is not UTF-8: {e}")))?;

	role_values(&xml)?.iter().map(|value| RolePair::parse(value)).collect()
}

/// Picks the single role pair granting `role` in `account_id`.
///
/// Zero or several candidates fail with [`Error::InvalidRole`]; ambiguity is never resolved
/// by picking one.
pub fn select_role(assertion: &str, account_id: &AccountId, role: &str) -> Result<RolePair> {
	let pairs = role_pairs(assertion)?;

	tracing::info!(?pairs, "roles in SAML response");

	let mut matching = pairs.into_iter().filter(|pair| pair.matches(account_id.as_str(), role));

	match (matching.next(), matching.next()) {
		(Some(pair), None) => Ok(pair),
		_ => Err(Error::InvalidRole { account_id: account_id.to_string(), role: role.to_owned() }),
	}
}

fn role_values(xml: &str) -> Result<Vec<String>, IdpError> {
	let malformed = |e: quick_xml::Error| {
		IdpError::invalid_response(format!("Cannot parse SAML assertion: {e}"))
	};
	let mut reader = Reader::from_str(xml);
	let mut values = Vec::new();
	let mut in_role_attribute = false;
	let mut current: Option<String> = None;

	loop {
		match reader.read_event().map_err(malformed)? {
			Event::Start(e) => match e.local_name().as_ref() {
				b"Attribute" =>
					in_role_attribute = e.attributes().flatten().any(|attribute| {
						attribute.key.local_name().as_ref() == b"Name"
							&& attribute.unescape_value().is_ok_and(|name| name == ROLE_ATTRIBUTE)
					}),
				b"AttributeValue" if in_role_attribute => current = Some(String::new()),
				_ => {},
			},
			Event::Text(text) =>
				if let Some(current) = current.as_mut() {
					current.push_str(&text.unescape().map_err(malformed)?);
				},
			Event::CData(data) =>
				if let Some(current) = current.as_mut() {
					current.push_str(&String::from_utf8_lossy(&data));
				},
			Event::End(e) => match e.local_name().as_ref() {
				b"AttributeValue" =>
					if let Some(value) = current.take() {
						values.push(value.trim().to_owned());
					},
				b"Attribute" => in_role_attribute = false,
				_ => {},
			},
			Event::Eof => break,
			_ => {},
		}
	}

	Ok(values)
}
