//! Sessions backed by profiles in the shared credentials and config files.

// std
use std::{collections::BTreeSet, env, fs, io::ErrorKind};
// self
use crate::{
	_prelude::*,
	account::AccountId,
	error::TransportError,
	obs::{self, CredentialFlow, FlowOutcome, FlowSpan},
	session::{Session, SessionFuture, SessionProvider},
};

const KIND: CredentialFlow = CredentialFlow::Profile;

/// Looks up a profile named after the account id, falling back to the default profile.
///
/// No caching is involved; the files are scanned on every call.
#[derive(Clone, Debug)]
pub struct ProfileSessionProvider {
	credentials_file: PathBuf,
	config_file: PathBuf,
}
impl ProfileSessionProvider {
	/// Uses `AWS_SHARED_CREDENTIALS_FILE`/`AWS_CONFIG_FILE`, defaulting to `~/.aws/credentials`
	/// and `~/.aws/config`.
	pub fn new() -> Self {
		let aws_dir = home::home_dir().unwrap_or_default().join(".aws");
		let credentials_file = env::var_os("AWS_SHARED_CREDENTIALS_FILE")
			.map(PathBuf::from)
			.unwrap_or_else(|| aws_dir.join("credentials"));
		let config_file = env::var_os("AWS_CONFIG_FILE")
			.map(PathBuf::from)
			.unwrap_or_else(|| aws_dir.join("config"));

		Self { credentials_file, config_file }
	}

	/// Uses explicit file locations.
	pub fn with_files(credentials_file: impl Into<PathBuf>, config_file: impl Into<PathBuf>) -> Self {
		Self { credentials_file: credentials_file.into(), config_file: config_file.into() }
	}

	/// Returns every profile name declared in either file. Missing files declare nothing.
	pub fn profile_names(&self) -> Result<BTreeSet<String>> {
		let mut names = BTreeSet::new();

		if let Some(contents) = read_optional(&self.credentials_file)? {
			names.extend(section_names(&contents).map(str::to_owned));
		}
		if let Some(contents) = read_optional(&self.config_file)? {
			names.extend(
				section_names(&contents)
					.filter_map(|section| match section.strip_prefix("profile ") {
						Some(name) => Some(name.trim()),
						None if section == "default" => Some(section),
						None => None,
					})
					.map(str::to_owned),
			);
		}

		Ok(names)
	}
}
impl Default for ProfileSessionProvider {
	fn default() -> Self {
		Self::new()
	}
}
impl SessionProvider for ProfileSessionProvider {
	fn session<'a>(&'a self, account_id: &'a AccountId) -> SessionFuture<'a> {
		let span = FlowSpan::new(KIND, "profile_session");

		obs::record_credential_outcome(KIND, FlowOutcome::Attempt);

		Box::pin(span.instrument(async move {
			let result = self.profile_names().map(|names| {
				if names.contains(account_id.as_str()) {
					Session::profile(account_id.clone(), account_id.as_str())
				} else {
					tracing::info!("no profile found for {account_id}, falling back to default profile");

					Session::default_profile(account_id.clone())
				}
			});

			obs::record_credential_outcome(KIND, FlowOutcome::of(&result));

			result
		}))
	}
}

fn read_optional(path: &Path) -> Result<Option<String>> {
	match fs::read_to_string(path) {
		Ok(contents) => Ok(Some(contents)),
		Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
		Err(e) => Err(TransportError::from(e).into()),
	}
}

fn section_names(contents: &str) -> impl Iterator<Item = &str> {
	contents.lines().filter_map(section_name)
}

// `[name]`, optionally followed by a `#` or `;` comment. Anything else after `]` disqualifies
// the line as a header.
fn section_name(line: &str) -> Option<&str> {
	let (name, trailing) = line.trim().strip_prefix('[')?.split_once(']')?;
	let trailing = trailing.trim_start();

	if !trailing.is_empty() && !trailing.starts_with(['#', ';']) {
		return None;
	}

	Some(name.trim()).filter(|name| !name.is_empty())
}
