//! Runs a read-only command across every account that has a local profile, showing which
//! profile each account resolves to and how results are collected one at a time.
//!
//! Pass account ids as arguments, or none to use every profile declared in `~/.aws`.

// std
use std::{env, sync::Arc, time::Duration as StdDuration};
// crates.io
use color_eyre::Result;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;
// self
use account_runner::{
	error::Error,
	runner::{AccountRunner, Command, CommandFuture, RunContext},
	session::{ProfileSessionProvider, Session, SessionSource},
};

#[derive(Default)]
struct WhichProfile {
	resolved: Mutex<Vec<(String, String)>>,
}
impl Command<String> for WhichProfile {
	type Output = String;

	fn pre_hook_with_context(&self, context: &RunContext) {
		println!(
			"Resolving {} account(s) with {} worker(s) for {}.",
			context.account_count(),
			context.max_workers(),
			context.attribute("purpose").unwrap_or("no particular reason"),
		);
	}

	fn execute<'a>(&'a self, session: &'a Session, _account: &'a String) -> CommandFuture<'a, String> {
		Box::pin(async move {
			// Stand-in for a real API call.
			tokio::time::sleep(StdDuration::from_millis(25)).await;

			let profile = match session.source() {
				SessionSource::Profile(name) => format!("profile {name}"),
				SessionSource::DefaultProfile => "default profile".into(),
				SessionSource::Temporary(_) => "temporary credentials".into(),
			};

			Ok(profile)
		})
	}

	fn collect_results(&self, account: &String, result: Result<String, Error>) {
		match result {
			Ok(profile) => self.resolved.lock().push((account.clone(), profile)),
			Err(e) => eprintln!("{account}: error: {e}"),
		}
	}

	fn post_hook(&self) {
		let mut resolved = self.resolved.lock();

		resolved.sort();

		for (account, profile) in resolved.iter() {
			println!("{account} -> {profile}");
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("account_runner=info")),
		)
		.init();

	let provider = ProfileSessionProvider::new();
	let mut accounts = env::args().skip(1).collect::<Vec<_>>();

	if accounts.is_empty() {
		accounts = provider.profile_names()?.into_iter().collect();
	}

	let runner = AccountRunner::new(Arc::new(provider)).with_max_workers(4)?;
	let command = WhichProfile::default();
	let elapsed = runner
		.run_accounts(&command, accounts, RunContext::new().with_attribute("purpose", "a profile audit"))
		.await;

	println!("Finished in {elapsed}.");

	Ok(())
}
