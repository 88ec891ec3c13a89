//! Commands that visit a list of regions inside each account.

// std
use std::panic::AssertUnwindSafe;
// crates.io
use futures::FutureExt;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	runner::{Command, CommandFuture, RunContext, command},
	session::Session,
};

/// Work executed once per account and region.
///
/// Regions of one account run strictly in sequence with the same session; only different
/// accounts run in parallel. Wrap an implementation in [`Regional`] to hand it to the runner.
pub trait RegionalCommand<A>
where
	Self: Send + Sync,
	A: Display + Send + Sync,
{
	/// Value produced for each account and region.
	type Output: Send;

	/// Runs once before any account is processed.
	fn pre_hook(&self) {}

	/// Runs once before any account is processed, with the run's context.
	fn pre_hook_with_context(&self, context: &RunContext) {
		let _ = context;

		self.pre_hook();
	}

	/// Processes one region of one account.
	fn regional_execute<'a>(
		&'a self,
		session: &'a Session,
		account: &'a A,
		region: &'a str,
	) -> CommandFuture<'a, Self::Output>;

	/// Receives each region's result, one at a time.
	///
	/// The default reports failures as `"{account}/{region}: error: {error}"` and drops
	/// successes; override it with [`command::print_result`] to echo [`Display`] outputs too.
	fn regional_collect_results(&self, account: &A, region: &str, result: Result<Self::Output>) {
		if let Err(e) = result {
			command::report_failure(&format_args!("{account}/{region}"), &e);
		}
	}

	/// Runs once after every result has been collected.
	fn post_hook(&self) {}
}

/// Adapts a [`RegionalCommand`] into a [`Command`] over a fixed region list.
#[derive(Clone, Debug)]
pub struct Regional<C> {
	command: C,
	regions: Vec<String>,
}
impl<C> Regional<C> {
	/// Wraps `command`; at least one region is required.
	pub fn new(
		command: C,
		regions: impl IntoIterator<Item = impl Into<String>>,
	) -> Result<Self, ConfigError> {
		let regions = regions.into_iter().map(Into::into).collect::<Vec<_>>();

		if regions.is_empty() {
			return Err(ConfigError::NoRegions);
		}

		Ok(Self { command, regions })
	}

	/// Regions visited for every account, in order.
	pub fn regions(&self) -> &[String] {
		&self.regions
	}

	/// Wrapped command.
	pub fn command(&self) -> &C {
		&self.command
	}

	/// Unwraps the command.
	pub fn into_inner(self) -> C {
		self.command
	}
}
impl<A, C> Command<A> for Regional<C>
where
	A: Display + Send + Sync,
	C: RegionalCommand<A>,
{
	type Output = Vec<(String, Result<C::Output>)>;

	fn pre_hook(&self) {
		self.command.pre_hook();
	}

	fn pre_hook_with_context(&self, context: &RunContext) {
		self.command.pre_hook_with_context(context);
	}

	fn execute<'a>(&'a self, session: &'a Session, account: &'a A) -> CommandFuture<'a, Self::Output> {
		Box::pin(async move {
			let mut results = Vec::with_capacity(self.regions.len());

			for region in &self.regions {
				let attempt = async { self.command.regional_execute(session, account, region).await };
				let result = match AssertUnwindSafe(attempt).catch_unwind().await {
					Ok(result) => result.map_err(Error::Command),
					Err(payload) => Err(Error::panicked(&*payload)),
				};

				results.push((region.clone(), result));
			}

			Ok(results)
		})
	}

	fn collect_results(&self, account: &A, result: Result<Self::Output>) {
		match result {
			Ok(regions) =>
				for (region, result) in regions {
					self.command.regional_collect_results(account, &region, result);
				},
			Err(e) => command::report_failure(account, &e),
		}
	}

	fn post_hook(&self) {
		self.command.post_hook();
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::StaticSessionProvider, runner::AccountRunner};

	struct Noop;
	impl RegionalCommand<String> for Noop {
		type Output = ();

		fn regional_execute<'a>(
			&'a self,
			_session: &'a Session,
			_account: &'a String,
			_region: &'a str,
		) -> CommandFuture<'a, ()> {
			Box::pin(async { Ok(()) })
		}
	}

	#[test]
	fn regions_are_required() {
		assert!(matches!(Regional::new(Noop, Vec::<String>::new()), Err(ConfigError::NoRegions)));

		let regional = Regional::new(Noop, ["us-east-1", "eu-west-1"]).expect("Regions should be accepted.");

		assert_eq!(regional.regions(), ["us-east-1", "eu-west-1"]);
	}

	#[derive(Default)]
	struct Fragile {
		seen: Mutex<Vec<String>>,
	}
	impl RegionalCommand<String> for Fragile {
		type Output = String;

		fn regional_execute<'a>(
			&'a self,
			_session: &'a Session,
			account: &'a String,
			region: &'a str,
		) -> CommandFuture<'a, String> {
			Box::pin(async move {
				if region == "eu-west-1" {
					panic!("region boom");
				}

				Ok(format!("{account}@{region}"))
			})
		}

		fn regional_collect_results(&self, _account: &String, region: &str, result: Result<String>) {
			let entry = match result {
				Ok(value) => value,
				Err(e) => format!("{region}:{e}"),
			};

			self.seen.lock().push(entry);
		}
	}

	#[tokio::test]
	async fn panicking_region_keeps_its_neighbours() {
		let runner = AccountRunner::new(Arc::new(StaticSessionProvider::default()));
		let command = Regional::new(Fragile::default(), ["us-east-1", "eu-west-1", "ap-south-1"])
			.expect("Regions should be accepted.");

		runner.run_accounts(&command, ["100".to_owned()], RunContext::new()).await;

		assert_eq!(command.command().seen.lock().as_slice(), [
			"100@us-east-1",
			"eu-west-1:Command panicked: region boom.",
			"100@ap-south-1",
		]);
	}
}
