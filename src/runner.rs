//! Bounded worker pool that drives one [`Command`] across many accounts.
//!
//! # Lifecycle
//!
//! For each [`AccountRunner::run`]:
//!
//! 1. [`Command::pre_hook_with_context`] runs once, before any account is touched.
//! 2. Up to `max_workers` accounts are processed concurrently. Each resolves its account id with
//!    the key function, asks the [`SessionProvider`] for a session, and calls
//!    [`Command::execute`]. Key, session, and execution failures (panics included) are captured
//!    as the account's result instead of stopping the run.
//! 3. As accounts finish, in completion order, [`Command::collect_results`] receives each result.
//!    Collection happens on the task driving `run`, so it never overlaps itself or any
//!    `execute` poll; it is the one place a command may accumulate state.
//! 4. [`Command::post_hook`] runs once after every result has been collected.
//!
//! No per-account timeout is applied: a stuck `execute` holds its worker slot until it finishes.

pub mod command;
pub mod function;
pub mod limit;
pub mod regional;

pub use command::*;
pub use function::*;
pub use limit::ConcurrencyLimit;
pub use regional::*;

// std
use std::{panic::AssertUnwindSafe, time::Instant};
// crates.io
use futures::{FutureExt, StreamExt, stream};
use tracing::Instrument;
// self
use crate::{
	_prelude::*,
	account::{self, AccountId},
	config::{DEFAULT_MAX_WORKERS, RunnerConfig},
	error::ConfigError,
	obs::{self, FlowOutcome},
	session::SessionProvider,
};

/// Caller-supplied attributes plus run facts filled in by the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunContext {
	/// Free-form attributes forwarded to [`Command::pre_hook_with_context`].
	pub attributes: BTreeMap<String, String>,
	account_count: usize,
	max_workers: usize,
}
impl RunContext {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an attribute.
	pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.insert(name.into(), value.into());

		self
	}

	/// Looks up an attribute.
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.get(name).map(String::as_str)
	}

	/// Number of accounts in the current run.
	pub fn account_count(&self) -> usize {
		self.account_count
	}

	/// Worker pool size of the current run.
	pub fn max_workers(&self) -> usize {
		self.max_workers
	}
}

/// Executes commands across accounts with a bounded number of concurrent workers.
#[derive(Clone)]
pub struct AccountRunner {
	provider: Arc<dyn SessionProvider>,
	max_workers: usize,
}
impl AccountRunner {
	/// Creates a runner with the default pool size of 10.
	pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
		Self { provider, max_workers: DEFAULT_MAX_WORKERS }
	}

	/// Creates a runner from validated configuration.
	pub fn from_config(
		provider: Arc<dyn SessionProvider>,
		config: &RunnerConfig,
	) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self { provider, max_workers: config.max_workers })
	}

	/// Sets the pool size; zero workers is rejected.
	pub fn with_max_workers(mut self, max_workers: usize) -> Result<Self, ConfigError> {
		if max_workers == 0 {
			return Err(ConfigError::NoWorkers);
		}

		self.max_workers = max_workers;

		Ok(self)
	}

	/// Worker pool size.
	pub fn max_workers(&self) -> usize {
		self.max_workers
	}

	/// Runs `command` across `accounts` and returns the elapsed wall-clock time.
	///
	/// `key` extracts the account id from each account reference. See the module docs for the
	/// ordering guarantees.
	pub async fn run<A, C, K>(
		&self,
		command: &C,
		accounts: impl IntoIterator<Item = A>,
		key: K,
		context: RunContext,
	) -> Duration
	where
		A: Display + Send + Sync,
		C: ?Sized + Command<A>,
		K: Fn(&A) -> Result<String, BoxError> + Sync,
	{
		let start = Instant::now();
		let accounts = accounts.into_iter().collect::<Vec<_>>();
		let context =
			RunContext { account_count: accounts.len(), max_workers: self.max_workers, ..context };

		tracing::info!(accounts = accounts.len(), max_workers = self.max_workers, "starting run");
		command.pre_hook_with_context(&context);

		let key = &key;
		let mut completed = stream::iter(accounts)
			.map(|account| self.process(command, key, account))
			.buffer_unordered(self.max_workers);

		while let Some((account, result)) = completed.next().await {
			obs::record_account_outcome(FlowOutcome::of(&result));
			command.collect_results(&account, result);
		}

		command.post_hook();

		let elapsed = Duration::try_from(start.elapsed()).unwrap_or(Duration::MAX);

		tracing::info!(elapsed = %elapsed, "run finished");

		elapsed
	}

	/// Runs `command` across `accounts`, using each account's `Display` output as its id.
	pub async fn run_accounts<A, C>(
		&self,
		command: &C,
		accounts: impl IntoIterator<Item = A>,
		context: RunContext,
	) -> Duration
	where
		A: Display + Send + Sync,
		C: ?Sized + Command<A>,
	{
		self.run(command, accounts, |account: &A| Ok(account.to_string()), context).await
	}

	async fn process<A, C, K>(&self, command: &C, key: &K, account: A) -> (A, Result<C::Output>)
	where
		A: Display + Send + Sync,
		C: ?Sized + Command<A>,
		K: Fn(&A) -> Result<String, BoxError> + Sync,
	{
		let result = match account::resolve_account_id(key, &account) {
			Ok(account_id) => {
				let span = obs::account_span(Some(&account_id));

				self.execute(command, &account_id, &account).instrument(span).await
			},
			Err(e) => Err(e),
		};

		(account, result)
	}

	async fn execute<A, C>(&self, command: &C, account_id: &AccountId, account: &A) -> Result<C::Output>
	where
		A: Display + Send + Sync,
		C: ?Sized + Command<A>,
	{
		let attempt = async {
			let session = self.provider.session(account_id).await?;

			command.execute(&session, account).await.map_err(Error::Command)
		};

		match AssertUnwindSafe(attempt).catch_unwind().await {
			Ok(result) => result,
			Err(payload) => Err(Error::panicked(&*payload)),
		}
	}
}
impl Debug for AccountRunner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccountRunner").field("max_workers", &self.max_workers).finish_non_exhaustive()
	}
}
