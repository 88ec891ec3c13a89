//! Closure adapters that collect results and errors into maps.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	runner::{AccountRunner, Command, CommandFuture, RunContext, Regional, RegionalCommand},
	session::{Session, SessionProvider},
};

/// Results and errors keyed by account.
pub type FunctionResults<K, T> = (HashMap<K, T>, HashMap<K, Error>);

/// [`Command`] running a closure and keeping every outcome.
pub struct FunctionCommand<A, T, F> {
	function: F,
	results: Mutex<HashMap<A, T>>,
	errors: Mutex<HashMap<A, Error>>,
}
impl<A, T, F> FunctionCommand<A, T, F>
where
	A: Eq + Hash,
{
	/// Wraps `function`, called as `function(session, account)` for every account.
	pub fn new(function: F) -> Self {
		Self { function, results: Default::default(), errors: Default::default() }
	}

	/// Returns the collected `(results, errors)` maps.
	pub fn into_results(self) -> FunctionResults<A, T> {
		(self.results.into_inner(), self.errors.into_inner())
	}
}
impl<A, T, F, Fut> Command<A> for FunctionCommand<A, T, F>
where
	A: Clone + Display + Eq + Hash + Send + Sync,
	T: Send,
	F: Fn(Session, A) -> Fut + Send + Sync,
	Fut: 'static + Send + Future<Output = Result<T, BoxError>>,
{
	type Output = T;

	fn execute<'a>(&'a self, session: &'a Session, account: &'a A) -> CommandFuture<'a, T> {
		Box::pin((self.function)(session.clone(), account.clone()))
	}

	fn collect_results(&self, account: &A, result: Result<T>) {
		match result {
			Ok(value) => {
				self.results.lock().insert(account.clone(), value);
			},
			Err(e) => {
				self.errors.lock().insert(account.clone(), e);
			},
		}
	}
}

/// [`RegionalCommand`] running a closure per region and keeping every outcome.
pub struct RegionalFunctionCommand<A, T, F> {
	function: F,
	results: Mutex<HashMap<(A, String), T>>,
	errors: Mutex<HashMap<(A, String), Error>>,
}
impl<A, T, F> RegionalFunctionCommand<A, T, F>
where
	A: Eq + Hash,
{
	/// Wraps `function`, called as `function(session, account, region)`.
	pub fn new(function: F) -> Self {
		Self { function, results: Default::default(), errors: Default::default() }
	}

	/// Returns the collected `(results, errors)` maps keyed by `(account, region)`.
	pub fn into_results(self) -> FunctionResults<(A, String), T> {
		(self.results.into_inner(), self.errors.into_inner())
	}
}
impl<A, T, F, Fut> RegionalCommand<A> for RegionalFunctionCommand<A, T, F>
where
	A: Clone + Display + Eq + Hash + Send + Sync,
	T: Send,
	F: Fn(Session, A, String) -> Fut + Send + Sync,
	Fut: 'static + Send + Future<Output = Result<T, BoxError>>,
{
	type Output = T;

	fn regional_execute<'a>(
		&'a self,
		session: &'a Session,
		account: &'a A,
		region: &'a str,
	) -> CommandFuture<'a, T> {
		Box::pin((self.function)(session.clone(), account.clone(), region.to_owned()))
	}

	fn regional_collect_results(&self, account: &A, region: &str, result: Result<T>) {
		let key = (account.clone(), region.to_owned());

		match result {
			Ok(value) => {
				self.results.lock().insert(key, value);
			},
			Err(e) => {
				self.errors.lock().insert(key, e);
			},
		}
	}
}

/// Runs `function` across `accounts` and returns the `(results, errors)` maps.
pub async fn execute_function<A, T, F, Fut, K>(
	provider: Arc<dyn SessionProvider>,
	accounts: impl IntoIterator<Item = A>,
	function: F,
	key: K,
	max_workers: usize,
) -> Result<FunctionResults<A, T>, ConfigError>
where
	A: Clone + Display + Eq + Hash + Send + Sync,
	T: Send,
	F: Fn(Session, A) -> Fut + Send + Sync,
	Fut: 'static + Send + Future<Output = Result<T, BoxError>>,
	K: Fn(&A) -> Result<String, BoxError> + Sync,
{
	let runner = AccountRunner::new(provider).with_max_workers(max_workers)?;
	let command = FunctionCommand::new(function);

	runner.run(&command, accounts, key, RunContext::new()).await;

	Ok(command.into_results())
}

/// Runs `function` across every `(account, region)` pair and returns the `(results, errors)`
/// maps keyed by that pair.
pub async fn regional_execute_function<A, T, F, Fut, K>(
	provider: Arc<dyn SessionProvider>,
	accounts: impl IntoIterator<Item = A>,
	regions: impl IntoIterator<Item = impl Into<String>>,
	function: F,
	key: K,
	max_workers: usize,
) -> Result<FunctionResults<(A, String), T>, ConfigError>
where
	A: Clone + Display + Eq + Hash + Send + Sync,
	T: Send,
	F: Fn(Session, A, String) -> Fut + Send + Sync,
	Fut: 'static + Send + Future<Output = Result<T, BoxError>>,
	K: Fn(&A) -> Result<String, BoxError> + Sync,
{
	let runner = AccountRunner::new(provider).with_max_workers(max_workers)?;
	let command = Regional::new(RegionalFunctionCommand::new(function), regions)?;

	runner.run(&command, accounts, key, RunContext::new()).await;

	Ok(command.into_inner().into_results())
}
