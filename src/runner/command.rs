//! The unit of work driven by [`AccountRunner`](crate::runner::AccountRunner).

// self
use crate::{_prelude::*, runner::RunContext, session::Session};

/// Boxed future returned by [`Command::execute`].
pub type CommandFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + 'a + Send>>;

/// Work executed once per account.
///
/// One command instance is shared by every worker. `execute` runs concurrently across accounts
/// and must not mutate shared state; the hooks and [`Command::collect_results`] run one at a
/// time on the task driving the run, so state accumulated there needs no coordination beyond
/// the interior mutability `&self` requires.
pub trait Command<A>
where
	Self: Send + Sync,
	A: Display + Send + Sync,
{
	/// Value produced for each account.
	type Output: Send;

	/// Runs once before any account is processed.
	fn pre_hook(&self) {}

	/// Runs once before any account is processed, with the run's context.
	///
	/// Defaults to [`Command::pre_hook`].
	fn pre_hook_with_context(&self, context: &RunContext) {
		let _ = context;

		self.pre_hook();
	}

	/// Processes one account with its session.
	fn execute<'a>(&'a self, session: &'a Session, account: &'a A) -> CommandFuture<'a, Self::Output>;

	/// Receives each account's result, one at a time, in completion order.
	///
	/// The default reports failures on stderr and as a warning; successes are dropped because
	/// `Output` need not be printable. Commands with a [`Display`] output can override this with
	/// [`print_result`] to also echo successes on stdout.
	fn collect_results(&self, account: &A, result: Result<Self::Output>) {
		if let Err(e) = result {
			report_failure(account, &e);
		}
	}

	/// Runs once after every result has been collected.
	fn post_hook(&self) {}
}

/// Prints `"{label}: {value}"` on stdout for successes and reports failures through
/// [`report_failure`].
pub fn print_result<T>(label: &dyn Display, result: Result<T>)
where
	T: Display,
{
	match result {
		Ok(value) => println!("{}", format_success(label, &value)),
		Err(e) => report_failure(label, &e),
	}
}

/// Writes `"{label}: error: {error}"` to stderr and logs the failure.
pub fn report_failure(label: &dyn Display, error: &Error) {
	tracing::warn!(account = %label, error = %error, "account failed");
	eprintln!("{label}: error: {error}");
}

fn format_success(label: &dyn Display, value: &dyn Display) -> String {
	format!("{label}: {value}")
}
