mod common;

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use futures::future;
use time::Duration;
use tokio::sync::Barrier;
// self
use account_runner::{
	account::AccountId,
	cache::ManualClock,
	session::{CredentialCache, CredentialFuture, CredentialSource},
};

/// Source that optionally waits on a barrier before minting, so tests can observe overlap.
struct GatedSource {
	calls: AtomicUsize,
	gate: Option<Arc<Barrier>>,
	delay: StdDuration,
}
impl GatedSource {
	fn new() -> Self {
		Self { calls: AtomicUsize::new(0), gate: None, delay: StdDuration::ZERO }
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl CredentialSource for GatedSource {
	fn role(&self) -> &str {
		"Auditor"
	}

	fn duration(&self) -> Duration {
		Duration::hours(1)
	}

	fn credentials<'a>(&'a self, account_id: &'a AccountId) -> CredentialFuture<'a> {
		Box::pin(async move {
			let serial = self.calls.fetch_add(1, Ordering::SeqCst);

			if let Some(gate) = &self.gate {
				gate.wait().await;
			}

			tokio::time::sleep(self.delay).await;

			Ok(common::credentials(&format!("ASIA{account_id}X{serial}")))
		})
	}
}

#[tokio::test]
async fn credentials_are_reused_until_half_their_duration() {
	let clock = Arc::new(ManualClock::default());
	let cache = CredentialCache::new(GatedSource::new()).with_clock(clock.clone());
	let account = common::account("111122223333");
	let first = cache.credentials(&account).await.expect("Initial exchange should succeed.");

	clock.advance(Duration::minutes(29) + Duration::seconds(59));

	assert_eq!(cache.credentials(&account).await.expect("Cached lookup should succeed."), first);

	clock.advance(Duration::seconds(1));

	let refreshed = cache.credentials(&account).await.expect("Refresh should succeed.");

	assert_ne!(refreshed, first);
	assert_eq!(cache.source().calls(), 2);
	// Still half an hour of nominal validity left when the refresh happened.
	assert_eq!(cache.ttl(), Duration::minutes(30));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_for_one_account_share_one_exchange() {
	let cache = Arc::new(CredentialCache::new(GatedSource {
		delay: StdDuration::from_millis(50),
		..GatedSource::new()
	}));
	let handles = (0..8).map(|_| {
		let cache = cache.clone();

		tokio::spawn(async move { cache.credentials(&common::account("100")).await })
	});
	let minted = future::join_all(handles)
		.await
		.into_iter()
		.map(|joined| {
			joined.expect("Task should not panic.").expect("Exchange should succeed.").access_key_id
		})
		.collect::<Vec<_>>();

	assert!(minted.iter().all(|key| key == &minted[0]), "got {minted:?}");
	assert_eq!(cache.source().calls(), 1);
	assert_eq!(cache.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_accounts_refresh_in_parallel() {
	// Both exchanges must be in flight at once for the barrier to release.
	let cache = Arc::new(CredentialCache::new(GatedSource {
		gate: Some(Arc::new(Barrier::new(2))),
		..GatedSource::new()
	}));
	let lookups = ["100", "200"].map(|id| {
		let cache = cache.clone();

		tokio::spawn(async move { cache.credentials(&common::account(id)).await })
	});
	let results = tokio::time::timeout(StdDuration::from_secs(5), future::join_all(lookups))
		.await
		.expect("Exchanges for different accounts must not serialize.");

	for result in results {
		result.expect("Task should not panic.").expect("Exchange should succeed.");
	}

	assert_eq!(cache.source().calls(), 2);
	assert_eq!(cache.len(), 2);
}
