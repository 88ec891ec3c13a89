mod common;

// std
use std::sync::Arc;
// crates.io
use time::Duration;
// self
use account_runner::{
	cache::ManualClock,
	config::CrossAccountConfig,
	error::Error,
	session::{CrossAccountSessionProvider, SessionProvider},
};
use common::{FakeSts, StaticProvider};

fn hop(base_account: &str, role: &str, duration: Duration) -> CrossAccountConfig {
	CrossAccountConfig::builder(common::account(base_account), role)
		.duration(duration)
		.build()
		.expect("Cross-account config should build.")
}

#[tokio::test]
async fn chained_hops_are_cached_independently() {
	let clock = Arc::new(ManualClock::default());
	let sts = Arc::new(FakeSts::default());
	let root = Arc::new(StaticProvider::default());
	let organization = CrossAccountSessionProvider::new_with_clock(
		hop("111111111111", "OrganizationAccess", Duration::hours(4)),
		root.clone(),
		sts.clone(),
		clock.clone(),
	)
	.expect("First hop should build.");
	let auditor = CrossAccountSessionProvider::new_with_clock(
		hop("222222222222", "Auditor", Duration::hours(1)),
		Arc::new(organization),
		sts.clone(),
		clock.clone(),
	)
	.expect("Second hop should build.");

	for id in ["333333333333", "444444444444", "333333333333"] {
		let session =
			auditor.session(&common::account(id)).await.expect("Chained session should be minted.");

		assert_eq!(session.account_id().as_str(), id);
	}

	{
		let assumed = sts.assumed.lock();
		let summary = assumed
			.iter()
			.map(|(base, request)| (base.as_str(), request.role_arn.as_str()))
			.collect::<Vec<_>>();

		assert_eq!(
			summary,
			[
				("111111111111", "arn:aws:iam::222222222222:role/OrganizationAccess"),
				("222222222222", "arn:aws:iam::333333333333:role/Auditor"),
				("222222222222", "arn:aws:iam::444444444444:role/Auditor"),
			]
		);
	}

	assert_eq!(root.calls.lock().len(), 1);

	// Past the second hop's half-life but well within the first hop's.
	clock.advance(Duration::minutes(30));

	auditor.session(&common::account("333333333333")).await.expect("Refresh should succeed.");

	let assumed = sts.assumed.lock();

	assert_eq!(assumed.len(), 4);
	assert_eq!(assumed[3].0.as_str(), "222222222222");
	assert_eq!(root.calls.lock().len(), 1, "The first hop must still be served from its cache.");
}

#[tokio::test]
async fn request_carries_partition_external_id_and_duration() {
	let sts = Arc::new(FakeSts::default());
	let config = CrossAccountConfig::builder(common::account("111111111111"), "Auditor")
		.external_id("tenant-42")
		.partition("aws-cn")
		.duration(Duration::hours(12))
		.build()
		.expect("Cross-account config should build.");
	let provider =
		CrossAccountSessionProvider::new(config, Arc::new(StaticProvider::default()), sts.clone())
			.expect("Provider should build.");

	assert_eq!(provider.cache().ttl(), Duration::hours(6));

	provider
		.session(&common::account("555555555555"))
		.await
		.expect("Role chaining should succeed.");

	let assumed = sts.assumed.lock();
	let (_, request) = &assumed[0];

	assert_eq!(request.role_arn, "arn:aws-cn:iam::555555555555:role/Auditor");
	assert_eq!(request.external_id.as_deref(), Some("tenant-42"));
	assert_eq!(request.duration, Duration::hours(12));
	assert!(request.role_session_name.starts_with("AccountRunner"));
}

#[tokio::test]
async fn base_failures_propagate_and_are_not_cached() {
	let sts = Arc::new(FakeSts::default());
	let base = Arc::new(StaticProvider::failing_for(&["111111111111"]));
	let provider = CrossAccountSessionProvider::new(
		hop("111111111111", "Auditor", Duration::hours(1)),
		base.clone(),
		sts.clone(),
	)
	.expect("Provider should build.");

	for _ in 0..2 {
		let err = provider
			.session(&common::account("222222222222"))
			.await
			.expect_err("A failing base session must fail the chain.");

		assert!(matches!(err, Error::Command(_)), "unexpected error: {err:?}");
		assert!(err.to_string().contains("no credentials for 111111111111"));
	}

	assert_eq!(base.calls.lock().len(), 2);
	assert!(sts.assumed.lock().is_empty());
}

#[test]
fn invalid_durations_are_rejected() {
	for duration in [Duration::minutes(14), Duration::hours(13)] {
		assert!(
			CrossAccountConfig::builder(common::account("111111111111"), "Auditor")
				.duration(duration)
				.build()
				.is_err()
		);
	}
}
