use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use scout_domain::{Event, SearchParams};
use scout_storage::{
	Error, HistoryStore, JobStore,
	models::{JobPayload, JobStatus, JobUpdate, SearchHistoryEntry, SearchJob},
	outbox,
	postgres::{PgHistoryStore, PgJobStore},
};
use scout_testkit::TestDatabase;

async fn scratch_db(test: &str) -> Option<TestDatabase> {
	let test_db = TestDatabase::from_env().await.expect("Failed to create test database.");

	if test_db.is_none() {
		eprintln!("Skipping {test}; set SCOUT_PG_DSN to run this test.");
	}

	test_db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(test_db) = scratch_db("schema_bootstrap_is_idempotent").await else {
		return;
	};
	let db = test_db.db().clone();

	db.ensure_schema().await.expect("Second bootstrap must succeed.");

	let count: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM information_schema.tables
WHERE table_name IN ('search_jobs', 'search_history', 'search_dispatch_outbox')",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 3);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn job_lifecycle_persists() {
	let Some(test_db) = scratch_db("job_lifecycle_persists").await else {
		return;
	};
	let store = PgJobStore::new(test_db.db().clone());
	let job = SearchJob::submitted(
		Uuid::new_v4(),
		"u-1",
		SearchParams::located("Vaduz"),
		OffsetDateTime::now_utc(),
	);

	store.create(&job).await.expect("Failed to create job.");

	assert!(matches!(store.create(&job).await, Err(Error::Conflict(_))));

	store.update(job.request_id, JobUpdate::processing("Gathering")).await.expect("processing");

	let now = OffsetDateTime::now_utc();
	let done = store
		.update(job.request_id, JobUpdate::completed(vec![Event::titled("Fest", "Vaduz")], now, 42))
		.await
		.expect("completed");
	let stored = store.get(job.request_id).await.expect("get").expect("job exists");

	assert_eq!(stored.status, JobStatus::Completed);
	assert_eq!(stored.results, done.results);
	assert_eq!(stored.current_step, None);
	assert_eq!(stored.processing_time_ms, Some(42));
	assert!(matches!(
		store.update(job.request_id, JobUpdate::step("late")).await,
		Err(Error::Conflict(_))
	));
	assert!(matches!(
		store.update(Uuid::new_v4(), JobUpdate::step("none")).await,
		Err(Error::NotFound(_))
	));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn history_is_trimmed_per_user() {
	let Some(test_db) = scratch_db("history_is_trimmed_per_user").await else {
		return;
	};
	let store = PgHistoryStore::new(test_db.db().clone(), 2);
	let base = OffsetDateTime::now_utc();

	for (offset, name) in ["one", "two", "three"].into_iter().enumerate() {
		let entry = SearchHistoryEntry {
			entry_id: Uuid::new_v4(),
			user_id: "u-1".to_string(),
			request_id: None,
			search_params: SearchParams::located("Vaduz"),
			events: vec![Event::titled(name, "Vaduz")],
			raw_text: String::new(),
			searched_at: base + Duration::seconds(offset as i64),
		};

		store.append(&entry).await.expect("Failed to append history.");
	}

	let entries = store.list("u-1", 10).await.expect("Failed to list history.");
	let names = entries.iter().map(|entry| entry.events[0].name.as_str()).collect::<Vec<_>>();

	assert_eq!(names, ["three", "two"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn outbox_claims_lease_and_retries() {
	let Some(test_db) = scratch_db("outbox_claims_lease_and_retries").await else {
		return;
	};
	let db = test_db.db().clone();
	let payload = JobPayload {
		request_id: Uuid::new_v4(),
		user_id: "u-1".to_string(),
		search_params: SearchParams::located("Vaduz"),
	};
	let outbox_id = outbox::enqueue(&db, &payload).await.expect("Failed to enqueue.");
	let now = OffsetDateTime::now_utc() + Duration::seconds(1);
	let entry = outbox::claim_next(&db, now, Duration::seconds(60))
		.await
		.expect("Failed to claim.")
		.expect("Entry must be claimable.");

	assert_eq!(entry.outbox_id, outbox_id);
	assert_eq!(entry.job_payload().expect("Payload must decode."), payload);
	assert!(
		outbox::claim_next(&db, now, Duration::seconds(60))
			.await
			.expect("Failed to claim.")
			.is_none(),
		"Leased entry must not be claimed twice."
	);

	outbox::mark_failed(&db, outbox_id, entry.attempts, "api_key=secret timed out")
		.await
		.expect("Failed to mark failed.");

	let retry = outbox::claim_next(&db, now + Duration::minutes(5), Duration::seconds(60))
		.await
		.expect("Failed to claim.")
		.expect("Failed entry must be retried.");

	assert_eq!(retry.attempts, 1);
	assert_eq!(retry.last_error.as_deref(), Some("api_key=[REDACTED] timed out"));

	outbox::mark_done(&db, outbox_id).await.expect("Failed to mark done.");

	assert!(
		outbox::claim_next(&db, now + Duration::hours(1), Duration::seconds(60))
			.await
			.expect("Failed to claim.")
			.is_none()
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
