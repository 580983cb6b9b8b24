use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use scout_domain::{Event, SearchParams};
use scout_storage::{
	Error, HistoryStore, JobStore,
	memory::{MemoryHistoryStore, MemoryJobStore},
	models::{JobStatus, JobUpdate, SearchHistoryEntry, SearchJob},
};

fn submitted_job() -> SearchJob {
	SearchJob::submitted(
		Uuid::new_v4(),
		"u-1",
		SearchParams::located("Vaduz"),
		OffsetDateTime::now_utc(),
	)
}

fn history_entry(user_id: &str, name: &str) -> SearchHistoryEntry {
	SearchHistoryEntry {
		entry_id: Uuid::new_v4(),
		user_id: user_id.to_string(),
		request_id: None,
		search_params: SearchParams::located("Vaduz"),
		events: vec![Event::titled(name, "Vaduz")],
		raw_text: format!("**{name}**"),
		searched_at: OffsetDateTime::now_utc(),
	}
}

#[tokio::test]
async fn job_round_trips_through_lifecycle() {
	let store = MemoryJobStore::new();
	let job = submitted_job();

	store.create(&job).await.expect("create succeeds");

	let fetched = store.get(job.request_id).await.expect("get succeeds").expect("job exists");

	assert_eq!(fetched, job);

	let processing = store
		.update(job.request_id, JobUpdate::processing("Gathering data from multiple sources"))
		.await
		.expect("processing applies");

	assert_eq!(processing.status, JobStatus::Processing);
	assert!(processing.updated_at >= job.updated_at);

	let now = OffsetDateTime::now_utc();
	let done = store
		.update(
			job.request_id,
			JobUpdate::completed(vec![Event::titled("Fest", "Vaduz")], now, 1_200),
		)
		.await
		.expect("completed applies");

	assert_eq!(done.status, JobStatus::Completed);
	assert_eq!(done.current_step, None);
	assert_eq!(done.results.as_ref().map(Vec::len), Some(1));

	let stored = store.get(job.request_id).await.expect("get succeeds").expect("job exists");

	assert_eq!(stored, done);
}

#[tokio::test]
async fn duplicate_create_conflicts() {
	let store = MemoryJobStore::new();
	let job = submitted_job();

	store.create(&job).await.expect("first create succeeds");

	assert!(matches!(store.create(&job).await, Err(Error::Conflict(_))));
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn unknown_ids_are_absent() {
	let store = MemoryJobStore::new();
	let request_id = Uuid::new_v4();

	assert_eq!(store.get(request_id).await.expect("get succeeds"), None);
	assert!(matches!(
		store.update(request_id, JobUpdate::step("anything")).await,
		Err(Error::NotFound(_))
	));
}

#[tokio::test]
async fn rejected_update_keeps_stored_record() {
	let store = MemoryJobStore::new();
	let job = submitted_job();
	let now = OffsetDateTime::now_utc();

	store.create(&job).await.expect("create succeeds");
	store
		.update(job.request_id, JobUpdate::failed("provider exploded", now, 5))
		.await
		.expect("failed applies");

	let before = store.get(job.request_id).await.expect("get succeeds");

	assert!(matches!(
		store.update(job.request_id, JobUpdate::completed(Vec::new(), now, 5)).await,
		Err(Error::Conflict(_))
	));
	assert_eq!(store.get(job.request_id).await.expect("get succeeds"), before);
}

#[tokio::test]
async fn concurrent_updates_never_tear_records() {
	let store = Arc::new(MemoryJobStore::new());
	let job = submitted_job();

	store.create(&job).await.expect("create succeeds");
	store.update(job.request_id, JobUpdate::processing("step 0")).await.expect("processing");

	let mut handles = Vec::new();

	for idx in 1..=16 {
		let store = Arc::clone(&store);
		let request_id = job.request_id;

		handles.push(tokio::spawn(async move {
			store.update(request_id, JobUpdate::step(format!("step {idx}"))).await
		}));
	}
	for handle in handles {
		handle.await.expect("task joins").expect("step applies");
	}

	let stored = store.get(job.request_id).await.expect("get succeeds").expect("job exists");

	assert_eq!(stored.status, JobStatus::Processing);
	assert!(stored.current_step.as_deref().is_some_and(|step| step.starts_with("step ")));
}

#[tokio::test]
async fn history_lists_newest_first_and_evicts_oldest() {
	let store = MemoryHistoryStore::new(3);

	for name in ["one", "two", "three", "four"] {
		store.append(&history_entry("u-1", name)).await.expect("append succeeds");
	}
	store.append(&history_entry("u-2", "other")).await.expect("append succeeds");

	let entries = store.list("u-1", 10).await.expect("list succeeds");
	let names =
		entries.iter().map(|entry| entry.events[0].name.as_str()).collect::<Vec<_>>();

	assert_eq!(names, ["four", "three", "two"]);
	assert_eq!(store.list("u-1", 1).await.expect("list succeeds").len(), 1);
	assert!(store.list("nobody", 10).await.expect("list succeeds").is_empty());
}
