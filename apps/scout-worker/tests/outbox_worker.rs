use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use scout_config::{Config, History, Jobs, Postgres, Providers as ProviderConfigs, Service, Storage};
use scout_domain::SearchParams;
use scout_service::{Providers, SearchWorker};
use scout_storage::{
	HistoryStore, JobStore,
	models::{JobPayload, JobStatus, SearchJob},
	outbox,
	postgres::{PgHistoryStore, PgJobStore},
};
use scout_testkit::TestDatabase;
use scout_worker::worker::{self, WorkerState};

fn test_config(postgres: Postgres) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage { backend: "postgres".to_string(), postgres: Some(postgres) },
		providers: ProviderConfigs::default(),
		jobs: Jobs { dispatch: "outbox".to_string(), ..Default::default() },
		history: History::default(),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn claimed_job_runs_to_completion_once() {
	let Some(test_db) = TestDatabase::from_env().await.expect("Failed to create test database.")
	else {
		eprintln!("Skipping claimed_job_runs_to_completion_once; set SCOUT_PG_DSN to run this test.");

		return;
	};
	let cfg = test_config(test_db.postgres().clone());
	let db = test_db.db().clone();
	let jobs: Arc<dyn JobStore> = Arc::new(PgJobStore::new(db.clone()));
	let history: Arc<dyn HistoryStore> =
		Arc::new(PgHistoryStore::new(db.clone(), cfg.history.max_entries));
	let search_worker =
		Arc::new(SearchWorker::new(cfg.clone(), Providers::default(), Arc::clone(&jobs), history));
	let state = WorkerState::new(db.clone(), search_worker, &cfg.jobs);
	let job = SearchJob::submitted(
		Uuid::new_v4(),
		"u-1",
		SearchParams::located("Vaduz"),
		OffsetDateTime::now_utc(),
	);

	jobs.create(&job).await.expect("Failed to create job.");
	outbox::enqueue(
		&db,
		&JobPayload {
			request_id: job.request_id,
			user_id: job.user_id.clone(),
			search_params: job.search_params.clone(),
		},
	)
	.await
	.expect("Failed to enqueue job.");

	let claimed =
		worker::process_dispatch_outbox_once(&state).await.expect("Outbox processing failed.");

	assert!(claimed);

	let done = jobs.get(job.request_id).await.expect("Failed to load job.").expect("Job exists.");

	assert_eq!(done.status, JobStatus::Completed);
	assert!(done.results.is_some());
	assert!(done.current_step.is_none());

	let status: String =
		sqlx::query_scalar("SELECT status FROM search_dispatch_outbox WHERE request_id = $1")
			.bind(job.request_id)
			.fetch_one(&db.pool)
			.await
			.expect("Failed to load outbox row.");

	assert_eq!(status, "DONE");

	let idle =
		worker::process_dispatch_outbox_once(&state).await.expect("Outbox processing failed.");

	assert!(!idle);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
