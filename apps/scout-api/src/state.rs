use std::sync::Arc;

use color_eyre::eyre;

use scout_config::Config;
use scout_service::{OutboxDispatcher, Providers, ScoutService, SearchWorker};
use scout_storage::{
	HistoryStore, JobStore,
	db::Db,
	memory::{MemoryHistoryStore, MemoryJobStore},
	postgres::{PgHistoryStore, PgJobStore},
};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ScoutService>,
}
impl AppState {
	/// Wires the configured backend and dispatch mode to the HTTP providers.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let service = match config.storage.backend.as_str() {
			"postgres" => build_postgres(config).await?,
			_ => {
				let jobs: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
				let history: Arc<dyn HistoryStore> =
					Arc::new(MemoryHistoryStore::new(config.history.max_entries as usize));

				ScoutService::with_spawn_dispatch(config, Providers::default(), jobs, history)
			},
		};

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: ScoutService) -> Self {
		Self { service: Arc::new(service) }
	}
}

async fn build_postgres(config: Config) -> color_eyre::Result<ScoutService> {
	let postgres = config
		.storage
		.postgres
		.as_ref()
		.ok_or_else(|| eyre::eyre!("storage.postgres is required for the postgres backend."))?;
	let db = Db::connect(postgres).await?;

	db.ensure_schema().await?;

	let jobs: Arc<dyn JobStore> = Arc::new(PgJobStore::new(db.clone()));
	let history: Arc<dyn HistoryStore> =
		Arc::new(PgHistoryStore::new(db.clone(), config.history.max_entries));

	if config.jobs.dispatch != "outbox" {
		return Ok(ScoutService::with_spawn_dispatch(config, Providers::default(), jobs, history));
	}

	// The API never runs outbox jobs itself. The worker here only serves synchronous searches.
	let worker = Arc::new(SearchWorker::new(
		config.clone(),
		Providers::default(),
		Arc::clone(&jobs),
		Arc::clone(&history),
	));
	let dispatcher = Arc::new(OutboxDispatcher::new(db));

	Ok(ScoutService::new(config, jobs, history, worker, dispatcher))
}
