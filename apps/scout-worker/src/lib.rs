pub mod worker;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use scout_service::{Providers, SearchWorker};
use scout_storage::{
	HistoryStore, JobStore,
	db::Db,
	postgres::{PgHistoryStore, PgJobStore},
};

#[derive(Debug, Parser)]
#[command(
	version = scout_cli::VERSION,
	rename_all = "kebab",
	styles = scout_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = scout_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	if config.storage.backend != "postgres" {
		return Err(eyre::eyre!("scout-worker requires storage.backend = postgres."));
	}

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
	let state = worker::WorkerState::new(
		db,
		Arc::new(SearchWorker::new(config.clone(), Providers::default(), jobs, history)),
		&config.jobs,
	);

	worker::run_worker(state).await
}
