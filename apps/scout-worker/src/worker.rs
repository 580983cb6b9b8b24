//! Outbox consumer. Each claimed row is one search job, driven to a terminal state by
//! [`SearchWorker::run`].

use std::{sync::Arc, time::Duration as StdDuration};

use color_eyre::Result;
use time::{Duration, OffsetDateTime};
use tokio::time as tokio_time;

use scout_config::Jobs;
use scout_service::SearchWorker;
use scout_storage::{db::Db, outbox};

pub struct WorkerState {
	pub db: Db,
	pub worker: Arc<SearchWorker>,
	pub poll_interval: StdDuration,
	pub claim_lease: Duration,
}
impl WorkerState {
	pub fn new(db: Db, worker: Arc<SearchWorker>, jobs: &Jobs) -> Self {
		Self {
			db,
			worker,
			poll_interval: StdDuration::from_millis(jobs.poll_interval_ms),
			claim_lease: Duration::seconds(jobs.claim_lease_seconds),
		}
	}
}

pub async fn run_worker(state: WorkerState) -> Result<()> {
	tracing::info!(
		poll_interval_ms = state.poll_interval.as_millis() as u64,
		claim_lease_seconds = state.claim_lease.whole_seconds(),
		"Dispatch outbox worker started."
	);

	loop {
		match process_dispatch_outbox_once(&state).await {
			// Drain without sleeping while work is queued.
			Ok(true) => continue,
			Ok(false) => {},
			Err(err) => {
				tracing::error!(error = %err, "Dispatch outbox processing failed.");
			},
		}

		tokio_time::sleep(state.poll_interval).await;
	}
}

/// Claims and runs at most one queued job. Returns whether a row was claimed.
pub async fn process_dispatch_outbox_once(state: &WorkerState) -> Result<bool> {
	let now = OffsetDateTime::now_utc();
	let Some(entry) = outbox::claim_next(&state.db, now, state.claim_lease).await? else {
		return Ok(false);
	};
	let result = match entry.job_payload() {
		Ok(payload) => Arc::clone(&state.worker).run(payload).await.map_err(|err| err.to_string()),
		Err(err) => Err(format!("Undecodable outbox payload: {err}.")),
	};

	match result {
		Ok(()) => {
			outbox::mark_done(&state.db, entry.outbox_id).await?;

			tracing::debug!(
				outbox_id = %entry.outbox_id,
				request_id = %entry.request_id,
				"Outbox job done."
			);
		},
		Err(err) => {
			outbox::mark_failed(&state.db, entry.outbox_id, entry.attempts, &err).await?;

			tracing::error!(
				error = %err,
				outbox_id = %entry.outbox_id,
				request_id = %entry.request_id,
				attempts = entry.attempts + 1,
				"Outbox job failed."
			);
		},
	}

	Ok(true)
}
