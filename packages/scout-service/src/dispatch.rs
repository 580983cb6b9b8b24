//! Hand-off from the gateway to background processing.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{BoxFuture, Error, Result, worker::SearchWorker};
use scout_storage::{db::Db, models::JobPayload, outbox};

/// Queues a job without waiting for it to run.
pub trait Dispatcher
where
	Self: Send + Sync,
{
	fn dispatch<'a>(&'a self, payload: JobPayload) -> BoxFuture<'a, Result<()>>;
}

/// Runs each job as a task on the current tokio runtime.
pub struct SpawnDispatcher {
	worker: Arc<SearchWorker>,
}
impl SpawnDispatcher {
	pub fn new(worker: Arc<SearchWorker>) -> Self {
		Self { worker }
	}
}
impl Dispatcher for SpawnDispatcher {
	fn dispatch<'a>(&'a self, payload: JobPayload) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let handle = Handle::try_current()
				.map_err(|err| Error::Dispatch { message: err.to_string() })?;
			let worker = Arc::clone(&self.worker);

			handle.spawn(async move {
				let request_id = payload.request_id;

				if let Err(err) = worker.run(payload).await {
					tracing::debug!(error = %err, %request_id, "Spawned search job ended with an error.");
				}
			});

			Ok(())
		})
	}
}

/// Persists jobs in the Postgres outbox consumed by `scout-worker`.
pub struct OutboxDispatcher {
	db: Db,
}
impl OutboxDispatcher {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl Dispatcher for OutboxDispatcher {
	fn dispatch<'a>(&'a self, payload: JobPayload) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let outbox_id = outbox::enqueue(&self.db, &payload)
				.await
				.map_err(|err| Error::Dispatch { message: err.to_string() })?;

			tracing::debug!(%outbox_id, request_id = %payload.request_id, "Search job queued.");

			Ok(())
		})
	}
}
