pub mod db;
pub mod memory;
pub mod models;
pub mod outbox;
pub mod postgres;
pub mod schema;

mod error;

pub use error::Error;

use std::{future::Future, pin::Pin};

use uuid::Uuid;

use crate::models::{JobUpdate, SearchHistoryEntry, SearchJob};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Durable record of search jobs keyed by request id.
///
/// `update` merges a [`JobUpdate`] through [`SearchJob::apply`], so every backend enforces the
/// same transition rules. Readers observe either the state before or after an update, never a
/// mix of both.
pub trait JobStore
where
	Self: Send + Sync,
{
	fn create<'a>(&'a self, job: &'a SearchJob) -> BoxFuture<'a, Result<()>>;

	fn get<'a>(&'a self, request_id: Uuid) -> BoxFuture<'a, Result<Option<SearchJob>>>;

	fn update<'a>(&'a self, request_id: Uuid, update: JobUpdate)
	-> BoxFuture<'a, Result<SearchJob>>;
}

/// Append-only per-user search history.
pub trait HistoryStore
where
	Self: Send + Sync,
{
	fn append<'a>(&'a self, entry: &'a SearchHistoryEntry) -> BoxFuture<'a, Result<()>>;

	/// Newest entries first.
	fn list<'a>(
		&'a self,
		user_id: &'a str,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<SearchHistoryEntry>>>;
}
