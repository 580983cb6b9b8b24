//! Process-local stores for single-node deployments and tests.

use std::{
	collections::{HashMap, VecDeque},
	sync::RwLock,
};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, Error, HistoryStore, JobStore, Result,
	models::{JobUpdate, SearchHistoryEntry, SearchJob},
};

#[derive(Debug, Default)]
pub struct MemoryJobStore {
	jobs: RwLock<HashMap<Uuid, SearchJob>>,
}
impl MemoryJobStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.jobs.read().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn insert(&self, job: &SearchJob) -> Result<()> {
		let mut jobs = self.jobs.write().unwrap_or_else(|err| err.into_inner());

		if jobs.contains_key(&job.request_id) {
			return Err(Error::Conflict(format!("Job {} already exists.", job.request_id)));
		}

		jobs.insert(job.request_id, job.clone());

		Ok(())
	}

	fn merge(&self, request_id: Uuid, update: JobUpdate) -> Result<SearchJob> {
		let mut jobs = self.jobs.write().unwrap_or_else(|err| err.into_inner());
		let job = jobs
			.get_mut(&request_id)
			.ok_or_else(|| Error::NotFound(format!("Job {request_id} does not exist.")))?;

		// Apply to a copy so a rejected update leaves the stored record untouched.
		let mut next = job.clone();

		next.apply(update, OffsetDateTime::now_utc())?;

		*job = next.clone();

		Ok(next)
	}
}
impl JobStore for MemoryJobStore {
	fn create<'a>(&'a self, job: &'a SearchJob) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { self.insert(job) })
	}

	fn get<'a>(&'a self, request_id: Uuid) -> BoxFuture<'a, Result<Option<SearchJob>>> {
		Box::pin(async move {
			Ok(self.jobs.read().unwrap_or_else(|err| err.into_inner()).get(&request_id).cloned())
		})
	}

	fn update<'a>(
		&'a self,
		request_id: Uuid,
		update: JobUpdate,
	) -> BoxFuture<'a, Result<SearchJob>> {
		Box::pin(async move { self.merge(request_id, update) })
	}
}

/// Keeps at most `max_entries` entries per user, oldest evicted first.
#[derive(Debug)]
pub struct MemoryHistoryStore {
	max_entries: usize,
	entries: RwLock<HashMap<String, VecDeque<SearchHistoryEntry>>>,
}
impl MemoryHistoryStore {
	pub fn new(max_entries: usize) -> Self {
		Self { max_entries: max_entries.max(1), entries: RwLock::new(HashMap::new()) }
	}
}
impl HistoryStore for MemoryHistoryStore {
	fn append<'a>(&'a self, entry: &'a SearchHistoryEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());
			let user_entries = entries.entry(entry.user_id.clone()).or_default();

			user_entries.push_back(entry.clone());

			while user_entries.len() > self.max_entries {
				user_entries.pop_front();
			}

			Ok(())
		})
	}

	fn list<'a>(
		&'a self,
		user_id: &'a str,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<SearchHistoryEntry>>> {
		Box::pin(async move {
			let entries = self.entries.read().unwrap_or_else(|err| err.into_inner());

			Ok(entries
				.get(user_id)
				.map(|user_entries| user_entries.iter().rev().take(limit).cloned().collect())
				.unwrap_or_default())
		})
	}
}
