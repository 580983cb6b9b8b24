use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, Error, HistoryStore, JobStore, Result,
	db::Db,
	models::{JobStatus, JobUpdate, SearchHistoryEntry, SearchJob},
};

const JOB_COLUMNS: &str = "\
request_id,
	user_id,
	status,
	search_params,
	current_step,
	results,
	error,
	submitted_at,
	updated_at,
	completed_at,
	processing_time_ms";

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
	request_id: Uuid,
	user_id: String,
	status: String,
	search_params: Value,
	current_step: Option<String>,
	results: Option<Value>,
	error: Option<String>,
	submitted_at: OffsetDateTime,
	updated_at: OffsetDateTime,
	completed_at: Option<OffsetDateTime>,
	processing_time_ms: Option<i64>,
}
impl TryFrom<JobRow> for SearchJob {
	type Error = Error;

	fn try_from(row: JobRow) -> Result<Self> {
		let status = JobStatus::parse(&row.status).ok_or_else(|| {
			Error::Corrupt(format!("Job {} has unknown status {:?}.", row.request_id, row.status))
		})?;
		let results = row.results.map(serde_json::from_value).transpose()?;

		Ok(Self {
			request_id: row.request_id,
			user_id: row.user_id,
			status,
			search_params: serde_json::from_value(row.search_params)?,
			current_step: row.current_step,
			results,
			error: row.error,
			submitted_at: row.submitted_at,
			updated_at: row.updated_at,
			completed_at: row.completed_at,
			processing_time_ms: row.processing_time_ms,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
	entry_id: Uuid,
	user_id: String,
	request_id: Option<Uuid>,
	search_params: Value,
	events: Value,
	raw_text: String,
	searched_at: OffsetDateTime,
}
impl TryFrom<HistoryRow> for SearchHistoryEntry {
	type Error = Error;

	fn try_from(row: HistoryRow) -> Result<Self> {
		Ok(Self {
			entry_id: row.entry_id,
			user_id: row.user_id,
			request_id: row.request_id,
			search_params: serde_json::from_value(row.search_params)?,
			events: serde_json::from_value(row.events)?,
			raw_text: row.raw_text,
			searched_at: row.searched_at,
		})
	}
}

pub struct PgJobStore {
	db: Db,
}
impl PgJobStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	async fn insert(&self, job: &SearchJob) -> Result<()> {
		let results = job.results.as_ref().map(serde_json::to_value).transpose()?;
		let inserted = sqlx::query(
			"\
INSERT INTO search_jobs (
	request_id,
	user_id,
	status,
	search_params,
	current_step,
	results,
	error,
	submitted_at,
	updated_at,
	completed_at,
	processing_time_ms
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
ON CONFLICT (request_id) DO NOTHING",
		)
		.bind(job.request_id)
		.bind(job.user_id.as_str())
		.bind(job.status.as_str())
		.bind(serde_json::to_value(&job.search_params)?)
		.bind(job.current_step.as_deref())
		.bind(results)
		.bind(job.error.as_deref())
		.bind(job.submitted_at)
		.bind(job.updated_at)
		.bind(job.completed_at)
		.bind(job.processing_time_ms)
		.execute(&self.db.pool)
		.await?;

		if inserted.rows_affected() == 0 {
			return Err(Error::Conflict(format!("Job {} already exists.", job.request_id)));
		}

		Ok(())
	}

	async fn fetch(&self, request_id: Uuid) -> Result<Option<SearchJob>> {
		let sql = format!("SELECT {JOB_COLUMNS} FROM search_jobs WHERE request_id = $1");
		let row: Option<JobRow> =
			sqlx::query_as(&sql).bind(request_id).fetch_optional(&self.db.pool).await?;

		row.map(SearchJob::try_from).transpose()
	}

	async fn merge(&self, request_id: Uuid, update: JobUpdate) -> Result<SearchJob> {
		let mut tx = self.db.pool.begin().await?;
		let sql = format!("SELECT {JOB_COLUMNS} FROM search_jobs WHERE request_id = $1 FOR UPDATE");
		let row: Option<JobRow> =
			sqlx::query_as(&sql).bind(request_id).fetch_optional(&mut *tx).await?;
		let mut job = match row {
			Some(row) => SearchJob::try_from(row)?,
			None => return Err(Error::NotFound(format!("Job {request_id} does not exist."))),
		};

		job.apply(update, OffsetDateTime::now_utc())?;

		let results = job.results.as_ref().map(serde_json::to_value).transpose()?;

		sqlx::query(
			"\
UPDATE search_jobs
SET
	status = $2,
	current_step = $3,
	results = $4,
	error = $5,
	updated_at = $6,
	completed_at = $7,
	processing_time_ms = $8
WHERE request_id = $1",
		)
		.bind(job.request_id)
		.bind(job.status.as_str())
		.bind(job.current_step.as_deref())
		.bind(results)
		.bind(job.error.as_deref())
		.bind(job.updated_at)
		.bind(job.completed_at)
		.bind(job.processing_time_ms)
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(job)
	}
}
impl JobStore for PgJobStore {
	fn create<'a>(&'a self, job: &'a SearchJob) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.insert(job))
	}

	fn get<'a>(&'a self, request_id: Uuid) -> BoxFuture<'a, Result<Option<SearchJob>>> {
		Box::pin(self.fetch(request_id))
	}

	fn update<'a>(
		&'a self,
		request_id: Uuid,
		update: JobUpdate,
	) -> BoxFuture<'a, Result<SearchJob>> {
		Box::pin(self.merge(request_id, update))
	}
}

pub struct PgHistoryStore {
	db: Db,
	max_entries: i64,
}
impl PgHistoryStore {
	pub fn new(db: Db, max_entries: u32) -> Self {
		Self { db, max_entries: i64::from(max_entries.max(1)) }
	}

	async fn insert(&self, entry: &SearchHistoryEntry) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		sqlx::query(
			"\
INSERT INTO search_history (
	entry_id,
	user_id,
	request_id,
	search_params,
	events,
	raw_text,
	searched_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7)",
		)
		.bind(entry.entry_id)
		.bind(entry.user_id.as_str())
		.bind(entry.request_id)
		.bind(serde_json::to_value(&entry.search_params)?)
		.bind(serde_json::to_value(&entry.events)?)
		.bind(entry.raw_text.as_str())
		.bind(entry.searched_at)
		.execute(&mut *tx)
		.await?;
		sqlx::query(
			"\
DELETE FROM search_history
WHERE user_id = $1
	AND entry_id NOT IN (
		SELECT entry_id
		FROM search_history
		WHERE user_id = $1
		ORDER BY searched_at DESC
		LIMIT $2
	)",
		)
		.bind(entry.user_id.as_str())
		.bind(self.max_entries)
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(())
	}

	async fn fetch(&self, user_id: &str, limit: usize) -> Result<Vec<SearchHistoryEntry>> {
		let limit = i64::try_from(limit).unwrap_or(i64::MAX);
		let rows: Vec<HistoryRow> = sqlx::query_as(
			"\
SELECT
	entry_id,
	user_id,
	request_id,
	search_params,
	events,
	raw_text,
	searched_at
FROM search_history
WHERE user_id = $1
ORDER BY searched_at DESC
LIMIT $2",
		)
		.bind(user_id)
		.bind(limit)
		.fetch_all(&self.db.pool)
		.await?;

		rows.into_iter().map(SearchHistoryEntry::try_from).collect()
	}
}
impl HistoryStore for PgHistoryStore {
	fn append<'a>(&'a self, entry: &'a SearchHistoryEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.insert(entry))
	}

	fn list<'a>(
		&'a self,
		user_id: &'a str,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<SearchHistoryEntry>>> {
		Box::pin(self.fetch(user_id, limit))
	}
}
