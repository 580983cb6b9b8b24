//! Durable dispatch queue feeding `scout-worker`.
//!
//! Rows move `PENDING` -> `DONE`, or `PENDING` -> `FAILED` -> (retry) -> `DONE`. A claim pushes
//! `available_at` forward by the lease so a crashed worker's job becomes claimable again.

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{DispatchOutboxEntry, JobPayload},
};

pub const BASE_BACKOFF_MS: i64 = 500;
pub const MAX_BACKOFF_MS: i64 = 30_000;
pub const MAX_OUTBOX_ERROR_CHARS: usize = 1_024;

pub async fn enqueue(db: &Db, payload: &JobPayload) -> Result<Uuid> {
	let outbox_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO search_dispatch_outbox (outbox_id, request_id, payload, status)
VALUES ($1, $2, $3, 'PENDING')",
	)
	.bind(outbox_id)
	.bind(payload.request_id)
	.bind(serde_json::to_value(payload)?)
	.execute(&db.pool)
	.await?;

	Ok(outbox_id)
}

pub async fn claim_next(
	db: &Db,
	now: OffsetDateTime,
	lease: Duration,
) -> Result<Option<DispatchOutboxEntry>> {
	let mut tx = db.pool.begin().await?;
	let row: Option<DispatchOutboxEntry> = sqlx::query_as(
		"\
SELECT
	outbox_id,
	request_id,
	payload,
	status,
	attempts,
	last_error,
	available_at,
	created_at,
	updated_at
FROM search_dispatch_outbox
WHERE status IN ('PENDING','FAILED') AND available_at <= $1
ORDER BY available_at ASC
LIMIT 1
FOR UPDATE SKIP LOCKED",
	)
	.bind(now)
	.fetch_optional(&mut *tx)
	.await?;
	let entry = if let Some(mut entry) = row {
		let lease_until = now + lease;

		sqlx::query(
			"UPDATE search_dispatch_outbox SET available_at = $1, updated_at = $2 WHERE outbox_id = $3",
		)
		.bind(lease_until)
		.bind(now)
		.bind(entry.outbox_id)
		.execute(&mut *tx)
		.await?;

		entry.available_at = lease_until;
		entry.updated_at = now;

		Some(entry)
	} else {
		None
	};

	tx.commit().await?;

	Ok(entry)
}

pub async fn mark_done(db: &Db, outbox_id: Uuid) -> Result<()> {
	sqlx::query(
		"UPDATE search_dispatch_outbox SET status = 'DONE', updated_at = $1 WHERE outbox_id = $2",
	)
	.bind(OffsetDateTime::now_utc())
	.bind(outbox_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn mark_failed(db: &Db, outbox_id: Uuid, attempts: i32, error: &str) -> Result<()> {
	let next_attempts = attempts.saturating_add(1);
	let now = OffsetDateTime::now_utc();
	let available_at = now + backoff_for_attempt(next_attempts);

	sqlx::query(
		"\
UPDATE search_dispatch_outbox
SET
	status = 'FAILED',
	attempts = $1,
	last_error = $2,
	available_at = $3,
	updated_at = $4
WHERE outbox_id = $5",
	)
	.bind(next_attempts)
	.bind(sanitize_error(error))
	.bind(available_at)
	.bind(now)
	.bind(outbox_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub fn backoff_for_attempt(attempt: i32) -> Duration {
	let attempts = attempt.max(1) as u32;
	let exp = attempts.saturating_sub(1).min(6);
	let base = BASE_BACKOFF_MS.saturating_mul(1 << exp);

	Duration::milliseconds(base.min(MAX_BACKOFF_MS))
}

/// Redacts credentials and caps the length of an error before it is persisted.
pub fn sanitize_error(text: &str) -> String {
	let mut parts = Vec::new();
	let mut redact_next = false;

	for raw in text.split_whitespace() {
		let mut word = raw.to_string();

		if redact_next {
			word = "[REDACTED]".to_string();
			redact_next = false;
		}
		if raw.eq_ignore_ascii_case("bearer") {
			redact_next = true;
		}

		let lowered = raw.to_ascii_lowercase();

		for key in ["api_key", "apikey", "password", "secret", "token"] {
			if lowered.contains(key) && (lowered.contains('=') || lowered.contains(':')) {
				let sep = if raw.contains('=') { '=' } else { ':' };
				let prefix = raw.split(sep).next().unwrap_or(raw);

				word = format!("{prefix}{sep}[REDACTED]");

				break;
			}
		}

		parts.push(word);
	}

	let mut out = parts.join(" ");

	if out.chars().count() > MAX_OUTBOX_ERROR_CHARS {
		out = out.chars().take(MAX_OUTBOX_ERROR_CHARS).collect();
		out.push_str("...");
	}

	out
}
