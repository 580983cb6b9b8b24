use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result};
use scout_domain::{Event, SearchParams, time_serde};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Submitted,
	Processing,
	Completed,
	Failed,
}
impl JobStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Submitted => "submitted",
			Self::Processing => "processing",
			Self::Completed => "completed",
			Self::Failed => "failed",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"submitted" => Some(Self::Submitted),
			"processing" => Some(Self::Processing),
			"completed" => Some(Self::Completed),
			"failed" => Some(Self::Failed),
			_ => None,
		}
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Completed | Self::Failed)
	}

	fn rank(self) -> u8 {
		match self {
			Self::Submitted => 0,
			Self::Processing => 1,
			Self::Completed | Self::Failed => 2,
		}
	}
}

/// Durable record of one asynchronous search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchJob {
	pub request_id: Uuid,
	pub user_id: String,
	pub status: JobStatus,
	pub search_params: SearchParams,
	pub current_step: Option<String>,
	pub results: Option<Vec<Event>>,
	pub error: Option<String>,
	#[serde(with = "time_serde")]
	pub submitted_at: OffsetDateTime,
	#[serde(with = "time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(default, with = "time_serde::option")]
	pub completed_at: Option<OffsetDateTime>,
	pub processing_time_ms: Option<i64>,
}
impl SearchJob {
	pub fn submitted(
		request_id: Uuid,
		user_id: impl Into<String>,
		search_params: SearchParams,
		now: OffsetDateTime,
	) -> Self {
		Self {
			request_id,
			user_id: user_id.into(),
			status: JobStatus::Submitted,
			search_params,
			current_step: None,
			results: None,
			error: None,
			submitted_at: now,
			updated_at: now,
			completed_at: None,
			processing_time_ms: None,
		}
	}

	/// Merges `update` into the record.
	///
	/// Status only moves forward (`submitted` -> `processing` -> one terminal state) and a terminal
	/// record accepts no further changes. `results` belong to `completed` and `error` belongs to
	/// `failed`. Reaching a terminal state clears `current_step`. The record is left untouched when
	/// the update is rejected.
	pub fn apply(&mut self, update: JobUpdate, now: OffsetDateTime) -> Result<()> {
		if self.status.is_terminal() {
			return Err(Error::Conflict(format!(
				"Job {} is already {}.",
				self.request_id,
				self.status.as_str()
			)));
		}

		let target = update.status.unwrap_or(self.status);

		if target.rank() < self.status.rank() {
			return Err(Error::Conflict(format!(
				"Job {} cannot move from {} to {}.",
				self.request_id,
				self.status.as_str(),
				target.as_str()
			)));
		}
		if update.results.is_some() && target != JobStatus::Completed {
			return Err(Error::InvalidArgument(
				"results are only accepted with status completed.".to_string(),
			));
		}
		if update.error.is_some() && target != JobStatus::Failed {
			return Err(Error::InvalidArgument(
				"error is only accepted with status failed.".to_string(),
			));
		}
		if target == JobStatus::Completed && update.results.is_none() {
			return Err(Error::InvalidArgument("status completed requires results.".to_string()));
		}
		if target == JobStatus::Failed && update.error.is_none() {
			return Err(Error::InvalidArgument("status failed requires an error.".to_string()));
		}

		self.status = target;

		if target.is_terminal() {
			self.current_step = None;
			self.results = update.results;
			self.error = update.error;
			self.completed_at = Some(update.completed_at.unwrap_or(now));
			self.processing_time_ms = update.processing_time_ms;
		} else if let Some(step) = update.current_step {
			self.current_step = Some(step);
		}

		self.updated_at = now;

		Ok(())
	}
}

/// Partial change to a [`SearchJob`]. Absent fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobUpdate {
	pub status: Option<JobStatus>,
	pub current_step: Option<String>,
	pub results: Option<Vec<Event>>,
	pub error: Option<String>,
	pub completed_at: Option<OffsetDateTime>,
	pub processing_time_ms: Option<i64>,
}
impl JobUpdate {
	pub fn processing(step: impl Into<String>) -> Self {
		Self {
			status: Some(JobStatus::Processing),
			current_step: Some(step.into()),
			..Default::default()
		}
	}

	pub fn step(step: impl Into<String>) -> Self {
		Self { current_step: Some(step.into()), ..Default::default() }
	}

	pub fn completed(
		results: Vec<Event>,
		completed_at: OffsetDateTime,
		processing_time_ms: i64,
	) -> Self {
		Self {
			status: Some(JobStatus::Completed),
			results: Some(results),
			completed_at: Some(completed_at),
			processing_time_ms: Some(processing_time_ms),
			..Default::default()
		}
	}

	pub fn failed(
		error: impl Into<String>,
		completed_at: OffsetDateTime,
		processing_time_ms: i64,
	) -> Self {
		Self {
			status: Some(JobStatus::Failed),
			error: Some(error.into()),
			completed_at: Some(completed_at),
			processing_time_ms: Some(processing_time_ms),
			..Default::default()
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
	pub entry_id: Uuid,
	pub user_id: String,
	pub request_id: Option<Uuid>,
	pub search_params: SearchParams,
	pub events: Vec<Event>,
	pub raw_text: String,
	#[serde(with = "time_serde")]
	pub searched_at: OffsetDateTime,
}
impl SearchHistoryEntry {
	/// Caps the stored events and raw text so one entry stays small.
	pub fn bounded(mut self, max_events: usize, max_raw_chars: usize) -> Self {
		self.events.truncate(max_events);

		if self.raw_text.chars().count() > max_raw_chars {
			self.raw_text = self.raw_text.chars().take(max_raw_chars).collect();
		}

		self
	}
}

/// Work item handed from the gateway to a background worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
	pub request_id: Uuid,
	pub user_id: String,
	pub search_params: SearchParams,
}

#[derive(Debug, sqlx::FromRow)]
pub struct DispatchOutboxEntry {
	pub outbox_id: Uuid,
	pub request_id: Uuid,
	pub payload: Value,
	pub status: String,
	pub attempts: i32,
	pub last_error: Option<String>,
	pub available_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl DispatchOutboxEntry {
	pub fn job_payload(&self) -> Result<JobPayload> {
		Ok(serde_json::from_value(self.payload.clone())?)
	}
}
