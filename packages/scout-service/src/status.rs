use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, ScoutService};
use scout_domain::{Event, progress, time_serde};
use scout_storage::models::JobStatus;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StatusRequest {
	#[serde(alias = "requestId")]
	pub request_id: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StatusResponse {
	pub request_id: Uuid,
	pub status: JobStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub results: Option<Vec<Event>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub current_step: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub progress_message: Option<String>,
	#[serde(with = "time_serde")]
	pub submitted_at: OffsetDateTime,
	#[serde(default, with = "time_serde::option", skip_serializing_if = "Option::is_none")]
	pub completed_at: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub processing_time_ms: Option<i64>,
}

impl ScoutService {
	pub async fn status(&self, req: StatusRequest) -> Result<StatusResponse> {
		let raw = req.request_id.trim();

		if raw.is_empty() {
			return Err(Error::InvalidRequest { message: "request_id is required.".to_string() });
		}

		let request_id = Uuid::parse_str(raw).map_err(|_| Error::InvalidRequest {
			message: "request_id must be a UUID.".to_string(),
		})?;
		let job = self.jobs.get(request_id).await?.ok_or_else(|| Error::NotFound {
			message: format!("No search job with request_id {request_id}."),
		})?;
		let progress_message = (!job.status.is_terminal()).then(|| {
			let elapsed = OffsetDateTime::now_utc() - job.submitted_at;

			progress::progress_message(elapsed.try_into().unwrap_or_default()).to_string()
		});
		let current_step =
			if job.status == JobStatus::Processing { job.current_step } else { None };

		Ok(StatusResponse {
			request_id: job.request_id,
			status: job.status,
			results: job.results,
			error: job.error,
			current_step,
			progress_message,
			submitted_at: job.submitted_at,
			completed_at: job.completed_at,
			processing_time_ms: job.processing_time_ms,
		})
	}
}
