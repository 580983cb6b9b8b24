use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Result, ScoutService};
use scout_domain::{SearchParams, params::normalize_user_id, time_serde};
use scout_storage::models::{JobPayload, JobStatus, SearchJob};

pub const DISPATCH_DELAYED_NOTE: &str = "Background processing may be delayed.";

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SubmitRequest {
	#[serde(default, alias = "searchParams")]
	pub search_params: SearchParams,
	#[serde(default, alias = "userId")]
	pub user_id: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SubmitResponse {
	pub request_id: Uuid,
	pub status: JobStatus,
	#[serde(with = "time_serde")]
	pub estimated_completion_time: OffsetDateTime,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

impl ScoutService {
	/// Records a new job and dispatches it without waiting.
	///
	/// Only a missing location is an error. Failing to record the job or to dispatch it is logged
	/// and the submission is still accepted.
	pub async fn submit(&self, req: SubmitRequest) -> Result<SubmitResponse> {
		let search_params = crate::validated_params(&req.search_params)?;
		let user_id = normalize_user_id(req.user_id.as_deref());
		let now = OffsetDateTime::now_utc();
		let job = SearchJob::submitted(Uuid::new_v4(), user_id.clone(), search_params.clone(), now);
		let request_id = job.request_id;

		if let Err(err) = self.jobs.create(&job).await {
			tracing::warn!(
				error = %err,
				%request_id,
				"Failed to record search job. Status will be unavailable."
			);
		}

		let payload = JobPayload { request_id, user_id, search_params };
		let message = match self.dispatcher.dispatch(payload).await {
			Ok(()) => None,
			Err(err) => {
				tracing::warn!(error = %err, %request_id, "Failed to dispatch search job.");

				Some(DISPATCH_DELAYED_NOTE.to_string())
			},
		};
		let estimate = i64::try_from(self.cfg.jobs.estimated_completion_secs).unwrap_or(i64::MAX);

		tracing::info!(%request_id, "Search job submitted.");

		Ok(SubmitResponse {
			request_id,
			status: JobStatus::Submitted,
			estimated_completion_time: now.saturating_add(Duration::seconds(estimate)),
			message,
		})
	}
}
