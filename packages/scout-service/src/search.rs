use crate::{Result, ScoutService, worker::ResultSource};
use scout_domain::{Event, SearchParams, params::normalize_user_id};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	#[serde(default, alias = "searchParams")]
	pub search_params: SearchParams,
	#[serde(default, alias = "userId")]
	pub user_id: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
	pub events: Vec<Event>,
	pub source: ResultSource,
}

impl ScoutService {
	/// Runs the search pipeline inline, without a job record.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let search_params = crate::validated_params(&req.search_params)?;
		let user_id = normalize_user_id(req.user_id.as_deref());
		let outcome = self.worker.search(&search_params, &user_id, None).await?;

		Ok(SearchResponse { events: outcome.events, source: outcome.source })
	}
}
