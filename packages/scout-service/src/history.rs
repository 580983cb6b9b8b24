use crate::{Error, Result, ScoutService};
use scout_domain::params::is_anonymous;
use scout_storage::models::SearchHistoryEntry;

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HistoryRequest {
	#[serde(alias = "userId")]
	pub user_id: String,
	#[serde(default)]
	pub limit: Option<usize>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HistoryResponse {
	pub entries: Vec<SearchHistoryEntry>,
}

impl ScoutService {
	/// Newest-first history of a named user, capped at `history.max_entries`.
	pub async fn history(&self, req: HistoryRequest) -> Result<HistoryResponse> {
		let user_id = req.user_id.trim();

		if user_id.is_empty() || is_anonymous(user_id) {
			return Err(Error::InvalidRequest {
				message: "user_id must name a registered user.".to_string(),
			});
		}

		let max_entries = self.cfg.history.max_entries as usize;
		let limit = req.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, max_entries.max(1));
		let entries = self.history.list(user_id, limit).await?;

		Ok(HistoryResponse { entries })
	}
}
