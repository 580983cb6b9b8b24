use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub jobs: Jobs,
	#[serde(default)]
	pub history: History,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	/// One of "memory" or "postgres".
	pub backend: String,
	pub postgres: Option<Postgres>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Every provider section is optional. A missing section makes that step of the fallback chain
/// fail immediately, so the worker moves on to the next source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Providers {
	pub primary_search: Option<SearchApiProviderConfig>,
	pub secondary_search: Option<LlmProviderConfig>,
	pub formatter: Option<LlmProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchApiProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub engine: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	#[serde(default = "default_max_tokens")]
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Jobs {
	/// One of "spawn" or "outbox".
	pub dispatch: String,
	pub provider_timeout_ms: u64,
	pub job_timeout_ms: u64,
	pub estimated_completion_secs: u64,
	pub poll_interval_ms: u64,
	pub claim_lease_seconds: i64,
}
impl Default for Jobs {
	fn default() -> Self {
		Self {
			dispatch: "spawn".to_string(),
			provider_timeout_ms: 30_000,
			job_timeout_ms: 150_000,
			estimated_completion_secs: 60,
			poll_interval_ms: 500,
			claim_lease_seconds: 180,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct History {
	pub max_entries: u32,
	pub max_events: u32,
	pub max_raw_chars: u32,
}
impl Default for History {
	fn default() -> Self {
		Self { max_entries: 50, max_events: 25, max_raw_chars: 4_000 }
	}
}

fn default_max_tokens() -> u32 {
	2_048
}
