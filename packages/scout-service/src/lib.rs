pub mod dispatch;
pub mod history;
pub mod search;
pub mod status;
pub mod submit;
pub mod worker;

mod error;

pub use dispatch::{Dispatcher, OutboxDispatcher, SpawnDispatcher};
pub use error::{Error, Result};
pub use history::{HistoryRequest, HistoryResponse};
pub use scout_storage::BoxFuture;
pub use search::{SearchRequest, SearchResponse};
pub use status::{StatusRequest, StatusResponse};
pub use submit::{DISPATCH_DELAYED_NOTE, SubmitRequest, SubmitResponse};
pub use worker::{ResultSource, SearchOutcome, SearchWorker};

use std::sync::Arc;

use serde_json::Value;

use scout_config::{Config, LlmProviderConfig, SearchApiProviderConfig};
use scout_domain::{Listing, SearchParams, prompt::SearchQuery};
use scout_providers::{chat, events};
use scout_storage::{HistoryStore, JobStore};

pub const LOCATION_REQUIRED: &str = "search_params.location is required.";

/// Structured events search returning raw listings.
pub trait PrimarySearchProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a SearchApiProviderConfig,
		query: &'a SearchQuery,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Listing>>>;
}

/// General web search through a chat model, answering in free text.
pub trait SecondarySearchProvider
where
	Self: Send + Sync,
{
	fn answer<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// Chat model asked to turn acquired text into a JSON array of events.
pub trait FormatterProvider
where
	Self: Send + Sync,
{
	fn format<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub primary: Arc<dyn PrimarySearchProvider>,
	pub secondary: Arc<dyn SecondarySearchProvider>,
	pub formatter: Arc<dyn FormatterProvider>,
}
impl Providers {
	pub fn new(
		primary: Arc<dyn PrimarySearchProvider>,
		secondary: Arc<dyn SecondarySearchProvider>,
		formatter: Arc<dyn FormatterProvider>,
	) -> Self {
		Self { primary, secondary, formatter }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { primary: provider.clone(), secondary: provider.clone(), formatter: provider }
	}
}

struct DefaultProviders;
impl PrimarySearchProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a SearchApiProviderConfig,
		query: &'a SearchQuery,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Listing>>> {
		Box::pin(events::search(cfg, query))
	}
}
impl SecondarySearchProvider for DefaultProviders {
	fn answer<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(chat::complete(cfg, messages))
	}
}
impl FormatterProvider for DefaultProviders {
	fn format<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(chat::complete(cfg, messages))
	}
}

/// Gateway over the job store, the history store, and the worker.
pub struct ScoutService {
	pub cfg: Config,
	pub jobs: Arc<dyn JobStore>,
	pub history: Arc<dyn HistoryStore>,
	pub worker: Arc<SearchWorker>,
	pub dispatcher: Arc<dyn Dispatcher>,
}
impl ScoutService {
	pub fn new(
		cfg: Config,
		jobs: Arc<dyn JobStore>,
		history: Arc<dyn HistoryStore>,
		worker: Arc<SearchWorker>,
		dispatcher: Arc<dyn Dispatcher>,
	) -> Self {
		Self { cfg, jobs, history, worker, dispatcher }
	}

	/// Runs submitted jobs as tasks on the current tokio runtime.
	pub fn with_spawn_dispatch(
		cfg: Config,
		providers: Providers,
		jobs: Arc<dyn JobStore>,
		history: Arc<dyn HistoryStore>,
	) -> Self {
		let worker = Arc::new(SearchWorker::new(
			cfg.clone(),
			providers,
			Arc::clone(&jobs),
			Arc::clone(&history),
		));
		let dispatcher = Arc::new(SpawnDispatcher::new(Arc::clone(&worker)));

		Self::new(cfg, jobs, history, worker, dispatcher)
	}
}

/// Normalized criteria, or `InvalidRequest` when no location is given.
pub fn validated_params(params: &SearchParams) -> Result<SearchParams> {
	let params = params.normalized();

	if params.location().is_none() {
		return Err(Error::InvalidRequest { message: LOCATION_REQUIRED.to_string() });
	}

	Ok(params)
}
