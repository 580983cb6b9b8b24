//! Background search pipeline.
//!
//! A job moves `submitted` -> `processing` -> `completed` | `failed`. Data acquisition falls back
//! from the primary events search to the secondary web search and finally to static suggestions,
//! which cannot fail. Formatting falls back from the formatter model to the local extractor. A
//! job only fails on an unexpected error, a panic, or the job deadline.

use std::{
	sync::Arc,
	time::{Duration, Instant},
};

use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{BoxFuture, Providers, Result};
use scout_config::Config;
use scout_domain::{Event, SearchParams, extractor, normalize, params::is_anonymous, prompt};
use scout_storage::{
	HistoryStore, JobStore,
	models::{JobPayload, JobUpdate, SearchHistoryEntry},
};

pub const STEP_GATHERING: &str = "Gathering data from multiple sources";
pub const STEP_SECONDARY: &str = "Primary source unavailable, searching the web";
pub const STEP_SUGGESTIONS: &str = "Preparing general suggestions";
pub const STEP_FORMATTING: &str = "Formatting and curating results";

/// Which link of the acquisition chain produced the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
	PrimarySearch,
	SecondarySearch,
	StaticSuggestions,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
	pub events: Vec<Event>,
	pub source: ResultSource,
	pub raw_text: String,
}

struct Acquired {
	text: String,
	source: ResultSource,
}

pub struct SearchWorker {
	cfg: Config,
	providers: Providers,
	jobs: Arc<dyn JobStore>,
	history: Arc<dyn HistoryStore>,
}
impl SearchWorker {
	pub fn new(
		cfg: Config,
		providers: Providers,
		jobs: Arc<dyn JobStore>,
		history: Arc<dyn HistoryStore>,
	) -> Self {
		Self { cfg, providers, jobs, history }
	}

	/// Drives one job to a terminal state.
	///
	/// Returns an error only when the terminal state could not be persisted. A job that is
	/// already terminal is left alone.
	pub async fn run(self: Arc<Self>, payload: JobPayload) -> Result<()> {
		let request_id = payload.request_id;
		let started = Instant::now();

		match self.jobs.update(request_id, JobUpdate::processing(STEP_GATHERING)).await {
			Ok(_) => {},
			Err(scout_storage::Error::Conflict(message)) => {
				tracing::info!(
					%request_id,
					reason = %message,
					"Search job already finished. Skipping."
				);

				return Ok(());
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					%request_id,
					"Failed to mark search job as processing."
				);
			},
		}

		let deadline = Duration::from_millis(self.cfg.jobs.job_timeout_ms);
		let worker = Arc::clone(&self);
		let mut task = tokio::spawn(async move {
			worker.search(&payload.search_params, &payload.user_id, Some(payload.request_id)).await
		});
		let outcome = match tokio::time::timeout(deadline, &mut task).await {
			Ok(Ok(result)) => result.map(|outcome| outcome.events).map_err(|err| err.to_string()),
			Ok(Err(err)) if err.is_panic() => Err("Search worker panicked.".to_string()),
			Ok(Err(_)) => Err("Search worker was cancelled.".to_string()),
			Err(_) => {
				task.abort();

				Err(format!("Search exceeded the job deadline of {} ms.", deadline.as_millis()))
			},
		};
		let processing_time_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
		let now = OffsetDateTime::now_utc();
		let update = match outcome {
			Ok(events) => {
				tracing::info!(
					%request_id,
					events = events.len(),
					processing_time_ms,
					"Search job completed."
				);

				JobUpdate::completed(events, now, processing_time_ms)
			},
			Err(message) => {
				tracing::warn!(%request_id, error = %message, "Search job failed.");

				JobUpdate::failed(message, now, processing_time_ms)
			},
		};

		if let Err(err) = self.jobs.update(request_id, update).await {
			tracing::error!(error = %err, %request_id, "Failed to record the final job state.");

			return Err(err.into());
		}

		Ok(())
	}

	/// Acquires, formats, and records one search. Progress steps are written only when a
	/// `request_id` is given.
	pub async fn search(
		&self,
		params: &SearchParams,
		user_id: &str,
		request_id: Option<Uuid>,
	) -> Result<SearchOutcome> {
		let params = crate::validated_params(params)?;
		let location = params.location().unwrap_or_default().to_string();
		let acquired = self.acquire(&params, request_id).await;

		self.set_step(request_id, STEP_FORMATTING).await;

		let events = self.format(&acquired.text, &params, &location).await;

		if !is_anonymous(user_id) {
			self.record_history(user_id, request_id, &params, &events, &acquired.text).await;
		}

		Ok(SearchOutcome { events, source: acquired.source, raw_text: acquired.text })
	}

	async fn acquire(&self, params: &SearchParams, request_id: Option<Uuid>) -> Acquired {
		match self.search_primary(params).await {
			Ok(text) => return Acquired { text, source: ResultSource::PrimarySearch },
			Err(err) => {
				tracing::warn!(error = %err, ?request_id, "Primary events search failed.");
			},
		}

		self.set_step(request_id, STEP_SECONDARY).await;

		match self.search_secondary(params).await {
			Ok(text) => return Acquired { text, source: ResultSource::SecondarySearch },
			Err(err) => {
				tracing::warn!(error = %err, ?request_id, "Secondary web search failed.");
			},
		}

		self.set_step(request_id, STEP_SUGGESTIONS).await;

		Acquired {
			text: prompt::static_suggestions(params),
			source: ResultSource::StaticSuggestions,
		}
	}

	async fn search_primary(&self, params: &SearchParams) -> color_eyre::Result<String> {
		let cfg = self
			.cfg
			.providers
			.primary_search
			.as_ref()
			.ok_or_else(|| eyre::eyre!("Primary search provider is not configured."))?;
		let query = prompt::search_query(params);
		let listings =
			self.bounded("Primary search", self.providers.primary.search(cfg, &query)).await?;
		let text = prompt::format_listings(&listings);

		if text.trim().is_empty() {
			return Err(eyre::eyre!("Primary search returned no events."));
		}

		Ok(text)
	}

	async fn search_secondary(&self, params: &SearchParams) -> color_eyre::Result<String> {
		let cfg = self
			.cfg
			.providers
			.secondary_search
			.as_ref()
			.ok_or_else(|| eyre::eyre!("Secondary search provider is not configured."))?;
		let messages = prompt::build_search_messages(params);
		let text = self
			.bounded("Secondary search", self.providers.secondary.answer(cfg, &messages))
			.await?;

		if text.trim().is_empty() {
			return Err(eyre::eyre!("Secondary search returned an empty answer."));
		}

		Ok(text)
	}

	/// Formatter output when it parses as a JSON array, the extractor's reading otherwise.
	async fn format(&self, text: &str, params: &SearchParams, location: &str) -> Vec<Event> {
		let Some(cfg) = self.cfg.providers.formatter.as_ref() else {
			tracing::debug!("Formatter is not configured. Using the extractor.");

			return extractor::extract_events(text, location);
		};
		let messages = prompt::build_format_messages(text, params);

		match self.bounded("Formatter", self.providers.formatter.format(cfg, &messages)).await {
			Ok(output) => match normalize::parse_event_array(&output, location) {
				Some(events) => events,
				None => {
					tracing::warn!("Formatter output is not a JSON array. Using the extractor.");

					extractor::extract_events(text, location)
				},
			},
			Err(err) => {
				tracing::warn!(error = %err, "Formatter failed. Using the extractor.");

				extractor::extract_events(text, location)
			},
		}
	}

	async fn record_history(
		&self,
		user_id: &str,
		request_id: Option<Uuid>,
		params: &SearchParams,
		events: &[Event],
		raw_text: &str,
	) {
		let limits = &self.cfg.history;
		let entry = SearchHistoryEntry {
			entry_id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			request_id,
			search_params: params.clone(),
			events: events.to_vec(),
			raw_text: raw_text.to_string(),
			searched_at: OffsetDateTime::now_utc(),
		}
		.bounded(limits.max_events as usize, limits.max_raw_chars as usize);

		if let Err(err) = self.history.append(&entry).await {
			tracing::warn!(error = %err, user_id, ?request_id, "Failed to append search history.");
		}
	}

	async fn set_step(&self, request_id: Option<Uuid>, step: &str) {
		let Some(request_id) = request_id else {
			return;
		};

		if let Err(err) = self.jobs.update(request_id, JobUpdate::step(step)).await {
			tracing::warn!(error = %err, %request_id, step, "Failed to record job progress.");
		}
	}

	async fn bounded<T>(
		&self,
		label: &str,
		call: BoxFuture<'_, color_eyre::Result<T>>,
	) -> color_eyre::Result<T> {
		let limit = Duration::from_millis(self.cfg.jobs.provider_timeout_ms);

		tokio::time::timeout(limit, call)
			.await
			.map_err(|_| eyre::eyre!("{label} timed out after {} ms.", limit.as_millis()))?
	}
}
