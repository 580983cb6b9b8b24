//! Structured events search over a SerpAPI-compatible `google_events` endpoint.

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use scout_config::SearchApiProviderConfig;
use scout_domain::{Listing, prompt::SearchQuery};

pub async fn search(cfg: &SearchApiProviderConfig, query: &SearchQuery) -> Result<Vec<Listing>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.get(&url)
		.headers(crate::extra_headers(&cfg.default_headers)?)
		.query(&query_pairs(cfg, query))
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_events_response(&json)
}

pub fn query_pairs(
	cfg: &SearchApiProviderConfig,
	query: &SearchQuery,
) -> Vec<(&'static str, String)> {
	let mut pairs = vec![
		("engine", cfg.engine.clone()),
		("q", query.text.clone()),
		("location", query.location.clone()),
		("api_key", cfg.api_key.clone()),
	];

	if let Some(filter) = query.time_filter {
		pairs.push(("htichips", filter.chip().to_string()));
	}

	pairs
}

pub fn parse_events_response(json: &Value) -> Result<Vec<Listing>> {
	if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
		return Err(eyre::eyre!("Events search failed: {error}"));
	}

	let Some(results) = json.get("events_results").and_then(|v| v.as_array()) else {
		return Ok(Vec::new());
	};

	Ok(results.iter().filter_map(parse_listing).collect())
}

fn parse_listing(item: &Value) -> Option<Listing> {
	let title = text(item.get("title"))?;
	let date = item.get("date").and_then(|date| {
		text(date.get("when")).or_else(|| text(date.get("start_date")))
	});
	let address = item.get("address").and_then(|v| v.as_array()).and_then(|lines| {
		let joined = lines.iter().filter_map(|line| line.as_str()).collect::<Vec<_>>().join(", ");

		(!joined.trim().is_empty()).then_some(joined)
	});
	let tickets = item.get("ticket_info").and_then(|v| v.as_array());
	let ticket_info = tickets
		.and_then(|tickets| tickets.iter().find_map(|ticket| text(ticket.get("price"))))
		.or_else(|| text(item.get("price")));
	let link = text(item.get("link")).or_else(|| {
		tickets.and_then(|tickets| tickets.iter().find_map(|ticket| text(ticket.get("link"))))
	});

	Some(Listing {
		title,
		date,
		address,
		description: text(item.get("description")),
		venue: item.get("venue").and_then(|venue| text(venue.get("name"))),
		ticket_info,
		link,
	})
}

fn text(value: Option<&Value>) -> Option<String> {
	value
		.and_then(|v| v.as_str())
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.map(str::to_string)
}
