//! Parsing of formatter output into [`Event`] records.

use serde::Deserialize;
use serde_json::Value;

use crate::event::{DATE_TBA, Event, PRICE_TBA};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FormattedEvent {
	#[serde(alias = "title")]
	name: Option<String>,
	description: Option<String>,
	#[serde(alias = "when")]
	date: Option<String>,
	#[serde(alias = "venue", alias = "address")]
	location: Option<String>,
	#[serde(alias = "cost")]
	price: Option<String>,
	#[serde(alias = "url", alias = "link")]
	source: Option<String>,
	category: Option<String>,
}

/// Parses formatter output expected to hold a JSON array of events.
///
/// Returns `None` when the output is not a JSON array, which callers treat as a parse failure.
/// Markdown code fences and prose around the array are tolerated. Elements that are not objects
/// or have no name are skipped; missing fields get the usual defaults.
pub fn parse_event_array(output: &str, fallback_location: &str) -> Option<Vec<Event>> {
	let candidate = array_slice(output)?;
	let Value::Array(items) = serde_json::from_str::<Value>(candidate).ok()? else {
		return None;
	};
	let mut events = Vec::with_capacity(items.len());

	for item in items {
		if !item.is_object() {
			continue;
		}

		let Ok(raw) = serde_json::from_value::<FormattedEvent>(item) else {
			continue;
		};
		let Some(name) = text(raw.name) else {
			continue;
		};

		events.push(Event {
			name,
			description: text(raw.description).unwrap_or_default(),
			date: text(raw.date).unwrap_or_else(|| DATE_TBA.to_string()),
			location: text(raw.location).unwrap_or_else(|| fallback_location.trim().to_string()),
			price: text(raw.price).unwrap_or_else(|| PRICE_TBA.to_string()),
			source: text(raw.source).unwrap_or_default(),
			category: text(raw.category),
		});
	}

	Some(events)
}

fn array_slice(output: &str) -> Option<&str> {
	let start = output.find('[')?;
	let end = output.rfind(']')?;

	(end > start).then(|| &output[start..=end])
}

fn text(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
