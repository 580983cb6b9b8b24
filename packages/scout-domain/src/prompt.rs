//! Deterministic text built from search criteria: queries, LLM prompts, listing digests, and the
//! static suggestions used when every search source fails.

use serde_json::Value;

use crate::{
	event::Listing,
	params::{SearchParams, TimeFilter},
};

const FORMAT_SYSTEM_PROMPT: &str = "\
You convert event search results into structured data. Respond with a JSON array only, no prose \
and no code fences. Each element must be an object with the string fields \"name\", \
\"description\", \"date\", \"location\", \"price\", \"source\", and \"category\". Use \"Date TBA\" \
or \"Price TBA\" when unknown, \"Free\" for free events, and an empty string for an unknown \
source. Keep the events in the order they appear. Return [] when the text contains no events.";

const SEARCH_SYSTEM_PROMPT: &str = "\
You are a local events researcher. List real, upcoming events only. For each event write the \
name in bold on its own line, followed by lines labeled Date:, Location:, Price:, and Link:, then \
a one or two sentence description.";

/// Structured request for a primary events search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
	pub text: String,
	pub location: String,
	pub time_filter: Option<TimeFilter>,
}

/// Free-text query naming every meaningful criterion, e.g.
/// `"Food events in Vaduz this month"`.
pub fn build_search_query(params: &SearchParams) -> String {
	let location = params.location().unwrap_or_default();
	let mut query = match params.activity_type() {
		Some(activity) => format!("{activity} events in {location}"),
		None => format!("Events in {location}"),
	};

	if let Some(timeframe) = params.timeframe() {
		query.push(' ');
		query.push_str(&timeframe.to_lowercase());
	}
	if let Some(keywords) = params.keywords() {
		query.push_str(&format!(" related to {keywords}"));
	}
	if let Some(radius) = params.radius() {
		query.push_str(&format!(" within {radius} miles"));
	}

	query
}

pub fn search_query(params: &SearchParams) -> SearchQuery {
	SearchQuery {
		text: build_search_query(params),
		location: params.location().unwrap_or_default().to_string(),
		time_filter: params.timeframe().and_then(TimeFilter::from_timeframe),
	}
}

/// Chat messages asking a web-search LLM for events matching the criteria.
pub fn build_search_messages(params: &SearchParams) -> Vec<Value> {
	let query = build_search_query(params);
	let user = format!(
		"{query}. Include the exact date and time, the venue address, the ticket price, and a link \
		 to the official page for each event. List up to 10 events."
	);

	vec![
		serde_json::json!({ "role": "system", "content": SEARCH_SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

/// Chat messages asking a formatting LLM to turn acquired text into a JSON array of events.
pub fn build_format_messages(text: &str, params: &SearchParams) -> Vec<Value> {
	let location = params.location().unwrap_or_default();
	let user = format!(
		"Search location: {location}. Use it as the location of any event whose venue is not \
		 given.\n\nText:\n{text}"
	);

	vec![
		serde_json::json!({ "role": "system", "content": FORMAT_SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

/// Renders primary search listings in the same shape the extractor understands.
pub fn format_listings(listings: &[Listing]) -> String {
	let mut blocks = Vec::with_capacity(listings.len());

	for listing in listings {
		let title = listing.title.trim();

		if title.is_empty() {
			continue;
		}

		let mut lines = vec![format!("**{title}**")];

		if let Some(date) = non_empty(&listing.date) {
			lines.push(format!("Date: {date}"));
		}

		match (non_empty(&listing.venue), non_empty(&listing.address)) {
			(Some(venue), Some(address)) if !address.contains(venue) =>
				lines.push(format!("Location: {venue}, {address}")),
			(_, Some(address)) => lines.push(format!("Location: {address}")),
			(Some(venue), None) => lines.push(format!("Location: {venue}")),
			(None, None) => {},
		}

		if let Some(tickets) = non_empty(&listing.ticket_info) {
			lines.push(format!("Price: {tickets}"));
		}
		if let Some(link) = non_empty(&listing.link) {
			lines.push(format!("Link: {link}"));
		}
		if let Some(description) = non_empty(&listing.description) {
			lines.push(description.to_string());
		}

		blocks.push(lines.join("\n"));
	}

	blocks.join("\n\n")
}

/// Generic, non-personalized suggestions for a location. Always produces text the extractor can
/// parse into at least one event.
pub fn static_suggestions(params: &SearchParams) -> String {
	let location = params.location().unwrap_or("your area");
	let when = params.timeframe().map(str::to_lowercase).unwrap_or_else(|| "soon".to_string());
	let activity = params.activity_type().unwrap_or("Local");
	let activity_lower = activity.to_lowercase();
	let items = [
		(
			format!("{activity} Highlights in {location}"),
			format!("Check local listings for {activity_lower} events happening {when}."),
			"Price TBA",
		),
		(
			format!("{location} Farmers Market"),
			"Seasonal produce, street food, and local makers. Most markets run on weekend mornings."
				.to_string(),
			"Free",
		),
		(
			format!("Live Music Around {location}"),
			"Bars and small venues regularly host live sets. Check venue calendars for line-ups."
				.to_string(),
			"Price TBA",
		),
		(
			format!("Museums and Galleries of {location}"),
			"Rotating exhibitions and guided tours. Many institutions offer reduced entry one evening a week."
				.to_string(),
			"Price TBA",
		),
	];

	items
		.iter()
		.map(|(name, description, price)| {
			format!(
				"**{name}**\nDate: {date}\nLocation: {location}\nPrice: {price}\n{description}",
				date = capitalize(&when),
			)
		})
		.collect::<Vec<_>>()
		.join("\n\n")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn capitalize(text: &str) -> String {
	let mut chars = text.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::extractor::extract_events;

	fn vaduz_food() -> SearchParams {
		SearchParams {
			location: Some("Vaduz".to_string()),
			activity_type: Some("Food".to_string()),
			timeframe: Some("This Month".to_string()),
			..Default::default()
		}
	}

	#[test]
	fn query_includes_only_meaningful_criteria() {
		assert_eq!(build_search_query(&vaduz_food()), "Food events in Vaduz this month");

		let params = SearchParams {
			location: Some("Berlin".to_string()),
			activity_type: Some("any".to_string()),
			keywords: Some("techno".to_string()),
			radius: Some(10),
			..Default::default()
		};

		assert_eq!(build_search_query(&params), "Events in Berlin related to techno within 10 miles");
	}

	#[test]
	fn search_query_maps_time_filter() {
		let query = search_query(&vaduz_food());

		assert_eq!(query.location, "Vaduz");
		assert_eq!(query.time_filter, Some(TimeFilter::ThisMonth));
	}

	#[test]
	fn format_messages_carry_text_and_location() {
		let messages = build_format_messages("**Fest**", &vaduz_food());
		let user = messages[1]["content"].as_str().expect("content must be a string");

		assert_eq!(messages[0]["role"], "system");
		assert!(user.contains("Search location: Vaduz"));
		assert!(user.ends_with("**Fest**"));
	}

	#[test]
	fn formatted_listings_round_trip_through_extractor() {
		let listings = vec![
			Listing {
				title: "Vaduz Food Fest".to_string(),
				date: Some("Sat, Jun 7".to_string()),
				address: Some("Städtle, Vaduz".to_string()),
				ticket_info: Some("CHF 10".to_string()),
				link: Some("https://example.com/fest".to_string()),
				description: Some("Regional dishes from twenty local kitchens.".to_string()),
				..Default::default()
			},
			Listing { title: "   ".to_string(), ..Default::default() },
		];
		let text = format_listings(&listings);
		let events = extract_events(&text, "Vaduz");

		assert_eq!(events.len(), 1);
		assert_eq!(events[0].name, "Vaduz Food Fest");
		assert_eq!(events[0].date, "Sat, Jun 7");
		assert_eq!(events[0].location, "Städtle, Vaduz");
		assert_eq!(events[0].price, "CHF 10");
		assert_eq!(events[0].source, "https://example.com/fest");
		assert_eq!(events[0].description, "Regional dishes from twenty local kitchens.");
	}

	#[test]
	fn static_suggestions_always_extract() {
		let text = static_suggestions(&SearchParams::located("Tokyo"));
		let events = extract_events(&text, "Tokyo");

		assert_eq!(events.len(), 4);
		assert!(events.iter().all(|event| event.location == "Tokyo"));
		assert_eq!(events[1].price, "Free");
		assert_eq!(events[0].date, "Soon");
	}
}
