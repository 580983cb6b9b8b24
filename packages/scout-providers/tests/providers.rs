use reqwest::header::AUTHORIZATION;
use serde_json::Map;

use scout_config::SearchApiProviderConfig;
use scout_domain::{SearchParams, TimeFilter, prompt};

#[test]
fn builds_bearer_auth_header() {
	let mut defaults = Map::new();

	defaults.insert("x-scout-client".to_string(), serde_json::json!("backend"));

	let headers =
		scout_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
	assert_eq!(headers.get("x-scout-client").expect("Missing default header."), "backend");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), serde_json::json!(3));

	assert!(scout_providers::extra_headers(&defaults).is_err());
}

#[test]
fn events_query_carries_engine_key_and_date_chip() {
	let cfg = SearchApiProviderConfig {
		provider_id: "serpapi".to_string(),
		api_base: "https://serpapi.com".to_string(),
		api_key: "key".to_string(),
		path: "/search.json".to_string(),
		engine: "google_events".to_string(),
		timeout_ms: 1_000,
		default_headers: Map::new(),
	};
	let params = SearchParams {
		location: Some("Vaduz".to_string()),
		timeframe: Some("This Month".to_string()),
		..Default::default()
	};
	let query = prompt::search_query(&params);
	let pairs = scout_providers::events::query_pairs(&cfg, &query);

	assert_eq!(query.time_filter, Some(TimeFilter::ThisMonth));
	assert!(pairs.contains(&("engine", "google_events".to_string())));
	assert!(pairs.contains(&("location", "Vaduz".to_string())));
	assert!(pairs.contains(&("htichips", TimeFilter::ThisMonth.chip().to_string())));
	assert!(pairs.contains(&("api_key", "key".to_string())));
}
