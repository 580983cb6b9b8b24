use serde::{Deserialize, Serialize};

pub const DATE_TBA: &str = "Date TBA";
pub const PRICE_TBA: &str = "Price TBA";
pub const PRICE_FREE: &str = "Free";

/// A structured event as served to clients and stored in history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
	pub name: String,
	#[serde(default)]
	pub description: String,
	pub date: String,
	pub location: String,
	pub price: String,
	#[serde(default)]
	pub source: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
}
impl Event {
	/// An event carrying only a name, with every other field at its default.
	pub fn titled(name: impl Into<String>, fallback_location: &str) -> Self {
		Self {
			name: name.into(),
			description: String::new(),
			date: DATE_TBA.to_string(),
			location: fallback_location.to_string(),
			price: PRICE_TBA.to_string(),
			source: String::new(),
			category: None,
		}
	}
}

/// A raw record returned by a structured events search API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
	pub title: String,
	pub date: Option<String>,
	pub address: Option<String>,
	pub description: Option<String>,
	pub venue: Option<String>,
	pub ticket_info: Option<String>,
	pub link: Option<String>,
}
