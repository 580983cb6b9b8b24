use serde::{Deserialize, Serialize};

/// Owner recorded on jobs submitted without a user. History is never written for it.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Search criteria as submitted by a client.
///
/// Every field is optional at the serde layer so that a missing location surfaces as a
/// validation error instead of a deserialization failure. Optional criteria holding a blank value
/// or the `any` sentinel are treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
	pub location: Option<String>,
	pub activity_type: Option<String>,
	pub timeframe: Option<String>,
	pub keywords: Option<String>,
	pub radius: Option<u32>,
}
impl SearchParams {
	pub fn located(location: impl Into<String>) -> Self {
		Self { location: Some(location.into()), ..Default::default() }
	}

	pub fn location(&self) -> Option<&str> {
		self.location.as_deref().map(str::trim).filter(|value| !value.is_empty())
	}

	pub fn activity_type(&self) -> Option<&str> {
		meaningful(self.activity_type.as_deref())
	}

	pub fn timeframe(&self) -> Option<&str> {
		meaningful(self.timeframe.as_deref())
	}

	pub fn keywords(&self) -> Option<&str> {
		meaningful(self.keywords.as_deref())
	}

	pub fn radius(&self) -> Option<u32> {
		self.radius.filter(|radius| *radius > 0)
	}

	/// Trims every text field and drops optional criteria that carry no information.
	pub fn normalized(&self) -> Self {
		Self {
			location: self.location().map(str::to_string),
			activity_type: self.activity_type().map(str::to_string),
			timeframe: self.timeframe().map(str::to_string),
			keywords: self.keywords().map(str::to_string),
			radius: self.radius(),
		}
	}
}

/// Date chips understood by structured events search APIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeFilter {
	Today,
	Tomorrow,
	ThisWeek,
	ThisWeekend,
	NextWeek,
	ThisMonth,
	NextMonth,
}
impl TimeFilter {
	pub fn from_timeframe(timeframe: &str) -> Option<Self> {
		let lowered = timeframe.trim().to_ascii_lowercase();

		match lowered.as_str() {
			"today" | "tonight" => Some(Self::Today),
			"tomorrow" => Some(Self::Tomorrow),
			"this week" | "week" => Some(Self::ThisWeek),
			"this weekend" | "weekend" => Some(Self::ThisWeekend),
			"next week" => Some(Self::NextWeek),
			"this month" | "month" => Some(Self::ThisMonth),
			"next month" => Some(Self::NextMonth),
			_ => None,
		}
	}

	pub fn chip(self) -> &'static str {
		match self {
			Self::Today => "date:today",
			Self::Tomorrow => "date:tomorrow",
			Self::ThisWeek => "date:week",
			Self::ThisWeekend => "date:weekend",
			Self::NextWeek => "date:next_week",
			Self::ThisMonth => "date:month",
			Self::NextMonth => "date:next_month",
		}
	}
}

pub fn meaningful(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("any"))
}

pub fn normalize_user_id(user_id: Option<&str>) -> String {
	user_id
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.unwrap_or(ANONYMOUS_USER)
		.to_string()
}

pub fn is_anonymous(user_id: &str) -> bool {
	user_id == ANONYMOUS_USER
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn any_and_blank_criteria_are_absent() {
		let params = SearchParams {
			location: Some("  Berlin ".to_string()),
			activity_type: Some("Any".to_string()),
			timeframe: Some("   ".to_string()),
			keywords: Some("jazz".to_string()),
			radius: Some(0),
		};

		assert_eq!(params.location(), Some("Berlin"));
		assert_eq!(params.activity_type(), None);
		assert_eq!(params.timeframe(), None);
		assert_eq!(params.keywords(), Some("jazz"));
		assert_eq!(params.radius(), None);
		assert_eq!(
			params.normalized(),
			SearchParams {
				location: Some("Berlin".to_string()),
				keywords: Some("jazz".to_string()),
				..Default::default()
			}
		);
	}

	#[test]
	fn missing_fields_deserialize_to_none() {
		let params: SearchParams = serde_json::from_str("{}").expect("parse failed");

		assert_eq!(params, SearchParams::default());
		assert_eq!(params.location(), None);
	}

	#[test]
	fn maps_timeframes_to_date_chips() {
		assert_eq!(TimeFilter::from_timeframe("This Month").map(TimeFilter::chip), Some("date:month"));
		assert_eq!(TimeFilter::from_timeframe("today"), Some(TimeFilter::Today));
		assert_eq!(TimeFilter::from_timeframe("sometime soon"), None);
	}

	#[test]
	fn blank_user_is_anonymous() {
		assert_eq!(normalize_user_id(None), ANONYMOUS_USER);
		assert_eq!(normalize_user_id(Some("  ")), ANONYMOUS_USER);
		assert_eq!(normalize_user_id(Some(" user-1 ")), "user-1");
		assert!(is_anonymous(&normalize_user_id(None)));
	}
}
