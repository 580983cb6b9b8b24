//! Heuristic conversion of loosely formatted text into [`Event`] records.
//!
//! The text is folded line by line through [`reduce`], which threads an explicit [`ExtractState`]
//! holding the flushed events and the event currently being assembled. [`extract_events`] wraps
//! the fold and applies the single-event synthesis for substantial text with no recognizable
//! titles.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
	event::{Event, PRICE_FREE},
	location::is_location_relevant,
};

/// Labeled fields are only accepted within this many non-blank lines after a title.
pub const FIELD_WINDOW_LINES: usize = 4;
/// Prose lines at or below this many characters are dropped.
pub const MIN_PROSE_CHARS: usize = 10;
/// Text shorter than this never yields a synthesized event.
pub const MIN_SYNTHESIS_CHARS: usize = 100;
/// Cap on the description of a synthesized event, before the ellipsis.
pub const SYNTHESIS_PREFIX_CHARS: usize = 500;

const ELLIPSIS: &str = "...";

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
	// One bold span covering the whole line. The body may hold single `*` but never `**`.
	Regex::new(r"^(?:[-*•+]\s+|\d+[.)]\s*)?\*\*((?:[^*]|\*[^*])+)\*\*:?$")
		.expect("title pattern is valid")
});
static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?i)^(?:[-*•+]\s+)?(?:\*\*|__)?\s*(location|where|venue|address|date(?:\s*(?:&|and)\s*time)?|when|time|price|cost|entry|admission|link|url|website|source)\s*(?:\*\*|__)?\s*:\s*(?:\*\*|__)?\s*(.*)$",
	)
	.expect("field pattern is valid")
});
static MARKDOWN_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\[(.+?)\]\((\S+?)\)$").expect("markdown link pattern is valid")
});
static URL_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"https?://[^\s)\]>]+").expect("url pattern is valid"));
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?i)(?:[$€£¥]|\b(?:CHF|USD|EUR|GBP)\b)\s?\d+(?:[.,]\d{1,2})?(?:\s?[-–]\s?[$€£¥]?\s?\d+(?:[.,]\d{1,2})?)?|\d+(?:[.,]\d{1,2})?\s?(?:[$€£¥]|\b(?:CHF|USD|EUR|GBP|dollars?|euros?)\b)",
	)
	.expect("price pattern is valid")
});
static BULLET_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?:[-*•+]\s+|\d+[.)]\s+)").expect("bullet pattern is valid")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
	Location,
	Date,
	Price,
	Source,
}

/// Classification of a single input line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
	Blank,
	Title(String),
	Field { field: Field, value: String, text: String },
	Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Draft {
	event: Event,
	lines_seen: usize,
}

/// Fold state for [`reduce`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractState {
	fallback_location: String,
	current: Option<Draft>,
	events: Vec<Event>,
}
impl ExtractState {
	pub fn new(fallback_location: &str) -> Self {
		Self { fallback_location: fallback_location.trim().to_string(), current: None, events: Vec::new() }
	}

	/// Events flushed so far, in input order.
	pub fn events(&self) -> &[Event] {
		&self.events
	}

	/// The event being assembled, if a title has been seen.
	pub fn current(&self) -> Option<&Event> {
		self.current.as_ref().map(|draft| &draft.event)
	}

	/// Non-blank lines consumed since the current title.
	pub fn lines_since_title(&self) -> Option<usize> {
		self.current.as_ref().map(|draft| draft.lines_seen)
	}

	fn flush(&mut self) {
		let Some(draft) = self.current.take() else {
			return;
		};
		let mut event = draft.event;

		if event.name.trim().is_empty() {
			return;
		}

		event.description = strip_location_boilerplate(&event.description, &event.location);

		self.events.push(event);
	}
}

pub fn classify(line: &str) -> Line {
	let trimmed = line.trim();

	if trimmed.is_empty() || trimmed.chars().all(|c| matches!(c, '-' | '*' | '•' | '+' | '_' | '=')) {
		return Line::Blank;
	}
	if let Some(caps) = FIELD_RE.captures(trimmed) {
		let label = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
		let value = clean_inline(caps.get(2).map(|m| m.as_str()).unwrap_or_default());

		if value.is_empty() {
			return Line::Text(clean_prose(trimmed));
		}

		return Line::Field { field: field_for_label(label), value, text: clean_prose(trimmed) };
	}
	if let Some(caps) = TITLE_RE.captures(trimmed) {
		let name = clean_inline(caps.get(1).map(|m| m.as_str()).unwrap_or_default());

		if !name.is_empty() {
			return Line::Title(name);
		}
	}

	Line::Text(clean_prose(trimmed))
}

/// Advances the fold by one input line.
pub fn reduce(mut state: ExtractState, line: &str) -> ExtractState {
	match classify(line) {
		Line::Blank => {},
		Line::Title(raw) => {
			state.flush();

			let (name, source) = split_markdown_link(&raw);
			let mut event = Event::titled(name, &state.fallback_location);

			if let Some(source) = source {
				event.source = source;
			}

			state.current = Some(Draft { event, lines_seen: 0 });
		},
		Line::Field { field, value, text } => {
			let fallback = state.fallback_location.clone();
			let Some(draft) = state.current.as_mut() else {
				return state;
			};

			draft.lines_seen += 1;

			if field == Field::Source {
				match URL_RE.find(&value) {
					Some(url) if draft.event.source.is_empty() =>
						draft.event.source = url.as_str().trim_end_matches(['.', ',']).to_string(),
					Some(_) => {},
					None => append_description(&mut draft.event, &text),
				}
			} else if draft.lines_seen <= FIELD_WINDOW_LINES {
				apply_field(&mut draft.event, field, &value, &fallback);
			} else {
				append_description(&mut draft.event, &text);
			}
		},
		Line::Text(text) =>
			if let Some(draft) = state.current.as_mut() {
				draft.lines_seen += 1;

				append_description(&mut draft.event, &text);
			},
	}

	state
}

/// Flushes the pending event and returns everything extracted.
pub fn finish(mut state: ExtractState) -> Vec<Event> {
	state.flush();

	state.events
}

pub fn extract_events(text: &str, fallback_location: &str) -> Vec<Event> {
	let state = text.lines().fold(ExtractState::new(fallback_location), reduce);
	let events = finish(state);

	if !events.is_empty() {
		return events;
	}

	synthesize_event(text, fallback_location).into_iter().collect()
}

/// Builds the single generic event used when substantial text carries no recognizable titles.
pub fn synthesize_event(text: &str, fallback_location: &str) -> Option<Event> {
	let trimmed = text.trim();
	let total = trimmed.chars().count();

	if total < MIN_SYNTHESIS_CHARS {
		return None;
	}

	let location = fallback_location.trim();
	let mut description: String = trimmed.chars().take(SYNTHESIS_PREFIX_CHARS).collect();

	if total > SYNTHESIS_PREFIX_CHARS {
		description.push_str(ELLIPSIS);
	}

	Some(Event {
		name: format!("Events in {location}"),
		description,
		date: "Various dates".to_string(),
		location: location.to_string(),
		price: "Varies".to_string(),
		source: String::new(),
		category: None,
	})
}

pub fn parse_price(value: &str) -> Option<String> {
	if value.to_lowercase().contains("free") {
		return Some(PRICE_FREE.to_string());
	}

	PRICE_RE.find(value).map(|m| m.as_str().trim().to_string())
}

fn apply_field(event: &mut Event, field: Field, value: &str, fallback_location: &str) {
	match field {
		Field::Location =>
			if is_location_relevant(fallback_location, value) {
				event.location = value.to_string();
			},
		Field::Date => event.date = value.to_string(),
		Field::Price =>
			if let Some(price) = parse_price(value) {
				event.price = price;
			},
		Field::Source => {},
	}
}

fn append_description(event: &mut Event, text: &str) {
	if text.chars().count() <= MIN_PROSE_CHARS {
		return;
	}
	if !event.description.is_empty() {
		event.description.push(' ');
	}

	event.description.push_str(text);
}

fn field_for_label(label: &str) -> Field {
	let lowered = label.to_ascii_lowercase();

	match lowered.as_str() {
		"location" | "where" | "venue" | "address" => Field::Location,
		"price" | "cost" | "entry" | "admission" => Field::Price,
		"link" | "url" | "website" | "source" => Field::Source,
		_ => Field::Date,
	}
}

fn split_markdown_link(raw: &str) -> (String, Option<String>) {
	match MARKDOWN_LINK_RE.captures(raw) {
		Some(caps) => (
			caps.get(1).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
			caps.get(2).map(|m| m.as_str().to_string()),
		),
		None => (raw.to_string(), None),
	}
}

fn clean_inline(value: &str) -> String {
	value.replace("**", "").replace("__", "").trim().to_string()
}

fn clean_prose(line: &str) -> String {
	let without_bullet = BULLET_PREFIX_RE.replace(line, "");

	clean_inline(&without_bullet)
}

fn strip_location_boilerplate(description: &str, location: &str) -> String {
	let Some(token) = location.split(|c: char| c == ',' || c.is_whitespace()).find(|t| !t.is_empty())
	else {
		return description.trim().to_string();
	};
	let pattern = format!(
		r"(?i)[^.!?]*\b(?:located|held|taking place) in\s+{}[^.!?]*[.!?]?",
		regex::escape(token)
	);
	let stripped = Regex::new(&pattern)
		.map(|re| re.replace_all(description, "").into_owned())
		.unwrap_or_else(|_| description.to_string());

	stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
