//! Best-effort check that a location mentioned in free text belongs to the searched area.

/// Abbreviation and full-name pairs treated as the same place.
const EQUIVALENTS: &[(&str, &str)] = &[
	("nyc", "new york"),
	("la", "los angeles"),
	("sf", "san francisco"),
	("dc", "washington"),
	("philly", "philadelphia"),
	("vegas", "las vegas"),
	("nola", "new orleans"),
	("chi", "chicago"),
];

pub fn is_location_relevant(search_location: &str, candidate: &str) -> bool {
	let search = search_location.trim().to_lowercase();
	let candidate = candidate.trim().to_lowercase();

	if search.is_empty() || candidate.is_empty() {
		return false;
	}
	if search.contains(&candidate) || candidate.contains(&search) {
		return true;
	}

	EQUIVALENTS.iter().any(|(short, full)| {
		names_place(&search, short, full) && names_place(&candidate, short, full)
	})
}

fn names_place(text: &str, short: &str, full: &str) -> bool {
	text.contains(full) || tokens(text).any(|token| token == short)
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
	text.split(|c: char| !c.is_alphanumeric()).filter(|token| !token.is_empty())
}
