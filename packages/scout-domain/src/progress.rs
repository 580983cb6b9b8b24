use std::time::Duration;

/// Coarse progress message for a job that has been running for `elapsed`.
pub fn progress_message(elapsed: Duration) -> &'static str {
	match elapsed.as_secs() {
		0..15 => "Searching for events...",
		15..30 => "Gathering data from multiple sources...",
		30..60 => "Analyzing and curating results...",
		60..90 => "Almost done, finalizing your results...",
		_ => "This is taking longer than usual. Still working on it...",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn buckets_by_elapsed_seconds() {
		assert_eq!(progress_message(Duration::from_secs(0)), "Searching for events...");
		assert_eq!(progress_message(Duration::from_millis(14_999)), "Searching for events...");
		assert_eq!(
			progress_message(Duration::from_secs(15)),
			"Gathering data from multiple sources..."
		);
		assert_eq!(progress_message(Duration::from_secs(45)), "Analyzing and curating results...");
		assert_eq!(
			progress_message(Duration::from_secs(89)),
			"Almost done, finalizing your results..."
		);
		assert_eq!(
			progress_message(Duration::from_secs(600)),
			"This is taking longer than usual. Still working on it..."
		);
	}
}
