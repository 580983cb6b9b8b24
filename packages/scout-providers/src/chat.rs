use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use scout_config::LlmProviderConfig;

/// Runs one chat completion and returns the assistant text.
pub async fn complete(cfg: &LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_chat_content(&json)
}

/// Accepts OpenAI-style `choices[0].message.content` and Anthropic-style `content[].text`.
pub fn parse_chat_content(json: &Value) -> Result<String> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		return non_blank(content);
	}

	if let Some(blocks) = json.get("content").and_then(|v| v.as_array()) {
		let text = blocks
			.iter()
			.filter_map(|block| block.get("text").and_then(|t| t.as_str()))
			.collect::<Vec<_>>()
			.join("");

		return non_blank(&text);
	}

	Err(eyre::eyre!("Chat response is missing message content."))
}

fn non_blank(content: &str) -> Result<String> {
	if content.trim().is_empty() {
		return Err(eyre::eyre!("Chat response content is empty."));
	}

	Ok(content.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "**Vaduz Food Fest**" } }
			]
		});

		assert_eq!(parse_chat_content(&json).expect("parse failed"), "**Vaduz Food Fest**");
	}

	#[test]
	fn joins_content_blocks() {
		let json = serde_json::json!({
			"content": [
				{ "type": "text", "text": "[{\"name\":" },
				{ "type": "text", "text": "\"Fest\"}]" }
			]
		});

		assert_eq!(parse_chat_content(&json).expect("parse failed"), "[{\"name\":\"Fest\"}]");
	}

	#[test]
	fn rejects_empty_or_missing_content() {
		let blank = serde_json::json!({ "choices": [{ "message": { "content": "  " } }] });

		assert!(parse_chat_content(&blank).is_err());
		assert!(parse_chat_content(&serde_json::json!({ "id": "x" })).is_err());
	}
}
