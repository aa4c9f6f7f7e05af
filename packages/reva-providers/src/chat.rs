use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Sends a full message array to a chat-completions endpoint and returns the
/// assistant's reply text. Callers own the prompt; this layer only moves it.
pub async fn complete(cfg: &reva_config::LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_chat_response(json)
}

fn parse_chat_response(json: Value) -> Result<String> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		return Ok(content.to_string());
	}

	// Ollama's native generate endpoint answers with a flat response field.
	if let Some(content) = json.get("response").and_then(|c| c.as_str()) {
		return Ok(content.to_string());
	}

	Err(eyre::eyre!("Chat response is missing assistant content."))
}
