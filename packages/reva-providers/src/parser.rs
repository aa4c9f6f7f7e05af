use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

/// Structured view of a free-text property query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedQuery {
	#[serde(default)]
	pub semantic_query: Option<String>,
	#[serde(default)]
	pub location_text: Option<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub filters: ParsedFilters,
}

// The parser is told to use null for anything it cannot find, and some models
// apply that to the whole filters object.
fn null_as_default<'de, D>(deserializer: D) -> Result<ParsedFilters, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Ok(Option::<ParsedFilters>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ParsedFilters {
	#[serde(default)]
	pub price_min: Option<i64>,
	#[serde(default)]
	pub price_max: Option<i64>,
	#[serde(default)]
	pub bedrooms_min: Option<i64>,
}

const SYSTEM_PROMPT: &str = "You are a JSON-only API for a real estate search engine. \
Parse the user's query (Thai, English, or mixed) and return ONLY a JSON object with \
this schema: {\"semantic_query\": string, \"location_text\": string | null, \
\"filters\": {\"price_min\": integer | null, \"price_max\": integer | null, \
\"bedrooms_min\": integer | null}}. \
The semantic_query is the full query cleaned for embedding. \
Convert text prices such as '5m' or '5 million' to integers such as 5000000. \
Set anything not found to null. No explanations, no extra fields.";

pub async fn parse_query(cfg: &reva_config::LlmProviderConfig, query: &str) -> Result<ParsedQuery> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"response_format": { "type": "json_object" },
		"messages": [
			{ "role": "system", "content": SYSTEM_PROMPT },
			{ "role": "user", "content": query },
		],
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_parser_response(json)
}

fn parse_parser_response(json: Value) -> Result<ParsedQuery> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		return serde_json::from_str(content)
			.map_err(|_| eyre::eyre!("Parser content is not valid JSON."));
	}

	// Some backends return the object directly instead of wrapping it in a
	// chat completion.
	if json.is_object() {
		return serde_json::from_value(json)
			.map_err(|_| eyre::eyre!("Parser response does not match the query schema."));
	}

	Err(eyre::eyre!("Parser response is missing JSON content."))
}
