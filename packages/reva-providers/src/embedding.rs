use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

pub async fn embed(
	cfg: &reva_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let vectors = parse_embedding_response(json)?;

	for vector in &vectors {
		if vector.len() != cfg.dimensions as usize {
			return Err(eyre::eyre!(
				"Embedding backend returned dimension {} but {} is configured.",
				vector.len(),
				cfg.dimensions
			));
		}
	}

	Ok(vectors)
}

/// Accepts both the OpenAI-style `{"data": [{"index", "embedding"}]}` shape
/// and the bare `{"embeddings": [[...]]}` shape local model servers return.
fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	if let Some(data) = json.get("data").and_then(|v| v.as_array()) {
		let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
		for (fallback_index, item) in data.iter().enumerate() {
			let index = item
				.get("index")
				.and_then(|v| v.as_u64())
				.map(|v| v as usize)
				.unwrap_or(fallback_index);
			let embedding = item
				.get("embedding")
				.ok_or_else(|| eyre::eyre!("Embedding item is missing its vector."))?;
			indexed.push((index, parse_vector(embedding)?));
		}

		indexed.sort_by_key(|(index, _)| *index);

		return Ok(indexed.into_iter().map(|(_, vec)| vec).collect());
	}

	if let Some(rows) = json.get("embeddings").and_then(|v| v.as_array()) {
		return rows.iter().map(parse_vector).collect();
	}

	Err(eyre::eyre!("Embedding response is missing data or embeddings array."))
}

fn parse_vector(value: &Value) -> Result<Vec<f32>> {
	let values =
		value.as_array().ok_or_else(|| eyre::eyre!("Embedding vector must be an array."))?;
	let mut vec = Vec::with_capacity(values.len());

	for value in values {
		let number =
			value.as_f64().ok_or_else(|| eyre::eyre!("Embedding value must be numeric."))?;
		vec.push(number as f32);
	}

	Ok(vec)
}
