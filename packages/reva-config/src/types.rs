use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
	pub recommend: Recommend,
	pub chat: Chat,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	/// Embedding dimension of the `vector` columns. Must match
	/// `providers.embedding.dimensions`.
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub parser: LlmProviderConfig,
	pub chat: LlmProviderConfig,
	pub geocoder: GeocoderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct GeocoderConfig {
	pub api_base: String,
	pub user_agent: String,
	/// Appended to every geocoding query, e.g. "Thailand", to bias results
	/// toward the market the listings cover.
	pub country_hint: Option<String>,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Geospatial containment radius around a resolved location, in meters.
	pub radius_meters: f64,
	pub default_page_size: u32,
	pub max_page_size: u32,
}

#[derive(Debug, Deserialize)]
pub struct Recommend {
	pub item_limit: u32,
	pub user_limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
	/// Number of listings retrieved as grounding context per question.
	pub context_k: u32,
	/// Messages kept per chat session; older turns are discarded.
	pub history_limit: u32,
}
