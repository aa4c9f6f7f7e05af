use std::sync::{Arc, Mutex};

use color_eyre::eyre;
use serde_json::{Map, Value};
use sqlx::PgPool;

use reva_config::{
	Chat, Config, EmbeddingProviderConfig, GeocoderConfig, LlmProviderConfig, Postgres, Recommend,
	Search, Service, Storage,
};
use reva_service::{
	BoxFuture, ChatProvider, EmbeddingProvider, GeocoderProvider, ParsedQuery, Providers,
	QueryParserProvider, RevaService,
};
use reva_storage::db::Db;
use reva_testkit::TestDatabase;

pub const VECTOR_DIM: u32 = 3;

pub struct StubEmbedding {
	pub vector_dim: u32,
}
impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		let dim = self.vector_dim as usize;
		let vectors = texts.iter().map(|_| vec![0.0; dim]).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

pub struct FixedEmbedding {
	pub vector: Vec<f32>,
}
impl EmbeddingProvider for FixedEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		let vectors = texts.iter().map(|_| self.vector.clone()).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

pub struct FailingEmbedding;
impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Err(eyre::eyre!("Embedding backend offline.")) })
	}
}

pub struct StubParser {
	pub payload: ParsedQuery,
}
impl QueryParserProvider for StubParser {
	fn parse<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ParsedQuery>> {
		let payload = self.payload.clone();

		Box::pin(async move { Ok(payload) })
	}
}

pub struct FailingParser;
impl QueryParserProvider for FailingParser {
	fn parse<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ParsedQuery>> {
		Box::pin(async move { Err(eyre::eyre!("Query parser offline.")) })
	}
}

pub struct StubGeocoder;
impl GeocoderProvider for StubGeocoder {
	fn geocode<'a>(
		&'a self,
		_cfg: &'a GeocoderConfig,
		_location: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<(f64, f64)>>> {
		Box::pin(async move { Ok(None) })
	}
}

pub struct StubChat {
	pub reply: &'static str,
}
impl ChatProvider for StubChat {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move { Ok(self.reply.to_string()) })
	}
}

/// Chat double that keeps every message array it was called with, so tests
/// can assert on the prompt the service actually built.
pub struct RecordingChat {
	pub reply: &'static str,
	pub calls: Mutex<Vec<Vec<Value>>>,
}
impl RecordingChat {
	pub fn new(reply: &'static str) -> Self {
		Self { reply, calls: Mutex::new(Vec::new()) }
	}
}
impl ChatProvider for RecordingChat {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		self.calls.lock().expect("Chat call log poisoned.").push(messages.to_vec());

		Box::pin(async move { Ok(self.reply.to_string()) })
	}
}

pub struct FailingChat;
impl ChatProvider for FailingChat {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move { Err(eyre::eyre!("Chat backend offline.")) })
	}
}

pub fn stub_providers(vector_dim: u32) -> Providers {
	Providers::new(
		Arc::new(StubEmbedding { vector_dim }),
		Arc::new(StubParser { payload: ParsedQuery::default() }),
		Arc::new(StubGeocoder),
		Arc::new(StubChat { reply: "ok" }),
	)
}

pub fn failing_providers() -> Providers {
	Providers::new(
		Arc::new(FailingEmbedding),
		Arc::new(FailingParser),
		Arc::new(StubGeocoder),
		Arc::new(FailingChat),
	)
}

pub async fn test_db() -> Option<TestDatabase> {
	let base_dsn = reva_testkit::env_dsn()?;
	let db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");

	Some(db)
}

pub fn test_config(dsn: String, vector_dim: u32) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage { postgres: Postgres { dsn, pool_max_conns: 2 }, vector_dim },
		providers: reva_config::Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/embeddings".to_string(),
				model: "test".to_string(),
				dimensions: vector_dim,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			parser: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat/completions".to_string(),
				model: "test".to_string(),
				temperature: 0.0,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			chat: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat/completions".to_string(),
				model: "test".to_string(),
				temperature: 0.3,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			geocoder: GeocoderConfig {
				api_base: "http://127.0.0.1:1".to_string(),
				user_agent: "reva-tests".to_string(),
				country_hint: None,
				timeout_ms: 1_000,
			},
		},
		search: Search { radius_meters: 10_000.0, default_page_size: 20, max_page_size: 100 },
		recommend: Recommend { item_limit: 5, user_limit: 10 },
		chat: Chat { context_k: 3, history_limit: 4 },
	}
}

pub async fn build_service(cfg: Config, providers: Providers) -> RevaService {
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect.");

	db.ensure_schema(cfg.storage.vector_dim).await.expect("Failed to apply schema.");

	RevaService::with_providers(cfg, db, providers)
}

pub async fn seed_asset_type(pool: &PgPool, id: i64, name_en: &str) {
	sqlx::query("INSERT INTO asset_types (id, name_en) VALUES ($1, $2) ON CONFLICT DO NOTHING")
		.bind(id)
		.bind(name_en)
		.execute(pool)
		.await
		.expect("Failed to seed asset type.");
}

pub struct SeedAsset<'a> {
	pub id: i64,
	pub code: &'a str,
	pub name_en: &'a str,
	pub description_en: Option<&'a str>,
	pub asset_type_id: Option<i64>,
	pub price: Option<f64>,
	pub bedrooms: Option<i32>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	/// pgvector literal such as `[1,0,0]`.
	pub embedding: Option<&'a str>,
}
impl Default for SeedAsset<'static> {
	fn default() -> Self {
		Self {
			id: 0,
			code: "A-000",
			name_en: "Asset",
			description_en: None,
			asset_type_id: None,
			price: Some(1_000_000.0),
			bedrooms: Some(2),
			latitude: None,
			longitude: None,
			embedding: None,
		}
	}
}

pub async fn seed_asset(pool: &PgPool, asset: SeedAsset<'_>) {
	sqlx::query(
		"INSERT INTO assets (id, code, name_en, description_en, asset_type_id, price, \
		 bedrooms, latitude, longitude, embedding) \
		 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10::vector)",
	)
	.bind(asset.id)
	.bind(asset.code)
	.bind(asset.name_en)
	.bind(asset.description_en)
	.bind(asset.asset_type_id)
	.bind(asset.price)
	.bind(asset.bedrooms)
	.bind(asset.latitude)
	.bind(asset.longitude)
	.bind(asset.embedding)
	.execute(pool)
	.await
	.expect("Failed to seed asset.");
}

pub fn parse_vector(text: &str) -> Vec<f32> {
	text.trim()
		.trim_start_matches('[')
		.trim_end_matches(']')
		.split(',')
		.filter(|part| !part.trim().is_empty())
		.map(|part| part.trim().parse().expect("Non-numeric vector component."))
		.collect()
}
