pub mod assets;
pub mod chat;
pub mod ingest;
pub mod recommend;
pub mod results;
pub mod search;
pub mod track;

use std::{future::Future, pin::Pin, sync::Arc};

pub use chat::{ChatRequest, ChatResponse};
pub use ingest::{AssetInput, AssetTypeInput, IngestReport, IngestRequest};
pub use results::AssetResult;
use reva_config::{Config, EmbeddingProviderConfig, GeocoderConfig, LlmProviderConfig};
use reva_providers::{embedding, geocoder, parser};
pub use reva_providers::parser::{ParsedFilters, ParsedQuery};
use reva_storage::db::Db;
pub use search::{Pagination, SearchFilter, SearchRequest, SearchResponse};
pub use track::{ProfileTracker, TrackRequest};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait QueryParserProvider
where
	Self: Send + Sync,
{
	fn parse<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ParsedQuery>>;
}

pub trait GeocoderProvider
where
	Self: Send + Sync,
{
	fn geocode<'a>(
		&'a self,
		cfg: &'a GeocoderConfig,
		location: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<(f64, f64)>>>;
}

pub trait ChatProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [serde_json::Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	EmbeddingUnavailable { message: String },
	Provider { message: String },
	Storage { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub parser: Arc<dyn QueryParserProvider>,
	pub geocoder: Arc<dyn GeocoderProvider>,
	pub chat: Arc<dyn ChatProvider>,
}

pub struct RevaService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
	pub(crate) sessions: chat::SessionStore,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::EmbeddingUnavailable { message } => {
				write!(f, "Embedding backend unavailable: {message}")
			},
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<reva_storage::Error> for ServiceError {
	fn from(err: reva_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl QueryParserProvider for DefaultProviders {
	fn parse<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ParsedQuery>> {
		Box::pin(parser::parse_query(cfg, query))
	}
}

impl GeocoderProvider for DefaultProviders {
	fn geocode<'a>(
		&'a self,
		cfg: &'a GeocoderConfig,
		location: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<(f64, f64)>>> {
		Box::pin(geocoder::geocode(cfg, location))
	}
}

impl ChatProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [serde_json::Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(reva_providers::chat::complete(cfg, messages))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		parser: Arc<dyn QueryParserProvider>,
		geocoder: Arc<dyn GeocoderProvider>,
		chat: Arc<dyn ChatProvider>,
	) -> Self {
		Self { embedding, parser, geocoder, chat }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self {
			embedding: provider.clone(),
			parser: provider.clone(),
			geocoder: provider.clone(),
			chat: provider,
		}
	}
}

impl RevaService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_providers(cfg, db, Providers::default())
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers, sessions: chat::SessionStore::default() }
	}
}

pub(crate) fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);
	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}
		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

pub(crate) fn parse_pg_vector(text: &str) -> ServiceResult<Vec<f32>> {
	let trimmed = text.trim();
	let without_brackets =
		trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')).ok_or_else(|| {
			ServiceError::Storage { message: "Vector text is not bracketed.".to_string() }
		})?;

	if without_brackets.trim().is_empty() {
		return Ok(Vec::new());
	}

	let mut vec = Vec::new();

	for part in without_brackets.split(',') {
		let value: f32 = part.trim().parse().map_err(|_| ServiceError::Storage {
			message: "Vector text contains a non-numeric value.".to_string(),
		})?;
		vec.push(value);
	}

	Ok(vec)
}
