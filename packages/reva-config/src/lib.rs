mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chat, Config, EmbeddingProviderConfig, GeocoderConfig, LlmProviderConfig, Postgres, Providers,
	Recommend, Search, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.vector_dim.".to_string(),
		});
	}
	if cfg.providers.geocoder.user_agent.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.geocoder.user_agent must be non-empty.".to_string(),
		});
	}
	if !cfg.search.radius_meters.is_finite() || cfg.search.radius_meters <= 0.0 {
		return Err(Error::Validation {
			message: "search.radius_meters must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_page_size == 0 {
		return Err(Error::Validation {
			message: "search.default_page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_page_size < cfg.search.default_page_size {
		return Err(Error::Validation {
			message: "search.max_page_size must be at least search.default_page_size.".to_string(),
		});
	}
	if cfg.recommend.item_limit == 0 {
		return Err(Error::Validation {
			message: "recommend.item_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.recommend.user_limit == 0 {
		return Err(Error::Validation {
			message: "recommend.user_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.chat.context_k == 0 {
		return Err(Error::Validation {
			message: "chat.context_k must be greater than zero.".to_string(),
		});
	}
	if cfg.chat.history_limit == 0 {
		return Err(Error::Validation {
			message: "chat.history_limit must be greater than zero.".to_string(),
		});
	}

	Ok(())
}
