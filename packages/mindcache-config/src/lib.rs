mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CacheTtls, Config, Embedding, Enrichment, Extractor, Postgres, Qdrant, Search, Storage,
	StorageBackend,
};

use std::env;

const DEFAULT_USER_AGENT: &str =
	"Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

pub fn from_env() -> Result<Config> {
	from_lookup(|key| env::var(key).ok())
}

/// Builds a [`Config`] from an arbitrary variable lookup. Unset or empty
/// variables fall back to their defaults.
pub fn from_lookup<F>(lookup: F) -> Result<Config>
where
	F: Fn(&str) -> Option<String>,
{
	let cfg = Config {
		embedding: Embedding {
			dimensions: parse_var(&lookup, "MINDCACHE_EMBEDDING_DIMENSIONS", 128)?,
		},
		search: Search {
			similarity_threshold: parse_var(&lookup, "MINDCACHE_SIMILARITY_THRESHOLD", 0.2)?,
			result_limit: parse_var(&lookup, "MINDCACHE_SEARCH_RESULT_LIMIT", 20)?,
			list_page_limit: parse_var(&lookup, "MINDCACHE_LIST_PAGE_LIMIT", 50)?,
		},
		cache: CacheTtls {
			metadata_ttl_seconds: parse_var(
				&lookup,
				"MINDCACHE_METADATA_CACHE_TTL_SECONDS",
				86_400,
			)?,
			tweet_ttl_seconds: parse_var(&lookup, "MINDCACHE_TWEET_CACHE_TTL_SECONDS", 43_200)?,
		},
		extractor: Extractor {
			timeout_ms: parse_var(&lookup, "MINDCACHE_EXTRACTOR_TIMEOUT_MS", 10_000)?,
			user_agent: string_var(&lookup, "MINDCACHE_EXTRACTOR_USER_AGENT", DEFAULT_USER_AGENT),
		},
		enrichment: Enrichment {
			api_base: string_var(&lookup, "MINDCACHE_ENRICHMENT_API_BASE", ""),
			api_key: string_var(&lookup, "MINDCACHE_ENRICHMENT_API_KEY", ""),
			path: string_var(&lookup, "MINDCACHE_ENRICHMENT_PATH", "/chat/completions"),
			model: string_var(&lookup, "MINDCACHE_ENRICHMENT_MODEL", "openai/gpt-oss-20b"),
			temperature: parse_var(&lookup, "MINDCACHE_ENRICHMENT_TEMPERATURE", 0.2)?,
			timeout_ms: parse_var(&lookup, "MINDCACHE_ENRICHMENT_TIMEOUT_MS", 8_000)?,
		},
		storage: Storage {
			backend: parse_backend(&lookup)?,
			postgres: Postgres {
				dsn: string_var(&lookup, "MINDCACHE_PG_DSN", ""),
				pool_max_conns: parse_var(&lookup, "MINDCACHE_PG_POOL_MAX_CONNS", 5)?,
			},
			qdrant: Qdrant {
				url: string_var(&lookup, "MINDCACHE_QDRANT_URL", ""),
				collection: string_var(&lookup, "MINDCACHE_QDRANT_COLLECTION", "memories"),
			},
		},
	};

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.similarity_threshold.is_finite() {
		return Err(Error::Validation {
			message: "search.similarity_threshold must be a finite number.".to_string(),
		});
	}
	if cfg.search.similarity_threshold < 0.0 {
		return Err(Error::Validation {
			message: "search.similarity_threshold must be zero or greater.".to_string(),
		});
	}
	if cfg.search.result_limit == 0 {
		return Err(Error::Validation {
			message: "search.result_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.list_page_limit == 0 {
		return Err(Error::Validation {
			message: "search.list_page_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.metadata_ttl_seconds == 0 {
		return Err(Error::Validation {
			message: "cache.metadata_ttl_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.tweet_ttl_seconds == 0 {
		return Err(Error::Validation {
			message: "cache.tweet_ttl_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.extractor.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "extractor.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.enrichment.enabled() && cfg.enrichment.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "enrichment.api_key must be non-empty when enrichment.api_base is set."
				.to_string(),
		});
	}

	match cfg.storage.backend {
		StorageBackend::Postgres =>
			if cfg.storage.postgres.dsn.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.postgres.dsn must be non-empty for the postgres backend."
						.to_string(),
				});
			},
		StorageBackend::Qdrant => {
			if cfg.storage.qdrant.url.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.qdrant.url must be non-empty for the qdrant backend."
						.to_string(),
				});
			}
			if cfg.storage.qdrant.collection.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.qdrant.collection must be non-empty.".to_string(),
				});
			}
		},
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn string_var<F>(lookup: &F, key: &str, default: &str) -> String
where
	F: Fn(&str) -> Option<String>,
{
	match lookup(key) {
		Some(raw) if !raw.trim().is_empty() => raw,
		_ => default.to_string(),
	}
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
	F: Fn(&str) -> Option<String>,
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	match lookup(key) {
		Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|err| Error::ParseEnv {
			key: key.to_string(),
			message: format!("{err}"),
		}),
		_ => Ok(default),
	}
}

fn parse_backend<F>(lookup: &F) -> Result<StorageBackend>
where
	F: Fn(&str) -> Option<String>,
{
	match string_var(lookup, "MINDCACHE_STORAGE_BACKEND", "postgres").trim() {
		"postgres" => Ok(StorageBackend::Postgres),
		"qdrant" => Ok(StorageBackend::Qdrant),
		other => Err(Error::ParseEnv {
			key: "MINDCACHE_STORAGE_BACKEND".to_string(),
			message: format!("Unknown backend {other:?}; expected postgres or qdrant."),
		}),
	}
}
