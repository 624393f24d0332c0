use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub embedding: Embedding,
	pub search: Search,
	pub cache: CacheTtls,
	pub extractor: Extractor,
	pub enrichment: Enrichment,
	pub storage: Storage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Embedding {
	pub dimensions: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	pub similarity_threshold: f32,
	pub result_limit: u32,
	pub list_page_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheTtls {
	pub metadata_ttl_seconds: u64,
	pub tweet_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Extractor {
	pub timeout_ms: u64,
	pub user_agent: String,
}

/// Generative-model settings. An empty `api_base` disables enrichment
/// entirely; ingestion then runs on extractor fallback metadata alone.
#[derive(Debug, Clone, Deserialize)]
pub struct Enrichment {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
}
impl Enrichment {
	pub fn enabled(&self) -> bool {
		!self.api_base.trim().is_empty()
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub backend: StorageBackend,
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
	Postgres,
	Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
}
