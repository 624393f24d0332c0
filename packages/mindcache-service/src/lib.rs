//! Ingestion and retrieval orchestration.
//!
//! The service owns the narrow contract external callers (HTTP handlers and
//! the like) talk to: `ingest`, `list`, `update`, `delete`, `search`. Every
//! call arrives with an already-authenticated `user_id` and never reaches
//! across users. Providers sit behind traits so the hashed embedder can give
//! way to a learned model, and tests can script extraction and enrichment.

pub mod delete;
pub mod ingest;
pub mod list;
pub mod search;
pub mod update;

use std::{future::Future, pin::Pin, sync::Arc};

pub use delete::{DeleteRequest, DeleteResponse};
pub use ingest::PLACEHOLDER_TITLE;
pub use list::{ListRequest, ListResponse};
pub use search::{SearchRequest, SearchResponse};
pub use update::UpdateRequest;

use mindcache_cache::{MetadataCache, MokaCache};
use mindcache_config::{CacheTtls, Config, Enrichment, Extractor};
use mindcache_domain::{ExtractedContent, MemoryMetadata};
use mindcache_providers::{embedding, enrich, extractor};
use mindcache_storage::MemoryStore;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The extractable source kinds; a plain note never reaches an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
	Website,
	Youtube,
	Tweet,
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a mindcache_config::Embedding,
		texts: &'a [String],
	) -> BoxFuture<'a, mindcache_providers::Result<Vec<Vec<f32>>>>;
}

pub trait SourceExtractor
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a Extractor,
		ttls: &'a CacheTtls,
		cache: &'a dyn MetadataCache,
		kind: SourceKind,
		url: &'a str,
	) -> BoxFuture<'a, mindcache_providers::Result<ExtractedContent>>;
}

pub trait EnrichmentProvider
where
	Self: Send + Sync,
{
	fn generate_title<'a>(
		&'a self,
		cfg: &'a Enrichment,
		body: &'a str,
	) -> BoxFuture<'a, mindcache_providers::Result<String>>;

	fn normalize_metadata<'a>(
		&'a self,
		cfg: &'a Enrichment,
		fallback: &'a MemoryMetadata,
		body: &'a str,
	) -> BoxFuture<'a, mindcache_providers::Result<MemoryMetadata>>;
}

#[derive(Debug)]
pub enum ServiceError {
	Validation { message: String },
	InvalidSource { message: String },
	SourceNotFound { message: String },
	Extraction { message: String },
	Provider { message: String },
	Storage { message: String },
}
impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Validation { message } => write!(f, "Invalid submission: {message}"),
			Self::InvalidSource { message } => write!(f, "Invalid source: {message}"),
			Self::SourceNotFound { message } => write!(f, "Source not found: {message}"),
			Self::Extraction { message } => write!(f, "Extraction failed: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}
impl std::error::Error for ServiceError {}
impl From<mindcache_domain::Error> for ServiceError {
	fn from(err: mindcache_domain::Error) -> Self {
		match err {
			mindcache_domain::Error::Validation { message } => Self::Validation { message },
		}
	}
}
impl From<mindcache_storage::Error> for ServiceError {
	fn from(err: mindcache_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<mindcache_providers::Error> for ServiceError {
	fn from(err: mindcache_providers::Error) -> Self {
		match err {
			mindcache_providers::Error::InvalidSource { .. } =>
				Self::InvalidSource { message: err.to_string() },
			mindcache_providers::Error::SourceNotFound { .. } =>
				Self::SourceNotFound { message: err.to_string() },
			mindcache_providers::Error::Reqwest(_)
			| mindcache_providers::Error::Extraction { .. }
			| mindcache_providers::Error::InvalidResponse { .. } =>
				Self::Extraction { message: err.to_string() },
		}
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub extractor: Arc<dyn SourceExtractor>,
	pub enrichment: Arc<dyn EnrichmentProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		extractor: Arc<dyn SourceExtractor>,
		enrichment: Arc<dyn EnrichmentProvider>,
	) -> Self {
		Self { embedding, extractor, enrichment }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), extractor: provider.clone(), enrichment: provider }
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a mindcache_config::Embedding,
		texts: &'a [String],
	) -> BoxFuture<'a, mindcache_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			Ok(texts
				.iter()
				.map(|text| embedding::embed_text(text, cfg.dimensions as usize))
				.collect())
		})
	}
}
impl SourceExtractor for DefaultProviders {
	fn extract<'a>(
		&'a self,
		cfg: &'a Extractor,
		ttls: &'a CacheTtls,
		cache: &'a dyn MetadataCache,
		kind: SourceKind,
		url: &'a str,
	) -> BoxFuture<'a, mindcache_providers::Result<ExtractedContent>> {
		Box::pin(async move {
			match kind {
				SourceKind::Website => extractor::website(cfg, ttls, cache, url).await,
				SourceKind::Youtube => extractor::youtube(cfg, ttls, cache, url).await,
				SourceKind::Tweet => extractor::tweet(cfg, ttls, cache, url).await,
			}
		})
	}
}
impl EnrichmentProvider for DefaultProviders {
	fn generate_title<'a>(
		&'a self,
		cfg: &'a Enrichment,
		body: &'a str,
	) -> BoxFuture<'a, mindcache_providers::Result<String>> {
		Box::pin(enrich::generate_title(cfg, body))
	}

	fn normalize_metadata<'a>(
		&'a self,
		cfg: &'a Enrichment,
		fallback: &'a MemoryMetadata,
		body: &'a str,
	) -> BoxFuture<'a, mindcache_providers::Result<MemoryMetadata>> {
		Box::pin(enrich::normalize_metadata(cfg, fallback, body))
	}
}

pub struct MemoryService {
	pub cfg: Config,
	pub store: Arc<dyn MemoryStore>,
	pub cache: Arc<dyn MetadataCache>,
	pub providers: Providers,
}
impl MemoryService {
	pub fn new(cfg: Config, store: Arc<dyn MemoryStore>, cache: Arc<dyn MetadataCache>) -> Self {
		Self { cfg, store, cache, providers: Providers::default() }
	}

	pub fn with_providers(
		cfg: Config,
		store: Arc<dyn MemoryStore>,
		cache: Arc<dyn MetadataCache>,
		providers: Providers,
	) -> Self {
		Self { cfg, store, cache, providers }
	}

	/// Connects the configured storage backend and wires the default cache
	/// and providers.
	pub async fn connect(cfg: Config) -> ServiceResult<Self> {
		let store = mindcache_storage::connect(&cfg.storage, cfg.embedding.dimensions).await?;

		Ok(Self::new(cfg, store, Arc::new(MokaCache::default())))
	}

	pub(crate) async fn embed_single(&self, text: &str) -> ServiceResult<Vec<f32>> {
		let embeddings = self
			.providers
			.embedding
			.embed(&self.cfg.embedding, std::slice::from_ref(&text.to_string()))
			.await
			.map_err(|err| ServiceError::Provider { message: err.to_string() })?;
		let vector = embeddings.into_iter().next().ok_or_else(|| ServiceError::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;

		if vector.len() != self.cfg.embedding.dimensions as usize {
			return Err(ServiceError::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vector)
	}

	pub(crate) fn require_user_id<'a>(&self, user_id: &'a str) -> ServiceResult<&'a str> {
		let user_id = user_id.trim();

		if user_id.is_empty() {
			return Err(ServiceError::Validation { message: "user_id is required.".to_string() });
		}

		Ok(user_id)
	}
}
