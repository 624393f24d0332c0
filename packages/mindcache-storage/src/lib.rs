//! Persistence for memories behind a single [`MemoryStore`] contract.
//!
//! Two interchangeable backends exist: a Postgres/pgvector store and a
//! Qdrant store. Orchestrators depend only on the trait; the backend is
//! picked once at process start from configuration. Both honor the same
//! invariants: every operation is scoped to one `user_id`, listing is
//! `created_at` descending with a strictly-older-than cursor, and search
//! ranks by cosine similarity descending.

pub mod models;
pub mod postgres;
pub mod qdrant;
pub mod schema;

mod error;

pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

use time::OffsetDateTime;
use uuid::Uuid;

use mindcache_domain::{Memory, MemoryKind, ScoredMemory};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy)]
pub struct SearchParams<'a> {
	pub vector: &'a [f32],
	pub limit: u32,
	pub kinds: Option<&'a [MemoryKind]>,
}

pub trait MemoryStore
where
	Self: Send + Sync,
{
	/// Idempotent by id; full-record replace, not a merge.
	fn upsert<'a>(&'a self, memory: &'a Memory) -> BoxFuture<'a, Result<()>>;

	fn fetch<'a>(&'a self, user_id: &'a str, id: Uuid) -> BoxFuture<'a, Result<Option<Memory>>>;

	/// Newest first; `cursor` bounds results to `created_at` strictly older.
	fn list<'a>(
		&'a self,
		user_id: &'a str,
		cursor: Option<OffsetDateTime>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Memory>>>;

	/// Returns whether a record existed and was removed.
	fn delete<'a>(&'a self, user_id: &'a str, id: Uuid) -> BoxFuture<'a, Result<bool>>;

	fn search<'a>(
		&'a self,
		user_id: &'a str,
		params: SearchParams<'a>,
	) -> BoxFuture<'a, Result<Vec<ScoredMemory>>>;
}

/// Connects the backend selected by configuration and prepares its schema
/// (table or collection), returning it behind the store contract.
pub async fn connect(
	cfg: &mindcache_config::Storage,
	vector_dim: u32,
) -> Result<Arc<dyn MemoryStore>> {
	match cfg.backend {
		mindcache_config::StorageBackend::Postgres => {
			let store = postgres::PgMemoryStore::connect(&cfg.postgres).await?;

			store.ensure_schema(vector_dim).await?;

			Ok(Arc::new(store))
		},
		mindcache_config::StorageBackend::Qdrant => {
			let store = qdrant::QdrantMemoryStore::new(&cfg.qdrant, vector_dim)?;

			store.ensure_collection().await?;

			Ok(Arc::new(store))
		},
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

pub(crate) fn parse_pg_vector(text: &str) -> Result<Vec<f32>> {
	let trimmed = text.trim();
	let without_brackets =
		trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')).ok_or_else(|| {
			Error::InvalidRecord { message: "Vector text is not bracketed.".to_string() }
		})?;

	if without_brackets.trim().is_empty() {
		return Ok(Vec::new());
	}

	let mut vec = Vec::new();

	for part in without_brackets.split(',') {
		let value: f32 = part.trim().parse().map_err(|_| Error::InvalidRecord {
			message: "Vector text contains a non-numeric value.".to_string(),
		})?;

		vec.push(value);
	}

	Ok(vec)
}
