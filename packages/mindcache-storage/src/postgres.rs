use sqlx::{PgPool, QueryBuilder, postgres::PgPoolOptions};
use time::OffsetDateTime;
use uuid::Uuid;

use mindcache_domain::{Memory, ScoredMemory};

use crate::{BoxFuture, MemoryStore, Result, SearchParams, models, schema};

const COLUMNS: &str = "\
id, user_id, kind, body, title, description, source_id, source_url, canonical_url, site_name, \
author, published_at, thumbnail_url, favicon_url, like_count, reply_count, \
embedding::text AS embedding_text, created_at, updated_at";

pub struct PgMemoryStore {
	pub pool: PgPool,
}
impl PgMemoryStore {
	pub async fn connect(cfg: &mindcache_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub fn with_pool(pool: PgPool) -> Self {
		Self { pool }
	}

	pub async fn ensure_schema(&self, vector_dim: u32) -> Result<()> {
		let sql = schema::render_schema(vector_dim);
		let lock_id: i64 = 6_091_213;
		// Advisory locks are held per connection. Use a single transaction so
		// the lock is scoped to one connection and released when it ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
impl MemoryStore for PgMemoryStore {
	fn upsert<'a>(&'a self, memory: &'a Memory) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			sqlx::query(
				"\
INSERT INTO memories (
	id, user_id, kind, body, title, description, source_id, source_url, canonical_url,
	site_name, author, published_at, thumbnail_url, favicon_url, like_count, reply_count,
	embedding, created_at, updated_at
)
VALUES (
	$1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
	$17::text::vector, $18, $19
)
ON CONFLICT (id) DO UPDATE
SET
	kind = EXCLUDED.kind,
	body = EXCLUDED.body,
	title = EXCLUDED.title,
	description = EXCLUDED.description,
	source_id = EXCLUDED.source_id,
	source_url = EXCLUDED.source_url,
	canonical_url = EXCLUDED.canonical_url,
	site_name = EXCLUDED.site_name,
	author = EXCLUDED.author,
	published_at = EXCLUDED.published_at,
	thumbnail_url = EXCLUDED.thumbnail_url,
	favicon_url = EXCLUDED.favicon_url,
	like_count = EXCLUDED.like_count,
	reply_count = EXCLUDED.reply_count,
	embedding = EXCLUDED.embedding,
	created_at = EXCLUDED.created_at,
	updated_at = EXCLUDED.updated_at
WHERE memories.user_id = EXCLUDED.user_id",
			)
			.bind(memory.id)
			.bind(&memory.user_id)
			.bind(memory.kind.as_str())
			.bind(&memory.body)
			.bind(&memory.title)
			.bind(&memory.description)
			.bind(&memory.source_id)
			.bind(&memory.source_url)
			.bind(&memory.canonical_url)
			.bind(&memory.site_name)
			.bind(&memory.author)
			.bind(memory.published_at)
			.bind(&memory.thumbnail_url)
			.bind(&memory.favicon_url)
			.bind(memory.like_count)
			.bind(memory.reply_count)
			.bind(crate::vector_to_pg(&memory.embedding))
			.bind(memory.created_at)
			.bind(memory.updated_at)
			.execute(&self.pool)
			.await?;

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, user_id: &'a str, id: Uuid) -> BoxFuture<'a, Result<Option<Memory>>> {
		Box::pin(async move {
			let row: Option<models::MemoryRow> = sqlx::query_as(&format!(
				"SELECT {COLUMNS} FROM memories WHERE id = $1 AND user_id = $2",
			))
			.bind(id)
			.bind(user_id)
			.fetch_optional(&self.pool)
			.await?;

			row.map(models::MemoryRow::into_memory).transpose()
		})
	}

	fn list<'a>(
		&'a self,
		user_id: &'a str,
		cursor: Option<OffsetDateTime>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Memory>>> {
		Box::pin(async move {
			let mut builder =
				QueryBuilder::new(format!("SELECT {COLUMNS} FROM memories WHERE user_id = "));

			builder.push_bind(user_id);

			if let Some(cursor) = cursor {
				builder.push(" AND created_at < ");
				builder.push_bind(cursor);
			}

			builder.push(" ORDER BY created_at DESC LIMIT ");
			builder.push_bind(limit as i64);

			let rows: Vec<models::MemoryRow> =
				builder.build_query_as().fetch_all(&self.pool).await?;

			rows.into_iter().map(models::MemoryRow::into_memory).collect()
		})
	}

	fn delete<'a>(&'a self, user_id: &'a str, id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let result = sqlx::query("DELETE FROM memories WHERE id = $1 AND user_id = $2")
				.bind(id)
				.bind(user_id)
				.execute(&self.pool)
				.await?;

			Ok(result.rows_affected() > 0)
		})
	}

	fn search<'a>(
		&'a self,
		user_id: &'a str,
		params: SearchParams<'a>,
	) -> BoxFuture<'a, Result<Vec<ScoredMemory>>> {
		Box::pin(async move {
			let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS}, (1 - (embedding <=> "));

			builder.push_bind(crate::vector_to_pg(params.vector));
			builder.push("::text::vector))::real AS score FROM memories WHERE user_id = ");
			builder.push_bind(user_id);

			if let Some(kinds) = params.kinds.filter(|kinds| !kinds.is_empty()) {
				let kinds: Vec<String> =
					kinds.iter().map(|kind| kind.as_str().to_string()).collect();

				builder.push(" AND kind = ANY(");
				builder.push_bind(kinds);
				builder.push(")");
			}

			builder.push(" ORDER BY score DESC LIMIT ");
			builder.push_bind(params.limit as i64);

			let rows: Vec<models::ScoredRow> =
				builder.build_query_as().fetch_all(&self.pool).await?;

			rows.into_iter()
				.map(|scored| {
					Ok(ScoredMemory { memory: scored.row.into_memory()?, score: scored.score })
				})
				.collect()
		})
	}
}
