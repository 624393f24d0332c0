use time::OffsetDateTime;
use uuid::Uuid;

use mindcache_domain::{Memory, MemoryKind};

use crate::{Error, Result};

/// One `memories` row. The embedding crosses the wire as `vector::text` so
/// no driver-side vector type is needed.
#[derive(Debug, sqlx::FromRow)]
pub struct MemoryRow {
	pub id: Uuid,
	pub user_id: String,
	pub kind: String,
	pub body: String,
	pub title: Option<String>,
	pub description: Option<String>,
	pub source_id: Option<String>,
	pub source_url: Option<String>,
	pub canonical_url: Option<String>,
	pub site_name: Option<String>,
	pub author: Option<String>,
	pub published_at: Option<OffsetDateTime>,
	pub thumbnail_url: Option<String>,
	pub favicon_url: Option<String>,
	pub like_count: Option<i64>,
	pub reply_count: Option<i64>,
	pub embedding_text: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl MemoryRow {
	pub fn into_memory(self) -> Result<Memory> {
		let kind = MemoryKind::parse(&self.kind).ok_or_else(|| Error::InvalidRecord {
			message: format!("Unknown memory kind {:?}.", self.kind),
		})?;
		let embedding = crate::parse_pg_vector(&self.embedding_text)?;

		Ok(Memory {
			id: self.id,
			user_id: self.user_id,
			kind,
			body: self.body,
			title: self.title,
			description: self.description,
			source_id: self.source_id,
			source_url: self.source_url,
			canonical_url: self.canonical_url,
			site_name: self.site_name,
			author: self.author,
			published_at: self.published_at,
			thumbnail_url: self.thumbnail_url,
			favicon_url: self.favicon_url,
			like_count: self.like_count,
			reply_count: self.reply_count,
			embedding,
			created_at: self.created_at,
			updated_at: self.updated_at,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct ScoredRow {
	#[sqlx(flatten)]
	pub row: MemoryRow,
	pub score: f32,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_row() -> MemoryRow {
		MemoryRow {
			id: Uuid::new_v4(),
			user_id: "u1".to_string(),
			kind: "note".to_string(),
			body: "body".to_string(),
			title: None,
			description: None,
			source_id: None,
			source_url: None,
			canonical_url: None,
			site_name: None,
			author: None,
			published_at: None,
			thumbnail_url: None,
			favicon_url: None,
			like_count: None,
			reply_count: None,
			embedding_text: "[1,0]".to_string(),
			created_at: OffsetDateTime::UNIX_EPOCH,
			updated_at: OffsetDateTime::UNIX_EPOCH,
		}
	}

	#[test]
	fn row_converts_to_memory() {
		let memory = sample_row().into_memory().expect("Failed to convert row.");

		assert_eq!(memory.kind, MemoryKind::Note);
		assert_eq!(memory.embedding, vec![1.0, 0.0]);
	}

	#[test]
	fn unknown_kind_is_rejected() {
		let mut row = sample_row();

		row.kind = "bookmark".to_string();

		assert!(matches!(row.into_memory(), Err(Error::InvalidRecord { .. })));
	}
}
