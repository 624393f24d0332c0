use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
	Note,
	Website,
	Youtube,
	Tweet,
}
impl MemoryKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Note => "note",
			Self::Website => "website",
			Self::Youtube => "youtube",
			Self::Tweet => "tweet",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"note" => Some(Self::Note),
			"website" => Some(Self::Website),
			"youtube" => Some(Self::Youtube),
			"tweet" => Some(Self::Tweet),
			_ => None,
		}
	}
}
impl std::fmt::Display for MemoryKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One persisted captured item, owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
	pub id: Uuid,
	pub user_id: String,
	#[serde(rename = "type")]
	pub kind: MemoryKind,
	pub body: String,
	pub title: Option<String>,
	pub description: Option<String>,
	pub source_id: Option<String>,
	pub source_url: Option<String>,
	pub canonical_url: Option<String>,
	pub site_name: Option<String>,
	pub author: Option<String>,
	#[serde(with = "crate::time_serde::option")]
	pub published_at: Option<OffsetDateTime>,
	pub thumbnail_url: Option<String>,
	pub favicon_url: Option<String>,
	pub like_count: Option<i64>,
	pub reply_count: Option<i64>,
	pub embedding: Vec<f32>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl Memory {
	pub fn search_text(&self) -> String {
		crate::search_text(self.title.as_deref(), self.description.as_deref(), &self.body)
	}
}

/// A memory plus the similarity score the store ranked it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMemory {
	#[serde(flatten)]
	pub memory: Memory,
	pub score: f32,
}

/// The optional provenance/display fields an extractor or the enrichment
/// model can populate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetadata {
	pub source_id: Option<String>,
	pub source_url: Option<String>,
	pub canonical_url: Option<String>,
	pub site_name: Option<String>,
	pub author: Option<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub published_at: Option<OffsetDateTime>,
	pub thumbnail_url: Option<String>,
	pub favicon_url: Option<String>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub like_count: Option<i64>,
	pub reply_count: Option<i64>,
}
impl MemoryMetadata {
	/// Overlays the enrichment model's output onto extractor fallback values.
	/// Only fields the model filled in win; a null keeps the fallback, so a
	/// hesitant model can never erase extracted provenance.
	pub fn overlay(self, refined: MemoryMetadata) -> MemoryMetadata {
		MemoryMetadata {
			source_id: self.source_id,
			source_url: self.source_url,
			canonical_url: refined.canonical_url.or(self.canonical_url),
			site_name: refined.site_name.or(self.site_name),
			author: refined.author.or(self.author),
			published_at: refined.published_at.or(self.published_at),
			thumbnail_url: refined.thumbnail_url.or(self.thumbnail_url),
			favicon_url: refined.favicon_url.or(self.favicon_url),
			title: refined.title.or(self.title),
			description: refined.description.or(self.description),
			like_count: self.like_count,
			reply_count: self.reply_count,
		}
	}
}

/// What an extractor hands back for a source URL; also the unit the metadata
/// cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
	pub metadata: MemoryMetadata,
	pub body: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fallback() -> MemoryMetadata {
		MemoryMetadata {
			source_id: Some("abc".to_string()),
			source_url: Some("https://example.com/a".to_string()),
			title: Some("Fallback title".to_string()),
			site_name: Some("Example".to_string()),
			..Default::default()
		}
	}

	#[test]
	fn overlay_prefers_refined_values() {
		let refined = MemoryMetadata {
			title: Some("Refined title".to_string()),
			description: Some("Refined description".to_string()),
			..Default::default()
		};
		let merged = fallback().overlay(refined);

		assert_eq!(merged.title.as_deref(), Some("Refined title"));
		assert_eq!(merged.description.as_deref(), Some("Refined description"));
	}

	#[test]
	fn overlay_keeps_fallback_when_refined_is_null() {
		let merged = fallback().overlay(MemoryMetadata::default());

		assert_eq!(merged.title.as_deref(), Some("Fallback title"));
		assert_eq!(merged.site_name.as_deref(), Some("Example"));
	}

	#[test]
	fn overlay_never_touches_origin_identity() {
		let refined = MemoryMetadata {
			source_id: Some("spoofed".to_string()),
			source_url: Some("https://evil.example".to_string()),
			..Default::default()
		};
		let merged = fallback().overlay(refined);

		assert_eq!(merged.source_id.as_deref(), Some("abc"));
		assert_eq!(merged.source_url.as_deref(), Some("https://example.com/a"));
	}

	#[test]
	fn memories_serialize_with_the_external_field_names() {
		let memory = Memory {
			id: uuid::Uuid::nil(),
			user_id: "u1".to_string(),
			kind: MemoryKind::Note,
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
			embedding: vec![1.0],
			created_at: time::OffsetDateTime::UNIX_EPOCH,
			updated_at: time::OffsetDateTime::UNIX_EPOCH,
		};
		let json = serde_json::to_value(&memory).expect("Failed to serialize memory.");

		assert_eq!(json["type"], "note");
		assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
	}

	#[test]
	fn kind_round_trips_through_strings() {
		for kind in
			[MemoryKind::Note, MemoryKind::Website, MemoryKind::Youtube, MemoryKind::Tweet]
		{
			assert_eq!(MemoryKind::parse(kind.as_str()), Some(kind));
		}
		assert_eq!(MemoryKind::parse("bookmark"), None);
	}
}
