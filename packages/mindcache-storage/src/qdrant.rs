//! Qdrant-backed store.
//!
//! Qdrant has no per-user namespaces, so isolation is a mandatory `user_id`
//! payload condition included in every filter. The index has no native
//! "list all" either: listing scrolls the user's points, sorts client-side
//! by `created_at`, then applies the cursor and limit.

use std::collections::HashMap;

use qdrant_client::{
	Qdrant,
	client::Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
		PointStruct, Query, QueryPointsBuilder, ScrollPointsBuilder, UpsertPointsBuilder, Value,
		VectorParamsBuilder, value::Kind,
	},
};
use time::OffsetDateTime;
use uuid::Uuid;

use mindcache_domain::{Memory, ScoredMemory};

use crate::{BoxFuture, Error, MemoryStore, Result, SearchParams};

const SCROLL_PAGE: u32 = 256;

pub struct QdrantMemoryStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantMemoryStore {
	pub fn new(cfg: &mindcache_config::Qdrant, vector_dim: u32) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone())
					.vectors_config(VectorParamsBuilder::new(
						self.vector_dim as u64,
						Distance::Cosine,
					)),
			)
			.await?;

		Ok(())
	}

	fn user_filter(&self, user_id: &str) -> Filter {
		Filter::must([Condition::matches("user_id", user_id.to_string())])
	}

	fn record_filter(&self, user_id: &str, id: Uuid) -> Filter {
		Filter::must([
			Condition::matches("user_id", user_id.to_string()),
			Condition::matches("id", id.to_string()),
		])
	}

	async fn scroll_filtered(&self, filter: Filter, page: u32) -> Result<Vec<Memory>> {
		let mut memories = Vec::new();
		let mut offset: Option<PointId> = None;

		loop {
			let mut scroll = ScrollPointsBuilder::new(self.collection.clone())
				.filter(filter.clone())
				.with_payload(true)
				.limit(page);

			if let Some(offset) = offset.take() {
				scroll = scroll.offset(offset);
			}

			let response = self.client.scroll(scroll).await?;

			for point in response.result {
				memories.push(payload_to_memory(&point.payload)?);
			}

			match response.next_page_offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		Ok(memories)
	}
}
impl MemoryStore for QdrantMemoryStore {
	fn upsert<'a>(&'a self, memory: &'a Memory) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let payload = memory_to_payload(memory)?;
			let point =
				PointStruct::new(memory.id.to_string(), memory.embedding.clone(), payload);

			self.client
				.upsert_points(
					UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true),
				)
				.await?;

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, user_id: &'a str, id: Uuid) -> BoxFuture<'a, Result<Option<Memory>>> {
		Box::pin(async move {
			let memories = self.scroll_filtered(self.record_filter(user_id, id), 1).await?;

			Ok(memories.into_iter().next())
		})
	}

	fn list<'a>(
		&'a self,
		user_id: &'a str,
		cursor: Option<OffsetDateTime>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Memory>>> {
		Box::pin(async move {
			let mut memories =
				self.scroll_filtered(self.user_filter(user_id), SCROLL_PAGE).await?;

			memories.sort_by(|a, b| b.created_at.cmp(&a.created_at));

			if let Some(cursor) = cursor {
				memories.retain(|memory| memory.created_at < cursor);
			}

			memories.truncate(limit as usize);

			Ok(memories)
		})
	}

	fn delete<'a>(&'a self, user_id: &'a str, id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let existing = self.scroll_filtered(self.record_filter(user_id, id), 1).await?;

			if existing.is_empty() {
				return Ok(false);
			}

			self.client
				.delete_points(
					DeletePointsBuilder::new(self.collection.clone())
						.points(self.record_filter(user_id, id))
						.wait(true),
				)
				.await?;

			Ok(true)
		})
	}

	fn search<'a>(
		&'a self,
		user_id: &'a str,
		params: SearchParams<'a>,
	) -> BoxFuture<'a, Result<Vec<ScoredMemory>>> {
		Box::pin(async move {
			let mut conditions = vec![Condition::matches("user_id", user_id.to_string())];

			if let Some(kinds) = params.kinds.filter(|kinds| !kinds.is_empty()) {
				let kinds: Vec<String> =
					kinds.iter().map(|kind| kind.as_str().to_string()).collect();

				conditions.push(Condition::matches("type", kinds));
			}

			let query = QueryPointsBuilder::new(self.collection.clone())
				.query(Query::new_nearest(params.vector.to_vec()))
				.filter(Filter::must(conditions))
				.with_payload(true)
				.limit(params.limit as u64);
			let response = self.client.query(query).await?;

			response
				.result
				.into_iter()
				.map(|point| {
					Ok(ScoredMemory {
						memory: payload_to_memory(&point.payload)?,
						score: point.score,
					})
				})
				.collect()
		})
	}
}

/// The full record rides in the point payload (embedding included) so reads
/// never need the vector API; the dense vector itself drives similarity.
fn memory_to_payload(memory: &Memory) -> Result<Payload> {
	let json = serde_json::to_value(memory).map_err(|err| Error::InvalidRecord {
		message: format!("Failed to encode memory {}: {err}", memory.id),
	})?;
	let serde_json::Value::Object(map) = json else {
		return Err(Error::InvalidRecord {
			message: "A memory must encode to a JSON object.".to_string(),
		});
	};
	let mut payload = Payload::new();

	for (key, value) in map {
		payload.insert(key, value);
	}

	Ok(payload)
}

fn payload_to_memory(payload: &HashMap<String, Value>) -> Result<Memory> {
	let mut map = serde_json::Map::with_capacity(payload.len());

	for (key, value) in payload {
		map.insert(key.clone(), qdrant_value_to_json(value));
	}

	serde_json::from_value(serde_json::Value::Object(map)).map_err(|err| Error::InvalidRecord {
		message: format!("Failed to decode a memory payload: {err}"),
	})
}

fn qdrant_value_to_json(value: &Value) -> serde_json::Value {
	match &value.kind {
		Some(Kind::BoolValue(value)) => serde_json::Value::Bool(*value),
		Some(Kind::IntegerValue(value)) => serde_json::Value::from(*value),
		Some(Kind::DoubleValue(value)) =>
			serde_json::Number::from_f64(*value).map(serde_json::Value::Number).unwrap_or_default(),
		Some(Kind::StringValue(value)) => serde_json::Value::String(value.clone()),
		Some(Kind::ListValue(list)) =>
			serde_json::Value::Array(list.values.iter().map(qdrant_value_to_json).collect()),
		Some(Kind::StructValue(fields)) => serde_json::Value::Object(
			fields
				.fields
				.iter()
				.map(|(key, value)| (key.clone(), qdrant_value_to_json(value)))
				.collect(),
		),
		Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use mindcache_domain::MemoryKind;

	fn sample_memory() -> Memory {
		Memory {
			id: Uuid::new_v4(),
			user_id: "u1".to_string(),
			kind: MemoryKind::Website,
			body: "Example\nhttps://example.com".to_string(),
			title: Some("Example".to_string()),
			description: None,
			source_id: None,
			source_url: Some("https://example.com".to_string()),
			canonical_url: Some("https://example.com".to_string()),
			site_name: None,
			author: None,
			published_at: None,
			thumbnail_url: None,
			favicon_url: None,
			like_count: None,
			reply_count: None,
			embedding: vec![0.6, 0.8],
			created_at: OffsetDateTime::UNIX_EPOCH,
			updated_at: OffsetDateTime::UNIX_EPOCH,
		}
	}

	#[test]
	fn memory_round_trips_through_payload_values() {
		let memory = sample_memory();
		let json = serde_json::to_value(&memory).expect("Failed to encode memory.");
		let stored: HashMap<String, Value> = json
			.as_object()
			.expect("A memory must encode to a JSON object.")
			.iter()
			.map(|(key, value)| (key.clone(), Value::from(value.clone())))
			.collect();
		let restored =
			payload_to_memory(&stored).expect("Failed to restore memory from payload.");

		assert_eq!(restored.id, memory.id);
		assert_eq!(restored.user_id, memory.user_id);
		assert_eq!(restored.kind, memory.kind);
		assert_eq!(restored.title, memory.title);
		assert_eq!(restored.embedding.len(), memory.embedding.len());
		assert_eq!(restored.created_at, memory.created_at);
	}

	#[test]
	fn payload_building_accepts_every_field() {
		assert!(memory_to_payload(&sample_memory()).is_ok());
	}
}
