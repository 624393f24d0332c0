use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use mindcache_domain::Memory;

use crate::{MemoryService, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
	pub id: Uuid,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub thumbnail_url: Option<String>,
}

impl MemoryService {
	/// Updates display metadata on an owned record. The search text derives
	/// from title and description, so the embedding is recomputed before the
	/// replace. Returns `None` for an absent or foreign id.
	pub async fn update(
		&self,
		user_id: &str,
		req: UpdateRequest,
	) -> ServiceResult<Option<Memory>> {
		let user_id = self.require_user_id(user_id)?;
		let Some(mut memory) = self.store.fetch(user_id, req.id).await? else {
			return Ok(None);
		};

		if let Some(title) = req.title {
			memory.title = Some(title);
		}
		if let Some(description) = req.description {
			memory.description = Some(description);
		}
		if let Some(thumbnail_url) = req.thumbnail_url {
			memory.thumbnail_url = Some(thumbnail_url);
		}

		memory.embedding = self.embed_single(&memory.search_text()).await?;
		memory.updated_at = OffsetDateTime::now_utc();

		self.store.upsert(&memory).await?;

		Ok(Some(memory))
	}
}
