use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use mindcache_domain::Memory;

use crate::{MemoryService, ServiceResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRequest {
	/// Opaque pagination boundary: results are strictly older than this.
	#[serde(default, with = "mindcache_domain::time_serde::option")]
	pub cursor: Option<OffsetDateTime>,
	#[serde(default)]
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
	pub items: Vec<Memory>,
}

impl MemoryService {
	/// Newest first. A full page (`items.len() == limit`) signals that more
	/// pages may follow; the last item's `created_at` is the next cursor.
	pub async fn list(&self, user_id: &str, req: ListRequest) -> ServiceResult<ListResponse> {
		let user_id = self.require_user_id(user_id)?;
		let limit = req.limit.unwrap_or(self.cfg.search.list_page_limit);
		let items = self.store.list(user_id, req.cursor, limit).await?;

		Ok(ListResponse { items })
	}
}
