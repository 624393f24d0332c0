use serde::{Deserialize, Serialize};

use mindcache_domain::{MemoryKind, ScoredMemory};
use mindcache_storage::SearchParams;

use crate::{MemoryService, ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub threshold: Option<f32>,
	#[serde(default, rename = "types")]
	pub kinds: Option<Vec<MemoryKind>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub items: Vec<ScoredMemory>,
}

impl MemoryService {
	/// Similarity search over the caller's records, ranked descending.
	///
	/// Results below the threshold are dropped — unless that would drop every
	/// result, in which case the unfiltered top results come back instead. A
	/// user whose store held candidates never sees an empty page just because
	/// none cleared the confidence bar.
	pub async fn search(&self, user_id: &str, req: SearchRequest) -> ServiceResult<SearchResponse> {
		let user_id = self.require_user_id(user_id)?;
		let query = req.query.trim();

		if query.is_empty() {
			return Err(ServiceError::Validation { message: "query is required.".to_string() });
		}

		let limit = req.limit.unwrap_or(self.cfg.search.result_limit);
		let threshold = req.threshold.unwrap_or(self.cfg.search.similarity_threshold);
		let vector = self.embed_single(query).await?;
		let ranked = self
			.store
			.search(user_id, SearchParams {
				vector: &vector,
				limit,
				kinds: req.kinds.as_deref(),
			})
			.await?;
		let filtered: Vec<ScoredMemory> =
			ranked.iter().filter(|item| item.score >= threshold).cloned().collect();
		let items = if filtered.is_empty() { ranked } else { filtered };

		Ok(SearchResponse { items })
	}
}
