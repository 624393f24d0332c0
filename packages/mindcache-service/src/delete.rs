use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MemoryService, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
	pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
	pub id: Uuid,
}

impl MemoryService {
	/// Removes an owned record. Deleting an absent or foreign id is not an
	/// error; it returns `None`.
	pub async fn delete(
		&self,
		user_id: &str,
		req: DeleteRequest,
	) -> ServiceResult<Option<DeleteResponse>> {
		let user_id = self.require_user_id(user_id)?;

		if self.store.delete(user_id, req.id).await? {
			Ok(Some(DeleteResponse { id: req.id }))
		} else {
			Ok(None)
		}
	}
}
