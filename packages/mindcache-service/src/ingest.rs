use time::OffsetDateTime;
use uuid::Uuid;

use mindcache_domain::{ExtractedContent, Memory, MemoryMetadata, Submission};

use crate::{MemoryService, ServiceResult, SourceKind};

pub const PLACEHOLDER_TITLE: &str = "Untitled Note";

const NOTE_DESCRIPTION_CHARS: usize = 180;

impl MemoryService {
	/// Turns a raw submission into one fully persisted [`Memory`].
	///
	/// Extraction is load-bearing and aborts the call; title generation and
	/// metadata normalization are best-effort and fall back silently. Nothing
	/// is written unless every step up to the upsert succeeded.
	pub async fn ingest(&self, user_id: &str, submission: Submission) -> ServiceResult<Memory> {
		let user_id = self.require_user_id(user_id)?;

		submission.validate()?;

		let now = OffsetDateTime::now_utc();
		let kind = submission.kind();
		let (body, fallback) = match submission {
			Submission::Note { body, title } => {
				let body = body.trim().to_string();
				let title = match non_empty(title) {
					Some(title) => title,
					None => self.note_title(&body).await,
				};
				let description: String = body.chars().take(NOTE_DESCRIPTION_CHARS).collect();

				(body, MemoryMetadata {
					title: Some(title),
					description: Some(description),
					..Default::default()
				})
			},
			Submission::Website { url, title, description } => {
				let ExtractedContent { mut metadata, body } =
					self.extract(SourceKind::Website, &url).await?;

				if let Some(title) = non_empty(title) {
					metadata.title = Some(title);
				}
				if let Some(description) = non_empty(description) {
					metadata.description = Some(description);
				}

				(body, metadata)
			},
			Submission::Youtube { url, title } => {
				let ExtractedContent { mut metadata, body } =
					self.extract(SourceKind::Youtube, &url).await?;

				if let Some(title) = non_empty(title) {
					metadata.title = Some(title);
				}

				(body, metadata)
			},
			Submission::Tweet { url, body } => {
				let extracted = self.extract(SourceKind::Tweet, &url).await?;
				let body = non_empty(body).unwrap_or(extracted.body);

				(body, extracted.metadata)
			},
		};
		let metadata = self.normalize(fallback, &body).await;
		let text =
			mindcache_domain::search_text(metadata.title.as_deref(), metadata.description.as_deref(), &body);
		let embedding = self.embed_single(&text).await?;
		let memory = Memory {
			id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			kind,
			body,
			title: metadata.title,
			description: metadata.description,
			source_id: metadata.source_id,
			source_url: metadata.source_url,
			canonical_url: metadata.canonical_url,
			site_name: metadata.site_name,
			author: metadata.author,
			published_at: metadata.published_at,
			thumbnail_url: metadata.thumbnail_url,
			favicon_url: metadata.favicon_url,
			like_count: metadata.like_count,
			reply_count: metadata.reply_count,
			embedding,
			created_at: now,
			updated_at: now,
		};

		self.store.upsert(&memory).await?;

		Ok(memory)
	}

	async fn extract(&self, kind: SourceKind, url: &str) -> ServiceResult<ExtractedContent> {
		Ok(self
			.providers
			.extractor
			.extract(
				&self.cfg.extractor,
				&self.cfg.cache,
				self.cache.as_ref(),
				kind,
				url,
			)
			.await?)
	}

	async fn note_title(&self, body: &str) -> String {
		if !self.cfg.enrichment.enabled() {
			return PLACEHOLDER_TITLE.to_string();
		}

		match self.providers.enrichment.generate_title(&self.cfg.enrichment, body).await {
			Ok(title) => title,
			Err(err) => {
				tracing::warn!(error = %err, "Title generation failed; using the placeholder.");

				PLACEHOLDER_TITLE.to_string()
			},
		}
	}

	async fn normalize(&self, fallback: MemoryMetadata, body: &str) -> MemoryMetadata {
		if !self.cfg.enrichment.enabled() {
			return fallback;
		}

		match self
			.providers
			.enrichment
			.normalize_metadata(&self.cfg.enrichment, &fallback, body)
			.await
		{
			Ok(normalized) => normalized,
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Metadata normalization failed; keeping extractor fallback."
				);

				fallback
			},
		}
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
