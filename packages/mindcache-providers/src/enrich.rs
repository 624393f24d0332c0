//! Best-effort generative enrichment.
//!
//! Both calls go to an OpenAI-compatible chat-completions endpoint. Callers
//! treat every error here as a signal to keep their fallback values; nothing
//! in this module is allowed to abort an ingestion.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use mindcache_config::Enrichment;
use mindcache_domain::MemoryMetadata;

use crate::{Error, Result};

const PROMPT_BODY_CHARS: usize = 2_000;
const TITLE_MAX_CHARS: usize = 180;
const ATTEMPTS: usize = 3;

pub async fn generate_title(cfg: &Enrichment, body: &str) -> Result<String> {
	let prompt = format!(
		"Generate a concise title (max 8 words) for this note:\n\n{}",
		truncate_chars(body, PROMPT_BODY_CHARS),
	);
	let content = chat(cfg, &prompt).await?;
	let title = clean_title(&content);

	if title.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Title generation returned an empty string.".to_string(),
		});
	}

	Ok(title)
}

pub async fn normalize_metadata(
	cfg: &Enrichment,
	fallback: &MemoryMetadata,
	body: &str,
) -> Result<MemoryMetadata> {
	let fallback_json = serde_json::to_string(fallback).map_err(|err| Error::InvalidResponse {
		message: format!("Failed to encode fallback metadata: {err}"),
	})?;
	let prompt = format!(
		"Normalize this extracted metadata for a memory card.\n\
		Return only a JSON object with the keys canonicalUrl, siteName, author, publishedAt, \
		thumbnailUrl, faviconUrl, title, and description; use null for anything that is not \
		confidently present.\n\n\
		Body:\n{}\n\n\
		Fallback metadata:\n{}",
		truncate_chars(body, PROMPT_BODY_CHARS),
		fallback_json,
	);

	for _ in 0..ATTEMPTS {
		let content = chat(cfg, &prompt).await?;

		if let Ok(refined) = parse_refined_metadata(&content) {
			return Ok(fallback.clone().overlay(refined));
		}
	}

	Err(Error::InvalidResponse {
		message: "Metadata normalization returned no valid JSON.".to_string(),
	})
}

async fn chat(cfg: &Enrichment, prompt: &str) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let request = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": [{ "role": "user", "content": prompt }],
	});
	let json: Value = client
		.post(url)
		.bearer_auth(&cfg.api_key)
		.json(&request)
		.send()
		.await?
		.error_for_status()?
		.json()
		.await?;

	parse_chat_content(&json)
}

fn parse_chat_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|choices| choices.as_array())
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(|content| content.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat response is missing message content.".to_string(),
		})
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefinedMetadata {
	canonical_url: Option<String>,
	site_name: Option<String>,
	author: Option<String>,
	published_at: Option<String>,
	thumbnail_url: Option<String>,
	favicon_url: Option<String>,
	title: Option<String>,
	description: Option<String>,
}

fn parse_refined_metadata(content: &str) -> Result<MemoryMetadata> {
	// Models occasionally wrap the object in a code fence; strip it first.
	let trimmed = content.trim().trim_start_matches("```json").trim_matches('`').trim();
	let refined: RefinedMetadata =
		serde_json::from_str(trimmed).map_err(|err| Error::InvalidResponse {
			message: format!("Refined metadata is not valid JSON: {err}"),
		})?;

	Ok(MemoryMetadata {
		canonical_url: non_empty(refined.canonical_url),
		site_name: non_empty(refined.site_name),
		author: non_empty(refined.author),
		published_at: refined
			.published_at
			.as_deref()
			.and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok()),
		thumbnail_url: non_empty(refined.thumbnail_url),
		favicon_url: non_empty(refined.favicon_url),
		title: non_empty(refined.title),
		description: non_empty(refined.description),
		..Default::default()
	})
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn clean_title(raw: &str) -> String {
	let cleaned = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();

	truncate_chars(cleaned, TITLE_MAX_CHARS)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
	text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "\"Refactoring Embeddings\"" } }
			]
		});
		let content = parse_chat_content(&json).expect("Failed to parse chat content.");

		assert_eq!(clean_title(&content), "Refactoring Embeddings");
	}

	#[test]
	fn missing_content_is_an_invalid_response() {
		let json = serde_json::json!({ "choices": [] });

		assert!(matches!(parse_chat_content(&json), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn refined_metadata_parses_nullable_fields() {
		let refined = parse_refined_metadata(
			r#"{
				"canonicalUrl": "https://example.com/post",
				"siteName": null,
				"author": "  ",
				"publishedAt": "2024-05-01T10:00:00Z",
				"thumbnailUrl": null,
				"faviconUrl": null,
				"title": "A Post",
				"description": null
			}"#,
		)
		.expect("Failed to parse refined metadata.");

		assert_eq!(refined.canonical_url.as_deref(), Some("https://example.com/post"));
		assert_eq!(refined.title.as_deref(), Some("A Post"));
		assert!(refined.site_name.is_none());
		assert!(refined.author.is_none());
		assert!(refined.published_at.is_some());
	}

	#[test]
	fn refined_metadata_tolerates_code_fences() {
		let refined = parse_refined_metadata(
			"```json\n{\"canonicalUrl\":null,\"siteName\":\"Example\",\"author\":null,\
			\"publishedAt\":null,\"thumbnailUrl\":null,\"faviconUrl\":null,\"title\":null,\
			\"description\":null}\n```",
		)
		.expect("Failed to parse fenced metadata.");

		assert_eq!(refined.site_name.as_deref(), Some("Example"));
	}

	#[test]
	fn malformed_json_is_an_invalid_response() {
		assert!(matches!(
			parse_refined_metadata("not json at all"),
			Err(Error::InvalidResponse { .. }),
		));
	}

	#[test]
	fn titles_are_trimmed_and_bounded() {
		let long = "word ".repeat(100);

		assert_eq!(clean_title("  \"A Tidy Title\"  "), "A Tidy Title");
		assert_eq!(clean_title(&long).chars().count(), TITLE_MAX_CHARS);
	}
}
