//! Per-source metadata extraction.
//!
//! Every variant consults the metadata cache before touching the network and
//! writes back on a miss with its kind-specific TTL. Extraction itself is
//! load-bearing: a fetch or parse failure aborts ingestion, unlike the
//! best-effort enrichment pass.

use std::{sync::LazyLock, time::Duration};

use regex::Regex;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use url::Url;

use mindcache_cache::{MetadataCache, keys};
use mindcache_config::{CacheTtls, Extractor};
use mindcache_domain::{ExtractedContent, MemoryMetadata};

use crate::{Error, Result};

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)(?:youtube\.com/(?:watch\?v=|shorts/)|youtu\.be/)([A-Za-z0-9_-]{11})")
		.expect("Failed to compile the YouTube id regex.")
});

static TWEET_ID: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)status/(\d+)").expect("Failed to compile the tweet id regex.")
});

pub fn video_id(url: &str) -> Option<&str> {
	YOUTUBE_ID.captures(url).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

pub fn tweet_id(url: &str) -> Option<&str> {
	TWEET_ID.captures(url).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

pub async fn website(
	cfg: &Extractor,
	ttls: &CacheTtls,
	cache: &dyn MetadataCache,
	url: &str,
) -> Result<ExtractedContent> {
	let url = url.trim();
	let key = keys::metadata(url);

	if let Some(hit) = cache.get(&key).await {
		tracing::info!(key = %key, source = "website", "Metadata cache hit.");

		return Ok(hit);
	}

	tracing::info!(key = %key, source = "website", "Metadata cache miss.");

	let response = http_client(cfg)?.get(url).send().await?.error_for_status()?;
	let content_type = response
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.unwrap_or("")
		.to_string();

	if !is_text_content(&content_type) {
		return Err(Error::Extraction {
			message: format!("Non-text response ({content_type}) from {url}."),
		});
	}

	let html = response.text().await?;
	let metadata = parse_website_html(&html, url);
	let body = join_parts(&[metadata.title.as_deref(), metadata.description.as_deref(), Some(url)]);
	let result = ExtractedContent { metadata, body };

	cache.set(&key, result.clone(), Duration::from_secs(ttls.metadata_ttl_seconds)).await;

	Ok(result)
}

pub async fn youtube(
	cfg: &Extractor,
	ttls: &CacheTtls,
	cache: &dyn MetadataCache,
	url: &str,
) -> Result<ExtractedContent> {
	let url = url.trim();
	let id = video_id(url)
		.ok_or_else(|| Error::InvalidSource { kind: "YouTube", url: url.to_string() })?;
	let key = keys::youtube(id);

	if let Some(hit) = cache.get(&key).await {
		tracing::info!(key = %key, source = "youtube", "Metadata cache hit.");

		return Ok(hit);
	}

	tracing::info!(key = %key, source = "youtube", "Metadata cache miss.");

	let oembed: Oembed = http_client(cfg)?
		.get("https://www.youtube.com/oembed")
		.query(&[("url", url), ("format", "json")])
		.send()
		.await?
		.error_for_status()?
		.json()
		.await
		.map_err(|err| Error::InvalidResponse {
			message: format!("Malformed oEmbed response for video {id}: {err}"),
		})?;
	let result = oembed_to_content(oembed, id, url);

	cache.set(&key, result.clone(), Duration::from_secs(ttls.metadata_ttl_seconds)).await;

	Ok(result)
}

pub async fn tweet(
	cfg: &Extractor,
	ttls: &CacheTtls,
	cache: &dyn MetadataCache,
	url: &str,
) -> Result<ExtractedContent> {
	let url = url.trim();
	let id =
		tweet_id(url).ok_or_else(|| Error::InvalidSource { kind: "tweet", url: url.to_string() })?;
	let key = keys::tweet(id);

	if let Some(hit) = cache.get(&key).await {
		tracing::info!(key = %key, source = "tweet", "Metadata cache hit.");

		return Ok(hit);
	}

	tracing::info!(key = %key, source = "tweet", "Metadata cache miss.");

	let token = syndication_token(id);
	let response = http_client(cfg)?
		.get("https://cdn.syndication.twimg.com/tweet-result")
		.query(&[("id", id), ("token", token.as_str()), ("lang", "en")])
		.send()
		.await?;

	if response.status() == StatusCode::NOT_FOUND {
		return Err(Error::SourceNotFound { id: id.to_string() });
	}

	let raw = response.error_for_status()?.text().await?;

	if raw.trim().is_empty() {
		return Err(Error::SourceNotFound { id: id.to_string() });
	}

	let data: TweetData = serde_json::from_str(&raw).map_err(|err| Error::InvalidResponse {
		message: format!("Malformed tweet payload for {id}: {err}"),
	})?;

	if data.text.is_none() && data.user.is_none() {
		return Err(Error::SourceNotFound { id: id.to_string() });
	}

	let result = tweet_to_content(data, id, url);

	cache.set(&key, result.clone(), Duration::from_secs(ttls.tweet_ttl_seconds)).await;

	Ok(result)
}

#[derive(Debug, Deserialize)]
struct Oembed {
	title: Option<String>,
	author_name: Option<String>,
	thumbnail_url: Option<String>,
	provider_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
	text: Option<String>,
	user: Option<TweetUser>,
	#[serde(default)]
	photos: Vec<TweetPhoto>,
	created_at: Option<String>,
	favorite_count: Option<i64>,
	conversation_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TweetUser {
	name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TweetPhoto {
	url: Option<String>,
}

fn http_client(cfg: &Extractor) -> Result<Client> {
	Ok(Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.user_agent(cfg.user_agent.clone())
		.build()?)
}

fn is_text_content(content_type: &str) -> bool {
	let content_type = content_type.to_ascii_lowercase();

	content_type.is_empty()
		|| content_type.starts_with("text/")
		|| content_type.contains("html")
		|| content_type.contains("xml")
}

fn join_parts(parts: &[Option<&str>]) -> String {
	parts
		.iter()
		.filter_map(|part| *part)
		.map(str::trim)
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join("\n")
}

/// Resolves Open Graph tags with generic link-preview fallbacks. Parsing is
/// synchronous on purpose: the parsed document is not `Send` and must never
/// be held across an await point.
fn parse_website_html(html: &str, url: &str) -> MemoryMetadata {
	let document = scraper::Html::parse_document(html);
	let meta_selector =
		scraper::Selector::parse("head meta").expect("Failed to parse the meta selector.");
	let title_selector =
		scraper::Selector::parse("head title").expect("Failed to parse the title selector.");
	let icon_selector = scraper::Selector::parse(r#"head link[rel~="icon"]"#)
		.expect("Failed to parse the icon selector.");
	let mut title = None;
	let mut description = None;
	let mut thumbnail_url = None;
	let mut site_name = None;
	let mut author = None;
	let mut published_at_raw = None;
	let mut canonical_url = None;

	for element in document.select(&meta_selector) {
		let meta_key =
			element.attr("property").or_else(|| element.attr("name")).unwrap_or_default();
		let Some(meta_value) = element.attr("content").map(str::trim).filter(|v| !v.is_empty())
		else {
			continue;
		};

		match meta_key {
			"og:title" | "twitter:title" if title.is_none() =>
				title = Some(meta_value.to_string()),
			"og:description" | "twitter:description" | "description" | "Description"
				if description.is_none() =>
				description = Some(meta_value.to_string()),
			"og:image" | "twitter:image" if thumbnail_url.is_none() =>
				thumbnail_url = Some(meta_value.to_string()),
			"og:site_name" if site_name.is_none() => site_name = Some(meta_value.to_string()),
			"article:author" if author.is_none() => author = Some(meta_value.to_string()),
			"article:published_time" if published_at_raw.is_none() =>
				published_at_raw = Some(meta_value.to_string()),
			"og:url" if canonical_url.is_none() => canonical_url = Some(meta_value.to_string()),
			_ => {},
		}
	}

	if title.is_none() {
		title = document
			.select(&title_selector)
			.next()
			.map(|element| element.text().collect::<String>().trim().to_string())
			.filter(|text| !text.is_empty());
	}

	let favicon_url = document
		.select(&icon_selector)
		.next()
		.and_then(|element| element.attr("href"))
		.and_then(|href| absolutize(url, href));

	MemoryMetadata {
		source_url: Some(url.to_string()),
		canonical_url: canonical_url.or_else(|| Some(url.to_string())),
		site_name,
		author,
		published_at: published_at_raw.as_deref().and_then(parse_published_at),
		thumbnail_url: thumbnail_url.or_else(|| favicon_url.clone()),
		favicon_url,
		title,
		description,
		..Default::default()
	}
}

fn oembed_to_content(oembed: Oembed, id: &str, url: &str) -> ExtractedContent {
	let thumbnail = oembed
		.thumbnail_url
		.unwrap_or_else(|| format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"));
	let body = join_parts(&[oembed.title.as_deref(), oembed.author_name.as_deref(), Some(url)]);

	ExtractedContent {
		metadata: MemoryMetadata {
			source_id: Some(id.to_string()),
			source_url: Some(url.to_string()),
			canonical_url: Some(format!("https://www.youtube.com/watch?v={id}")),
			site_name: oembed.provider_name.or_else(|| Some("YouTube".to_string())),
			author: oembed.author_name,
			thumbnail_url: Some(thumbnail),
			title: oembed.title,
			..Default::default()
		},
		body,
	}
}

fn tweet_to_content(data: TweetData, id: &str, url: &str) -> ExtractedContent {
	let author = data.user.and_then(|user| user.name);
	let title = match author.as_deref() {
		Some(name) => format!("Tweet by {name}"),
		None => "Tweet".to_string(),
	};
	let body = join_parts(&[data.text.as_deref(), author.as_deref(), Some(url)]);

	ExtractedContent {
		metadata: MemoryMetadata {
			source_id: Some(id.to_string()),
			source_url: Some(url.to_string()),
			canonical_url: Some(format!("https://x.com/i/status/{id}")),
			site_name: Some("X".to_string()),
			author,
			published_at: data.created_at.as_deref().and_then(parse_published_at),
			thumbnail_url: data.photos.into_iter().next().and_then(|photo| photo.url),
			title: Some(title),
			description: data.text,
			like_count: data.favorite_count,
			reply_count: data.conversation_count,
			..Default::default()
		},
		body,
	}
}

fn parse_published_at(raw: &str) -> Option<OffsetDateTime> {
	OffsetDateTime::parse(raw, &Rfc3339).ok()
}

fn absolutize(base: &str, href: &str) -> Option<String> {
	Url::parse(base).ok()?.join(href).ok().map(|joined| joined.to_string())
}

/// The syndication CDN expects a token derived from the tweet id: the id
/// scaled by pi, rendered in base 36, with zeros and the radix point removed.
fn syndication_token(id: &str) -> String {
	let id: f64 = id.parse().unwrap_or(0.0);
	let mut value = id / 1e15 * std::f64::consts::PI;
	let mut digits = Vec::new();
	let mut integer = value.trunc() as u64;

	loop {
		digits.insert(0, char::from_digit((integer % 36) as u32, 36).unwrap_or('0'));

		integer /= 36;

		if integer == 0 {
			break;
		}
	}
	digits.push('.');

	value = value.fract();

	for _ in 0..12 {
		value *= 36.0;

		let digit = value.trunc() as u32;

		digits.push(char::from_digit(digit % 36, 36).unwrap_or('0'));

		value = value.fract();
	}

	digits.into_iter().filter(|c| *c != '0' && *c != '.').collect()
}
