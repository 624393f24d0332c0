//! Cache-path tests that never reach a live source: a warm cache must
//! short-circuit the network entirely, and a cold cache against an
//! unreachable host must surface an extraction failure.

use std::time::Duration;

use mindcache_cache::{MetadataCache, MokaCache, keys};
use mindcache_config::{CacheTtls, Extractor};
use mindcache_domain::{ExtractedContent, MemoryMetadata};
use mindcache_providers::{Error, extractor};

// Nothing listens on the discard port, so any fetch fails fast.
const DEAD_URL: &str = "http://127.0.0.1:9/article";

fn extractor_cfg() -> Extractor {
	Extractor { timeout_ms: 500, user_agent: "mindcache-tests".to_string() }
}

fn ttls() -> CacheTtls {
	CacheTtls { metadata_ttl_seconds: 60, tweet_ttl_seconds: 60 }
}

fn cached_content(title: &str) -> ExtractedContent {
	ExtractedContent {
		metadata: MemoryMetadata { title: Some(title.to_string()), ..Default::default() },
		body: format!("{title}\n{DEAD_URL}"),
	}
}

#[tokio::test]
async fn a_warm_cache_short_circuits_the_website_fetch() {
	let cache = MokaCache::default();
	let cached = cached_content("Cached article");

	cache.set(&keys::metadata(DEAD_URL), cached.clone(), Duration::from_secs(60)).await;

	let result = extractor::website(&extractor_cfg(), &ttls(), &cache, DEAD_URL)
		.await
		.expect("A cache hit must never touch the network.");

	assert_eq!(result, cached);
}

#[tokio::test]
async fn a_cold_cache_surfaces_the_fetch_failure() {
	let cache = MokaCache::default();
	let result = extractor::website(&extractor_cfg(), &ttls(), &cache, DEAD_URL).await;

	assert!(result.is_err());
}

#[tokio::test]
async fn an_expired_cache_entry_falls_through_to_the_source() {
	let cache = MokaCache::default();

	cache
		.set(&keys::metadata(DEAD_URL), cached_content("Stale"), Duration::from_millis(50))
		.await;

	tokio::time::sleep(Duration::from_millis(120)).await;

	let result = extractor::website(&extractor_cfg(), &ttls(), &cache, DEAD_URL).await;

	assert!(result.is_err(), "an expired entry must trigger a fresh extraction");
}

#[tokio::test]
async fn a_warm_cache_short_circuits_the_video_lookup() {
	let cache = MokaCache::default();
	let cached = cached_content("Cached video");

	cache.set(&keys::youtube("dQw4w9WgXcQ"), cached.clone(), Duration::from_secs(60)).await;

	let result = extractor::youtube(
		&extractor_cfg(),
		&ttls(),
		&cache,
		"https://youtu.be/dQw4w9WgXcQ",
	)
	.await
	.expect("A cache hit must never touch the network.");

	assert_eq!(result, cached);
}

#[tokio::test]
async fn a_warm_cache_short_circuits_the_tweet_fetch() {
	let cache = MokaCache::default();
	let cached = cached_content("Cached tweet");

	cache.set(&keys::tweet("20"), cached.clone(), Duration::from_secs(60)).await;

	let result =
		extractor::tweet(&extractor_cfg(), &ttls(), &cache, "https://x.com/jack/status/20")
			.await
			.expect("A cache hit must never touch the network.");

	assert_eq!(result, cached);
}

#[tokio::test]
async fn an_unrecognized_video_url_fails_before_any_network_call() {
	let cache = MokaCache::default();
	let result = extractor::youtube(
		&extractor_cfg(),
		&ttls(),
		&cache,
		"https://example.com/not-a-video",
	)
	.await;

	assert!(matches!(result, Err(Error::InvalidSource { .. })));
}

#[tokio::test]
async fn an_unrecognized_tweet_url_fails_before_any_network_call() {
	let cache = MokaCache::default();
	let result =
		extractor::tweet(&extractor_cfg(), &ttls(), &cache, "https://x.com/jack").await;

	assert!(matches!(result, Err(Error::InvalidSource { .. })));
}
