//! TTL cache for extractor results, keyed by stable source identity.
//!
//! The trait is deliberately infallible: a cache backend that breaks must
//! degrade to "always extract", so implementations swallow their own errors
//! and the pipeline never sees them.

pub mod keys;

use std::{
	future::Future,
	pin::Pin,
	time::{Duration, Instant},
};

use moka::{Expiry, future::Cache};

use mindcache_domain::ExtractedContent;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait MetadataCache
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<ExtractedContent>>;

	fn set<'a>(&'a self, key: &'a str, value: ExtractedContent, ttl: Duration)
	-> BoxFuture<'a, ()>;
}

#[derive(Clone)]
struct Entry {
	content: ExtractedContent,
	ttl: Duration,
}

struct PerEntryTtl;
impl Expiry<String, Entry> for PerEntryTtl {
	fn expire_after_create(
		&self,
		_key: &String,
		entry: &Entry,
		_created_at: Instant,
	) -> Option<Duration> {
		Some(entry.ttl)
	}
}

/// In-process cache with per-entry TTL eviction. Concurrent misses computing
/// the same key are last-write-wins.
#[derive(Clone)]
pub struct MokaCache {
	entries: Cache<String, Entry>,
}
impl MokaCache {
	pub fn new(max_capacity: u64) -> Self {
		let entries = Cache::builder().max_capacity(max_capacity).expire_after(PerEntryTtl).build();

		Self { entries }
	}
}
impl Default for MokaCache {
	fn default() -> Self {
		Self::new(10_000)
	}
}
impl MetadataCache for MokaCache {
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<ExtractedContent>> {
		Box::pin(async move { self.entries.get(key).await.map(|entry| entry.content) })
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: ExtractedContent,
		ttl: Duration,
	) -> BoxFuture<'a, ()> {
		Box::pin(async move {
			self.entries.insert(key.to_string(), Entry { content: value, ttl }).await;
		})
	}
}

/// Disables caching; every extraction goes to the source.
pub struct NoopCache;
impl MetadataCache for NoopCache {
	fn get<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, Option<ExtractedContent>> {
		Box::pin(async { None })
	}

	fn set<'a>(
		&'a self,
		_key: &'a str,
		_value: ExtractedContent,
		_ttl: Duration,
	) -> BoxFuture<'a, ()> {
		Box::pin(async {})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use mindcache_domain::MemoryMetadata;

	fn sample() -> ExtractedContent {
		ExtractedContent {
			metadata: MemoryMetadata {
				title: Some("Example".to_string()),
				..Default::default()
			},
			body: "Example\nhttps://example.com".to_string(),
		}
	}

	#[tokio::test]
	async fn get_returns_what_set_stored() {
		let cache = MokaCache::default();

		assert!(cache.get("metadata:https://example.com").await.is_none());

		cache.set("metadata:https://example.com", sample(), Duration::from_secs(60)).await;

		let hit = cache.get("metadata:https://example.com").await;

		assert_eq!(hit, Some(sample()));
	}

	#[tokio::test]
	async fn entries_expire_after_their_own_ttl() {
		let cache = MokaCache::default();

		cache.set("tweet:1", sample(), Duration::from_millis(50)).await;
		cache.set("tweet:2", sample(), Duration::from_secs(60)).await;

		tokio::time::sleep(Duration::from_millis(120)).await;

		assert!(cache.get("tweet:1").await.is_none());
		assert!(cache.get("tweet:2").await.is_some());
	}

	#[tokio::test]
	async fn noop_cache_never_hits() {
		let cache = NoopCache;

		cache.set("metadata:key", sample(), Duration::from_secs(60)).await;

		assert!(cache.get("metadata:key").await.is_none());
	}
}
