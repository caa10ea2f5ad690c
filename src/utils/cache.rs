//! Caching utilities

use moka::future::Cache;
use std::time::Duration;

/// High-performance async cache using moka
pub type AsyncCache<K, V> = Cache<K, V>;

/// Create a new async cache with TTL and max capacity
pub fn new_async_cache_with_capacity<K, V>(ttl: Duration, max_capacity: u64) -> AsyncCache<K, V>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .time_to_live(ttl)
        .max_capacity(max_capacity)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_async_cache_expires() {
        let cache = new_async_cache_with_capacity(Duration::from_millis(200), 8);

        cache.insert("key1", "value1").await;
        assert_eq!(cache.get(&"key1").await, Some("value1"));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(cache.get(&"key1").await, None);
    }

    #[tokio::test]
    async fn test_async_cache_with_capacity() {
        let cache = new_async_cache_with_capacity(Duration::from_secs(60), 16);

        cache.insert("abc123".to_string(), 42u32).await;
        assert_eq!(cache.get("abc123").await, Some(42));
        assert_eq!(cache.get("missing").await, None);
    }
}
