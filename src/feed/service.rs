use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::blog::parse_blog_feed;
use super::podcast::parse_podcast_feed;
use super::types::{BlogFeed, FeedKind, PodcastEpisode, PodcastFeed, Video, VideoFeed};
use super::video::parse_video_feed;
use crate::cache::CacheStore;
use crate::fetch::{FeedSource, FetchError};

/// Default lifetime of a cached feed payload (3 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(180);

/// Errors surfaced by the cache-fronted feed operations.
///
/// Parsing never fails and cache problems are logged, not returned, so every
/// variant describes a problem reaching or encoding the upstream feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Upstream answered with a non-2xx status
    #[error("Failed to fetch {kind} feed: HTTP status {status}")]
    FetchFailure { kind: FeedKind, status: u16 },
    /// Upstream could not be reached or its body could not be read
    #[error("Failed to fetch {kind} feed: {source}")]
    Upstream {
        kind: FeedKind,
        #[source]
        source: FetchError,
    },
    /// Parsed payload could not be encoded for the cache
    #[error("Failed to serialize {kind} feed: {source}")]
    Serialization {
        kind: FeedKind,
        #[source]
        source: serde_json::Error,
    },
}

impl FeedError {
    /// Which feed the failed operation was for.
    pub fn kind(&self) -> FeedKind {
        match self {
            FeedError::FetchFailure { kind, .. }
            | FeedError::Upstream { kind, .. }
            | FeedError::Serialization { kind, .. } => *kind,
        }
    }
}

/// Cache-fronted access to the blog, video and podcast feeds.
///
/// Every operation takes the feed URL, which doubles as the cache key, and a
/// `force_refresh` flag that skips the cache read (the fresh result is still
/// written back). Concurrent misses for the same URL each fetch upstream and
/// each write the cache; writes are full replacements, so the last one wins.
#[derive(Clone)]
pub struct FeedService {
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn FeedSource>,
    ttl: Duration,
}

impl FeedService {
    pub fn new(cache: Arc<dyn CacheStore>, source: Arc<dyn FeedSource>) -> Self {
        Self {
            cache,
            source,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Blog metadata and posts for `url`, newest first.
    ///
    /// # Errors
    ///
    /// - [`FeedError::FetchFailure`] - upstream returned a non-2xx status
    /// - [`FeedError::Upstream`] - network, timeout or body errors
    /// - [`FeedError::Serialization`] - the payload could not be encoded
    pub async fn get_posts(&self, url: &str, force_refresh: bool) -> Result<BlogFeed, FeedError> {
        self.cached_or_fetch(FeedKind::Blog, url, force_refresh, parse_blog_feed)
            .await
    }

    /// Videos for `url`, newest first.
    ///
    /// Never fails: any fetch or encoding error is logged and yields an
    /// empty list.
    pub async fn get_videos(&self, url: &str, force_refresh: bool) -> Vec<Video> {
        let result = self
            .cached_or_fetch(FeedKind::Video, url, force_refresh, |xml| VideoFeed {
                videos: parse_video_feed(xml),
            })
            .await;

        match result {
            Ok(feed) => feed.videos,
            Err(e) => {
                tracing::warn!(feed = %url, error = %e, "Video feed unavailable, serving empty list");
                Vec::new()
            }
        }
    }

    /// Podcast episodes for `url`, in feed order.
    ///
    /// # Errors
    ///
    /// Same as [`FeedService::get_posts`].
    pub async fn get_podcasts(
        &self,
        url: &str,
        force_refresh: bool,
    ) -> Result<Vec<PodcastEpisode>, FeedError> {
        let feed = self
            .cached_or_fetch(FeedKind::Podcast, url, force_refresh, |xml| PodcastFeed {
                episodes: parse_podcast_feed(xml),
            })
            .await?;
        Ok(feed.episodes)
    }

    async fn cached_or_fetch<T, F>(
        &self,
        kind: FeedKind,
        url: &str,
        force_refresh: bool,
        parse: F,
    ) -> Result<T, FeedError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&str) -> T,
    {
        if !force_refresh {
            if let Some(cached) = self.read_cache(kind, url).await {
                return Ok(cached);
            }
        }

        let response = self
            .source
            .fetch(url)
            .await
            .map_err(|source| FeedError::Upstream { kind, source })?;

        if !response.is_success() {
            tracing::warn!(feed = %url, kind = %kind, status = response.status, "Upstream feed fetch failed");
            return Err(FeedError::FetchFailure {
                kind,
                status: response.status,
            });
        }

        let parsed = parse(&response.body);
        let bytes = serde_json::to_vec(&parsed)
            .map_err(|source| FeedError::Serialization { kind, source })?;

        // The cache is a derived view; failing to write it must not fail the request
        if let Err(e) = self.cache.put(url, &bytes, self.ttl).await {
            tracing::warn!(feed = %url, kind = %kind, error = %e, "Failed to write feed cache");
        } else {
            tracing::debug!(
                feed = %url,
                kind = %kind,
                size_bytes = bytes.len(),
                ttl_secs = self.ttl.as_secs(),
                "Cached feed payload"
            );
        }

        Ok(parsed)
    }

    /// Cached payload for `url`, or `None` on a miss.
    ///
    /// Backend errors and entries that no longer decode as `T` count as
    /// misses.
    async fn read_cache<T: DeserializeOwned>(&self, kind: FeedKind, url: &str) -> Option<T> {
        let bytes = match self.cache.get(url).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!(feed = %url, kind = %kind, "Feed cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(feed = %url, kind = %kind, error = %e, "Feed cache read failed");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                tracing::debug!(feed = %url, kind = %kind, "Feed cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(feed = %url, kind = %kind, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryCache};
    use crate::fetch::FetchResponse;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BLOG_RSS: &str = r#"<rss><channel><title>Blog</title>
<item><title>Older</title><pubDate>2024-01-01</pubDate></item>
<item><title>Newer</title><pubDate>2024-02-01</pubDate></item>
</channel></rss>"#;

    const VIDEO_ATOM: &str = r#"<feed><entry><yt:videoId>abc</yt:videoId><title>Clip</title>
<published>2024-01-01T00:00:00Z</published></entry></feed>"#;

    const PODCAST_RSS: &str = r#"<rss><channel><item><title>Ep 1</title><guid>g1</guid>
<enclosure url="https://m.example.com/1.mp3" type="audio/mpeg"/></item></channel></rss>"#;

    /// Serves a fixed response and counts calls.
    struct StubSource {
        status: u16,
        body: &'static str,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn ok(body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status: 200,
                body,
                calls: AtomicUsize::new(0),
            })
        }

        fn status(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: "",
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeedSource for StubSource {
        async fn fetch(&self, _url: &str) -> Result<FetchResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchResponse {
                status: self.status,
                body: self.body.to_string(),
            })
        }
    }

    struct TimeoutSource;

    #[async_trait]
    impl FeedSource for TimeoutSource {
        async fn fetch(&self, _url: &str) -> Result<FetchResponse, FetchError> {
            Err(FetchError::Timeout)
        }
    }

    /// A cache whose every operation fails.
    struct BrokenCache;

    #[async_trait]
    impl CacheStore for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Migration("broken".into()))
        }

        async fn put(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Migration("broken".into()))
        }
    }

    fn service(cache: Arc<dyn CacheStore>, source: Arc<dyn FeedSource>) -> FeedService {
        FeedService::new(cache, source)
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let source = StubSource::ok(BLOG_RSS);
        let svc = service(Arc::new(MemoryCache::default()), source.clone());

        let first = svc.get_posts("https://b/rss", false).await.unwrap();
        let second = svc.get_posts("https://b/rss", false).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(first.posts[0].title, "Newer");
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let source = StubSource::ok(BLOG_RSS);
        let svc = service(Arc::new(MemoryCache::default()), source.clone());

        svc.get_posts("https://b/rss", false).await.unwrap();
        svc.get_posts("https://b/rss", true).await.unwrap();
        svc.get_posts("https://b/rss", false).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_keyed_by_url() {
        let source = StubSource::ok(BLOG_RSS);
        let svc = service(Arc::new(MemoryCache::default()), source.clone());

        svc.get_posts("https://a/rss", false).await.unwrap();
        svc.get_posts("https://b/rss", false).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_after_ttl() {
        let source = StubSource::ok(BLOG_RSS);
        let svc = service(Arc::new(MemoryCache::default()), source.clone());

        svc.get_posts("https://b/rss", false).await.unwrap();
        tokio::time::advance(DEFAULT_CACHE_TTL + Duration::from_secs(1)).await;
        svc.get_posts("https://b/rss", false).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_blog_non_success_propagates() {
        let svc = service(Arc::new(MemoryCache::default()), StubSource::status(502));

        let err = svc.get_posts("https://b/rss", false).await.unwrap_err();
        assert!(matches!(
            err,
            FeedError::FetchFailure {
                kind: FeedKind::Blog,
                status: 502
            }
        ));
        assert!(err.to_string().contains("blog"));
    }

    #[tokio::test]
    async fn test_podcast_errors_propagate() {
        let svc = service(Arc::new(MemoryCache::default()), Arc::new(TimeoutSource));

        let err = svc.get_podcasts("https://p/rss", false).await.unwrap_err();
        assert_eq!(err.kind(), FeedKind::Podcast);
        assert!(matches!(
            err,
            FeedError::Upstream {
                source: FetchError::Timeout,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_fetch_not_cached() {
        let cache = Arc::new(MemoryCache::default());
        let svc = service(cache.clone(), StubSource::status(500));

        assert!(svc.get_podcasts("https://p/rss", false).await.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_videos_swallow_errors() {
        let svc = service(Arc::new(MemoryCache::default()), StubSource::status(404));
        assert!(svc.get_videos("https://v/feed", false).await.is_empty());

        let svc = service(Arc::new(MemoryCache::default()), Arc::new(TimeoutSource));
        assert!(svc.get_videos("https://v/feed", false).await.is_empty());
    }

    #[tokio::test]
    async fn test_videos_and_podcasts_parse() {
        let svc = service(Arc::new(MemoryCache::default()), StubSource::ok(VIDEO_ATOM));
        let videos = svc.get_videos("https://v/feed", false).await;
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].link, "https://www.youtube.com/watch?v=abc");

        let svc = service(Arc::new(MemoryCache::default()), StubSource::ok(PODCAST_RSS));
        let episodes = svc.get_podcasts("https://p/rss", false).await.unwrap();
        assert_eq!(episodes[0].guid, "g1");
        assert_eq!(
            episodes[0].audio_url.as_deref(),
            Some("https://m.example.com/1.mp3")
        );
    }

    #[tokio::test]
    async fn test_cached_payload_shapes() {
        let cache = Arc::new(MemoryCache::default());

        service(cache.clone(), StubSource::ok(BLOG_RSS))
            .get_posts("https://b/rss", false)
            .await
            .unwrap();
        service(cache.clone(), StubSource::ok(VIDEO_ATOM))
            .get_videos("https://v/feed", false)
            .await;
        service(cache.clone(), StubSource::ok(PODCAST_RSS))
            .get_podcasts("https://p/rss", false)
            .await
            .unwrap();

        let blog: serde_json::Value =
            serde_json::from_slice(&cache.get("https://b/rss").await.unwrap().unwrap()).unwrap();
        assert_eq!(blog["metadata"]["blogTitle"], "Blog");
        assert!(blog["posts"].is_array());

        let videos: serde_json::Value =
            serde_json::from_slice(&cache.get("https://v/feed").await.unwrap().unwrap()).unwrap();
        assert!(videos["videos"].is_array());

        let podcasts: serde_json::Value =
            serde_json::from_slice(&cache.get("https://p/rss").await.unwrap().unwrap()).unwrap();
        assert!(podcasts["episodes"].is_array());
    }

    #[tokio::test]
    async fn test_undecodable_cache_entry_refetched() {
        let cache = Arc::new(MemoryCache::default());
        cache
            .put("https://b/rss", b"not json", DEFAULT_CACHE_TTL)
            .await
            .unwrap();

        let source = StubSource::ok(BLOG_RSS);
        let svc = service(cache, source.clone());
        let feed = svc.get_posts("https://b/rss", false).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(feed.posts.len(), 2);
    }

    #[tokio::test]
    async fn test_broken_cache_does_not_fail_request() {
        let source = StubSource::ok(BLOG_RSS);
        let svc = service(Arc::new(BrokenCache), source.clone());

        assert!(svc.get_posts("https://b/rss", false).await.is_ok());
        assert!(svc.get_posts("https://b/rss", false).await.is_ok());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let svc = service(Arc::new(MemoryCache::default()), StubSource::ok(BLOG_RSS))
            .with_ttl(Duration::from_secs(5));
        assert_eq!(svc.ttl(), Duration::from_secs(5));
    }
}
