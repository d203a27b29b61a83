//! Integration tests for the cache-fronted feed service over real HTTP.
//!
//! Each test starts its own wiremock server and cache so request counts are
//! isolated. The `.expect(n)` on each mock is verified when the server drops.

use std::sync::Arc;
use std::time::Duration;

use edgefeed::cache::{CacheStore, MemoryCache, SqliteCache};
use edgefeed::feed::{find_episode, find_post, FeedError, FeedKind, FeedService};
use edgefeed::fetch::HttpFeedSource;
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BLOG_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
  <title>Edge Journal</title>
  <link>https://journal.example.com</link>
  <description>Writing from the edge</description>
  <lastBuildDate>Sat, 10 Feb 2024 12:00:00 GMT</lastBuildDate>
  <item>
    <title>Older Post</title>
    <link>https://journal.example.com/older</link>
    <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate>
    <description>First words</description>
  </item>
  <item>
    <title>Caching &amp; You</title>
    <link>https://journal.example.com/caching</link>
    <pubDate>Sat, 10 Feb 2024 12:00:00 GMT</pubDate>
    <description>On caches</description>
    <content:encoded><![CDATA[<p style="margin:0">Cache it.</p><img src="https://cdn.example.com/cache.png">]]></content:encoded>
  </item>
</channel>
</rss>"#;

const VIDEO_ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <entry>
  <yt:videoId>abc123</yt:videoId>
  <title>Edge Demo</title>
  <published>2024-02-01T10:00:00+00:00</published>
  <media:group>
   <media:thumbnail url="https://i.ytimg.com/vi/abc123/hqdefault.jpg" width="480" height="360"/>
   <media:description>A demo</media:description>
  </media:group>
 </entry>
</feed>"#;

const PODCAST_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
  <title>Edge Radio</title>
  <item>
    <title>Pilot</title>
    <link>https://radio.example.com/pilot</link>
    <pubDate>Mon, 01 Jan 2024 08:00:00 GMT</pubDate>
    <description>The first one</description>
    <enclosure url="https://media.example.com/pilot.mp3" length="100" type="audio/mpeg"/>
    <guid>pilot-guid</guid>
  </item>
</channel>
</rss>"#;

fn service_with(cache: Arc<dyn CacheStore>) -> FeedService {
    let source = HttpFeedSource::new(reqwest::Client::new()).with_timeout(Duration::from_secs(5));
    FeedService::new(cache, Arc::new(source))
}

fn memory_service() -> FeedService {
    service_with(Arc::new(MemoryCache::new(16)))
}

async fn serve(server: &MockServer, route: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

// ============================================================================
// Blog
// ============================================================================

#[tokio::test]
async fn test_blog_second_read_served_from_cache() {
    let server = MockServer::start().await;
    serve(&server, "/rss", BLOG_RSS, 1).await;
    let service = memory_service();
    let url = format!("{}/rss", server.uri());

    let first = service.get_posts(&url, false).await.unwrap();
    let second = service.get_posts(&url, false).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_blog_payload_shape() {
    let server = MockServer::start().await;
    serve(&server, "/rss", BLOG_RSS, 1).await;
    let service = memory_service();

    let blog = service
        .get_posts(&format!("{}/rss", server.uri()), false)
        .await
        .unwrap();

    assert_eq!(blog.metadata.blog_title, "Edge Journal");
    assert_eq!(blog.metadata.blog_url, "https://journal.example.com");
    assert_eq!(blog.posts.len(), 2);

    let newest = &blog.posts[0];
    assert_eq!(newest.title, "Caching & You");
    assert_eq!(newest.slug, "caching-you");
    assert_eq!(newest.content, "<p>Cache it.</p><img src=\"https://cdn.example.com/cache.png\">");
    assert_eq!(newest.image.as_deref(), Some("https://cdn.example.com/cache.png"));

    let older = find_post(&blog.posts, "older-post").unwrap();
    assert_eq!(older.content, "First words");
    assert!(older.image.is_none());

    let json: serde_json::Value = serde_json::to_value(&blog).unwrap();
    assert_eq!(json["metadata"]["blogTitle"], "Edge Journal");
    assert_eq!(json["metadata"]["lastBuildDate"], "Sat, 10 Feb 2024 12:00:00 GMT");
    assert_eq!(json["posts"][0]["pubDate"], "Sat, 10 Feb 2024 12:00:00 GMT");
}

#[tokio::test]
async fn test_force_refresh_refetches_and_rewrites_cache() {
    let server = MockServer::start().await;
    serve(&server, "/rss", BLOG_RSS, 2).await;
    let service = memory_service();
    let url = format!("{}/rss", server.uri());

    service.get_posts(&url, false).await.unwrap();
    service.get_posts(&url, true).await.unwrap();
    // Served from the entry the forced read wrote
    service.get_posts(&url, false).await.unwrap();
}

#[tokio::test]
async fn test_blog_upstream_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    let service = memory_service();
    let url = format!("{}/rss", server.uri());

    let err = service.get_posts(&url, false).await.unwrap_err();
    assert!(matches!(
        err,
        FeedError::FetchFailure {
            kind: FeedKind::Blog,
            status: 500
        }
    ));

    // Nothing was cached, so the next read goes upstream again
    assert!(service.get_posts(&url, false).await.is_err());
}

#[tokio::test]
async fn test_distinct_urls_cached_separately() {
    let server = MockServer::start().await;
    serve(&server, "/a.xml", BLOG_RSS, 1).await;
    serve(&server, "/b.xml", BLOG_RSS, 1).await;
    let service = memory_service();

    for _ in 0..2 {
        service
            .get_posts(&format!("{}/a.xml", server.uri()), false)
            .await
            .unwrap();
        service
            .get_posts(&format!("{}/b.xml", server.uri()), false)
            .await
            .unwrap();
    }
}

// ============================================================================
// Videos
// ============================================================================

#[tokio::test]
async fn test_videos_fetched_once_then_cached() {
    let server = MockServer::start().await;
    serve(&server, "/videos.xml", VIDEO_ATOM, 1).await;
    let service = memory_service();
    let url = format!("{}/videos.xml", server.uri());

    let videos = service.get_videos(&url, false).await;
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "abc123");
    assert_eq!(videos[0].link, "https://www.youtube.com/watch?v=abc123");
    assert_eq!(
        videos[0].thumbnail.as_deref(),
        Some("https://i.ytimg.com/vi/abc123/hqdefault.jpg")
    );

    assert_eq!(service.get_videos(&url, false).await, videos);
}

#[tokio::test]
async fn test_videos_upstream_failure_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let service = memory_service();

    let videos = service
        .get_videos(&format!("{}/videos.xml", server.uri()), false)
        .await;
    assert!(videos.is_empty());
}

#[tokio::test]
async fn test_videos_unreachable_host_yields_empty_list() {
    let service = memory_service();
    // Port 9 (discard) on localhost is expected to refuse connections
    let videos = service.get_videos("http://127.0.0.1:9/videos.xml", false).await;
    assert!(videos.is_empty());
}

// ============================================================================
// Podcasts
// ============================================================================

#[tokio::test]
async fn test_podcasts_payload_and_lookup() {
    let server = MockServer::start().await;
    serve(&server, "/podcast.xml", PODCAST_RSS, 1).await;
    let service = memory_service();
    let url = format!("{}/podcast.xml", server.uri());

    let episodes = service.get_podcasts(&url, false).await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(
        episodes[0].audio_url.as_deref(),
        Some("https://media.example.com/pilot.mp3")
    );

    let cached = service.get_podcasts(&url, false).await.unwrap();
    assert_eq!(find_episode(&cached, "pilot-guid"), Some(&episodes[0]));
    assert_eq!(find_episode(&cached, "pilot"), Some(&episodes[0]));
}

#[tokio::test]
async fn test_podcasts_unreachable_host_is_upstream_error() {
    let service = memory_service();
    let err = service
        .get_podcasts("http://127.0.0.1:9/podcast.xml", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FeedError::Upstream {
            kind: FeedKind::Podcast,
            ..
        }
    ));
}

// ============================================================================
// SQLite backend
// ============================================================================

#[tokio::test]
async fn test_sqlite_cache_serves_repeat_reads() {
    let server = MockServer::start().await;
    serve(&server, "/rss", BLOG_RSS, 1).await;
    let cache = SqliteCache::open(":memory:").await.unwrap();
    let service = service_with(Arc::new(cache.clone()));
    let url = format!("{}/rss", server.uri());

    let first = service.get_posts(&url, false).await.unwrap();
    let second = service.get_posts(&url, false).await.unwrap();
    assert_eq!(first, second);

    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.total_entries, 1);
    assert!(stats.total_size_bytes > 0);
}

#[tokio::test]
async fn test_sqlite_cache_stores_json_payload() {
    let server = MockServer::start().await;
    serve(&server, "/podcast.xml", PODCAST_RSS, 1).await;
    let cache = SqliteCache::open(":memory:").await.unwrap();
    let service = service_with(Arc::new(cache.clone()));
    let url = format!("{}/podcast.xml", server.uri());

    service.get_podcasts(&url, false).await.unwrap();

    let bytes = cache.get(&url).await.unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["episodes"][0]["guid"], "pilot-guid");
    assert_eq!(json["episodes"][0]["audioUrl"], "https://media.example.com/pilot.mp3");
}
