//! Feed ingestion: parsing upstream XML into typed records and serving them
//! through a cache.
//!
//! - **Parsing**: [`parse_blog_feed`], [`parse_video_feed`] and
//!   [`parse_podcast_feed`] turn raw feed text into records. They never fail;
//!   missing elements become empty fields.
//! - **Serving**: [`FeedService`] checks the cache by feed URL, fetches and
//!   parses on a miss, and writes the JSON payload back with a TTL.
//!
//! # Example
//!
//! ```ignore
//! use edgefeed::feed::FeedService;
//!
//! let service = FeedService::new(cache, source);
//! let blog = service.get_posts("https://blog.example.com/rss", false).await?;
//! let videos = service.get_videos(youtube_url, false).await; // never fails
//! ```

mod blog;
mod dates;
mod podcast;
mod service;
mod types;
mod video;

pub use blog::{parse_blog_feed, parse_channel_metadata};
pub use dates::{parse_feed_date, sort_newest_first};
pub use podcast::parse_podcast_feed;
pub use service::{FeedError, FeedService, DEFAULT_CACHE_TTL};
pub use types::{
    find_episode, find_post, find_video, BlogFeed, ChannelMetadata, FeedKind, PodcastEpisode,
    PodcastFeed, Post, Video, VideoFeed,
};
pub use video::{parse_video_feed, watch_url};
