use serde::{Deserialize, Serialize};
use std::fmt;

/// The three upstream feed flavours the edge serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Blog,
    Video,
    Podcast,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedKind::Blog => "blog",
            FeedKind::Video => "video",
            FeedKind::Podcast => "podcast",
        };
        f.write_str(name)
    }
}

/// A blog article from an RSS `<item>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub title: String,
    pub link: String,
    /// Timestamp exactly as the feed wrote it
    pub pub_date: String,
    /// Decoded HTML summary
    pub description: String,
    /// Derived from the title, not guaranteed unique
    pub slug: String,
    /// Cleaned `<content:encoded>` body, or the description when absent
    pub content: String,
    pub image: Option<String>,
}

/// A YouTube upload from an Atom `<entry>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// YouTube video id, the natural key
    pub id: String,
    pub title: String,
    pub published: String,
    pub thumbnail: Option<String>,
    pub description: String,
    /// Watch page built from the id
    pub link: String,
}

/// A podcast episode from an RSS `<item>` with an audio enclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastEpisode {
    pub title: String,
    pub slug: String,
    /// Natural key; may be empty when the feed omits `<guid>`
    pub guid: String,
    pub link: String,
    pub pub_date: String,
    pub description: String,
    pub audio_url: Option<String>,
}

/// Feed-level fields of a blog channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMetadata {
    pub blog_title: String,
    pub blog_url: String,
    pub last_build_date: String,
    pub blog_description: String,
}

/// Cached payload for a blog feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogFeed {
    pub metadata: ChannelMetadata,
    pub posts: Vec<Post>,
}

/// Cached payload for a video feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFeed {
    pub videos: Vec<Video>,
}

/// Cached payload for a podcast feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastFeed {
    pub episodes: Vec<PodcastEpisode>,
}

/// First post in feed order with the given slug.
pub fn find_post<'a>(posts: &'a [Post], slug: &str) -> Option<&'a Post> {
    posts.iter().find(|p| p.slug == slug)
}

/// First video with the given YouTube id.
pub fn find_video<'a>(videos: &'a [Video], id: &str) -> Option<&'a Video> {
    videos.iter().find(|v| v.id == id)
}

/// First episode whose guid or slug equals `ident`.
///
/// Empty guids never match, so an episode without `<guid>` is only
/// reachable through its slug.
pub fn find_episode<'a>(episodes: &'a [PodcastEpisode], ident: &str) -> Option<&'a PodcastEpisode> {
    episodes
        .iter()
        .find(|e| (!e.guid.is_empty() && e.guid == ident) || e.slug == ident)
}
