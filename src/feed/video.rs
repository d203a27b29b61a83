use std::sync::LazyLock;

use super::dates::sort_newest_first;
use super::types::Video;
use crate::markup::{attr_value, TagPattern};

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

static ENTRY: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("entry"));
static TITLE: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("title"));
static PUBLISHED: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("published"));
static VIDEO_ID: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("yt:videoId"));
static MEDIA_GROUP: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("media:group"));
static MEDIA_THUMBNAIL: LazyLock<TagPattern> =
    LazyLock::new(|| TagPattern::new("media:thumbnail"));
static MEDIA_DESCRIPTION: LazyLock<TagPattern> =
    LazyLock::new(|| TagPattern::new("media:description"));

/// Builds the public watch page for a YouTube video id.
pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL_PREFIX}{video_id}")
}

/// Parses a YouTube channel Atom feed into videos, newest first.
///
/// Entries without a `<yt:videoId>` are not videos and are dropped. The
/// thumbnail and description come from the optional `<media:group>`.
pub fn parse_video_feed(xml: &str) -> Vec<Video> {
    let entries = ENTRY.blocks(xml);
    let total = entries.len();

    let mut videos: Vec<Video> = entries.into_iter().filter_map(parse_entry).collect();
    sort_newest_first(&mut videos, |v| v.published.as_str());

    let dropped = total - videos.len();
    if dropped > 0 {
        tracing::debug!(dropped = dropped, "Entries without a video id skipped");
    }
    tracing::debug!(videos = videos.len(), "Parsed video feed");

    videos
}

fn parse_entry(block: &str) -> Option<Video> {
    let id = VIDEO_ID.extract(block);
    if id.is_empty() {
        return None;
    }

    let group = MEDIA_GROUP.first_inner(block).unwrap_or_default();
    let thumbnail = MEDIA_THUMBNAIL
        .opening_tags(group)
        .into_iter()
        .find_map(|tag| attr_value(tag, "url"))
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    Some(Video {
        link: watch_url(&id),
        title: TITLE.extract(block),
        published: PUBLISHED.extract(block),
        description: MEDIA_DESCRIPTION.extract(group),
        thumbnail,
        id,
    })
}
