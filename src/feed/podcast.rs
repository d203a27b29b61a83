use std::sync::LazyLock;

use super::types::PodcastEpisode;
use crate::markup::{attr_value, slugify, TagPattern};

static ITEM: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("item"));
static TITLE: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("title"));
static LINK: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("link"));
static PUB_DATE: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("pubDate"));
static DESCRIPTION: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("description"));
static GUID: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("guid"));
static ENCLOSURE: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("enclosure"));

/// Parses a podcast RSS feed into episodes, in feed order.
///
/// Text fields are only trimmed and CDATA-unwrapped; entities stay encoded,
/// unlike the blog pipeline. The first `<enclosure url>` is taken as the
/// audio URL whatever its type.
pub fn parse_podcast_feed(xml: &str) -> Vec<PodcastEpisode> {
    let episodes: Vec<PodcastEpisode> = ITEM.blocks(xml).into_iter().map(parse_item).collect();

    let missing_guids = episodes.iter().filter(|e| e.guid.is_empty()).count();
    tracing::debug!(
        episodes = episodes.len(),
        missing_guids = missing_guids,
        "Parsed podcast feed"
    );

    episodes
}

fn parse_item(block: &str) -> PodcastEpisode {
    let title = TITLE.extract_raw(block);
    let audio_url = ENCLOSURE
        .opening_tags(block)
        .first()
        .and_then(|tag| attr_value(*tag, "url"))
        .map(str::to_string);

    PodcastEpisode {
        slug: slugify(&title),
        guid: GUID.extract_raw(block),
        link: LINK.extract_raw(block),
        pub_date: PUB_DATE.extract_raw(block),
        description: DESCRIPTION.extract_raw(block),
        title,
        audio_url,
    }
}
