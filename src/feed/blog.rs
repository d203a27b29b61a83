use std::sync::LazyLock;

use super::dates::sort_newest_first;
use super::types::{BlogFeed, ChannelMetadata, Post};
use crate::markup::{clean_content, resolve_image, slugify, TagPattern};

static CHANNEL: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("channel"));
static ITEM: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("item"));
static TITLE: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("title"));
static LINK: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("link"));
static PUB_DATE: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("pubDate"));
static DESCRIPTION: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("description"));
static LAST_BUILD_DATE: LazyLock<TagPattern> =
    LazyLock::new(|| TagPattern::new("lastBuildDate"));
static CONTENT_ENCODED: LazyLock<TagPattern> =
    LazyLock::new(|| TagPattern::new("content:encoded"));
static IMAGE: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("image"));
static TEXT_INPUT: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("textInput"));

/// Parses an RSS 2.0 blog feed into channel metadata and posts.
///
/// Extraction is best effort: a missing element yields an empty field, never
/// an error. Posts are sorted newest first by `pubDate`; posts whose date
/// cannot be parsed go last, in feed order.
pub fn parse_blog_feed(xml: &str) -> BlogFeed {
    let metadata = parse_channel_metadata(xml);

    let mut missing_fields = 0usize;
    let mut posts: Vec<Post> = ITEM
        .blocks(xml)
        .into_iter()
        .map(|block| {
            let post = parse_item(block);
            missing_fields += [&post.title, &post.link, &post.pub_date]
                .iter()
                .filter(|f| f.is_empty())
                .count();
            post
        })
        .collect();

    sort_newest_first(&mut posts, |p| p.pub_date.as_str());

    tracing::debug!(
        posts = posts.len(),
        missing_fields = missing_fields,
        "Parsed blog feed"
    );

    BlogFeed { metadata, posts }
}

/// Reads feed-level fields from the `<channel>` element.
///
/// Items, the channel `<image>` and `<textInput>` are removed before
/// matching, since each carries its own `<title>` and `<link>`.
pub fn parse_channel_metadata(xml: &str) -> ChannelMetadata {
    let Some(channel) = CHANNEL.first_inner(xml) else {
        return ChannelMetadata::default();
    };
    let header = ITEM.strip_all(channel);
    let header = IMAGE.strip_all(&header);
    let header = TEXT_INPUT.strip_all(&header);

    ChannelMetadata {
        blog_title: TITLE.extract(&header),
        blog_url: LINK.extract(&header),
        last_build_date: LAST_BUILD_DATE.extract(&header),
        blog_description: DESCRIPTION.extract(&header),
    }
}

fn parse_item(block: &str) -> Post {
    let title = TITLE.extract(block);
    let description = DESCRIPTION.extract(block);
    let body = CONTENT_ENCODED
        .first_inner(block)
        .map(|_| clean_content(&CONTENT_ENCODED.extract(block)));
    let image = resolve_image(block, body.as_deref());
    let content = body.unwrap_or_else(|| description.clone());

    Post {
        slug: slugify(&title),
        link: LINK.extract(block),
        pub_date: PUB_DATE.extract(block),
        title,
        description,
        content,
        image,
    }
}
