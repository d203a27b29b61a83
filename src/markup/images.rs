use std::sync::LazyLock;

use super::tags::{attr_value, strip_cdata_sections, TagPattern};

static ENCLOSURE: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("enclosure"));
static IMG: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("img"));

/// URL of the first `<enclosure>` in an item block whose `type` is an image.
///
/// CDATA sections are ignored, so an enclosure tag quoted inside an escaped
/// description never counts. Audio and other enclosure types are skipped.
pub fn enclosure_image(block: &str) -> Option<String> {
    let visible = strip_cdata_sections(block);

    ENCLOSURE
        .opening_tags(&visible)
        .into_iter()
        .filter(|tag| {
            attr_value(tag, "type")
                .is_some_and(|mime| mime.trim().to_ascii_lowercase().starts_with("image/"))
        })
        .find_map(|tag| non_empty(attr_value(tag, "url")))
}

/// `src` of the first `<img>` in an HTML body.
///
/// The body must already be CDATA-unwrapped and entity-decoded.
pub fn first_img_src(html: &str) -> Option<String> {
    IMG.opening_tags(html)
        .into_iter()
        .find_map(|tag| non_empty(attr_value(tag, "src")))
}

/// Picks the representative image for an item: an image enclosure first,
/// then the first `<img>` of the body.
pub fn resolve_image(block: &str, body: Option<&str>) -> Option<String> {
    enclosure_image(block).or_else(|| body.and_then(first_img_src))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
