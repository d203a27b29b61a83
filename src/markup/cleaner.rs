use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Anchors wrapping a "click to expand" copy of an inline image, subtree included.
static EXPAND_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<a\s[^>]*\bclass\s*=\s*["'][^"']*\bimage-link-expand\b[^"']*["'][^>]*>.*?</a\s*>"#,
    )
    .expect("expand-link pattern is valid")
});

static INLINE_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+style\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("style pattern is valid")
});

/// Strips noisy markup from a full article body.
///
/// Expand-image anchors go first, then every inline `style` attribute. The
/// anchor pattern can rely on intact attributes because styles are still
/// present when it runs. Only meant for `<content:encoded>` bodies, not for
/// descriptions.
pub fn clean_content(html: &str) -> String {
    let without_links = EXPAND_LINK.replace_all(html, "");
    match INLINE_STYLE.replace_all(&without_links, "") {
        Cow::Borrowed(_) => without_links.into_owned(),
        Cow::Owned(cleaned) => cleaned,
    }
}
