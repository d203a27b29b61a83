/// Derives a URL slug from a title.
///
/// Lowercases the text, collapses every run of characters outside `[a-z0-9]`
/// into a single `-`, and drops leading and trailing hyphens. Non-ASCII
/// letters count as separators. Identical titles produce identical slugs;
/// resolving collisions is up to the caller.
///
/// # Examples
///
/// ```
/// use edgefeed::markup::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  --Test--  "), "test");
/// assert_eq!(slugify("!!!"), "");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
