//! Pattern-based tag scanning for loosely structured feed XML.
//!
//! This is not an XML parser. It finds element boundaries by ASCII
//! case-insensitive substring search, which is enough for the flat,
//! mostly well-formed documents feed publishers emit. Nested elements with
//! the same name, or a closing tag hidden inside CDATA, produce wrong
//! boundaries. Callers only go through [`TagPattern`], [`extract_tag`] and
//! [`attr_value`], so a streaming parser can replace this module later.

use std::borrow::Cow;

use super::entities::decode_entities;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Byte offsets of one matched element.
#[derive(Debug, Clone, Copy)]
struct Span {
    inner_start: usize,
    inner_end: usize,
    outer_end: usize,
}

/// A reusable matcher for one element name, e.g. `title` or `media:group`.
#[derive(Debug, Clone)]
pub struct TagPattern {
    open: String,
    close: String,
}

impl TagPattern {
    pub fn new(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        Self {
            open: format!("<{name}"),
            close: format!("</{name}"),
        }
    }

    /// Raw inner text of the first element, untrimmed and undecoded.
    pub fn first_inner<'a>(&self, fragment: &'a str) -> Option<&'a str> {
        let lower = ascii_lowercase(fragment);
        self.find_from(&lower, 0)
            .map(|span| &fragment[span.inner_start..span.inner_end])
    }

    /// Inner text of every element in document order.
    ///
    /// Matching is non-greedy: each element ends at the first closing tag
    /// after its opening tag, and scanning resumes after that closing tag.
    pub fn blocks<'a>(&self, document: &'a str) -> Vec<&'a str> {
        let lower = ascii_lowercase(document);
        let mut blocks = Vec::new();
        let mut from = 0;

        while let Some(span) = self.find_from(&lower, from) {
            blocks.push(&document[span.inner_start..span.inner_end]);
            from = span.outer_end;
        }

        blocks
    }

    /// Removes every element (tags and content) from `document`.
    pub fn strip_all(&self, document: &str) -> String {
        let lower = ascii_lowercase(document);
        let mut out = String::with_capacity(document.len());
        let mut from = 0;

        while let Some(span) = self.find_from(&lower, from) {
            let outer_start = lower[..span.inner_start]
                .rfind(self.open.as_str())
                .unwrap_or(span.inner_start);
            out.push_str(&document[from..outer_start]);
            from = span.outer_end;
        }

        out.push_str(&document[from..]);
        out
    }

    /// Trimmed, CDATA-unwrapped text of the first element. No entity decoding.
    pub fn extract_raw(&self, fragment: &str) -> String {
        self.first_inner(fragment)
            .map(|inner| unwrap_cdata(inner).to_string())
            .unwrap_or_default()
    }

    /// Trimmed, CDATA-unwrapped, entity-decoded text of the first element.
    ///
    /// Returns an empty string when the element is absent.
    pub fn extract(&self, fragment: &str) -> String {
        self.first_inner(fragment)
            .map(|inner| decode_entities(unwrap_cdata(inner)).into_owned())
            .unwrap_or_default()
    }

    /// Every opening tag of this name, including self-closing ones, e.g.
    /// `<enclosure url="..." type="image/png" />`.
    pub fn opening_tags<'a>(&self, fragment: &'a str) -> Vec<&'a str> {
        let lower = ascii_lowercase(fragment);
        let mut tags = Vec::new();
        let mut from = 0;

        while let Some(start) = self.find_open(&lower, from) {
            let Some(gt) = lower[start..].find('>') else {
                break;
            };
            let end = start + gt + 1;
            tags.push(&fragment[start..end]);
            from = end;
        }

        tags
    }

    /// Position of the next `<name` that is a real opening tag for this name
    /// (followed by whitespace, `/` or `>`), at or after `from`.
    fn find_open(&self, lower: &str, from: usize) -> Option<usize> {
        let mut from = from;
        while let Some(pos) = lower.get(from..)?.find(self.open.as_str()) {
            let start = from + pos;
            let after = start + self.open.len();
            match lower.as_bytes().get(after) {
                Some(b'>') | Some(b'/') => return Some(start),
                Some(b) if b.is_ascii_whitespace() => return Some(start),
                _ => from = after,
            }
        }
        None
    }

    fn find_from(&self, lower: &str, from: usize) -> Option<Span> {
        let mut from = from;

        loop {
            let start = self.find_open(lower, from)?;
            let gt = start + lower[start..].find('>')?;

            // Self-closing elements have no content to extract
            if lower.as_bytes()[gt - 1] == b'/' {
                from = gt + 1;
                continue;
            }

            let inner_start = gt + 1;
            let (inner_end, outer_end) = self.find_close(lower, inner_start)?;
            return Some(Span {
                inner_start,
                inner_end,
                outer_end,
            });
        }
    }

    fn find_close(&self, lower: &str, from: usize) -> Option<(usize, usize)> {
        let mut from = from;
        while let Some(pos) = lower.get(from..)?.find(self.close.as_str()) {
            let start = from + pos;
            let after = start + self.close.len();
            let rest = &lower[after..];
            let trimmed = rest.trim_start();
            if trimmed.starts_with('>') {
                let outer_end = after + (rest.len() - trimmed.len()) + 1;
                return Some((start, outer_end));
            }
            from = after;
        }
        None
    }
}

/// Extracts the text of the first `<name>` element in `fragment`.
///
/// The content is trimmed, unwrapped when it starts with a CDATA marker and
/// then entity-decoded. Only the first occurrence is considered. Returns an
/// empty string when the element is absent.
///
/// # Examples
///
/// ```
/// use edgefeed::markup::extract_tag;
///
/// let xml = "<item><title><![CDATA[Caf&eacute; &amp; Co]]></title></item>";
/// assert_eq!(extract_tag(xml, "title"), "Caf&eacute; & Co");
/// assert_eq!(extract_tag(xml, "link"), "");
/// ```
pub fn extract_tag(fragment: &str, name: &str) -> String {
    TagPattern::new(name).extract(fragment)
}

/// Like [`extract_tag`] but without entity decoding.
pub fn extract_tag_raw(fragment: &str, name: &str) -> String {
    TagPattern::new(name).extract_raw(fragment)
}

/// Inner text of every `<name>` element in `document`, in order.
pub fn extract_blocks<'a>(document: &'a str, name: &str) -> Vec<&'a str> {
    TagPattern::new(name).blocks(document)
}

/// Trims `text` and strips a surrounding CDATA section if it starts with one.
pub fn unwrap_cdata(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix(CDATA_OPEN) {
        Some(inner) => inner.strip_suffix(CDATA_CLOSE).unwrap_or(inner).trim(),
        None => trimmed,
    }
}

/// Removes every CDATA section (markers and content) from `text`.
///
/// Used before scanning a block for real tags, so markup escaped inside CDATA
/// is never mistaken for document structure.
pub fn strip_cdata_sections(text: &str) -> Cow<'_, str> {
    if !text.contains(CDATA_OPEN) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(CDATA_OPEN) {
        out.push_str(&rest[..start]);
        let body = &rest[start + CDATA_OPEN.len()..];
        match body.find(CDATA_CLOSE) {
            Some(end) => rest = &body[end + CDATA_CLOSE.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Extracts an attribute value from a single opening tag (case-preserving).
///
/// The attribute name is matched case-insensitively and must be preceded by
/// whitespace, so `url` never matches inside `data-url`. Quoted and unquoted
/// values are supported. Values are returned as written, without decoding.
pub fn attr_value<'a>(tag: &'a str, attr: &str) -> Option<&'a str> {
    let lower = ascii_lowercase(tag);
    let needle = attr.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut from = 0;

    while let Some(pos) = lower[from..].find(needle.as_str()) {
        let start = from + pos;
        let end = start + needle.len();
        from = end;

        if start == 0 || !bytes[start - 1].is_ascii_whitespace() {
            continue;
        }

        let mut i = end;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        return match bytes.get(i) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let value_start = i + 1;
                let len = tag[value_start..].find(quote as char)?;
                Some(&tag[value_start..value_start + len])
            }
            Some(_) => {
                let len = tag[i..]
                    .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                    .unwrap_or(tag.len() - i);
                Some(&tag[i..i + len])
            }
            None => None,
        };
    }

    None
}

/// ASCII lowercasing keeps byte offsets identical to the input.
fn ascii_lowercase(s: &str) -> Cow<'_, str> {
    if s.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(s.to_ascii_lowercase())
    } else {
        Cow::Borrowed(s)
    }
}
