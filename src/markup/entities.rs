use std::borrow::Cow;

/// Named references the decoder understands. Everything else named is left as-is.
const NAMED_ENTITIES: &[(&str, char)] = &[
    ("nbsp", ' '),
    ("amp", '&'),
    ("quot", '"'),
    ("lt", '<'),
    ("gt", '>'),
];

/// Longest reference body we bother looking at (`#x10FFFF` is 8 bytes).
const MAX_REFERENCE_LEN: usize = 10;

/// Decodes HTML character references in feed text.
///
/// Recognizes `&nbsp;`, `&amp;`, `&quot;`, `&lt;`, `&gt;` and any decimal
/// (`&#39;`) or hex (`&#x27;`) reference naming a valid Unicode scalar value.
/// Unknown named entities such as `&eacute;` and out-of-range numeric
/// references are kept verbatim.
///
/// The input is scanned once from left to right, so decoded output is never
/// decoded again: `&amp;lt;` becomes `&lt;`, not `<`.
///
/// Returns `Cow::Borrowed` when the input contains no `&` at all.
///
/// # Examples
///
/// ```
/// use edgefeed::markup::decode_entities;
///
/// assert_eq!(decode_entities("A &amp; B"), "A & B");
/// assert_eq!(decode_entities("&#39;s"), "'s");
/// assert_eq!(decode_entities("&unknown;"), "&unknown;");
/// ```
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        match decode_reference(after) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// Decodes the reference starting right after an `&`.
///
/// Returns the decoded character and the number of bytes consumed, including
/// the terminating `;`.
fn decode_reference(after_amp: &str) -> Option<(char, usize)> {
    let semi = after_amp
        .char_indices()
        .take(MAX_REFERENCE_LEN + 1)
        .find(|&(_, c)| c == ';')
        .map(|(i, _)| i)?;
    let body = &after_amp[..semi];

    let ch = if let Some(numeric) = body.strip_prefix('#') {
        decode_numeric(numeric)?
    } else {
        NAMED_ENTITIES
            .iter()
            .find(|(name, _)| *name == body)
            .map(|&(_, c)| c)?
    };

    Some((ch, semi + 1))
}

fn decode_numeric(digits: &str) -> Option<char> {
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse::<u32>().ok()?
        }
        None => return None,
    };
    char::from_u32(code)
}
