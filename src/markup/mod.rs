//! Text-level helpers for feed markup.
//!
//! - **Entities**: decode the handful of HTML references feeds actually use
//! - **Tags**: pattern-based element and attribute extraction
//! - **Slugs**: title to URL slug
//! - **Images**: pick a representative image for an item
//! - **Cleaning**: drop expand-image links and inline styles from bodies

mod cleaner;
mod entities;
mod images;
mod slug;
mod tags;

pub use cleaner::clean_content;
pub use entities::decode_entities;
pub use images::{enclosure_image, first_img_src, resolve_image};
pub use slug::slugify;
pub use tags::{
    attr_value, extract_blocks, extract_tag, extract_tag_raw, strip_cdata_sections, unwrap_cdata,
    TagPattern,
};
