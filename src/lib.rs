//! Feed ingestion and normalization for an edge router.
//!
//! Upstream RSS, Atom and podcast feeds are fetched, parsed into typed
//! records, cached as JSON by feed URL, and handed to the routing layer.
//!
//! - [`markup`] - entity decoding, tag extraction, slugs, images, cleaning
//! - [`feed`] - feed parsers and the cache-fronted [`feed::FeedService`]
//! - [`fetch`] - upstream retrieval behind the [`fetch::FeedSource`] trait
//! - [`cache`] - [`cache::CacheStore`] with in-memory and SQLite backends
//! - [`config`] - TOML configuration

pub mod cache;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod markup;
