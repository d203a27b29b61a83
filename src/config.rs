//! Configuration file parser for the edge feed pipeline (`edgefeed.toml`).
//!
//! The file is optional; without it every feed URL must come from the
//! command line. Keys edgefeed does not read are logged as warnings so a
//! misspelled `blog_feed_url` is noticed instead of silently ignored.
//!
//! The loaded `Config` is immutable and handed to the feed service once at
//! startup; nothing reads configuration ad hoc afterwards.
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::FeedKind;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RSS feed backing the blog API.
    pub blog_feed_url: Option<String>,

    /// YouTube channel Atom feed backing the video API.
    pub video_feed_url: Option<String>,

    /// Podcast RSS feed backing the episodes API.
    pub podcast_feed_url: Option<String>,

    /// Seconds a parsed feed stays in the cache.
    pub cache_ttl_secs: u64,

    /// Upstream request timeout in seconds.
    pub fetch_timeout_secs: u64,

    /// Largest upstream body accepted, in bytes.
    pub max_feed_bytes: usize,

    /// User-Agent sent to feed hosts.
    pub user_agent: String,

    /// SQLite cache file. When unset, an in-memory LRU cache is used.
    pub cache_path: Option<String>,

    /// Number of feeds the in-memory cache holds.
    pub memory_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blog_feed_url: None,
            video_feed_url: None,
            podcast_feed_url: None,
            cache_ttl_secs: 180,
            fetch_timeout_secs: 30,
            max_feed_bytes: 10 * 1024 * 1024,
            user_agent: concat!("edgefeed/", env!("CARGO_PKG_VERSION")).to_string(),
            cache_path: None,
            memory_cache_capacity: 64,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "blog_feed_url",
        "video_feed_url",
        "podcast_feed_url",
        "cache_ttl_secs",
        "fetch_timeout_secs",
        "max_feed_bytes",
        "user_agent",
        "cache_path",
        "memory_cache_capacity",
    ];

    /// Load `edgefeed.toml` from `path`.
    ///
    /// An absent file means "run on defaults"; a file larger than 1 MB is
    /// refused without being read in full.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match read_bounded(path, Self::MAX_FILE_SIZE)? {
            Some(content) => Self::from_toml(&content),
            None => {
                tracing::debug!(path = %path.display(), "No edgefeed config, running on defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from TOML text. Blank text yields the defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(content)?;
        for key in Self::unknown_keys(content) {
            tracing::warn!(key = %key, "Unknown key in edgefeed config, ignoring");
        }
        tracing::info!(
            cache_ttl_secs = config.cache_ttl_secs,
            sqlite_cache = config.cache_path.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Top-level keys of `content` that no `Config` field reads.
    fn unknown_keys(content: &str) -> Vec<String> {
        content
            .parse::<toml::Table>()
            .map(|table| {
                table
                    .keys()
                    .filter(|key| !Self::KNOWN_KEYS.contains(&key.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Configured upstream URL for a feed kind.
    pub fn feed_url(&self, kind: FeedKind) -> Option<&str> {
        match kind {
            FeedKind::Blog => self.blog_feed_url.as_deref(),
            FeedKind::Video => self.video_feed_url.as_deref(),
            FeedKind::Podcast => self.podcast_feed_url.as_deref(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Reads at most `limit` bytes of `path`. `Ok(None)` when the file is absent.
fn read_bounded(path: &Path, limit: u64) -> Result<Option<String>, ConfigError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::Io(e)),
    };

    let mut content = String::new();
    file.take(limit + 1).read_to_string(&mut content)?;
    if content.len() as u64 > limit {
        return Err(ConfigError::TooLarge(format!(
            "{} exceeds {} bytes",
            path.display(),
            limit
        )));
    }
    Ok(Some(content))
}

// ============================================================================
// Tests
// ============================================================================
