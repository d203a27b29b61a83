use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use edgefeed::cache::{CacheStore, MemoryCache, SqliteCache};
use edgefeed::config::Config;
use edgefeed::feed::{
    find_episode, find_post, find_video, FeedKind, FeedService, PodcastFeed, VideoFeed,
};
use edgefeed::fetch::HttpFeedSource;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Kind {
    Blog,
    Videos,
    Podcasts,
}

impl From<Kind> for FeedKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Blog => FeedKind::Blog,
            Kind::Videos => FeedKind::Video,
            Kind::Podcasts => FeedKind::Podcast,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "edgefeed",
    about = "Fetch, normalize and cache blog, video and podcast feeds"
)]
struct Args {
    /// Config file (defaults to ./edgefeed.toml)
    #[arg(long, value_name = "FILE", default_value = "edgefeed.toml")]
    config: PathBuf,

    /// Bypass the cache and fetch the feed again
    #[arg(long)]
    refresh: bool,

    /// Print only the record with this slug, video id or episode guid
    #[arg(long, value_name = "IDENT")]
    find: Option<String>,

    /// Which feed to read
    #[arg(value_enum)]
    kind: Kind,

    /// Feed URL, overriding the one in the config file
    url: Option<String>,
}

async fn build_service(config: &Config) -> Result<FeedService> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()
        .context("Failed to build HTTP client")?;
    let source = HttpFeedSource::new(client)
        .with_timeout(config.fetch_timeout())
        .with_max_size(config.max_feed_bytes);

    let cache: Arc<dyn CacheStore> = match &config.cache_path {
        Some(path) => {
            let cache = SqliteCache::open(path)
                .await
                .with_context(|| format!("Failed to open feed cache at '{}'", path))?;
            if let Err(e) = cache.evict_expired().await {
                tracing::warn!(error = %e, "Failed to evict expired cache rows");
            }
            Arc::new(cache)
        }
        None => Arc::new(MemoryCache::new(config.memory_cache_capacity)),
    };

    Ok(FeedService::new(cache, Arc::new(source)).with_ttl(config.cache_ttl()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn print_found<T: Serialize>(found: Option<&T>, ident: &str) -> Result<()> {
    match found {
        Some(record) => print_json(record),
        None => anyhow::bail!("No record matches '{}'", ident),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; RUST_LOG controls verbosity, output goes to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from '{}'", args.config.display()))?;

    let kind = FeedKind::from(args.kind);
    let url = match args.url.as_deref().or_else(|| config.feed_url(kind)) {
        Some(url) => url.to_string(),
        None => anyhow::bail!(
            "No {} feed URL given and none configured in '{}'",
            kind,
            args.config.display()
        ),
    };

    let service = build_service(&config).await?;

    match args.kind {
        Kind::Blog => {
            let blog = service
                .get_posts(&url, args.refresh)
                .await
                .with_context(|| format!("Failed to load blog feed '{}'", url))?;
            match &args.find {
                Some(slug) => print_found(find_post(&blog.posts, slug), slug)?,
                None => print_json(&blog)?,
            }
        }
        Kind::Videos => {
            let videos = service.get_videos(&url, args.refresh).await;
            match &args.find {
                Some(id) => print_found(find_video(&videos, id), id)?,
                None => print_json(&VideoFeed { videos })?,
            }
        }
        Kind::Podcasts => {
            let episodes = service
                .get_podcasts(&url, args.refresh)
                .await
                .with_context(|| format!("Failed to load podcast feed '{}'", url))?;
            match &args.find {
                Some(ident) => print_found(find_episode(&episodes, ident), ident)?,
                None => print_json(&PodcastFeed { episodes })?,
            }
        }
    }

    Ok(())
}
