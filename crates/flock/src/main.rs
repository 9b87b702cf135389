//! Flock: command-line front end for the feed cache.
//!
//! Subcommands:
//! - `feed`: load a feed and print it
//! - `like` / `unlike` / `repost` / `unrepost` / `accept` / `decline`: act on an item
//! - `post`: publish a post

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use flock_api::{ApiConfig, HttpBackend, PostDraft};
use flock_store::{Action, EntityId, FeedSource, FeedView, LoadOutcome, Store};
use miette::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Parser)]
#[command(name = "flock")]
#[command(about = "Social feed client", long_about = None)]
struct Cli {
    /// REST API base URL
    #[arg(long, env = "FLOCK_API_URL")]
    api_url: String,

    /// Session bearer token
    #[arg(long, env = "FLOCK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a feed and print its items
    Feed {
        /// following, for-you, activity or profile:<user>
        #[arg(default_value = "for-you")]
        source: FeedSource,

        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
    },

    /// Like a post
    Like(Target),
    /// Remove a like
    Unlike(Target),
    /// Repost a post
    Repost(Target),
    /// Undo a repost
    Unrepost(Target),
    /// Accept an event invitation
    Accept(ActivityTarget),
    /// Decline an event invitation
    Decline(ActivityTarget),

    /// Publish a post
    Post {
        text: String,
    },
}

#[derive(clap::Args)]
struct Target {
    /// Post id
    id: String,

    /// Feed to look the post up in
    #[arg(long, default_value = "for-you")]
    feed: FeedSource,
}

#[derive(clap::Args)]
struct ActivityTarget {
    /// Activity id
    id: String,

    /// Feed to look the activity up in
    #[arg(long, default_value = "activity")]
    feed: FeedSource,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "flock=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config =
        ApiConfig::new(&cli.api_url).with_timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(token) = &cli.token {
        config = config.with_token(token);
    }
    let backend = HttpBackend::new(config).map_err(|e| miette::miette!("{}", e))?;
    let store = Store::with_backend(Arc::new(backend));

    match cli.command {
        Commands::Feed { source, pages } => run_feed(&store, source, pages).await,
        Commands::Like(t) => run_action(&store, t.id, t.feed, Action::Like).await,
        Commands::Unlike(t) => run_action(&store, t.id, t.feed, Action::Unlike).await,
        Commands::Repost(t) => run_action(&store, t.id, t.feed, Action::Repost).await,
        Commands::Unrepost(t) => run_action(&store, t.id, t.feed, Action::Unrepost).await,
        Commands::Accept(t) => run_action(&store, t.id, t.feed, Action::AcceptInvitation).await,
        Commands::Decline(t) => run_action(&store, t.id, t.feed, Action::DeclineInvitation).await,
        Commands::Post { text } => run_post(&store, text).await,
    }
}

async fn run_feed(store: &Store, source: FeedSource, pages: u32) -> Result<()> {
    let feed = FeedView::for_source(source);

    let mut outcome = store
        .feeds()
        .refresh(&feed)
        .await
        .map_err(|e| miette::miette!("{}", e))?;
    for _ in 1..pages {
        if !matches!(outcome, LoadOutcome::Loaded(_)) {
            break;
        }
        outcome = store
            .feeds()
            .load_more(&feed)
            .await
            .map_err(|e| miette::miette!("{}", e))?;
    }

    if outcome == LoadOutcome::SignedOut {
        return Err(miette::miette!("session expired, log in again"));
    }

    for entity in feed.entities(store.cache()) {
        println!("{}", render::entity_line(&entity, store.cache()));
    }
    info!(feed = %feed.name(), items = feed.len(), has_more = feed.has_more(), "feed loaded");
    Ok(())
}

async fn run_action(store: &Store, id: String, source: FeedSource, action: Action) -> Result<()> {
    let id = EntityId::new(id);
    let feed = FeedView::for_source(source);
    let outcome = store
        .feeds()
        .refresh(&feed)
        .await
        .map_err(|e| miette::miette!("{}", e))?;
    if outcome == LoadOutcome::SignedOut {
        return Err(miette::miette!("session expired, log in again"));
    }

    let before = store
        .cache()
        .get(&id)
        .ok_or_else(|| miette::miette!("{} not found in the {} feed", id, feed.name()))?;
    println!("before: {}", render::counters(&before));

    store
        .actions()
        .perform(&id, action)
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    if let Some(after) = store.cache().get(&id) {
        println!("after:  {}", render::counters(&after));
    }
    Ok(())
}

async fn run_post(store: &Store, text: String) -> Result<()> {
    let post = store
        .publish_post(&PostDraft::text(text))
        .await
        .map_err(|e| miette::miette!("{}", e))?;
    println!("published {}", post.id);
    Ok(())
}
