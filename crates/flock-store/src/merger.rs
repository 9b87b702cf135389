//! Reconciles feed pages into the cache and into feed views.

use std::sync::Arc;

use flock_api::{ApiError, FeedPage, FlockApi};
use tracing::{debug, info, warn};

use crate::{Entity, EntityCache, EntityId, FeedError, FeedView, MergeOptions, MergeSummary};

/// Result of [`FeedMerger::merge_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged(MergeSummary),
    /// The feed was busy loading; nothing was written.
    Skipped,
}

/// Result of [`FeedMerger::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(MergeSummary),
    /// A load was already running for this feed.
    Skipped,
    /// Load-more requested but the server reported no further pages.
    Exhausted,
    /// The backend rejected the session; the feed was cleared.
    SignedOut,
}

/// Writes fetched pages into the shared cache and a screen's feed view.
#[derive(Clone)]
pub struct FeedMerger {
    cache: Arc<EntityCache>,
    api: FlockApi,
}

impl FeedMerger {
    pub fn new(cache: Arc<EntityCache>, api: FlockApi) -> Self {
        Self { cache, api }
    }

    /// Merge an already-fetched page into `feed`.
    ///
    /// Rejected while the feed is loading, so pushed data cannot interleave
    /// with a fetch in progress.
    pub fn merge_page(&self, feed: &FeedView, page: FeedPage, options: MergeOptions) -> MergeOutcome {
        let Some(_guard) = feed.begin_load() else {
            debug!(feed = %feed.name(), "feed busy, merge skipped");
            return MergeOutcome::Skipped;
        };
        MergeOutcome::Merged(self.apply(feed, page, options))
    }

    /// Fetch the next page (or page 1 when resetting) and merge it.
    pub async fn load(&self, feed: &FeedView, options: MergeOptions) -> Result<LoadOutcome, FeedError> {
        if !options.reset && !feed.has_more() {
            return Ok(LoadOutcome::Exhausted);
        }
        let Some(_guard) = feed.begin_load() else {
            debug!(feed = %feed.name(), "feed already loading, skipping");
            return Ok(LoadOutcome::Skipped);
        };

        let page_number = if options.reset { 1 } else { feed.page() };
        match self.api.fetch_feed(feed.source(), page_number).await {
            Ok(page) => Ok(LoadOutcome::Loaded(self.apply(feed, page, options))),
            Err(ApiError::Unauthorized) => {
                info!(feed = %feed.name(), "session rejected, clearing feed");
                feed.sign_out();
                Ok(LoadOutcome::SignedOut)
            }
            Err(source) => {
                warn!(feed = %feed.name(), page = page_number, error = %source, "feed load failed");
                feed.set_error(source.to_string());
                Err(FeedError::Fetch {
                    feed: feed.name().to_string(),
                    source,
                })
            }
        }
    }

    /// Pull-to-refresh.
    pub async fn refresh(&self, feed: &FeedView) -> Result<LoadOutcome, FeedError> {
        self.load(feed, MergeOptions::reset()).await
    }

    /// Load the next page.
    pub async fn load_more(&self, feed: &FeedView) -> Result<LoadOutcome, FeedError> {
        self.load(feed, MergeOptions::append()).await
    }

    fn apply(&self, feed: &FeedView, page: FeedPage, options: MergeOptions) -> MergeSummary {
        let mut ids = Vec::with_capacity(page.items.len());
        for item in page.items {
            let normalized = Entity::from_wire(item);
            // Nested posts are summaries: they seed ids not cached yet but
            // never replace a full record another screen is showing.
            for embedded in normalized.embedded {
                self.cache.insert_if_absent(embedded);
            }
            let id: EntityId = normalized.entity.id.clone();
            self.cache.upsert(normalized.entity);
            ids.push(id);
        }

        let summary = feed.apply_page(ids, page.has_more, options.reset);
        debug!(
            feed = %feed.name(),
            reset = options.reset,
            received = summary.received,
            added = summary.added,
            total = summary.total,
            "merged feed page"
        );
        summary
    }
}
