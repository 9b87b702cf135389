//! Per-screen feed state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use flock_api::FeedSource;
use indexmap::IndexSet;

use crate::{Entity, EntityCache, EntityId};

/// Loading phase of a feed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Loading,
}

/// How a page is merged into a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Replace the list (pull-to-refresh) instead of appending (load-more).
    pub reset: bool,
}

impl MergeOptions {
    pub fn reset() -> Self {
        Self { reset: true }
    }

    pub fn append() -> Self {
        Self { reset: false }
    }
}

/// What a merge did to the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    /// Items in the page.
    pub received: usize,
    /// Ids that were not already in the list.
    pub added: usize,
    /// List length after the merge.
    pub total: usize,
    /// Page to request next.
    pub next_page: u32,
    pub has_more: bool,
}

#[derive(Debug)]
struct FeedState {
    ids: IndexSet<EntityId>,
    /// Next page to request (1-based).
    page: u32,
    has_more: bool,
    phase: FeedPhase,
    error: Option<String>,
}

/// An ordered, duplicate-free list of entity ids for one screen.
///
/// Owned by the screen that created it; dropping it discards only the id
/// list, never the cached entities.
#[derive(Debug)]
pub struct FeedView {
    name: String,
    source: FeedSource,
    state: Mutex<FeedState>,
}

impl FeedView {
    pub fn new(name: impl Into<String>, source: FeedSource) -> Self {
        Self {
            name: name.into(),
            source,
            state: Mutex::new(FeedState {
                ids: IndexSet::new(),
                page: 1,
                has_more: true,
                phase: FeedPhase::Idle,
                error: None,
            }),
        }
    }

    /// A view named after its source.
    pub fn for_source(source: FeedSource) -> Self {
        Self::new(source.to_string(), source)
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        // State is only touched synchronously, so a poisoned lock still holds
        // a coherent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    /// Ids in display order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.state().ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().ids.is_empty()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.state().ids.contains(id)
    }

    /// Next page to request.
    pub fn page(&self) -> u32 {
        self.state().page
    }

    pub fn has_more(&self) -> bool {
        self.state().has_more
    }

    pub fn phase(&self) -> FeedPhase {
        self.state().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == FeedPhase::Loading
    }

    /// Error from the last failed load, for a retry prompt.
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Resolve the ids against the cache, skipping any no longer cached.
    pub fn entities(&self, cache: &EntityCache) -> Vec<Arc<Entity>> {
        let ids = self.ids();
        ids.iter().filter_map(|id| cache.get(id)).collect()
    }

    /// Put `id` at the top of the list, e.g. a post just published from the
    /// composer. Returns `false` if it was already listed.
    pub fn prepend(&self, id: EntityId) -> bool {
        let mut state = self.state();
        if state.ids.contains(&id) {
            return false;
        }
        state.ids.shift_insert(0, id);
        true
    }

    /// Drop `id` from the list. Returns whether it was listed.
    pub fn forget(&self, id: &EntityId) -> bool {
        self.state().ids.shift_remove(id)
    }

    /// Enter `Loading`, or `None` if a load is already running.
    pub(crate) fn begin_load(&self) -> Option<LoadGuard<'_>> {
        let mut state = self.state();
        if state.phase == FeedPhase::Loading {
            return None;
        }
        state.phase = FeedPhase::Loading;
        state.error = None;
        Some(LoadGuard { feed: self })
    }

    /// Merge a page of ids. Callers must have written the entities already.
    pub(crate) fn apply_page(&self, ids: Vec<EntityId>, has_more: bool, reset: bool) -> MergeSummary {
        let mut state = self.state();
        let received = ids.len();

        let added = if reset {
            state.ids = ids.into_iter().collect();
            state.page = 2;
            state.ids.len()
        } else {
            let before = state.ids.len();
            state.ids.extend(ids);
            state.page += 1;
            state.ids.len() - before
        };
        state.has_more = has_more;
        state.error = None;

        MergeSummary {
            received,
            added,
            total: state.ids.len(),
            next_page: state.page,
            has_more,
        }
    }

    /// Session ended: the list is no longer the user's feed.
    pub(crate) fn sign_out(&self) {
        let mut state = self.state();
        state.ids.clear();
        state.page = 1;
        state.has_more = false;
        state.error = None;
    }

    pub(crate) fn set_error(&self, message: String) {
        self.state().error = Some(message);
    }
}

/// Returns the feed to `Idle` when dropped.
pub(crate) struct LoadGuard<'a> {
    feed: &'a FeedView,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.feed.state().phase = FeedPhase::Idle;
    }
}
