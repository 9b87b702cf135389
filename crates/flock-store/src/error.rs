//! Error types for the store.

use flock_api::{ActionKind, ApiError};
use thiserror::Error;

use crate::EntityId;

/// Errors from [`ActionEngine::perform`](crate::ActionEngine::perform).
///
/// By the time any of these is returned the cache is consistent again.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The entity is not cached, so there is nothing to update optimistically.
    #[error("entity {id} is not cached")]
    UnknownEntity { id: EntityId },

    /// The action makes no sense for this entity (e.g. accepting a post).
    #[error("{action} does not apply to entity {id}")]
    NotApplicable { id: EntityId, action: &'static str },

    /// The server rejected the action; the optimistic update was rolled back.
    #[error("{action} on {id} failed: {source}")]
    Rejected {
        id: EntityId,
        action: &'static str,
        kind: ActionKind,
        #[source]
        source: ApiError,
    },
}

impl ActionError {
    /// Whether the failure came from an expired session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ActionError::Rejected { source, .. } if source.is_unauthorized())
    }
}

/// Errors from feed loading.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Fetching a page failed; the feed keeps its previous ids.
    #[error("failed to load feed {feed}: {source}")]
    Fetch {
        feed: String,
        #[source]
        source: ApiError,
    },
}

/// Errors from composer and deletion flows.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),
}
