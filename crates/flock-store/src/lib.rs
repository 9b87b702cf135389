//! Client-side entity cache and optimistic-mutation engine for Flock.
//!
//! Every feed screen reads posts and activities from one shared
//! [`EntityCache`]. Only two components write to it:
//!
//! - **ActionEngine**: optimistic like/repost/accept/comment with exact rollback
//! - **FeedMerger**: paginated feed pages, replace or append, deduplicated
//!
//! [`Store`] builds the cache once and hands it to both.

mod actions;
mod cache;
mod entity;
mod error;
mod feed;
mod merger;
mod store;
pub mod transform;

pub use actions::{ActionEngine, ActionOutcome};
pub use cache::{CacheUpdate, EntityCache, EntitySubscription};
pub use entity::{
    ActivityType, Author, Counters, Entity, EntityId, EntityKind, EntityPatch, Invitation,
    InvitationStatus, MediaKind, MediaRef, Normalized,
};
pub use error::{ActionError, FeedError, StoreError};
pub use feed::{FeedPhase, FeedView, MergeOptions, MergeSummary};
pub use merger::{FeedMerger, LoadOutcome, MergeOutcome};
pub use store::Store;

pub use flock_api::{Action, ActionKind, FeedSource};
