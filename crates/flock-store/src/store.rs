//! Composition root: one cache shared by every writer.

use std::sync::Arc;

use flock_api::{Backend, FlockApi, PostDraft};
use tracing::debug;

use crate::{ActionEngine, Entity, EntityCache, EntityId, FeedMerger, StoreError};

/// Owns the single [`EntityCache`] for the session and the components
/// allowed to write to it. Construct once at start-up and share.
#[derive(Clone)]
pub struct Store {
    cache: Arc<EntityCache>,
    api: FlockApi,
    actions: ActionEngine,
    feeds: FeedMerger,
}

impl Store {
    pub fn new(api: FlockApi) -> Self {
        let cache = EntityCache::new();
        Self {
            actions: ActionEngine::new(Arc::clone(&cache), api.clone()),
            feeds: FeedMerger::new(Arc::clone(&cache), api.clone()),
            cache,
            api,
        }
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self::new(FlockApi::new(backend))
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    pub fn actions(&self) -> &ActionEngine {
        &self.actions
    }

    pub fn feeds(&self) -> &FeedMerger {
        &self.feeds
    }

    /// Publish a post and cache the server's copy.
    ///
    /// Not optimistic: the id only exists once the server assigns it. Screens
    /// put the result on top of their lists with
    /// [`FeedView::prepend`](crate::FeedView::prepend).
    pub async fn publish_post(&self, draft: &PostDraft) -> Result<Arc<Entity>, StoreError> {
        let created = self.api.create_post(draft).await?;
        let normalized = Entity::from_wire(created);
        for embedded in normalized.embedded {
            self.cache.insert_if_absent(embedded);
        }
        let entity = self.cache.upsert(normalized.entity);
        debug!(id = %entity.id, "published post");
        Ok(entity)
    }

    /// Delete a post on the server, then drop it from the cache.
    pub async fn delete_post(&self, id: &EntityId) -> Result<(), StoreError> {
        self.api.delete_post(id.as_str()).await?;
        self.cache.remove(id);
        debug!(id = %id, "deleted post");
        Ok(())
    }
}
