//! In-memory cache of posts and activities.
//!
//! One record per id, stored as `Arc<Entity>` so every reader of an id holds
//! the same object after a write. Records are replaced, never mutated in
//! place: a reader holding an older `Arc` keeps a consistent snapshot and
//! picks up the new one through its subscription.

use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tokio::sync::{broadcast, watch};
use tracing::{trace, warn};

use crate::{Entity, EntityId, EntityPatch};

/// Broadcast channel capacity for whole-cache updates.
const BROADCAST_CHANNEL_CAPACITY: usize = 1024;

/// Update event for whole-cache subscribers.
#[derive(Debug, Clone)]
pub enum CacheUpdate {
    /// An entity was inserted for the first time.
    EntityCreated { entity: Arc<Entity> },
    /// An entity was fully replaced.
    EntityReplaced { entity: Arc<Entity> },
    /// Some fields of an entity were patched.
    EntityPatched { entity: Arc<Entity> },
    /// An entity was removed.
    EntityRemoved { id: EntityId },
}

type Watcher = watch::Sender<Option<Arc<Entity>>>;
type Watchers = DashMap<EntityId, Arc<Watcher>>;

/// Subscription to a single entity id.
///
/// Always yields the latest committed record; intermediate values may be
/// skipped if several writes land before the subscriber looks. Dropping the
/// last subscription to an id releases its watcher.
pub struct EntitySubscription {
    id: EntityId,
    rx: watch::Receiver<Option<Arc<Entity>>>,
    sender: Weak<Watcher>,
    watchers: Weak<Watchers>,
}

impl EntitySubscription {
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// The current record, or `None` if the id is not cached.
    pub fn current(&self) -> Option<Arc<Entity>> {
        self.rx.borrow().clone()
    }

    /// Wait for the next write to this id and return the new record.
    ///
    /// Returns `None` once the cache itself has been dropped.
    pub async fn changed(&mut self) -> Option<Option<Arc<Entity>>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

impl Drop for EntitySubscription {
    fn drop(&mut self) {
        let Some(watchers) = self.watchers.upgrade() else {
            return;
        };
        // Our own receiver is still alive here, so "last" means a count of 1.
        // The pointer check keeps us off a newer watcher for the same id.
        let sender = self.sender.as_ptr();
        if watchers
            .remove_if(&self.id, |_, tx| {
                Arc::as_ptr(tx) == sender && tx.receiver_count() <= 1
            })
            .is_some()
        {
            trace!(id = %self.id, "cache: watcher released");
        }
    }
}

/// Process-wide entity cache.
///
/// Every operation is synchronous and never awaits while holding a map
/// shard, so writes from different tasks apply in call order.
pub struct EntityCache {
    records: DashMap<EntityId, Arc<Entity>>,
    /// Ids of cached posts, for post-rendering components.
    posts: DashSet<EntityId>,
    watchers: Arc<Watchers>,
    updates_tx: broadcast::Sender<CacheUpdate>,
}

impl EntityCache {
    /// Create a new empty cache.
    pub fn new() -> Arc<Self> {
        let (updates_tx, _) = broadcast::channel(BROADCAST_CHANNEL_CAPACITY);
        Arc::new(Self {
            records: DashMap::new(),
            posts: DashSet::new(),
            watchers: Arc::new(DashMap::new()),
            updates_tx,
        })
    }

    /// Get an entity by id.
    pub fn get(&self, id: &EntityId) -> Option<Arc<Entity>> {
        self.records.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Get a post by id through the post index.
    pub fn get_post(&self, id: &EntityId) -> Option<Arc<Entity>> {
        if !self.posts.contains(id) {
            return None;
        }
        self.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.records.contains_key(id)
    }

    /// Ids of every cached post, in no particular order.
    pub fn post_ids(&self) -> Vec<EntityId> {
        self.posts.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert or fully replace the record for `entity.id`.
    ///
    /// Nothing from a previous record survives.
    pub fn upsert(&self, entity: Entity) -> Arc<Entity> {
        let entity = Arc::new(entity);
        let id = entity.id.clone();

        let created = match self.records.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.insert(Arc::clone(&entity));
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&entity));
                true
            }
        };

        if entity.is_post() {
            self.posts.insert(id.clone());
        } else {
            self.posts.remove(&id);
        }

        trace!(id = %id, created, "cache: entity upserted");
        self.notify(&id, Some(Arc::clone(&entity)));
        self.broadcast(if created {
            CacheUpdate::EntityCreated {
                entity: Arc::clone(&entity),
            }
        } else {
            CacheUpdate::EntityReplaced {
                entity: Arc::clone(&entity),
            }
        });
        entity
    }

    /// Insert `entity` only if its id is not cached yet.
    ///
    /// Used for post summaries nested inside other items: a summary carries
    /// fewer fields than the full record and must not replace it. Returns the
    /// new record, or `None` if the id was already cached.
    pub fn insert_if_absent(&self, entity: Entity) -> Option<Arc<Entity>> {
        let entity = Arc::new(entity);
        let id = entity.id.clone();

        match self.records.entry(id.clone()) {
            Entry::Occupied(_) => {
                trace!(id = %id, "cache: summary for cached entity skipped");
                return None;
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&entity));
            }
        }

        if entity.is_post() {
            self.posts.insert(id.clone());
        }

        trace!(id = %id, "cache: entity inserted");
        self.notify(&id, Some(Arc::clone(&entity)));
        self.broadcast(CacheUpdate::EntityCreated {
            entity: Arc::clone(&entity),
        });
        Some(entity)
    }

    /// Shallow-merge `patch` into an existing record.
    ///
    /// Patching an unknown id is a no-op: it logs a warning and returns `None`.
    pub fn patch(&self, id: &EntityId, patch: &EntityPatch) -> Option<Arc<Entity>> {
        let updated = {
            let Some(mut entry) = self.records.get_mut(id) else {
                warn!(id = %id, "cache: patch for unknown entity ignored");
                return None;
            };
            let mut next = Entity::clone(entry.value());
            patch.apply(&mut next);
            let next = Arc::new(next);
            *entry.value_mut() = Arc::clone(&next);
            next
        };

        trace!(id = %id, ?patch, "cache: entity patched");
        self.notify(id, Some(Arc::clone(&updated)));
        self.broadcast(CacheUpdate::EntityPatched {
            entity: Arc::clone(&updated),
        });
        Some(updated)
    }

    /// Remove a record, returning it if it was present.
    pub fn remove(&self, id: &EntityId) -> Option<Arc<Entity>> {
        let (_, removed) = self.records.remove(id)?;
        self.posts.remove(id);
        trace!(id = %id, "cache: entity removed");
        self.notify(id, None);
        self.broadcast(CacheUpdate::EntityRemoved { id: id.clone() });
        Some(removed)
    }

    /// Subscribe to changes of one id. The subscription starts at the
    /// current record, which may be `None` for ids not fetched yet.
    pub fn subscribe(&self, id: &EntityId) -> EntitySubscription {
        let (sender, rx) = match self.watchers.entry(id.clone()) {
            Entry::Occupied(entry) => (Arc::downgrade(entry.get()), entry.get().subscribe()),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(self.get(id));
                let tx = Arc::new(tx);
                let sender = Arc::downgrade(&tx);
                entry.insert(tx);
                (sender, rx)
            }
        };
        EntitySubscription {
            id: id.clone(),
            rx,
            sender,
            watchers: Arc::downgrade(&self.watchers),
        }
    }

    /// Subscribe to every cache write.
    pub fn updates(&self) -> broadcast::Receiver<CacheUpdate> {
        self.updates_tx.subscribe()
    }

    fn notify(&self, id: &EntityId, value: Option<Arc<Entity>>) {
        // Drop watchers whose subscribers have all gone away.
        if self
            .watchers
            .remove_if(id, |_, tx| tx.receiver_count() == 0)
            .is_some()
        {
            return;
        }
        if let Some(tx) = self.watchers.get(id) {
            tx.send_replace(value);
        }
    }

    fn broadcast(&self, update: CacheUpdate) {
        if self.updates_tx.send(update).is_err() {
            trace!("no subscribers for cache update");
        }
    }
}
