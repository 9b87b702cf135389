//! Optimistic action engine.
//!
//! A user action goes through admission, optimistic apply, one network call,
//! then reconciliation or rollback. The in-flight entry for the action's lane
//! is held by a guard, so it is released on every exit path including the
//! future being dropped mid-request.

use std::sync::Arc;

use dashmap::DashSet;
use flock_api::{Action, ActionKind, FlockApi};
use tracing::{debug, warn};

use crate::transform::Transform;
use crate::{ActionError, Entity, EntityCache, EntityId, EntityPatch};

/// Result of a successful [`ActionEngine::perform`].
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// The action went through. Holds the record after reconciliation, or
    /// `None` if the entity was removed while the request was in flight.
    Committed(Option<Arc<Entity>>),
    /// An action of the same kind was already in flight for this entity.
    Skipped,
}

impl ActionOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, ActionOutcome::Skipped)
    }
}

type InFlightKey = (EntityId, ActionKind);

/// Removes its key from the in-flight set when dropped.
struct InFlightGuard {
    set: Arc<DashSet<InFlightKey>>,
    key: InFlightKey,
}

impl InFlightGuard {
    fn acquire(set: &Arc<DashSet<InFlightKey>>, key: InFlightKey) -> Option<Self> {
        set.insert(key.clone()).then(|| Self {
            set: Arc::clone(set),
            key,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

/// Performs user actions against the shared cache.
///
/// Cheap to clone; clones share the cache and the in-flight set.
#[derive(Clone)]
pub struct ActionEngine {
    cache: Arc<EntityCache>,
    api: FlockApi,
    in_flight: Arc<DashSet<InFlightKey>>,
}

impl ActionEngine {
    pub fn new(cache: Arc<EntityCache>, api: FlockApi) -> Self {
        Self {
            cache,
            api,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    /// Whether an action of `kind` is pending for `id` (e.g. to disable a button).
    pub fn is_in_flight(&self, id: &EntityId, kind: ActionKind) -> bool {
        self.in_flight.contains(&(id.clone(), kind))
    }

    /// Number of pending actions across all entities.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Perform `action` on the cached entity `id`.
    ///
    /// The optimistic change is visible in the cache before the network call
    /// starts. On failure the pre-action values are restored before the
    /// error is returned.
    pub async fn perform(&self, id: &EntityId, action: Action) -> Result<ActionOutcome, ActionError> {
        let kind = action.kind();
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, (id.clone(), kind)) else {
            debug!(id = %id, kind = %kind, "action already in flight, skipping");
            return Ok(ActionOutcome::Skipped);
        };

        let current = self
            .cache
            .get(id)
            .ok_or_else(|| ActionError::UnknownEntity { id: id.clone() })?;
        let transform =
            Transform::for_action(&action, &current).ok_or_else(|| ActionError::NotApplicable {
                id: id.clone(),
                action: action.name(),
            })?;

        self.cache.patch(id, &transform.forward);
        debug!(id = %id, action = %action, "optimistic update applied");

        match self.api.send_action(id.as_str(), &action).await {
            Ok(Some(payload)) => {
                let authoritative = EntityPatch::from(payload);
                debug!(id = %id, action = %action, ?authoritative, "reconciling with server counters");
                self.cache.patch(id, &authoritative);
            }
            Ok(None) => {
                debug!(id = %id, action = %action, "action confirmed");
            }
            Err(source) => {
                self.cache.patch(id, &transform.inverse);
                warn!(id = %id, action = %action, error = %source, "action failed, rolled back");
                return Err(ActionError::Rejected {
                    id: id.clone(),
                    action: action.name(),
                    kind,
                    source,
                });
            }
        }

        Ok(ActionOutcome::Committed(self.cache.get(id)))
    }
}
