//! Optimistic forward transforms for user actions.
//!
//! Each transform is a pure function of the entity's current state and
//! returns the fields it would write. The inverse is never derived from the
//! mutated entity; it is [`EntityPatch::snapshot_of`] the pre-action record,
//! which restores exactly what the forward patch overwrote.

use flock_api::Action;

use crate::{ActivityType, Entity, EntityKind, EntityPatch, InvitationStatus};

/// Forward and inverse patches for one action on one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transform {
    pub forward: EntityPatch,
    pub inverse: EntityPatch,
}

impl Transform {
    /// Build the transform pair for `action` against `entity`.
    ///
    /// Returns `None` when the action does not apply to this kind of entity.
    pub fn for_action(action: &Action, entity: &Entity) -> Option<Self> {
        let forward = forward(action, entity)?;
        let inverse = forward.snapshot_of(entity);
        Some(Self { forward, inverse })
    }
}

/// Fields `action` writes when applied optimistically to `entity`.
pub fn forward(action: &Action, entity: &Entity) -> Option<EntityPatch> {
    match action {
        Action::Like => post_only(entity, like(entity, true)),
        Action::Unlike => post_only(entity, like(entity, false)),
        Action::Repost => post_only(entity, repost(entity, true)),
        Action::Unrepost => post_only(entity, repost(entity, false)),
        Action::AcceptInvitation => respond(entity, InvitationStatus::Accepted),
        Action::DeclineInvitation => respond(entity, InvitationStatus::Declined),
        Action::Comment { .. } => post_only(
            entity,
            EntityPatch {
                comment_count: Some(entity.counters.comment_count + 1),
                ..Default::default()
            },
        ),
        Action::FollowBack => match entity.kind {
            EntityKind::Activity(ActivityType::Follow | ActivityType::FollowRequest) => {
                Some(EntityPatch {
                    actor_followed: Some(true),
                    ..Default::default()
                })
            }
            _ => None,
        },
    }
}

fn post_only(entity: &Entity, patch: EntityPatch) -> Option<EntityPatch> {
    entity.is_post().then_some(patch)
}

/// Liking an already-liked post (or unliking a post that is not liked)
/// leaves the count alone.
fn like(entity: &Entity, liked: bool) -> EntityPatch {
    let c = &entity.counters;
    let like_count = match (c.user_liked, liked) {
        (false, true) => c.like_count + 1,
        (true, false) => (c.like_count - 1).max(0),
        _ => c.like_count,
    };
    EntityPatch {
        user_liked: Some(liked),
        like_count: Some(like_count),
        ..Default::default()
    }
}

fn repost(entity: &Entity, reposted: bool) -> EntityPatch {
    let c = &entity.counters;
    let repost_count = match (c.has_reposted, reposted) {
        (false, true) => c.repost_count + 1,
        (true, false) => (c.repost_count - 1).max(0),
        _ => c.repost_count,
    };
    EntityPatch {
        has_reposted: Some(reposted),
        repost_count: Some(repost_count),
        ..Default::default()
    }
}

fn respond(entity: &Entity, status: InvitationStatus) -> Option<EntityPatch> {
    entity.invitation.as_ref()?;
    Some(EntityPatch {
        invitation_status: Some(status),
        ..Default::default()
    })
}
