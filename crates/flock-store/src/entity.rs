//! Normalized entity model.
//!
//! The backend nests objects freely (a repost embeds its original post, a
//! like activity embeds the liked post). The cache stores each object once,
//! under its own id, and replaces nesting with [`EntityId`] references.

use std::fmt;

use chrono::{DateTime, Utc};
use flock_api::{CounterPayload, WireAuthor, WireEntity, WireInvitation, WireKind, WireMedia};

/// Opaque, stable identifier of a post or activity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Discriminant for activity items.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityType {
    Follow,
    FollowRequest,
    PostLike,
    PostRepost,
    PostComment,
    PhotoComment,
    EventInvitation,
    Mention,
    /// A type this client does not know yet.
    Other(String),
}

impl ActivityType {
    pub fn parse(s: &str) -> Self {
        match s {
            "follow" => Self::Follow,
            "follow_request" => Self::FollowRequest,
            "post_like" => Self::PostLike,
            "post_repost" => Self::PostRepost,
            "post_comment" => Self::PostComment,
            "photo_comment" => Self::PhotoComment,
            "event_invitation" => Self::EventInvitation,
            "mention" => Self::Mention,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Follow => "follow",
            Self::FollowRequest => "follow_request",
            Self::PostLike => "post_like",
            Self::PostRepost => "post_repost",
            Self::PostComment => "post_comment",
            Self::PhotoComment => "photo_comment",
            Self::EventInvitation => "event_invitation",
            Self::Mention => "mention",
            Self::Other(s) => s,
        }
    }
}

/// Whether an entity is a post or an activity item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Post,
    Activity(ActivityType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<WireAuthor> for Author {
    fn from(w: WireAuthor) -> Self {
        Self {
            id: w.id,
            username: w.username,
            display_name: w.display_name,
            avatar_url: w.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub kind: MediaKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl From<WireMedia> for MediaRef {
    fn from(w: WireMedia) -> Self {
        let kind = match w.media_type.as_deref() {
            Some("video") => MediaKind::Video,
            _ => MediaKind::Image,
        };
        Self {
            url: w.url,
            kind,
            width: w.width,
            height: w.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

impl InvitationStatus {
    /// Parse a server status string. Unknown values read as pending.
    pub fn parse(s: &str) -> Self {
        match s {
            "accepted" => Self::Accepted,
            "declined" => Self::Declined,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub event_id: String,
    pub title: Option<String>,
    pub status: InvitationStatus,
}

impl From<WireInvitation> for Invitation {
    fn from(w: WireInvitation) -> Self {
        Self {
            event_id: w.event_id,
            title: w.title,
            status: w
                .status
                .as_deref()
                .map(InvitationStatus::parse)
                .unwrap_or(InvitationStatus::Pending),
        }
    }
}

/// Fields subject to optimistic mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Counters {
    pub user_liked: bool,
    pub like_count: i64,
    pub has_reposted: bool,
    pub repost_count: i64,
    pub comment_count: i64,
}

/// A post or activity item as held by the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub author: Option<Author>,
    pub text: Option<String>,
    pub media: Vec<MediaRef>,
    pub created_at: Option<DateTime<Utc>>,
    /// For reposts: the post being reposted.
    pub original_post: Option<EntityId>,
    /// For post-related activities: the post the activity is about.
    pub subject_post: Option<EntityId>,
    pub invitation: Option<Invitation>,
    /// For follow activities: whether the user has followed the actor back.
    pub actor_followed: bool,
    pub counters: Counters,
}

impl Entity {
    /// A bare post with zeroed counters.
    pub fn post(id: impl Into<EntityId>) -> Self {
        Self::bare(id.into(), EntityKind::Post)
    }

    /// A bare activity item of the given type.
    pub fn activity(id: impl Into<EntityId>, activity_type: ActivityType) -> Self {
        Self::bare(id.into(), EntityKind::Activity(activity_type))
    }

    fn bare(id: EntityId, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            author: None,
            text: None,
            media: Vec::new(),
            created_at: None,
            original_post: None,
            subject_post: None,
            invitation: None,
            actor_followed: false,
            counters: Counters::default(),
        }
    }

    pub fn with_counters(mut self, counters: Counters) -> Self {
        self.counters = counters;
        self
    }

    pub fn with_invitation(mut self, invitation: Invitation) -> Self {
        self.invitation = Some(invitation);
        self
    }

    pub fn is_post(&self) -> bool {
        self.kind == EntityKind::Post
    }

    pub fn activity_type(&self) -> Option<&ActivityType> {
        match &self.kind {
            EntityKind::Activity(t) => Some(t),
            EntityKind::Post => None,
        }
    }

    /// Normalize a backend object, splitting out every embedded post.
    pub fn from_wire(wire: WireEntity) -> Normalized {
        let mut embedded = Vec::new();

        let original_post = wire.original_post.map(|nested| {
            let normalized = Entity::from_wire(*nested);
            let id = normalized.entity.id.clone();
            embedded.extend(normalized.embedded);
            embedded.push(normalized.entity);
            id
        });
        let subject_post = wire.post.map(|nested| {
            let normalized = Entity::from_wire(*nested);
            let id = normalized.entity.id.clone();
            embedded.extend(normalized.embedded);
            embedded.push(normalized.entity);
            id
        });

        let kind = match wire.kind {
            WireKind::Post => EntityKind::Post,
            WireKind::Activity => EntityKind::Activity(
                wire.activity_type
                    .as_deref()
                    .map(ActivityType::parse)
                    .unwrap_or_else(|| ActivityType::Other("unknown".to_string())),
            ),
        };

        let entity = Entity {
            id: EntityId::new(wire.id),
            kind,
            author: wire.author.map(Author::from),
            text: wire.text,
            media: wire.media.into_iter().map(MediaRef::from).collect(),
            created_at: wire.created_at,
            original_post,
            subject_post,
            invitation: wire.invitation.map(Invitation::from),
            actor_followed: wire.followed_back,
            counters: Counters {
                user_liked: wire.user_liked,
                like_count: wire.like_count,
                has_reposted: wire.has_reposted,
                repost_count: wire.repost_count,
                comment_count: wire.comment_count,
            },
        };

        Normalized { entity, embedded }
    }
}

/// Result of normalizing one backend object.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub entity: Entity,
    /// Objects that were nested inside it, innermost first.
    pub embedded: Vec<Entity>,
}

/// A partial update to an entity's mutable fields.
///
/// Unset fields are left alone by [`EntityPatch::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPatch {
    pub user_liked: Option<bool>,
    pub like_count: Option<i64>,
    pub has_reposted: Option<bool>,
    pub repost_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub invitation_status: Option<InvitationStatus>,
    pub actor_followed: Option<bool>,
}

impl EntityPatch {
    /// Shallow-merge the set fields into `entity`.
    ///
    /// An invitation status is ignored for entities without an invitation.
    pub fn apply(&self, entity: &mut Entity) {
        let counters = &mut entity.counters;
        if let Some(v) = self.user_liked {
            counters.user_liked = v;
        }
        if let Some(v) = self.like_count {
            counters.like_count = v;
        }
        if let Some(v) = self.has_reposted {
            counters.has_reposted = v;
        }
        if let Some(v) = self.repost_count {
            counters.repost_count = v;
        }
        if let Some(v) = self.comment_count {
            counters.comment_count = v;
        }
        if let (Some(status), Some(invitation)) = (self.invitation_status, &mut entity.invitation) {
            invitation.status = status;
        }
        if let Some(v) = self.actor_followed {
            entity.actor_followed = v;
        }
    }

    /// Capture `entity`'s current values for exactly the fields this patch sets.
    ///
    /// Applying the result after `self` restores those fields bit for bit.
    pub fn snapshot_of(&self, entity: &Entity) -> EntityPatch {
        let counters = &entity.counters;
        EntityPatch {
            user_liked: self.user_liked.map(|_| counters.user_liked),
            like_count: self.like_count.map(|_| counters.like_count),
            has_reposted: self.has_reposted.map(|_| counters.has_reposted),
            repost_count: self.repost_count.map(|_| counters.repost_count),
            comment_count: self.comment_count.map(|_| counters.comment_count),
            invitation_status: self
                .invitation_status
                .and(entity.invitation.as_ref().map(|i| i.status)),
            actor_followed: self.actor_followed.map(|_| entity.actor_followed),
        }
    }
}

impl From<CounterPayload> for EntityPatch {
    fn from(p: CounterPayload) -> Self {
        Self {
            user_liked: p.user_liked,
            like_count: p.like_count,
            has_reposted: p.has_reposted,
            repost_count: p.repost_count,
            comment_count: p.comment_count,
            invitation_status: p.invitation_status.as_deref().map(InvitationStatus::parse),
            actor_followed: p.followed_back,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn wire(value: serde_json::Value) -> WireEntity {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_plain_post() {
        let normalized = Entity::from_wire(wire(json!({
            "id": "p1",
            "kind": "post",
            "author": {"id": "u1", "username": "ada", "displayName": "Ada"},
            "text": "hello",
            "media": [{"url": "https://cdn/v.mp4", "type": "video"}],
            "createdAt": "2024-05-01T12:00:00Z",
            "userLiked": true,
            "likeCount": 5,
            "commentCount": 2
        })));

        assert!(normalized.embedded.is_empty());
        let entity = normalized.entity;
        assert_eq!(entity.id, EntityId::from("p1"));
        assert!(entity.is_post());
        assert_eq!(entity.author.unwrap().display_name.as_deref(), Some("Ada"));
        assert_eq!(entity.media[0].kind, MediaKind::Video);
        assert!(entity.created_at.is_some());
        assert_eq!(
            entity.counters,
            Counters {
                user_liked: true,
                like_count: 5,
                has_reposted: false,
                repost_count: 0,
                comment_count: 2,
            }
        );
    }

    #[test]
    fn test_normalize_repost_extracts_original() {
        let normalized = Entity::from_wire(wire(json!({
            "id": "p2",
            "originalPost": {"id": "p1", "likeCount": 7}
        })));

        assert_eq!(normalized.entity.original_post, Some(EntityId::from("p1")));
        assert_eq!(normalized.embedded.len(), 1);
        assert_eq!(normalized.embedded[0].id, EntityId::from("p1"));
        assert_eq!(normalized.embedded[0].counters.like_count, 7);
    }

    #[test]
    fn test_normalize_activity_with_nested_repost() {
        let normalized = Entity::from_wire(wire(json!({
            "id": "a1",
            "kind": "activity",
            "activityType": "post_like",
            "post": {
                "id": "p2",
                "originalPost": {"id": "p1"}
            }
        })));

        assert_eq!(
            normalized.entity.kind,
            EntityKind::Activity(ActivityType::PostLike)
        );
        assert_eq!(normalized.entity.subject_post, Some(EntityId::from("p2")));
        let ids: Vec<_> = normalized.embedded.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_unknown_activity_type_is_preserved() {
        let normalized = Entity::from_wire(wire(json!({
            "id": "a9",
            "kind": "activity",
            "activityType": "badge_awarded"
        })));
        assert_eq!(
            normalized.entity.activity_type(),
            Some(&ActivityType::Other("badge_awarded".into()))
        );

        let missing = Entity::from_wire(wire(json!({"id": "a10", "kind": "activity"})));
        assert_eq!(
            missing.entity.activity_type(),
            Some(&ActivityType::Other("unknown".into()))
        );
    }

    #[test]
    fn test_activity_type_round_trips_known_names() {
        for name in [
            "follow",
            "follow_request",
            "post_like",
            "post_repost",
            "post_comment",
            "photo_comment",
            "event_invitation",
            "mention",
        ] {
            assert_eq!(ActivityType::parse(name).as_str(), name);
        }
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut entity = Entity::post("p1").with_counters(Counters {
            user_liked: false,
            like_count: 5,
            has_reposted: true,
            repost_count: 2,
            comment_count: 1,
        });
        let patch = EntityPatch {
            like_count: Some(9),
            ..Default::default()
        };
        patch.apply(&mut entity);
        assert_eq!(entity.counters.like_count, 9);
        assert!(entity.counters.has_reposted);
        assert_eq!(entity.counters.repost_count, 2);
    }

    #[test]
    fn test_snapshot_restores_written_fields() {
        let before = Entity::post("p1").with_counters(Counters {
            user_liked: false,
            like_count: 5,
            ..Default::default()
        });
        let forward = EntityPatch {
            user_liked: Some(true),
            like_count: Some(6),
            ..Default::default()
        };
        let inverse = forward.snapshot_of(&before);
        assert_eq!(
            inverse,
            EntityPatch {
                user_liked: Some(false),
                like_count: Some(5),
                ..Default::default()
            }
        );

        let mut entity = before.clone();
        forward.apply(&mut entity);
        inverse.apply(&mut entity);
        assert_eq!(entity, before);
    }

    #[test]
    fn test_invitation_status_ignored_without_invitation() {
        let mut entity = Entity::post("p1");
        let patch = EntityPatch {
            invitation_status: Some(InvitationStatus::Accepted),
            ..Default::default()
        };
        assert_eq!(patch.snapshot_of(&entity), EntityPatch::default());
        patch.apply(&mut entity);
        assert_eq!(entity.invitation, None);
    }

    #[test]
    fn test_patch_from_counter_payload() {
        let payload = CounterPayload {
            like_count: Some(11),
            invitation_status: Some("declined".into()),
            ..Default::default()
        };
        let patch = EntityPatch::from(payload);
        assert_eq!(patch.like_count, Some(11));
        assert_eq!(patch.invitation_status, Some(InvitationStatus::Declined));
        assert_eq!(patch.user_liked, None);
    }
}
