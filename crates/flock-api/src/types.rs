//! JSON shapes exchanged with the backend, and the user action vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level discriminant of a feed item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireKind {
    #[default]
    Post,
    Activity,
}

/// Author of a post or the actor of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAuthor {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A media attachment reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMedia {
    pub url: String,
    /// "image" or "video"; absent means image.
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Event invitation carried by `event_invitation` activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireInvitation {
    pub event_id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// "pending", "accepted" or "declined".
    #[serde(default)]
    pub status: Option<String>,
}

/// A post or activity as the backend returns it.
///
/// Reposts embed their original post, and post-related activities embed the
/// post they are about; both nest the full object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEntity {
    pub id: String,
    #[serde(default)]
    pub kind: WireKind,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub author: Option<WireAuthor>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media: Vec<WireMedia>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_liked: bool,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub has_reposted: bool,
    #[serde(default)]
    pub repost_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub original_post: Option<Box<WireEntity>>,
    #[serde(default)]
    pub post: Option<Box<WireEntity>>,
    #[serde(default)]
    pub invitation: Option<WireInvitation>,
    #[serde(default)]
    pub followed_back: bool,
}

/// One page of a feed listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    #[serde(default)]
    pub items: Vec<WireEntity>,
    #[serde(default)]
    pub has_more: bool,
    /// Page number echoed back by the server, when it sends one.
    #[serde(default)]
    pub page: Option<u32>,
}

/// Authoritative counters an action endpoint may return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterPayload {
    #[serde(default)]
    pub user_liked: Option<bool>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub has_reposted: Option<bool>,
    #[serde(default)]
    pub repost_count: Option<i64>,
    #[serde(default)]
    pub comment_count: Option<i64>,
    #[serde(default)]
    pub invitation_status: Option<String>,
    #[serde(default)]
    pub followed_back: Option<bool>,
}

impl CounterPayload {
    /// True when the server sent none of the known fields.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body of a new post from the composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_urls: Vec<String>,
}

impl PostDraft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media_urls: Vec::new(),
        }
    }
}

/// In-flight lane of an action.
///
/// Two actions of the same kind on the same entity write the same fields, so
/// only one may be pending at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Like,
    Repost,
    Invitation,
    Comment,
    Follow,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Like => "like",
            ActionKind::Repost => "repost",
            ActionKind::Invitation => "invitation",
            ActionKind::Comment => "comment",
            ActionKind::Follow => "follow",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-triggered mutation together with its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Like,
    Unlike,
    Repost,
    Unrepost,
    AcceptInvitation,
    DeclineInvitation,
    Comment { text: String },
    /// Follow the actor of a follow or follow-request activity.
    FollowBack,
}

impl Action {
    /// The in-flight lane this action occupies.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Like | Action::Unlike => ActionKind::Like,
            Action::Repost | Action::Unrepost => ActionKind::Repost,
            Action::AcceptInvitation | Action::DeclineInvitation => ActionKind::Invitation,
            Action::Comment { .. } => ActionKind::Comment,
            Action::FollowBack => ActionKind::Follow,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Like => "like",
            Action::Unlike => "unlike",
            Action::Repost => "repost",
            Action::Unrepost => "unrepost",
            Action::AcceptInvitation => "accept",
            Action::DeclineInvitation => "decline",
            Action::Comment { .. } => "comment",
            Action::FollowBack => "follow_back",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_entity_defaults() {
        let entity: WireEntity = serde_json::from_str(r#"{"id": "p1"}"#).unwrap();
        assert_eq!(entity.kind, WireKind::Post);
        assert_eq!(entity.like_count, 0);
        assert!(!entity.user_liked);
        assert!(entity.media.is_empty());
        assert!(entity.original_post.is_none());
    }

    #[test]
    fn test_wire_entity_nested_repost() {
        let json = serde_json::json!({
            "id": "p2",
            "kind": "post",
            "author": {"id": "u1", "username": "ada"},
            "likeCount": 3,
            "userLiked": true,
            "originalPost": {
                "id": "p1",
                "text": "hello",
                "repostCount": 9,
                "media": [{"url": "https://cdn.example.com/a.jpg", "type": "image", "width": 640}]
            }
        });
        let entity: WireEntity = serde_json::from_value(json).unwrap();
        assert_eq!(entity.like_count, 3);
        assert!(entity.user_liked);
        let original = entity.original_post.unwrap();
        assert_eq!(original.id, "p1");
        assert_eq!(original.repost_count, 9);
        assert_eq!(original.media[0].media_type.as_deref(), Some("image"));
        assert_eq!(original.media[0].width, Some(640));
    }

    #[test]
    fn test_activity_with_invitation() {
        let json = serde_json::json!({
            "id": "a1",
            "kind": "activity",
            "activityType": "event_invitation",
            "invitation": {"eventId": "e1", "title": "Picnic", "status": "pending"}
        });
        let entity: WireEntity = serde_json::from_value(json).unwrap();
        assert_eq!(entity.kind, WireKind::Activity);
        assert_eq!(entity.activity_type.as_deref(), Some("event_invitation"));
        assert_eq!(
            entity.invitation,
            Some(WireInvitation {
                event_id: "e1".into(),
                title: Some("Picnic".into()),
                status: Some("pending".into()),
            })
        );
    }

    #[test]
    fn test_counter_payload_empty() {
        let payload: CounterPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.is_empty());

        let payload: CounterPayload =
            serde_json::from_str(r#"{"likeCount": 12, "unrelated": true}"#).unwrap();
        assert!(!payload.is_empty());
        assert_eq!(payload.like_count, Some(12));
    }

    #[test]
    fn test_like_and_unlike_share_a_lane() {
        assert_eq!(Action::Like.kind(), Action::Unlike.kind());
        assert_eq!(Action::Repost.kind(), Action::Unrepost.kind());
        assert_ne!(Action::Like.kind(), Action::Repost.kind());
        assert_ne!(
            Action::Like.kind(),
            Action::Comment { text: "hi".into() }.kind()
        );
    }

    #[test]
    fn test_post_draft_serialization() {
        let draft = PostDraft::text("hello");
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            serde_json::json!({"text": "hello"})
        );
    }
}
