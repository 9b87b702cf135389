//! Route table for the REST API.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde_json::{Value, json};

use crate::{Action, PostDraft};

/// A resolved endpoint: method, path (with query) and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl Route {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            body: None,
        }
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Which listing a feed view pulls from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedSource {
    Following,
    ForYou,
    Activity,
    Profile { user_id: String },
}

impl FeedSource {
    /// Route for one page of this feed. Pages are 1-based.
    pub fn route(&self, page: u32) -> Route {
        let base = match self {
            FeedSource::Following => "/feed/following".to_string(),
            FeedSource::ForYou => "/feed/for-you".to_string(),
            FeedSource::Activity => "/activities".to_string(),
            FeedSource::Profile { user_id } => format!("/users/{}/posts", user_id),
        };
        Route::new(Method::GET, format!("{}?page={}", base, page))
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Following => f.write_str("following"),
            FeedSource::ForYou => f.write_str("for-you"),
            FeedSource::Activity => f.write_str("activity"),
            FeedSource::Profile { user_id } => write!(f, "profile:{}", user_id),
        }
    }
}

impl FromStr for FeedSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "following" => Ok(FeedSource::Following),
            "for-you" | "foryou" => Ok(FeedSource::ForYou),
            "activity" | "activities" => Ok(FeedSource::Activity),
            other => match other.strip_prefix("profile:") {
                Some(user_id) if !user_id.is_empty() => Ok(FeedSource::Profile {
                    user_id: user_id.to_string(),
                }),
                _ => Err(format!(
                    "unknown feed '{}', expected following, for-you, activity or profile:<user>",
                    s
                )),
            },
        }
    }
}

/// Route for an action on an entity.
pub fn action_route(entity_id: &str, action: &Action) -> Route {
    match action {
        Action::Like => Route::new(Method::POST, format!("/posts/{}/like", entity_id)),
        Action::Unlike => Route::new(Method::DELETE, format!("/posts/{}/like", entity_id)),
        Action::Repost => Route::new(Method::POST, format!("/posts/{}/repost", entity_id)),
        Action::Unrepost => Route::new(Method::DELETE, format!("/posts/{}/repost", entity_id)),
        Action::AcceptInvitation => {
            Route::new(Method::POST, format!("/activities/{}/accept", entity_id))
        }
        Action::DeclineInvitation => {
            Route::new(Method::POST, format!("/activities/{}/decline", entity_id))
        }
        Action::Comment { text } => {
            Route::new(Method::POST, format!("/posts/{}/comments", entity_id))
                .with_body(json!({ "text": text }))
        }
        Action::FollowBack => {
            Route::new(Method::POST, format!("/activities/{}/follow-back", entity_id))
        }
    }
}

/// Route for publishing a post from the composer.
pub fn create_post_route(draft: &PostDraft) -> Result<Route, serde_json::Error> {
    Ok(Route::new(Method::POST, "/posts".to_string()).with_body(serde_json::to_value(draft)?))
}

/// Route for deleting one of the user's posts.
pub fn delete_post_route(post_id: &str) -> Route {
    Route::new(Method::DELETE, format!("/posts/{}", post_id))
}
