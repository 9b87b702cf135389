//! Typed facade over a [`Backend`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::routes::{self, Route};
use crate::{
    Action, ApiError, ApiResponse, Backend, CounterPayload, FeedPage, FeedSource, PostDraft,
    WireEntity,
};

/// Typed access to the Flock REST API.
///
/// Cheap to clone; all clones share the same backend.
#[derive(Clone)]
pub struct FlockApi {
    backend: Arc<dyn Backend>,
}

impl FlockApi {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Fetch one page of a feed. Pages are 1-based.
    pub async fn fetch_feed(&self, source: &FeedSource, page: u32) -> Result<FeedPage, ApiError> {
        let data = self.send(source.route(page)).await?;
        let data =
            data.ok_or_else(|| ApiError::InvalidResponse(format!("empty page for {}", source)))?;
        let page: FeedPage = decode(data)?;
        debug!(feed = %source, items = page.items.len(), has_more = page.has_more, "fetched feed page");
        Ok(page)
    }

    /// Send an action. `Ok(None)` means the server confirmed without counters.
    pub async fn send_action(
        &self,
        entity_id: &str,
        action: &Action,
    ) -> Result<Option<CounterPayload>, ApiError> {
        let data = self.send(routes::action_route(entity_id, action)).await?;
        match data {
            None => Ok(None),
            Some(Value::Object(map)) if map.is_empty() => Ok(None),
            Some(value) => {
                let payload: CounterPayload = decode(value)?;
                Ok((!payload.is_empty()).then_some(payload))
            }
        }
    }

    /// Publish a new post, returning the server's copy of it.
    pub async fn create_post(&self, draft: &PostDraft) -> Result<WireEntity, ApiError> {
        let data = self.send(routes::create_post_route(draft)?).await?;
        let data = data.ok_or_else(|| ApiError::InvalidResponse("empty create response".into()))?;
        decode(data)
    }

    /// Delete one of the user's posts.
    pub async fn delete_post(&self, post_id: &str) -> Result<(), ApiError> {
        self.send(routes::delete_post_route(post_id)).await?;
        Ok(())
    }

    async fn send(&self, route: Route) -> Result<Option<Value>, ApiError> {
        let response = self
            .backend
            .request(route.method.clone(), &route.path, route.body)
            .await?;
        check_status(&route.path, response)
    }
}

/// Map a raw response to its body or an [`ApiError`].
fn check_status(path: &str, response: ApiResponse) -> Result<Option<Value>, ApiError> {
    if response.is_success() {
        return Ok(response.data);
    }

    if response.status == 401 {
        debug!(path = %path, "backend rejected session");
        return Err(ApiError::Unauthorized);
    }

    let message = match &response.data {
        Some(Value::Object(map)) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    warn!(path = %path, status = response.status, message = %message, "backend request failed");
    Err(ApiError::Status {
        status: response.status,
        message,
    })
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}
