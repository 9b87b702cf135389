//! Scripted backend for store tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flock_api::{ApiError, ApiResponse, Backend, FlockApi, Method};
use flock_store::Store;
use serde_json::{Value, json};
use tokio::sync::oneshot;

/// A reply the mock will give for one request.
pub enum Reply {
    Now(u16, Option<Value>),
    /// Held until the test sends the response.
    Deferred(oneshot::Receiver<(u16, Option<Value>)>),
}

/// Backend that answers from per-route queues and records every call.
#[derive(Default)]
pub struct MockBackend {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<(Method, String, Option<Value>)>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, method: Method, path: &str, status: u16, data: Option<Value>) {
        self.push(method, path, Reply::Now(status, data));
    }

    /// Queue a reply that resolves only when the returned sender fires.
    pub fn defer(&self, method: Method, path: &str) -> oneshot::Sender<(u16, Option<Value>)> {
        let (tx, rx) = oneshot::channel();
        self.push(method, path, Reply::Deferred(rx));
        tx
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, p, _)| (m.clone(), p.clone()))
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.clone(), path.to_string(), body));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&(method, path.to_string()))
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Now(status, data)) => Ok(ApiResponse::new(status, data)),
            Some(Reply::Deferred(rx)) => {
                let (status, data) = rx
                    .await
                    .map_err(|_| ApiError::InvalidResponse("reply dropped".into()))?;
                Ok(ApiResponse::new(status, data))
            }
            None => Ok(ApiResponse::new(404, Some(json!({"message": "no route"})))),
        }
    }
}

pub fn store_with(backend: &Arc<MockBackend>) -> Store {
    Store::new(FlockApi::new(backend.clone()))
}

/// Let spawned tasks run until the backend has seen `n` calls.
pub async fn wait_for_calls(backend: &MockBackend, n: usize) {
    for _ in 0..1000 {
        if backend.call_count() >= n {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("backend saw {} calls, expected {}", backend.call_count(), n);
}

pub fn post_json(id: &str, likes: i64) -> Value {
    json!({
        "id": id,
        "kind": "post",
        "author": {"id": "u1", "username": "ada"},
        "text": format!("post {id}"),
        "likeCount": likes,
        "userLiked": false
    })
}

pub fn page_json(ids: &[String], has_more: bool) -> Value {
    json!({
        "items": ids.iter().map(|id| post_json(id, 0)).collect::<Vec<_>>(),
        "hasMore": has_more
    })
}
