//! The generic request primitive the core depends on.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::ApiError;

/// Raw response from the backend: status code plus optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: u16, data: Option<Value>) -> Self {
        Self { status, data }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A REST backend.
///
/// Implementations only report transport failures as errors; status
/// interpretation is left to [`FlockApi`](crate::FlockApi).
#[async_trait]
pub trait Backend: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError>;
}
