//! reqwest implementation of [`Backend`].

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{ApiConfig, ApiError, ApiResponse, Backend};

/// HTTP backend for the Flock REST API.
///
/// Never retries; a failed request is reported once and the caller decides.
pub struct HttpBackend {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Build a backend from configuration.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ApiError::Config(format!(
                "base URL must be http(s): {}",
                config.base_url
            )));
        }

        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            token: config.token,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "backend request");

        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        trace!(status = status.as_u16(), bytes = text.len(), "backend response");

        let data = if text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => Some(value),
                Err(e) if status.is_success() => return Err(ApiError::Json(e)),
                // Error pages are often plain text; keep them for the message.
                Err(_) => Some(Value::String(text)),
            }
        };

        Ok(ApiResponse {
            status: status.as_u16(),
            data,
        })
    }
}
