//! REST backend client for the Flock social feed.
//!
//! This crate owns everything that talks to the server: the generic
//! request primitive, the HTTP implementation of it, the route table and
//! the JSON shapes the backend returns.
//!
//! ## Features
//!
//! - **Backend**: `request(method, path, body) -> {status, data}` seam, mockable in tests
//! - **HTTP**: reqwest-based backend with bearer auth and timeouts
//! - **Routes**: feed listing and action endpoints
//! - **Api**: typed facade mapping statuses to [`ApiError`]

mod api;
mod backend;
mod config;
mod error;
mod http;
pub mod routes;
mod types;

pub use api::FlockApi;
pub use backend::{ApiResponse, Backend};
pub use config::ApiConfig;
pub use error::ApiError;
pub use http::HttpBackend;
pub use reqwest::Method;
pub use routes::{FeedSource, Route};
pub use types::*;
