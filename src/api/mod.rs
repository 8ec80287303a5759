//! Shared plumbing for the hosted chat and speech endpoints
//!
//! - **client**: JSON POST client with key authentication and status mapping
//! - **retry**: exponential backoff for rate-limited/unavailable responses
//! - **types**: wire types for `generateContent` requests and responses

pub mod client;
pub mod retry;
pub mod types;

pub use client::{status_error, GeminiHttp};
pub use retry::{with_retry, RetryConfig};
pub use types::{Content, GenerateResponse, InlineData, Part};
