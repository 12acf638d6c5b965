//! HTTP client for the assistant API.
//!
//! This crate owns request building, response parsing and error mapping for
//! the session, stream and completion endpoints. Stream decoding, session
//! caching and cancellation live in `assist_transport`; the client plugs in
//! through its collaborator traits.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod reply;
pub mod url;

pub use client::AssistApiClient;
pub use config::AssistApiConfig;
pub use error::AssistApiError;
pub use payload::{CompletionRequest, SessionRequest, StreamRequest};
pub use reply::extract_reply;
pub use url::resolve_endpoint;
