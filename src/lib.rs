//! Client-side transport for streamed assistant conversations.
//!
//! # Public API Overview
//! - [`SessionCoordinator`] hands out one cached session id, creating it at most once
//!   even under concurrent demand.
//! - [`FrameDecoder`] turns arbitrarily chunked response bytes into typed [`FrameEvent`]s.
//! - [`TransportClient`] runs one cancellable "send text, stream reply" exchange.
//! - [`SessionFactory`] and [`ResponseStreamOpener`] are the network seams; the
//!   `assist_api` and `assist_mock` crates implement them.

pub mod collaborator;
pub mod config;
pub mod decoder;
pub mod error;
pub mod events;
pub mod identifier;
pub mod logging;
pub mod message;
pub mod session;
pub mod transport;

pub use crate::collaborator::{ByteStream, CollaboratorError, ResponseStreamOpener, SessionFactory};
pub use crate::config::{ConfigError, EnvConfig, ProviderKind};
pub use crate::decoder::{FrameDecoder, Frames};
pub use crate::error::{SessionError, TransportError};
pub use crate::events::{FrameEvent, Terminal};
pub use crate::identifier::{ExtractionStrategy, IdentifierExtractor, SessionId};
pub use crate::message::{Message, Role};
pub use crate::session::{SessionCoordinator, SessionState};
pub use crate::transport::{Completion, Reply, TransportClient};

pub use tokio_util::sync::CancellationToken;
