#![allow(unused_imports)]

use assist_transport::{
    logging, ByteStream, CancellationToken, CollaboratorError, Completion, ConfigError, EnvConfig,
    ExtractionStrategy, FrameDecoder, FrameEvent, Frames, IdentifierExtractor, Message,
    ProviderKind, Reply, ResponseStreamOpener, Role, SessionCoordinator, SessionError,
    SessionFactory, SessionId, SessionState, Terminal, TransportClient, TransportError,
};

#[test]
fn public_api_exports_compile() {}
