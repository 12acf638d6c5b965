use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use assist_transport::identifier::DEFAULT_SESSION_FIELD;

use crate::payload::SessionRequest;
use crate::url::{
    DEFAULT_BASE_URL, DEFAULT_COMPLETION_PATH, DEFAULT_SESSION_PATH, DEFAULT_STREAM_PATH,
};

/// Engine requested when the caller does not pick one.
pub const DEFAULT_ENGINE: &str = "gpt-4o";

/// Transport configuration for assistant API requests.
#[derive(Clone)]
pub struct AssistApiConfig {
    /// Base URL every endpoint path is resolved against.
    pub base_url: String,
    /// Bearer token passed to `Authorization`, when the deployment needs one.
    pub access_token: Option<String>,
    /// Session creation endpoint.
    pub session_path: String,
    /// Streaming endpoint; `{session_id}` is substituted per request.
    pub stream_path: String,
    /// Non-streaming completion endpoint; `{session_id}` is substituted per request.
    pub completion_path: String,
    /// Body sent to the session creation endpoint.
    pub session_request: SessionRequest,
    /// Field holding the identifier in session creation responses.
    pub session_field: String,
    pub engine: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional request timeout.
    pub timeout: Option<Duration>,
}

impl Default for AssistApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            session_path: DEFAULT_SESSION_PATH.to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            completion_path: DEFAULT_COMPLETION_PATH.to_string(),
            session_request: SessionRequest::default(),
            session_field: DEFAULT_SESSION_FIELD.to_string(),
            engine: DEFAULT_ENGINE.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl AssistApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_session_path(mut self, path: impl Into<String>) -> Self {
        self.session_path = path.into();
        self
    }

    pub fn with_stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    pub fn with_completion_path(mut self, path: impl Into<String>) -> Self {
        self.completion_path = path.into();
        self
    }

    pub fn with_session_request(mut self, request: SessionRequest) -> Self {
        self.session_request = request;
        self
    }

    pub fn with_session_field(mut self, field: impl Into<String>) -> Self {
        self.session_field = field.into();
        self
    }

    /// Sets the engine for completions and for newly created sessions.
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        let engine = engine.into();
        self.session_request.new_session.engine = engine.clone();
        self.engine = engine;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }
}

impl fmt::Debug for AssistApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistApiConfig")
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("session_path", &self.session_path)
            .field("stream_path", &self.stream_path)
            .field("completion_path", &self.completion_path)
            .field("session_field", &self.session_field)
            .field("engine", &self.engine)
            .field("user_agent", &self.user_agent)
            .field("extra_headers", &self.extra_headers.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
