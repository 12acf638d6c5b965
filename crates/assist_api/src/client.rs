use assist_transport::{
    ByteStream, CollaboratorError, IdentifierExtractor, ResponseStreamOpener, SessionFactory,
    SessionId,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AssistApiConfig;
use crate::error::{parse_error_message, AssistApiError};
use crate::headers::{build_headers, ResponseKind};
use crate::payload::{CompletionRequest, StreamRequest};
use crate::reply::extract_reply;
use crate::url::resolve_endpoint;

/// HTTP implementation of the session and response-stream collaborators.
#[derive(Debug, Clone)]
pub struct AssistApiClient {
    http: Client,
    config: AssistApiConfig,
}

impl AssistApiClient {
    pub fn new(config: AssistApiConfig) -> Result<Self, AssistApiError> {
        resolve_endpoint(&config.base_url, &config.session_path, None)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(AssistApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AssistApiConfig {
        &self.config
    }

    /// Extractor matching the configured session field.
    pub fn identifier_extractor(&self) -> IdentifierExtractor {
        IdentifierExtractor::for_field(&self.config.session_field)
    }

    pub fn session_endpoint(&self) -> Result<Url, AssistApiError> {
        resolve_endpoint(&self.config.base_url, &self.config.session_path, None)
    }

    pub fn stream_endpoint(&self, session_id: &SessionId) -> Result<Url, AssistApiError> {
        resolve_endpoint(
            &self.config.base_url,
            &self.config.stream_path,
            Some(session_id),
        )
    }

    pub fn completion_endpoint(&self, session_id: &SessionId) -> Result<Url, AssistApiError> {
        resolve_endpoint(
            &self.config.base_url,
            &self.config.completion_path,
            Some(session_id),
        )
    }

    pub fn build_headers(&self, kind: ResponseKind) -> Result<HeaderMap, AssistApiError> {
        let headers = build_headers(&self.config, kind);
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| AssistApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| AssistApiError::InvalidHeader(format!("invalid value for {key}")))?,
            );
        }
        Ok(out)
    }

    pub fn build_session_request(&self) -> Result<RequestBuilder, AssistApiError> {
        Ok(self
            .http
            .post(self.session_endpoint()?)
            .headers(self.build_headers(ResponseKind::Json)?)
            .json(&self.config.session_request))
    }

    pub fn build_stream_request(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<RequestBuilder, AssistApiError> {
        Ok(self
            .http
            .post(self.stream_endpoint(session_id)?)
            .headers(self.build_headers(ResponseKind::EventStream)?)
            .json(&StreamRequest::new(session_id, text)))
    }

    pub fn build_completion_request(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<RequestBuilder, AssistApiError> {
        Ok(self
            .http
            .post(self.completion_endpoint(session_id)?)
            .headers(self.build_headers(ResponseKind::Json)?)
            .json(&CompletionRequest::new(
                session_id,
                self.config.engine.clone(),
                text,
            )))
    }

    /// Create a remote session and return the raw response.
    ///
    /// A body that is not JSON comes back as a string value so identifier
    /// extraction can still scan it.
    pub async fn request_session(&self) -> Result<Value, AssistApiError> {
        let response = self.send_checked(self.build_session_request()?).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    /// Open the streamed reply for `text` in `session_id`.
    pub async fn request_stream(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<ByteStream, AssistApiError> {
        let response = self
            .send_checked(self.build_stream_request(session_id, text)?)
            .await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|error| CollaboratorError::new(error.to_string()))
            })
            .boxed())
    }

    /// Non-streaming exchange; returns the reply text.
    pub async fn complete(&self, session_id: &SessionId, text: &str) -> Result<String, AssistApiError> {
        let response = self
            .send_checked(self.build_completion_request(session_id, text)?)
            .await?;
        let body = response.text().await?;
        let value = serde_json::from_str(&body).unwrap_or(Value::String(body));
        Ok(extract_reply(&value))
    }

    async fn send_checked(&self, request: RequestBuilder) -> Result<Response, AssistApiError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_error_message(status, &body);
        warn!(%status, %message, "request rejected");
        Err(AssistApiError::Status(status, message))
    }
}

#[async_trait]
impl SessionFactory for AssistApiClient {
    async fn create_session(&self) -> Result<Value, CollaboratorError> {
        Ok(self.request_session().await?)
    }
}

#[async_trait]
impl ResponseStreamOpener for AssistApiClient {
    async fn open_response_stream(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<ByteStream, CollaboratorError> {
        Ok(self.request_stream(session_id, text).await?)
    }
}
