use std::sync::Arc;

use anyhow::Context;
use assist_api::{AssistApiClient, AssistApiConfig};
use assist_mock::{MockBackend, MOCK_PROVIDER_ID};
use assist_transport::{
    EnvConfig, IdentifierExtractor, ProviderKind, ResponseStreamOpener, SessionCoordinator,
    SessionFactory, TransportClient,
};

/// Collaborator pair selected from the environment.
pub struct Collaborators {
    pub provider_id: &'static str,
    pub factory: Arc<dyn SessionFactory>,
    pub opener: Arc<dyn ResponseStreamOpener>,
    pub extractor: IdentifierExtractor,
}

impl Collaborators {
    /// Wires the pair into a transport client, resuming `config.session_id` when set.
    pub fn into_client(self, config: &EnvConfig) -> TransportClient {
        let sessions = match config.session_id.clone() {
            Some(session_id) => SessionCoordinator::with_session(self.factory, session_id),
            None => SessionCoordinator::new(self.factory),
        }
        .with_extractor(self.extractor);

        TransportClient::new(Arc::new(sessions), self.opener)
    }
}

pub fn collaborators_for(config: &EnvConfig) -> anyhow::Result<Collaborators> {
    match config.provider {
        ProviderKind::Mock => {
            let backend = Arc::new(MockBackend::default());
            Ok(Collaborators {
                provider_id: MOCK_PROVIDER_ID,
                factory: backend.clone(),
                opener: backend,
                extractor: IdentifierExtractor::default(),
            })
        }
        ProviderKind::Http => {
            let client = AssistApiClient::new(api_config(config))
                .context("invalid HTTP provider configuration")?;
            let extractor = client.identifier_extractor();
            let client = Arc::new(client);
            Ok(Collaborators {
                provider_id: ProviderKind::Http.as_str(),
                factory: client.clone(),
                opener: client,
                extractor,
            })
        }
    }
}

pub fn api_config(config: &EnvConfig) -> AssistApiConfig {
    let mut api = AssistApiConfig::new();
    if let Some(base_url) = &config.base_url {
        api = api.with_base_url(base_url.as_str());
    }
    if let Some(token) = &config.access_token {
        api = api.with_access_token(token.as_str());
    }
    if let Some(engine) = &config.engine {
        api = api.with_engine(engine.as_str());
    }
    if let Some(timeout) = config.timeout {
        api = api.with_timeout(timeout);
    }
    api
}
