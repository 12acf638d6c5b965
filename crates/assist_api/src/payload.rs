use assist_transport::SessionId;
use serde::{Deserialize, Serialize};

/// Body of the session creation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub new_session: NewSession,
    pub advance_params: AdvanceParams,
}

impl SessionRequest {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.new_session.session_title = title.into();
        self
    }

    pub fn with_file(mut self, file_name: impl Into<String>, index_name: impl Into<String>) -> Self {
        self.new_session.filelist.push(SessionFile {
            file_name: file_name.into(),
            index_name: index_name.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub temperature: f64,
    pub max_tokens: u32,
    pub engine: String,
    pub session_title: String,
    pub status_id: u32,
    #[serde(rename = "sessionType")]
    pub session_type: String,
    pub filelist: Vec<SessionFile>,
    pub application: String,
    pub use_vision_chat: bool,
}

impl Default for NewSession {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1026,
            engine: crate::config::DEFAULT_ENGINE.to_owned(),
            session_title: "New chat".to_owned(),
            status_id: 1,
            session_type: "assistant".to_owned(),
            filelist: Vec::new(),
            application: "VOX".to_owned(),
            use_vision_chat: false,
        }
    }
}

/// Document attached to a session for retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    pub file_name: String,
    pub index_name: String,
}

/// Retrieval tuning sent with session creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceParams {
    pub num_of_citations: u32,
    pub vector_score_threshold: f64,
    pub parent_document_retriever: bool,
    pub with_agent: bool,
    pub rerank_model: bool,
    pub recursion_limit: u32,
}

impl Default for AdvanceParams {
    fn default() -> Self {
        Self {
            num_of_citations: 2,
            vector_score_threshold: 0.2,
            parent_document_retriever: false,
            with_agent: false,
            rerank_model: false,
            recursion_limit: 2,
        }
    }
}

/// Body of the streaming request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub session_id: SessionId,
    pub message: String,
}

impl StreamRequest {
    pub fn new(session_id: &SessionId, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.clone(),
            message: message.into(),
        }
    }
}

/// Body of the non-streaming completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub chat_completion_message: ChatCompletionMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    pub session_id: SessionId,
    pub engine: String,
    pub messages: Vec<CompletionTurn>,
    #[serde(rename = "sessionType")]
    pub session_type: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub thinking_tokens: u32,
    pub reasoning_efforts: String,
    pub is_summarize: bool,
    pub vision: bool,
    pub output_tokens: u32,
    pub is_compare_docs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionTurn {
    pub role: String,
    pub content: String,
    pub typecontent: Vec<TypedContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl CompletionRequest {
    pub fn new(session_id: &SessionId, engine: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            chat_completion_message: ChatCompletionMessage {
                session_id: session_id.clone(),
                engine: engine.into(),
                messages: vec![CompletionTurn {
                    role: "user".to_owned(),
                    content: text.clone(),
                    typecontent: vec![TypedContent {
                        kind: "text".to_owned(),
                        content: text,
                    }],
                }],
                session_type: "assistant".to_owned(),
                temperature: 0.7,
                max_tokens: 1026,
                thinking_tokens: 1024,
                reasoning_efforts: "low".to_owned(),
                is_summarize: false,
                vision: true,
                output_tokens: 1026,
                is_compare_docs: false,
            },
        }
    }
}
