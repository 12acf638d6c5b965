use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use assist_api::{AssistApiClient, AssistApiConfig};
use assist_transport::{
    CancellationToken, Completion, SessionCoordinator, SessionError, SessionId, TransportClient,
    TransportError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

fn allow_local_integration() -> bool {
    std::env::var("ASSIST_API_ALLOW_LOCAL_INTEGRATION")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

#[derive(Clone)]
struct ResponseChunk {
    delay_ms: u64,
    bytes: Vec<u8>,
}

#[derive(Clone)]
enum ScriptedResponse {
    Respond {
        status: u16,
        content_type: &'static str,
        chunks: Vec<ResponseChunk>,
    },
    Reset,
}

struct ScriptedServer {
    base_url: String,
    request_count: Arc<AtomicUsize>,
    request_lines: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    async fn new(scripts: Vec<ScriptedResponse>) -> Self {
        let scripts = Arc::new(scripts);
        let request_count = Arc::new(AtomicUsize::new(0));
        let request_lines = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener
            .local_addr()
            .expect("resolved local listener address");
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn({
            let scripts = Arc::clone(&scripts);
            let request_count = Arc::clone(&request_count);
            let request_lines = Arc::clone(&request_lines);

            async move {
                loop {
                    let (socket, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    let scripts = Arc::clone(&scripts);
                    let request_count = Arc::clone(&request_count);
                    let request_lines = Arc::clone(&request_lines);
                    tokio::spawn(async move {
                        serve_one(socket, scripts, request_count, request_lines).await;
                    });
                }
            }
        });

        Self {
            base_url,
            request_count,
            request_lines,
            handle,
        }
    }

    fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Acquire)
    }

    fn request_lines(&self) -> Vec<String> {
        self.request_lines.lock().expect("request lines").clone()
    }

    fn client(&self) -> Arc<AssistApiClient> {
        let config = AssistApiConfig::new()
            .with_base_url(&self.base_url)
            .with_access_token("tok");
        Arc::new(AssistApiClient::new(config).expect("client"))
    }

    fn shutdown(&self) {
        self.handle.abort();
    }
}

fn transport(api: Arc<AssistApiClient>) -> TransportClient {
    let sessions = SessionCoordinator::new(api.clone()).with_extractor(api.identifier_extractor());
    TransportClient::new(Arc::new(sessions), api)
}

fn response_stream(status: u16, frames: &[(&str, &str)]) -> ScriptedResponse {
    ScriptedResponse::Respond {
        status,
        content_type: "text/event-stream",
        chunks: frames
            .iter()
            .map(|(event, data)| ResponseChunk {
                delay_ms: 0,
                bytes: frame(event, data),
            })
            .collect(),
    }
}

fn response_json(status: u16, body: &str) -> ScriptedResponse {
    ScriptedResponse::Respond {
        status,
        content_type: "application/json",
        chunks: vec![ResponseChunk {
            delay_ms: 0,
            bytes: body.as_bytes().to_vec(),
        }],
    }
}

fn frame(event: &str, data: &str) -> Vec<u8> {
    format!("event: {event}\ndata: {data}\n\n").into_bytes()
}

#[tokio::test]
async fn exchange_integration_creates_session_and_streams_reply() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![
        response_json(200, r#"{"status":"ok","data":{"session_id":77}}"#),
        response_stream(
            200,
            &[
                ("delta", r#"{"text":"Hel"}"#),
                ("delta", r#"{"text":"lo"}"#),
                ("done", "{}"),
            ],
        ),
    ])
    .await;
    let client = transport(server.client());
    let mut deltas = Vec::new();

    let reply = client
        .send("hi", &CancellationToken::new(), |delta| {
            deltas.push(delta.to_owned())
        })
        .await
        .expect("exchange should succeed");

    assert_eq!(deltas, vec!["Hel", "lo"]);
    assert_eq!(reply.text, "Hello");
    assert_eq!(reply.completion, Completion::Done);
    assert_eq!(reply.session_id, SessionId::Numeric(77));
    assert_eq!(
        server.request_lines(),
        vec![
            "POST /auth/service/session/create HTTP/1.1".to_owned(),
            "POST /api/chats/77/stream HTTP/1.1".to_owned(),
        ]
    );

    server.shutdown();
}

#[tokio::test]
async fn exchange_integration_frames_split_across_chunks() {
    if !allow_local_integration() {
        return;
    }

    let body = concat!(
        "event: delta\r\ndata: {\"text\":\"h\u{e9}\"}\r\n\r\n",
        "event: delta\r\ndata: llo\r\n\r\n",
        "event: done\r\ndata: {}\r\n\r\n",
    )
    .as_bytes();
    let chunks = body
        .chunks(5)
        .map(|bytes| ResponseChunk {
            delay_ms: 1,
            bytes: bytes.to_vec(),
        })
        .collect();
    let server = ScriptedServer::new(vec![
        response_json(200, r#"{"session_id":1}"#),
        ScriptedResponse::Respond {
            status: 200,
            content_type: "text/event-stream",
            chunks,
        },
    ])
    .await;

    let reply = transport(server.client())
        .send("hi", &CancellationToken::new(), |_| {})
        .await
        .expect("exchange should succeed");

    assert_eq!(reply.text, "h\u{e9}llo");
    server.shutdown();
}

#[tokio::test]
async fn exchange_integration_silent_close_is_completion() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![
        response_json(200, r#"{"session_id":1}"#),
        response_stream(200, &[("delta", r#"{"text":"partial"}"#)]),
    ])
    .await;

    let reply = transport(server.client())
        .send("hi", &CancellationToken::new(), |_| {})
        .await
        .expect("silent close should succeed");

    assert_eq!(reply.text, "partial");
    assert_eq!(reply.completion, Completion::Closed);
    server.shutdown();
}

#[tokio::test]
async fn exchange_integration_error_frame_fails_with_partial() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![
        response_json(200, r#"{"session_id":1}"#),
        response_stream(
            200,
            &[
                ("delta", r#"{"text":"Hel"}"#),
                ("error", r#"{"message":"model overloaded"}"#),
            ],
        ),
    ])
    .await;

    let error = transport(server.client())
        .send("hi", &CancellationToken::new(), |_| {})
        .await
        .expect_err("error frame should fail");

    assert_eq!(
        error,
        TransportError::Stream {
            detail: "model overloaded".to_owned(),
            partial: "Hel".to_owned(),
        }
    );
    server.shutdown();
}

#[tokio::test]
async fn exchange_integration_session_failure_is_not_retried() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![response_json(
        500,
        r#"{"detail":"database unavailable"}"#,
    )])
    .await;

    let error = transport(server.client())
        .send("hi", &CancellationToken::new(), |_| {})
        .await
        .expect_err("session creation should fail");

    assert_eq!(
        error,
        TransportError::Session(SessionError::CreationFailed {
            status: Some(500),
            detail: "database unavailable".to_owned(),
        })
    );
    assert_eq!(server.request_count(), 1);
    server.shutdown();
}

#[tokio::test]
async fn exchange_integration_rejected_stream_request() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![
        response_json(200, r#"{"session_id":1}"#),
        response_json(404, r#"{"detail":"Chat not found"}"#),
    ])
    .await;

    let error = transport(server.client())
        .send("hi", &CancellationToken::new(), |_| {})
        .await
        .expect_err("stream request should fail");

    assert_eq!(
        error,
        TransportError::RequestFailed {
            status: Some(404),
            detail: "Chat not found".to_owned(),
        }
    );
    server.shutdown();
}

#[tokio::test]
async fn exchange_integration_connection_reset_fails_request() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![
        response_json(200, r#"{"session_id":1}"#),
        ScriptedResponse::Reset,
    ])
    .await;

    let error = timeout(
        Duration::from_secs(5),
        transport(server.client()).send("hi", &CancellationToken::new(), |_| {}),
    )
    .await
    .expect("reset should resolve")
    .expect_err("reset should fail");

    assert!(matches!(
        error,
        TransportError::RequestFailed { status: None, .. }
    ));
    server.shutdown();
}

#[tokio::test]
async fn exchange_integration_cancellation_during_stream() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![
        response_json(200, r#"{"session_id":1}"#),
        ScriptedResponse::Respond {
            status: 200,
            content_type: "text/event-stream",
            chunks: vec![
                ResponseChunk {
                    delay_ms: 0,
                    bytes: frame("delta", r#"{"text":"stream"}"#),
                },
                ResponseChunk {
                    delay_ms: 400,
                    bytes: frame("done", "{}"),
                },
            ],
        },
    ])
    .await;

    let client = transport(server.client());
    let cancel = CancellationToken::new();
    let exchange = tokio::spawn({
        let cancel = cancel.clone();
        async move { client.send("hi", &cancel, |_| {}).await }
    });

    sleep(Duration::from_millis(150)).await;
    cancel.cancel();

    let error = timeout(Duration::from_secs(5), exchange)
        .await
        .expect("exchange should resolve")
        .expect("join handle should resolve")
        .expect_err("cancellation should abort stream");

    assert_eq!(
        error,
        TransportError::Cancelled {
            partial: "stream".to_owned()
        }
    );
    server.shutdown();
}

#[tokio::test]
async fn completion_integration_extracts_reply() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![response_json(
        200,
        r#"{"data":{"answer":"Available models: gpt-4o"}}"#,
    )])
    .await;

    let reply = server
        .client()
        .complete(&SessionId::Numeric(5), "Which models?")
        .await
        .expect("completion should succeed");

    assert_eq!(reply, "Available models: gpt-4o");
    assert_eq!(
        server.request_lines(),
        vec!["POST /api/chats/5/messages HTTP/1.1".to_owned()]
    );
    server.shutdown();
}

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Error",
    }
}

async fn serve_one(
    mut socket: TcpStream,
    scripts: Arc<Vec<ScriptedResponse>>,
    request_count: Arc<AtomicUsize>,
    request_lines: Arc<Mutex<Vec<String>>>,
) {
    let request = match read_request_headers(&mut socket).await {
        Ok(request) => request,
        Err(_) => return,
    };
    if let Some(line) = String::from_utf8_lossy(&request).lines().next() {
        request_lines
            .lock()
            .expect("request lines")
            .push(line.to_owned());
    }

    let index = request_count.fetch_add(1, Ordering::AcqRel);
    let response = scripts
        .get(index)
        .cloned()
        .unwrap_or_else(|| response_json(500, r#"{"error":"unexpected request"}"#));

    match response {
        ScriptedResponse::Reset => {}
        ScriptedResponse::Respond {
            status,
            content_type,
            chunks,
        } => {
            let headers = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: {}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
                status_reason(status),
                content_type,
            );

            if socket.write_all(headers.as_bytes()).await.is_err() {
                return;
            }

            for chunk in chunks {
                if chunk.delay_ms > 0 {
                    sleep(Duration::from_millis(chunk.delay_ms)).await;
                }
                let prefix = format!("{:X}\r\n", chunk.bytes.len());
                if socket.write_all(prefix.as_bytes()).await.is_err() {
                    return;
                }
                if socket.write_all(&chunk.bytes).await.is_err() {
                    return;
                }
                if socket.write_all(b"\r\n").await.is_err() {
                    return;
                }
            }

            let _ = socket.write_all(b"0\r\n\r\n").await;
            let _ = socket.shutdown().await;
        }
    }
}

async fn read_request_headers(socket: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut request = Vec::new();
    let mut buffer = [0_u8; 2048];

    loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Ok(request);
        }
        request.extend_from_slice(&buffer[..n]);
        if request.windows(4).any(|window| window == b"\r\n\r\n") {
            return Ok(request);
        }
    }
}
