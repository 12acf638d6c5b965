use std::sync::Arc;
use std::time::Duration;

use assist_cli::chat::{describe_failure, ChatSession, Exchange};
use assist_mock::{MockBackend, StreamFailure};
use assist_transport::{
    CancellationToken, Completion, Role, SessionCoordinator, SessionId, TransportClient,
    TransportError,
};
use pretty_assertions::assert_eq;
use transcript_store::TranscriptStore;

fn chat(backend: MockBackend) -> (Arc<MockBackend>, ChatSession<Vec<u8>>) {
    let backend = Arc::new(backend);
    let client = TransportClient::new(
        Arc::new(SessionCoordinator::new(backend.clone())),
        backend.clone(),
    );
    (backend, ChatSession::new(client, Vec::new()))
}

fn output(chat: ChatSession<Vec<u8>>) -> String {
    String::from_utf8(chat.into_output()).expect("utf-8 output")
}

#[tokio::test]
async fn reply_deltas_are_echoed_then_terminated_by_newline() {
    let (_backend, mut chat) = chat(MockBackend::fixed(["Hel", "lo"]));

    let exchange = chat
        .exchange("hi", &CancellationToken::new())
        .await
        .expect("exchange should not hit I/O errors");

    match exchange {
        Exchange::Replied(reply) => {
            assert_eq!(reply.text, "Hello");
            assert_eq!(reply.completion, Completion::Done);
        }
        Exchange::Failed(error) => panic!("unexpected failure: {error}"),
    }
    assert_eq!(output(chat), "Hello\n");
}

#[tokio::test]
async fn transport_failures_are_reported_not_raised() {
    let (backend, mut chat) = chat(MockBackend::fixed(["Hel", "lo"]).with_stream_failure(
        StreamFailure::Rejected {
            status: 502,
            detail: "upstream down".to_string(),
        },
    ));

    let exchange = chat
        .exchange("hi", &CancellationToken::new())
        .await
        .expect("exchange should not hit I/O errors");

    assert!(matches!(
        exchange,
        Exchange::Failed(TransportError::RequestFailed {
            status: Some(502),
            ..
        })
    ));
    assert_eq!(backend.stream_calls(), 1);
    assert_eq!(
        output(chat),
        "[error] request failed (HTTP 502): upstream down\n"
    );
}

#[tokio::test]
async fn cancelled_exchange_keeps_partial_text_on_screen() {
    let (_backend, mut chat) = chat(
        MockBackend::fixed(["Hel", "lo", " there"]).with_chunk_delay(Duration::from_millis(60)),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(90)).await;
        trigger.cancel();
    });

    let exchange = chat
        .exchange("hi", &cancel)
        .await
        .expect("exchange should not hit I/O errors");

    match exchange {
        Exchange::Failed(TransportError::Cancelled { partial }) => assert_eq!(partial, "Hel"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(output(chat), "Hel\n[cancelled]\n");
}

#[tokio::test]
async fn transcript_records_both_sides_of_each_exchange() {
    let root = tempfile::tempdir().expect("tempdir should be created");
    let (_backend, chat) = chat(MockBackend::fixed(["Hel", "lo"]));
    let mut chat = chat.with_transcript_root(Some(root.path().to_path_buf()));
    let cancel = CancellationToken::new();

    chat.exchange("  first  ", &cancel)
        .await
        .expect("first exchange");
    chat.exchange("second", &cancel)
        .await
        .expect("second exchange");

    let path = chat
        .transcript()
        .expect("transcript should be created")
        .path()
        .to_path_buf();
    assert!(chat.session_summary().contains("session: 1"));

    let store = TranscriptStore::open(&path).expect("transcript should reopen");
    assert_eq!(store.session_id(), &SessionId::Numeric(1));
    let recorded: Vec<(Role, &str)> = store
        .messages()
        .iter()
        .map(|message| (message.role, message.content.as_str()))
        .collect();
    assert_eq!(
        recorded,
        vec![
            (Role::User, "first"),
            (Role::Assistant, "Hello"),
            (Role::User, "second"),
            (Role::Assistant, "Hello"),
        ]
    );
}

#[tokio::test]
async fn failed_session_creation_writes_no_transcript() {
    let root = tempfile::tempdir().expect("tempdir should be created");
    let (_backend, chat) = chat(MockBackend::fixed(["x"]).with_session_failures(1));
    let mut chat = chat.with_transcript_root(Some(root.path().to_path_buf()));

    let exchange = chat
        .exchange("hi", &CancellationToken::new())
        .await
        .expect("exchange should not hit I/O errors");

    assert!(matches!(
        exchange,
        Exchange::Failed(TransportError::Session(_))
    ));
    assert!(chat.transcript().is_none());
    assert!(TranscriptStore::latest_in(root.path()).is_err());
    assert_eq!(chat.session_summary(), "session: not started");
}

#[test]
fn cancellation_has_its_own_status_line() {
    assert_eq!(
        describe_failure(&TransportError::Cancelled {
            partial: String::new()
        }),
        "[cancelled]"
    );
    assert_eq!(
        describe_failure(&TransportError::EmptyMessage),
        "[error] message text is empty"
    );
}
