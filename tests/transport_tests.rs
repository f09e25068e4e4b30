//! Tests for the streaming transport against an in-process WebSocket server.

mod common;

use std::time::Duration;

use common::RecordingNotifier;
use futures::{SinkExt, StreamExt};
use parlor::config::ClientConfig;
use parlor::transport::{Transport, TransportEvent, TransportState};
use parlor::types::{InboundFrame, Role};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

async fn config_for(listener: &TcpListener) -> ClientConfig {
    let port = listener.local_addr().unwrap().port();
    let mut config = ClientConfig::new(format!("http://127.0.0.1:{port}")).unwrap();
    config.reconnect_delay = Duration::from_millis(50);
    config
}

async fn wait_for_open(transport: &Transport) {
    timeout(WAIT, async {
        while transport.state() != TransportState::Open {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("transport should open");
}

#[tokio::test]
async fn streams_a_turn_and_signals_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = config_for(&listener).await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        // The client's outbound frame arrives as sent.
        let outbound = ws.next().await.unwrap().unwrap();
        let value: serde_json::Value =
            serde_json::from_str(outbound.to_text().unwrap()).unwrap();
        assert_eq!(value["conversation_id"], "c1");
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "question");

        for chunk in ["ans", "wer"] {
            ws.send(Message::Text(
                format!(r#"{{"type":"stream","content":"{chunk}"}}"#),
            ))
            .await
            .unwrap();
        }
        ws.send(Message::Text(r#"{"type":"done"}"#.to_string()))
            .await
            .unwrap();
        // Dropping the socket closes the connection.
    });

    let notifier = RecordingNotifier::new();
    let (mut transport, mut events) = Transport::connect(&config, notifier);
    wait_for_open(&transport).await;
    transport.send("c1", Role::User, "question").unwrap();

    let mut received = Vec::new();
    for _ in 0..4 {
        let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
        received.push(event);
    }
    assert_eq!(
        received,
        vec![
            TransportEvent::Frame(InboundFrame::Delta { content: "ans".into() }),
            TransportEvent::Frame(InboundFrame::Delta { content: "wer".into() }),
            TransportEvent::Frame(InboundFrame::Done { message: None }),
            TransportEvent::Disconnected,
        ]
    );

    server.await.unwrap();
    transport.dispose();
}

#[tokio::test]
async fn reconnects_after_the_fixed_delay() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = config_for(&listener).await;

    let server = tokio::spawn(async move {
        // First connection: accept and immediately drop.
        let (stream, _) = listener.accept().await.unwrap();
        drop(accept_async(stream).await.unwrap());
        // The client comes back on its own.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(
            r#"{"type":"stream","content":"back"}"#.to_string(),
        ))
        .await
        .unwrap();
        // Hold the socket open until the client has seen the frame.
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let notifier = RecordingNotifier::new();
    let (mut transport, mut events) = Transport::connect(&config, notifier);

    let got = timeout(WAIT, async {
        loop {
            match events.recv().await {
                Some(TransportEvent::Frame(InboundFrame::Delta { content })) => break content,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(got, "back");

    server.await.unwrap();
    transport.dispose();
}

#[tokio::test]
async fn unparseable_frames_are_dropped_silently() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = config_for(&listener).await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text("this is not json".to_string()))
            .await
            .unwrap();
        ws.send(Message::Text(r#"{"error":"model unavailable"}"#.to_string()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let notifier = RecordingNotifier::new();
    let (mut transport, mut events) = Transport::connect(&config, notifier.clone());

    // The first event to arrive is the error frame; the garbage before it
    // never surfaces.
    let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(
        event,
        TransportEvent::Frame(InboundFrame::ServerError {
            message: "model unavailable".into()
        })
    );
    assert!(notifier.notices().is_empty(), "parse failures are log-only");

    server.await.unwrap();
    transport.dispose();
}

#[tokio::test]
async fn send_before_open_is_refused() {
    // Nothing is listening; the transport stays in the retry loop.
    let mut config = ClientConfig::new("http://127.0.0.1:9").unwrap();
    config.reconnect_delay = Duration::from_millis(50);

    let notifier = RecordingNotifier::new();
    let (mut transport, _events) = Transport::connect(&config, notifier);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(transport.send("c1", Role::User, "hello").is_err());
    transport.dispose();
}
