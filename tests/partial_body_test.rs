//! Collectors that close the connection instead of framing their error body.
//!
//! These talk raw HTTP/1.1 over a `TcpListener` because a well-behaved mock
//! server always sets `Content-Length`.

use bytes::Bytes;
use cowrie_http_sink::sender::{CollectorReport, DeliveryOutcome, HttpClient, Transport};
use cowrie_http_sink::{ClientConfig, EndpointConfig, Forwarder};
use reqwest::StatusCode;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const BODY: &str = r#"{"text":"bad request"}"#;

/// Accepts one connection, consumes the request, writes `response` verbatim
/// and closes the socket.
async fn serve_once(response: String) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    addr
}

async fn read_request(socket: &mut TcpStream) {
    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        received.extend_from_slice(&chunk[..n]);

        let Some(head_end) = received.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&received[..head_end]).to_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        if received.len() >= head_end + 4 + body_len {
            return;
        }
    }
}

fn transport(addr: SocketAddr) -> Transport {
    let client = HttpClient::new(ClientConfig {
        timeout: Duration::from_secs(5),
        connection_timeout: Duration::from_secs(2),
        ..Default::default()
    })
    .unwrap();
    Transport::new(client, &EndpointConfig::new(format!("http://{addr}/events")))
}

#[tokio::test]
async fn test_body_without_length_read_until_close() {
    let addr = serve_once(format!(
        "HTTP/1.1 500 Internal Server Error\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{BODY}"
    ))
    .await;

    let outcome = transport(addr).deliver(Bytes::from_static(b"{}")).await;

    assert_eq!(outcome.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(
        outcome.report(),
        Some(&CollectorReport::Text("bad request".to_string()))
    );
}

#[tokio::test]
async fn test_truncated_body_is_recovered() {
    // Declares far more than it sends, then hangs up.
    let addr = serve_once(format!(
        "HTTP/1.1 400 Bad Request\r\nContent-Type: application/json\r\nContent-Length: 512\r\n\r\n{BODY}"
    ))
    .await;

    let transport = transport(addr);
    let outcome = transport.deliver(Bytes::from_static(b"{}")).await;

    match outcome {
        DeliveryOutcome::PartialBodyError { status, report, .. } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(report.text(), Some("bad request"));
        }
        other => panic!("Expected PartialBodyError, got {other:?}"),
    }
    assert_eq!(transport.stats().partial_bodies, 1);
}

#[tokio::test]
async fn test_truncated_body_through_forwarder() {
    let addr = serve_once(format!(
        "HTTP/1.1 502 Bad Gateway\r\nContent-Length: 4096\r\n\r\n{BODY}"
    ))
    .await;

    let forwarder = Forwarder::new(
        EndpointConfig::new(format!("http://{addr}/events")),
        ClientConfig::default(),
    )
    .unwrap();

    let handle = forwarder
        .submit(&json!({"eventid": "cowrie.session.file_download"}))
        .unwrap();
    let outcome = handle.outcome().await.unwrap();

    assert!(matches!(outcome, DeliveryOutcome::PartialBodyError { .. }));
    assert_eq!(
        outcome.report().and_then(CollectorReport::text),
        Some("bad request")
    );
}
