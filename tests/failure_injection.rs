//! Failure injection against real sockets, using the production `reqwest`
//! upstream pointed at local mock backends.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use pdf_relay::config::RelayServiceConfig;
use pdf_relay::http::HttpServer;
use pdf_relay::lifecycle::Shutdown;
use pdf_relay::relay::{RelayPolicy, ReqwestUpstream, Upstream};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

mod common;

use common::{relay_path, LoopbackUpstream, MockReply, SCOPED_PDF};

fn loopback_server(backend: SocketAddr, policy: RelayPolicy) -> HttpServer {
    HttpServer::with_policy(RelayServiceConfig::default(), policy, LoopbackUpstream::new(backend))
}

async fn relay_status(server: &HttpServer, target: &str) -> StatusCode {
    server
        .router()
        .oneshot(Request::get(relay_path(target)).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let followed = Arc::new(AtomicU32::new(0));
    let f = followed.clone();
    let decoy = common::start_programmable_backend(move || {
        let f = f.clone();
        async move {
            f.fetch_add(1, Ordering::SeqCst);
            MockReply::pdf(b"%PDF-decoy".to_vec())
        }
    })
    .await;

    let backend = common::start_mock_backend(
        MockReply::new(302)
            .header("location", format!("http://{}/files/qnuj1c4o/production/decoy.pdf", decoy))
            .header("content-length", "0"),
    )
    .await;

    // The raw client must hand back the 3xx untouched.
    let upstream = ReqwestUpstream::new(Duration::from_secs(2)).unwrap();
    let url = Url::parse(&format!("http://{}/files/qnuj1c4o/production/test.pdf", backend)).unwrap();
    let response = upstream.fetch(&url).await.unwrap();
    assert_eq!(response.status, StatusCode::FOUND);

    // And the gate must refuse it.
    let server = loopback_server(backend, RelayPolicy::default());
    assert_eq!(relay_status(&server, SCOPED_PDF).await, StatusCode::BAD_GATEWAY);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(followed.load(Ordering::SeqCst), 0, "redirect target must never be contacted");
}

#[tokio::test]
async fn test_hung_upstream_is_aborted() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = listener.local_addr().unwrap();
    let connection_closed = Arc::new(AtomicBool::new(false));
    let closed = connection_closed.clone();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;

        // Never answer; wait for the relay to hang up.
        let eof = tokio::time::timeout(Duration::from_secs(5), socket.read(&mut buf)).await;
        if matches!(eof, Ok(Ok(0)) | Ok(Err(_))) {
            closed.store(true, Ordering::SeqCst);
        }
    });

    let policy = RelayPolicy {
        fetch_timeout: Duration::from_millis(300),
        ..RelayPolicy::default()
    };
    let server = loopback_server(backend, policy);

    let started = Instant::now();
    assert_eq!(relay_status(&server, SCOPED_PDF).await, StatusCode::BAD_GATEWAY);
    assert!(started.elapsed() < Duration::from_secs(3), "timeout must bound the fetch");

    let deadline = Instant::now() + Duration::from_secs(3);
    while !connection_closed.load(Ordering::SeqCst) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(
        connection_closed.load(Ordering::SeqCst),
        "timed-out fetch must release the upstream connection"
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = listener.local_addr().unwrap();
    drop(listener);

    let server = loopback_server(backend, RelayPolicy::default());
    assert_eq!(relay_status(&server, SCOPED_PDF).await, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_close_delimited_body_is_rejected() {
    let backend = common::start_mock_backend(
        MockReply::new(200)
            .header("content-type", "application/pdf")
            .body(b"%PDF-1.7 no declared length".to_vec()),
    )
    .await;

    let server = loopback_server(backend, RelayPolicy::default());
    let res = server
        .router()
        .oneshot(Request::get(relay_path(SCOPED_PDF)).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Missing or invalid upstream content length");
}

#[tokio::test]
async fn test_oversized_declaration_is_rejected_before_body() {
    let backend = common::start_programmable_backend(|| async {
        MockReply::new(200)
            .header("content-type", "application/pdf")
            .header("content-length", (64 * 1024 * 1024).to_string())
            .body(b"%PDF".to_vec())
    })
    .await;

    let server = loopback_server(backend, RelayPolicy::default());
    assert_eq!(relay_status(&server, SCOPED_PDF).await, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_pdf_streams_end_to_end() {
    let payload: Vec<u8> = (0..256 * 1024u32).map(|i| (i % 253) as u8).collect();
    let backend = common::start_mock_backend(
        MockReply::pdf(payload.clone()).header("cache-control", "public, max-age=600"),
    )
    .await;

    let shutdown = Shutdown::new();
    let server = loopback_server(backend, RelayPolicy::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let relay_addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/api/pdf", relay_addr))
        .query(&[("url", "https://cdn.sanity.io/files/qnuj1c4o/production/annual report.pdf")])
        .send()
        .await
        .expect("relay unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/pdf");
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(res.headers()["cache-control"], "public, max-age=600");
    assert_eq!(res.headers()["content-length"], payload.len().to_string().as_str());
    assert_eq!(
        res.headers()["content-disposition"],
        "inline; filename=\"annual_20report.pdf\""
    );

    let body = res.bytes().await.unwrap();
    assert_eq!(body.len(), payload.len());
    assert!(body.as_ref() == payload.as_slice());

    shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_relays_are_independent() {
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    let backend = common::start_programmable_backend(move || {
        let h = h.clone();
        async move {
            let n = h.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                MockReply::pdf(vec![b'x'; 512])
            } else {
                MockReply::new(200)
                    .header("content-type", "text/html")
                    .header("content-length", "2")
                    .body("hi")
            }
        }
    })
    .await;

    let shutdown = Shutdown::new();
    let server = loopback_server(backend, RelayPolicy::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let relay_addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let client = client.clone();
        let url = format!("http://{}/api/pdf", relay_addr);
        tasks.push(tokio::spawn(async move {
            client.get(url).query(&[("url", SCOPED_PDF)]).send().await.map(|r| r.status().as_u16())
        }));
    }

    let mut ok = 0;
    let mut unsupported = 0;
    for task in tasks {
        match task.await.unwrap().unwrap() {
            200 => ok += 1,
            415 => unsupported += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(ok, 10);
    assert_eq!(unsupported, 10);
    assert_eq!(hits.load(Ordering::SeqCst), 20);

    shutdown.trigger();
}
