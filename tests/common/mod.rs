//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use pdf_relay::relay::{ReqwestUpstream, Upstream, UpstreamError, UpstreamResponse};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

pub const SCOPED_PDF: &str = "https://cdn.sanity.io/files/qnuj1c4o/production/test.pdf";

/// Percent-encode `target` into a relay request path.
#[allow(dead_code)]
pub fn relay_path(target: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("/api/pdf?url={}", encoded)
}

/// A canned upstream reply.
#[derive(Clone, Debug)]
pub struct MockReply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl MockReply {
    pub fn new(status: u16) -> Self {
        Self { status, headers: Vec::new(), body: Vec::new() }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// A well-formed PDF reply whose content-length matches its body.
    pub fn pdf(body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self::new(200)
            .header("content-type", "application/pdf")
            .header("content-length", body.len().to_string())
            .body(body)
    }
}

/// In-process upstream that records every fetch.
#[allow(dead_code)]
pub struct RecordingUpstream {
    reply: Mutex<Result<MockReply, String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingUpstream {
    pub fn replying(reply: MockReply) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Ok(reply)),
            delay: None,
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Err(message.to_string())),
            delay: None,
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(reply: MockReply, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Ok(reply)),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for RecordingUpstream {
    async fn fetch(&self, url: &Url) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.reply.lock().unwrap().clone();
        let reply = reply.map_err(|msg| UpstreamError::transport(msg))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &reply.headers {
            headers.append(*name, HeaderValue::from_str(value).unwrap());
        }

        Ok(UpstreamResponse {
            status: StatusCode::from_u16(reply.status).unwrap(),
            headers,
            body: Body::from(reply.body),
        })
    }
}

/// Sends every fetch to a local plain-HTTP backend, keeping the path and
/// query, through the production `reqwest` upstream.
#[allow(dead_code)]
pub struct LoopbackUpstream {
    backend: SocketAddr,
    inner: ReqwestUpstream,
}

#[allow(dead_code)]
impl LoopbackUpstream {
    pub fn new(backend: SocketAddr) -> Arc<Self> {
        Arc::new(Self {
            backend,
            inner: ReqwestUpstream::new(Duration::from_secs(2)).unwrap(),
        })
    }
}

#[async_trait]
impl Upstream for LoopbackUpstream {
    async fn fetch(&self, url: &Url) -> Result<UpstreamResponse, UpstreamError> {
        let mut local = Url::parse(&format!("http://{}", self.backend)).unwrap();
        local.set_path(url.path());
        local.set_query(url.query());
        self.inner.fetch(&local).await
    }
}

#[allow(dead_code)]
fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        307 => "Temporary Redirect",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Start a raw TCP backend that answers each connection with `f()`.
///
/// Headers are written exactly as given; nothing is added, so a reply
/// without `content-length` is delimited by connection close.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockReply> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Drain the request head before answering.
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let reply = f().await;
                        let mut head = format!("HTTP/1.1 {} {}\r\n", reply.status, status_text(reply.status));
                        for (name, value) in &reply.headers {
                            head.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        head.push_str("Connection: close\r\n\r\n");

                        let _ = socket.write_all(head.as_bytes()).await;
                        let _ = socket.write_all(&reply.body).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that always answers with the same reply.
#[allow(dead_code)]
pub async fn start_mock_backend(reply: MockReply) -> SocketAddr {
    start_programmable_backend(move || {
        let reply = reply.clone();
        async move { reply }
    })
    .await
}
