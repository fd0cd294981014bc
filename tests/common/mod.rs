//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::Response;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use resilient_call::config::EngineConfig;
use resilient_call::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// What a scripted endpoint does with one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    WithHeaders(u16, Vec<(&'static str, String)>),
    Fail(TransportError),
    /// Respond after a delay.
    Slow(Duration, u16),
    /// Never respond.
    Hang,
}

impl Reply {
    pub fn retry_after(status: u16, seconds: &str) -> Self {
        Reply::WithHeaders(status, vec![("retry-after", seconds.to_string())])
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Reply::WithHeaders(status, vec![("location", location.to_string())])
    }
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, VecDeque<Reply>>,
    requests: Vec<String>,
}

/// In-memory transport keyed by URL authority (`host:port`).
///
/// Each authority plays its replies in order and then repeats the last one.
/// Unknown authorities fail to connect.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, authority: &str, replies: Vec<Reply>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(authority.to_string(), replies.into());
        self
    }

    /// Full URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn hits(&self, authority: &str) -> usize {
        let needle = format!("//{}/", authority);
        self.requests().iter().filter(|url| url.contains(&needle)).count()
    }

    /// Highest number of concurrently executing requests observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_reply(&self, request: &HttpRequest) -> Reply {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.uri().to_string());

        let authority = request
            .uri()
            .authority()
            .map(|a| a.as_str().to_string())
            .unwrap_or_default();
        match script.replies.get_mut(&authority) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Reply::Fail(TransportError::Connect(format!("no route to {}", authority))),
        }
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn build(status: u16, headers: &[(&'static str, String)]) -> HttpResponse {
    let mut builder = Response::builder().status(status);
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    builder.body(Bytes::from_static(b"scripted")).unwrap()
}

impl Transport for ScriptedTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let reply = self.next_reply(&request);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        let guard = InFlight(self.in_flight.clone());

        async move {
            let _guard = guard;
            match reply {
                Reply::Status(status) => Ok(build(status, &[])),
                Reply::WithHeaders(status, headers) => Ok(build(status, &headers)),
                Reply::Fail(error) => Err(error),
                Reply::Slow(delay, status) => {
                    tokio::time::sleep(delay).await;
                    Ok(build(status, &[]))
                }
                Reply::Hang => std::future::pending().await,
            }
        }
    }
}

/// Config with `n` endpoints named `node-0:8080` .. and fast, jitter-free retries.
pub fn config(n: usize) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.service = "test".into();
    config.endpoints = (0..n).map(|i| format!("http://node-{}:8080", i)).collect();
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 100;
    config.retries.jitter = false;
    config
}

/// Start a programmable mock backend on an ephemeral port.
///
/// The closure returns status, extra headers and body for each connection.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Vec<(&'static str, String)>, String)> + Send + 'static,
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
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let (status, headers, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            302 => "302 Found",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let extra: String = headers
                            .iter()
                            .map(|(name, value)| format!("{}: {}\r\n", name, value))
                            .collect();

                        let response_str = format!(
                            "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            extra,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Bind and immediately drop a listener, yielding an address nobody serves.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
