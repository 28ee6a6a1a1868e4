//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use campus_gateway::auth::{Claims, Role};
use campus_gateway::config::{GatewayConfig, RouteConfig};
use campus_gateway::{GatewayServer, Shutdown};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const SECRET: &str = "integration-secret";

/// What a mock backend saw.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Canned response for a mock backend.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: &'static str,
    pub delay: Duration,
}

impl MockResponse {
    pub fn json(body: &'static str) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body,
            delay: Duration::ZERO,
        }
    }

    #[allow(dead_code)]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
    seen: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.seen.lock().unwrap().last().cloned()
    }
}

/// Start a mock backend on an ephemeral port that answers every request
/// with `response` and records what it received.
pub async fn start_mock_backend(response: MockResponse) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = MockBackend {
        addr: listener.local_addr().unwrap(),
        calls: Arc::new(AtomicU32::new(0)),
        seen: Arc::new(Mutex::new(Vec::new())),
    };

    let state = backend.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let state = state.clone();
                    let response = response.clone();
                    tokio::spawn(async move {
                        handle_connection(socket, state, response).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    backend
}

async fn handle_connection(mut socket: TcpStream, state: MockBackend, response: MockResponse) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = find_head_end(&buf) {
            break pos;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }

    state.calls.fetch_add(1, Ordering::SeqCst);
    state.seen.lock().unwrap().push(RecordedRequest {
        method,
        target,
        headers,
        body,
    });

    tokio::time::sleep(response.delay).await;

    let status_text = match response.status {
        200 => "200 OK",
        201 => "201 Created",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        _ => "200 OK",
    };
    let raw = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        response.content_type,
        response.body.len(),
        response.body
    );
    let _ = socket.write_all(raw.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// A route pointing at `upstream`.
pub fn route(name: &str, prefix: &str, upstream: &str, auth_required: bool) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        path_prefix: prefix.into(),
        upstream: upstream.into(),
        upstream_env: None,
        strip_prefix: true,
        auth_required,
        timeout_secs: None,
    }
}

/// Gateway config with the test secret and the given routes.
pub fn gateway_config(routes: Vec<RouteConfig>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.secret = SECRET.into();
    config.routes = routes;
    config
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let (addr, shutdown, _) = spawn_gateway(config).await;
    (addr, shutdown)
}

/// Like [`start_gateway`], also returning the handle of the serving task.
pub async fn spawn_gateway(
    config: GatewayConfig,
) -> (SocketAddr, Shutdown, JoinHandle<std::io::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    (addr, shutdown, handle)
}

/// An upstream that reads one request and never answers.
#[allow(dead_code)]
pub struct HangingBackend {
    pub addr: SocketAddr,
    /// Fires once the request head has arrived.
    pub arrived: oneshot::Receiver<()>,
    /// Fires when the gateway closes the connection.
    pub closed: oneshot::Receiver<()>,
}

#[allow(dead_code)]
impl HangingBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

#[allow(dead_code)]
pub async fn start_hanging_backend() -> HangingBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (arrived_tx, arrived) = oneshot::channel();
    let (closed_tx, closed) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let mut arrived_tx = Some(arrived_tx);
        loop {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if find_head_end(&buf).is_some() {
                        if let Some(tx) = arrived_tx.take() {
                            let _ = tx.send(());
                        }
                    }
                }
            }
        }
        let _ = closed_tx.send(());
    });

    HangingBackend {
        addr,
        arrived,
        closed,
    }
}

/// Write a raw GET with a bearer token and return the open socket.
#[allow(dead_code)]
pub async fn send_raw_get(gateway: SocketAddr, path: &str, token: &str) -> TcpStream {
    let mut socket = TcpStream::connect(gateway).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nAuthorization: Bearer {}\r\n\r\n",
        path, gateway, token
    );
    socket.write_all(request.as_bytes()).await.unwrap();
    socket
}

/// Sign a token with `secret` that expires `exp_offset` seconds from now.
#[allow(dead_code)]
pub fn mint_token(secret: &str, exp_offset: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "student-42".into(),
        iss: "auth".into(),
        iat: now - 30,
        exp: now + exp_offset,
        role: Role::Student,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
