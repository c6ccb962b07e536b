//! Canned-response HTTP server for exercising the Elasticsearch client

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One canned response, matched on method and path
#[derive(Clone)]
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Route {
    pub fn new(method: &'static str, path: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self {
            method,
            path,
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// Answer only after `delay`
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request as the server saw it
#[derive(Debug, Clone)]
pub struct Received {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Received {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Running stub; unmatched requests get `404 {}`
pub struct StubServer {
    pub url: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl StubServer {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let url = format!("http://{}", listener.local_addr().expect("stub address"));
        let received = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let log = received.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let _ = answer(socket, &routes, &log).await;
                });
            }
        });

        Self { url, received }
    }

    /// `"METHOD /path"` of every request so far
    pub fn calls(&self) -> Vec<String> {
        self.received
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().clone()
    }
}

async fn answer(
    mut socket: TcpStream,
    routes: &[Route],
    log: &Mutex<Vec<Received>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_len = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_len]).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_len + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[head_len..]).into_owned();

    let route = routes
        .iter()
        .find(|r| r.method == method && r.path == path)
        .cloned()
        .unwrap_or_else(|| Route::new("", "", 404, "{}"));
    log.lock().push(Received {
        method: method.clone(),
        path,
        headers,
        body,
    });

    tokio::time::sleep(route.delay).await;
    let payload = if method == "HEAD" { "" } else { route.body.as_str() };
    let response = format!(
        "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        route.status,
        payload.len(),
        payload
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}
