// Shared helpers for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub use headline_aggregator::{FetchConfig, NewsItem, Source};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// How the test server answers one path.
#[derive(Clone)]
pub enum Route {
    Page { status: u16, body: String },
    /// Answer with `body` after `delay`.
    Slow { delay: Duration, body: String },
    /// Answer 200 with `body` split into `chunk_size` pieces and no Content-Length.
    Chunked { body: String, chunk_size: usize },
    /// Accept the request and never answer.
    Hang,
}

impl Route {
    pub fn html(body: &str) -> Self {
        Route::Page { status: 200, body: body.to_string() }
    }

    pub fn status(status: u16) -> Self {
        Route::Page { status, body: String::new() }
    }
}

/// A minimal HTTP/1.1 server on loopback serving canned pages.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(routes: Vec<(&str, Route)>) -> Self {
        let routes: Arc<HashMap<String, Route>> =
            Arc::new(routes.into_iter().map(|(path, route)| (path.to_string(), route)).collect());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("test server address");

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = routes.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, routes).await;
                });
            }
        });

        Self { addr, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(mut stream: TcpStream, routes: Arc<HashMap<String, Route>>) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }

    let request = String::from_utf8_lossy(&request);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let (status, body) = match routes.get(&path).cloned() {
        Some(Route::Page { status, body }) => (status, body),
        Some(Route::Slow { delay, body }) => {
            tokio::time::sleep(delay).await;
            (200, body)
        }
        Some(Route::Chunked { body, chunk_size }) => {
            let head = "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            stream.write_all(head.as_bytes()).await?;
            for piece in body.as_bytes().chunks(chunk_size.max(1)) {
                stream.write_all(format!("{:x}\r\n", piece.len()).as_bytes()).await?;
                stream.write_all(piece).await?;
                stream.write_all(b"\r\n").await?;
            }
            stream.write_all(b"0\r\n\r\n").await?;
            return stream.shutdown().await;
        }
        Some(Route::Hang) => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return Ok(());
        }
        None => (404, String::new()),
    };

    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// A loopback URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{}/", addr)
}

/// Fetch settings with a short timeout so hanging routes fail fast.
pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        user_agent: "headline-aggregator-test/1.0".to_string(),
        timeout: Duration::from_secs(1),
        ..FetchConfig::default()
    }
}

/// A headline page padded with filler markup to at least `min_len` bytes.
pub fn padded_page(links: &[(&str, &str)], min_len: usize) -> String {
    let mut page = headline_page(links);
    while page.len() < min_len {
        page.push_str("<!-- filler -->");
    }
    page
}

pub fn headline_page(links: &[(&str, &str)]) -> String {
    let items: String = links
        .iter()
        .map(|(href, title)| format!("<li class=\"story\"><a href=\"{}\">{}</a></li>\n", href, title))
        .collect();
    format!("<html><body><nav><a href=\"/home\">Home</a></nav><ul>\n{}</ul></body></html>", items)
}
