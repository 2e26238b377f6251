// tests/dev_server.rs

use std::sync::Arc;

use assetflow::server::{CLIENT_PATH, DevServer, EVENTS_PATH, ReloadHub};
use assetflow::watch::ReloadNotifier;
use assetflow_test_utils::{init_tracing, with_timeout, write_file};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

struct Running {
    addr: std::net::SocketAddr,
    hub: Arc<ReloadHub>,
    stop: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

async fn start(root: &std::path::Path) -> Running {
    init_tracing();
    let hub = Arc::new(ReloadHub::default());
    let server = DevServer::bind("127.0.0.1", 0, root, Arc::clone(&hub)).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run(async move {
        let _ = stopped.await;
    }));
    Running { addr, hub, stop, handle }
}

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Read from `stream` until the accumulated text contains `needle`.
async fn read_until(stream: &mut TcpStream, buf: &mut String, needle: &str) {
    let mut chunk = [0u8; 1024];
    while !buf.contains(needle) {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before {needle:?}; got {buf}");
        buf.push_str(&String::from_utf8_lossy(&chunk[..n]));
    }
}

#[tokio::test]
async fn html_pages_get_the_reload_client() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "index.html", "<html><body><h1>home</h1></body></html>");
    write_file(dir.path(), "css/bundle.css", "body{}");
    let server = start(dir.path()).await;

    let page = with_timeout(get(server.addr, "/")).await;
    assert!(page.starts_with("HTTP/1.1 200"), "{page}");
    let script = format!("<h1>home</h1><script src=\"{CLIENT_PATH}\"></script></body>");
    assert!(page.contains(&script), "{page}");

    let css = with_timeout(get(server.addr, "/css/bundle.css")).await;
    assert!(css.ends_with("body{}"), "{css}");
    assert!(!css.contains("<script"), "{css}");

    let client = with_timeout(get(server.addr, CLIENT_PATH)).await;
    assert!(client.contains(EVENTS_PATH), "{client}");

    server.stop.send(()).unwrap();
    with_timeout(server.handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_files_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(dir.path()).await;

    let response = with_timeout(get(server.addr, "/nope.html")).await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");

    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn reloads_are_pushed_to_connected_browsers() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(dir.path()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let request = format!("GET {EVENTS_PATH} HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut seen = String::new();
    with_timeout(read_until(&mut stream, &mut seen, "event: connected")).await;
    assert!(seen.contains("text/event-stream"), "{seen}");
    assert_eq!(server.hub.clients(), 1);

    server.hub.notify_reload("styles");
    with_timeout(read_until(&mut stream, &mut seen, "data: styles")).await;
    assert!(seen.contains("event: reload"), "{seen}");
    assert!(seen.contains("id: 1"), "{seen}");

    server.stop.send(()).unwrap();
}

fn split_response(raw: &str) -> (&str, &str) {
    raw.split_once("\r\n\r\n").unwrap_or((raw, ""))
}

fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

#[tokio::test]
async fn oversized_pages_are_served_unmodified() {
    let dir = tempfile::tempdir().unwrap();
    let filler = "x".repeat(17 * 1024 * 1024);
    let page = format!("<html><body>{filler}</body></html>");
    write_file(dir.path(), "big.html", &page);
    let server = start(dir.path()).await;

    let response = with_timeout(get(server.addr, "/big.html")).await;
    let (head, body) = split_response(&response);
    assert!(head.starts_with("HTTP/1.1 200"), "{head}");
    assert_eq!(body.len(), page.len());
    assert!(!body.contains("<script"));

    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn head_requests_keep_the_file_length() {
    let dir = tempfile::tempdir().unwrap();
    let page = "<html><body><h1>home</h1></body></html>";
    write_file(dir.path(), "index.html", page);
    let server = start(dir.path()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"HEAD /index.html HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = Vec::new();
    with_timeout(stream.read_to_end(&mut raw)).await.unwrap();
    let response = String::from_utf8_lossy(&raw);

    let (head, body) = split_response(&response);
    assert!(head.starts_with("HTTP/1.1 200"), "{head}");
    let expected = page.len().to_string();
    assert_eq!(header(head, "content-length"), Some(expected.as_str()));
    assert!(body.is_empty(), "{body}");

    server.stop.send(()).unwrap();
}
