// src/server/mod.rs

//! Dev server for watch mode.
//!
//! Serves the public root as static files, injects a small reload client into
//! every HTML response and pushes reload notifications over Server-Sent
//! Events.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::stream::Stream;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

pub mod reload;

pub use reload::{ReloadEvent, ReloadHub};

pub const EVENTS_PATH: &str = "/__assetflow/events";
pub const CLIENT_PATH: &str = "/__assetflow/client.js";

/// HTML pages declaring a larger `Content-Length` are served without the
/// reload client.
const MAX_HTML_BYTES: usize = 16 * 1024 * 1024;

const CLIENT_JS: &str = r#"(function () {
  var source = new EventSource("/__assetflow/events");
  source.addEventListener("reload", function () {
    window.location.reload();
  });
})();
"#;

/// Build the dev-server router for `public_root`.
pub fn router(public_root: impl Into<PathBuf>, hub: Arc<ReloadHub>) -> Router {
    let files = ServeDir::new(public_root.into()).append_index_html_on_directories(true);

    Router::new()
        .route(EVENTS_PATH, get(reload_events))
        .route(CLIENT_PATH, get(client_script))
        .fallback_service(files)
        .layer(middleware::from_fn(inject_reload_client))
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

/// A bound, not yet serving, dev server.
#[derive(Debug)]
pub struct DevServer {
    listener: TcpListener,
    public_root: PathBuf,
    hub: Arc<ReloadHub>,
}

impl DevServer {
    pub async fn bind(host: &str, port: u16, public_root: impl Into<PathBuf>, hub: Arc<ReloadHub>) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("binding dev server to {host}:{port}"))?;
        Ok(Self {
            listener,
            public_root: public_root.into(),
            hub,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!(url = %format!("http://{addr}/"), root = %self.public_root.display(), "dev server listening");

        let app = router(self.public_root, self.hub);
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("dev server failed")?;

        info!("dev server stopped");
        Ok(())
    }
}

async fn reload_events(State(hub): State<Arc<ReloadHub>>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = hub.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("assetflow"));

        loop {
            match rx.recv().await {
                Ok(ev) => {
                    yield Ok(Event::default().event("reload").id(ev.seq.to_string()).data(ev.reason));
                }
                // Missed notifications still mean the page is stale.
                Err(RecvError::Lagged(_)) => {
                    yield Ok(Event::default().event("reload").data("lagged"));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}

async fn client_script() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/javascript; charset=utf-8")], CLIENT_JS)
}

async fn inject_reload_client(req: Request, next: Next) -> Response {
    let is_head = req.method() == Method::HEAD;
    let response = next.run(req).await;

    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    if is_head || !is_html || response.status() != StatusCode::OK {
        return response;
    }
    if declared_length(&response).is_some_and(|len| len > MAX_HTML_BYTES) {
        debug!("html page over {MAX_HTML_BYTES} bytes, served without reload client");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_HTML_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("could not buffer html response: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "failed to read page").into_response();
        }
    };

    let page = inject_script(&bytes);
    parts.headers.remove(CONTENT_LENGTH);
    if let Ok(len) = HeaderValue::from_str(&page.len().to_string()) {
        parts.headers.insert(CONTENT_LENGTH, len);
    }
    Response::from_parts(parts, Body::from(page))
}

fn declared_length(response: &Response) -> Option<usize> {
    response
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Insert the reload client tag before the last `</body>`, or append it.
pub fn inject_script(html: &[u8]) -> Vec<u8> {
    let tag = format!("<script src=\"{CLIENT_PATH}\"></script>");
    let lower = html.to_ascii_lowercase();
    let needle = b"</body>";

    let at = lower
        .windows(needle.len())
        .rposition(|w| w == needle)
        .unwrap_or(html.len());

    let mut out = Vec::with_capacity(html.len() + tag.len());
    out.extend_from_slice(&html[..at]);
    out.extend_from_slice(tag.as_bytes());
    out.extend_from_slice(&html[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_goes_before_closing_body() {
        let page = inject_script(b"<html><BODY><p>hi</p></BODY></html>");
        assert_eq!(
            String::from_utf8(page).unwrap(),
            "<html><BODY><p>hi</p><script src=\"/__assetflow/client.js\"></script></BODY></html>"
        );
    }

    #[test]
    fn fragment_without_body_gets_script_appended() {
        let page = inject_script(b"<p>partial</p>");
        assert!(String::from_utf8(page).unwrap().ends_with("client.js\"></script>"));
    }
}
