//! HTTP surface: the chat page at `/` and the WebSocket endpoint at `/ws`.

use axum::{routing::get, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::{services::ServeFile, trace::TraceLayer};

use crate::state::AppState;
use crate::ws;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the application router
pub fn router(state: Arc<AppState>, index_html: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(index_html))
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app(index_html: &Path) -> Router {
        let (state, _engine) = AppState::new(&ServerConfig::default());
        router(Arc::new(state), index_html)
    }

    #[tokio::test]
    async fn test_serves_index_page() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.html");
        std::fs::write(&index, "<html><body>chat</body></html>").unwrap();

        let response = app(&index)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/html");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<html><body>chat</body></html>");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.html");
        std::fs::write(&index, "x").unwrap();

        let response = app(&index)
            .oneshot(Request::builder().uri("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.html");
        std::fs::write(&index, "x").unwrap();

        let response = app(&index)
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
