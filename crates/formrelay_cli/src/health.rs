//! Always-OK HTTP listener for the hosting platform's health check.
//!
//! Shares nothing with the bot; it only proves the process is alive.

use axum::{routing::get, Router};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::{error, info};

pub const HEALTH_BODY: &str = "Health Check OK";

pub fn build_router() -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/*path", get(health_check))
}

async fn health_check() -> &'static str {
    HEALTH_BODY
}

/// Bind `addr` and serve the health check on a background task for the life of
/// the process.
pub async fn spawn(addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to bind health check on {addr}"))?;
    info!(addr = %addr, "Health check listening");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, build_router()).await {
            error!("Health check stopped: {e}");
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn get_body(uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::get(uri).body(Body::empty()).expect("request");
        let response = build_router().oneshot(request).await.expect("response");
        let status = response.status();
        let body = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn root_reports_ok() {
        let (status, body) = get_body("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, HEALTH_BODY.as_bytes());
    }

    #[tokio::test]
    async fn any_path_reports_ok() {
        let (status, body) = get_body("/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, HEALTH_BODY.as_bytes());

        let (status, _) = get_body("/deep/nested/path").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn spawned_listener_accepts_connections() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        spawn(&addr).await.unwrap();
        let stream = tokio::net::TcpStream::connect(&addr).await;
        assert!(stream.is_ok());
    }
}
