//! HTTP surface for the note store
//!
//! Three routes, JSON in and out. The server holds blobs and nothing else:
//! link keys live in URL fragments and never arrive here.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cinder_core::wire::{CreateNoteRequest, CreateReceipt, ErrorBody, NoteView, NOTES_PATH};
use cinder_store::{spawn_sweeper, NoteStore, StoreConfig, StoreError};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Envelope JSON around the blob itself
const BODY_SLACK_BYTES: usize = 4 * 1024;

/// Store error rendered as `{"error": ...}` with the matching status
struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

// Malformed, mistyped and oversized bodies are all bad requests to a client
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(StoreError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(store: Arc<NoteStore>) -> Router {
    let body_limit = store.config().max_blob_bytes + BODY_SLACK_BYTES;

    Router::new()
        .route(NOTES_PATH, post(create_note))
        .route(
            &format!("{NOTES_PATH}/:id"),
            get(read_note).delete(delete_note),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

async fn create_note(
    State(store): State<Arc<NoteStore>>,
    body: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateReceipt>), ApiError> {
    let Json(req) = body.map_err(|rejection| {
        tracing::warn!(status = %rejection.status(), "create body rejected");
        rejection
    })?;
    let receipt = store
        .create(
            &req.id,
            &req.blob,
            req.ttl_minutes,
            req.burn_after_read,
            req.max_views,
        )
        .map_err(|e| {
            tracing::warn!(error = %e, "create rejected");
            e
        })?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn read_note(
    State(store): State<Arc<NoteStore>>,
    Path(id): Path<String>,
) -> Result<Json<NoteView>, ApiError> {
    Ok(Json(store.read(&id)?))
}

async fn delete_note(State(store): State<Arc<NoteStore>>, Path(id): Path<String>) -> StatusCode {
    store.delete(&id);
    StatusCode::NO_CONTENT
}

/// Run the server until Ctrl-C, sweeping in the background.
pub async fn serve(addr: SocketAddr, config: StoreConfig) -> anyhow::Result<()> {
    let sweep_interval = config.sweep_interval;
    let store = Arc::new(NoteStore::new(config));
    let sweeper = spawn_sweeper(store.clone(), sweep_interval);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "cinder server listening");

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    tracing::info!("cinder server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use cinder_core::{HttpBackend, NoteError, NoteService, SendOptions, ShareLink};
    use cinder_store::ManualClock;
    use secrecy::SecretString;
    use std::time::Duration;
    use tower::ServiceExt;

    fn create_body(id: &str, burn: bool, max_views: Option<u32>) -> Body {
        let req = CreateNoteRequest {
            id: id.to_string(),
            blob: "opaque-blob".to_string(),
            ttl_minutes: 1.0,
            burn_after_read: burn,
            max_views,
        };
        Body::from(serde_json::to_vec(&req).unwrap())
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let resp = app.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_create_read_vault_over_http() {
        let app = router(Arc::new(NoteStore::default()));

        let (status, body) = send(&app, "POST", "/api/notes", create_body("http-vault", false, Some(2))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["remainingViews"], 2);

        let (status, body) = send(&app, "GET", "/api/notes/http-vault", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blob"], "opaque-blob");
        assert_eq!(body["remainingViews"], 1);

        let (status, _) = send(&app, "GET", "/api/notes/http-vault", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/api/notes/http-vault", Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Note not found");
    }

    #[tokio::test]
    async fn test_burn_receipt_has_null_views() {
        let app = router(Arc::new(NoteStore::default()));
        let (status, body) = send(&app, "POST", "/api/notes", create_body("http-burn", true, None)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["remainingViews"].is_null());
    }

    #[tokio::test]
    async fn test_validation_is_400_with_reason() {
        let app = router(Arc::new(NoteStore::default()));
        let (status, body) = send(&app, "POST", "/api/notes", create_body("tiny", true, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("id must be"));
    }

    #[tokio::test]
    async fn test_malformed_create_body_is_400_json() {
        let app = router(Arc::new(NoteStore::default()));

        for raw in [
            r#"{"id":"abcdef","blob":"x"}"#,
            r#"{"id":"abcdef","blob":"x","ttlMinutes":"ten"}"#,
            "not json at all",
        ] {
            let (status, body) = send(&app, "POST", "/api/notes", Body::from(raw)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{raw}");
            assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "{raw}");
        }
    }

    #[tokio::test]
    async fn test_oversized_create_body_is_400_json() {
        let app = router(Arc::new(NoteStore::default()));
        let blob = "a".repeat(StoreConfig::default().max_blob_bytes + 2 * BODY_SLACK_BYTES);
        let raw = format!(r#"{{"id":"abcdef","blob":"{blob}","ttlMinutes":1}}"#);

        let (status, body) = send(&app, "POST", "/api/notes", Body::from(raw)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_expired_is_410_then_404() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(NoteStore::with_clock(StoreConfig::default(), clock.clone()));
        let app = router(store);

        send(&app, "POST", "/api/notes", create_body("http-expire", false, Some(3))).await;
        clock.advance_minutes(2);

        let (status, _) = send(&app, "GET", "/api/notes/http-expire", Body::empty()).await;
        assert_eq!(status, StatusCode::GONE);
        let (status, _) = send(&app, "GET", "/api/notes/http-expire", Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_over_http() {
        let app = router(Arc::new(NoteStore::default()));
        send(&app, "POST", "/api/notes", create_body("http-del", true, None)).await;

        let (status, _) = send(&app, "DELETE", "/api/notes/http-del", Body::empty()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", "/api/notes/http-del", Body::empty()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", "/api/notes/http-del", Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_end_to_end_through_http_backend() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::new(NoteStore::default()));
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base = format!("http://{addr}");
        let backend = HttpBackend::new(&base, Duration::from_secs(5)).unwrap();
        let service = NoteService::new(backend, base.as_str());

        // Link mode, burn after read
        let sent = service.send("over the wire", SendOptions::default()).await.unwrap();
        let link = ShareLink::parse(&sent.link.to_url()).unwrap();
        let opened = service.open(&link, |_| None).await.unwrap();
        assert_eq!(opened.plaintext.as_str(), "over the wire");
        assert!(matches!(
            service.open(&link, |_| None).await,
            Err(NoteError::Store(StoreError::NotFound))
        ));

        // Password mode, two views
        let options = SendOptions::default()
            .with_password(SecretString::new("pw".to_string()))
            .with_views(2);
        let sent = service.send("guarded", options).await.unwrap();
        let opened = service
            .open(&sent.link, |_| Some(SecretString::new("pw".to_string())))
            .await
            .unwrap();
        assert_eq!(opened.plaintext.as_str(), "guarded");
        assert_eq!(opened.remaining_views, 1);

        // Validation errors come back typed
        let bad = CreateNoteRequest {
            id: "x".to_string(),
            blob: "b".to_string(),
            ttl_minutes: 1.0,
            burn_after_read: true,
            max_views: None,
        };
        use cinder_core::NoteBackend;
        assert!(matches!(
            service.backend().create(&bad).await,
            Err(NoteError::Store(StoreError::Validation(_)))
        ));

        // Server-side reasons survive the trip, including for malformed bodies
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/notes"))
            .header("content-type", "application/json")
            .body(r#"{"id":"abcdef","blob":"x"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        let body: ErrorBody = resp.json().await.unwrap();
        assert!(body.error.contains("ttlMinutes"));

        server.abort();
    }
}
