//! HTTP host for one upload session.
//!
//! Lets a browser front-end drive an [`UploadQueue`] the way the upload dialog
//! does: drop files in, take some out, submit, close. Notifications are pushed
//! over Server-Sent Events.
//!
//! # API Endpoints
//!
//! | Method | Path                       | Description                        |
//! |--------|----------------------------|------------------------------------|
//! | GET    | `/health`                  | Health check                       |
//! | GET    | `/api/session`             | Session snapshot                   |
//! | POST   | `/api/session/files`       | Enqueue files (multipart)          |
//! | DELETE | `/api/session/files`       | Remove all queued files            |
//! | DELETE | `/api/session/files/{id}`  | Remove one queued file             |
//! | POST   | `/api/session/submit`      | Upload the queue to a target       |
//! | POST   | `/api/session/reset`       | Close the session                  |
//! | GET    | `/api/notifications`       | SSE stream of notifications        |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method},
    response::{sse::Event, Json, Sse},
    routing::{delete, get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::types::{EnqueueResponse, SubmitResponse};
use crate::client::{HttpUploader, Uploader};
use crate::config::{UploadConfig, MAX_REQUEST_BODY};
use crate::error::{ServerError, ServerResult};
use crate::models::{QueuedFile, SessionSnapshot};
use crate::notify::{NotificationHub, Notifier};
use crate::queue::UploadQueue;
use crate::validation::UploadTargetForm;

/// Shared handler state.
pub struct AppState<U, N> {
    pub queue: Arc<UploadQueue<U, N>>,
    /// Source of the SSE stream.
    pub hub: NotificationHub,
}

impl<U, N> Clone for AppState<U, N> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            hub: self.hub.clone(),
        }
    }
}

/// Build the session router.
pub fn router<U, N>(state: AppState<U, N>) -> Router
where
    U: Uploader + 'static,
    N: Notifier + 'static,
{
    // Permissive CORS for a locally served front-end
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/session", get(session::<U, N>))
        .route(
            "/api/session/files",
            post(enqueue_files::<U, N>).delete(remove_all::<U, N>),
        )
        .route("/api/session/files/{id}", delete(remove_file::<U, N>))
        .route("/api/session/submit", post(submit::<U, N>))
        .route("/api/session/reset", post(reset::<U, N>))
        .route("/api/notifications", get(sse_notifications::<U, N>))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: &UploadConfig, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let hub = NotificationHub::new();
    let uploader = HttpUploader::new(config)?;
    let queue = UploadQueue::new(uploader, hub.clone(), config);

    let app = router(AppState {
        queue: Arc::new(queue),
        hub,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Upload session host running on http://localhost:{}", port);
    println!("   Uploading to {}", config.upload_url());
    println!("   POST   /api/session/files   - Add files");
    println!("   POST   /api/session/submit  - Upload queued files");
    println!("   POST   /api/session/reset   - Close session");
    println!("   GET    /api/notifications   - SSE notification stream");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "studytracker-uploader",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn session<U, N>(State(state): State<AppState<U, N>>) -> Json<SessionSnapshot>
where
    U: Uploader + 'static,
    N: Notifier + 'static,
{
    Json(state.queue.snapshot())
}

/// Every multipart field with a file name is one file.
async fn enqueue_files<U, N>(
    State(state): State<AppState<U, N>>,
    mut multipart: Multipart,
) -> ServerResult<Json<EnqueueResponse>>
where
    U: Uploader + 'static,
    N: Notifier + 'static,
{
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
        files.push(QueuedFile::new(file_name, bytes));
    }

    if files.is_empty() {
        return Err(ServerError::BadRequest("No file provided".into()));
    }

    println!("📥 Enqueue: {} file(s)", files.len());
    let report = state.queue.enqueue(files)?;

    Ok(Json(EnqueueResponse::new(report, state.queue.snapshot())))
}

async fn remove_all<U, N>(State(state): State<AppState<U, N>>) -> ServerResult<Json<SessionSnapshot>>
where
    U: Uploader + 'static,
    N: Notifier + 'static,
{
    state.queue.remove_all()?;
    Ok(Json(state.queue.snapshot()))
}

async fn remove_file<U, N>(
    State(state): State<AppState<U, N>>,
    Path(id): Path<Uuid>,
) -> ServerResult<Json<SessionSnapshot>>
where
    U: Uploader + 'static,
    N: Notifier + 'static,
{
    if !state.queue.remove_one(id)? {
        return Err(ServerError::NotFound(id.to_string()));
    }
    Ok(Json(state.queue.snapshot()))
}

async fn submit<U, N>(
    State(state): State<AppState<U, N>>,
    Json(form): Json<UploadTargetForm>,
) -> ServerResult<Json<SubmitResponse>>
where
    U: Uploader + 'static,
    N: Notifier + 'static,
{
    let target = form.validate()?;

    println!("\n{}", "=".repeat(70));
    println!("📤 SUBMIT → folder {} {}", target.folder_id, target.path);
    println!("{}\n", "=".repeat(70));

    let report = state.queue.submit(&target).await;
    println!(
        "   Uploaded: {}   Failed: {}",
        report.succeeded(),
        report.failed()
    );

    Ok(Json(SubmitResponse::new(&report, state.queue.snapshot())))
}

async fn reset<U, N>(State(state): State<AppState<U, N>>) -> Json<SessionSnapshot>
where
    U: Uploader + 'static,
    N: Notifier + 'static,
{
    state.queue.reset();
    Json(state.queue.snapshot())
}

/// SSE endpoint for notifications
async fn sse_notifications<U, N>(
    State(state): State<AppState<U, N>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    U: Uploader + 'static,
    N: Notifier + 'static,
{
    let rx = state.hub.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(notification) => {
            let json = serde_json::to_string(&notification).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
