//! # Pipeline API
//!
//! Run the four-stage pipeline on a topic, watch its progress, and inspect
//! the active backend.

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use utoipa::ToSchema;

use scribe_core::models::BackendKind;
use scribe_core::pipeline::{PipelineEvent, ResultBundle, EMPTY_TOPIC_MESSAGE};
use scribe_core::{BackendError, PipelineError};

use crate::state::SharedState;

/// Request to run the pipeline
#[derive(Debug, Deserialize, ToSchema)]
pub struct RunRequest {
    pub topic: String,
    /// Client-chosen UUID; every event of this run carries it
    #[serde(default)]
    pub run_id: Option<String>,
}

/// The four outputs of a completed run
#[derive(Debug, Serialize, ToSchema)]
pub struct BundleResponse {
    pub research: String,
    pub article: String,
    pub refined: String,
    pub summary: String,
}

impl From<ResultBundle> for BundleResponse {
    fn from(bundle: ResultBundle) -> Self {
        Self {
            research: bundle.research().to_string(),
            article: bundle.article().to_string(),
            refined: bundle.refined().to_string(),
            summary: bundle.summary().to_string(),
        }
    }
}

/// A failed run
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// `validation`, `authentication`, `transport`, `rate_limit`,
    /// `malformed_response` or `internal`
    pub kind: String,
    /// Human-readable message for inline display
    pub message: String,
    /// Stage that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub backend: String,
    pub backend_name: String,
    pub model: String,
    pub runs_in_flight: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BackendInfo {
    pub id: String,
    pub name: String,
    pub credential_var: String,
    pub default_model: String,
    pub active: bool,
}

/// A pipeline error as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::StageFailed {
                source: BackendError::RateLimit(_),
                ..
            } => StatusCode::TOO_MANY_REQUESTS,
            PipelineError::StageFailed { .. } => StatusCode::BAD_GATEWAY,
            PipelineError::OutOfOrder { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            kind: self.0.kind().to_string(),
            message: self.0.user_message(),
            stage: self.0.stage().map(|stage| stage.to_string()),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub fn pipeline_routes() -> Router<SharedState> {
    Router::new()
        .route("/run", post(run_pipeline))
        .route("/events", get(events))
}

/// Run the pipeline on a topic
#[utoipa::path(
    post,
    path = "/api/v1/pipeline/run",
    tag = "pipeline",
    request_body = RunRequest,
    responses(
        (status = 200, description = "All four stages completed", body = BundleResponse),
        (status = 400, description = "Empty topic or malformed run id", body = ErrorResponse),
        (status = 429, description = "Backend rate limited a stage", body = ErrorResponse),
        (status = 502, description = "Backend failed a stage", body = ErrorResponse)
    )
)]
pub async fn run_pipeline(
    State(state): State<SharedState>,
    Json(req): Json<RunRequest>,
) -> Result<Json<BundleResponse>, ApiError> {
    if req.topic.trim().is_empty() {
        return Err(ApiError(PipelineError::Validation(
            EMPTY_TOPIC_MESSAGE.to_string(),
        )));
    }

    let (tx, mut rx) = mpsc::channel::<PipelineEvent>(32);
    let event_tx = state.event_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            // No subscribers is fine
            let _ = event_tx.send(event);
        }
    });

    let guard = state.counters.start();
    let result = match &req.run_id {
        Some(run_id) => {
            state
                .pipeline
                .run_tracked(run_id, &req.topic, Some(&tx))
                .await
        }
        None => state.pipeline.run_with_events(&req.topic, Some(&tx)).await,
    };
    drop(tx);
    let _ = forwarder.await;
    guard.finish(result.is_ok());

    match result {
        Ok(bundle) => Ok(Json(bundle.into())),
        Err(e) => {
            tracing::warn!(kind = e.kind(), error = %e, "Pipeline run failed");
            Err(ApiError(e))
        }
    }
}

/// SSE endpoint for pipeline events with heartbeat
async fn events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        match tokio::time::timeout(Duration::from_secs(15), rx.recv()).await {
            Ok(Ok(event)) => {
                let json = serde_json::to_string(&event).unwrap_or_default();
                Some((Ok(Event::default().data(json)), rx))
            }
            Ok(Err(RecvError::Lagged(missed))) => Some((
                Ok(Event::default().comment(format!("lagged {}", missed))),
                rx,
            )),
            Ok(Err(RecvError::Closed)) => None,
            Err(_) => Some((Ok(Event::default().comment("heartbeat")), rx)),
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Active backend and run counters
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "status",
    responses(
        (status = 200, description = "Current server status", body = StatusResponse)
    )
)]
pub async fn get_status(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        backend: state.backend.id().to_string(),
        backend_name: state.backend.display_name().to_string(),
        model: state.model.clone(),
        runs_in_flight: state.counters.in_flight(),
        runs_completed: state.counters.completed(),
        runs_failed: state.counters.failed(),
    })
}

/// Supported backend families
#[utoipa::path(
    get,
    path = "/api/v1/backends",
    tag = "status",
    responses(
        (status = 200, description = "Backend families", body = Vec<BackendInfo>)
    )
)]
pub async fn get_backends(State(state): State<SharedState>) -> Json<Vec<BackendInfo>> {
    Json(backend_info(state.backend))
}

pub fn backend_info(active: BackendKind) -> Vec<BackendInfo> {
    BackendKind::all()
        .into_iter()
        .map(|kind| BackendInfo {
            id: kind.id().to_string(),
            name: kind.display_name().to_string(),
            credential_var: kind.credential_var().to_string(),
            default_model: kind.default_model().to_string(),
            active: kind == active,
        })
        .collect()
}
