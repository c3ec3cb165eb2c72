//! HTTP API

pub mod pipeline;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use utoipa::OpenApi;

use crate::state::SharedState;
use pipeline::{BackendInfo, BundleResponse, ErrorResponse, RunRequest, StatusResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scribe API",
        version = "1.0.0",
        description = "Research, write, proofread and summarize a topic"
    ),
    paths(
        pipeline::run_pipeline,
        pipeline::get_status,
        pipeline::get_backends
    ),
    components(schemas(
        RunRequest,
        BundleResponse,
        ErrorResponse,
        StatusResponse,
        BackendInfo
    )),
    tags(
        (name = "pipeline", description = "Content pipeline runs"),
        (name = "status", description = "Backend and run status")
    )
)]
pub struct ApiDoc;

/// All `/api/v1` routes
pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .nest("/pipeline", pipeline::pipeline_routes())
        .route("/status", get(pipeline::get_status))
        .route("/backends", get(pipeline::get_backends))
        .route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Response {
    match ApiDoc::openapi().to_json() {
        Ok(json) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
