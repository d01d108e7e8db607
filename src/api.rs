//! HTTP API поверх генераторов дескрипторов

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::describers::{Describer, MultiDescriber};
use crate::error::DescriptorError;
use crate::frame::DataFrame;
use crate::preprocessing::ElementTable;
use crate::types::{GenerateRequest, PipelineRequest, SitePropertyRequest};

#[derive(Clone)]
pub struct AppState {
    pub elements: Arc<ElementTable>,
}

impl AppState {
    pub fn new(elements: ElementTable) -> Self {
        Self {
            elements: Arc::new(elements),
        }
    }
}

type ApiResult = Result<Json<DataFrame>, (StatusCode, Json<Value>)>;

/// `NaN` в JSON неотличим от отсутствующего значения, такие ответы отклоняются
fn respond(result: crate::error::Result<DataFrame>) -> ApiResult {
    result
        .and_then(|frame| frame.ensure_finite().map(|_| frame))
        .map(Json)
        .map_err(reject)
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/site-properties", post(site_properties))
        .route("/api/pipeline", post(pipeline))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

fn reject(error: DescriptorError) -> (StatusCode, Json<Value>) {
    tracing::warn!("Request rejected: {}", error);
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": error.to_string() })),
    )
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Descriptor API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn generate(Json(request): Json<GenerateRequest>) -> ApiResult {
    tracing::info!(
        "Generate request: {} transformations, {} rows",
        request.generator.len(),
        request.table.nrows()
    );

    respond(request.generator.describe(&request.table))
}

async fn site_properties(
    State(state): State<AppState>,
    Json(request): Json<SitePropertyRequest>,
) -> ApiResult {
    tracing::info!("Site property request: {} structures", request.structures.len());

    let describer = request.settings.build(state.elements.clone());
    respond(describer.describe_all(&request.structures))
}

async fn pipeline(
    State(state): State<AppState>,
    Json(request): Json<PipelineRequest>,
) -> ApiResult {
    tracing::info!(
        "Pipeline request: {} stages, {} structures",
        request.stages.len() + 1,
        request.structures.len()
    );

    let mut describer = MultiDescriber::new(request.settings.build(state.elements.clone()));
    for stage in request.stages {
        describer = describer.then(stage);
    }

    respond(describer.describe_all(&request.structures))
}
