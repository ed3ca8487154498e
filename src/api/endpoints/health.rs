use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::pipeline::models::RegistryState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub registry: RegistryState,
    pub active_model: Option<String>,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let registry = ctx.registry();
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        registry: registry.state(),
        active_model: registry.active_id(),
    })
}
