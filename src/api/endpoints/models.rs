use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::models::{evaluate_tagger, EvaluationReport, ModelDescriptor, RegistryStatus, BUILTIN_CASES};

#[derive(Serialize)]
pub struct ModelsResponse {
    pub active: Option<String>,
    pub models: Vec<ModelDescriptor>,
}

/// `GET /api/models`: every known location with its availability.
pub async fn list(State(ctx): State<ApiContext>) -> Json<ModelsResponse> {
    let registry = ctx.registry();
    Json(ModelsResponse {
        active: registry.active_id(),
        models: registry.list_known(),
    })
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub id: String,
}

#[derive(Serialize)]
pub struct ActiveResponse {
    pub active: String,
}

/// `POST /api/models/active`
pub async fn set_active(
    State(ctx): State<ApiContext>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<ActiveResponse>, ApiError> {
    if ctx.registry().set_active(&req.id) {
        Ok(Json(ActiveResponse { active: req.id }))
    } else {
        Err(ApiError::NotFound(format!("Model not available: {}", req.id)))
    }
}

/// `POST /api/models/refresh`: rescan the models directory.
pub async fn refresh(State(ctx): State<ApiContext>) -> Result<Json<RegistryStatus>, ApiError> {
    let registry = ctx.registry().clone();
    let status = tokio::task::spawn_blocking(move || {
        registry.refresh();
        registry.status()
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(status))
}

#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub id: Option<String>,
}

/// `POST /api/models/evaluate`: score a tagger on the built-in cases.
pub async fn evaluate(
    State(ctx): State<ApiContext>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluationReport>, ApiError> {
    let registry = ctx.registry();
    let (id, tagger) = match req.id {
        Some(id) => {
            let tagger = registry
                .get(&id)
                .ok_or_else(|| ApiError::NotFound(format!("Model not available: {id}")))?;
            (id, tagger)
        }
        None => registry
            .active()
            .ok_or_else(|| ApiError::NotFound("No active model".into()))?,
    };

    let report = tokio::task::spawn_blocking(move || evaluate_tagger(&id, tagger, &BUILTIN_CASES))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(report))
}
