use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Headroom for multipart framing on top of the file size limit.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Build the full router.
pub fn api_router(ctx: ApiContext) -> Router {
    let body_limit = ctx.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(endpoints::page::index))
        .route("/api/health", get(endpoints::health::check))
        .route("/api/extract", post(endpoints::extract::extract))
        .route("/api/models", get(endpoints::models::list))
        .route("/api/models/active", post(endpoints::models::set_active))
        .route("/api/models/refresh", post(endpoints::models::refresh))
        .route("/api/models/evaluate", post(endpoints::models::evaluate))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
