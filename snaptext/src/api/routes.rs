use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::state::AppState;
use super::{frontend, handlers, openapi};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(frontend::serve_root))
        .route("/assets/{*path}", get(frontend::serve_path))
        .route("/ocr", post(handlers::perform_ocr))
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(openapi::openapi_json))
        .merge(openapi::redoc_router())
        // Leave headroom over the file cap for multipart framing and the
        // other form fields.
        .layer(DefaultBodyLimit::max(handlers::MAX_FILE_SIZE + 64 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
