use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Snaptext API",
        version = "0.1.0",
        description = "Relays uploaded images to a vision-language model and returns the transcribed text.",
    ),
    paths(handlers::perform_ocr, handlers::health_check),
    components(schemas(
        response::ApiError,
        handlers::OcrData,
        handlers::HealthData,
    )),
    tags(
        (name = "ocr", description = "Image text extraction"),
        (name = "health", description = "Health check"),
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
