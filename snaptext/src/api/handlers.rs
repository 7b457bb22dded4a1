use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use uuid::Uuid;

use crate::api::response::{ApiError, ApiResponse};
use crate::api::state::AppState;
use crate::config::SUPPORTED_IMAGE_TYPES;
use crate::error::SnaptextError;
use crate::ocr::{normalize_image, Provider};

/// Upload cap, checked per field while reading the multipart stream.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10 MB

/// Extraction result inside the envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OcrData {
    pub text: String,
}

/// Health data returned inside the envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub default_provider: String,
    pub hosted_model: String,
    pub local_model: String,
}

/// `GET /health`
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        default_provider: state.config.ocr.default_provider.clone(),
        hosted_model: state.config.ocr.hosted_model.clone(),
        local_model: state.config.ocr.local_model.clone(),
    })
}

fn file_extension(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
}

/// `POST /ocr`
///
/// Multipart fields: `file` (required), `provider` (`hosted` | `local`,
/// defaults to the configured provider), `api_key` (required for `hosted`),
/// `system_prompt` (optional instruction override).
///
/// Linear per-request flow: validate upload and provider, check the
/// credential before touching the network, normalize, base64-encode, build
/// the extractor, extract, wrap in the envelope. Nothing survives the
/// request.
#[utoipa::path(
    post,
    path = "/ocr",
    tag = "ocr",
    responses(
        (status = 200, description = "Extracted text", body = OcrData),
        (status = 400, description = "Unsupported file type or provider, or missing credential", body = ApiError),
        (status = 500, description = "Provider failure", body = ApiError),
    )
)]
pub async fn perform_ocr(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResponse<OcrData> {
    let request_id = Uuid::new_v4();

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut provider_field: Option<String> = None;
    let mut api_key: Option<String> = None;
    let mut system_prompt: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(%request_id, "malformed multipart body: {e}");
                return ApiResponse::error(
                    StatusCode::BAD_REQUEST,
                    format!("Malformed multipart body: {e}"),
                );
            }
        };
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                if let Some(name) = field.file_name() {
                    file_name = Some(name.to_string());
                }

                let bytes = match field.bytes().await {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::error!(%request_id, "failed to read upload: {e}");
                        return ApiResponse::error(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read file: {e}"),
                        );
                    }
                };

                if bytes.len() > MAX_FILE_SIZE {
                    return ApiResponse::error(
                        StatusCode::BAD_REQUEST,
                        format!(
                            "File too large: {} bytes (max {} bytes)",
                            bytes.len(),
                            MAX_FILE_SIZE
                        ),
                    );
                }

                file_bytes = Some(bytes.to_vec());
            }
            "provider" => {
                if let Ok(value) = field.text().await {
                    provider_field = Some(value);
                }
            }
            "api_key" => {
                if let Ok(value) = field.text().await {
                    api_key = Some(value);
                }
            }
            "system_prompt" => {
                if let Ok(value) = field.text().await {
                    system_prompt = Some(value);
                }
            }
            _ => {}
        }
    }

    let Some(file_bytes) = file_bytes else {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "No file uploaded.");
    };
    let file_name = file_name.unwrap_or_default();

    // Extension whitelist first, as cheap rejection of obviously wrong
    // uploads; the normalizer re-checks the actual content signature.
    let ext = file_extension(&file_name);
    if !ext
        .as_deref()
        .is_some_and(|e| SUPPORTED_IMAGE_TYPES.contains(&e))
    {
        tracing::error!(%request_id, %file_name, "unsupported file type: {ext:?}");
        return SnaptextError::UnsupportedFormat.into();
    }

    let provider_name = provider_field
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| state.config.ocr.default_provider.clone());
    let provider: Provider = match provider_name.parse() {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(%request_id, %file_name, provider = %provider_name, "unsupported provider");
            return e.into();
        }
    };

    // Credential gate before any image work or network activity.
    if provider.requires_credential()
        && !api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    {
        tracing::error!(%request_id, %file_name, %provider, "missing credential");
        return SnaptextError::MissingCredential(
            "API key is required for the hosted provider.".to_string(),
        )
        .into();
    }

    let normalized = match normalize_image(&file_bytes, &state.config.ocr) {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(%request_id, %file_name, %provider, "normalization failed: {e}");
            return e.into();
        }
    };

    let base64_image = STANDARD.encode(&normalized.bytes);

    let extractor = match state.extractors.create(provider, api_key.as_deref()) {
        Ok(ex) => ex,
        Err(e) => {
            tracing::error!(%request_id, %file_name, %provider, "extractor construction failed: {e}");
            return e.into();
        }
    };

    let prompt = system_prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| state.config.ocr.prompt().to_string());

    match extractor
        .extract_text(&base64_image, normalized.mime_type, &prompt)
        .await
    {
        Ok(text) => {
            tracing::info!(%request_id, %file_name, %provider, chars = text.len(), "extraction complete");
            ApiResponse::success(OcrData { text })
        }
        Err(e) => {
            tracing::error!(%request_id, %file_name, %provider, "extraction failed: {e}");
            e.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_parsing_is_case_insensitive() {
        assert_eq!(file_extension("scan.PNG").as_deref(), Some(".png"));
        assert_eq!(file_extension("photo.jpeg").as_deref(), Some(".jpeg"));
        assert_eq!(file_extension("a.b.webp").as_deref(), Some(".webp"));
        assert_eq!(file_extension("noext"), None);
    }

    #[test]
    fn supported_extensions_match_config() {
        for name in ["a.png", "a.jpg", "a.jpeg", "a.gif", "a.webp"] {
            let ext = file_extension(name).unwrap();
            assert!(SUPPORTED_IMAGE_TYPES.contains(&ext.as_str()), "{name}");
        }
        let ext = file_extension("notes.txt").unwrap();
        assert!(!SUPPORTED_IMAGE_TYPES.contains(&ext.as_str()));
    }
}
