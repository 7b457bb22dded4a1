use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnaptextError {
    /// The uploaded file is not one of the accepted raster formats.
    #[error("Unsupported file type.")]
    UnsupportedFormat,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Unexpected response shape: {0}")]
    UnexpectedResponseShape(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl SnaptextError {
    /// HTTP status the error maps to on the wire.
    ///
    /// Normalization and request-validation failures are client errors;
    /// provider, transport, and shape failures are server errors.
    pub fn status(&self) -> StatusCode {
        match self {
            SnaptextError::UnsupportedFormat
            | SnaptextError::Decode(_)
            | SnaptextError::UnsupportedProvider(_)
            | SnaptextError::MissingCredential(_) => StatusCode::BAD_REQUEST,
            SnaptextError::Provider(_)
            | SnaptextError::UnexpectedResponseShape(_)
            | SnaptextError::Http(_)
            | SnaptextError::Json(_)
            | SnaptextError::Io(_)
            | SnaptextError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the client-facing message may carry the specific error text.
    ///
    /// Server-side failures only ever surface a generic phrase; the detail
    /// goes to the logs.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

pub type Result<T> = std::result::Result<T, SnaptextError>;
