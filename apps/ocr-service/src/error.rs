//! Error types for the DocGuard OCR service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentError;
use crate::hash::HashError;
use crate::ocr::OcrError;

/// Pipeline result type
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures of the document pipeline, one variant per stage outcome.
///
/// A document without an identifier is not an error.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Decode(String),

    #[error("Image could not be compressed below {limit} bytes for the OCR API (got {size} bytes)")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("{}", provider_message(.status, .message))]
    Provider { status: u16, message: Option<String> },

    #[error("OCR API request failed after {attempts} attempts. Please check your API key and network connection.")]
    ProviderUnavailable { attempts: u32 },

    #[error("Failed to parse API response as JSON: {0}")]
    ResponseParse(String),

    #[error("No text content found in OCR result")]
    NoTextFound,

    #[error("Network error during API request: {0}")]
    Transport(String),

    #[error("Invalid document hash: {0}")]
    InvalidHash(#[from] HashError),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn provider_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("API request failed with status code: {}\nError: {}", status, message),
        None => format!("API request failed with status code: {}", status),
    }
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Provider { .. } => StatusCode::BAD_GATEWAY,
            Self::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::ResponseParse(_)
            | Self::NoTextFound
            | Self::Transport(_)
            | Self::InvalidHash(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "DECODE_ERROR",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            Self::ResponseParse(_) => "RESPONSE_PARSE_ERROR",
            Self::NoTextFound => "NO_TEXT_FOUND",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::InvalidHash(_) => "INVALID_HASH",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DocumentError> for PipelineError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Decode(_)
            | DocumentError::EmptyPdf
            | DocumentError::DimensionsTooLarge { .. } => {
                PipelineError::Decode(err.to_string())
            }
            DocumentError::PayloadTooLarge { size, limit, .. } => {
                PipelineError::PayloadTooLarge { size, limit }
            }
            DocumentError::Encode(msg) => PipelineError::Internal(msg),
        }
    }
}

impl From<OcrError> for PipelineError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::Provider { status, message } => PipelineError::Provider { status, message },
            OcrError::Unavailable { attempts, .. } => PipelineError::ProviderUnavailable { attempts },
            OcrError::ResponseParse(msg) => PipelineError::ResponseParse(msg),
            OcrError::Transport(msg) => PipelineError::Transport(msg),
        }
    }
}

/// Errors surfaced by the HTTP layer
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unsupported file type: {content_type}. Supported types: {supported}")]
    UnsupportedType {
        content_type: String,
        supported: String,
    },

    #[error("File size must be less than {}MB", .max_bytes / (1024 * 1024))]
    FileTooLarge { size: usize, max_bytes: usize },

    #[error("Missing 'file' field in multipart form")]
    MissingFile,

    #[error("Invalid multipart request: {0}")]
    Multipart(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Pipeline(err) => err.status_code(),
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, error) = match &self {
            ApiError::Pipeline(err) => {
                if status.is_server_error() {
                    tracing::error!(code = err.code(), "Error processing file: {}", err);
                } else {
                    tracing::warn!(code = err.code(), "Rejected file: {}", err);
                }
                (err.code(), format!("OCR processing failed: {}", err))
            }
            ApiError::UnsupportedType { .. } => ("UNSUPPORTED_TYPE", self.to_string()),
            ApiError::FileTooLarge { .. } => ("FILE_TOO_LARGE", self.to_string()),
            ApiError::MissingFile => ("MISSING_FILE", self.to_string()),
            ApiError::Multipart(_) => ("INVALID_MULTIPART", self.to_string()),
        };

        let body = Json(ErrorResponse {
            success: false,
            error,
            code,
        });

        (status, body).into_response()
    }
}
