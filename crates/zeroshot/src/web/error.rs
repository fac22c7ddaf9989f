//! HTTP error mapping.
//!
//! Every failure leaves the server as JSON `{ "error", "code" }` with a
//! status that tells the client whether to fix its input or retry later.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use zeroshot_core::{ClassifyError, DecodeError, InputWarning, ZeroShotError};

/// Errors returned by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or oversized multipart body
    Upload(MultipartError),
    /// Uploaded bytes are not a usable image
    Decode(DecodeError),
    /// The classification call failed; `verbose` adds the call site and
    /// cause chain to the response
    Classify { error: ClassifyError, verbose: bool },
    /// No example with this index
    ExampleNotFound(usize),
    /// The example exists but its input could not be loaded
    ExampleUnavailable(String),
    /// Anything else
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Input warnings raised before the failure
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<WarningBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// A non-fatal input warning as clients see it.
#[derive(Debug, Serialize, Deserialize)]
pub struct WarningBody {
    pub kind: InputWarning,
    pub message: String,
}

impl From<InputWarning> for WarningBody {
    fn from(kind: InputWarning) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
        }
    }
}

/// Debug-mode context for classification failures.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub location: String,
    pub causes: Vec<String>,
}

impl ApiError {
    /// Map a core error raised while computing an example.
    pub fn from_example(error: ZeroShotError, verbose: bool) -> Self {
        match error {
            ZeroShotError::Classify(error) => Self::Classify { error, verbose },
            other => Self::ExampleUnavailable(other.to_string()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upload(e) => e.status(),
            Self::Decode(DecodeError::FileTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::Classify { error, .. } if error.is_input_error() => StatusCode::BAD_REQUEST,
            Self::Classify { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ExampleNotFound(_) => StatusCode::NOT_FOUND,
            Self::ExampleUnavailable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Upload(_) => "BAD_UPLOAD",
            Self::Decode(DecodeError::FileTooLarge { .. }) => "PAYLOAD_TOO_LARGE",
            Self::Decode(_) => "INVALID_IMAGE",
            Self::Classify { error, .. } if error.is_input_error() => "MISSING_INPUT",
            Self::Classify { .. } => "CLASSIFICATION_FAILED",
            Self::ExampleNotFound(_) => "EXAMPLE_NOT_FOUND",
            Self::ExampleUnavailable(_) => "EXAMPLE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn warnings(&self) -> Vec<WarningBody> {
        match self {
            Self::Classify { error, .. } => {
                error.warnings().iter().copied().map(WarningBody::from).collect()
            }
            _ => Vec::new(),
        }
    }

    fn details(&self) -> Option<ErrorDetails> {
        let Self::Classify {
            error,
            verbose: true,
        } = self
        else {
            return None;
        };

        let mut causes = Vec::new();
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Some(ErrorDetails {
            location: error.location().to_string(),
            causes,
        })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upload(e) => write!(f, "Invalid upload: {}", e.body_text()),
            Self::Decode(e) => write!(f, "{}", e),
            Self::Classify { error, .. } => write!(f, "{}", error),
            Self::ExampleNotFound(index) => write!(f, "Example {} not found", index),
            Self::ExampleUnavailable(message) => write!(f, "Example unavailable: {}", message),
            Self::Internal(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::Upload(e)
    }
}

impl From<DecodeError> for ApiError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
            warnings: self.warnings(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}
