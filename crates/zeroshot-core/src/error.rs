//! Error types for zero-shot classification.
//!
//! Errors are grouped by concern so callers can tell a bad upload apart from a
//! broken model installation. Classification failures carry the originating
//! cause plus the source location where they were raised.

use std::panic::Location;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::InputWarning;

/// Top-level error type for zeroshot operations.
#[derive(Error, Debug)]
pub enum ZeroShotError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model loading or inference errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Image decoding errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Classification failures
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// A blocking worker task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while loading or running the vision-language model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A required model file is not on disk
    #[error("Model file not found at {path}. Run `zeroshot models download` first.")]
    NotFound { path: PathBuf },

    /// A model or tokenizer file exists but could not be loaded
    #[error("Failed to load {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// Label tokenization failed
    #[error("Tokenization failed: {0}")]
    Tokenize(String),

    /// Building input tensors or running a session failed
    #[error("Inference failed: {0}")]
    Inference(String),

    /// The model produced output with an unexpected name or shape
    #[error("Unexpected model output: {0}")]
    Output(String),
}

/// Errors raised while turning uploaded bytes into a bitmap.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Upload carried no bytes
    #[error("Empty image upload: {name}")]
    Empty { name: String },

    /// Image decoding failed
    #[error("Decode error for {name}: {message}")]
    Decode { name: String, message: String },

    /// Unsupported image format
    #[error("Unsupported format for {name}: {format}")]
    UnsupportedFormat { name: String, format: String },

    /// Upload exceeds size limit
    #[error("File too large: {name} ({size_bytes} bytes > {max_mb}MB)")]
    FileTooLarge {
        name: String,
        size_bytes: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {name} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        name: String,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Decoding did not finish in time
    #[error("Decoding {name} timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },
}

/// What went wrong inside a classification call.
#[derive(Error, Debug)]
pub enum ClassifyCause {
    /// No bitmap was supplied, so the model cannot be invoked
    #[error("no input image was provided")]
    MissingImage,

    /// The model capability failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The model returned a different number of scores than labels
    #[error("model returned {got} scores for {expected} labels")]
    ScoreCount { expected: usize, got: usize },

    /// The model returned NaN or an infinite score
    #[error("model returned a non-finite score for label {index} ({label:?})")]
    NonFiniteScore { index: usize, label: String },
}

/// A failed classification call.
///
/// Wraps the originating [`ClassifyCause`] together with the source location
/// that raised it. There is no partial result: a call either produces a full
/// label/score mapping or this error.
#[derive(Error, Debug)]
#[error("Classification failed: {cause}")]
pub struct ClassifyError {
    #[source]
    cause: ClassifyCause,
    location: &'static Location<'static>,
    warnings: Vec<InputWarning>,
}

impl ClassifyError {
    /// Wrap a cause, recording the caller's location.
    #[track_caller]
    pub fn new(cause: impl Into<ClassifyCause>) -> Self {
        Self {
            cause: cause.into(),
            location: Location::caller(),
            warnings: Vec::new(),
        }
    }

    /// Attach the input warnings raised before the failure.
    pub fn with_warnings(mut self, warnings: Vec<InputWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Input warnings raised before the failure.
    pub fn warnings(&self) -> &[InputWarning] {
        &self.warnings
    }

    /// The originating cause.
    pub fn cause(&self) -> &ClassifyCause {
        &self.cause
    }

    /// Where the failure was raised (`file:line:column`).
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Whether the failure stems from missing or unusable request input
    /// rather than the model itself.
    pub fn is_input_error(&self) -> bool {
        matches!(self.cause, ClassifyCause::MissingImage)
    }
}

/// Convenience type alias for zeroshot results.
pub type Result<T> = std::result::Result<T, ZeroShotError>;
