//! Error types for the head pose monitoring library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `ONNX` Runtime inference failed
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON asset or replay input could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tensor shape mismatch while building model inputs
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Invalid input parameters provided (wrong landmark count, length mismatch, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required asset (model or scaler) has not been loaded
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Geometry that cannot produce a pose (zero-area box, zero frame size)
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Model loading or inference error
    #[error("Model error: {0}")]
    ModelError(String),

    /// Model output processing error
    #[error("Model output error: {0}")]
    ModelOutputError(String),

    /// Model validation error (wrong input width, etc.)
    #[error("Model validation error: {0}")]
    ModelValidationError(String),

    /// Anomaly classifier failed or returned an unusable score
    #[error("Classifier error: {0}")]
    ClassifierError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Export requested while the history holds no samples
    #[error("Nothing to export: pose history is empty")]
    EmptyHistory,
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
