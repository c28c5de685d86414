// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the identification client
//!
//! Every failure ends up in the single `Error` state of the state machine;
//! the variants here exist for logs and for the command line, not for the
//! end user.

use crate::backends::camera::types::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Device access errors
    Camera(CameraError),
    /// Still capture errors
    Capture(CaptureError),
    /// Remote analysis errors
    Analysis(AnalysisError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Camera permission or hardware failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// The media source refused access to the device
    PermissionDenied(String),
    /// Camera initialization failed
    InitializationFailed(String),
    /// Camera disconnected during operation
    Disconnected,
    /// Backend error (e.g., PipeWire)
    Backend(String),
}

/// Still capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No frame available for capture
    NoFrameAvailable,
    /// Frame pixel layout the encoder cannot read
    UnsupportedFormat(String),
    /// Encoding failed
    EncodingFailed(String),
    /// Input is not a usable encoded image (bad data URL, bad base64)
    InvalidImage(String),
}

/// Remote analysis errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The service answered without any text
    EmptyResponse,
    /// The text is not JSON or misses required fields
    MalformedResponse(String),
    /// Network, auth or quota failure
    TransportError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Analysis(e) => write!(f, "Analysis error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::PermissionDenied(msg) => write!(f, "Camera access denied: {}", msg),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::Disconnected => write!(f, "Camera disconnected"),
            CameraError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoFrameAvailable => write!(f, "No frame available for capture"),
            CaptureError::UnsupportedFormat(msg) => write!(f, "Unsupported frame format: {}", msg),
            CaptureError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            CaptureError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::EmptyResponse => write!(f, "No response text from the analysis service"),
            AnalysisError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            AnalysisError::TransportError(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for AnalysisError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::Analysis(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotAvailable(msg) => CameraError::Backend(msg),
            BackendError::DeviceNotFound(_) => CameraError::NoCameraFound,
            BackendError::PermissionDenied(msg) => CameraError::PermissionDenied(msg),
            BackendError::InitializationFailed(msg) => CameraError::InitializationFailed(msg),
            BackendError::Disconnected => CameraError::Disconnected,
            BackendError::IoError(msg) | BackendError::Other(msg) => CameraError::Backend(msg),
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::TransportError(err.to_string())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::MalformedResponse(err.to_string())
    }
}
