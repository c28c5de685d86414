// SPDX-License-Identifier: GPL-3.0-only

//! Vision AI - point a camera at something and find out what it is
//!
//! Captures a still from a live camera, sends it to a multimodal model
//! (Gemini) with a fixed JSON response schema, and presents the structured
//! identification.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Capture-and-analysis state machine and its task runtime
//! - [`backends`]: Camera media sources (PipeWire, still image files)
//! - [`pipelines`]: Still capture and JPEG encoding
//! - [`analysis`]: Analyzer trait and the Gemini client
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal front end

pub mod analysis;
pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod terminal;

// Re-export commonly used types
pub use analysis::{AnalysisResult, Analyzer, Attribute, GeminiClient};
pub use app::{AppModel, AppState, Message, Runtime, Snapshot, Task};
pub use backends::camera::types::CameraMode;
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use pipelines::photo::CapturedFrame;
