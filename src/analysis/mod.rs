// SPDX-License-Identifier: GPL-3.0-only

//! Remote object identification
//!
//! The [`Analyzer`] trait is the seam between the state machine and the
//! network: the runtime only needs something that turns a captured still
//! into an [`AnalysisResult`]. [`GeminiClient`] is the real implementation.

pub mod client;
pub mod schema;
pub mod types;

pub use client::{GeminiClient, build_request, extract_text, parse_response};
pub use types::{AnalysisResult, Attribute};

use crate::errors::AnalysisError;
use crate::pipelines::photo::CapturedFrame;
use std::future::Future;

/// Identifies the main object in a captured frame
///
/// Stateless across calls. Failures are returned unmodified; there is no
/// retry.
pub trait Analyzer: Send + Sync + 'static {
    fn analyze(
        &self,
        frame: &CapturedFrame,
    ) -> impl Future<Output = Result<AnalysisResult, AnalysisError>> + Send;
}
