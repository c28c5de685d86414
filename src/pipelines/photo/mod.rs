// SPDX-License-Identifier: GPL-3.0-only

//! Still capture pipeline
//!
//! ```text
//! Live stream → newest CameraFrame → RGB (stride-aware) → JPEG → CapturedFrame
//! ```
//!
//! Capture runs at source resolution; the frame is never scaled.

pub mod conversion;
pub mod encoding;

pub use conversion::{frame_to_rgb_image, sample_pixel_rgb};
pub use encoding::{CapturedFrame, EncodingQuality, encode_jpeg};

use crate::backends::camera::types::CameraFrame;
use crate::errors::CaptureError;
use std::time::Instant;
use tracing::info;

/// Turns a live frame into an encoded still
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCapture {
    quality: EncodingQuality,
}

impl FrameCapture {
    pub fn new(quality: EncodingQuality) -> Self {
        Self { quality }
    }

    /// Encode `frame` as a JPEG still
    pub fn capture(&self, frame: &CameraFrame) -> Result<CapturedFrame, CaptureError> {
        let start = Instant::now();
        let rgb = frame_to_rgb_image(frame)?;
        let data = encode_jpeg(&rgb, self.quality)?;

        info!(
            width = frame.width,
            height = frame.height,
            bytes = data.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Still captured"
        );
        Ok(CapturedFrame::jpeg(data, frame.width, frame.height))
    }
}
