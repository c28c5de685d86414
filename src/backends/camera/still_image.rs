// SPDX-License-Identifier: GPL-3.0-only

//! Media source that serves a single image file as a camera
//!
//! Used for `--image` and for machines without a camera. The "stream" holds
//! one decoded frame and hands it out until stopped.

use super::types::*;
use super::{MediaSource, StreamHandle};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Serves a still image in place of a live camera
#[derive(Debug, Clone)]
pub struct StillImageSource {
    path: PathBuf,
}

impl StillImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn device(&self) -> CameraDevice {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Still image".to_string());
        CameraDevice {
            name,
            path: self.path.display().to_string(),
            metadata_path: None,
            location: CameraLocation::External,
        }
    }
}

impl MediaSource for StillImageSource {
    type Handle = StillImageStream;

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![self.device()]
    }

    fn acquire(&self, constraints: &StreamConstraints) -> BackendResult<StillImageStream> {
        // Facing mode means nothing for a file; the same image serves both
        debug!(path = %self.path.display(), facing = %constraints.facing, "Opening still image");
        let frame = load_frame(&self.path)?;
        info!(
            path = %self.path.display(),
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Still image loaded"
        );
        Ok(StillImageStream {
            device: self.device(),
            frame: Some(frame),
        })
    }
}

/// Decode an image file into a packed camera frame
pub fn load_frame(path: &Path) -> BackendResult<CameraFrame> {
    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(file_formats::is_image_extension);
    if !supported {
        return Err(BackendError::Other(format!(
            "Unsupported image file: {}",
            path.display()
        )));
    }

    if !path.exists() {
        return Err(BackendError::DeviceNotFound(path.display().to_string()));
    }

    let image = image::open(path).map_err(|e| BackendError::IoError(e.to_string()))?;
    let (width, height) = (image.width(), image.height());

    // Keep grayscale and RGB images in their native layout
    let frame = match image {
        image::DynamicImage::ImageLuma8(gray) => {
            CameraFrame::packed(width, height, PixelFormat::Gray8, gray.into_raw())
        }
        image::DynamicImage::ImageRgb8(rgb) => {
            CameraFrame::packed(width, height, PixelFormat::RGB24, rgb.into_raw())
        }
        other => CameraFrame::packed(width, height, PixelFormat::RGBA, other.to_rgba8().into_raw()),
    };
    Ok(frame)
}

/// Stream handle over a single decoded frame
pub struct StillImageStream {
    device: CameraDevice,
    frame: Option<CameraFrame>,
}

impl StreamHandle for StillImageStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn latest_frame(&mut self) -> Option<&CameraFrame> {
        self.frame.as_ref()
    }

    fn poll_error(&mut self) -> Option<BackendError> {
        None
    }

    fn stop(&mut self) {
        self.frame = None;
    }

    fn is_active(&self) -> bool {
        self.frame.is_some()
    }
}
