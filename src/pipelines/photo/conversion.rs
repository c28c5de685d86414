// SPDX-License-Identifier: GPL-3.0-only

//! Pixel layout conversion for camera frames

use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::errors::CaptureError;
use image::RgbImage;

/// Convert a camera frame into a tightly packed RGB image
///
/// Row padding (`stride` larger than the visible row) is skipped and alpha is
/// dropped.
pub fn frame_to_rgb_image(frame: &CameraFrame) -> Result<RgbImage, CaptureError> {
    if !frame.is_complete() {
        return Err(CaptureError::UnsupportedFormat(format!(
            "{}x{} {:?} frame with stride {} has only {} bytes",
            frame.width,
            frame.height,
            frame.format,
            frame.stride,
            frame.data.len()
        )));
    }

    let width = frame.width as usize;
    let bpp = frame.format.bytes_per_pixel() as usize;
    let stride = frame.stride as usize;
    let mut rgb = Vec::with_capacity(width * frame.height as usize * 3);

    for row in frame.data.chunks(stride).take(frame.height as usize) {
        let pixels = &row[..width * bpp];
        match frame.format {
            PixelFormat::RGBA => {
                for px in pixels.chunks_exact(4) {
                    rgb.extend_from_slice(&px[..3]);
                }
            }
            PixelFormat::RGB24 => rgb.extend_from_slice(pixels),
            PixelFormat::Gray8 => {
                for &y in pixels {
                    rgb.extend_from_slice(&[y, y, y]);
                }
            }
        }
    }

    RgbImage::from_raw(frame.width, frame.height, rgb).ok_or_else(|| {
        CaptureError::EncodingFailed("Failed to create RGB image from frame".to_string())
    })
}

/// Read one pixel as RGB, or `None` outside the frame
pub fn sample_pixel_rgb(frame: &CameraFrame, x: u32, y: u32) -> Option<(u8, u8, u8)> {
    if x >= frame.width || y >= frame.height {
        return None;
    }
    let offset = y as usize * frame.stride as usize + x as usize * frame.format.bytes_per_pixel() as usize;
    match frame.format {
        PixelFormat::RGBA | PixelFormat::RGB24 => {
            let px = frame.data.get(offset..offset + 3)?;
            Some((px[0], px[1], px[2]))
        }
        PixelFormat::Gray8 => frame.data.get(offset).map(|&v| (v, v, v)),
    }
}
