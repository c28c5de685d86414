// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! Captured stills are JPEG. The encoded bytes travel to the analysis
//! service either as raw base64 or, for display and scripting, as a
//! `data:image/jpeg;base64,...` URL.

use crate::constants::capture::JPEG_MIME_TYPE;
use crate::errors::CaptureError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Balanced; the 0.8 quality factor used for analysis uploads
    #[default]
    Medium,
    /// High quality (low compression)
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Encode an RGB image as JPEG
pub fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, CaptureError> {
    let mut buffer = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.jpeg_quality());

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CaptureError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

    debug!(
        width = image.width(),
        height = image.height(),
        quality = quality.jpeg_quality(),
        size = buffer.len(),
        "JPEG encoded"
    );
    Ok(buffer)
}

/// A still image taken from the live stream, encoded and ready to upload
///
/// Produced once per capture and discarded on reset. The bytes are shared so
/// the state machine and an in-flight analysis can hold the same frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub data: Arc<[u8]>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

impl CapturedFrame {
    /// Wrap already-encoded JPEG bytes
    pub fn jpeg(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data: Arc::from(data.into_boxed_slice()),
            mime_type: JPEG_MIME_TYPE.to_string(),
            width,
            height,
        }
    }

    /// Raw base64 of the encoded bytes, without any data-URL prefix
    pub fn base64_payload(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_payload())
    }

    /// Parse a `data:image/<type>;base64,` URL, or bare base64 treated as JPEG
    ///
    /// Dimensions are read from the decoded image header.
    pub fn from_data_url(url: &str) -> Result<Self, CaptureError> {
        let (mime_type, payload) = match url.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    CaptureError::InvalidImage("data URL has no payload".to_string())
                })?;
                let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
                    CaptureError::InvalidImage("data URL is not base64 encoded".to_string())
                })?;
                let is_image = mime_type
                    .strip_prefix("image/")
                    .is_some_and(|sub| !sub.is_empty() && sub.chars().all(char::is_alphanumeric));
                if !is_image {
                    return Err(CaptureError::InvalidImage(format!(
                        "not an image MIME type: {}",
                        mime_type
                    )));
                }
                (mime_type.to_string(), payload)
            }
            None => (JPEG_MIME_TYPE.to_string(), url),
        };

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| CaptureError::InvalidImage(format!("invalid base64: {}", e)))?;

        let (width, height) = image::ImageReader::new(std::io::Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| CaptureError::InvalidImage(e.to_string()))?
            .into_dimensions()
            .map_err(|e| CaptureError::InvalidImage(e.to_string()))?;

        Ok(Self {
            data: Arc::from(data.into_boxed_slice()),
            mime_type,
            width,
            height,
        })
    }
}
