// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Still capture constants
pub mod capture {
    /// Ideal capture width requested from the device
    pub const PREFERRED_WIDTH: u32 = 1920;

    /// Ideal capture height requested from the device
    pub const PREFERRED_HEIGHT: u32 = 1080;

    /// MIME type of every captured still
    pub const JPEG_MIME_TYPE: &str = "image/jpeg";
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Output pixel format for appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Frames buffered between the appsink callback and the consumer
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// How long a freshly launched pipeline gets to reach PLAYING
    pub const START_TIMEOUT_SECS: u64 = 3;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Terminal input poll interval (~60 redraws per second)
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// How long the one-shot `identify` command lets the camera settle
    pub const CAMERA_WARMUP: Duration = Duration::from_millis(500);

    /// How long the one-shot `identify` command waits for a first frame
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Remote analysis service defaults
pub mod analysis {
    /// Gemini REST endpoint prefix; the model and method are appended
    pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

    /// Multimodal model used for identification
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

    /// Whole-request timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Environment variables checked (in order) for the service credential
    pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

    /// Expected number of fun facts per result (informational only)
    pub const FUN_FACTS_RANGE: std::ops::RangeInclusive<usize> = 3..=5;
}

/// Supported still image inputs
pub mod file_formats {
    /// Image file extensions the still image source accepts
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Directory name used below the user's config directory
    pub const CONFIG_DIR_NAME: &str = "vision-ai";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
