// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire GStreamer pipeline for camera capture

use super::super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::{VideoFormat, VideoInfo};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// PipeWire camera pipeline
///
/// `pipewiresrc` → decode/convert → RGBA `appsink`. Frames are copied out of
/// the GStreamer buffer and pushed into a bounded channel; when the consumer
/// falls behind, frames are dropped rather than queued.
pub struct PipeWirePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    /// Which pipeline candidate was accepted (for logs)
    pub description: String,
    stopped: bool,
}

impl PipeWirePipeline {
    /// Create and start a pipeline for `device`
    pub fn new(
        device: &CameraDevice,
        constraints: &StreamConstraints,
        frame_sender: FrameSender,
    ) -> BackendResult<Self> {
        info!(
            device = %device.name,
            facing = %constraints.facing,
            width = constraints.preferred_width,
            height = constraints.preferred_height,
            "Creating PipeWire pipeline"
        );

        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        if gstreamer::ElementFactory::find("pipewiresrc").is_none() {
            return Err(BackendError::NotAvailable(
                "pipewiresrc not available: factory not found".to_string(),
            ));
        }

        let target = target_property(&device.path);
        let mut last_error = None;
        let mut launched = None;

        // Ideal resolution first, then whatever the camera offers
        for (description, pipeline_str) in candidate_pipelines(&target, constraints) {
            debug!(candidate = description, pipeline = %pipeline_str, "Trying pipeline");
            match try_launch(&pipeline_str) {
                Ok(p) => {
                    info!(candidate = description, "Pipeline launched");
                    launched = Some((p, description));
                    break;
                }
                Err(e) => {
                    debug!(candidate = description, error = %e, "Pipeline candidate failed");
                    // A refusal will not change with different caps
                    if matches!(e, BackendError::PermissionDenied(_)) {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        let Some((pipeline, description)) = launched else {
            error!("All pipeline candidates failed");
            return Err(last_error.unwrap_or_else(|| {
                BackendError::InitializationFailed("No pipeline candidates".to_string())
            }));
        };

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast appsink".to_string())
            })?;

        install_frame_callback(&appsink, frame_sender);

        Ok(Self {
            pipeline,
            appsink,
            description: description.to_string(),
            stopped: false,
        })
    }

    /// Pop the first error or end-of-stream posted on the bus, if any
    pub fn poll_error(&self) -> Option<BackendError> {
        let bus = self.pipeline.bus()?;
        let message = bus.pop_filtered(&[
            gstreamer::MessageType::Error,
            gstreamer::MessageType::Eos,
        ])?;

        match message.view() {
            gstreamer::MessageView::Error(err) => {
                let text = err.error().to_string();
                warn!(error = %text, debug = ?err.debug(), "Camera pipeline error");
                Some(classify_error(&text))
            }
            gstreamer::MessageView::Eos(_) => {
                warn!("Camera stream ended");
                Some(BackendError::Disconnected)
            }
            _ => None,
        }
    }

    /// Stop the pipeline and release the camera
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        info!("Stopping PipeWire pipeline");

        // Clear appsink callbacks to release the frame sender
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to set pipeline to NULL");
            return;
        }

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => info!(state = ?state, "PipeWire pipeline stopped"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Drop for PipeWirePipeline {
    fn drop(&mut self) {
        if !self.stopped {
            debug!("Dropping running PipeWire pipeline");
            self.stop();
        }
    }
}

/// Map a device path to the `pipewiresrc` property selecting it
pub fn target_property(device_path: &str) -> String {
    if device_path.is_empty() {
        // Empty path = PipeWire auto-selects the default camera
        String::new()
    } else if let Some(serial) = device_path.strip_prefix("pipewire-serial-") {
        format!("target-object={} ", serial)
    } else if let Some(node_id) = device_path.strip_prefix("pipewire-") {
        format!("target-object={} ", node_id)
    } else if device_path.starts_with("/dev/video") {
        format!("path=v4l2:{} ", device_path)
    } else {
        warn!(device_path, "Unknown device path format, using path property");
        format!("path={} ", device_path)
    }
}

/// Pipeline strings to try, most specific first
pub fn candidate_pipelines(
    target: &str,
    constraints: &StreamConstraints,
) -> Vec<(&'static str, String)> {
    let size = format!(
        "width=(int){},height=(int){}",
        constraints.preferred_width, constraints.preferred_height
    );
    let sink = format!(
        "videoconvert ! video/x-raw,format={} ! \
         appsink name=sink max-buffers={} drop=true sync=false enable-last-sample=false",
        pipeline::OUTPUT_FORMAT,
        pipeline::MAX_BUFFERS
    );
    let source = format!(
        "pipewiresrc {}do-timestamp=true ! queue max-size-buffers={} leaky=downstream",
        target,
        pipeline::MAX_BUFFERS
    );

    vec![
        (
            "mjpeg-preferred",
            format!("{} ! image/jpeg,{} ! jpegdec ! {}", source, size, sink),
        ),
        (
            "raw-preferred",
            format!("{} ! video/x-raw,{} ! {}", source, size, sink),
        ),
        ("any", format!("{} ! decodebin ! {}", source, sink)),
    ]
}

fn try_launch(pipeline_str: &str) -> BackendResult<gstreamer::Pipeline> {
    let pipeline = gstreamer::parse::launch(pipeline_str)
        .map_err(|e| BackendError::InitializationFailed(format!("Failed to parse pipeline: {}", e)))?
        .downcast::<gstreamer::Pipeline>()
        .map_err(|_| BackendError::InitializationFailed("Failed to cast to pipeline".to_string()))?;

    let started = pipeline.set_state(gstreamer::State::Playing);
    let (result, state, pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
        timing::START_TIMEOUT_SECS,
    ));
    debug!(?result, ?state, ?pending, "Pipeline state after start");

    if let Some(text) = first_bus_error(&pipeline) {
        let _ = pipeline.set_state(gstreamer::State::Null);
        return Err(classify_error(&text));
    }

    if started.is_err() || result.is_err() {
        let _ = pipeline.set_state(gstreamer::State::Null);
        return Err(BackendError::InitializationFailed(format!(
            "Pipeline failed to reach PLAYING (state {:?})",
            state
        )));
    }

    if state != gstreamer::State::Playing {
        // Live sources may still be negotiating; frames arrive once ready
        debug!(?state, ?pending, "Accepting pipeline still transitioning");
    }

    Ok(pipeline)
}

fn first_bus_error(pipeline: &gstreamer::Pipeline) -> Option<String> {
    let message = pipeline
        .bus()?
        .pop_filtered(&[gstreamer::MessageType::Error])?;
    match message.view() {
        gstreamer::MessageView::Error(err) => Some(err.error().to_string()),
        _ => None,
    }
}

/// Tell permission refusals apart from other start-up failures
pub fn classify_error(message: &str) -> BackendError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("not authorized") || lower.contains("denied")
    {
        BackendError::PermissionDenied(message.to_string())
    } else if lower.contains("no such") || lower.contains("not found") {
        BackendError::DeviceNotFound(message.to_string())
    } else {
        BackendError::InitializationFailed(message.to_string())
    }
}

fn pixel_format_of(format: VideoFormat) -> Option<PixelFormat> {
    match format {
        VideoFormat::Rgba | VideoFormat::Rgbx => Some(PixelFormat::RGBA),
        VideoFormat::Rgb => Some(PixelFormat::RGB24),
        VideoFormat::Gray8 => Some(PixelFormat::Gray8),
        _ => None,
    }
}

fn install_frame_callback(appsink: &AppSink, mut frame_sender: FrameSender) {
    let mut frame_num: u64 = 0;

    appsink.set_callbacks(
        gstreamer_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let frame_start = Instant::now();
                frame_num += 1;

                let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
                let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;

                if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
                    debug!(frame = frame_num, "Buffer marked as corrupted, skipping frame");
                    return Ok(gstreamer::FlowSuccess::Ok);
                }

                let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                let video_info = VideoInfo::from_caps(caps).map_err(|e| {
                    error!(frame = frame_num, error = ?e, "Failed to get video info");
                    gstreamer::FlowError::Error
                })?;

                let Some(format) = pixel_format_of(video_info.format()) else {
                    error!(format = ?video_info.format(), "Unexpected appsink format");
                    return Err(gstreamer::FlowError::NotNegotiated);
                };

                let map = buffer.map_readable().map_err(|_| gstreamer::FlowError::Error)?;

                let frame = CameraFrame {
                    width: video_info.width(),
                    height: video_info.height(),
                    data: Arc::from(map.as_slice()),
                    format,
                    stride: video_info.stride()[0] as u32,
                    captured_at: frame_start,
                };

                if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                    debug!(
                        frame = frame_num,
                        width = frame.width,
                        height = frame.height,
                        copy_us = frame_start.elapsed().as_micros(),
                        "Frame performance"
                    );
                }

                // Non-blocking; a full channel just drops this frame
                if let Err(e) = frame_sender.try_send(frame) {
                    if e.is_disconnected() {
                        return Err(gstreamer::FlowError::Flushing);
                    }
                    debug!(frame = frame_num, "Frame dropped (channel full)");
                }

                Ok(gstreamer::FlowSuccess::Ok)
            })
            .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_property() {
        assert_eq!(target_property(""), "");
        assert_eq!(target_property("pipewire-serial-2146"), "target-object=2146 ");
        assert_eq!(target_property("pipewire-64"), "target-object=64 ");
        assert_eq!(target_property("/dev/video0"), "path=v4l2:/dev/video0 ");
    }

    #[test]
    fn test_candidates_try_preferred_resolution_first() {
        let constraints = StreamConstraints::new(CameraMode::User, 1920, 1080);
        let candidates = candidate_pipelines("target-object=64 ", &constraints);

        assert_eq!(candidates.len(), 3);
        assert!(candidates[0].1.contains("image/jpeg,width=(int)1920,height=(int)1080"));
        assert!(candidates[1].1.contains("video/x-raw,width=(int)1920"));
        assert!(!candidates[2].1.contains("width="));
        assert!(candidates.iter().all(|(_, p)| p.contains("appsink name=sink")));
    }

    #[test]
    fn test_classify_error() {
        assert!(matches!(
            classify_error("Permission denied by portal"),
            BackendError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify_error("internal data stream error"),
            BackendError::InitializationFailed(_)
        ));
    }
}
