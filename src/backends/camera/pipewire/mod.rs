// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera backend
//!
//! Enumeration goes through `pw-cli`, capture through a GStreamer
//! `pipewiresrc` pipeline. On sandboxed desktops the camera portal decides
//! whether access is granted; a refusal surfaces as
//! [`BackendError::PermissionDenied`].

mod enumeration;
mod pipeline;

pub use enumeration::{enumerate_pipewire_cameras, parse_node_location, parse_pw_cli_nodes};
pub use pipeline::{PipeWirePipeline, candidate_pipelines, classify_error, target_property};

use super::types::*;
use super::{MediaSource, StreamHandle, select_device};
use crate::constants::pipeline as pipeline_consts;
use tracing::{debug, info};

/// Media source backed by PipeWire
#[derive(Debug, Clone, Default)]
pub struct PipeWireSource;

impl PipeWireSource {
    /// Initialize GStreamer and check that `pipewiresrc` exists
    pub fn new() -> BackendResult<Self> {
        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        if gstreamer::ElementFactory::find("pipewiresrc").is_none() {
            return Err(BackendError::NotAvailable(
                "GStreamer PipeWire plugin (pipewiresrc) is not installed".to_string(),
            ));
        }
        Ok(Self)
    }
}

impl MediaSource for PipeWireSource {
    type Handle = PipeWireStream;

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        enumerate_pipewire_cameras().unwrap_or_default()
    }

    fn acquire(&self, constraints: &StreamConstraints) -> BackendResult<PipeWireStream> {
        let devices = self.enumerate_cameras();
        let device = select_device(&devices, constraints.facing)
            .cloned()
            .ok_or_else(|| BackendError::DeviceNotFound("No PipeWire cameras".to_string()))?;

        let (sender, receiver) =
            futures::channel::mpsc::channel(pipeline_consts::FRAME_CHANNEL_CAPACITY);
        let pipeline = PipeWirePipeline::new(&device, constraints, sender)?;

        info!(
            device = %device.name,
            candidate = %pipeline.description,
            "Camera stream acquired"
        );

        Ok(PipeWireStream {
            device,
            pipeline: Some(pipeline),
            receiver,
            latest: None,
        })
    }
}

/// A running PipeWire camera stream
pub struct PipeWireStream {
    device: CameraDevice,
    pipeline: Option<PipeWirePipeline>,
    receiver: FrameReceiver,
    latest: Option<CameraFrame>,
}

impl StreamHandle for PipeWireStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn latest_frame(&mut self) -> Option<&CameraFrame> {
        // Drain everything queued; only the newest frame matters
        while let Ok(Some(frame)) = self.receiver.try_next() {
            self.latest = Some(frame);
        }
        self.latest.as_ref()
    }

    fn poll_error(&mut self) -> Option<BackendError> {
        self.pipeline.as_ref()?.poll_error()
    }

    fn stop(&mut self) {
        if let Some(mut pipeline) = self.pipeline.take() {
            debug!(device = %self.device.name, "Releasing camera stream");
            pipeline.stop();
        }
        self.receiver.close();
        self.latest = None;
    }

    fn is_active(&self) -> bool {
        self.pipeline.as_ref().is_some_and(|p| !p.is_stopped())
    }
}

impl Drop for PipeWireStream {
    fn drop(&mut self) {
        self.stop();
    }
}
