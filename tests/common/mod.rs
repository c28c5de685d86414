// SPDX-License-Identifier: GPL-3.0-only

//! Fakes shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vision_ai::analysis::{AnalysisResult, Analyzer};
use vision_ai::app::{RequestId, Task};
use vision_ai::backends::camera::types::{
    BackendError, BackendResult, CameraDevice, CameraFrame, CameraLocation, CameraMode,
    PixelFormat, StreamConstraints,
};
use vision_ai::backends::camera::{MediaSource, StreamHandle};
use vision_ai::errors::AnalysisError;
use vision_ai::pipelines::photo::CapturedFrame;

/// Camera handle that counts how many are alive and not stopped
pub struct FakeHandle {
    device: CameraDevice,
    frame: Option<CameraFrame>,
    error: Option<BackendError>,
    active: Arc<AtomicUsize>,
    stopped: bool,
}

impl FakeHandle {
    pub fn new(active: &Arc<AtomicUsize>, facing: CameraMode) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self {
            device: CameraDevice {
                name: format!("fake {}", facing),
                path: format!("fake-{}", facing),
                metadata_path: None,
                location: facing.preferred_location(),
            },
            frame: Some(test_frame()),
            error: None,
            active: Arc::clone(active),
            stopped: false,
        }
    }

    /// A handle whose stream has not produced a frame yet
    pub fn without_frame(mut self) -> Self {
        self.frame = None;
        self
    }

    /// A handle that reports a failure on the next poll
    pub fn failing(mut self, error: BackendError) -> Self {
        self.error = Some(error);
        self
    }
}

impl StreamHandle for FakeHandle {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn latest_frame(&mut self) -> Option<&CameraFrame> {
        self.frame.as_ref()
    }

    fn poll_error(&mut self) -> Option<BackendError> {
        self.error.take()
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_active(&self) -> bool {
        !self.stopped
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Media source handing out fake handles, or failing
pub struct FakeSource {
    pub active: Arc<AtomicUsize>,
    /// Most handles ever alive at once
    pub peak: Arc<AtomicUsize>,
    pub fail_with: Option<BackendError>,
    /// Time each acquisition blocks for
    pub delay: Duration,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            fail_with: None,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(error: BackendError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new()
        }
    }

    /// A source whose device takes `delay` to open
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }
}

impl MediaSource for FakeSource {
    type Handle = FakeHandle;

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        Vec::new()
    }

    fn acquire(&self, constraints: &StreamConstraints) -> BackendResult<FakeHandle> {
        std::thread::sleep(self.delay);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => {
                let handle = FakeHandle::new(&self.active, constraints.facing);
                self.peak.fetch_max(active(&self.active), Ordering::SeqCst);
                Ok(handle)
            }
        }
    }
}

/// Analyzer returning a canned outcome
pub struct FakeAnalyzer {
    pub outcome: Result<AnalysisResult, AnalysisError>,
}

impl Analyzer for FakeAnalyzer {
    async fn analyze(&self, frame: &CapturedFrame) -> Result<AnalysisResult, AnalysisError> {
        assert_eq!(frame.mime_type, "image/jpeg");
        assert!(!frame.data.is_empty());
        self.outcome.clone()
    }
}

/// 8x6 RGBA gradient
pub fn test_frame() -> CameraFrame {
    let mut data = Vec::with_capacity(8 * 6 * 4);
    for y in 0..6u8 {
        for x in 0..8u8 {
            data.extend_from_slice(&[x * 30, y * 40, 128, 255]);
        }
    }
    CameraFrame::packed(8, 6, PixelFormat::RGBA, data)
}

pub fn ficus() -> AnalysisResult {
    AnalysisResult::from_json(
        r#"{
            "name": "Ficus Lyrata",
            "category": "Plant",
            "description": "...",
            "funFacts": ["a", "b", "c"],
            "attributes": [{"label": "Habitat", "value": "Tropical"}]
        }"#,
    )
    .unwrap()
}

/// Request id of an acquisition task
pub fn acquisition(task: &Task) -> (RequestId, StreamConstraints) {
    match task {
        Task::AcquireCamera {
            request,
            constraints,
        } => (*request, *constraints),
        other => panic!("expected AcquireCamera, got {:?}", other),
    }
}

/// Request id and frame of an analysis task
pub fn analysis(task: &Task) -> (RequestId, CapturedFrame) {
    match task {
        Task::Analyze { request, frame } => (*request, frame.clone()),
        other => panic!("expected Analyze, got {:?}", other),
    }
}

pub fn active(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
