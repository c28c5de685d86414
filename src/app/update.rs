// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` dispatches each message to a handler, then publishes a
//! snapshot if anything visible changed. Handlers never block; device and
//! network work is returned as a [`Task`] for the runtime.

use super::state::{AppModel, AppState, Message, RequestId, Task};
use crate::analysis::AnalysisResult;
use crate::backends::camera::StreamHandle;
use crate::errors::{AnalysisError, AppError, CameraError};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl<H: StreamHandle> AppModel<H> {
    /// Apply one message and return the side effect it requests
    pub fn update(&mut self, message: Message<H>) -> Task {
        let task = match message {
            Message::Capture => self.handle_capture(),
            Message::ToggleCamera => self.handle_toggle_camera(),
            Message::Reset => self.handle_reset(),
            Message::Tick => self.handle_tick(),
            Message::CameraAcquired { request, outcome } => {
                self.handle_camera_acquired(request, outcome)
            }
            Message::AnalysisCompleted { request, outcome } => {
                self.handle_analysis_completed(request, outcome)
            }
        };
        self.publish();
        task
    }

    fn handle_capture(&mut self) -> Task {
        if self.state != AppState::Capturing {
            debug!(state = %self.state, "Capture ignored outside capturing state");
            return Task::None;
        }

        let Some(live) = self.stream.as_mut().and_then(|s| s.latest_frame()) else {
            debug!("Capture ignored: no frame available yet");
            return Task::None;
        };

        let captured = self.capture.capture(live);
        match captured {
            Ok(frame) => {
                // The stream is not needed while the still is analyzed
                self.release_stream();
                self.frame = Some(frame.clone());
                let request = self.next_request_id();
                self.pending = Some(request);
                self.transition(AppState::Analyzing);
                Task::Analyze { request, frame }
            }
            Err(e) => {
                self.fail(AppError::Capture(e));
                Task::None
            }
        }
    }

    fn handle_toggle_camera(&mut self) -> Task {
        if self.state == AppState::Analyzing {
            debug!("Camera switch ignored while analyzing");
            return Task::None;
        }

        let previous = self.camera_mode;
        self.camera_mode = previous.flipped();
        info!(from = %previous, to = %self.camera_mode, "Switching camera");

        self.release_stream();
        self.frame = None;
        self.result = None;
        self.last_error = None;
        self.transition(AppState::Idle);
        self.request_camera()
    }

    fn handle_reset(&mut self) -> Task {
        if !self.state.can_reset() {
            debug!(state = %self.state, "Reset ignored");
            return Task::None;
        }

        info!("Resetting");
        self.release_stream();
        self.frame = None;
        self.result = None;
        self.last_error = None;
        self.transition(AppState::Idle);
        self.request_camera()
    }

    fn handle_tick(&mut self) -> Task {
        if let Some(err) = self.stream.as_mut().and_then(|s| s.poll_error()) {
            error!(error = %err, "Camera stream failed");
            self.fail(AppError::Camera(CameraError::from(err)));
        }
        Task::None
    }

    fn handle_camera_acquired(
        &mut self,
        request: RequestId,
        outcome: Result<H, CameraError>,
    ) -> Task {
        if self.acquiring.is_some_and(|(id, _)| id == request) {
            self.acquiring = None;
        }

        if self.pending != Some(request) || self.state != AppState::Idle {
            debug!(%request, pending = ?self.pending, state = %self.state, "Discarding stale camera acquisition");
            if let Ok(mut handle) = outcome {
                handle.stop();
            }
            // The superseded device is closed; now open the one asked for
            if std::mem::take(&mut self.reacquire) && self.state == AppState::Idle {
                return self.request_camera();
            }
            return Task::None;
        }
        self.pending = None;

        match outcome {
            Ok(handle) => {
                info!(%request, device = %handle.device().name, "Camera ready");
                self.stream = Some(handle);
                self.transition(AppState::Capturing);
            }
            Err(e) => {
                error!(%request, error = %e, "Camera acquisition failed");
                self.fail(AppError::Camera(e));
            }
        }
        Task::None
    }

    fn handle_analysis_completed(
        &mut self,
        request: RequestId,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> Task {
        if self.pending != Some(request) || self.state != AppState::Analyzing {
            debug!(%request, pending = ?self.pending, "Discarding stale analysis result");
            return Task::None;
        }
        self.pending = None;

        match outcome {
            Ok(result) if self.frame.is_some() => {
                info!(%request, name = %result.name, "Object identified");
                self.result = Some(Arc::new(result));
                self.transition(AppState::Results);
            }
            Ok(_) => {
                // Frame is stored before Analyze is issued; keep Results honest anyway
                warn!(%request, "Analysis result without a captured frame");
                self.fail(AppError::Other("Result arrived without a frame".to_string()));
            }
            Err(e) => {
                error!(%request, error = %e, "Analysis failed");
                self.fail(AppError::Analysis(e));
            }
        }
        Task::None
    }

    /// Issue a new acquisition for the current facing mode
    ///
    /// Only one acquisition runs at a time. While one is outstanding the
    /// request is deferred until it lands, or adopted when it already targets
    /// the current facing mode.
    pub(crate) fn request_camera(&mut self) -> Task {
        if let Some((request, facing)) = self.acquiring {
            if facing == self.camera_mode {
                self.pending = Some(request);
                self.reacquire = false;
            } else {
                self.pending = None;
                self.reacquire = true;
            }
            debug!(%request, reacquire = self.reacquire, "Camera acquisition still outstanding");
            return Task::None;
        }

        let request = self.next_request_id();
        self.pending = Some(request);
        let constraints = self.constraints();
        self.acquiring = Some((request, constraints.facing));
        debug!(%request, facing = %constraints.facing, "Requesting camera");
        Task::AcquireCamera {
            request,
            constraints,
        }
    }

    /// Stop and drop the live stream, if any
    pub(crate) fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!(device = %stream.device().name, "Releasing camera");
            stream.stop();
        }
    }

    /// Enter `Error`, keeping frame and result untouched
    fn fail(&mut self, err: AppError) {
        self.release_stream();
        self.pending = None;
        self.last_error = Some(err);
        self.transition(AppState::Error);
    }

    fn transition(&mut self, to: AppState) {
        if self.state != to {
            info!(from = %self.state, to = %to, "State transition");
        }
        self.state = to;
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
