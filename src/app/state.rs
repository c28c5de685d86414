// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::analysis::AnalysisResult;
use crate::backends::camera::StreamHandle;
use crate::backends::camera::types::{CameraFrame, CameraMode, StreamConstraints};
use crate::config::Config;
use crate::errors::{AnalysisError, AppError, CameraError};
use crate::pipelines::photo::{CapturedFrame, FrameCapture};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Capture-and-analysis state
///
/// Exactly one is active. `Results` implies both a captured frame and a
/// result are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// Waiting for the camera
    #[default]
    Idle,
    /// Live preview running, capture allowed
    Capturing,
    /// Still sent for analysis; capture, switch and reset are disabled
    Analyzing,
    /// Identification finished
    Results,
    /// Camera or analysis failure; only reset (or switch) leaves it
    Error,
}

impl AppState {
    /// Capture and camera switch controls are shown
    pub fn accepts_camera_controls(&self) -> bool {
        !matches!(self, AppState::Analyzing)
    }

    /// Reset is meaningful
    pub fn can_reset(&self) -> bool {
        matches!(self, AppState::Results | AppState::Error)
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppState::Idle => "idle",
            AppState::Capturing => "capturing",
            AppState::Analyzing => "analyzing",
            AppState::Results => "results",
            AppState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Identifies one outstanding external request
///
/// Completions carrying any other id are stale and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the presentation layer renders
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub state: AppState,
    pub camera_mode: CameraMode,
    pub frame: Option<CapturedFrame>,
    pub result: Option<Arc<AnalysisResult>>,
}

/// Inputs to [`AppModel::update`]
///
/// The first three are user intents; the rest come from the runtime.
pub enum Message<H> {
    /// Take a still from the live stream and analyze it
    Capture,
    /// Flip between front and rear camera
    ToggleCamera,
    /// Discard frame and result, start over
    Reset,
    /// Periodic check of the live stream for asynchronous failures
    Tick,
    /// A camera acquisition finished
    CameraAcquired {
        request: RequestId,
        outcome: Result<H, CameraError>,
    },
    /// An analysis request finished
    AnalysisCompleted {
        request: RequestId,
        outcome: Result<AnalysisResult, AnalysisError>,
    },
}

impl<H> fmt::Debug for Message<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Capture => write!(f, "Capture"),
            Message::ToggleCamera => write!(f, "ToggleCamera"),
            Message::Reset => write!(f, "Reset"),
            Message::Tick => write!(f, "Tick"),
            Message::CameraAcquired { request, outcome } => f
                .debug_struct("CameraAcquired")
                .field("request", request)
                .field("ok", &outcome.is_ok())
                .finish(),
            Message::AnalysisCompleted { request, outcome } => f
                .debug_struct("AnalysisCompleted")
                .field("request", request)
                .field("outcome", outcome)
                .finish(),
        }
    }
}

/// Side effect requested by [`AppModel::update`], executed by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    None,
    /// Open a camera stream; answer with `Message::CameraAcquired`
    AcquireCamera {
        request: RequestId,
        constraints: StreamConstraints,
    },
    /// Identify a captured still; answer with `Message::AnalysisCompleted`
    Analyze {
        request: RequestId,
        frame: CapturedFrame,
    },
}

impl Task {
    pub fn is_none(&self) -> bool {
        matches!(self, Task::None)
    }
}

/// The capture-and-analysis state machine
///
/// Sole owner of the active camera stream. Mutated only through
/// [`AppModel::update`].
pub struct AppModel<H: StreamHandle> {
    pub(crate) state: AppState,
    pub(crate) camera_mode: CameraMode,
    /// Resolution request; facing follows `camera_mode`
    pub(crate) base_constraints: StreamConstraints,
    pub(crate) capture: FrameCapture,
    /// At most one live camera stream
    pub(crate) stream: Option<H>,
    pub(crate) frame: Option<CapturedFrame>,
    pub(crate) result: Option<Arc<AnalysisResult>>,
    pub(crate) last_error: Option<AppError>,
    /// The only request whose completion is accepted
    pub(crate) pending: Option<RequestId>,
    /// Acquisition handed to the runtime and not yet answered, with its facing
    pub(crate) acquiring: Option<(RequestId, CameraMode)>,
    /// Acquire again once `acquiring` lands
    pub(crate) reacquire: bool,
    pub(crate) next_request: u64,
    pub(crate) snapshot_tx: watch::Sender<Snapshot>,
}

impl<H: StreamHandle> AppModel<H> {
    /// Create the model and the first camera acquisition
    pub fn new(config: &Config) -> (Self, Task) {
        let (snapshot_tx, _) = watch::channel(Snapshot {
            camera_mode: config.camera_mode,
            ..Snapshot::default()
        });

        let mut model = Self {
            state: AppState::Idle,
            camera_mode: config.camera_mode,
            base_constraints: config.stream_constraints(config.camera_mode),
            capture: FrameCapture::new(config.jpeg_quality),
            stream: None,
            frame: None,
            result: None,
            last_error: None,
            pending: None,
            acquiring: None,
            reacquire: false,
            next_request: 0,
            snapshot_tx,
        };
        let task = model.request_camera();
        (model, task)
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.camera_mode
    }

    /// Still held since the last capture, if any
    pub fn frame(&self) -> Option<&CapturedFrame> {
        self.frame.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_deref()
    }

    /// Cause of the current `Error` state, for logs and the command line
    pub fn last_error(&self) -> Option<&AppError> {
        self.last_error.as_ref()
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        self.pending
    }

    /// Whether a camera stream is currently held
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Newest live frame for the preview
    pub fn preview_frame(&mut self) -> Option<&CameraFrame> {
        self.stream.as_mut()?.latest_frame()
    }

    /// Current presentation state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            camera_mode: self.camera_mode,
            frame: self.frame.clone(),
            result: self.result.clone(),
        }
    }

    /// Observe the latest snapshot
    ///
    /// A new value is published after every visible transition. Readers that
    /// fall behind see only the most recent one.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    pub(crate) fn constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing: self.camera_mode,
            ..self.base_constraints
        }
    }
}

impl<H: StreamHandle> Drop for AppModel<H> {
    fn drop(&mut self) {
        self.release_stream();
    }
}
