// SPDX-License-Identifier: GPL-3.0-only

//! Task execution
//!
//! Runs the [`Task`]s returned by `AppModel::update` and turns their outcomes
//! back into messages tagged with the originating request id. Camera
//! acquisition may block on a permission prompt, so it goes to the blocking
//! pool; analysis is plain async I/O.

use super::state::{AppModel, AppState, Message, Task};
use crate::analysis::{AnalysisResult, Analyzer};
use crate::backends::camera::{MediaSource, StreamHandle};
use crate::config::Config;
use crate::constants::timing;
use crate::errors::{AppError, AppResult, CameraError, CaptureError};
use crate::pipelines::photo::CapturedFrame;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Executes tasks on the current tokio runtime
pub struct Runtime<S: MediaSource, A: Analyzer> {
    source: Arc<S>,
    analyzer: Arc<A>,
    sender: mpsc::UnboundedSender<Message<S::Handle>>,
    receiver: mpsc::UnboundedReceiver<Message<S::Handle>>,
}

impl<S: MediaSource, A: Analyzer> Runtime<S, A> {
    pub fn new(source: S, analyzer: A) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            source: Arc::new(source),
            analyzer: Arc::new(analyzer),
            sender,
            receiver,
        }
    }

    /// Start a task; its outcome arrives later through [`Runtime::next`]
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, task: Task) {
        match task {
            Task::None => {}
            Task::AcquireCamera {
                request,
                constraints,
            } => {
                let source = Arc::clone(&self.source);
                let sender = self.sender.clone();
                debug!(%request, facing = %constraints.facing, "Spawning camera acquisition");

                tokio::task::spawn_blocking(move || {
                    let outcome = source.acquire(&constraints).map_err(CameraError::from);
                    if let Err(mpsc::error::SendError(message)) =
                        sender.send(Message::CameraAcquired { request, outcome })
                    {
                        // Nobody is listening any more; do not leak the device
                        if let Message::CameraAcquired {
                            outcome: Ok(mut handle),
                            ..
                        } = message
                        {
                            warn!(%request, "Camera acquired after shutdown, releasing");
                            handle.stop();
                        }
                    }
                });
            }
            Task::Analyze { request, frame } => {
                let analyzer = Arc::clone(&self.analyzer);
                let sender = self.sender.clone();
                debug!(%request, "Spawning analysis");

                tokio::spawn(async move {
                    let outcome = analyzer.analyze(&frame).await;
                    if sender
                        .send(Message::AnalysisCompleted { request, outcome })
                        .is_err()
                    {
                        debug!(%request, "Analysis finished after shutdown");
                    }
                });
            }
        }
    }

    /// Wait for the next task outcome
    pub async fn next(&mut self) -> Option<Message<S::Handle>> {
        self.receiver.recv().await
    }

    /// Take a finished outcome without waiting
    pub fn try_next(&mut self) -> Option<Message<S::Handle>> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the next outcome and apply it
    async fn settle(&mut self, model: &mut AppModel<S::Handle>) -> AppResult<()> {
        let message = self
            .next()
            .await
            .ok_or_else(|| AppError::Other("Task runtime stopped".to_string()))?;
        let task = model.update(message);
        self.spawn(task);
        Ok(())
    }
}

/// Run one capture-and-analysis cycle without a presentation layer
///
/// Acquires the camera for `config.camera_mode`, lets it warm up, captures
/// the newest frame and waits for the analysis. Any failure is returned as
/// the cause recorded by the state machine.
pub async fn identify_once<S: MediaSource, A: Analyzer>(
    config: &Config,
    source: S,
    analyzer: A,
) -> AppResult<(CapturedFrame, Arc<AnalysisResult>)> {
    let (mut model, task) = AppModel::<S::Handle>::new(config);
    let mut runtime = Runtime::new(source, analyzer);
    runtime.spawn(task);

    runtime.settle(&mut model).await?;
    let start = Instant::now();

    loop {
        runtime.spawn(model.update(Message::Tick));
        if model.state() != AppState::Capturing {
            return Err(failure(&model));
        }
        if start.elapsed() >= timing::CAMERA_WARMUP && model.preview_frame().is_some() {
            break;
        }
        if start.elapsed() >= timing::FIRST_FRAME_TIMEOUT {
            return Err(CaptureError::NoFrameAvailable.into());
        }
        tokio::time::sleep(timing::UI_POLL_INTERVAL).await;
    }

    let task = model.update(Message::Capture);
    if model.state() != AppState::Analyzing {
        return Err(failure(&model));
    }
    runtime.spawn(task);
    runtime.settle(&mut model).await?;

    let snapshot = model.snapshot();
    match (model.state(), snapshot.frame, snapshot.result) {
        (AppState::Results, Some(frame), Some(result)) => Ok((frame, result)),
        _ => Err(failure(&model)),
    }
}

fn failure<H: StreamHandle>(model: &AppModel<H>) -> AppError {
    model.last_error().cloned().unwrap_or_else(|| {
        AppError::Other(format!("Unexpected state: {}", model.state()))
    })
}
