// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture-and-analysis state machine

mod common;

use common::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use vision_ai::app::{AppModel, AppState, Message, Task};
use vision_ai::backends::camera::types::{BackendError, CameraMode};
use vision_ai::config::Config;
use vision_ai::errors::{AnalysisError, AppError, CameraError};

type Model = AppModel<FakeHandle>;

/// Model in `Capturing` with one live fake handle
fn capturing(counter: &Arc<AtomicUsize>) -> Model {
    let (mut model, task) = Model::new(&Config::default());
    let (request, constraints) = acquisition(&task);
    let task = model.update(Message::CameraAcquired {
        request,
        outcome: Ok(FakeHandle::new(counter, constraints.facing)),
    });
    assert!(task.is_none());
    assert_eq!(model.state(), AppState::Capturing);
    model
}

/// Model in `Analyzing`, returning the pending analysis task
fn analyzing(counter: &Arc<AtomicUsize>) -> (Model, Task) {
    let mut model = capturing(counter);
    let task = model.update(Message::Capture);
    assert_eq!(model.state(), AppState::Analyzing);
    (model, task)
}

#[test]
fn test_starts_idle_and_requests_camera() {
    let (model, task) = Model::new(&Config::default());
    assert_eq!(model.state(), AppState::Idle);
    assert_eq!(model.camera_mode(), CameraMode::Environment);
    assert!(model.frame().is_none());
    assert!(model.result().is_none());

    let (request, constraints) = acquisition(&task);
    assert_eq!(model.pending_request(), Some(request));
    assert_eq!(constraints.facing, CameraMode::Environment);
    assert_eq!(
        (constraints.preferred_width, constraints.preferred_height),
        (1920, 1080)
    );
}

#[test]
fn test_successful_identification_reaches_results() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut model = capturing(&counter);
    assert_eq!(active(&counter), 1);

    let task = model.update(Message::Capture);
    let (request, frame) = analysis(&task);
    assert_eq!(model.state(), AppState::Analyzing);
    assert_eq!(model.frame(), Some(&frame));
    assert_eq!((frame.width, frame.height), (8, 6));
    // Stream released once the still is taken
    assert_eq!(active(&counter), 0);

    let expected = ficus();
    model.update(Message::AnalysisCompleted {
        request,
        outcome: Ok(expected.clone()),
    });

    assert_eq!(model.state(), AppState::Results);
    assert_eq!(model.result(), Some(&expected));
    assert_eq!(model.result().map(|r| r.name.as_str()), Some("Ficus Lyrata"));
    assert_eq!(model.frame(), Some(&frame));
}

#[test]
fn test_empty_response_reaches_error_without_result() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut model, task) = analyzing(&counter);
    let (request, _) = analysis(&task);

    model.update(Message::AnalysisCompleted {
        request,
        outcome: Err(AnalysisError::EmptyResponse),
    });

    assert_eq!(model.state(), AppState::Error);
    assert!(model.result().is_none());
    assert!(matches!(
        model.last_error(),
        Some(AppError::Analysis(AnalysisError::EmptyResponse))
    ));
}

#[test]
fn test_transport_failure_keeps_frame_internally() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut model, task) = analyzing(&counter);
    let (request, frame) = analysis(&task);

    model.update(Message::AnalysisCompleted {
        request,
        outcome: Err(AnalysisError::TransportError("quota exceeded".into())),
    });

    assert_eq!(model.state(), AppState::Error);
    assert!(model.result().is_none());
    assert_eq!(model.frame(), Some(&frame));
}

#[test]
fn test_capture_outside_capturing_is_noop() {
    let counter = Arc::new(AtomicUsize::new(0));

    // Idle
    let (mut model, _) = Model::new(&Config::default());
    assert!(model.update(Message::Capture).is_none());
    assert_eq!(model.state(), AppState::Idle);
    assert!(model.frame().is_none());

    // Analyzing
    let (mut model, task) = analyzing(&counter);
    let frame = model.frame().cloned();
    let pending = model.pending_request();
    assert!(model.update(Message::Capture).is_none());
    assert_eq!(model.state(), AppState::Analyzing);
    assert_eq!(model.frame().cloned(), frame);
    assert_eq!(model.pending_request(), pending);

    // Results
    let (request, _) = analysis(&task);
    model.update(Message::AnalysisCompleted {
        request,
        outcome: Ok(ficus()),
    });
    assert!(model.update(Message::Capture).is_none());
    assert_eq!(model.state(), AppState::Results);
    assert_eq!(model.frame().cloned(), frame);

    // Error
    let (mut model, task) = analyzing(&counter);
    let (request, _) = analysis(&task);
    model.update(Message::AnalysisCompleted {
        request,
        outcome: Err(AnalysisError::EmptyResponse),
    });
    let frame = model.frame().cloned();
    assert!(model.update(Message::Capture).is_none());
    assert_eq!(model.state(), AppState::Error);
    assert_eq!(model.frame().cloned(), frame);
}

#[test]
fn test_capture_without_frame_is_noop() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut model, task) = Model::new(&Config::default());
    let (request, constraints) = acquisition(&task);
    model.update(Message::CameraAcquired {
        request,
        outcome: Ok(FakeHandle::new(&counter, constraints.facing).without_frame()),
    });

    assert!(model.update(Message::Capture).is_none());
    assert_eq!(model.state(), AppState::Capturing);
    assert!(model.frame().is_none());
    assert_eq!(active(&counter), 1);
}

#[test]
fn test_reset_from_results_and_error_clears_everything() {
    let counter = Arc::new(AtomicUsize::new(0));

    for outcome in [Ok(ficus()), Err(AnalysisError::MalformedResponse("x".into()))] {
        let (mut model, task) = analyzing(&counter);
        let (request, _) = analysis(&task);
        model.update(Message::AnalysisCompleted { request, outcome });
        assert!(matches!(model.state(), AppState::Results | AppState::Error));

        let task = model.update(Message::Reset);
        assert_eq!(model.state(), AppState::Idle);
        assert!(model.frame().is_none());
        assert!(model.result().is_none());
        assert!(model.last_error().is_none());

        // Reset re-attempts acquisition with the same facing mode
        let (_, constraints) = acquisition(&task);
        assert_eq!(constraints.facing, CameraMode::Environment);
    }
}

#[test]
fn test_reset_elsewhere_is_noop() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut model = capturing(&counter);
    assert!(model.update(Message::Reset).is_none());
    assert_eq!(model.state(), AppState::Capturing);
    assert_eq!(active(&counter), 1);

    let (mut model, _) = Model::new(&Config::default());
    let pending = model.pending_request();
    assert!(model.update(Message::Reset).is_none());
    assert_eq!(model.pending_request(), pending);
}

#[test]
fn test_toggle_from_capturing_flips_mode_and_releases_handle() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut model = capturing(&counter);
    assert_eq!(model.camera_mode(), CameraMode::Environment);

    let task = model.update(Message::ToggleCamera);
    assert_eq!(model.state(), AppState::Idle);
    assert_eq!(model.camera_mode(), CameraMode::User);
    assert!(!model.has_stream());
    assert_eq!(active(&counter), 0);

    let (_, constraints) = acquisition(&task);
    assert_eq!(constraints.facing, CameraMode::User);
}

#[test]
fn test_toggle_while_acquiring_waits_for_outstanding_device() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut model, task) = Model::new(&Config::default());
    let (first, constraints) = acquisition(&task);

    // The rear camera is still opening; no second device is requested
    assert!(model.update(Message::ToggleCamera).is_none());
    assert_eq!(model.camera_mode(), CameraMode::User);
    assert_eq!(model.state(), AppState::Idle);
    assert_eq!(model.pending_request(), None);

    // It lands, is closed, and only then the front camera is requested
    let task = model.update(Message::CameraAcquired {
        request: first,
        outcome: Ok(FakeHandle::new(&counter, constraints.facing)),
    });
    assert_eq!(active(&counter), 0);
    assert_eq!(model.state(), AppState::Idle);
    let (second, constraints) = acquisition(&task);
    assert_eq!(constraints.facing, CameraMode::User);
    assert_eq!(model.pending_request(), Some(second));

    model.update(Message::CameraAcquired {
        request: second,
        outcome: Ok(FakeHandle::new(&counter, constraints.facing)),
    });
    assert_eq!(model.state(), AppState::Capturing);
    assert_eq!(model.pending_request(), None);
    assert_eq!(active(&counter), 1);
}

#[test]
fn test_toggle_back_while_acquiring_keeps_outstanding_request() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut model, task) = Model::new(&Config::default());
    let (first, constraints) = acquisition(&task);

    assert!(model.update(Message::ToggleCamera).is_none());
    assert!(model.update(Message::ToggleCamera).is_none());
    assert_eq!(model.camera_mode(), CameraMode::Environment);
    assert_eq!(model.pending_request(), Some(first));

    let task = model.update(Message::CameraAcquired {
        request: first,
        outcome: Ok(FakeHandle::new(&counter, constraints.facing)),
    });
    assert!(task.is_none());
    assert_eq!(model.state(), AppState::Capturing);
    assert_eq!(active(&counter), 1);
}

#[test]
fn test_toggle_sequences_never_leak_handles() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut model, task) = Model::new(&Config::default());
    let mut outstanding = Some(acquisition(&task));

    for round in 0..10 {
        let task = model.update(Message::ToggleCamera);
        if !task.is_none() {
            assert!(outstanding.is_none(), "round {}: second acquisition issued", round);
            outstanding = Some(acquisition(&task));
        }

        // Let the device answer on most rounds
        if round % 3 != 0
            && let Some((request, constraints)) = outstanding.take()
        {
            let task = model.update(Message::CameraAcquired {
                request,
                outcome: Ok(FakeHandle::new(&counter, constraints.facing)),
            });
            if !task.is_none() {
                outstanding = Some(acquisition(&task));
            }
        }

        assert!(active(&counter) <= 1, "round {}", round);
    }

    // Ten flips from environment
    assert_eq!(model.camera_mode(), CameraMode::Environment);
    drop(model);
    assert_eq!(active(&counter), 0);
}

#[test]
fn test_toggle_and_reset_ignored_while_analyzing() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut model, _) = analyzing(&counter);
    let before = model.snapshot();
    let pending = model.pending_request();

    assert!(model.update(Message::ToggleCamera).is_none());
    assert!(model.update(Message::Reset).is_none());

    assert_eq!(model.snapshot(), before);
    assert_eq!(model.camera_mode(), CameraMode::Environment);
    assert_eq!(model.pending_request(), pending);
}

#[test]
fn test_camera_failure_reaches_error_and_toggle_recovers() {
    let (mut model, task) = Model::new(&Config::default());
    let (request, _) = acquisition(&task);

    model.update(Message::CameraAcquired {
        request,
        outcome: Err(CameraError::PermissionDenied("portal".into())),
    });
    assert_eq!(model.state(), AppState::Error);
    assert!(matches!(
        model.last_error(),
        Some(AppError::Camera(CameraError::PermissionDenied(_)))
    ));

    let task = model.update(Message::ToggleCamera);
    assert_eq!(model.state(), AppState::Idle);
    assert_eq!(acquisition(&task).1.facing, CameraMode::User);
}

#[test]
fn test_stream_failure_on_tick_reaches_error() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut model, task) = Model::new(&Config::default());
    let (request, constraints) = acquisition(&task);
    model.update(Message::CameraAcquired {
        request,
        outcome: Ok(FakeHandle::new(&counter, constraints.facing)
            .failing(BackendError::Disconnected)),
    });
    assert_eq!(model.state(), AppState::Capturing);

    model.update(Message::Tick);
    assert_eq!(model.state(), AppState::Error);
    assert_eq!(active(&counter), 0);
    assert!(matches!(
        model.last_error(),
        Some(AppError::Camera(CameraError::Disconnected))
    ));
}

#[test]
fn test_stale_analysis_result_is_discarded() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut model, task) = Model::new(&Config::default());
    let (camera_request, constraints) = acquisition(&task);
    model.update(Message::CameraAcquired {
        request: camera_request,
        outcome: Ok(FakeHandle::new(&counter, constraints.facing)),
    });

    // An analysis outcome tagged with the camera request id is not ours
    model.update(Message::AnalysisCompleted {
        request: camera_request,
        outcome: Ok(ficus()),
    });
    assert_eq!(model.state(), AppState::Capturing);
    assert!(model.result().is_none());
}

#[test]
fn test_subscribers_see_latest_snapshot() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut model, task) = Model::new(&Config::default());
    let mut snapshots = model.subscribe();
    assert_eq!(snapshots.borrow_and_update().state, AppState::Idle);

    let (request, constraints) = acquisition(&task);
    model.update(Message::CameraAcquired {
        request,
        outcome: Ok(FakeHandle::new(&counter, constraints.facing)),
    });
    assert!(snapshots.has_changed().unwrap());
    assert_eq!(snapshots.borrow_and_update().state, AppState::Capturing);

    let task = model.update(Message::Capture);
    assert!(snapshots.has_changed().unwrap());
    {
        let snapshot = snapshots.borrow_and_update();
        assert_eq!(snapshot.state, AppState::Analyzing);
        assert!(snapshot.frame.is_some());
    }

    // Ignored intents publish nothing
    model.update(Message::Reset);
    assert!(!snapshots.has_changed().unwrap());

    let (request, _) = analysis(&task);
    model.update(Message::AnalysisCompleted {
        request,
        outcome: Ok(ficus()),
    });
    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.state, AppState::Results);
    assert_eq!(snapshot.result.as_deref(), Some(&ficus()));

    let task = model.update(Message::ToggleCamera);
    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.state, AppState::Idle);
    assert_eq!(snapshot.camera_mode, CameraMode::User);
    assert!(snapshot.frame.is_none());
    assert!(snapshot.result.is_none());

    // A reader that falls behind sees only the newest value
    let (request, constraints) = acquisition(&task);
    model.update(Message::CameraAcquired {
        request,
        outcome: Ok(FakeHandle::new(&counter, constraints.facing)),
    });
    model.update(Message::Capture);
    assert!(snapshots.has_changed().unwrap());
    assert_eq!(snapshots.borrow_and_update().state, AppState::Analyzing);
    assert!(!snapshots.has_changed().unwrap());
}

#[test]
fn test_configured_facing_is_used() {
    let config = Config {
        camera_mode: CameraMode::User,
        preferred_width: 1280,
        preferred_height: 720,
        ..Config::default()
    };
    let (model, task): (Model, Task) = AppModel::new(&config);
    let (_, constraints) = acquisition(&task);
    assert_eq!(model.camera_mode(), CameraMode::User);
    assert_eq!(constraints.facing, CameraMode::User);
    assert_eq!(constraints.preferred_width, 1280);
}
