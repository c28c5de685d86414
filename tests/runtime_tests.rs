// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for task execution and the one-shot identification flow

mod common;

use common::*;
use std::sync::atomic::Ordering;
use std::time::Duration;
use vision_ai::app::{AppModel, AppState, Message, Runtime, identify_once};
use vision_ai::backends::camera::StillImageSource;
use vision_ai::backends::camera::types::{BackendError, CameraMode};
use vision_ai::config::Config;
use vision_ai::errors::{AnalysisError, AppError, CameraError};

#[tokio::test]
async fn test_runtime_round_trip() {
    let source = FakeSource::new();
    let counter = source.active.clone();
    let mut runtime = Runtime::new(
        source,
        FakeAnalyzer {
            outcome: Ok(ficus()),
        },
    );

    let (mut model, task) = AppModel::<FakeHandle>::new(&Config::default());
    runtime.spawn(task);

    let message = runtime.next().await.unwrap();
    assert!(matches!(message, Message::CameraAcquired { .. }));
    runtime.spawn(model.update(message));
    assert_eq!(model.state(), AppState::Capturing);
    assert_eq!(active(&counter), 1);

    runtime.spawn(model.update(Message::Capture));
    assert_eq!(active(&counter), 0);

    let message = runtime.next().await.unwrap();
    runtime.spawn(model.update(message));
    assert_eq!(model.state(), AppState::Results);
    assert_eq!(model.result(), Some(&ficus()));
}

#[tokio::test]
async fn test_switch_during_slow_acquisition_opens_one_device_at_a_time() {
    let source = FakeSource::slow(Duration::from_millis(100));
    let counter = source.active.clone();
    let peak = source.peak.clone();
    let mut runtime = Runtime::new(
        source,
        FakeAnalyzer {
            outcome: Ok(ficus()),
        },
    );

    let (mut model, task) = AppModel::<FakeHandle>::new(&Config::default());
    runtime.spawn(task);
    runtime.spawn(model.update(Message::ToggleCamera));

    // Give any concurrent acquisition time to finish before the model drains
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(active(&counter) <= 1);

    while model.state() != AppState::Capturing {
        let message = runtime.next().await.unwrap();
        runtime.spawn(model.update(message));
    }

    assert_eq!(model.camera_mode(), CameraMode::User);
    assert_eq!(active(&counter), 1);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_acquisition_failure_is_reported() {
    let mut runtime = Runtime::new(
        FakeSource::failing(BackendError::DeviceNotFound("none".into())),
        FakeAnalyzer {
            outcome: Ok(ficus()),
        },
    );
    let (mut model, task) = AppModel::<FakeHandle>::new(&Config::default());
    runtime.spawn(task);

    let message = runtime.next().await.unwrap();
    model.update(message);
    assert_eq!(model.state(), AppState::Error);
    assert!(matches!(
        model.last_error(),
        Some(AppError::Camera(CameraError::NoCameraFound))
    ));
}

#[tokio::test]
async fn test_identify_once_with_still_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plant.png");
    image::RgbImage::from_fn(32, 24, |x, y| image::Rgb([x as u8 * 8, y as u8 * 10, 90]))
        .save(&path)
        .unwrap();

    let (frame, result) = identify_once(
        &Config::default(),
        StillImageSource::new(&path),
        FakeAnalyzer {
            outcome: Ok(ficus()),
        },
    )
    .await
    .unwrap();

    assert_eq!((frame.width, frame.height), (32, 24));
    assert_eq!(frame.mime_type, "image/jpeg");
    assert_eq!(result.name, "Ficus Lyrata");
}

#[tokio::test]
async fn test_identify_once_surfaces_analysis_error() {
    let err = identify_once(
        &Config::default(),
        FakeSource::new(),
        FakeAnalyzer {
            outcome: Err(AnalysisError::MalformedResponse("missing field `name`".into())),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        AppError::Analysis(AnalysisError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_identify_once_surfaces_camera_error() {
    let err = identify_once(
        &Config::default(),
        FakeSource::failing(BackendError::PermissionDenied("portal".into())),
        FakeAnalyzer {
            outcome: Ok(ficus()),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        AppError::Camera(CameraError::PermissionDenied(_))
    ));
}
