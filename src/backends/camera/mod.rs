// SPDX-License-Identifier: GPL-3.0-only

//! Device media source abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  AppModel (update)  │  ← owns at most one StreamHandle
//! └──────────┬──────────┘
//!            │ Task::AcquireCamera
//!            ▼
//! ┌─────────────────────┐
//! │  MediaSource trait  │  ← facing mode + ideal resolution in, handle out
//! └──────────┬──────────┘
//!            │
//!      ┌─────┴──────┐
//!      ▼            ▼
//! ┌────────┐  ┌────────────┐
//! │PipeWire│  │Still image │
//! └────────┘  └────────────┘
//! ```

pub mod pipewire;
pub mod still_image;
pub mod types;

pub use pipewire::PipeWireSource;
pub use still_image::StillImageSource;
pub use types::*;

use tracing::debug;

/// A provider of live camera streams
///
/// `acquire` may block until the device grants or denies access; callers run
/// it off the UI thread.
pub trait MediaSource: Send + Sync + 'static {
    /// Live stream handle produced by this source
    type Handle: StreamHandle;

    /// Enumerate available cameras on this source
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Open a stream on the camera that best matches `constraints`
    ///
    /// # Returns
    /// * `Ok(Handle)` - Stream is running; frames arrive asynchronously
    /// * `Err(BackendError)` - Permission or hardware failure
    fn acquire(&self, constraints: &StreamConstraints) -> BackendResult<Self::Handle>;
}

/// An acquired, running camera stream
///
/// Implementations must release the device in `stop` and again (idempotently)
/// on drop, so a handle that goes out of scope never leaks the camera.
pub trait StreamHandle: Send + 'static {
    /// Device this stream reads from
    fn device(&self) -> &CameraDevice;

    /// Newest frame delivered so far, draining anything older
    fn latest_frame(&mut self) -> Option<&CameraFrame>;

    /// Report an asynchronous stream failure, if one happened since the last call
    fn poll_error(&mut self) -> Option<BackendError>;

    /// Stop all tracks and release the device
    fn stop(&mut self);

    /// Check whether the device is still held
    fn is_active(&self) -> bool;
}

/// Pick the camera for a facing mode
///
/// Prefers a camera whose location matches, then an external or unknown
/// camera, then whatever comes first. Facing is an ideal, not a requirement.
pub fn select_device(devices: &[CameraDevice], facing: CameraMode) -> Option<&CameraDevice> {
    let wanted = facing.preferred_location();

    let selected = devices
        .iter()
        .find(|d| d.location == wanted)
        .or_else(|| {
            devices.iter().find(|d| {
                matches!(
                    d.location,
                    CameraLocation::External | CameraLocation::Unknown
                )
            })
        })
        .or_else(|| devices.first());

    if let Some(device) = selected {
        debug!(
            facing = %facing,
            device = %device.name,
            location = %device.location,
            "Selected camera for facing mode"
        );
    }
    selected
}
