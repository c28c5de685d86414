// SPDX-License-Identifier: GPL-3.0-only

//! Capture-and-analysis state machine
//!
//! # Architecture
//!
//! - `state`: `AppState`, `AppModel`, `Message`, `Task`, `Snapshot`
//! - `update`: transition handlers
//! - `runtime`: executes tasks on tokio and feeds outcomes back
//!
//! ```text
//!  intents ──▶ AppModel::update ──▶ Task ──▶ Runtime ──┐
//!     ▲              │                                  │
//!     │          Snapshot (watch)          Message (request id)
//!     │              ▼                                  │
//!  presentation ◀────┘          AppModel::update ◀──────┘
//! ```
//!
//! # Main Types
//!
//! - `AppModel`: owns state, facing mode, the live stream, frame and result
//! - `Message`: user intents plus task outcomes
//! - `Task`: explicit request objects for device and network work

mod runtime;
mod state;
mod update;

pub use runtime::{Runtime, identify_once};
pub use state::{AppModel, AppState, Message, RequestId, Snapshot, Task};
