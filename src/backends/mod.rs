// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │      State machine / runtime        │
//! └─────────────────┬───────────────────┘
//!                   │ MediaSource::acquire
//! ┌─────────────────┴───────────────────┐
//! │            Backend Layer            │
//! │  ┌─────────────┐  ┌──────────────┐  │
//! │  │  PipeWire   │  │ Still image  │  │
//! │  └─────────────┘  └──────────────┘  │
//! └─────────────────────────────────────┘
//! ```

pub mod camera;
