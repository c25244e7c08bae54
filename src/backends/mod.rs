// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! This module provides a trait-based abstraction over the platform's
//! device-media API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← Lifecycle state machine
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Enumeration + stream acquisition
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐  ┌─────────┐
//!   │ V4L2 │  │Synthetic│  ← Concrete sources
//!   └──────┘  └─────────┘
//! ```

pub mod convert;
pub mod synthetic;
pub mod types;
#[cfg(target_os = "linux")]
pub mod v4l2;

pub use types::*;

use std::sync::Arc;

use crate::errors::CaptureResult;

/// Camera backend trait
///
/// A backend wraps one platform device-media API and provides:
/// - Capability detection (`is_available`)
/// - Device enumeration
/// - Stream acquisition against `StreamConstraints`
pub trait CameraBackend: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Check whether the device-media API exists on this system at all.
    ///
    /// This is a capability query, not a device probe: it may return true
    /// on a machine with zero cameras plugged in.
    fn is_available(&self) -> bool;

    /// Enumerate candidate capture devices (best-effort, may be empty)
    fn enumerate_devices(&self) -> Vec<CameraDevice>;

    /// Acquire a device stream matching the constraints.
    ///
    /// Blocks until frames are flowing into `sink` (or the acquisition
    /// fails). The returned handle owns the stream; dropping or closing it
    /// releases the device.
    fn open_stream(
        &self,
        constraints: &StreamConstraints,
        sink: FrameSink,
    ) -> CaptureResult<Box<dyn DeviceStream>>;
}

/// A live, exclusively-owned device stream
///
/// Exactly one of these exists per acquired device. `close()` releases
/// every track and is idempotent; dropping the handle closes it too, so a
/// session torn down without an explicit `stop()` still frees the camera.
pub trait DeviceStream: Send {
    /// The device this stream was opened on
    fn device(&self) -> &CameraDevice;

    /// Release the device and stop frame delivery
    fn close(&mut self);
}

/// Get the default backend for this platform
#[cfg(target_os = "linux")]
pub fn default_backend() -> Arc<dyn CameraBackend> {
    Arc::new(v4l2::V4l2Backend::new())
}

/// Get the default backend for this platform.
///
/// No real device backend exists off Linux; the synthetic source keeps the
/// rest of the stack usable there.
#[cfg(not(target_os = "linux"))]
pub fn default_backend() -> Arc<dyn CameraBackend> {
    Arc::new(synthetic::SyntheticBackend::new())
}
