// SPDX-License-Identifier: GPL-3.0-only

//! skincam - camera capture front end for the skin-health advisory client
//!
//! This library owns the camera capture lifecycle (acquire device stream →
//! preview → capture frame → release device) and the photo-intake mode
//! arbitration in front of it. It produces encoded JPEG snapshots ready to
//! be attached to an analysis request; talking to the analysis backend is
//! the host application's job.
//!
//! # Architecture
//!
//! - [`session`]: the capture lifecycle state machine
//! - [`backends`]: device-media platform abstraction (V4L2, synthetic)
//! - [`still`]: snapshot encoding
//! - [`intake`]: upload/camera mode controller and the selected-file slot
//! - [`config`]: user configuration handling
//!
//! # Example
//!
//! ```no_run
//! use skincam::CaptureSession;
//!
//! # async fn snap() -> Result<(), skincam::CaptureError> {
//! let mut session = CaptureSession::with_default_backend();
//! session.start().await?;
//! let still = session.capture().await?;
//! session.stop();
//! println!("{} ({} bytes)", still.filename, still.data.len());
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod intake;
pub mod session;
pub mod still;

// Re-export commonly used types
pub use backends::types::{CameraDevice, Facing, FrameReceiver, StreamConstraints, VideoFrame};
pub use config::CaptureConfig;
pub use errors::{CaptureError, IntakeError};
pub use intake::{IntakeController, IntakeMode, SelectedFile};
pub use session::{CaptureSession, SessionState};
pub use still::StillImage;
