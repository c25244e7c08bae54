// SPDX-License-Identifier: GPL-3.0-only

//! Photo-intake controller
//!
//! The host UI offers two ways to supply an image for analysis: uploading a
//! file or capturing one with the camera. At most one intake mode is live
//! at a time, and both feed the same downstream "selected file" slot.
//!
//! [`IntakeController`] makes that exclusivity structural: the single
//! transition function stops the capture session whenever the UI leaves
//! camera mode, so a device stream can never outlive the view showing it.

use tracing::info;

use crate::constants::intake;
use crate::errors::{CaptureResult, IntakeError};
use crate::session::CaptureSession;
use crate::still::StillImage;

/// Which intake path is currently presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntakeMode {
    /// File upload (drag-and-drop / picker); the default view
    #[default]
    Upload,
    /// Live camera preview
    Camera,
}

/// The single downstream "selected file" slot
///
/// Filled either by a validated upload or by a camera snapshot; consumed by
/// the (out-of-scope) request builder via [`IntakeController::take_selected`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl From<StillImage> for SelectedFile {
    fn from(still: StillImage) -> Self {
        Self {
            filename: still.filename,
            mime_type: still.mime_type.to_string(),
            data: still.data,
        }
    }
}

/// Validate an upload candidate against the backend's accepted types and
/// size limit.
pub fn validate_upload(mime_type: &str, size: usize) -> Result<(), IntakeError> {
    if !intake::ACCEPTED_MIME_TYPES.contains(&mime_type) {
        return Err(IntakeError::UnsupportedType(mime_type.to_string()));
    }
    if size > intake::MAX_UPLOAD_BYTES {
        return Err(IntakeError::FileTooLarge(size));
    }
    Ok(())
}

/// Intake controller owning the UI mode, the selected-file slot and the
/// capture session
///
/// Created on page load, torn down on navigation; dropping it drops the
/// session, which releases any live stream.
pub struct IntakeController {
    mode: IntakeMode,
    selected: Option<SelectedFile>,
    session: CaptureSession,
}

impl IntakeController {
    /// Controller starting in upload mode with an empty slot
    pub fn new(session: CaptureSession) -> Self {
        Self {
            mode: IntakeMode::Upload,
            selected: None,
            session,
        }
    }

    pub fn mode(&self) -> IntakeMode {
        self.mode
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CaptureSession {
        &mut self.session
    }

    /// The single mode transition.
    ///
    /// Leaving camera mode always stops the session (the resource-leak rule
    /// from the capture contract); entering camera mode hides any pending
    /// upload preview by clearing the slot.
    pub fn set_mode(&mut self, mode: IntakeMode) {
        if mode == self.mode {
            return;
        }

        if self.mode == IntakeMode::Camera {
            self.session.stop();
        }
        if mode == IntakeMode::Camera {
            self.selected = None;
        }

        info!(mode = ?mode, "Intake mode changed");
        self.mode = mode;
    }

    /// Start the camera for the current facing; only meaningful in camera
    /// mode, where the preview view is visible.
    pub async fn start_camera(&mut self) -> CaptureResult<()> {
        self.session.start().await
    }

    /// Attach an uploaded file to the slot after validation
    pub fn select_file(
        &mut self,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<(), IntakeError> {
        let mime_type = mime_type.into();
        validate_upload(&mime_type, data.len())?;

        self.selected = Some(SelectedFile {
            filename: filename.into(),
            mime_type,
            data,
        });
        Ok(())
    }

    /// Remove the pending upload preview
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Capture a snapshot into the selected-file slot.
    ///
    /// Mirrors the capture flow of the camera view: grab a still, release
    /// the camera, and drop back to the upload view so the preview shows
    /// the snapshot like any selected file.
    pub async fn capture_to_selection(&mut self) -> Result<&SelectedFile, IntakeError> {
        let still = self.session.capture().await?;
        self.session.stop();
        self.mode = IntakeMode::Upload;
        Ok(self.selected.insert(still.into()))
    }

    /// Hand the selected file to the request builder, emptying the slot
    pub fn take_selected(&mut self) -> Result<SelectedFile, IntakeError> {
        self.selected.take().ok_or(IntakeError::NoFileSelected)
    }
}
