// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture front end

use std::fmt;
use std::io;

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors surfaced by the capture lifecycle
///
/// Every failure is a typed outcome; the session never retries on its own.
/// `PermissionDenied`, `DeviceNotFound` and `DeviceBusy` leave the session
/// idle so the caller can retry `start()`. `NotActive` and `EncodeFailed`
/// leave the session in whatever state it was in before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The platform refused camera access
    PermissionDenied,
    /// No capture device matched the request
    DeviceNotFound,
    /// The device is held by another application
    DeviceBusy,
    /// Operation requires an active stream
    NotActive,
    /// The frame encoder produced no data
    EncodeFailed,
    /// Anything the platform reports that has no better classification
    Unknown(String),
}

impl CaptureError {
    /// Classify a platform I/O error into the capture taxonomy.
    ///
    /// Mirrors the denial reasons a browser reports for `getUserMedia`:
    /// access denied, no device, device already in use.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => CaptureError::PermissionDenied,
            io::ErrorKind::NotFound => CaptureError::DeviceNotFound,
            _ => {
                #[cfg(unix)]
                if err.raw_os_error() == Some(libc::EBUSY) {
                    return CaptureError::DeviceBusy;
                }
                CaptureError::Unknown(err.to_string())
            }
        }
    }

    /// True for errors the user can recover from by retrying `start()`
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CaptureError::PermissionDenied
                | CaptureError::DeviceNotFound
                | CaptureError::DeviceBusy
        )
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::PermissionDenied => {
                write!(f, "Camera access denied - allow camera permissions and retry")
            }
            CaptureError::DeviceNotFound => write!(f, "No camera found on this device"),
            CaptureError::DeviceBusy => {
                write!(f, "Camera is already in use by another application")
            }
            CaptureError::NotActive => write!(f, "Capture session is not active"),
            CaptureError::EncodeFailed => write!(f, "Frame encoder produced no data"),
            CaptureError::Unknown(msg) => write!(f, "Capture error: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Errors from the photo-intake controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    /// File type outside the accepted set (JPEG, PNG)
    UnsupportedType(String),
    /// File exceeds the upload size limit
    FileTooLarge(usize),
    /// No file is attached to the intake slot
    NoFileSelected,
    /// A capture-side failure while filling the slot from the camera
    Capture(CaptureError),
}

impl fmt::Display for IntakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeError::UnsupportedType(mime) => {
                write!(f, "Unsupported file type {} - upload a JPEG or PNG image", mime)
            }
            IntakeError::FileTooLarge(size) => {
                write!(f, "File of {} bytes exceeds the 5 MB upload limit", size)
            }
            IntakeError::NoFileSelected => write!(f, "No image selected"),
            IntakeError::Capture(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for IntakeError {}

impl From<CaptureError> for IntakeError {
    fn from(err: CaptureError) -> Self {
        IntakeError::Capture(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_classification() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "EACCES");
        assert_eq!(CaptureError::from_io(&denied), CaptureError::PermissionDenied);

        let missing = io::Error::new(io::ErrorKind::NotFound, "ENOENT");
        assert_eq!(CaptureError::from_io(&missing), CaptureError::DeviceNotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_busy_errno_classification() {
        let busy = io::Error::from_raw_os_error(libc::EBUSY);
        assert_eq!(CaptureError::from_io(&busy), CaptureError::DeviceBusy);
    }

    #[test]
    fn test_recoverable_split() {
        assert!(CaptureError::DeviceBusy.is_recoverable());
        assert!(!CaptureError::NotActive.is_recoverable());
        assert!(!CaptureError::EncodeFailed.is_recoverable());
    }
}
