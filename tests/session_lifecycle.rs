// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture lifecycle
//!
//! Exercises the public API end-to-end against the synthetic backend:
//! the happy snapshot path, the denial path, and the failed-switch path.

use skincam::backends::CameraBackend;
use skincam::backends::synthetic::SyntheticBackend;
use skincam::{CaptureError, CaptureSession, Facing, SessionState};
use std::sync::Arc;

#[tokio::test]
async fn snapshot_round_trip() {
    let backend = Arc::new(SyntheticBackend::new());
    let mut session = CaptureSession::new(backend.clone() as Arc<dyn CameraBackend>);

    // Idle session, device available
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.is_supported());

    // start() -> active, stream present
    session.start().await.expect("start");
    assert_eq!(session.state(), SessionState::Active);
    assert!(session.has_stream());

    // capture() -> a named JPEG snapshot
    let still = session.capture().await.expect("capture");
    assert_eq!(still.mime_type, "image/jpeg");
    assert!(still.data.len() > 0);
    assert!(still.filename.starts_with("face_snapshot_"));
    assert!(still.filename.ends_with(".jpg"));

    // stop() -> idle, stream released
    session.stop();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.has_stream());
    assert_eq!(backend.live_streams(), 0);
}

#[tokio::test]
async fn permission_denied_leaves_session_idle() {
    let backend = Arc::new(SyntheticBackend::failing_with(CaptureError::PermissionDenied));
    let mut session = CaptureSession::new(backend as Arc<dyn CameraBackend>);

    let err = session.start().await.err().expect("denied");
    assert_eq!(err, CaptureError::PermissionDenied);
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.has_stream());

    // Denial is recoverable: the session can be retried as-is
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn failed_switch_turns_camera_off() {
    let backend = Arc::new(SyntheticBackend::failing_after(1, CaptureError::DeviceNotFound));
    let mut session = CaptureSession::new(backend.clone() as Arc<dyn CameraBackend>);

    session.start().await.expect("first acquisition");
    assert_eq!(session.facing(), Facing::Front);

    let err = session.switch_facing().await.err().expect("re-acquire fails");
    assert_eq!(err, CaptureError::DeviceNotFound);

    // Camera ends off - never a stale active state holding a dead stream
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.has_stream());
    assert_eq!(backend.live_streams(), 0);
}

#[tokio::test]
async fn preview_frames_flow_while_active() {
    let backend = Arc::new(SyntheticBackend::new());
    let mut session = CaptureSession::new(backend as Arc<dyn CameraBackend>);
    let mut preview = session.subscribe_preview();

    session.start().await.expect("start");

    // The generator runs at ~30 fps; a frame shows up quickly
    let frame = tokio::time::timeout(std::time::Duration::from_secs(2), async {
        loop {
            if let Ok(Some(frame)) = preview.try_next() {
                break frame;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("frame within deadline");

    assert_eq!(frame.data.len() as u32, frame.width * frame.height * 3);
    session.stop();
}

#[tokio::test]
async fn snapshot_saves_to_disk() {
    let backend = Arc::new(SyntheticBackend::new());
    let mut session = CaptureSession::new(backend as Arc<dyn CameraBackend>);

    session.start().await.expect("start");
    let still = session.capture().await.expect("capture");
    session.stop();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(&still.filename);
    std::fs::write(&path, &still.data).expect("write");

    let read_back = std::fs::read(&path).expect("read");
    assert_eq!(read_back, still.data);
}
