// SPDX-License-Identifier: GPL-3.0-only

//! Camera capture lifecycle
//!
//! [`CaptureSession`] owns a device video stream and walks it through
//! `IDLE → STARTING → ACTIVE → (SWITCHING | STOPPING) → IDLE`. The stream
//! handle is present exactly while the session is `Active`; every operation
//! re-checks that invariant after it transitions.
//!
//! The session knows nothing about uploads or the analysis backend - a
//! produced [`StillImage`] is handed to the caller and forgotten.

use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backends::types::{
    CameraDevice, Facing, FrameReceiver, FrameSink, StreamConstraints, VideoFrame,
};
use crate::backends::{CameraBackend, DeviceStream};
use crate::config::CaptureConfig;
use crate::errors::{CaptureError, CaptureResult};
use crate::still::{StillEncoder, StillImage};

/// Capture lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No stream held; `start()` is valid. Also the terminal state.
    #[default]
    Idle,
    /// Awaiting device permission / stream resolution
    Starting,
    /// Stream attached, frames flowing, capture valid
    Active,
    /// Releasing the stream to re-acquire with the other facing
    Switching,
    /// Releasing the stream on the way back to `Idle`
    Stopping,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Active => "active",
            SessionState::Switching => "switching",
            SessionState::Stopping => "stopping",
        };
        write!(f, "{}", name)
    }
}

/// Pixel surface the session samples frames into
///
/// Resized to the frame's native dimensions on every blit, like a canvas
/// sized to the video element before drawing.
#[derive(Debug, Default)]
pub struct FrameSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a frame into the surface at the frame's native size
    pub fn blit(&mut self, frame: &VideoFrame) {
        self.width = frame.width;
        self.height = frame.height;
        self.pixels.clear();
        self.pixels.extend_from_slice(&frame.data);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB24 contents of the surface
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Camera capture session
///
/// Constructed by the host UI, one per camera-enabled view. All mutation
/// goes through the lifecycle operations; `&mut self` makes reentrancy
/// impossible and the state preconditions reject out-of-sequence calls.
pub struct CaptureSession {
    backend: Arc<dyn CameraBackend>,
    config: CaptureConfig,
    facing: Facing,
    state: SessionState,
    stream: Option<Box<dyn DeviceStream>>,
    sink: FrameSink,
    surface: FrameSurface,
    encoder: StillEncoder,
}

impl CaptureSession {
    /// Session over an explicit backend with default configuration
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self::with_config(backend, CaptureConfig::default())
    }

    /// Session over the platform's default backend
    pub fn with_default_backend() -> Self {
        Self::new(crate::backends::default_backend())
    }

    pub fn with_config(backend: Arc<dyn CameraBackend>, config: CaptureConfig) -> Self {
        let facing = config.facing;
        let encoder = StillEncoder::with_quality(config.jpeg_quality);
        Self {
            backend,
            config,
            facing,
            state: SessionState::Idle,
            stream: None,
            sink: FrameSink::new(),
            surface: FrameSurface::new(),
            encoder,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Whether a device stream is currently attached.
    ///
    /// Holds exactly when `state() == Active`; exposed so callers (and the
    /// test suite) can observe the invariant directly.
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// The device behind the attached stream, if any
    pub fn active_device(&self) -> Option<&CameraDevice> {
        self.stream.as_deref().map(|s| s.device())
    }

    /// Pure capability query: does this platform expose a device-media API
    /// at all? Does not require a camera to be present.
    pub fn is_supported(&self) -> bool {
        self.backend.is_available()
    }

    /// Enumerate candidate capture devices (best-effort, possibly empty).
    /// Never mutates session state.
    pub fn list_available_devices(&self) -> Vec<CameraDevice> {
        self.backend.enumerate_devices()
    }

    /// Bind a preview receiver to the session's video sink
    pub fn subscribe_preview(&self) -> FrameReceiver {
        self.sink.subscribe()
    }

    /// Read access to the frame surface (last sampled frame)
    pub fn surface(&self) -> &FrameSurface {
        &self.surface
    }

    /// Acquire the device stream and begin rendering frames to the sink.
    ///
    /// Valid from `Idle`; calling while already `Active` is a successful
    /// no-op and does not acquire a second stream. On failure the session
    /// returns to `Idle` with no stream attached.
    pub async fn start(&mut self) -> CaptureResult<()> {
        match self.state {
            SessionState::Active => {
                info!("Camera already active");
                self.debug_invariant();
                return Ok(());
            }
            SessionState::Idle => {}
            other => {
                // Unreachable through the public API (&mut self), kept as a
                // guard for completeness.
                warn!(state = %other, "start() called mid-transition");
                return Err(CaptureError::NotActive);
            }
        }

        self.state = SessionState::Starting;
        let result = self.acquire().await;
        self.debug_invariant();
        result
    }

    /// Toggle between front and back camera.
    ///
    /// Valid only from `Active`. Releases the current stream, then
    /// re-acquires with the new facing; if the re-acquire fails the session
    /// ends `Idle` (camera off) rather than keeping a stale stream. The
    /// facing toggle sticks either way.
    pub async fn switch_facing(&mut self) -> CaptureResult<()> {
        if self.state != SessionState::Active {
            return Err(CaptureError::NotActive);
        }

        self.state = SessionState::Switching;
        self.release_stream();
        self.facing = self.facing.toggled();
        info!(facing = %self.facing, "Switching camera facing");

        let result = self.acquire().await;
        self.debug_invariant();
        result
    }

    /// Capture a still from the live stream.
    ///
    /// Samples the current frame into the frame surface at its native
    /// dimensions, then encodes it as JPEG off-thread. Does not stop the
    /// session; callers decide whether to `stop()` afterward.
    pub async fn capture(&mut self) -> CaptureResult<StillImage> {
        if self.state != SessionState::Active {
            return Err(CaptureError::NotActive);
        }

        // start() waited for the first frame, so the sink has one; an empty
        // sink here means the encoder has nothing to work with.
        let frame = self.sink.latest().ok_or(CaptureError::EncodeFailed)?;
        self.surface.blit(&frame);

        let still = self
            .encoder
            .encode(
                self.surface.width(),
                self.surface.height(),
                self.surface.pixels().to_vec(),
            )
            .await?;

        self.debug_invariant();
        Ok(still)
    }

    /// Release the device stream and return to `Idle`.
    ///
    /// Best-effort from any state and idempotent; calling from `Idle` is a
    /// no-op.
    pub fn stop(&mut self) {
        if self.state == SessionState::Idle && self.stream.is_none() {
            return;
        }

        self.state = SessionState::Stopping;
        self.release_stream();
        self.state = SessionState::Idle;
        info!("Camera stopped");
        self.debug_invariant();
    }

    /// Shared acquisition path for `start()` and `switch_facing()`
    async fn acquire(&mut self) -> CaptureResult<()> {
        let backend = Arc::clone(&self.backend);
        let constraints = StreamConstraints {
            facing: self.facing,
            width: self.config.width,
            height: self.config.height,
        };
        let sink = self.sink.clone();

        // Device acquisition blocks on permission prompts and warm-up;
        // suspend rather than stall the caller's event loop.
        let acquired =
            tokio::task::spawn_blocking(move || backend.open_stream(&constraints, sink)).await;

        match acquired {
            Ok(Ok(stream)) => {
                info!(device = %stream.device().name, facing = %self.facing, "Camera started");
                self.stream = Some(stream);
                self.state = SessionState::Active;
                Ok(())
            }
            Ok(Err(err)) => {
                warn!(error = %err, "Stream acquisition failed");
                self.sink.clear();
                self.state = SessionState::Idle;
                Err(err)
            }
            Err(join_err) => {
                self.sink.clear();
                self.state = SessionState::Idle;
                Err(CaptureError::Unknown(format!(
                    "acquisition task failed: {}",
                    join_err
                )))
            }
        }
    }

    /// Release every track of the stream and clear the sink
    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
        self.sink.clear();
    }

    fn debug_invariant(&self) {
        debug_assert_eq!(
            self.stream.is_some(),
            self.state == SessionState::Active,
            "device stream must be present exactly while the session is active"
        );
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        // A view torn down without stop() must still release the camera
        self.release_stream();
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("backend", &self.backend.name())
            .field("state", &self.state)
            .field("facing", &self.facing)
            .field("has_stream", &self.stream.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::synthetic::SyntheticBackend;

    fn session_with(backend: SyntheticBackend) -> (Arc<SyntheticBackend>, CaptureSession) {
        let backend = Arc::new(backend);
        let session = CaptureSession::new(backend.clone() as Arc<dyn CameraBackend>);
        (backend, session)
    }

    #[tokio::test]
    async fn test_stream_present_iff_active() {
        let (_, mut session) = session_with(SyntheticBackend::new());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.has_stream());

        session.start().await.expect("start");
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.has_stream());

        session.stop();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.has_stream());
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (backend, mut session) = session_with(SyntheticBackend::new());

        session.start().await.expect("start");
        session.start().await.expect("second start is a no-op");
        assert_eq!(backend.live_streams(), 1, "no second stream acquired");

        session.stop();
        assert_eq!(backend.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (_, mut session) = session_with(SyntheticBackend::new());
        session.start().await.expect("start");

        session.stop();
        session.stop();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.has_stream());
    }

    #[tokio::test]
    async fn test_capture_requires_active_stream() {
        let (_, mut session) = session_with(SyntheticBackend::new());
        let err = session.capture().await.err().expect("must fail");
        assert_eq!(err, CaptureError::NotActive);
    }

    #[tokio::test]
    async fn test_switch_requires_active_stream() {
        let (_, mut session) = session_with(SyntheticBackend::new());
        let err = session.switch_facing().await.err().expect("must fail");
        assert_eq!(err, CaptureError::NotActive);
        assert_eq!(session.facing(), Facing::Front, "facing untouched");
    }

    #[tokio::test]
    async fn test_switch_toggles_facing_once() {
        let (_, mut session) = session_with(SyntheticBackend::new());
        session.start().await.expect("start");
        assert_eq!(session.facing(), Facing::Front);

        session.switch_facing().await.expect("switch to back");
        assert_eq!(session.facing(), Facing::Back);
        assert!(session.is_active());

        session.switch_facing().await.expect("switch to front");
        assert_eq!(session.facing(), Facing::Front);
    }

    #[tokio::test]
    async fn test_failed_start_returns_to_idle() {
        let (_, mut session) =
            session_with(SyntheticBackend::failing_with(CaptureError::PermissionDenied));

        let err = session.start().await.err().expect("denied");
        assert_eq!(err, CaptureError::PermissionDenied);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.has_stream());
    }

    #[tokio::test]
    async fn test_failed_switch_ends_idle_not_stale() {
        let (backend, mut session) =
            session_with(SyntheticBackend::failing_after(1, CaptureError::DeviceBusy));

        session.start().await.expect("first acquisition succeeds");
        let err = session.switch_facing().await.err().expect("re-acquire fails");
        assert_eq!(err, CaptureError::DeviceBusy);

        assert_eq!(session.state(), SessionState::Idle, "camera off, not stale");
        assert!(!session.has_stream());
        assert_eq!(backend.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_capture_yields_jpeg_snapshot() {
        let (_, mut session) = session_with(SyntheticBackend::new());
        session.start().await.expect("start");

        let still = session.capture().await.expect("capture");
        assert_eq!(still.mime_type, "image/jpeg");
        assert!(!still.data.is_empty());
        assert!(still.filename.starts_with("face_snapshot_"));
        assert!(still.filename.ends_with(".jpg"));

        // Capture leaves the camera running
        assert!(session.is_active());
        session.stop();
    }

    #[tokio::test]
    async fn test_surface_tracks_native_frame_size() {
        let (_, mut session) = session_with(SyntheticBackend::new());
        session.start().await.expect("start");
        session.capture().await.expect("capture");

        let surface = session.surface();
        assert_eq!(surface.width(), 1280);
        assert_eq!(surface.height(), 720);
        assert_eq!(surface.pixels().len(), 1280 * 720 * 3);
        session.stop();
    }

    #[tokio::test]
    async fn test_drop_releases_stream() {
        let backend = Arc::new(SyntheticBackend::new());
        {
            let mut session = CaptureSession::new(backend.clone() as Arc<dyn CameraBackend>);
            session.start().await.expect("start");
            assert_eq!(backend.live_streams(), 1);
        }
        assert_eq!(backend.live_streams(), 0, "drop released the device");
    }

    #[tokio::test]
    async fn test_list_devices_never_mutates_state() {
        let (_, session) = session_with(SyntheticBackend::new());
        let devices = session.list_available_devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.is_supported());
    }
}
