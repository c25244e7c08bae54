// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test-pattern source
//!
//! A hardware-free backend producing gradient frames at roughly 30 fps.
//! Used by the test suite and by the CLI's `--synthetic` flag, and doubles
//! as a failure-injection harness: a backend can be built to deny every
//! acquisition, or to deny after N successful opens (which is how the
//! failed-switch path is exercised).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::types::{CameraDevice, Facing, FrameSink, StreamConstraints, VideoFrame};
use super::{CameraBackend, DeviceStream};
use crate::errors::{CaptureError, CaptureResult};

/// Frame period for the generator thread (~30 fps)
const FRAME_PERIOD: Duration = Duration::from_millis(33);

enum FailPlan {
    Never,
    Always(CaptureError),
    AfterOpens { remaining: u32, error: CaptureError },
}

/// Synthetic camera backend
pub struct SyntheticBackend {
    devices: Vec<CameraDevice>,
    fail_plan: Mutex<FailPlan>,
    live_streams: Arc<AtomicUsize>,
}

impl SyntheticBackend {
    /// Backend with one front and one back test-pattern device
    pub fn new() -> Self {
        Self::with_plan(FailPlan::Never)
    }

    /// Backend whose every acquisition fails with `error`
    pub fn failing_with(error: CaptureError) -> Self {
        Self::with_plan(FailPlan::Always(error))
    }

    /// Backend that serves `opens` acquisitions, then fails with `error`
    pub fn failing_after(opens: u32, error: CaptureError) -> Self {
        Self::with_plan(FailPlan::AfterOpens {
            remaining: opens,
            error,
        })
    }

    fn with_plan(plan: FailPlan) -> Self {
        let devices = vec![
            CameraDevice {
                name: "Synthetic Front Camera".to_string(),
                path: "synthetic:front".to_string(),
                facing_hint: Some(Facing::Front),
            },
            CameraDevice {
                name: "Synthetic Back Camera".to_string(),
                path: "synthetic:back".to_string(),
                facing_hint: Some(Facing::Back),
            },
        ];
        Self {
            devices,
            fail_plan: Mutex::new(plan),
            live_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of streams currently open on this backend.
    ///
    /// Lets tests verify that `stop()` actually releases the device rather
    /// than only flipping the session's state flag.
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    fn consult_plan(&self) -> CaptureResult<()> {
        let mut plan = self.fail_plan.lock().unwrap_or_else(|e| e.into_inner());
        match &mut *plan {
            FailPlan::Never => Ok(()),
            FailPlan::Always(error) => Err(error.clone()),
            FailPlan::AfterOpens { remaining, error } => {
                if *remaining == 0 {
                    Err(error.clone())
                } else {
                    *remaining -= 1;
                    Ok(())
                }
            }
        }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for SyntheticBackend {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_devices(&self) -> Vec<CameraDevice> {
        self.devices.clone()
    }

    fn open_stream(
        &self,
        constraints: &StreamConstraints,
        sink: FrameSink,
    ) -> CaptureResult<Box<dyn DeviceStream>> {
        self.consult_plan()?;

        let device = self
            .devices
            .iter()
            .find(|d| d.facing_hint == Some(constraints.facing))
            .cloned()
            .ok_or(CaptureError::DeviceNotFound)?;

        info!(device = %device.name, width = constraints.width, height = constraints.height,
            "Opening synthetic stream");

        let width = constraints.width;
        let height = constraints.height;

        // First frame lands before open_stream returns, so an active
        // session always has something to sample.
        sink.publish(test_pattern(width, height, 0));

        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);
        let generator = thread::spawn(move || {
            let mut seq: u64 = 1;
            while !stop_clone.load(Ordering::SeqCst) {
                sink.publish(test_pattern(width, height, seq));
                seq += 1;
                thread::sleep(FRAME_PERIOD);
            }
            debug!(frames = seq, "Synthetic generator exiting");
        });

        self.live_streams.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(SyntheticStream {
            device,
            stop,
            generator: Some(generator),
            live_streams: Arc::clone(&self.live_streams),
        }))
    }
}

struct SyntheticStream {
    device: CameraDevice,
    stop: Arc<AtomicBool>,
    generator: Option<JoinHandle<()>>,
    live_streams: Arc<AtomicUsize>,
}

impl DeviceStream for SyntheticStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn close(&mut self) {
        if let Some(handle) = self.generator.take() {
            self.stop.store(true, Ordering::SeqCst);
            let _ = handle.join();
            self.live_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Gradient test pattern: horizontal red ramp, vertical green ramp, blue
/// varying per frame so consecutive frames differ.
fn test_pattern(width: u32, height: u32, seq: u64) -> VideoFrame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push((x * 255 / width.max(1)) as u8);
            data.push((y * 255 / height.max(1)) as u8);
            data.push((seq % 256) as u8);
        }
    }
    VideoFrame {
        width,
        height,
        data: Arc::from(data.into_boxed_slice()),
        captured_at: Instant::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_dimensions() {
        let frame = test_pattern(8, 4, 0);
        assert_eq!(frame.width, 8);
        assert_eq!(frame.height, 4);
        assert_eq!(frame.data.len(), 8 * 4 * 3);
    }

    #[test]
    fn test_open_and_close_tracks_live_streams() {
        let backend = SyntheticBackend::new();
        let sink = FrameSink::new();

        let mut stream = backend
            .open_stream(&StreamConstraints::default(), sink.clone())
            .expect("stream");
        assert_eq!(backend.live_streams(), 1);
        assert!(sink.latest().is_some(), "first frame published synchronously");

        stream.close();
        stream.close(); // idempotent
        assert_eq!(backend.live_streams(), 0);
    }

    #[test]
    fn test_failure_injection() {
        let backend = SyntheticBackend::failing_with(CaptureError::PermissionDenied);
        let err = backend
            .open_stream(&StreamConstraints::default(), FrameSink::new())
            .err()
            .expect("denied");
        assert_eq!(err, CaptureError::PermissionDenied);
        assert_eq!(backend.live_streams(), 0);
    }

    #[test]
    fn test_failure_after_n_opens() {
        let backend = SyntheticBackend::failing_after(1, CaptureError::DeviceBusy);

        let first = backend.open_stream(&StreamConstraints::default(), FrameSink::new());
        assert!(first.is_ok());

        let second = backend.open_stream(&StreamConstraints::default(), FrameSink::new());
        assert_eq!(second.err(), Some(CaptureError::DeviceBusy));
    }
}
