// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Real device capture on Linux. A worker thread owns the device and its
//! memory-mapped stream, converts each frame to RGB24 and publishes it to
//! the session's sink; the stream handle stops the thread on close.
//!
//! Linux has no first-class front/back notion for UVC cameras, so facing is
//! inferred from the card name where possible and falls back to enumeration
//! order (first device = front, second = back).

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

use super::convert::{mjpeg_to_rgb, yuyv_to_rgb};
use super::types::{CameraDevice, Facing, FrameSink, StreamConstraints, VideoFrame};
use super::{CameraBackend, DeviceStream};
use crate::constants::capture;
use crate::errors::{CaptureError, CaptureResult};

/// V4L2 backend
pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for V4l2Backend {
    fn name(&self) -> &'static str {
        "v4l2"
    }

    fn is_available(&self) -> bool {
        // The video4linux class directory exists whenever the kernel API
        // does, with or without a camera plugged in.
        Path::new("/sys/class/video4linux").exists()
    }

    fn enumerate_devices(&self) -> Vec<CameraDevice> {
        let mut nodes: Vec<(u32, String)> = Vec::new();

        for entry in std::fs::read_dir("/dev").into_iter().flatten().flatten() {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            let Some(index) = name_str
                .strip_prefix("video")
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };
            nodes.push((index, format!("/dev/{}", name_str)));
        }
        nodes.sort_by_key(|(index, _)| *index);

        let mut devices = Vec::new();
        for (_, path) in nodes {
            let dev = match Device::with_path(&path) {
                Ok(d) => d,
                Err(err) => {
                    debug!(path = %path, error = %err, "Skipping unopenable node");
                    continue;
                }
            };

            let caps = match dev.query_caps() {
                Ok(c) => c,
                Err(err) => {
                    debug!(path = %path, error = %err, "QUERYCAP failed");
                    continue;
                }
            };

            // Metadata nodes share the card name but expose no capture
            // formats; filter them out.
            let formats: Vec<_> = dev.enum_formats().into_iter().flatten().collect();
            if formats.is_empty() {
                continue;
            }

            devices.push(CameraDevice {
                name: caps.card.clone(),
                path: path.clone(),
                facing_hint: facing_from_name(&caps.card),
            });
        }

        devices
    }

    fn open_stream(
        &self,
        constraints: &StreamConstraints,
        sink: FrameSink,
    ) -> CaptureResult<Box<dyn DeviceStream>> {
        let devices = self.enumerate_devices();
        let device = select_device(&devices, constraints.facing)
            .cloned()
            .ok_or(CaptureError::DeviceNotFound)?;

        info!(device = %device.name, path = %device.path, facing = %constraints.facing,
            "Opening V4L2 stream");

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_sender, ready_receiver) = mpsc::channel();

        let path = device.path.clone();
        let loop_constraints = constraints.clone();
        let loop_stop = Arc::clone(&stop);
        let worker = thread::spawn(move || {
            capture_loop(&path, &loop_constraints, sink, loop_stop, ready_sender);
        });

        // Wait until the first frame is flowing (device warm-up) or the
        // worker reports an acquisition failure.
        match ready_receiver.recv_timeout(capture::FIRST_FRAME_TIMEOUT) {
            Ok(Ok(())) => Ok(Box::new(V4l2Stream {
                device,
                stop,
                worker: Some(worker),
            })),
            Ok(Err(err)) => {
                let _ = worker.join();
                Err(err)
            }
            Err(_) => {
                stop.store(true, Ordering::SeqCst);
                Err(CaptureError::Unknown(
                    "timed out waiting for the first frame".to_string(),
                ))
            }
        }
    }
}

struct V4l2Stream {
    device: CameraDevice,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl DeviceStream for V4l2Stream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn close(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.stop.store(true, Ordering::SeqCst);
            if handle.join().is_err() {
                warn!(device = %self.device.name, "Capture thread panicked");
            }
        }
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Capture loop running in a separate thread
///
/// Opens the device, negotiates a format (MJPEG preferred, YUYV fallback)
/// and publishes converted frames until the stop signal. The first
/// `ready` message carries either success (after the first published
/// frame) or the classified acquisition error.
fn capture_loop(
    path: &str,
    constraints: &StreamConstraints,
    sink: FrameSink,
    stop: Arc<AtomicBool>,
    ready: mpsc::Sender<CaptureResult<()>>,
) {
    let dev = match Device::with_path(path) {
        Ok(d) => d,
        Err(err) => {
            let _ = ready.send(Err(CaptureError::from_io(&err)));
            return;
        }
    };

    let fourcc_mjpg = FourCC::new(b"MJPG");
    let fourcc_yuyv = FourCC::new(b"YUYV");

    // Prefer MJPEG at the requested resolution, fall back to YUYV
    let requested = Format::new(constraints.width, constraints.height, fourcc_mjpg);
    let format = match dev.set_format(&requested) {
        Ok(f) if f.fourcc == fourcc_mjpg => f,
        _ => {
            let requested = Format::new(constraints.width, constraints.height, fourcc_yuyv);
            match dev.set_format(&requested) {
                Ok(f) => f,
                Err(err) => {
                    let _ = ready.send(Err(CaptureError::from_io(&err)));
                    return;
                }
            }
        }
    };

    if format.fourcc != fourcc_mjpg && format.fourcc != fourcc_yuyv {
        let _ = ready.send(Err(CaptureError::Unknown(format!(
            "device offers no supported pixel format (got {:?})",
            format.fourcc
        ))));
        return;
    }

    info!(
        width = format.width,
        height = format.height,
        fourcc = ?format.fourcc,
        "V4L2 format configured"
    );

    let mut stream = match Stream::with_buffers(&dev, Type::VideoCapture, capture::STREAM_BUFFER_COUNT)
    {
        Ok(s) => s,
        Err(err) => {
            let _ = ready.send(Err(CaptureError::from_io(&err)));
            return;
        }
    };

    let mut announced = false;

    while !stop.load(Ordering::SeqCst) {
        let (buf, _meta) = match stream.next() {
            Ok(frame) => frame,
            Err(err) => {
                if !announced {
                    let _ = ready.send(Err(CaptureError::from_io(&err)));
                    return;
                }
                warn!(error = %err, "Failed to capture frame");
                continue;
            }
        };

        let (width, height, rgb) = if format.fourcc == fourcc_mjpg {
            match mjpeg_to_rgb(buf) {
                Ok(decoded) => decoded,
                Err(err) => {
                    // Some cameras deliver truncated JPEGs while warming up
                    warn!(error = %err, "Dropping undecodable MJPEG frame");
                    continue;
                }
            }
        } else {
            (
                format.width,
                format.height,
                yuyv_to_rgb(buf, format.width, format.height),
            )
        };

        sink.publish(VideoFrame {
            width,
            height,
            data: Arc::from(rgb.into_boxed_slice()),
            captured_at: Instant::now(),
        });

        if !announced {
            announced = true;
            let _ = ready.send(Ok(()));
        }
    }

    info!(path, "Capture loop stopped");
}

/// Infer facing from a device card name
fn facing_from_name(name: &str) -> Option<Facing> {
    let lower = name.to_ascii_lowercase();
    if lower.contains("front") {
        Some(Facing::Front)
    } else if lower.contains("back") || lower.contains("rear") {
        Some(Facing::Back)
    } else {
        None
    }
}

/// Pick the device for a facing: explicit hint first, enumeration order
/// as fallback.
fn select_device(devices: &[CameraDevice], facing: Facing) -> Option<&CameraDevice> {
    devices
        .iter()
        .find(|d| d.facing_hint == Some(facing))
        .or_else(|| match facing {
            Facing::Front => devices.first(),
            Facing::Back => devices.get(1).or_else(|| devices.first()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, facing_hint: Option<Facing>) -> CameraDevice {
        CameraDevice {
            name: name.to_string(),
            path: format!("/dev/{}", name),
            facing_hint,
        }
    }

    #[test]
    fn test_facing_from_name() {
        assert_eq!(facing_from_name("Front Camera: ov9734"), Some(Facing::Front));
        assert_eq!(facing_from_name("Rear camera"), Some(Facing::Back));
        assert_eq!(facing_from_name("HD Pro Webcam C920"), None);
    }

    #[test]
    fn test_select_device_prefers_hint() {
        let devices = vec![
            device("video0", None),
            device("video2", Some(Facing::Back)),
        ];
        let selected = select_device(&devices, Facing::Back).expect("device");
        assert_eq!(selected.name, "video2");
    }

    #[test]
    fn test_select_device_order_fallback() {
        let devices = vec![device("video0", None), device("video2", None)];
        assert_eq!(select_device(&devices, Facing::Front).map(|d| d.name.as_str()), Some("video0"));
        assert_eq!(select_device(&devices, Facing::Back).map(|d| d.name.as_str()), Some("video2"));

        let single = vec![device("video0", None)];
        assert_eq!(select_device(&single, Facing::Back).map(|d| d.name.as_str()), Some("video0"));
        assert!(select_device(&[], Facing::Front).is_none());
    }
}
