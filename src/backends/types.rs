// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::debug;

use crate::constants::capture;

/// Which physical camera a capture session targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// User-facing camera (the browser's "user" facing mode)
    #[default]
    Front,
    /// World-facing camera ("environment")
    Back,
}

impl Facing {
    /// The opposite facing
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
        }
    }
}

impl std::str::FromStr for Facing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" | "user" => Ok(Facing::Front),
            "back" | "rear" | "environment" => Ok(Facing::Back),
            other => Err(format!("unknown facing '{}'", other)),
        }
    }
}

/// Represents a capture device
#[derive(Debug, Clone)]
pub struct CameraDevice {
    /// Human-readable device name (V4L2 card name where available)
    pub name: String,
    /// Device path or backend-specific identifier
    pub path: String,
    /// Which way the sensor points, when the platform can tell
    pub facing_hint: Option<Facing>,
}

/// Constraints handed to a backend when acquiring a stream
///
/// Resolution is a preference, not a requirement - the backend reports the
/// dimensions it actually negotiated through the frames it delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: Facing,
    pub width: u32,
    pub height: u32,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::default(),
            width: capture::PREFERRED_WIDTH,
            height: capture::PREFERRED_HEIGHT,
        }
    }
}

/// A single frame delivered by a device stream
///
/// Pixel data is tightly-packed RGB24; all backends convert to this before
/// publishing, so downstream consumers never see device pixel formats.
#[derive(Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// RGB24 pixel data, `width * height * 3` bytes
    pub data: Arc<[u8]>,
    /// When the frame left the device
    pub captured_at: Instant,
}

impl fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VideoFrame({}x{}, {} bytes)",
            self.width,
            self.height,
            self.data.len()
        )
    }
}

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<VideoFrame>;

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<VideoFrame>;

struct SinkInner {
    latest: Mutex<Option<VideoFrame>>,
    preview: Mutex<Option<FrameSender>>,
}

/// The session's video sink
///
/// Backends publish frames here; the session samples the latest frame for
/// capture and a host UI may subscribe for preview. Cloning shares the sink.
#[derive(Clone)]
pub struct FrameSink {
    inner: Arc<SinkInner>,
}

impl FrameSink {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SinkInner {
                latest: Mutex::new(None),
                preview: Mutex::new(None),
            }),
        }
    }

    /// Publish a frame: update the latest-frame slot and forward to the
    /// preview channel if one is bound. A full channel drops the frame.
    pub fn publish(&self, frame: VideoFrame) {
        if let Ok(mut preview) = self.inner.preview.lock() {
            if let Some(sender) = preview.as_mut() {
                if sender.try_send(frame.clone()).is_err() {
                    debug!("Preview channel full, dropping frame");
                }
            }
        }
        if let Ok(mut latest) = self.inner.latest.lock() {
            *latest = Some(frame);
        }
    }

    /// Most recently published frame, if any
    pub fn latest(&self) -> Option<VideoFrame> {
        self.inner.latest.lock().ok().and_then(|guard| guard.clone())
    }

    /// Drop the retained frame (called when a stream is released)
    pub fn clear(&self) {
        if let Ok(mut latest) = self.inner.latest.lock() {
            *latest = None;
        }
    }

    /// Bind a preview receiver, replacing any previous subscription
    pub fn subscribe(&self) -> FrameReceiver {
        let (sender, receiver) =
            futures::channel::mpsc::channel(capture::PREVIEW_CHANNEL_CAPACITY);
        if let Ok(mut preview) = self.inner.preview.lock() {
            *preview = Some(sender);
        }
        receiver
    }
}

impl Default for FrameSink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSink")
            .field("has_frame", &self.latest().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32) -> VideoFrame {
        VideoFrame {
            width,
            height,
            data: Arc::from(vec![0u8; (width * height * 3) as usize].into_boxed_slice()),
            captured_at: Instant::now(),
        }
    }

    #[test]
    fn test_facing_toggle_round_trip() {
        assert_eq!(Facing::Front.toggled(), Facing::Back);
        assert_eq!(Facing::Front.toggled().toggled(), Facing::Front);
    }

    #[test]
    fn test_facing_parse() {
        assert_eq!("front".parse::<Facing>(), Ok(Facing::Front));
        assert_eq!("Rear".parse::<Facing>(), Ok(Facing::Back));
        assert!("sideways".parse::<Facing>().is_err());
    }

    #[test]
    fn test_sink_latest_and_clear() {
        let sink = FrameSink::new();
        assert!(sink.latest().is_none());

        sink.publish(frame(4, 2));
        assert_eq!(sink.latest().map(|f| (f.width, f.height)), Some((4, 2)));

        sink.clear();
        assert!(sink.latest().is_none());
    }

    #[test]
    fn test_sink_preview_delivery() {
        let sink = FrameSink::new();
        let mut receiver = sink.subscribe();

        sink.publish(frame(2, 2));
        let delivered = receiver.try_next().expect("channel open").expect("frame");
        assert_eq!(delivered.width, 2);
    }
}
