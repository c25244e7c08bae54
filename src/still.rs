// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! Encoding runs on the blocking pool so a large frame never stalls the
//! caller's event loop.

use tracing::{debug, info};

use crate::constants::capture;
use crate::errors::{CaptureError, CaptureResult};

/// MIME type of every snapshot this crate produces
pub const SNAPSHOT_MIME: &str = "image/jpeg";

/// An encoded still image ready for upload
///
/// Produced once per `capture()` call; ownership transfers to the caller
/// and the session keeps no reference to it.
#[derive(Debug, Clone)]
pub struct StillImage {
    /// Encoded JPEG bytes
    pub data: Vec<u8>,
    /// Timestamped filename, e.g. `face_snapshot_1754550000000.jpg`
    pub filename: String,
    /// Always `image/jpeg`
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Still image encoder
#[derive(Debug, Clone, Copy)]
pub struct StillEncoder {
    quality: u8,
}

impl StillEncoder {
    /// Encoder at the default snapshot quality
    pub fn new() -> Self {
        Self {
            quality: capture::JPEG_QUALITY,
        }
    }

    /// Encoder with an explicit JPEG quality (0-100)
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.min(100),
        }
    }

    /// Encode an RGB24 pixel buffer as a JPEG snapshot.
    ///
    /// Runs the encode in a background task (CPU-bound).
    pub async fn encode(&self, width: u32, height: u32, rgb: Vec<u8>) -> CaptureResult<StillImage> {
        let quality = self.quality;
        debug!(width, height, quality, "Starting snapshot encode");

        let data = tokio::task::spawn_blocking(move || encode_jpeg(&rgb, width, height, quality))
            .await
            .map_err(|err| CaptureError::Unknown(format!("encoding task error: {}", err)))??;

        if data.is_empty() {
            return Err(CaptureError::EncodeFailed);
        }

        let filename = snapshot_filename();
        info!(filename = %filename, size = data.len(), "Snapshot encoded");

        Ok(StillImage {
            data,
            filename,
            mime_type: SNAPSHOT_MIME,
            width,
            height,
        })
    }
}

impl Default for StillEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode RGB24 pixels as JPEG
fn encode_jpeg(rgb: &[u8], width: u32, height: u32, quality: u8) -> CaptureResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode(rgb, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|_| CaptureError::EncodeFailed)?;

    Ok(buffer)
}

/// Snapshot filename carrying the capture timestamp in epoch milliseconds
fn snapshot_filename() -> String {
    format!(
        "{}_{}.jpg",
        capture::SNAPSHOT_PREFIX,
        chrono::Utc::now().timestamp_millis()
    )
}
