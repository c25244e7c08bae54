// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Capture session tuning
pub mod capture {
    use std::time::Duration;

    /// Preferred stream width requested from the device
    pub const PREFERRED_WIDTH: u32 = 1280;

    /// Preferred stream height requested from the device
    pub const PREFERRED_HEIGHT: u32 = 720;

    /// JPEG quality for encoded snapshots (0-100)
    pub const JPEG_QUALITY: u8 = 95;

    /// Filename prefix for captured snapshots
    pub const SNAPSHOT_PREFIX: &str = "face_snapshot";

    /// How long `start()` waits for the first frame before giving up.
    /// Covers device warm-up; the platform's own permission-prompt
    /// timeouts are not modeled here.
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

    /// Bounded preview channel depth; overflow drops frames
    pub const PREVIEW_CHANNEL_CAPACITY: usize = 30;

    /// Number of memory-mapped buffers for the V4L2 stream
    pub const STREAM_BUFFER_COUNT: u32 = 4;
}

/// Photo-intake validation
pub mod intake {
    /// Upload size cap applied before a file is attached to a request
    pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

    /// MIME types the analysis backend accepts
    pub const ACCEPTED_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];
}
