// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format conversion for device frames
//!
//! Webcams commonly deliver YUYV (packed 4:2:2) or MJPEG. Both are converted
//! to tightly-packed RGB24 before a frame enters the sink.

use image::ImageFormat;

/// Convert YUYV (YUV 4:2:2) to RGB24
///
/// YUYV format: Y0 U Y1 V - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);

    // YUYV: Y0 U Y1 V - processes 2 pixels at a time
    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

            rgb.push(r);
            rgb.push(g);
            rgb.push(b);

            if rgb.len() >= pixel_count * 3 {
                break;
            }
        }
    }

    rgb
}

/// Decode an MJPEG frame to RGB24
///
/// Returns the decoded dimensions alongside the pixels: cameras are free to
/// deliver JPEG frames at a different size than the negotiated format.
pub fn mjpeg_to_rgb(data: &[u8]) -> Result<(u32, u32, Vec<u8>), image::ImageError> {
    let decoded = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
    let rgb = decoded.to_rgb8();
    let (width, height) = (rgb.width(), rgb.height());
    Ok((width, height, rgb.into_raw()))
}
