// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for capture operations
//!
//! This module provides command-line functionality for:
//! - Listing available capture devices
//! - Taking a snapshot

use skincam::backends::synthetic::SyntheticBackend;
use skincam::backends::{self, CameraBackend};
use skincam::{CaptureConfig, CaptureSession, Facing};
use std::path::PathBuf;
use std::sync::Arc;

fn pick_backend(synthetic: bool) -> Arc<dyn CameraBackend> {
    if synthetic {
        Arc::new(SyntheticBackend::new())
    } else {
        backends::default_backend()
    }
}

/// List all available capture devices
pub fn list_devices(synthetic: bool) -> Result<(), Box<dyn std::error::Error>> {
    let backend = pick_backend(synthetic);

    if !backend.is_available() {
        println!("Camera capture is not supported on this system.");
        return Ok(());
    }

    let devices = backend.enumerate_devices();
    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, device) in devices.iter().enumerate() {
        let facing = device
            .facing_hint
            .map(|f| format!(", {}-facing", f))
            .unwrap_or_default();
        println!("  [{}] {} ({}{})", index, device.name, device.path, facing);
    }

    Ok(())
}

/// Start a session, capture one snapshot, save it, and release the device
pub fn snap(
    facing: &str,
    output: Option<PathBuf>,
    synthetic: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let facing: Facing = facing.parse()?;
    let backend = pick_backend(synthetic);

    let mut config = CaptureConfig::load();
    config.facing = facing;
    // Remember the facing for the next run; a missing config dir is not fatal
    let _ = config.save();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let mut session = CaptureSession::with_config(backend, config);

        println!("Starting {} camera...", facing);
        session.start().await?;

        let still = session.capture().await?;
        session.stop();

        // Resolve output path: explicit file, explicit directory, or the
        // default snapshot directory with the snapshot's own filename
        let path = match output {
            Some(p) if p.is_dir() => p.join(&still.filename),
            Some(p) => p,
            None => default_snapshot_dir().join(&still.filename),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &still.data)?;

        println!(
            "Snapshot saved: {} ({}x{}, {} bytes)",
            path.display(),
            still.width,
            still.height,
            still.data.len()
        );
        Ok(())
    })
}

/// Default directory for saved snapshots
fn default_snapshot_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("skincam")
}
