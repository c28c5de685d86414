// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera enumeration
//!
//! Cameras are discovered by parsing `pw-cli ls Node`. The facing of each
//! camera comes from the libcamera `api.libcamera.location` property, which
//! only `pw-cli info <id>` reports.

use super::super::types::{CameraDevice, CameraLocation};
use tracing::{debug, info, warn};

/// Enumerate cameras using PipeWire
///
/// Returns `None` when PipeWire is not usable at all. When PipeWire works but
/// `pw-cli` is missing, a single default camera is returned so PipeWire can
/// auto-select.
pub fn enumerate_pipewire_cameras() -> Option<Vec<CameraDevice>> {
    debug!("Attempting to enumerate cameras via PipeWire");

    if gstreamer::init().is_err() {
        warn!("GStreamer init failed");
        return None;
    }

    if gstreamer::ElementFactory::find("pipewiresrc").is_none() {
        debug!("pipewiresrc not available");
        return None;
    }

    if let Some(mut cameras) = try_enumerate_with_pw_cli() {
        for camera in &mut cameras {
            if let Some(node_id) = camera.metadata_path.as_deref() {
                camera.location = query_node_location(node_id);
            }
        }
        debug!(count = cameras.len(), "Found PipeWire cameras");
        return Some(cameras);
    }

    info!("Using PipeWire auto-selection (default camera)");
    Some(vec![CameraDevice {
        name: "Default Camera (PipeWire)".to_string(),
        path: String::new(), // Empty path = PipeWire auto-selects
        metadata_path: None,
        location: CameraLocation::Unknown,
    }])
}

fn try_enumerate_with_pw_cli() -> Option<Vec<CameraDevice>> {
    let output = std::process::Command::new("pw-cli")
        .args(["ls", "Node"])
        .output()
        .ok()?;

    if !output.status.success() {
        debug!("pw-cli command failed");
        return None;
    }

    let cameras = parse_pw_cli_nodes(&String::from_utf8_lossy(&output.stdout));
    if cameras.is_empty() {
        debug!("No cameras found via pw-cli");
        None
    } else {
        Some(cameras)
    }
}

/// Node properties collected while scanning one `id N, type ...` block
#[derive(Default)]
struct NodeBlock {
    id: Option<String>,
    serial: Option<String>,
    name: Option<String>,
    is_video_source: bool,
}

impl NodeBlock {
    fn into_device(self) -> Option<CameraDevice> {
        if !self.is_video_source {
            return None;
        }
        let id = self.id?;
        let name = self.name?;

        // Prefer object.serial for target-object, fall back to node ID
        let path = match &self.serial {
            Some(serial) => format!("pipewire-serial-{}", serial),
            None => format!("pipewire-{}", id),
        };

        debug!(id = %id, serial = ?self.serial, name = %name, path = %path, "Found video camera");
        Some(CameraDevice {
            name,
            path,
            metadata_path: Some(id),
            location: CameraLocation::Unknown,
        })
    }
}

/// Parse the output of `pw-cli ls Node` into video source devices
pub fn parse_pw_cli_nodes(stdout: &str) -> Vec<CameraDevice> {
    let mut cameras = Vec::new();
    let mut block = NodeBlock::default();

    for line in stdout.lines() {
        let trimmed = line.trim();

        // Node header: "id 76, type PipeWire:Interface:Node/3"
        if let Some(rest) = trimmed.strip_prefix("id ")
            && trimmed.contains("type PipeWire:Interface:Node")
        {
            if let Some(camera) = std::mem::take(&mut block).into_device() {
                cameras.push(camera);
            }
            block.id = rest.split(',').next().map(|id| id.trim().to_string());
            continue;
        }

        if trimmed.contains("media.class") && trimmed.contains("\"Video/Source\"") {
            block.is_video_source = true;
        } else if trimmed.contains("object.serial") {
            block.serial = extract_quoted_value(trimmed);
        } else if trimmed.contains("node.description") {
            block.name = extract_quoted_value(trimmed);
        }
    }

    if let Some(camera) = block.into_device() {
        cameras.push(camera);
    }

    cameras
}

/// Extract quoted value from a property line (e.g., 'property = "value"' -> "value")
fn extract_quoted_value(line: &str) -> Option<String> {
    let start = line.find('"')?;
    let end = line[start + 1..].find('"')?;
    Some(line[start + 1..start + 1 + end].to_string())
}

/// Query where a PipeWire node's camera is mounted using `pw-cli info`
fn query_node_location(node_id: &str) -> CameraLocation {
    let output = match std::process::Command::new("pw-cli")
        .args(["info", node_id])
        .output()
    {
        Ok(output) if output.status.success() => output,
        _ => {
            debug!(node_id, "Failed to query node info for location");
            return CameraLocation::Unknown;
        }
    };

    parse_node_location(&String::from_utf8_lossy(&output.stdout))
}

/// Find `api.libcamera.location = "front"` in `pw-cli info` output
pub fn parse_node_location(stdout: &str) -> CameraLocation {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| line.contains("api.libcamera.location"))
        .and_then(extract_quoted_value)
        .map(|value| CameraLocation::from_property(&value))
        .unwrap_or_default()
}
