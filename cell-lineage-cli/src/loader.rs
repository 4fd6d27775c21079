//! Detection and manual-track file loading
//!
//! The detector's native output is converted upstream into a JSON rendering:
//!
//! ```json
//! { "time_start": 0,
//!   "frames": [[{ "id": 1, "position": [x, y, z], "supervoxels": [4, 5], "parent": -1 }]] }
//! ```
//!
//! Records with a parent value that is neither `-1` nor a valid id are kept;
//! the tracker reports them as orphans. Structurally malformed files fail.

use anyhow::{Context, Result};
use cell_lineage::{
    Detection, DetectionId, Frame, FrameStore, LineageError, ManualTrackId, ManualTracks,
    ParentRef, Position, SupervoxelId,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct DetectionFile {
    #[serde(default)]
    time_start: usize,
    frames: Vec<Vec<DetectionRecord>>,
}

#[derive(Debug, Deserialize)]
struct DetectionRecord {
    id: DetectionId,
    position: [f64; 3],
    #[serde(default)]
    supervoxels: Vec<SupervoxelId>,
    parent: i64,
}

#[derive(Debug, Deserialize)]
struct ManualTrackFile {
    tracks: Vec<ManualTrackRecord>,
}

#[derive(Debug, Deserialize)]
struct ManualTrackRecord {
    id: ManualTrackId,
    points: Vec<ManualPointRecord>,
}

#[derive(Debug, Deserialize)]
struct ManualPointRecord {
    time: usize,
    x: f64,
    y: f64,
    z: f64,
}

/// Load a detection file into a validated frame store
pub fn load_detections(path: &Path) -> Result<FrameStore> {
    log::info!("Loading detections: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read detection file: {:?}", path))?;

    parse_detections(&content)
        .with_context(|| format!("Failed to load detection file: {:?}", path))
}

/// Parse detection JSON into a validated frame store
pub fn parse_detections(json: &str) -> Result<FrameStore> {
    let file: DetectionFile = serde_json::from_str(json).context("Invalid detection JSON")?;

    let frames = file
        .frames
        .into_iter()
        .enumerate()
        .map(|(offset, records)| {
            let time = file
                .time_start
                .checked_add(offset)
                .ok_or(LineageError::TimeOverflow {
                    time_start: file.time_start,
                    offset,
                })?;
            let detections = records
                .into_iter()
                .map(|record| into_detection(time, record))
                .collect();
            Ok(Frame::new(time, detections))
        })
        .collect::<Result<Vec<_>>>()?;

    let store = FrameStore::new(frames)?;
    log::info!(
        "Loaded {} frames with {} detections",
        store.len(),
        store.total_detections()
    );
    Ok(store)
}

fn into_detection(time: usize, record: DetectionRecord) -> Detection {
    let parent = ParentRef::from(record.parent);
    if let ParentRef::Invalid(raw) = parent {
        log::debug!(
            "Detection {} at time {} has corrupted parent {}",
            record.id,
            time,
            raw
        );
    }
    Detection::new(record.id, Position::from(record.position), parent)
        .with_supervoxels(record.supervoxels)
}

/// Load manual track annotations
pub fn load_manual_tracks(path: &Path) -> Result<ManualTracks> {
    log::info!("Loading manual tracks: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manual track file: {:?}", path))?;

    parse_manual_tracks(&content)
        .with_context(|| format!("Failed to load manual track file: {:?}", path))
}

/// Parse manual track JSON
pub fn parse_manual_tracks(json: &str) -> Result<ManualTracks> {
    let file: ManualTrackFile = serde_json::from_str(json).context("Invalid manual track JSON")?;

    let mut manual = ManualTracks::new();
    for track in file.tracks {
        for point in track.points {
            manual.insert_point(track.id, point.time, Position::new(point.x, point.y, point.z));
        }
    }

    log::debug!(
        "Loaded {} manual tracks ({} points)",
        manual.len(),
        manual.num_points()
    );
    Ok(manual)
}
