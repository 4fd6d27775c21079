//! Core types for the cell lineage library
//!
//! This module defines the records the tracker consumes (detections) and the
//! records it produces (tracks, divisions). Detection ids are only unique within
//! their own frame; everything that spans frames is expressed through track indices.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Detection id assigned by the upstream detector (unique within a frame only)
pub type DetectionId = u32;

/// Opaque voxel-cluster id
pub type SupervoxelId = u32;

/// Index of a track, assigned in creation order
pub type TrackId = usize;

/// Result type for lineage operations
pub type Result<T> = std::result::Result<T, LineageError>;

/// Raw parent value used by the detector for "no parent"
pub const ROOT_SENTINEL: i64 = -1;

/// Errors that can occur while building or querying a lineage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineageError {
    #[error("Non-contiguous frame sequence: expected time {expected}, found {found}")]
    NonContiguousFrames { expected: usize, found: usize },

    #[error("Duplicate detection id {id} in frame at time {time}")]
    DuplicateDetectionId { time: usize, id: DetectionId },

    #[error("Track not found: index {0}")]
    InvalidTrackIndex(TrackId),

    #[error("Frame out of range: {0}")]
    FrameOutOfRange(usize),

    #[error("Detection {id} not found in frame {frame}")]
    DetectionNotFound { frame: usize, id: DetectionId },

    #[error("Frame time overflows: time {time_start} + {offset}")]
    TimeOverflow { time_start: usize, offset: usize },
}

/// A point in detector coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Arithmetic mean of a set of positions, `None` when the set is empty
    pub fn mean<'a, I>(positions: I) -> Option<Position>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        let mut count = 0usize;
        let mut sum = Position::default();
        for p in positions {
            sum.x += p.x;
            sum.y += p.y;
            sum.z += p.z;
            count += 1;
        }

        if count == 0 {
            return None;
        }

        let n = count as f64;
        Some(Position::new(sum.x / n, sum.y / n, sum.z / n))
    }
}

impl From<[f64; 3]> for Position {
    fn from(p: [f64; 3]) -> Self {
        Position::new(p[0], p[1], p[2])
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Parent annotation of a detection
///
/// On the wire this is a plain integer with `-1` meaning "no parent".
/// Values that are neither the sentinel nor a valid id are kept as
/// [`ParentRef::Invalid`] so the detection stays in the store and is reported
/// as an orphan by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ParentRef {
    /// New appearance, no parent in the previous frame
    Root,
    /// Id of the parent detection in the immediately preceding frame
    Detection(DetectionId),
    /// Corrupted raw value, never matches a tip
    Invalid(i64),
}

impl From<i64> for ParentRef {
    fn from(raw: i64) -> Self {
        if raw == ROOT_SENTINEL {
            return ParentRef::Root;
        }
        DetectionId::try_from(raw)
            .map(ParentRef::Detection)
            .unwrap_or(ParentRef::Invalid(raw))
    }
}

impl From<ParentRef> for i64 {
    fn from(parent: ParentRef) -> i64 {
        match parent {
            ParentRef::Root => ROOT_SENTINEL,
            ParentRef::Detection(id) => i64::from(id),
            ParentRef::Invalid(raw) => raw,
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRef::Root => write!(f, "root"),
            ParentRef::Detection(id) => write!(f, "{}", id),
            ParentRef::Invalid(raw) => write!(f, "{} (invalid)", raw),
        }
    }
}

/// One detected point (nucleus centroid) in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector id, unique within the frame
    pub id: DetectionId,
    /// Centroid position
    pub position: Position,
    /// Supervoxels the detection is made of
    #[serde(default)]
    pub supervoxels: BTreeSet<SupervoxelId>,
    /// Parent annotation pointing into the previous frame
    pub parent: ParentRef,
}

impl Detection {
    /// Create a detection without supervoxel membership
    pub fn new(id: DetectionId, position: Position, parent: ParentRef) -> Self {
        Self {
            id,
            position,
            supervoxels: BTreeSet::new(),
            parent,
        }
    }

    /// Builder method: set supervoxel membership
    pub fn with_supervoxels(mut self, supervoxels: impl IntoIterator<Item = SupervoxelId>) -> Self {
        self.supervoxels = supervoxels.into_iter().collect();
        self
    }
}

/// A continuously tracked cell
///
/// `ids[k]` is the detection id at frame `start_frame + k`; presence is always
/// contiguous in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Creation-order index, never reused
    pub index: TrackId,
    /// Frame of the first detection
    pub start_frame: usize,
    /// Detection id per consecutive frame
    pub ids: Vec<DetectionId>,
}

impl Track {
    pub(crate) fn new(index: TrackId, start_frame: usize, first_id: DetectionId) -> Self {
        Self {
            index,
            start_frame,
            ids: vec![first_id],
        }
    }

    /// Number of frames the track spans
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the track holds no detection ids (never true for tracker output)
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Last frame the track is present in
    pub fn end_frame(&self) -> usize {
        self.start_frame + self.ids.len().saturating_sub(1)
    }

    /// Most recent detection id
    pub fn tip(&self) -> Option<DetectionId> {
        self.ids.last().copied()
    }

    /// Check whether the track is present at `frame`
    pub fn contains_frame(&self, frame: usize) -> bool {
        frame >= self.start_frame && frame < self.start_frame + self.ids.len()
    }

    /// Detection id at `frame`, if the track is present there
    pub fn id_at(&self, frame: usize) -> Option<DetectionId> {
        if self.contains_frame(frame) {
            self.ids.get(frame - self.start_frame).copied()
        } else {
            None
        }
    }

    /// `(frame, id)` pairs in time order
    pub fn iter_frames(&self) -> impl Iterator<Item = (usize, DetectionId)> + '_ {
        self.ids
            .iter()
            .enumerate()
            .map(move |(offset, id)| (self.start_frame + offset, *id))
    }
}

/// A cell division: one tip claimed as parent by two detections of the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    /// Frame at which the split is first observed
    pub frame: usize,
    /// Parent detection id (in `frame - 1`)
    pub parent_id: DetectionId,
    /// First child detection id (in `frame`)
    pub child1_id: DetectionId,
    /// Second child detection id (in `frame`)
    pub child2_id: DetectionId,
    /// Track that ends with the parent detection
    pub parent_track: TrackId,
    /// Tracks started by the two children, in the same order
    pub child_tracks: [TrackId; 2],
}

/// Recoverable per-detection problems met during the tracking pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackingIssue {
    /// The parent is not an active tip of the previous frame
    OrphanedDetection {
        frame: usize,
        id: DetectionId,
        /// Raw parent value as annotated by the detector
        parent_id: i64,
    },
    /// Third or later detection claiming a tip that already divided in this frame
    SimultaneousMultiDivision {
        frame: usize,
        id: DetectionId,
        parent_id: DetectionId,
        parent_track: TrackId,
    },
}

impl TrackingIssue {
    /// Frame the issue was observed in
    pub fn frame(&self) -> usize {
        match self {
            TrackingIssue::OrphanedDetection { frame, .. } => *frame,
            TrackingIssue::SimultaneousMultiDivision { frame, .. } => *frame,
        }
    }

    /// Detection that was dropped from the lineage
    pub fn detection_id(&self) -> DetectionId {
        match self {
            TrackingIssue::OrphanedDetection { id, .. } => *id,
            TrackingIssue::SimultaneousMultiDivision { id, .. } => *id,
        }
    }
}

impl fmt::Display for TrackingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingIssue::OrphanedDetection { frame, id, parent_id } => write!(
                f,
                "frame {}: detection {} lost track (parent {} is not an active tip)",
                frame, id, parent_id
            ),
            TrackingIssue::SimultaneousMultiDivision {
                frame,
                id,
                parent_id,
                parent_track,
            } => write!(
                f,
                "frame {}: detection {} is an extra child of {} (track {}), dropped",
                frame, id, parent_id, parent_track
            ),
        }
    }
}
