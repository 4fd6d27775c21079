//! Manually annotated tracks
//!
//! An overlay supplied by external tools (e.g. an interactive annotation UI).
//! Manual tracks live in their own id space and are never merged with or
//! validated against the automatically reconstructed lineage.

use crate::types::Position;
use std::collections::BTreeMap;

/// Identifier of a manual track, chosen by the annotation tool
pub type ManualTrackId = u32;

/// Manual tracks keyed by their external id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualTracks {
    tracks: BTreeMap<ManualTrackId, BTreeMap<usize, Position>>,
}

impl ManualTracks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the position of a manual track at an absolute time
    ///
    /// A second point for the same track and time replaces the first.
    pub fn insert_point(&mut self, track: ManualTrackId, time: usize, position: Position) {
        self.tracks.entry(track).or_default().insert(time, position);
    }

    /// Manual track ids, ascending
    pub fn track_ids(&self) -> impl Iterator<Item = ManualTrackId> + '_ {
        self.tracks.keys().copied()
    }

    /// Time-sorted points of a manual track
    pub fn points(&self, track: ManualTrackId) -> Option<Vec<(usize, Position)>> {
        self.tracks
            .get(&track)
            .map(|points| points.iter().map(|(t, p)| (*t, *p)).collect())
    }

    /// Number of manual tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Total number of annotated points
    pub fn num_points(&self) -> usize {
        self.tracks.values().map(BTreeMap::len).sum()
    }
}
