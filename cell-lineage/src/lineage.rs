//! Immutable output of a tracking pass

use crate::tracker::TrackingState;
use crate::types::{DetectionId, Division, LineageError, Result, Track, TrackId, TrackingIssue};
use std::collections::HashMap;

/// Tracks, divisions and reverse lookups produced by [`crate::LineageTracker`]
///
/// Built once, never mutated afterwards. Share it behind an `Arc` for
/// concurrent readers.
#[derive(Debug, Clone, Default)]
pub struct Lineage {
    tracks: Vec<Track>,
    divisions: Vec<Division>,
    frame_lookup: Vec<HashMap<DetectionId, TrackId>>,
    issues: Vec<TrackingIssue>,
}

impl From<TrackingState> for Lineage {
    fn from(state: TrackingState) -> Self {
        let (tracks, divisions, frame_lookup, issues) = state.into_parts();
        Self {
            tracks,
            divisions,
            frame_lookup,
            issues,
        }
    }
}

impl Lineage {
    /// All tracks in creation order (`tracks()[i].index == i`)
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track by index
    pub fn track(&self, index: TrackId) -> Result<&Track> {
        self.tracks
            .get(index)
            .ok_or(LineageError::InvalidTrackIndex(index))
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Number of frames the pass covered
    pub fn num_frames(&self) -> usize {
        self.frame_lookup.len()
    }

    /// All divisions in the order they were observed
    pub fn divisions(&self) -> &[Division] {
        &self.divisions
    }

    /// Divisions first observed at `frame`
    pub fn divisions_at(&self, frame: usize) -> impl Iterator<Item = &Division> + '_ {
        self.divisions.iter().filter(move |d| d.frame == frame)
    }

    /// Division that ended the given track, if it ended in one
    pub fn division_of(&self, parent_track: TrackId) -> Option<&Division> {
        self.divisions.iter().find(|d| d.parent_track == parent_track)
    }

    /// Detections dropped from the lineage, with the reason
    pub fn issues(&self) -> &[TrackingIssue] {
        &self.issues
    }

    /// Track owning detection `id` at `frame`
    pub fn track_at(&self, frame: usize, id: DetectionId) -> Option<TrackId> {
        self.frame_lookup.get(frame)?.get(&id).copied()
    }

    /// Full id -> track table for one frame
    pub fn frame_lookup(&self, frame: usize) -> Option<&HashMap<DetectionId, TrackId>> {
        self.frame_lookup.get(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Frame;
    use crate::types::{Detection, ParentRef, Position};

    fn divided() -> Lineage {
        let d = |id, parent| Detection::new(id, Position::default(), parent);
        let state = TrackingState::seed(&Frame::new(0, vec![d(1, ParentRef::Root)]));
        let (state, _) = state.transition(&Frame::new(
            1,
            vec![d(2, ParentRef::Detection(1)), d(3, ParentRef::Detection(1))],
        ));
        Lineage::from(state)
    }

    #[test]
    fn test_track_lookup() {
        let lineage = divided();
        assert_eq!(lineage.num_tracks(), 3);
        assert_eq!(lineage.track(2).unwrap().ids, vec![3]);
        assert_eq!(lineage.track(3).unwrap_err(), LineageError::InvalidTrackIndex(3));
    }

    #[test]
    fn test_division_queries() {
        let lineage = divided();
        assert_eq!(lineage.divisions_at(1).count(), 1);
        assert_eq!(lineage.divisions_at(0).count(), 0);
        assert_eq!(lineage.division_of(0).map(|d| d.child_tracks), Some([1, 2]));
        assert!(lineage.division_of(1).is_none());
    }

    #[test]
    fn test_frame_lookup() {
        let lineage = divided();
        assert_eq!(lineage.track_at(0, 1), Some(0));
        assert_eq!(lineage.track_at(1, 2), Some(1));
        assert_eq!(lineage.track_at(1, 3), Some(2));
        assert_eq!(lineage.track_at(1, 1), None);
        assert_eq!(lineage.track_at(9, 1), None);
        assert_eq!(lineage.frame_lookup(1).map(HashMap::len), Some(2));
    }
}
