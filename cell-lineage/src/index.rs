//! Track index - read-only queries over a finished tracking pass
//!
//! The index holds the frame store and the lineage behind `Arc`s. Queries take
//! `&self`; only the filter set is mutable, so a configured index can be cloned
//! or shared across threads for concurrent reads.

use crate::config::{FilterConfig, MotionScale};
use crate::filter::FilterSet;
use crate::lineage::Lineage;
use crate::motion::{self, MovementPoint, Velocity};
use crate::store::FrameStore;
use crate::types::{
    DetectionId, Division, Position, Result, SupervoxelId, Track, TrackId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// One row of the track table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub index: TrackId,
    pub start_frame: usize,
    pub length: usize,
}

/// Query layer over a frame store and its lineage
#[derive(Debug, Clone)]
pub struct TrackIndex {
    store: Arc<FrameStore>,
    lineage: Arc<Lineage>,
    filter: FilterSet,
}

impl TrackIndex {
    /// Create an unfiltered index
    pub fn new(store: Arc<FrameStore>, lineage: Arc<Lineage>) -> Self {
        let filter = FilterSet::new(lineage.num_tracks());
        Self {
            store,
            lineage,
            filter,
        }
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn tracks(&self) -> &[Track] {
        self.lineage.tracks()
    }

    pub fn divisions(&self) -> &[Division] {
        self.lineage.divisions()
    }

    pub fn filter(&self) -> &FilterSet {
        &self.filter
    }

    /// Track indices passing the current filters, ascending
    pub fn filtered_tracks(&self) -> Vec<TrackId> {
        self.filter.working().iter().copied().collect()
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Keep only tracks lasting at least `min_frames` frames
    pub fn min_frame_length(&mut self, min_frames: usize, keep_previous: bool) -> &BTreeSet<TrackId> {
        self.filter
            .min_frame_length(self.lineage.tracks(), min_frames, keep_previous)
    }

    /// Exclude the given track indices
    pub fn black_list(&mut self, excluded: &[TrackId], keep_previous: bool) -> &BTreeSet<TrackId> {
        self.filter.black_list_tracks(excluded, keep_previous)
    }

    /// Apply a filter configuration (minimum length first, then black list)
    pub fn apply_filter_config(&mut self, config: &FilterConfig) -> &BTreeSet<TrackId> {
        let mut keep_previous = config.keep_previous;
        if let Some(min_frames) = config.min_frames {
            self.filter
                .min_frame_length(self.lineage.tracks(), min_frames, keep_previous);
            keep_previous = true;
        }
        if !config.black_list.is_empty() {
            self.filter
                .black_list_tracks(&config.black_list, keep_previous);
        }
        self.filter.working()
    }

    /// Remove every filter
    pub fn reset_filters(&mut self) {
        self.filter.reset();
    }

    // ------------------------------------------------------------------
    // Id <-> track lookups
    // ------------------------------------------------------------------

    /// Detection id of a track at `frame`
    ///
    /// `Ok(None)` when the track is not present at that frame.
    pub fn track_to_detection_id(&self, track: TrackId, frame: usize) -> Result<Option<DetectionId>> {
        Ok(self.lineage.track(track)?.id_at(frame))
    }

    /// Track owning a detection at `frame`
    ///
    /// `None` for detections dropped from the lineage or absent from the frame.
    pub fn detection_id_to_track(&self, id: DetectionId, frame: usize) -> Option<TrackId> {
        self.lineage.track_at(frame, id)
    }

    // ------------------------------------------------------------------
    // Per-frame queries
    // ------------------------------------------------------------------

    fn use_filter(&self, apply_filter: bool) -> bool {
        apply_filter && self.filter.is_configured()
    }

    /// Whether a detection at `frame` belongs to a track passing the filters
    fn qualifies(&self, lookup: Option<&HashMap<DetectionId, TrackId>>, id: DetectionId) -> bool {
        lookup
            .and_then(|l| l.get(&id))
            .map(|track| self.filter.passes(*track))
            .unwrap_or(false)
    }

    /// Detection ids of a frame, in detector order
    pub fn ids_in_frame(&self, frame: usize, apply_filter: bool) -> Result<Vec<DetectionId>> {
        let detections = &self.store.frame(frame)?.detections;
        if !self.use_filter(apply_filter) {
            return Ok(detections.iter().map(|d| d.id).collect());
        }

        let lookup = self.lineage.frame_lookup(frame);
        Ok(detections
            .iter()
            .filter(|d| self.qualifies(lookup, d.id))
            .map(|d| d.id)
            .collect())
    }

    /// `ids_in_frame` for every frame
    pub fn ids_in_time(&self, apply_filter: bool) -> Result<Vec<Vec<DetectionId>>> {
        (0..self.store.len())
            .map(|frame| self.ids_in_frame(frame, apply_filter))
            .collect()
    }

    /// Supervoxel membership of the detections selected by `ids_in_frame`
    pub fn supervoxels_in_frame(
        &self,
        frame: usize,
        apply_filter: bool,
    ) -> Result<Vec<(DetectionId, &BTreeSet<SupervoxelId>)>> {
        let detections = &self.store.frame(frame)?.detections;
        let filtered = self.use_filter(apply_filter);
        let lookup = self.lineage.frame_lookup(frame);

        Ok(detections
            .iter()
            .filter(|d| !filtered || self.qualifies(lookup, d.id))
            .map(|d| (d.id, &d.supervoxels))
            .collect())
    }

    /// Positions of a frame, in detector order
    ///
    /// Raw positions when `apply_filter` is false or no filter is configured,
    /// otherwise only detections whose track passes the filters.
    pub fn all_positions_at_frame(&self, frame: usize, apply_filter: bool) -> Result<Vec<Position>> {
        let detections = &self.store.frame(frame)?.detections;
        let filtered = self.use_filter(apply_filter);
        let lookup = self.lineage.frame_lookup(frame);

        Ok(detections
            .iter()
            .filter(|d| !filtered || self.qualifies(lookup, d.id))
            .map(|d| d.position)
            .collect())
    }

    /// Mean position per frame, `None` for frames without qualifying detections
    pub fn center_of_mass(&self, apply_filter: bool) -> Vec<Option<Position>> {
        (0..self.store.len())
            .map(|frame| {
                self.all_positions_at_frame(frame, apply_filter)
                    .ok()
                    .and_then(|positions| Position::mean(&positions))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Per-track queries
    // ------------------------------------------------------------------

    /// Frame-by-frame positions of a track
    pub fn whole_movement(&self, track: TrackId) -> Result<Vec<MovementPoint>> {
        self.lineage
            .track(track)?
            .iter_frames()
            .map(|(frame, id)| {
                self.store
                    .position(frame, id)
                    .map(|position| MovementPoint { frame, position })
            })
            .collect()
    }

    /// Scaled velocities along a track
    pub fn velocities(&self, track: TrackId, scale: &MotionScale) -> Result<Vec<Velocity>> {
        Ok(motion::velocities(&self.whole_movement(track)?, scale))
    }

    /// Mean scaled speed of a track, `None` for single-frame tracks
    pub fn mean_speed(&self, track: TrackId, scale: &MotionScale) -> Result<Option<f64>> {
        Ok(motion::mean_speed(&self.whole_movement(track)?, scale))
    }

    /// Scaled path length of a track
    pub fn path_length(&self, track: TrackId, scale: &MotionScale) -> Result<f64> {
        Ok(motion::path_length(&self.whole_movement(track)?, scale))
    }

    /// Per-step resultant speed of a population of tracks, `|sum v| / n`
    ///
    /// `n` counts the tracks that move over that step.
    pub fn resultant_speed(&self, tracks: &[TrackId], scale: &MotionScale) -> Result<Vec<(usize, f64)>> {
        let velocities = tracks
            .iter()
            .map(|track| self.velocities(*track, scale))
            .collect::<Result<Vec<_>>>()?;
        Ok(motion::resultant_speeds(&velocities))
    }

    /// Track table rows, optionally limited to tracks passing the filters
    pub fn track_summaries(&self, apply_filter: bool) -> Vec<TrackSummary> {
        self.lineage
            .tracks()
            .iter()
            .filter(|t| !apply_filter || self.filter.passes(t.index))
            .map(|t| TrackSummary {
                index: t.index,
                start_frame: t.start_frame,
                length: t.len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Frame;
    use crate::types::{Detection, LineageError, ParentRef};
    use crate::LineageTracker;

    fn det(id: DetectionId, parent: i64, x: f64) -> Detection {
        Detection::new(id, Position::new(x, 0.0, 0.0), ParentRef::from(parent))
            .with_supervoxels([id * 10])
    }

    /// Track 0 lasts three frames, track 1 one frame, plus an orphan in frame 1
    fn index() -> TrackIndex {
        let store = FrameStore::new(vec![
            Frame::new(0, vec![det(1, -1, 0.0), det(2, -1, 10.0)]),
            Frame::new(1, vec![det(3, 1, 1.0), det(4, 99, 20.0)]),
            Frame::new(2, vec![det(5, 3, 3.0)]),
        ])
        .unwrap();
        let lineage = LineageTracker::run(&store);
        TrackIndex::new(Arc::new(store), Arc::new(lineage))
    }

    #[test]
    fn test_id_track_lookups() {
        let index = index();
        assert_eq!(index.track_to_detection_id(0, 1), Ok(Some(3)));
        assert_eq!(index.track_to_detection_id(1, 1), Ok(None));
        assert_eq!(
            index.track_to_detection_id(7, 0),
            Err(LineageError::InvalidTrackIndex(7))
        );
        assert_eq!(index.detection_id_to_track(5, 2), Some(0));
        assert_eq!(index.detection_id_to_track(4, 1), None);
        assert_eq!(index.detection_id_to_track(5, 9), None);
    }

    #[test]
    fn test_positions_raw_until_filter_configured() {
        let index = index();
        // apply_filter has no effect before any filter is applied
        assert_eq!(index.all_positions_at_frame(1, true).unwrap().len(), 2);
        assert_eq!(index.ids_in_frame(1, true).unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_filtered_positions() {
        let mut index = index();
        index.min_frame_length(2, false);

        let xs: Vec<f64> = index
            .all_positions_at_frame(0, true)
            .unwrap()
            .iter()
            .map(|p| p.x)
            .collect();
        assert_eq!(xs, vec![0.0]);
        // Orphan is never part of a filtered selection
        assert_eq!(index.ids_in_frame(1, true).unwrap(), vec![3]);
        assert_eq!(index.all_positions_at_frame(0, false).unwrap().len(), 2);
        assert_eq!(
            index.all_positions_at_frame(5, false).unwrap_err(),
            LineageError::FrameOutOfRange(5)
        );
    }

    #[test]
    fn test_center_of_mass_undefined_for_empty_frames() {
        let mut index = index();
        let com = index.center_of_mass(false);
        assert_eq!(com[0].map(|p| p.x), Some(5.0));
        assert_eq!(com[1].map(|p| p.x), Some(10.5));

        index.black_list(&[0], false);
        let com = index.center_of_mass(true);
        assert_eq!(com[0].map(|p| p.x), Some(10.0));
        assert_eq!(com[1], None);
        assert_eq!(com[2], None);
    }

    #[test]
    fn test_whole_movement() {
        let index = index();
        let movement = index.whole_movement(0).unwrap();
        let frames: Vec<usize> = movement.iter().map(|m| m.frame).collect();
        let xs: Vec<f64> = movement.iter().map(|m| m.position.x).collect();
        assert_eq!(frames, vec![0, 1, 2]);
        assert_eq!(xs, vec![0.0, 1.0, 3.0]);
        assert_eq!(index.whole_movement(2).unwrap_err(), LineageError::InvalidTrackIndex(2));

        let scale = MotionScale::default();
        assert_eq!(index.path_length(0, &scale), Ok(3.0));
        assert_eq!(index.mean_speed(0, &scale), Ok(Some(1.5)));
        assert_eq!(index.mean_speed(1, &scale), Ok(None));
        assert_eq!(index.velocities(0, &scale).unwrap().len(), 2);
    }

    #[test]
    fn test_resultant_speed() {
        // Track 0 moves +1 then +2 along x, track 1 is a single frame
        let index = index();
        let scale = MotionScale::default();

        assert_eq!(index.resultant_speed(&[0], &scale), Ok(vec![(0, 1.0), (1, 2.0)]));
        assert_eq!(index.resultant_speed(&[0, 1], &scale), Ok(vec![(0, 1.0), (1, 2.0)]));
        assert_eq!(index.resultant_speed(&[], &scale), Ok(Vec::new()));
        assert_eq!(
            index.resultant_speed(&[0, 4], &scale),
            Err(LineageError::InvalidTrackIndex(4))
        );
    }

    #[test]
    fn test_supervoxels_and_summaries() {
        let mut index = index();
        let svs = index.supervoxels_in_frame(0, false).unwrap();
        assert_eq!(svs.len(), 2);
        assert!(svs[1].1.contains(&20));

        index.apply_filter_config(&FilterConfig::new().with_min_frames(3));
        assert_eq!(index.filtered_tracks(), vec![0]);
        assert_eq!(index.track_summaries(false).len(), 2);
        assert_eq!(
            index.track_summaries(true),
            vec![TrackSummary {
                index: 0,
                start_frame: 0,
                length: 3
            }]
        );
        assert_eq!(index.ids_in_time(true).unwrap(), vec![vec![1], vec![3], vec![5]]);

        index.reset_filters();
        assert_eq!(index.filtered_tracks(), vec![0, 1]);
    }
}
