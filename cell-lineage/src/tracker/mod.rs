//! Lineage tracker
//!
//! Single forward pass over a frame store. Frame `t + 1` depends on the tips
//! left by frame `t`, so frames are processed strictly in order and detections
//! within a frame strictly in detector order.

mod state;

pub use state::{TrackingState, TransitionStats};

use crate::lineage::Lineage;
use crate::store::FrameStore;

/// Lineage tracker - reconstructs tracks and divisions from parent annotations
pub struct LineageTracker;

impl LineageTracker {
    /// Run the tracking pass over the whole store
    ///
    /// Per-detection data problems (orphans, extra children) are logged and
    /// recorded in [`Lineage::issues`]; they never abort the pass.
    pub fn run(store: &FrameStore) -> Lineage {
        let Some((first, rest)) = store.frames().split_first() else {
            log::warn!("Frame store is empty, nothing to track");
            return Lineage::default();
        };

        log::info!(
            "Tracking {} frames (time {} to {})",
            store.len(),
            store.time_start(),
            store.time_end().unwrap_or(first.time)
        );

        let mut totals = TransitionStats::default();
        let state = rest
            .iter()
            .fold(TrackingState::seed(first), |state, frame| {
                let (next, stats) = state.transition(frame);
                totals.continued += stats.continued;
                totals.born += stats.born;
                totals.divided += stats.divided;
                totals.dropped += stats.dropped;
                next
            });

        let lineage = Lineage::from(state);

        log::info!(
            "Tracking finished: {} tracks, {} divisions, {} continuations, {} detections dropped",
            lineage.num_tracks(),
            lineage.divisions().len(),
            totals.continued,
            totals.dropped
        );

        lineage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Frame;
    use crate::types::{Detection, ParentRef, Position};

    #[test]
    fn test_empty_store_gives_empty_lineage() {
        let store = FrameStore::new(Vec::new()).unwrap();
        let lineage = LineageTracker::run(&store);
        assert_eq!(lineage.num_tracks(), 0);
        assert_eq!(lineage.num_frames(), 0);
    }

    #[test]
    fn test_run_records_every_frame() {
        let d = |id, parent| Detection::new(id, Position::default(), parent);
        let store = FrameStore::new(vec![
            Frame::new(3, vec![d(1, ParentRef::Root)]),
            Frame::new(4, vec![d(2, ParentRef::Detection(1))]),
            Frame::new(5, vec![]),
        ])
        .unwrap();

        let lineage = LineageTracker::run(&store);
        assert_eq!(lineage.num_frames(), 3);
        assert_eq!(lineage.num_tracks(), 1);
        assert_eq!(lineage.track_at(1, 2), Some(0));
        assert_eq!(lineage.track_at(2, 2), None);
    }
}
