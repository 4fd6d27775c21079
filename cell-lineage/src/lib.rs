//! Cell Lineage Library
//!
//! Reconstructs persistent cell lineages from per-frame nucleus detections that
//! carry parent-pointer annotations.
//!
//! # Architecture
//!
//! - [`FrameStore`]: validated, ordered per-frame detections (populated once by the caller)
//! - [`LineageTracker`]: single forward pass building tracks and divisions
//! - [`Lineage`]: immutable result of the pass
//! - [`TrackIndex`]: read-only queries and composable filters over the result
//!
//! The library does NOT:
//! - Parse detector output files
//! - Render, plot or export anything
//!
//! Loading and reporting live in the application layer (cell-lineage-cli).
//!
//! # Example Usage
//!
//! ```
//! use cell_lineage::{Detection, Frame, FrameStore, LineageTracker, ParentRef, Position, TrackIndex};
//! use std::sync::Arc;
//!
//! let frames = vec![
//!     Frame::new(0, vec![Detection::new(1, Position::new(0.0, 0.0, 0.0), ParentRef::Root)]),
//!     Frame::new(1, vec![
//!         Detection::new(20, Position::new(1.0, 0.0, 0.0), ParentRef::Detection(1)),
//!         Detection::new(21, Position::new(-1.0, 0.0, 0.0), ParentRef::Detection(1)),
//!     ]),
//! ];
//!
//! let store = FrameStore::new(frames).unwrap();
//! let lineage = LineageTracker::run(&store);
//! assert_eq!(lineage.num_tracks(), 3);
//! assert_eq!(lineage.divisions().len(), 1);
//!
//! let mut index = TrackIndex::new(Arc::new(store), Arc::new(lineage));
//! index.min_frame_length(1, false);
//! assert_eq!(index.detection_id_to_track(21, 1), Some(2));
//! ```

// Public modules
pub mod config;
pub mod filter;
pub mod index;
pub mod lineage;
pub mod manual;
pub mod motion;
pub mod store;
pub mod tracker;
pub mod types;

// Re-export main types for convenience
pub use config::{FilterConfig, MotionScale};
pub use filter::FilterSet;
pub use index::{TrackIndex, TrackSummary};
pub use lineage::Lineage;
pub use manual::{ManualTrackId, ManualTracks};
pub use motion::{MovementPoint, Velocity};
pub use store::{Frame, FrameStore};
pub use tracker::{LineageTracker, TrackingState, TransitionStats};
pub use types::{
    Detection, DetectionId, Division, LineageError, ParentRef, Position, Result,
    SupervoxelId, Track, TrackId, TrackingIssue,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: an empty store tracks to an empty lineage
        let store = FrameStore::new(Vec::new()).unwrap();
        let lineage = LineageTracker::run(&store);
        assert_eq!(lineage.num_tracks(), 0);
    }
}
