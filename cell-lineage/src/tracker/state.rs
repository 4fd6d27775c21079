//! Per-frame tracking state and the frame transition
//!
//! The tracker is a fold over the frame store: `TrackingState::seed` handles
//! frame 0, and `TrackingState::transition` takes the state valid for frame `t`
//! and returns the state valid for frame `t + 1`.
//!
//! A transition runs in two phases. The first phase resolves each detection's
//! parent against the active tips and groups claims per parent track. The second
//! phase walks the detections again in detector order and decides, per claim,
//! between continuation, division and drop. Since all claims on a tip are known
//! before anything is appended, a division never has to undo a continuation.

use crate::store::Frame;
use crate::types::{
    Detection, DetectionId, Division, ParentRef, Track, TrackId, TrackingIssue,
};
use std::collections::HashMap;

/// Accumulator threaded through the tracking pass
#[derive(Debug, Clone, Default)]
pub struct TrackingState {
    tracks: Vec<Track>,
    divisions: Vec<Division>,
    /// Tip id -> owning track, valid for the last processed frame
    active: HashMap<DetectionId, TrackId>,
    /// Per processed frame: detection id -> owning track
    frame_lookup: Vec<HashMap<DetectionId, TrackId>>,
    issues: Vec<TrackingIssue>,
}

/// Counts of what one transition did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionStats {
    /// Detections appended to an existing track
    pub continued: usize,
    /// Detections that started a track without a parent
    pub born: usize,
    /// Division events recorded
    pub divided: usize,
    /// Detections left out of the lineage (orphans and extra children)
    pub dropped: usize,
}

/// Outcome of resolving a detection's parent annotation
#[derive(Debug, Clone, Copy)]
enum Claim {
    Birth,
    Tip {
        track: TrackId,
        parent_id: DetectionId,
    },
    Orphan {
        parent_id: i64,
    },
}

impl TrackingState {
    /// Build the state for frame 0: every detection opens a track
    ///
    /// Parent annotations in frame 0 are not checked.
    pub fn seed(frame: &Frame) -> Self {
        let mut state = Self::default();
        let mut lookup = HashMap::with_capacity(frame.len());

        for detection in &frame.detections {
            let index = state.open_track(0, detection.id);
            lookup.insert(detection.id, index);
        }

        log::debug!(
            "Time {}: seeded {} tracks",
            frame.time,
            state.tracks.len()
        );

        state.commit_frame(lookup);
        state
    }

    /// Advance the state by one frame
    pub fn transition(mut self, frame: &Frame) -> (Self, TransitionStats) {
        let frame_index = self.frame_lookup.len();
        let mut stats = TransitionStats::default();

        // Phase 1: resolve parents, group claims per parent track
        let claims: Vec<Claim> = frame
            .detections
            .iter()
            .map(|d| self.resolve(d))
            .collect();

        let mut claimants: HashMap<TrackId, Vec<usize>> = HashMap::new();
        for (row, claim) in claims.iter().enumerate() {
            if let Claim::Tip { track, .. } = claim {
                claimants.entry(*track).or_default().push(row);
            }
        }

        // Phase 2: decide in detector order
        let mut lookup = HashMap::with_capacity(frame.len());
        for (row, (detection, claim)) in frame.detections.iter().zip(&claims).enumerate() {
            log::trace!(
                "Time {}: detection {} (parent {})",
                frame.time,
                detection.id,
                detection.parent
            );

            match *claim {
                Claim::Birth => {
                    let index = self.open_track(frame_index, detection.id);
                    lookup.insert(detection.id, index);
                    stats.born += 1;
                }
                Claim::Tip { track, parent_id } => {
                    let rows = claimants.get(&track).map(Vec::as_slice).unwrap_or(&[]);
                    let rank = rows.iter().position(|r| *r == row);

                    match (rank, rows.len()) {
                        (Some(0), 1) => {
                            self.tracks[track].ids.push(detection.id);
                            lookup.insert(detection.id, track);
                            stats.continued += 1;
                        }
                        // First child: its track is opened together with the second
                        (Some(0), _) => {}
                        (Some(1), _) => {
                            let first = &frame.detections[rows[0]];
                            let division =
                                self.divide(frame_index, track, parent_id, first.id, detection.id);
                            lookup.insert(first.id, division.child_tracks[0]);
                            lookup.insert(detection.id, division.child_tracks[1]);
                            stats.divided += 1;
                        }
                        _ => {
                            let issue = TrackingIssue::SimultaneousMultiDivision {
                                frame: frame_index,
                                id: detection.id,
                                parent_id,
                                parent_track: track,
                            };
                            log::warn!(
                                "Time {}: detection {} is child #{} of {} (track {}), only two-way divisions are tracked; dropped",
                                frame.time,
                                detection.id,
                                rank.map(|r| r + 1).unwrap_or(0),
                                parent_id,
                                track
                            );
                            self.issues.push(issue);
                            stats.dropped += 1;
                        }
                    }
                }
                Claim::Orphan { parent_id } => {
                    log::warn!(
                        "Time {}: detection {} lost track (parent {} not found in previous frame)",
                        frame.time,
                        detection.id,
                        parent_id
                    );
                    self.issues.push(TrackingIssue::OrphanedDetection {
                        frame: frame_index,
                        id: detection.id,
                        parent_id,
                    });
                    stats.dropped += 1;
                }
            }
        }

        log::debug!(
            "Time {}: {} continued, {} born, {} divisions, {} dropped",
            frame.time,
            stats.continued,
            stats.born,
            stats.divided,
            stats.dropped
        );

        self.commit_frame(lookup);
        (self, stats)
    }

    fn resolve(&self, detection: &Detection) -> Claim {
        match detection.parent {
            ParentRef::Root => Claim::Birth,
            ParentRef::Detection(parent_id) => match self.active.get(&parent_id) {
                Some(track) => Claim::Tip {
                    track: *track,
                    parent_id,
                },
                None => Claim::Orphan {
                    parent_id: i64::from(parent_id),
                },
            },
            ParentRef::Invalid(raw) => Claim::Orphan { parent_id: raw },
        }
    }

    fn open_track(&mut self, frame: usize, id: DetectionId) -> TrackId {
        let index = self.tracks.len();
        self.tracks.push(Track::new(index, frame, id));
        index
    }

    fn divide(
        &mut self,
        frame: usize,
        parent_track: TrackId,
        parent_id: DetectionId,
        child1_id: DetectionId,
        child2_id: DetectionId,
    ) -> Division {
        let first = self.open_track(frame, child1_id);
        let second = self.open_track(frame, child2_id);

        let division = Division {
            frame,
            parent_id,
            child1_id,
            child2_id,
            parent_track,
            child_tracks: [first, second],
        };
        self.divisions.push(division);
        division
    }

    fn commit_frame(&mut self, lookup: HashMap<DetectionId, TrackId>) {
        self.active = lookup.clone();
        self.frame_lookup.push(lookup);
    }

    /// Tracks built so far, in creation order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Divisions recorded so far
    pub fn divisions(&self) -> &[Division] {
        &self.divisions
    }

    /// Active tips of the last processed frame
    pub fn active(&self) -> &HashMap<DetectionId, TrackId> {
        &self.active
    }

    /// Number of frames processed so far
    pub fn frames_processed(&self) -> usize {
        self.frame_lookup.len()
    }

    /// Issues recorded so far
    pub fn issues(&self) -> &[TrackingIssue] {
        &self.issues
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Vec<Track>,
        Vec<Division>,
        Vec<HashMap<DetectionId, TrackId>>,
        Vec<TrackingIssue>,
    ) {
        (self.tracks, self.divisions, self.frame_lookup, self.issues)
    }
}
