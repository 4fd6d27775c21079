//! Composable track filters
//!
//! A filter set narrows the working set of track indices. Filters persist until
//! they are reset, and with `keep_previous` they stack on each other.

use crate::types::{Track, TrackId};
use std::collections::BTreeSet;

/// Working set of track indices plus the filters that produced it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    num_tracks: usize,
    working: BTreeSet<TrackId>,
    min_frames: Option<usize>,
    black_list: Option<BTreeSet<TrackId>>,
}

impl FilterSet {
    /// Unfiltered set over `num_tracks` tracks
    pub fn new(num_tracks: usize) -> Self {
        Self {
            num_tracks,
            working: (0..num_tracks).collect(),
            min_frames: None,
            black_list: None,
        }
    }

    /// Drop every filter and go back to the full track set
    pub fn reset(&mut self) {
        *self = Self::new(self.num_tracks);
    }

    /// Check if any filter has been applied since the last reset
    pub fn is_configured(&self) -> bool {
        self.min_frames.is_some() || self.black_list.is_some()
    }

    /// Current working set
    pub fn working(&self) -> &BTreeSet<TrackId> {
        &self.working
    }

    /// Check if a track passes the current filters
    pub fn passes(&self, track: TrackId) -> bool {
        self.working.contains(&track)
    }

    /// Minimum length currently applied, if any
    pub fn min_frames(&self) -> Option<usize> {
        self.min_frames
    }

    /// Black list currently applied, if any
    pub fn black_list(&self) -> Option<&BTreeSet<TrackId>> {
        self.black_list.as_ref()
    }

    /// Keep only tracks lasting at least `min_frames` frames
    ///
    /// With `keep_previous`, a minimum no stricter than the one already applied
    /// is a no-op; relaxing requires `keep_previous = false`.
    pub fn min_frame_length(
        &mut self,
        tracks: &[Track],
        min_frames: usize,
        keep_previous: bool,
    ) -> &BTreeSet<TrackId> {
        if self.working.is_empty() {
            log::warn!(
                "Cells not tracked or all cells filtered, min_frames = {} not applied",
                min_frames
            );
            return &self.working;
        }

        if !keep_previous {
            self.reset();
        } else if matches!(self.min_frames, Some(applied) if applied >= min_frames) {
            return &self.working;
        }

        self.working.retain(|idx| {
            tracks
                .get(*idx)
                .map(|track| track.len() >= min_frames)
                .unwrap_or(false)
        });
        self.min_frames = Some(min_frames);

        if self.working.is_empty() {
            log::warn!(
                "All cells filtered, consider changing min_frames (currently {})",
                min_frames
            );
        } else {
            log::info!(
                "{} tracks from a total of {} met the min_frames condition",
                self.working.len(),
                self.num_tracks
            );
        }

        &self.working
    }

    /// Remove the given track indices from the working set
    ///
    /// With `keep_previous`, the list is merged with any black list applied
    /// earlier.
    pub fn black_list_tracks(
        &mut self,
        excluded: &[TrackId],
        keep_previous: bool,
    ) -> &BTreeSet<TrackId> {
        if self.working.is_empty() {
            log::warn!("Cells not tracked or all cells filtered, black list not applied");
            return &self.working;
        }

        let mut black_list: BTreeSet<TrackId> = excluded.iter().copied().collect();
        if keep_previous {
            if let Some(previous) = &self.black_list {
                log::debug!(
                    "Merging black list with {} previously excluded tracks",
                    previous.len()
                );
                black_list.extend(previous.iter().copied());
            }
        } else {
            self.reset();
        }

        self.working.retain(|idx| !black_list.contains(idx));
        self.black_list = Some(black_list);

        &self.working
    }
}
