//! Detection frame store
//!
//! Ordered per-time collection of detections. The store is populated once by the
//! caller and is read-only to the tracker and the query layer.

use crate::types::{Detection, DetectionId, LineageError, Position, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All detections observed at one time point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Absolute detector time index
    pub time: usize,
    /// Detections in detector order (this order drives division resolution)
    pub detections: Vec<Detection>,
}

impl Frame {
    pub fn new(time: usize, detections: Vec<Detection>) -> Self {
        Self { time, detections }
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Detection ids in detector order
    pub fn ids(&self) -> impl Iterator<Item = DetectionId> + '_ {
        self.detections.iter().map(|d| d.id)
    }
}

/// Validated, contiguous sequence of frames
#[derive(Debug, Clone, Default)]
pub struct FrameStore {
    frames: Vec<Frame>,
    /// Per frame: detection id -> row in `frames[t].detections`
    rows: Vec<HashMap<DetectionId, usize>>,
}

impl FrameStore {
    /// Build a store from frames covering a contiguous time range
    ///
    /// The first frame's time becomes the start of the range. Fails if a time is
    /// skipped or repeated, or if a frame holds the same detection id twice.
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        let mut rows = Vec::with_capacity(frames.len());

        if let Some(first) = frames.first() {
            let time_start = first.time;
            for (t, frame) in frames.iter().enumerate() {
                let expected = time_start.checked_add(t).ok_or(LineageError::TimeOverflow {
                    time_start,
                    offset: t,
                })?;
                if frame.time != expected {
                    return Err(LineageError::NonContiguousFrames {
                        expected,
                        found: frame.time,
                    });
                }
                rows.push(Self::index_frame(frame)?);
            }
        }

        log::debug!(
            "Frame store built: {} frames, {} detections",
            frames.len(),
            frames.iter().map(Frame::len).sum::<usize>()
        );

        Ok(Self { frames, rows })
    }

    fn index_frame(frame: &Frame) -> Result<HashMap<DetectionId, usize>> {
        let mut rows = HashMap::with_capacity(frame.len());
        for (row, detection) in frame.detections.iter().enumerate() {
            if rows.insert(detection.id, row).is_some() {
                return Err(LineageError::DuplicateDetectionId {
                    time: frame.time,
                    id: detection.id,
                });
            }
        }
        Ok(rows)
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Absolute time of frame 0 (0 for an empty store)
    pub fn time_start(&self) -> usize {
        self.frames.first().map(|f| f.time).unwrap_or(0)
    }

    /// Absolute time of the last frame, if any
    pub fn time_end(&self) -> Option<usize> {
        self.frames.last().map(|f| f.time)
    }

    /// Absolute detector time of a 0-based frame index
    ///
    /// Saturates at `usize::MAX` for indices past the end of the time axis.
    pub fn absolute_time(&self, frame: usize) -> usize {
        self.time_start().saturating_add(frame)
    }

    /// All frames in time order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frame by 0-based index
    pub fn frame(&self, frame: usize) -> Result<&Frame> {
        self.frames
            .get(frame)
            .ok_or(LineageError::FrameOutOfRange(frame))
    }

    /// Look up a detection by frame and id
    pub fn detection(&self, frame: usize, id: DetectionId) -> Result<&Detection> {
        let rows = self
            .rows
            .get(frame)
            .ok_or(LineageError::FrameOutOfRange(frame))?;
        rows.get(&id)
            .map(|row| &self.frames[frame].detections[*row])
            .ok_or(LineageError::DetectionNotFound { frame, id })
    }

    /// Position of a detection by frame and id
    pub fn position(&self, frame: usize, id: DetectionId) -> Result<Position> {
        self.detection(frame, id).map(|d| d.position)
    }

    /// Total number of detections over all frames
    pub fn total_detections(&self) -> usize {
        self.frames.iter().map(Frame::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParentRef;

    fn det(id: DetectionId) -> Detection {
        Detection::new(id, Position::new(id as f64, 0.0, 0.0), ParentRef::Root)
    }

    #[test]
    fn test_empty_store() {
        let store = FrameStore::new(Vec::new()).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.time_start(), 0);
        assert_eq!(store.time_end(), None);
        assert_eq!(store.frame(0).unwrap_err(), LineageError::FrameOutOfRange(0));
    }

    #[test]
    fn test_time_range_offset() {
        let store = FrameStore::new(vec![
            Frame::new(5, vec![det(1)]),
            Frame::new(6, vec![det(2), det(3)]),
        ])
        .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.time_start(), 5);
        assert_eq!(store.time_end(), Some(6));
        assert_eq!(store.absolute_time(1), 6);
        assert_eq!(store.total_detections(), 3);
        assert_eq!(store.position(1, 3).unwrap().x, 3.0);
        assert_eq!(
            store.detection(1, 1).unwrap_err(),
            LineageError::DetectionNotFound { frame: 1, id: 1 }
        );
    }

    #[test]
    fn test_non_contiguous_frames_rejected() {
        let err = FrameStore::new(vec![
            Frame::new(0, vec![det(1)]),
            Frame::new(2, vec![det(1)]),
        ])
        .unwrap_err();
        assert_eq!(err, LineageError::NonContiguousFrames { expected: 1, found: 2 });
    }

    #[test]
    fn test_time_overflow_rejected() {
        let err = FrameStore::new(vec![
            Frame::new(usize::MAX, vec![det(1)]),
            Frame::new(0, vec![det(2)]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            LineageError::TimeOverflow {
                time_start: usize::MAX,
                offset: 1
            }
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = FrameStore::new(vec![Frame::new(0, vec![det(4), det(4)])]).unwrap_err();
        assert_eq!(err, LineageError::DuplicateDetectionId { time: 0, id: 4 });
    }
}
