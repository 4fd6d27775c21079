//! Shared fixture builders for integration tests

#![allow(dead_code)]

use cell_lineage::{Detection, DetectionId, Frame, FrameStore, ParentRef, Position};

/// Detection at `(id, 0, 0)` with a raw parent value (`-1` = root)
pub fn det(id: DetectionId, parent: i64) -> Detection {
    Detection::new(
        id,
        Position::new(id as f64, 0.0, 0.0),
        ParentRef::from(parent),
    )
}

/// Build a store from `(id, parent)` rows per frame, starting at time 0
pub fn store(frames: &[&[(DetectionId, i64)]]) -> FrameStore {
    let frames = frames
        .iter()
        .enumerate()
        .map(|(t, rows)| Frame::new(t, rows.iter().map(|(id, p)| det(*id, *p)).collect()))
        .collect();
    FrameStore::new(frames).expect("contiguous fixture")
}

/// A lineage with continuations, births, a division, an orphan and a
/// three-way claim, spread over six frames
pub fn busy_store() -> FrameStore {
    store(&[
        &[(1, -1), (2, -1), (3, -1)],
        &[(10, 1), (11, 2), (12, -1), (13, 3)],
        &[(20, 10), (21, 10), (22, 11), (23, 12), (24, 77)],
        &[(30, 20), (31, 21), (32, 22), (33, 22), (34, 22), (35, 23)],
        &[(40, 30), (41, 31), (42, 32), (43, 33), (44, -1)],
        &[(50, 40), (51, 42), (52, 43), (53, 44), (54, 41)],
    ])
}
