//! Motion analysis over track movements

use crate::config::MotionScale;
use crate::types::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of a track at one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementPoint {
    pub frame: usize,
    pub position: Position,
}

/// Scaled velocity between a frame and the next one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// Frame the step starts at
    pub frame: usize,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
}

impl Velocity {
    /// Euclidean norm
    pub fn speed(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy + self.vz * self.vz).sqrt()
    }
}

/// Velocities between consecutive movement points
pub fn velocities(movement: &[MovementPoint], scale: &MotionScale) -> Vec<Velocity> {
    movement
        .windows(2)
        .map(|pair| {
            let (a, b) = (pair[0].position, pair[1].position);
            Velocity {
                frame: pair[0].frame,
                vx: scale.xy_resolution * (b.x - a.x) / scale.frame_interval,
                vy: scale.xy_resolution * (b.y - a.y) / scale.frame_interval,
                vz: scale.z_resolution * (b.z - a.z) / scale.frame_interval,
            }
        })
        .collect()
}

/// Mean speed, `None` for movements with fewer than two points
pub fn mean_speed(movement: &[MovementPoint], scale: &MotionScale) -> Option<f64> {
    let velocities = velocities(movement, scale);
    if velocities.is_empty() {
        return None;
    }
    let total: f64 = velocities.iter().map(Velocity::speed).sum();
    Some(total / velocities.len() as f64)
}

/// Scaled path length
pub fn path_length(movement: &[MovementPoint], scale: &MotionScale) -> f64 {
    velocities(movement, scale)
        .iter()
        .map(|v| v.speed() * scale.frame_interval)
        .sum()
}

/// Resultant speed per step over several tracks' velocities
///
/// For every step frame, the velocities of the tracks moving over that step are
/// summed and the norm of the sum is divided by their count. Frames ascending.
pub fn resultant_speeds(tracks: &[Vec<Velocity>]) -> Vec<(usize, f64)> {
    let mut steps: BTreeMap<usize, (Velocity, usize)> = BTreeMap::new();
    for v in tracks.iter().flatten() {
        let (sum, count) = steps.entry(v.frame).or_insert((
            Velocity {
                frame: v.frame,
                vx: 0.0,
                vy: 0.0,
                vz: 0.0,
            },
            0,
        ));
        sum.vx += v.vx;
        sum.vy += v.vy;
        sum.vz += v.vz;
        *count += 1;
    }

    steps
        .into_iter()
        .map(|(frame, (sum, count))| (frame, sum.speed() / count as f64))
        .collect()
}
