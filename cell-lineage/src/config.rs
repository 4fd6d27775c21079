//! Library configuration types
//!
//! Filter settings applied to a [`crate::TrackIndex`] and the physical scale
//! used by motion analysis. Both are plain serde records so the application
//! layer can embed them in its own configuration file.

use crate::types::TrackId;
use serde::{Deserialize, Serialize};

/// Track filter settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Optional: drop tracks shorter than this many frames
    #[serde(default)]
    pub min_frames: Option<usize>,

    /// Track indices to exclude
    #[serde(default)]
    pub black_list: Vec<TrackId>,

    /// Whether to combine with filters applied earlier (false = start from all tracks)
    #[serde(default)]
    pub keep_previous: bool,
}

impl FilterConfig {
    /// Create an empty filter configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set minimum track length
    pub fn with_min_frames(mut self, min_frames: usize) -> Self {
        self.min_frames = Some(min_frames);
        self
    }

    /// Builder method: set black-listed track indices
    pub fn with_black_list(mut self, black_list: Vec<TrackId>) -> Self {
        self.black_list = black_list;
        self
    }

    /// Builder method: keep previously applied filters
    pub fn with_keep_previous(mut self, keep_previous: bool) -> Self {
        self.keep_previous = keep_previous;
        self
    }

    /// Check if this configuration filters anything
    pub fn is_empty(&self) -> bool {
        self.min_frames.is_none() && self.black_list.is_empty()
    }
}

/// Physical calibration for motion analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionScale {
    /// XY resolution (microns per pixel)
    #[serde(default = "default_resolution")]
    pub xy_resolution: f64,

    /// Z resolution (microns per slice)
    #[serde(default = "default_resolution")]
    pub z_resolution: f64,

    /// Time between frames (hours)
    #[serde(default = "default_frame_interval")]
    pub frame_interval: f64,
}

fn default_resolution() -> f64 {
    1.0
}

fn default_frame_interval() -> f64 {
    1.0
}

impl Default for MotionScale {
    fn default() -> Self {
        Self {
            xy_resolution: default_resolution(),
            z_resolution: default_resolution(),
            frame_interval: default_frame_interval(),
        }
    }
}

impl MotionScale {
    pub fn new(xy_resolution: f64, z_resolution: f64, frame_interval: f64) -> Self {
        Self {
            xy_resolution,
            z_resolution,
            frame_interval,
        }
    }
}
