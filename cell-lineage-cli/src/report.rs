//! Report generation
//!
//! Builds a summary of a tracking run from a configured [`TrackIndex`] and
//! renders it as plain text or JSON.

use anyhow::Result;
use cell_lineage::{
    Division, ManualTracks, MotionScale, Position, TrackIndex, TrackId, TrackingIssue,
};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt::Write;

/// One row of the track table
#[derive(Debug, Clone, Serialize)]
pub struct TrackRow {
    pub index: TrackId,
    pub start_frame: usize,
    pub length: usize,
    /// Scaled path length
    pub path_length: f64,
    /// Scaled mean speed (None for single-frame tracks)
    pub mean_speed: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualSummary {
    pub tracks: usize,
    pub points: usize,
}

/// Everything written out for one run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: String,
    pub time_start: usize,
    pub time_end: Option<usize>,
    pub num_frames: usize,
    pub num_detections: usize,
    pub num_tracks: usize,
    pub num_reported_tracks: usize,
    pub filtered: bool,
    pub min_frames: Option<usize>,
    pub black_list: Vec<TrackId>,
    pub tracks: Vec<TrackRow>,
    pub divisions: Vec<Division>,
    pub center_of_mass: Vec<Option<Position>>,
    pub issues: Vec<TrackingIssue>,
    pub manual: Option<ManualSummary>,
}

impl Report {
    /// Collect the report from a configured index
    ///
    /// Per-track motion figures are computed in parallel over the shared index.
    pub fn build(
        index: &TrackIndex,
        scale: &MotionScale,
        filtered: bool,
        manual: Option<&ManualTracks>,
    ) -> Result<Self> {
        let summaries = index.track_summaries(filtered);

        let tracks = summaries
            .par_iter()
            .map(|summary| -> cell_lineage::Result<TrackRow> {
                let movement = index.whole_movement(summary.index)?;
                Ok(TrackRow {
                    index: summary.index,
                    start_frame: summary.start_frame,
                    length: summary.length,
                    path_length: cell_lineage::motion::path_length(&movement, scale),
                    mean_speed: cell_lineage::motion::mean_speed(&movement, scale),
                })
            })
            .collect::<cell_lineage::Result<Vec<_>>>()?;

        let store = index.store();
        let filter = index.filter();

        Ok(Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            time_start: store.time_start(),
            time_end: store.time_end(),
            num_frames: store.len(),
            num_detections: store.total_detections(),
            num_tracks: index.tracks().len(),
            num_reported_tracks: tracks.len(),
            filtered,
            min_frames: filter.min_frames(),
            black_list: filter
                .black_list()
                .map(|b| b.iter().copied().collect())
                .unwrap_or_default(),
            tracks,
            divisions: index.divisions().to_vec(),
            center_of_mass: index.center_of_mass(filtered),
            issues: index.lineage().issues().to_vec(),
            manual: manual.map(|m| ManualSummary {
                tracks: m.len(),
                points: m.num_points(),
            }),
        })
    }
}

/// Render the report as JSON
pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render the report as plain text
///
/// The track table keeps the `index<TAB>start<TAB>length` layout of the
/// classic `tracks.txt` file, followed by the motion columns.
pub fn render_txt(report: &Report) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "# Cell lineage report ({})", report.generated_at)?;
    match report.time_end {
        Some(end) => writeln!(
            out,
            "# Frames: {} (time {} to {})",
            report.num_frames, report.time_start, end
        )?,
        None => writeln!(out, "# Frames: 0")?,
    }
    writeln!(out, "# Detections: {}", report.num_detections)?;
    writeln!(
        out,
        "# Tracks: {} ({} reported{})",
        report.num_tracks,
        report.num_reported_tracks,
        if report.filtered { ", filtered" } else { "" }
    )?;
    if let Some(min) = report.min_frames {
        writeln!(out, "# Filter min_frames: {}", min)?;
    }
    if !report.black_list.is_empty() {
        writeln!(out, "# Filter black_list: {:?}", report.black_list)?;
    }

    writeln!(out, "\n[tracks]")?;
    writeln!(out, "index\tstart\tlength\tpath_length\tmean_speed")?;
    for row in &report.tracks {
        let speed = row
            .mean_speed
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{}\t{}\t{}\t{:.3}\t{}",
            row.index, row.start_frame, row.length, row.path_length, speed
        )?;
    }

    writeln!(out, "\n[divisions]")?;
    for d in &report.divisions {
        writeln!(
            out,
            "frame {}: {} (track {}) -> {} (track {}), {} (track {})",
            d.frame,
            d.parent_id,
            d.parent_track,
            d.child1_id,
            d.child_tracks[0],
            d.child2_id,
            d.child_tracks[1]
        )?;
    }

    writeln!(out, "\n[center_of_mass]")?;
    for (frame, com) in report.center_of_mass.iter().enumerate() {
        match com {
            Some(p) => writeln!(out, "{}\t{}", frame, p)?,
            None => writeln!(out, "{}\tundefined", frame)?,
        }
    }

    if !report.issues.is_empty() {
        writeln!(out, "\n[issues]")?;
        for issue in &report.issues {
            writeln!(out, "{}", issue)?;
        }
    }

    if let Some(manual) = &report.manual {
        writeln!(out, "\n[manual]")?;
        writeln!(out, "{} tracks, {} points", manual.tracks, manual.points)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell_lineage::LineageTracker;
    use std::sync::Arc;

    fn index() -> TrackIndex {
        let store = crate::loader::parse_detections(
            r#"{ "time_start": 10, "frames": [
                [{ "id": 1, "position": [0.0, 0.0, 0.0], "parent": -1 },
                 { "id": 2, "position": [5.0, 0.0, 0.0], "parent": -1 }],
                [{ "id": 3, "position": [3.0, 4.0, 0.0], "parent": 1 },
                 { "id": 4, "position": [9.0, 9.0, 9.0], "parent": 42 }],
                [{ "id": 5, "position": [3.0, 4.0, 1.0], "parent": 3 },
                 { "id": 6, "position": [3.0, 4.0, 2.0], "parent": 3 }]
            ] }"#,
        )
        .unwrap();
        let lineage = LineageTracker::run(&store);
        TrackIndex::new(Arc::new(store), Arc::new(lineage))
    }

    #[test]
    fn test_build_report() {
        let mut index = index();
        index.min_frame_length(2, false);

        let report = Report::build(&index, &MotionScale::default(), true, None).unwrap();
        assert_eq!(report.time_start, 10);
        assert_eq!(report.num_frames, 3);
        assert_eq!(report.num_tracks, 4);
        assert_eq!(report.num_reported_tracks, 1);
        assert_eq!(report.tracks[0].path_length, 5.0);
        assert_eq!(report.tracks[0].mean_speed, Some(5.0));
        assert_eq!(report.divisions.len(), 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.min_frames, Some(2));
        // Frame 2 only holds the children, which are single-frame tracks
        assert_eq!(report.center_of_mass[2], None);
    }

    #[test]
    fn test_render_txt() {
        let index = index();
        let mut manual = ManualTracks::new();
        manual.insert_point(1, 10, Position::default());

        let report = Report::build(&index, &MotionScale::default(), false, Some(&manual)).unwrap();
        let txt = render_txt(&report).unwrap();

        assert!(txt.contains("# Frames: 3 (time 10 to 12)"));
        assert!(txt.contains("0\t0\t2\t5.000\t5.000"));
        assert!(txt.contains("1\t0\t1\t0.000\t-"));
        assert!(txt.contains("frame 2: 3 (track 0) -> 5 (track 2), 6 (track 3)"));
        assert!(txt.contains("lost track"));
        assert!(txt.contains("1 tracks, 1 points"));
    }

    #[test]
    fn test_render_json() {
        let index = index();
        let report = Report::build(&index, &MotionScale::default(), false, None).unwrap();
        let json = render_json(&report).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["num_tracks"], 4);
        assert_eq!(value["tracks"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["issues"][0]["kind"], "orphaned_detection");
        assert!(value["manual"].is_null());
    }
}
