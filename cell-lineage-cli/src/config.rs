//! Configuration loading and parsing

use anyhow::{Context, Result};
use cell_lineage::{FilterConfig, MotionScale};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub filtering: FilterConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scale: MotionScale,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Detection records (JSON)
    pub detections: PathBuf,
    /// Optional manual track annotations (JSON)
    pub manual_tracks: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Output file (default: stdout)
    pub path: Option<PathBuf>,
    /// Restrict the report to tracks passing the filters
    #[serde(default = "default_true")]
    pub filtered: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: None,
            filtered: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

impl AppConfig {
    /// Configuration with defaults for everything but the detection file
    pub fn for_detections(detections: PathBuf) -> Self {
        Self {
            input: InputConfig {
                detections,
                manual_tracks: None,
            },
            filtering: FilterConfig::default(),
            output: OutputConfig::default(),
            scale: MotionScale::default(),
        }
    }
}

/// Load configuration from a TOML file
///
/// Relative input paths are resolved against the directory of the config file.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let Some(base) = path.parent() {
        config.input.detections = base.join(&config.input.detections);
        config.input.manual_tracks = config.input.manual_tracks.map(|p| base.join(p));
    }

    if config.scale.frame_interval <= 0.0 {
        anyhow::bail!(
            "Invalid frame_interval {} in {:?}: must be positive",
            config.scale.frame_interval,
            path
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            detections = "detections.json"

            [filtering]
            min_frames = 10
            black_list = [3, 7]

            [output]
            format = "json"

            [scale]
            xy_resolution = 0.67
            z_resolution = 10.0
            frame_interval = 0.5
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.detections, PathBuf::from("detections.json"));
        assert!(config.input.manual_tracks.is_none());
        assert_eq!(config.filtering.min_frames, Some(10));
        assert_eq!(config.filtering.black_list, vec![3, 7]);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.filtered);
        assert_eq!(config.scale.z_resolution, 10.0);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config: AppConfig = toml::from_str("[input]\ndetections = \"d.json\"\n").unwrap();
        assert!(config.filtering.is_empty());
        assert_eq!(config.output.format, OutputFormat::Txt);
        assert_eq!(config.scale, MotionScale::default());
    }

    #[test]
    fn test_load_config_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[input]\ndetections = \"d.json\"\nmanual_tracks = \"m.json\"").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.input.detections, dir.path().join("d.json"));
        assert_eq!(config.input.manual_tracks, Some(dir.path().join("m.json")));
    }

    #[test]
    fn test_load_config_rejects_bad_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[input]\ndetections = \"d.json\"\n[scale]\nframe_interval = 0.0\n",
        )
        .unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_config(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
