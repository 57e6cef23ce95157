//! Configuration management for the head pose monitor

use crate::{
    constants::{DEFAULT_FPS, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_RECORD_THRESHOLD, NUM_FACIAL_LANDMARKS},
    export::CsvSchema,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model asset paths
    pub assets: AssetConfig,

    /// Pose pipeline parameters
    pub pipeline: PipelineConfig,

    /// Tick loop configuration
    pub scheduler: SchedulerConfig,

    /// History export configuration
    pub export: ExportConfig,
}

/// Pose estimation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorMode {
    /// Full landmark sets through the regression model
    #[default]
    Learned,
    /// Six coarse keypoints through the closed-form heuristic
    Geometric,
}

impl std::str::FromStr for EstimatorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "learned" => Ok(Self::Learned),
            "geometric" => Ok(Self::Geometric),
            _ => Err(Error::ConfigError(format!("Unknown estimator mode: {s}"))),
        }
    }
}

/// Model asset paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Path to the pose regression ONNX model
    pub pose_model: PathBuf,

    /// Path to the scaler parameters JSON file
    pub scaler: PathBuf,

    /// Optional path to the cheating classifier ONNX model
    pub classifier: Option<PathBuf>,
}

/// Pose pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Estimation strategy
    pub estimator: EstimatorMode,

    /// Number of landmarks produced by the fine-grained detector
    pub num_landmarks: usize,

    /// Per-axis recording threshold in degrees
    pub record_threshold: f64,

    /// Frame width assumed for detections that do not carry one
    pub frame_width: f64,

    /// Frame height assumed for detections that do not carry one
    pub frame_height: f64,
}

/// Tick loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Target ticks per second
    pub target_fps: f64,
}

/// History export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory exported CSV files are written to
    pub directory: PathBuf,

    /// Column layout
    pub schema: CsvSchema,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            pose_model: PathBuf::from("assets/pose_regressor.onnx"),
            scaler: PathBuf::from("assets/scaler.json"),
            classifier: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorMode::Learned,
            num_landmarks: NUM_FACIAL_LANDMARKS,
            record_threshold: DEFAULT_RECORD_THRESHOLD,
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { target_fps: DEFAULT_FPS }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("exports"),
            schema: CsvSchema::Detailed,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration values
    ///
    /// Asset files are checked when they are loaded, not here.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.num_landmarks < 2 {
            return Err(Error::ConfigError(
                "Landmark count must be at least 2".to_string(),
            ));
        }
        if !(self.pipeline.record_threshold.is_finite() && self.pipeline.record_threshold >= 0.0) {
            return Err(Error::ConfigError(
                "Record threshold must be a non-negative number of degrees".to_string(),
            ));
        }
        if !(self.pipeline.frame_width > 0.0 && self.pipeline.frame_height > 0.0) {
            return Err(Error::ConfigError("Frame dimensions must be positive".to_string()));
        }
        if !(self.scheduler.target_fps.is_finite() && self.scheduler.target_fps > 0.0) {
            return Err(Error::ConfigError("Target FPS must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Head Pose Monitor Configuration

# Model assets
assets:
  pose_model: "assets/pose_regressor.onnx"
  scaler: "assets/scaler.json"
  classifier: "assets/cheating_classifier.onnx"

# Pose pipeline
pipeline:
  estimator: "learned"
  num_landmarks: 68
  record_threshold: 2.0
  frame_width: 640.0
  frame_height: 480.0

# Tick loop
scheduler:
  target_fps: 30.0

# History export
export:
  directory: "exports"
  schema: "detailed"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.num_landmarks, 68);
        assert_eq!(config.pipeline.record_threshold, 2.0);
        assert_eq!(config.export.schema, CsvSchema::Detailed);
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.estimator, EstimatorMode::Learned);
        assert_eq!(
            config.assets.classifier,
            Some(PathBuf::from("assets/cheating_classifier.onnx"))
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_yaml("pipeline:\n  estimator: geometric\n  record_threshold: 5.0\n").unwrap();
        assert_eq!(config.pipeline.estimator, EstimatorMode::Geometric);
        assert_eq!(config.pipeline.record_threshold, 5.0);
        assert_eq!(config.pipeline.num_landmarks, 68);
        assert_eq!(config.scheduler.target_fps, 30.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.scheduler.target_fps = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipeline.record_threshold = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipeline.num_landmarks = 1;
        assert!(config.validate().is_err());

        assert!(Config::from_yaml("pipeline: [1, 2").is_err());
    }

    #[test]
    fn test_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = Config::default();
        config.export.schema = CsvSchema::Simple;
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.export.schema, CsvSchema::Simple);
    }
}
