//! Configuration management for the head input pipeline

use crate::{
    constants::{
        DEFAULT_BOX_EXPANSION, DEFAULT_CALIBRATION_SAMPLES, DEFAULT_CONFIDENCE_THRESHOLD,
        DEFAULT_NMS_THRESHOLD, DEFAULT_SMOOTHING_WINDOW,
    },
    direction::DirectionThresholds,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub models: ModelConfig,

    /// Face detection configuration
    pub face_detection: FaceDetectionConfig,

    /// Calibration configuration
    pub calibration: CalibrationConfig,

    /// Direction thresholds
    pub thresholds: DirectionThresholds,

    /// Smoothing configuration
    pub smoothing: SmoothingConfig,

    /// Capture configuration
    pub capture: CaptureConfig,

    /// Display configuration
    pub display: DisplayConfig,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to face detection ONNX model
    pub face_detector: PathBuf,

    /// Path to facial landmarks ONNX model
    pub face_landmarks: PathBuf,
}

/// Face detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDetectionConfig {
    /// Confidence threshold for face detection (0.0-1.0)
    pub confidence_threshold: f32,

    /// IOU threshold for non-maximum suppression (0.0-1.0)
    pub iou_threshold: f32,

    /// Face region expansion factor
    pub bbox_expansion: f32,
}

/// Calibration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Number of valid pose samples before the neutral pose locks
    pub samples: usize,

    /// Average the window instead of taking the last sample
    pub averaging: bool,
}

/// Translation smoothing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Enable the moving-average smoother
    pub enabled: bool,

    /// Smoothing window size
    pub window: usize,
}

/// Capture parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Webcam index
    pub camera_index: i32,

    /// Flip the frame horizontally so the preview behaves like a mirror.
    /// The emitted direction signal follows the user's physical movement
    /// either way.
    pub mirror: bool,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Show the annotated camera window
    pub gui: bool,

    /// Camera window title
    pub window_name: String,

    /// Game tick interval in milliseconds
    pub tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelConfig::default(),
            face_detection: FaceDetectionConfig::default(),
            calibration: CalibrationConfig::default(),
            thresholds: DirectionThresholds::default(),
            smoothing: SmoothingConfig::default(),
            capture: CaptureConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            face_detector: PathBuf::from("assets/face_detector.onnx"),
            face_landmarks: PathBuf::from("assets/face_landmarks.onnx"),
        }
    }
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_NMS_THRESHOLD,
            bbox_expansion: DEFAULT_BOX_EXPANSION,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_CALIBRATION_SAMPLES,
            averaging: false,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            mirror: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            gui: true,
            window_name: "Head Input".to_string(),
            tick_ms: 200,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Model paths are not checked here; missing model files surface as load
    /// errors when the detectors are constructed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.face_detection.confidence_threshold) {
            return Err(Error::ConfigError(
                "Confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.face_detection.iou_threshold) {
            return Err(Error::ConfigError(
                "IOU threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.face_detection.bbox_expansion < 0.0 {
            return Err(Error::ConfigError(
                "Box expansion must not be negative".to_string(),
            ));
        }

        if self.calibration.samples == 0 {
            return Err(Error::ConfigError(
                "Calibration sample count must be greater than 0".to_string(),
            ));
        }

        if self.thresholds.x_offset <= 0.0 || self.thresholds.y_offset <= 0.0 {
            return Err(Error::ConfigError(
                "Direction thresholds must be positive".to_string(),
            ));
        }

        if self.smoothing.enabled && self.smoothing.window == 0 {
            return Err(Error::ConfigError(
                "Smoothing window size must be greater than 0".to_string(),
            ));
        }

        if self.display.tick_ms == 0 {
            return Err(Error::ConfigError(
                "Game tick interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Head Input Configuration

# Model paths
models:
  face_detector: "assets/face_detector.onnx"
  face_landmarks: "assets/face_landmarks.onnx"

# Face detection parameters
face_detection:
  confidence_threshold: 0.5
  iou_threshold: 0.4
  bbox_expansion: 0.2

# Neutral pose calibration
calibration:
  samples: 10
  averaging: false

# Direction thresholds (reference-model units)
thresholds:
  x_offset: 100.0
  y_offset: 75.0

# Translation smoothing
smoothing:
  enabled: false
  window: 5

# Capture settings
capture:
  camera_index: 0
  mirror: true

# Display settings
display:
  gui: true
  window_name: "Head Input"
  tick_ms: 200
"#;
