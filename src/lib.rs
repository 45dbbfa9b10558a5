//! Head-movement input library for controlling games with the head.
//!
//! The pipeline turns webcam frames into a discrete direction signal:
//! 1. Face detection and 68-point facial landmark detection locate the six
//!    key points used for pose estimation
//! 2. `PnP` (Perspective-n-Point) recovers the head translation relative to
//!    a fixed 3-D reference model
//! 3. A short calibration window establishes the user's neutral pose
//! 4. Displacement from the neutral pose is classified into right, left, up,
//!    down, or none
//!
//! # Examples
//!
//! ```no_run
//! use head_input::{
//!     calibration::Calibrator,
//!     direction::{classify, DirectionThresholds},
//!     landmarks::LandmarkSet,
//!     pose_estimation::PoseEstimator,
//! };
//! use opencv::core::Point2f;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let estimator = PoseEstimator::new(640, 480)?;
//! let mut calibrator = Calibrator::new(10, false);
//! let thresholds = DirectionThresholds::default();
//!
//! // Six landmarks per frame: nose tip, chin, eye corners, mouth corners
//! let landmarks = LandmarkSet::new([
//!     Point2f::new(320.0, 240.0),
//!     Point2f::new(320.0, 330.0),
//!     Point2f::new(260.0, 190.0),
//!     Point2f::new(380.0, 190.0),
//!     Point2f::new(280.0, 290.0),
//!     Point2f::new(360.0, 290.0),
//! ]);
//!
//! let pose = estimator.estimate(&landmarks)?;
//! calibrator.observe(&pose, None);
//!
//! let direction = classify(&pose, calibrator.state(), &thresholds);
//! println!("Direction: {direction}");
//! # Ok(())
//! # }
//! ```

/// Face detection module for finding the user's face
pub mod face_detection;

/// Facial landmark detection module for finding 68 key points
pub mod mark_detection;

/// Landmark types and the landmark provider capability
pub mod landmarks;

/// ONNX-backed landmark provider
pub mod provider;

/// Head pose estimation module using the `PnP` algorithm
pub mod pose_estimation;

/// Neutral-pose calibration
pub mod calibration;

/// Direction classification
pub mod direction;

/// Translation smoothing
pub mod smoothing;

/// Frame acquisition from camera or video file
pub mod capture;

/// Session controller and cross-thread plumbing
pub mod session;

/// Utility functions for box geometry and safe numeric casts
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
