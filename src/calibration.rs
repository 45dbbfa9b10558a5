//! Neutral-pose calibration.
//!
//! The first N valid pose estimates after a trigger establish the user's
//! neutral translation and a face anchor box for visual feedback. The neutral
//! reference is last-sample-wins by default; an averaging mode is available
//! behind a flag for users bothered by lock-in jitter.

use crate::{constants::DEFAULT_CALIBRATION_SAMPLES, pose_estimation::PoseEstimate};
use opencv::core::{Rect, Vec3d};

/// Calibration state owned by the session controller
#[derive(Debug, Clone, Default)]
pub struct CalibrationState {
    /// Translation treated as "no movement"
    pub neutral_translation: Vec3d,
    /// Valid pose samples observed since the last trigger
    pub samples_seen: usize,
    /// Face bounding box latched on the first sample, for the overlay
    pub anchor_box: Option<Rect>,
    /// True once enough samples have been observed
    pub is_calibrated: bool,
}

/// Captures a short window of pose estimates to establish the neutral pose
#[derive(Debug)]
pub struct Calibrator {
    target_samples: usize,
    averaging: bool,
    state: CalibrationState,
}

impl Calibrator {
    /// Create a calibrator that locks after `target_samples` observations.
    /// With `averaging` set, the neutral translation is the running mean of
    /// the window instead of the last sample.
    #[must_use]
    pub fn new(target_samples: usize, averaging: bool) -> Self {
        Self {
            target_samples: target_samples.max(1),
            averaging,
            state: CalibrationState::default(),
        }
    }

    /// Feed one valid pose estimate into the calibration window.
    ///
    /// No-op once the state is locked. The anchor box is latched on the
    /// first sample that carries one and held fixed until the next trigger.
    pub fn observe(&mut self, pose: &PoseEstimate, face_box: Option<Rect>) -> &CalibrationState {
        if self.state.is_calibrated {
            return &self.state;
        }

        if self.state.anchor_box.is_none() {
            self.state.anchor_box = face_box;
        }

        if self.averaging && self.state.samples_seen > 0 {
            let n = self.state.samples_seen as f64;
            for i in 0..3 {
                self.state.neutral_translation[i] +=
                    (pose.translation[i] - self.state.neutral_translation[i]) / (n + 1.0);
            }
        } else {
            self.state.neutral_translation = pose.translation;
        }

        self.state.samples_seen += 1;
        if self.state.samples_seen >= self.target_samples {
            self.state.is_calibrated = true;
            log::info!(
                "Calibration locked after {} samples, neutral translation ({:.1}, {:.1}, {:.1})",
                self.state.samples_seen,
                self.state.neutral_translation[0],
                self.state.neutral_translation[1],
                self.state.neutral_translation[2],
            );
        }

        &self.state
    }

    /// Discard the neutral reference and restart the calibration window
    pub fn trigger(&mut self) {
        log::info!("Calibration re-triggered");
        self.state = CalibrationState::default();
    }

    /// Current calibration state
    #[must_use]
    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    /// Samples still needed before the state locks
    #[must_use]
    pub fn remaining_samples(&self) -> usize {
        self.target_samples.saturating_sub(self.state.samples_seen)
    }

    /// Total samples required per window
    #[must_use]
    pub fn target_samples(&self) -> usize {
        self.target_samples
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_SAMPLES, false)
    }
}
