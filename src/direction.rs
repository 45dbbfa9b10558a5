//! Direction classification against the calibrated neutral pose.

use crate::{
    calibration::CalibrationState,
    constants::{DEFAULT_X_OFFSET, DEFAULT_Y_OFFSET, HORIZONTAL_DOMINANCE_RATIO},
    pose_estimation::PoseEstimate,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete direction signal consumed by the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Head within the neutral zone, no change
    #[default]
    None,
    /// Head moved to the user's right
    Right,
    /// Head moved to the user's left
    Left,
    /// Head moved up
    Up,
    /// Head moved down
    Down,
}

impl Direction {
    /// Swap the horizontal sides.
    ///
    /// A horizontally flipped frame inverts the image x axis, so directions
    /// classified from it carry swapped left/right; this restores the
    /// physical sides. Vertical directions are unaffected.
    #[must_use]
    pub fn mirrored(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
            other => other,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Right => "right",
            Self::Left => "left",
            Self::Up => "up",
            Self::Down => "down",
        };
        f.write_str(name)
    }
}

/// Minimum displacement from neutral required to register a move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionThresholds {
    /// Horizontal offset threshold
    pub x_offset: f64,
    /// Vertical offset threshold
    pub y_offset: f64,
}

impl Default for DirectionThresholds {
    fn default() -> Self {
        Self {
            x_offset: DEFAULT_X_OFFSET,
            y_offset: DEFAULT_Y_OFFSET,
        }
    }
}

/// Classify a pose against the calibrated neutral reference.
///
/// Pure function: the same displacement always yields the same direction.
/// Horizontal motion is checked first but only wins when it exceeds
/// [`HORIZONTAL_DOMINANCE_RATIO`] times the vertical component; one direction
/// per frame, no compound diagonals. An uncalibrated state always yields
/// [`Direction::None`].
#[must_use]
pub fn classify(
    pose: &PoseEstimate,
    calib: &CalibrationState,
    thresholds: &DirectionThresholds,
) -> Direction {
    if !calib.is_calibrated {
        return Direction::None;
    }

    let dx = pose.translation[0] - calib.neutral_translation[0];
    let dy = pose.translation[1] - calib.neutral_translation[1];

    if dx.abs() > thresholds.x_offset && dx.abs() > HORIZONTAL_DOMINANCE_RATIO * dy.abs() {
        // In an unflipped camera frame the user's right is the camera's
        // left, so a move to the right shrinks x
        if dx < 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy.abs() > thresholds.y_offset {
        if dy < 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    } else {
        Direction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::Vec3d;

    fn calibrated_at(tx: f64, ty: f64, tz: f64) -> CalibrationState {
        CalibrationState {
            neutral_translation: Vec3d::from([tx, ty, tz]),
            samples_seen: 10,
            anchor_box: None,
            is_calibrated: true,
        }
    }

    fn pose(tx: f64, ty: f64, tz: f64) -> PoseEstimate {
        PoseEstimate {
            rotation: Vec3d::default(),
            translation: Vec3d::from([tx, ty, tz]),
        }
    }

    fn thresholds(x: f64, y: f64) -> DirectionThresholds {
        DirectionThresholds { x_offset: x, y_offset: y }
    }

    #[test]
    fn test_uncalibrated_always_none() {
        let calib = CalibrationState::default();
        let d = classify(&pose(500.0, 500.0, 0.0), &calib, &thresholds(100.0, 75.0));
        assert_eq!(d, Direction::None);
    }

    #[test]
    fn test_end_to_end_scenarios() {
        let calib = calibrated_at(0.0, 0.0, 0.0);
        let t = thresholds(100.0, 75.0);

        assert_eq!(classify(&pose(-150.0, 0.0, 0.0), &calib, &t), Direction::Right);
        assert_eq!(classify(&pose(0.0, -90.0, 0.0), &calib, &t), Direction::Up);
        assert_eq!(classify(&pose(20.0, 20.0, 0.0), &calib, &t), Direction::None);
    }

    #[test]
    fn test_horizontal_dominance_falls_through_to_vertical() {
        let calib = calibrated_at(0.0, 0.0, 0.0);
        let t = thresholds(100.0, 75.0);

        // |dx| = 200 exceeds x_offset but not 1.5 * 150 = 225, so the
        // vertical check decides
        assert_eq!(classify(&pose(200.0, 150.0, 0.0), &calib, &t), Direction::Down);

        // |dx| = 300 exceeds both 100 and 1.5 * 100 = 150; dx > 0 is Left
        assert_eq!(classify(&pose(300.0, 100.0, 0.0), &calib, &t), Direction::Left);
    }

    #[test]
    fn test_relative_to_neutral() {
        let calib = calibrated_at(40.0, -20.0, 950.0);
        let t = thresholds(100.0, 75.0);

        // dx = -160 from neutral
        assert_eq!(classify(&pose(-120.0, -20.0, 950.0), &calib, &t), Direction::Right);
        // dy = 80 from neutral
        assert_eq!(classify(&pose(40.0, 60.0, 950.0), &calib, &t), Direction::Down);
        // Within both thresholds
        assert_eq!(classify(&pose(90.0, 30.0, 950.0), &calib, &t), Direction::None);
    }

    #[test]
    fn test_threshold_boundaries_are_exclusive() {
        let calib = calibrated_at(0.0, 0.0, 0.0);
        let t = thresholds(100.0, 75.0);

        assert_eq!(classify(&pose(100.0, 0.0, 0.0), &calib, &t), Direction::None);
        assert_eq!(classify(&pose(0.0, 75.0, 0.0), &calib, &t), Direction::None);
        assert_eq!(classify(&pose(0.0, 75.1, 0.0), &calib, &t), Direction::Down);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Direction::Right.to_string(), "right");
        assert_eq!(Direction::None.to_string(), "none");
    }

    #[test]
    fn test_mirrored_swaps_horizontal_only() {
        assert_eq!(Direction::Right.mirrored(), Direction::Left);
        assert_eq!(Direction::Left.mirrored(), Direction::Right);
        assert_eq!(Direction::Up.mirrored(), Direction::Up);
        assert_eq!(Direction::Down.mirrored(), Direction::Down);
        assert_eq!(Direction::None.mirrored(), Direction::None);
    }
}
