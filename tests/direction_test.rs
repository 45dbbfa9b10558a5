//! Property tests for direction classification.

use head_input::{
    calibration::CalibrationState,
    direction::{classify, Direction, DirectionThresholds},
    pose_estimation::PoseEstimate,
};
use opencv::core::Vec3d;
use proptest::prelude::*;

fn pose(tx: f64, ty: f64) -> PoseEstimate {
    PoseEstimate {
        rotation: Vec3d::default(),
        translation: Vec3d::from([tx, ty, 1000.0]),
    }
}

fn calibrated(tx: f64, ty: f64) -> CalibrationState {
    CalibrationState {
        neutral_translation: Vec3d::from([tx, ty, 1000.0]),
        samples_seen: 10,
        anchor_box: None,
        is_calibrated: true,
    }
}

proptest! {
    #[test]
    fn prop_classification_is_deterministic(
        tx in -500.0f64..500.0,
        ty in -500.0f64..500.0,
        nx in -100.0f64..100.0,
        ny in -100.0f64..100.0,
    ) {
        let p = pose(tx, ty);
        let calib = calibrated(nx, ny);
        let thresholds = DirectionThresholds::default();

        prop_assert_eq!(
            classify(&p, &calib, &thresholds),
            classify(&p, &calib, &thresholds)
        );
    }

    #[test]
    fn prop_uncalibrated_is_always_none(
        tx in -1000.0f64..1000.0,
        ty in -1000.0f64..1000.0,
    ) {
        let calib = CalibrationState::default();
        let d = classify(&pose(tx, ty), &calib, &DirectionThresholds::default());
        prop_assert_eq!(d, Direction::None);
    }

    #[test]
    fn prop_dominant_horizontal_never_yields_vertical(
        tx in -500.0f64..500.0,
        ty in -500.0f64..500.0,
    ) {
        let thresholds = DirectionThresholds::default();
        let dx = tx.abs();
        let dy = ty.abs();
        prop_assume!(dx > thresholds.x_offset && dx > 1.5 * dy);

        let d = classify(&pose(tx, ty), &calibrated(0.0, 0.0), &thresholds);
        prop_assert!(d == Direction::Left || d == Direction::Right);
    }

    #[test]
    fn prop_within_both_thresholds_is_none(
        tx in -100.0f64..=100.0,
        ty in -75.0f64..=75.0,
    ) {
        let d = classify(&pose(tx, ty), &calibrated(0.0, 0.0), &DirectionThresholds::default());
        prop_assert_eq!(d, Direction::None);
    }

    #[test]
    fn prop_sign_determines_side(dx in 100.1f64..500.0) {
        let thresholds = DirectionThresholds::default();
        let calib = calibrated(0.0, 0.0);

        // Mirrored camera: negative displacement is a move to the right
        prop_assert_eq!(classify(&pose(-dx, 0.0), &calib, &thresholds), Direction::Right);
        prop_assert_eq!(classify(&pose(dx, 0.0), &calib, &thresholds), Direction::Left);
    }
}
