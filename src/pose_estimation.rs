//! Head pose estimation using the `PnP` algorithm.
//!
//! Maps the six 2-D landmarks onto the fixed 3-D anthropometric reference
//! model under a pinhole camera with zero distortion. OpenCV's iterative
//! solver (DLT initialization refined by Levenberg-Marquardt) recovers the
//! rotation and translation that minimize reprojection error.

use crate::{
    constants::{CAMERA_CENTER_FACTOR, MIN_LANDMARK_SPREAD, REFERENCE_MODEL_POINTS},
    landmarks::LandmarkSet,
    utils::safe_cast::usize_to_i32,
    Error, Result,
};
use opencv::{
    calib3d,
    core::{Mat, Point2f, Point3f, Vec3d, Vector},
    prelude::*,
};

/// Recovered head pose: axis-angle rotation and translation, both in the
/// camera frame (translation in reference-model units, millimeters)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEstimate {
    /// Rotation vector (axis-angle, from the solve)
    pub rotation: Vec3d,
    /// Translation vector
    pub translation: Vec3d,
}

/// Head pose estimator for a fixed frame geometry
pub struct PoseEstimator {
    object_points: Vector<Point3f>,
    camera_matrix: Mat,
    dist_coeffs: Mat,
}

impl PoseEstimator {
    /// Create a pose estimator for the given frame dimensions.
    ///
    /// Focal length is approximated by the image width and the principal
    /// point sits at the image center; lens distortion is assumed zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the OpenCV matrix operations fail.
    pub fn new(image_width: i32, image_height: i32) -> Result<Self> {
        log::info!("Initializing PoseEstimator for {image_width}x{image_height} frames");

        let object_points: Vector<Point3f> = REFERENCE_MODEL_POINTS
            .iter()
            .map(|&[x, y, z]| Point3f::new(x, y, z))
            .collect();

        let focal_length = f64::from(image_width);
        let center = (
            f64::from(image_width) / CAMERA_CENTER_FACTOR,
            f64::from(image_height) / CAMERA_CENTER_FACTOR,
        );

        let mut camera_matrix = Mat::zeros(3, 3, opencv::core::CV_64F)?.to_mat()?;
        let camera_matrix_data: [f64; 9] = [
            focal_length,
            0.0,
            center.0,
            0.0,
            focal_length,
            center.1,
            0.0,
            0.0,
            1.0,
        ];
        for (idx, &value) in camera_matrix_data.iter().enumerate() {
            let i = idx / 3;
            let j = idx % 3;
            *camera_matrix.at_2d_mut::<f64>(usize_to_i32(i)?, usize_to_i32(j)?)? = value;
        }

        // Assume no lens distortion
        let dist_coeffs = Mat::zeros(4, 1, opencv::core::CV_64F)?.to_mat()?;

        Ok(Self {
            object_points,
            camera_matrix,
            dist_coeffs,
        })
    }

    /// Estimate the head pose from one frame's landmarks.
    ///
    /// Pure function of the inputs and the constant reference model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSolution`] when the landmark configuration is
    /// degenerate or the solver fails to converge; callers should fall back
    /// to the previous valid estimate.
    pub fn estimate(&self, landmarks: &LandmarkSet) -> Result<PoseEstimate> {
        Self::check_spread(landmarks)?;

        let image_points: Vector<Point2f> = landmarks.points().iter().copied().collect();

        let mut rvec = Mat::default();
        let mut tvec = Mat::default();

        let converged = calib3d::solve_pnp(
            &self.object_points,
            &image_points,
            &self.camera_matrix,
            &self.dist_coeffs,
            &mut rvec,
            &mut tvec,
            false,
            calib3d::SOLVEPNP_ITERATIVE,
        )
        .map_err(|e| Error::NoSolution(format!("PnP solve failed: {e}")))?;

        if !converged {
            return Err(Error::NoSolution("PnP solver did not converge".to_string()));
        }

        let rotation = Vec3d::from([
            *rvec.at_2d::<f64>(0, 0)?,
            *rvec.at_2d::<f64>(1, 0)?,
            *rvec.at_2d::<f64>(2, 0)?,
        ]);
        let translation = Vec3d::from([
            *tvec.at_2d::<f64>(0, 0)?,
            *tvec.at_2d::<f64>(1, 0)?,
            *tvec.at_2d::<f64>(2, 0)?,
        ]);

        let finite = rotation.iter().chain(translation.iter()).all(|v| v.is_finite());
        if !finite {
            return Err(Error::NoSolution(
                "PnP solve produced a non-finite pose".to_string(),
            ));
        }

        Ok(PoseEstimate { rotation, translation })
    }

    /// Project the reference model through a recovered pose back onto the
    /// image plane. Used by tests and the overlay to gauge reprojection
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the OpenCV projection fails.
    pub fn reproject(&self, pose: &PoseEstimate) -> Result<Vec<Point2f>> {
        let mut projected: Vector<Point2f> = Vector::new();
        calib3d::project_points(
            &self.object_points,
            &pose.rotation,
            &pose.translation,
            &self.camera_matrix,
            &self.dist_coeffs,
            &mut projected,
            &mut Mat::default(),
            0.0,
        )?;
        Ok(projected.to_vec())
    }

    /// Reject configurations that collapse to a point or a line parallel to
    /// an image axis before handing them to the solver
    fn check_spread(landmarks: &LandmarkSet) -> Result<()> {
        let points = landmarks.points();
        let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
        for p in points {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(Error::NoSolution("non-finite landmark coordinate".to_string()));
            }
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        if max_x - min_x < MIN_LANDMARK_SPREAD || max_y - min_y < MIN_LANDMARK_SPREAD {
            return Err(Error::NoSolution(format!(
                "degenerate landmark configuration (spread {}x{})",
                max_x - min_x,
                max_y - min_y
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::Point2f;

    /// Pinhole projection of the reference model with identity rotation,
    /// mirroring the estimator's camera model
    fn project_neutral(tx: f64, ty: f64, tz: f64, width: f64, height: f64) -> LandmarkSet {
        let mut points = [Point2f::default(); 6];
        for (dst, &[x, y, z]) in points.iter_mut().zip(REFERENCE_MODEL_POINTS.iter()) {
            let cx = f64::from(x) + tx;
            let cy = f64::from(y) + ty;
            let cz = f64::from(z) + tz;
            let u = width * cx / cz + width / 2.0;
            let v = width * cy / cz + height / 2.0;
            *dst = Point2f::new(u as f32, v as f32);
        }
        LandmarkSet::new(points)
    }

    #[test]
    fn test_recovers_synthetic_translation() {
        let estimator = PoseEstimator::new(640, 480).unwrap();
        let landmarks = project_neutral(50.0, -30.0, 1000.0, 640.0, 480.0);

        let pose = estimator.estimate(&landmarks).unwrap();

        assert!((pose.translation[0] - 50.0).abs() < 5.0, "tx = {}", pose.translation[0]);
        assert!((pose.translation[1] + 30.0).abs() < 5.0, "ty = {}", pose.translation[1]);
        assert!((pose.translation[2] - 1000.0).abs() < 20.0, "tz = {}", pose.translation[2]);
        for i in 0..3 {
            assert!(pose.rotation[i].abs() < 0.05, "rotation[{i}] = {}", pose.rotation[i]);
        }
    }

    #[test]
    fn test_reprojection_matches_input() {
        let estimator = PoseEstimator::new(640, 480).unwrap();
        let landmarks = project_neutral(0.0, 0.0, 900.0, 640.0, 480.0);

        let pose = estimator.estimate(&landmarks).unwrap();
        let reprojected = estimator.reproject(&pose).unwrap();

        assert_eq!(reprojected.len(), 6);
        for (observed, predicted) in landmarks.points().iter().zip(reprojected.iter()) {
            let err = ((observed.x - predicted.x).powi(2) + (observed.y - predicted.y).powi(2)).sqrt();
            assert!(err < 1.0, "reprojection error {err} too large");
        }
    }

    #[test]
    fn test_degenerate_configuration_is_no_solution() {
        let estimator = PoseEstimator::new(640, 480).unwrap();
        let collapsed = LandmarkSet::new([Point2f::new(320.0, 240.0); 6]);

        match estimator.estimate(&collapsed) {
            Err(Error::NoSolution(_)) => {}
            other => panic!("expected NoSolution, got {other:?}"),
        }
    }

    #[test]
    fn test_collinear_configuration_is_no_solution() {
        let estimator = PoseEstimator::new(640, 480).unwrap();
        // All points on a horizontal line: no vertical spread
        let mut points = [Point2f::default(); 6];
        for (i, p) in points.iter_mut().enumerate() {
            *p = Point2f::new(100.0 + 40.0 * i as f32, 240.0);
        }
        let line = LandmarkSet::new(points);

        assert!(matches!(estimator.estimate(&line), Err(Error::NoSolution(_))));
    }

    #[test]
    fn test_non_finite_landmark_is_no_solution() {
        let estimator = PoseEstimator::new(640, 480).unwrap();
        let mut points = [Point2f::new(100.0, 100.0); 6];
        points[2] = Point2f::new(f32::NAN, 50.0);
        let bad = LandmarkSet::new(points);

        assert!(matches!(estimator.estimate(&bad), Err(Error::NoSolution(_))));
    }
}
