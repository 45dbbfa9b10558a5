//! Shared helpers for integration tests

use head_input::constants::REFERENCE_MODEL_POINTS;
use head_input::landmarks::LandmarkSet;
use opencv::core::Point2f;

/// Project the 3-D reference model through an ideal pinhole camera with
/// identity rotation and the given translation. Matches the camera model the
/// pose estimator assumes: focal length = image width, principal point at the
/// image center.
#[allow(clippy::cast_possible_truncation)]
pub fn project_pose(tx: f64, ty: f64, tz: f64, width: f64, height: f64) -> LandmarkSet {
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
