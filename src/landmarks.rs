//! Facial landmark types and the landmark provider capability.
//!
//! The pipeline only ever sees six named 2-D points per frame. How they are
//! produced is behind the [`LandmarkProvider`] trait so alternative detectors
//! can be substituted without touching the pose estimator or classifier.

use crate::{
    constants::{NUM_PNP_LANDMARKS, PNP_LANDMARK_INDICES},
    Error, Result,
};
use opencv::core::{Mat, Point2f, Rect};

/// Ordered set of the six PnP landmarks in image pixel coordinates.
///
/// Order is fixed and semantically meaningful: nose tip, chin, left eye outer
/// corner, right eye outer corner, left mouth corner, right mouth corner. It
/// must align positionally with the 3-D reference model.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Point2f; NUM_PNP_LANDMARKS],
}

impl LandmarkSet {
    /// Create a landmark set from the six points in canonical order
    #[must_use]
    pub fn new(points: [Point2f; NUM_PNP_LANDMARKS]) -> Self {
        Self { points }
    }

    /// Select the six PnP landmarks from a full 68-point detection
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is too short to contain all selected
    /// indices.
    pub fn from_full_set(full: &[Point2f]) -> Result<Self> {
        let mut points = [Point2f::default(); NUM_PNP_LANDMARKS];
        for (dst, &src_idx) in points.iter_mut().zip(PNP_LANDMARK_INDICES.iter()) {
            *dst = *full.get(src_idx).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Landmark set has {} points, index {} unavailable",
                    full.len(),
                    src_idx
                ))
            })?;
        }
        Ok(Self { points })
    }

    /// All six points in canonical order
    #[must_use]
    pub fn points(&self) -> &[Point2f; NUM_PNP_LANDMARKS] {
        &self.points
    }

    #[must_use]
    pub fn nose_tip(&self) -> Point2f {
        self.points[0]
    }

    #[must_use]
    pub fn chin(&self) -> Point2f {
        self.points[1]
    }

    #[must_use]
    pub fn left_eye_outer(&self) -> Point2f {
        self.points[2]
    }

    #[must_use]
    pub fn right_eye_outer(&self) -> Point2f {
        self.points[3]
    }

    #[must_use]
    pub fn left_mouth(&self) -> Point2f {
        self.points[4]
    }

    #[must_use]
    pub fn right_mouth(&self) -> Point2f {
        self.points[5]
    }
}

/// One frame's worth of detector output: the six landmarks plus the face
/// bounding box used for the calibration anchor overlay.
#[derive(Debug, Clone)]
pub struct FaceObservation {
    /// PnP landmarks in frame pixel coordinates
    pub landmarks: LandmarkSet,
    /// Face bounding box in frame pixel coordinates
    pub face_box: Rect,
}

/// Black-box landmark extraction capability.
///
/// Implementations must return `Ok(None)` for frames with no detectable face
/// and must never panic on malformed input.
pub trait LandmarkProvider {
    /// Locate the six PnP landmarks in a frame, if a face is present
    fn locate(&mut self, frame: &Mat) -> Result<Option<FaceObservation>>;
}
