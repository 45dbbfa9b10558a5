//! ONNX-backed landmark provider.
//!
//! Composes the face detector and the 68-point landmark network into the
//! [`LandmarkProvider`](crate::landmarks::LandmarkProvider) capability the
//! pipeline consumes: face box in, six PnP landmarks out.

use crate::{
    face_detection::FaceDetector,
    landmarks::{FaceObservation, LandmarkProvider, LandmarkSet},
    mark_detection::MarkDetector,
    utils::refine_box,
    Result,
};
use opencv::core::{Mat, Point2f};
use opencv::prelude::*;
use std::path::Path;

/// Landmark provider backed by a pair of ONNX models
pub struct OnnxLandmarkProvider {
    face_detector: FaceDetector,
    mark_detector: MarkDetector,
    box_expansion: f32,
}

impl OnnxLandmarkProvider {
    /// Load the detector and landmark models
    ///
    /// # Errors
    ///
    /// Returns an error if either model fails to load.
    pub fn new<P: AsRef<Path>>(
        face_model: P,
        landmark_model: P,
        conf_threshold: f32,
        nms_threshold: f32,
        box_expansion: f32,
    ) -> Result<Self> {
        Ok(Self {
            face_detector: FaceDetector::new(face_model, conf_threshold, nms_threshold)?,
            mark_detector: MarkDetector::new(landmark_model)?,
            box_expansion,
        })
    }
}

impl LandmarkProvider for OnnxLandmarkProvider {
    fn locate(&mut self, frame: &Mat) -> Result<Option<FaceObservation>> {
        let Some(face_box) = self.face_detector.detect(frame)? else {
            return Ok(None);
        };

        let refined = refine_box(face_box, frame.cols(), frame.rows(), self.box_expansion);
        if refined.width <= 0 || refined.height <= 0 {
            log::debug!("Face box collapsed after refinement, skipping frame");
            return Ok(None);
        }

        let face_roi = Mat::roi(frame, refined)?.try_clone()?;
        let marks = self.mark_detector.detect(&face_roi)?;

        // Landmarks come back in crop coordinates; shift into frame space
        #[allow(clippy::cast_precision_loss)]
        let frame_marks: Vec<Point2f> = marks
            .iter()
            .map(|p| Point2f::new(p.x + refined.x as f32, p.y + refined.y as f32))
            .collect();

        let landmarks = LandmarkSet::from_full_set(&frame_marks)?;
        Ok(Some(FaceObservation {
            landmarks,
            face_box: refined,
        }))
    }
}
