//! Face detection using `ONNX` Runtime.
//!
//! SCRFD-style anchor-free detector. The pipeline only tracks one user, so
//! detection returns the single highest-scoring face box after non-maximum
//! suppression.

use crate::{Error, Result};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Rect, Scalar, Size, CV_32F};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// One decoded face candidate in model input coordinates
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

/// SCRFD face detector using `ONNX` Runtime
pub struct FaceDetector {
    session: Session,
    input_size: (i32, i32),
    conf_threshold: f32,
    nms_threshold: f32,
    strides: Vec<i32>,
    score_offset: usize,
    num_anchors: usize,
}

impl FaceDetector {
    /// Create a new face detector from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if the model file cannot be loaded or has no inputs.
    pub fn new<P: AsRef<Path>>(model_path: P, conf_threshold: f32, nms_threshold: f32) -> Result<Self> {
        log::info!(
            "Initializing FaceDetector with model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("face_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input_meta = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelError("Model has no inputs".to_string()))?;
        let input_shape = &input_meta.dimensions;

        // Input shape is [batch, channels, height, width]
        let input_size = if input_shape.len() >= 4 {
            let height = input_shape[2].unwrap_or(640) as i32;
            let width = input_shape[3].unwrap_or(640) as i32;
            (width, height)
        } else {
            (640, 640)
        };

        // Output layout depends on the exported model variant; keypoint
        // outputs (if any) are ignored
        let num_outputs = session.outputs.len();
        let (score_offset, strides, num_anchors) = match num_outputs {
            6 | 9 => (3, vec![8, 16, 32], 2),
            10 | 15 => (5, vec![8, 16, 32, 64, 128], 1),
            _ => {
                log::warn!("Unknown model configuration with {num_outputs} outputs, using defaults");
                (3, vec![8, 16, 32], 2)
            }
        };

        Ok(Self {
            session,
            input_size,
            conf_threshold,
            nms_threshold,
            strides,
            score_offset,
            num_anchors,
        })
    }

    /// Detect the most confident face in an image.
    ///
    /// Returns `Ok(None)` when no face clears the confidence threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails.
    pub fn detect(&self, image: &Mat) -> Result<Option<Rect>> {
        let img_height = image.rows();
        let img_width = image.cols();
        if img_width <= 0 || img_height <= 0 {
            return Ok(None);
        }

        let (det_img, det_scale) = self.letterbox(image)?;
        let inputs = self.preprocess(&det_img)?;
        let candidates = self.forward(inputs)?;
        let kept = Self::nms(candidates, self.nms_threshold);

        let Some(best) = kept.first() else {
            return Ok(None);
        };

        // Scale back to original image coordinates and clamp
        let x1 = (best.x1 / det_scale).max(0.0);
        let y1 = (best.y1 / det_scale).max(0.0);
        let x2 = (best.x2 / det_scale).min(img_width as f32);
        let y2 = (best.y2 / det_scale).min(img_height as f32);
        if x2 <= x1 || y2 <= y1 {
            return Ok(None);
        }

        #[allow(clippy::cast_possible_truncation)] // Clamped to image bounds above
        let bbox = Rect::new(x1 as i32, y1 as i32, (x2 - x1) as i32, (y2 - y1) as i32);
        Ok(Some(bbox))
    }

    /// Aspect-preserving resize into a zero-padded model input canvas
    fn letterbox(&self, image: &Mat) -> Result<(Mat, f32)> {
        let (input_width, input_height) = self.input_size;
        let ratio_img = image.rows() as f32 / image.cols() as f32;
        let ratio_model = input_height as f32 / input_width as f32;

        let (new_width, new_height) = if ratio_img > ratio_model {
            (((input_height as f32) / ratio_img) as i32, input_height)
        } else {
            (input_width, ((input_width as f32) * ratio_img) as i32)
        };
        let det_scale = new_height as f32 / image.rows() as f32;

        let mut resized = Mat::default();
        imgproc::resize(
            image,
            &mut resized,
            Size::new(new_width, new_height),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut det_img = Mat::new_rows_cols_with_default(
            input_height,
            input_width,
            opencv::core::CV_8UC3,
            Scalar::all(0.0),
        )?;
        let mut roi = det_img.roi_mut(Rect::new(0, 0, new_width, new_height))?;
        resized.copy_to(&mut roi)?;

        Ok((det_img, det_scale))
    }

    /// Convert BGR to RGB, normalize, and lay out as NCHW
    #[allow(clippy::cast_sign_loss)] // OpenCV dimensions are positive
    fn preprocess(&self, image: &Mat) -> Result<Array4<f32>> {
        let mut rgb_image = Mat::default();
        imgproc::cvt_color(image, &mut rgb_image, imgproc::COLOR_BGR2RGB, 0)?;

        let mut float_image = Mat::default();
        rgb_image.convert_to(&mut float_image, CV_32F, 1.0, 0.0)?;

        let height = float_image.rows() as usize;
        let width = float_image.cols() as usize;
        let channels = 3;

        // Built NCHW directly so the tensor is already in standard layout
        let mut data = vec![0.0f32; channels * height * width];
        for row in 0..height {
            for col in 0..width {
                let pixel = float_image.at_2d::<opencv::core::Vec3f>(row as i32, col as i32)?;
                for ch in 0..channels {
                    data[ch * height * width + row * width + col] = (pixel[ch] - 127.5) / 128.0;
                }
            }
        }

        Array4::from_shape_vec((1, channels, height, width), data)
            .map_err(|e| Error::ModelError(format!("Failed to create input array: {e}")))
    }

    /// Run inference and decode all candidates above the confidence threshold
    fn forward(&self, inputs: Array4<f32>) -> Result<Vec<Candidate>> {
        let input_height = inputs.shape()[2] as i32;
        let input_width = inputs.shape()[3] as i32;

        let cow_array = CowArray::from(inputs.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let mut candidates = Vec::new();

        for (idx, &stride) in self.strides.iter().enumerate() {
            let scores_tensor = outputs[idx].try_extract::<f32>()?;
            let scores_view = scores_tensor.view();
            let scores = scores_view
                .as_slice()
                .ok_or_else(|| Error::ModelOutputError("Failed to read score output".to_string()))?;

            let bbox_tensor = outputs[idx + self.score_offset].try_extract::<f32>()?;
            let bbox_view = bbox_tensor.view();
            let distances = bbox_view
                .as_slice()
                .ok_or_else(|| Error::ModelOutputError("Failed to read bbox output".to_string()))?;

            let grid_h = input_height / stride;
            let grid_w = input_width / stride;

            for (i, &score) in scores.iter().enumerate() {
                if score < self.conf_threshold {
                    continue;
                }
                let cell = i / self.num_anchors;
                let cy = ((cell as i32 / grid_w) * stride) as f32;
                let cx = ((cell as i32 % grid_w) * stride) as f32;
                if cell as i32 >= grid_h * grid_w || distances.len() < (i + 1) * 4 {
                    continue;
                }

                // Distances are predicted in grid units
                let d = &distances[i * 4..i * 4 + 4];
                candidates.push(Candidate {
                    score,
                    x1: cx - d[0] * stride as f32,
                    y1: cy - d[1] * stride as f32,
                    x2: cx + d[2] * stride as f32,
                    y2: cy + d[3] * stride as f32,
                });
            }
        }

        Ok(candidates)
    }

    /// Greedy non-maximum suppression, highest score first
    fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let mut kept: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            let overlaps = kept
                .iter()
                .any(|k| Self::iou(k, &candidate) > iou_threshold);
            if !overlaps {
                kept.push(candidate);
            }
        }
        kept
    }

    fn iou(a: &Candidate, b: &Candidate) -> f32 {
        let area_a = (a.x2 - a.x1 + 1.0) * (a.y2 - a.y1 + 1.0);
        let area_b = (b.x2 - b.x1 + 1.0) * (b.y2 - b.y1 + 1.0);

        let x1 = a.x1.max(b.x1);
        let y1 = a.y1.max(b.y1);
        let x2 = a.x2.min(b.x2);
        let y2 = a.y2.min(b.y2);

        let inter = (x2 - x1 + 1.0).max(0.0) * (y2 - y1 + 1.0).max(0.0);
        inter / (area_a + area_b - inter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(score: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> Candidate {
        Candidate { score, x1, y1, x2, y2 }
    }

    #[test]
    fn test_nms_keeps_best_of_overlapping_pair() {
        let candidates = vec![
            candidate(0.9, 100.0, 100.0, 200.0, 200.0),
            candidate(0.8, 105.0, 105.0, 205.0, 205.0),
            candidate(0.7, 400.0, 400.0, 450.0, 450.0),
        ];

        let kept = FaceDetector::nms(candidates, 0.4);

        assert_eq!(kept.len(), 2);
        assert!((kept[0].score - 0.9).abs() < f32::EPSILON);
        assert!((kept[1].score - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(FaceDetector::nms(Vec::new(), 0.4).is_empty());
    }

    #[test]
    fn test_iou_disjoint_boxes() {
        let a = candidate(1.0, 0.0, 0.0, 10.0, 10.0);
        let b = candidate(1.0, 100.0, 100.0, 110.0, 110.0);
        assert!(FaceDetector::iou(&a, &b) < f32::EPSILON);
    }

    #[test]
    fn test_iou_identical_boxes() {
        let a = candidate(1.0, 10.0, 10.0, 50.0, 50.0);
        assert!((FaceDetector::iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_model_file_is_error() {
        assert!(FaceDetector::new("nonexistent_model.onnx", 0.5, 0.4).is_err());
    }
}
