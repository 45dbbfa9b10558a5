//! Facial landmark detection using `ONNX` Runtime.
//!
//! Runs a 68-point landmark network on a square face crop and returns the
//! points in crop pixel coordinates.

use crate::{constants::NUM_FACIAL_LANDMARKS, Error, Result};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Point2f, Size, CV_32F};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Landmark network input size
const LANDMARK_INPUT_SIZE: i32 = 128;

/// Facial landmark detector using `ONNX` Runtime
pub struct MarkDetector {
    session: Session,
    input_size: i32,
}

impl MarkDetector {
    /// Create a new landmark detector from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if the model file cannot be loaded or the ONNX
    /// runtime environment cannot be created.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        log::info!(
            "Initializing MarkDetector with model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("mark_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        Ok(Self {
            session,
            input_size: LANDMARK_INPUT_SIZE,
        })
    }

    /// Detect the 68 facial landmarks in a face crop.
    ///
    /// Coordinates are scaled back to the crop's pixel space.
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing, inference, or output extraction
    /// fails.
    pub fn detect(&self, face_image: &Mat) -> Result<Vec<Point2f>> {
        let input = self.preprocess(face_image)?;
        let marks = self.forward(input)?;
        self.postprocess(&marks, face_image)
    }

    /// Resize to the network input size, convert BGR to RGB, scale to [0, 1]
    #[allow(clippy::cast_sign_loss)] // OpenCV dimensions are positive
    fn preprocess(&self, image: &Mat) -> Result<Array4<f32>> {
        let size = self.input_size as usize;
        let channels = 3;

        let mut resized = Mat::default();
        imgproc::resize(
            image,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut rgb_image = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb_image, imgproc::COLOR_BGR2RGB, 0)?;

        let mut float_image = Mat::default();
        rgb_image.convert_to(&mut float_image, CV_32F, 1.0 / 255.0, 0.0)?;

        let mut data = vec![0.0f32; size * size * channels];
        for row in 0..size {
            for col in 0..size {
                let pixel = float_image.at_2d::<opencv::core::Vec3f>(row as i32, col as i32)?;
                for ch in 0..channels {
                    data[(row * size + col) * channels + ch] = pixel[ch];
                }
            }
        }

        // The landmark model takes NHWC input
        Array4::from_shape_vec((1, size, size, channels), data)
            .map_err(|e| Error::ModelError(format!("Failed to create input array: {e}")))
    }

    /// Run forward pass through the model
    fn forward(&self, inputs: Array4<f32>) -> Result<Vec<f32>> {
        let cow_array = CowArray::from(inputs.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;

        let marks_output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| Error::ModelOutputError("No output from landmark model".to_string()))?;

        let marks_tensor = marks_output.try_extract::<f32>()?;
        let marks_view = marks_tensor.view();
        let marks_data = marks_view
            .as_slice()
            .ok_or_else(|| Error::ModelOutputError("Failed to get output data".to_string()))?;

        Ok(marks_data.to_vec())
    }

    /// Scale normalized network output back to crop pixel coordinates
    #[allow(clippy::cast_precision_loss)] // Precision loss acceptable for pixel coordinates
    fn postprocess(&self, marks: &[f32], face_image: &Mat) -> Result<Vec<Point2f>> {
        let expected = NUM_FACIAL_LANDMARKS * 2;
        if marks.len() < expected {
            return Err(Error::ModelOutputError(format!(
                "Expected {} landmark values, got {}",
                expected,
                marks.len()
            )));
        }

        let face_width = face_image.cols() as f32;
        let face_height = face_image.rows() as f32;
        let scale = self.input_size as f32;

        let landmarks = (0..NUM_FACIAL_LANDMARKS)
            .map(|j| {
                let x = marks[j * 2] * face_width / scale;
                let y = marks[j * 2 + 1] * face_height / scale;
                Point2f::new(x, y)
            })
            .collect();

        Ok(landmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_value_count() {
        // Each landmark carries an x and a y
        assert_eq!(NUM_FACIAL_LANDMARKS * 2, 136);
    }

    #[test]
    fn test_missing_model_file_is_error() {
        assert!(MarkDetector::new("nonexistent_model.onnx").is_err());
    }
}
