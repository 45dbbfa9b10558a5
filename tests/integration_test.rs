//! Integration tests for the head input pipeline

use head_input::{
    face_detection::FaceDetector,
    landmarks::LandmarkProvider,
    mark_detection::MarkDetector,
    pose_estimation::PoseEstimator,
    provider::OnnxLandmarkProvider,
};
use opencv::{core::Mat, prelude::*};

/// Test the detector stack on a synthetic frame
#[test]
#[ignore = "Requires ONNX models"]
fn test_full_detector_stack() {
    let mut provider = OnnxLandmarkProvider::new(
        "assets/face_detector.onnx",
        "assets/face_landmarks.onnx",
        0.5,
        0.4,
        0.2,
    )
    .expect("Failed to load models");

    // A black frame has no face; the provider must say so without erroring
    let frame = Mat::zeros(480, 640, opencv::core::CV_8UC3)
        .unwrap()
        .to_mat()
        .unwrap();
    let observation = provider.locate(&frame).expect("Detection failed");
    assert!(observation.is_none());
}

/// Test error handling in the pipeline
#[test]
fn test_pipeline_error_handling() {
    // Invalid model paths must fail at load time, not at inference time
    let face_detector_result = FaceDetector::new("nonexistent_model.onnx", 0.7, 0.3);
    assert!(face_detector_result.is_err(), "Should fail with invalid model path");

    let mark_detector_result = MarkDetector::new("nonexistent_model.onnx");
    assert!(mark_detector_result.is_err(), "Should fail with invalid model path");

    // Pose estimator with edge case dimensions
    let pose_estimator_zero = PoseEstimator::new(0, 0);
    assert!(pose_estimator_zero.is_ok(), "Should handle zero dimensions gracefully");

    let pose_estimator_large = PoseEstimator::new(10000, 10000);
    assert!(pose_estimator_large.is_ok(), "Should handle large dimensions");
}
