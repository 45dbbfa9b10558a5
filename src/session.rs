//! Session controller wiring the pipeline stages together.
//!
//! One frame in, at most one direction out. Frames where the face is lost or
//! the solver fails reuse the previous valid pose, so brief detector dropouts
//! do not flicker the direction signal back to none.

use crate::{
    calibration::Calibrator,
    capture::FrameSource,
    direction::{classify, Direction, DirectionThresholds},
    landmarks::LandmarkProvider,
    pose_estimation::{PoseEstimate, PoseEstimator},
    smoothing::TranslationSmoother,
    Error, Result,
};
use log::{debug, info, warn};
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

/// Consumer of the per-frame direction signal
pub trait GameSink: Send + Sync {
    /// Receive one direction decision
    fn push(&self, direction: Direction);
}

/// Consumer of annotated frames for display
pub trait DisplaySink: Send + Sync {
    /// Receive one annotated frame
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be handed off.
    fn present(&self, frame: &Mat) -> Result<()>;
}

/// Last-write-wins direction slot shared between the pipeline thread and the
/// game thread. The game samples at its own tick rate; stale intermediate
/// directions are intentionally dropped.
#[derive(Debug, Default)]
pub struct DirectionSlot {
    latest: Mutex<Direction>,
}

impl DirectionSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent direction pushed by the pipeline
    pub fn latest(&self) -> Direction {
        self.latest.lock().map(|d| *d).unwrap_or_default()
    }
}

impl GameSink for DirectionSlot {
    fn push(&self, direction: Direction) {
        if let Ok(mut slot) = self.latest.lock() {
            *slot = direction;
        }
    }
}

/// Last-write-wins frame slot; the display thread takes frames when it is
/// ready and skipped frames are simply never shown.
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Mutex<Option<Mat>>,
}

impl FrameSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the most recent frame, leaving the slot empty
    pub fn take_latest(&self) -> Option<Mat> {
        self.latest.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl DisplaySink for FrameSlot {
    fn present(&self, frame: &Mat) -> Result<()> {
        let copy = frame.try_clone()?;
        if let Ok(mut slot) = self.latest.lock() {
            *slot = Some(copy);
        }
        Ok(())
    }
}

/// Display sink for headless operation
#[derive(Debug, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn present(&self, _frame: &Mat) -> Result<()> {
        Ok(())
    }
}

/// Cross-thread control flags for the session loop
#[derive(Debug, Default)]
pub struct SessionSignals {
    stop: AtomicBool,
    recalibrate: AtomicBool,
}

impl SessionSignals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the session loop to exit
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Ask the session to discard the neutral pose and recalibrate
    pub fn request_recalibration(&self) {
        self.recalibrate.store(true, Ordering::SeqCst);
    }

    /// Consume a pending recalibration request, if any
    pub fn take_recalibration(&self) -> bool {
        self.recalibrate.swap(false, Ordering::SeqCst)
    }
}

/// Drives one input session: frames in, direction signal out
pub struct SessionController<P: LandmarkProvider> {
    provider: P,
    estimator: PoseEstimator,
    calibrator: Calibrator,
    thresholds: DirectionThresholds,
    smoother: Option<TranslationSmoother>,
    mirror: bool,
    last_pose: Option<PoseEstimate>,
    last_direction: Direction,
}

impl<P: LandmarkProvider> SessionController<P> {
    /// Assemble a session from its pipeline stages.
    ///
    /// With `mirror` set, frames are flipped horizontally before processing
    /// so the preview behaves like a mirror; the controller swaps the
    /// horizontal sides of the classifier output back, keeping the emitted
    /// signal tied to the user's physical movement.
    pub fn new(
        provider: P,
        estimator: PoseEstimator,
        calibrator: Calibrator,
        thresholds: DirectionThresholds,
        smoother: Option<TranslationSmoother>,
        mirror: bool,
    ) -> Self {
        Self {
            provider,
            estimator,
            calibrator,
            thresholds,
            smoother,
            mirror,
            last_pose: None,
            last_direction: Direction::None,
        }
    }

    /// Process one frame and return the direction decision.
    ///
    /// A missed face or a failed solve holds the previous pose; a frame
    /// before the first valid pose yields [`Direction::None`].
    ///
    /// # Errors
    ///
    /// Returns an error only for unrecoverable `OpenCV` failures. Provider
    /// and solver failures are treated as missed frames.
    pub fn process_frame(&mut self, frame: &Mat) -> Result<Direction> {
        let observation = match self.provider.locate(frame) {
            Ok(observation) => observation,
            Err(e) => {
                warn!("Landmark provider failed, holding last pose: {e}");
                None
            }
        };

        if let Some(observation) = observation {
            match self.estimator.estimate(&observation.landmarks) {
                Ok(mut pose) => {
                    if let Some(smoother) = &mut self.smoother {
                        pose.translation = smoother.apply(pose.translation);
                    }
                    self.calibrator.observe(&pose, Some(observation.face_box));
                    self.last_pose = Some(pose);
                }
                Err(Error::NoSolution(reason)) => {
                    debug!("Solver failed, holding last pose: {reason}");
                }
                Err(e) => return Err(e),
            }
        }

        let mut direction = match &self.last_pose {
            Some(pose) => classify(pose, self.calibrator.state(), &self.thresholds),
            None => Direction::None,
        };
        if self.mirror {
            // The classifier expects raw camera coordinates; flipped frames
            // invert the x axis, so the horizontal sides come out swapped
            direction = direction.mirrored();
        }
        self.last_direction = direction;
        Ok(direction)
    }

    /// Discard the neutral pose and restart calibration
    pub fn trigger_calibration(&mut self) {
        self.calibrator.trigger();
        if let Some(smoother) = &mut self.smoother {
            smoother.reset();
        }
        self.last_pose = None;
        self.last_direction = Direction::None;
    }

    /// Draw the calibration anchor and current state onto a frame
    ///
    /// # Errors
    ///
    /// Returns an error if drawing fails.
    pub fn annotate(&self, frame: &mut Mat) -> Result<()> {
        let state = self.calibrator.state();

        if let Some(anchor) = state.anchor_box {
            let color = if state.is_calibrated {
                Scalar::new(0.0, 255.0, 0.0, 0.0)
            } else {
                Scalar::new(0.0, 255.0, 255.0, 0.0)
            };
            imgproc::rectangle(frame, anchor, color, 2, LINE_8, 0)?;
        }

        let status = if state.is_calibrated {
            self.last_direction.to_string()
        } else {
            format!(
                "CALIBRATING {}/{}",
                state.samples_seen,
                self.calibrator.target_samples()
            )
        };
        imgproc::put_text(
            frame,
            &status,
            Point::new(10, 30),
            FONT_HERSHEY_SIMPLEX,
            1.0,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
            2,
            LINE_8,
            false,
        )?;

        Ok(())
    }

    /// Run the session loop until the source is exhausted or a stop is
    /// requested.
    ///
    /// Every non-none direction is forwarded to the game sink; every frame is
    /// annotated and handed to the display sink.
    ///
    /// # Errors
    ///
    /// Returns an error on unrecoverable capture, processing, or display
    /// failures.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        game: &dyn GameSink,
        display: &dyn DisplaySink,
        signals: &SessionSignals,
    ) -> Result<()> {
        info!("Session loop started");

        while !signals.stop_requested() {
            if signals.take_recalibration() {
                self.trigger_calibration();
            }

            let Some(frame) = source.next_frame()? else {
                break;
            };

            let frame = if self.mirror {
                let mut flipped = Mat::default();
                opencv::core::flip(&frame, &mut flipped, 1)?;
                flipped
            } else {
                frame
            };

            let direction = self.process_frame(&frame)?;
            if direction != Direction::None {
                game.push(direction);
            }

            let mut annotated = frame;
            self.annotate(&mut annotated)?;
            display.present(&annotated)?;
        }

        info!("Session loop finished");
        Ok(())
    }

    /// Direction decided for the most recent frame
    #[must_use]
    pub fn last_direction(&self) -> Direction {
        self.last_direction
    }

    /// Whether the neutral pose is currently locked
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.calibrator.state().is_calibrated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_slot_last_write_wins() {
        let slot = DirectionSlot::new();
        assert_eq!(slot.latest(), Direction::None);

        slot.push(Direction::Left);
        slot.push(Direction::Up);
        assert_eq!(slot.latest(), Direction::Up);
        // Reading does not consume
        assert_eq!(slot.latest(), Direction::Up);
    }

    #[test]
    fn test_frame_slot_take_empties() {
        let slot = FrameSlot::new();
        assert!(slot.take_latest().is_none());

        let frame = Mat::new_rows_cols_with_default(
            4,
            4,
            opencv::core::CV_8UC3,
            Scalar::all(0.0),
        )
        .unwrap();
        slot.present(&frame).unwrap();

        assert!(slot.take_latest().is_some());
        assert!(slot.take_latest().is_none());
    }

    #[test]
    fn test_signals_recalibration_consumed_once() {
        let signals = SessionSignals::new();
        assert!(!signals.take_recalibration());

        signals.request_recalibration();
        assert!(signals.take_recalibration());
        assert!(!signals.take_recalibration());
    }

    #[test]
    fn test_signals_stop_latches() {
        let signals = SessionSignals::new();
        assert!(!signals.stop_requested());

        signals.request_stop();
        assert!(signals.stop_requested());
        assert!(signals.stop_requested());
    }
}
