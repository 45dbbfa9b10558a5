//! Main application module: capture thread, display loop, and game tick.
//!
//! The pipeline runs on its own thread so that face detection latency never
//! blocks the GUI. The two threads share only the direction slot, the frame
//! slot, and the session signals.

use crate::{
    calibration::Calibrator,
    capture::{CaptureSource, FrameSource, PrimedSource, VideoSource},
    config::Config,
    direction::Direction,
    error::{Error, Result},
    pose_estimation::PoseEstimator,
    provider::OnnxLandmarkProvider,
    session::{DirectionSlot, FrameSlot, NullDisplay, SessionController, SessionSignals},
    smoothing::TranslationSmoother,
};
use log::info;
use opencv::highgui::{self, WINDOW_NORMAL};
use opencv::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Poll interval for the headless loop
const HEADLESS_POLL: Duration = Duration::from_millis(10);

/// Head input application
pub struct HeadInputApp {
    config: Config,
    video_source: VideoSource,
}

impl HeadInputApp {
    /// Create the application from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config, video_source: VideoSource) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            video_source,
        })
    }

    /// Run until the source is exhausted or the user quits.
    ///
    /// Keys in the camera window: `c` re-triggers calibration, `q` or ESC
    /// quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture device or the models cannot be opened,
    /// or if the pipeline fails irrecoverably.
    pub fn run(&self) -> Result<()> {
        info!("Initializing head input application");

        let mut source = CaptureSource::open(&self.video_source)?;

        // The camera model needs the frame geometry, so peek at one frame
        // and hand it back so the pipeline still processes it
        let first_frame = source
            .next_frame()?
            .ok_or_else(|| Error::Device("Source produced no frames".to_string()))?;
        let estimator = PoseEstimator::new(first_frame.cols(), first_frame.rows())?;
        let mut source = PrimedSource::new(first_frame, source);

        let provider = OnnxLandmarkProvider::new(
            &self.config.models.face_detector,
            &self.config.models.face_landmarks,
            self.config.face_detection.confidence_threshold,
            self.config.face_detection.iou_threshold,
            self.config.face_detection.bbox_expansion,
        )?;

        let calibrator = Calibrator::new(
            self.config.calibration.samples,
            self.config.calibration.averaging,
        );
        let smoother = if self.config.smoothing.enabled {
            Some(TranslationSmoother::new(self.config.smoothing.window))
        } else {
            None
        };

        let mut controller = SessionController::new(
            provider,
            estimator,
            calibrator,
            self.config.thresholds,
            smoother,
            self.config.capture.mirror,
        );

        let signals = Arc::new(SessionSignals::new());
        let directions = Arc::new(DirectionSlot::new());
        let frames = Arc::new(FrameSlot::new());

        let gui = self.config.display.gui;
        let pipeline_signals = Arc::clone(&signals);
        let pipeline_directions = Arc::clone(&directions);
        let pipeline_frames = Arc::clone(&frames);

        let pipeline = thread::spawn(move || -> Result<()> {
            if gui {
                controller.run(
                    &mut source,
                    pipeline_directions.as_ref(),
                    pipeline_frames.as_ref(),
                    &pipeline_signals,
                )
            } else {
                controller.run(
                    &mut source,
                    pipeline_directions.as_ref(),
                    &NullDisplay,
                    &pipeline_signals,
                )
            }
        });

        let result = self.drive(gui, &signals, &directions, &frames, &pipeline);

        signals.request_stop();
        let pipeline_result = pipeline
            .join()
            .map_err(|_| Error::Device("Pipeline thread panicked".to_string()))?;

        result.and(pipeline_result)
    }

    /// Display loop and game tick on the calling thread
    fn drive(
        &self,
        gui: bool,
        signals: &SessionSignals,
        directions: &DirectionSlot,
        frames: &FrameSlot,
        pipeline: &thread::JoinHandle<Result<()>>,
    ) -> Result<()> {
        let window_name = &self.config.display.window_name;
        if gui {
            highgui::named_window(window_name, WINDOW_NORMAL)?;
        }

        let tick = Duration::from_millis(self.config.display.tick_ms);
        let mut last_tick = Instant::now();

        while !signals.stop_requested() && !pipeline.is_finished() {
            if gui {
                if let Some(frame) = frames.take_latest() {
                    highgui::imshow(window_name, &frame)?;
                }

                let key = highgui::wait_key(1)?;
                if key == 27 || key == i32::from(b'q') {
                    info!("Exit requested by user");
                    signals.request_stop();
                } else if key == i32::from(b'c') {
                    info!("Recalibration requested by user");
                    signals.request_recalibration();
                }
            } else {
                thread::sleep(HEADLESS_POLL);
            }

            // Game tick: sample the latest direction at a fixed rate
            if last_tick.elapsed() >= tick {
                let direction = directions.latest();
                if direction != Direction::None {
                    info!("Game tick: {direction}");
                }
                last_tick = Instant::now();
            }
        }

        Ok(())
    }
}
