//! Frame acquisition from a webcam or a video file.

use crate::{Error, Result};
use log::{info, warn};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};

/// Video source type
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(String),
}

/// Stream of frames feeding the session loop.
///
/// `Ok(None)` means the source is exhausted and the session should end.
pub trait FrameSource {
    /// Read the next frame, or `None` when the source has run out
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying capture fails irrecoverably.
    fn next_frame(&mut self) -> Result<Option<Mat>>;

    /// Whether the source is currently open
    fn is_available(&self) -> bool;
}

/// `OpenCV`-backed frame source
pub struct CaptureSource {
    capture: VideoCapture,
    from_file: bool,
}

impl CaptureSource {
    /// Open a camera or video file.
    ///
    /// A source that cannot be opened is fatal at session start, unlike
    /// read failures later on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if the source cannot be opened.
    pub fn open(source: &VideoSource) -> Result<Self> {
        let (capture, from_file) = match source {
            VideoSource::Camera(index) => {
                info!("Opening camera {index}");
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)?;

                // Keep latency low: the game should react to the head now,
                // not half a second ago
                cap.set(CAP_PROP_BUFFERSIZE, 1.0)?;

                (cap, false)
            }
            VideoSource::File(path) => {
                info!("Opening video file: {path}");
                (VideoCapture::from_file(path, videoio::CAP_ANY)?, true)
            }
        };

        if !capture.is_opened()? {
            return Err(Error::Device(match source {
                VideoSource::Camera(index) => format!("Cannot open camera {index}"),
                VideoSource::File(path) => format!("Cannot open video file {path}"),
            }));
        }

        Ok(Self { capture, from_file })
    }
}

impl FrameSource for CaptureSource {
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            if self.from_file {
                info!("End of video file reached");
            } else {
                warn!("Camera stopped delivering frames");
            }
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn is_available(&self) -> bool {
        self.capture.is_opened().unwrap_or(false)
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release capture device: {e}");
        }
    }
}

/// Frame source that replays one already-read frame before delegating.
///
/// The application peeks at the first frame to size the camera model; wrapping
/// the source in this keeps that frame in the stream instead of dropping it.
pub struct PrimedSource<S> {
    first: Option<Mat>,
    inner: S,
}

impl<S: FrameSource> PrimedSource<S> {
    /// Wrap `inner`, yielding `first` before its remaining frames
    pub fn new(first: Mat, inner: S) -> Self {
        Self {
            first: Some(first),
            inner,
        }
    }
}

impl<S: FrameSource> FrameSource for PrimedSource<S> {
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        if let Some(frame) = self.first.take() {
            return Ok(Some(frame));
        }
        self.inner.next_frame()
    }

    fn is_available(&self) -> bool {
        self.first.is_some() || self.inner.is_available()
    }
}
