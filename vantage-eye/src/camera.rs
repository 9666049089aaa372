//! Video capture from webcams, files and streams

use crate::config::VisionConfig;
use crate::error::VisionError;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use std::fmt;
use tracing::{debug, info, warn};

/// Sequential source of frames. `Ok(None)` means end-of-stream.
pub trait FrameSource {
    type Frame;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>, VisionError>;
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Camera index, e.g. `0`
    Device(i32),
    /// File path or stream URL
    Path(String),
}

impl SourceSpec {
    /// All-digit strings are device indices; anything else is a path
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        match trimmed.parse::<i32>() {
            Ok(index) if index >= 0 && trimmed.chars().all(|c| c.is_ascii_digit()) => {
                SourceSpec::Device(index)
            }
            _ => SourceSpec::Path(trimmed.to_string()),
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::Device(index) => write!(f, "camera {}", index),
            SourceSpec::Path(path) => write!(f, "{}", path),
        }
    }
}

/// OpenCV capture handle, released on [`VideoSource::release`] or drop
pub struct VideoSource {
    spec: SourceSpec,
    capture: Option<VideoCapture>,
}

impl VideoSource {
    /// Open `spec`. Resolution and frame rate apply to devices only.
    pub fn open(
        spec: SourceSpec,
        resolution: Option<(u32, u32)>,
        frame_rate: Option<u32>,
    ) -> Result<Self, VisionError> {
        let capture = match &spec {
            SourceSpec::Device(index) => VideoCapture::new(*index, CAP_ANY),
            SourceSpec::Path(path) => VideoCapture::from_file(path, CAP_ANY),
        }
        .map_err(|e| VisionError::SourceUnavailable(format!("Failed to open {}: {}", spec, e)))?;

        let opened = capture
            .is_opened()
            .map_err(|e| VisionError::SourceUnavailable(format!("{} not opened: {}", spec, e)))?;
        if !opened {
            return Err(VisionError::SourceUnavailable(format!("{} failed to open", spec)));
        }

        let mut source = Self {
            spec,
            capture: Some(capture),
        };
        if matches!(source.spec, SourceSpec::Device(_)) {
            source.apply_device_settings(resolution, frame_rate)?;
        }

        info!("Opened video source {}", source.spec);
        Ok(source)
    }

    pub fn from_config(config: &VisionConfig) -> Result<Self, VisionError> {
        Self::open(SourceSpec::parse(&config.source), config.resolution, config.frame_rate)
    }

    fn apply_device_settings(
        &mut self,
        resolution: Option<(u32, u32)>,
        frame_rate: Option<u32>,
    ) -> Result<(), VisionError> {
        let Some(capture) = self.capture.as_mut() else {
            return Ok(());
        };

        if let Some((width, height)) = resolution {
            capture
                .set(CAP_PROP_FRAME_WIDTH, width as f64)
                .map_err(|e| {
                    VisionError::SourceUnavailable(format!("Failed to set width: {}", e))
                })?;
            capture
                .set(CAP_PROP_FRAME_HEIGHT, height as f64)
                .map_err(|e| {
                    VisionError::SourceUnavailable(format!("Failed to set height: {}", e))
                })?;
        }
        if let Some(fps) = frame_rate {
            capture
                .set(CAP_PROP_FPS, fps as f64)
                .map_err(|e| VisionError::SourceUnavailable(format!("Failed to set FPS: {}", e)))?;
        }
        Ok(())
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    /// Release the capture device. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.release() {
                warn!("Failed to release {}: {}", self.spec, e);
            }
            info!("Released video source {}", self.spec);
        }
    }
}

impl FrameSource for VideoSource {
    type Frame = Mat;

    /// Read errors and empty frames end the stream; nothing is retried
    fn next_frame(&mut self) -> Result<Option<Mat>, VisionError> {
        let Some(capture) = self.capture.as_mut() else {
            return Ok(None);
        };

        let mut frame = Mat::default();
        match capture.read(&mut frame) {
            Ok(true) if !frame.empty() => Ok(Some(frame)),
            Ok(_) => {
                debug!("{} reported end of stream", self.spec);
                Ok(None)
            }
            Err(e) => {
                warn!("Failed to read from {}: {}; treating as end of stream", self.spec, e);
                Ok(None)
            }
        }
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.release();
    }
}
