//! Detector seam and output normalization

use crate::detection::{ClassLabelMap, Detection};
use crate::error::VisionError;
use crate::frame::VideoFrame;
use tracing::{debug, warn};

/// Object-detection model: frame in, detections out
pub trait Detector {
    type Frame: VideoFrame;

    /// Used in log messages
    fn name(&self) -> &str;

    /// Fixed for the lifetime of the model
    fn class_labels(&self) -> &ClassLabelMap;

    fn detect(&mut self, frame: &Self::Frame) -> Result<Vec<Detection>, VisionError>;
}

/// Normalized detections for one frame
#[derive(Debug)]
pub struct DetectorOutput<'a> {
    pub detections: Vec<Detection>,
    pub class_labels: &'a ClassLabelMap,
}

/// Wraps a [`Detector`] and normalizes what it returns.
///
/// Holds no per-frame state: each call depends only on the frame passed in.
/// Model ordering is preserved. Detections with a class id outside the label
/// map or a non-finite confidence or box are dropped, confidences are clamped
/// to `[0, 1]` and boxes are clamped to the frame.
pub struct DetectorAdapter<D> {
    detector: D,
}

impl<D: Detector> DetectorAdapter<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    pub fn detect(&mut self, frame: &D::Frame) -> Result<DetectorOutput<'_>, VisionError> {
        if frame.is_empty() {
            return Err(VisionError::EmptyFrame);
        }

        let raw = self.detector.detect(frame).map_err(|e| match e {
            VisionError::Detection(_) => e,
            other => VisionError::Detection(format!("{}: {}", self.detector.name(), other)),
        })?;

        let class_labels = self.detector.class_labels();
        let width = frame.width() as f32;
        let height = frame.height() as f32;
        let raw_len = raw.len();

        let detections: Vec<Detection> = raw
            .into_iter()
            .filter(|d| class_labels.contains(d.class_id))
            .filter(|d| d.confidence.is_finite() && d.bbox.is_finite())
            .map(|d| Detection {
                class_id: d.class_id,
                confidence: d.confidence.clamp(0.0, 1.0),
                bbox: d.bbox.clamp_to(width, height),
            })
            .collect();

        if detections.len() < raw_len {
            warn!(
                "{} returned {} invalid detections, dropped",
                self.detector.name(),
                raw_len - detections.len()
            );
        }
        debug!("{} detected {} objects", self.detector.name(), detections.len());

        Ok(DetectorOutput {
            detections,
            class_labels,
        })
    }
}
