//! Frame pipeline: labels, annotation and per-class counts

use crate::config::{TrackedClass, VisionConfig};
use crate::detection::{ClassLabelMap, Detection};
use crate::error::VisionError;
use crate::processing::annotate::{Annotator, OpenCvAnnotator};
use crate::processing::counts::FrameCounts;
use crate::processing::label::{build_labels, Label};
use tracing::debug;

/// Result of processing one frame
#[derive(Debug)]
pub struct ProcessedFrame<F> {
    /// Annotated copy of the input frame
    pub frame: F,
    /// Index-aligned with the input detections
    pub labels: Vec<Label>,
    pub counts: FrameCounts,
    pub summary: String,
}

/// Turns one frame's detections into an annotated frame and counts
pub struct FramePipeline<A> {
    annotator: A,
    tracked: Vec<TrackedClass>,
}

impl FramePipeline<OpenCvAnnotator> {
    /// OpenCV pipeline configured from `config`
    pub fn from_config(config: &VisionConfig) -> Self {
        Self::new(OpenCvAnnotator::from_config(config), config.tracked_classes.clone())
    }
}

impl<A: Annotator> FramePipeline<A> {
    pub fn new(annotator: A, tracked: Vec<TrackedClass>) -> Self {
        Self { annotator, tracked }
    }

    /// Label, annotate and count. `frame` is left untouched.
    pub fn process(
        &self,
        frame: &A::Frame,
        detections: &[Detection],
        class_labels: &ClassLabelMap,
    ) -> Result<ProcessedFrame<A::Frame>, VisionError> {
        let labels = build_labels(detections, class_labels);

        let mut annotated = self.annotator.copy_frame(frame)?;
        self.annotator.draw_detections(&mut annotated, detections, &labels)?;

        let mut counts = FrameCounts::new(&self.tracked);
        counts.tally(&labels);

        let summary = counts.summary_line();
        self.annotator.draw_summary(&mut annotated, &summary)?;

        debug!("{} detections, {}", detections.len(), summary);

        Ok(ProcessedFrame {
            frame: annotated,
            labels,
            counts,
            summary,
        })
    }
}
