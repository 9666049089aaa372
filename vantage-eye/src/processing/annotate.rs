//! Box, label and summary rendering

use crate::config::{AnnotationConfig, SummaryConfig, VisionConfig};
use crate::detection::Detection;
use crate::error::VisionError;
use crate::processing::label::Label;
use opencv::core::{Mat, Point, Rect, Scalar};
use opencv::imgproc;
use opencv::prelude::*;

/// Rendering primitive used by the frame pipeline
pub trait Annotator {
    type Frame;

    /// Deep copy; the pipeline never draws on the caller's frame
    fn copy_frame(&self, frame: &Self::Frame) -> Result<Self::Frame, VisionError>;

    /// Draw one box and label per detection. Slices are index-aligned.
    fn draw_detections(
        &self,
        frame: &mut Self::Frame,
        detections: &[Detection],
        labels: &[Label],
    ) -> Result<(), VisionError>;

    /// Draw the counts summary at the configured anchor
    fn draw_summary(&self, frame: &mut Self::Frame, text: &str) -> Result<(), VisionError>;
}

/// BGR palette, indexed by class id
const PALETTE: &[(f64, f64, f64)] = &[
    (56.0, 56.0, 255.0),
    (151.0, 157.0, 255.0),
    (31.0, 112.0, 255.0),
    (29.0, 178.0, 255.0),
    (49.0, 210.0, 207.0),
    (10.0, 249.0, 72.0),
    (23.0, 204.0, 146.0),
    (134.0, 219.0, 61.0),
    (211.0, 188.0, 0.0),
    (209.0, 99.0, 106.0),
];

const LABEL_PADDING: i32 = 4;

fn class_color(class_id: usize) -> Scalar {
    let (b, g, r) = PALETTE[class_id % PALETTE.len()];
    Scalar::new(b, g, r, 0.0)
}

/// OpenCV `imgproc` renderer for `Mat` frames
#[derive(Debug, Clone)]
pub struct OpenCvAnnotator {
    annotation: AnnotationConfig,
    summary: SummaryConfig,
}

impl OpenCvAnnotator {
    pub fn new(annotation: AnnotationConfig, summary: SummaryConfig) -> Self {
        Self { annotation, summary }
    }

    pub fn from_config(config: &VisionConfig) -> Self {
        Self::new(config.annotation.clone(), config.summary.clone())
    }

    fn draw_label(
        &self,
        frame: &mut Mat,
        text: &str,
        bbox: Rect,
        color: Scalar,
    ) -> Result<(), VisionError> {
        let mut baseline = 0;
        let size = imgproc::get_text_size(
            text,
            imgproc::FONT_HERSHEY_SIMPLEX,
            self.annotation.text_scale,
            self.annotation.text_thickness,
            &mut baseline,
        )?;

        let background_height = size.height + baseline + 2 * LABEL_PADDING;
        // Above the box when there is room, otherwise inside its top edge.
        let top = if bbox.y >= background_height {
            bbox.y - background_height
        } else {
            bbox.y
        };
        let background = Rect::new(bbox.x, top, size.width + 2 * LABEL_PADDING, background_height);
        imgproc::rectangle(frame, background, color, imgproc::FILLED, imgproc::LINE_8, 0)?;

        imgproc::put_text(
            frame,
            text,
            Point::new(bbox.x + LABEL_PADDING, top + LABEL_PADDING + size.height),
            imgproc::FONT_HERSHEY_SIMPLEX,
            self.annotation.text_scale,
            Scalar::new(0.0, 0.0, 0.0, 0.0),
            self.annotation.text_thickness,
            imgproc::LINE_AA,
            false,
        )?;

        Ok(())
    }
}

impl Annotator for OpenCvAnnotator {
    type Frame = Mat;

    fn copy_frame(&self, frame: &Mat) -> Result<Mat, VisionError> {
        Ok(frame.try_clone()?)
    }

    fn draw_detections(
        &self,
        frame: &mut Mat,
        detections: &[Detection],
        labels: &[Label],
    ) -> Result<(), VisionError> {
        for (detection, label) in detections.iter().zip(labels) {
            let bbox = detection.bbox;
            let rect = Rect::new(
                bbox.x1.round() as i32,
                bbox.y1.round() as i32,
                bbox.width().round().max(1.0) as i32,
                bbox.height().round().max(1.0) as i32,
            );
            let color = class_color(detection.class_id);

            imgproc::rectangle(
                frame,
                rect,
                color,
                self.annotation.box_thickness,
                imgproc::LINE_8,
                0,
            )?;
            self.draw_label(frame, &label.to_string(), rect, color)?;
        }

        Ok(())
    }

    fn draw_summary(&self, frame: &mut Mat, text: &str) -> Result<(), VisionError> {
        let (b, g, r) = self.summary.color;
        imgproc::put_text(
            frame,
            text,
            Point::new(self.summary.anchor.0, self.summary.anchor.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            self.summary.font_scale,
            Scalar::new(b as f64, g as f64, r as f64, 0.0),
            self.summary.thickness,
            imgproc::LINE_8,
            false,
        )?;
        Ok(())
    }
}
