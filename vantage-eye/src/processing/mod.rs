//! Per-frame processing: labels, counts and annotation

pub mod annotate;
pub mod counts;
pub mod label;
pub mod pipeline;

pub use annotate::{Annotator, OpenCvAnnotator};
pub use counts::FrameCounts;
pub use label::{build_labels, Label};
pub use pipeline::{FramePipeline, ProcessedFrame};
