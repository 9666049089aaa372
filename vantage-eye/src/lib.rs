//! vantage-eye: live object counting for video streams
//!
//! Reads frames from a camera or video file, runs an ONNX object detector on
//! each one, draws boxes and labels, tallies a configurable set of classes
//! and shows the annotated result. Frames are processed one at a time and
//! independently of each other.

pub mod camera;
pub mod config;
pub mod detection;
pub mod display;
pub mod error;
pub mod frame;
pub mod models;
pub mod processing;
pub mod runner;
mod utils;

pub use camera::{FrameSource, SourceSpec, VideoSource};
pub use config::{TrackedClass, VisionConfig};
pub use detection::{BoundingBox, ClassLabelMap, Detection};
pub use display::{DisplayWindow, FrameSink};
pub use error::VisionError;
pub use frame::VideoFrame;
pub use models::{Detector, DetectorAdapter, YoloModel};
pub use processing::{Annotator, FrameCounts, FramePipeline, Label, OpenCvAnnotator, ProcessedFrame};
pub use runner::{RunSummary, StopReason, StreamRunner};
