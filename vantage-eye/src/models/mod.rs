//! Detection models

pub mod detector;
pub mod yolo;

pub use detector::{Detector, DetectorAdapter, DetectorOutput};
pub use yolo::{YoloModel, YoloParams};
