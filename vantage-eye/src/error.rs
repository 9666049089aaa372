//! Error types for vantage-eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Video source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Frame is empty")]
    EmptyFrame,

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("Detection failed on {consecutive} consecutive frames")]
    TooManyFailures { consecutive: u32 },

    #[error("Malformed label {label:?}: {reason}")]
    LabelParse { label: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("ONNX Runtime error: {0}")]
    Ort(String),

    #[error("OpenCV error: {0}")]
    OpenCv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VisionError {
    /// Errors confined to a single frame. The stream loop skips the frame
    /// and keeps going; everything else ends the run.
    ///
    /// `LabelParse` is not in this set: it concerns one label, and callers of
    /// `FrameCounts::tally_rendered` drop that label and keep the frame.
    pub fn is_frame_recoverable(&self) -> bool {
        matches!(
            self,
            VisionError::EmptyFrame | VisionError::Detection(_) | VisionError::OpenCv(_)
        )
    }
}

impl From<opencv::Error> for VisionError {
    fn from(err: opencv::Error) -> Self {
        VisionError::OpenCv(err.message)
    }
}
