//! Capture → detect → annotate → display loop

use crate::camera::FrameSource;
use crate::display::FrameSink;
use crate::error::VisionError;
use crate::models::{Detector, DetectorAdapter};
use crate::processing::{Annotator, FramePipeline, ProcessedFrame};
use tracing::{debug, error, info};

/// Why a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    UserStop,
}

/// Frame accounting for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_read: u64,
    pub frames_displayed: u64,
    pub frames_skipped: u64,
    pub stop_reason: StopReason,
}

/// Owns the source, detector, pipeline and sink for the length of one run.
///
/// [`StreamRunner::run`] consumes the runner, so the capture device and the
/// window are dropped on every exit path.
pub struct StreamRunner<S, D, A, W> {
    source: S,
    detector: DetectorAdapter<D>,
    pipeline: FramePipeline<A>,
    sink: W,
    max_consecutive_failures: Option<u32>,
}

impl<S, D, A, W> StreamRunner<S, D, A, W>
where
    S: FrameSource,
    D: Detector<Frame = S::Frame>,
    A: Annotator<Frame = S::Frame>,
    W: FrameSink<Frame = S::Frame>,
{
    pub fn new(source: S, detector: D, pipeline: FramePipeline<A>, sink: W) -> Self {
        Self {
            source,
            detector: DetectorAdapter::new(detector),
            pipeline,
            sink,
            max_consecutive_failures: None,
        }
    }

    /// Abort once this many frames in a row fail; `None` never aborts
    pub fn with_failure_limit(mut self, limit: Option<u32>) -> Self {
        self.max_consecutive_failures = limit;
        self
    }

    fn process(&mut self, frame: &S::Frame) -> Result<ProcessedFrame<S::Frame>, VisionError> {
        let output = self.detector.detect(frame)?;
        self.pipeline.process(frame, &output.detections, output.class_labels)
    }

    /// Run until end-of-stream, user stop or a fatal error
    pub fn run(mut self) -> Result<RunSummary, VisionError> {
        let mut frames_read = 0u64;
        let mut frames_displayed = 0u64;
        let mut frames_skipped = 0u64;
        let mut consecutive_failures = 0u32;

        info!("Stream started");

        let stop_reason = loop {
            let Some(frame) = self.source.next_frame()? else {
                break StopReason::EndOfStream;
            };
            frames_read += 1;
            debug!("Processing frame {}", frames_read);

            match self.process(&frame) {
                Ok(processed) => {
                    consecutive_failures = 0;
                    self.sink.show(&processed.frame)?;
                    frames_displayed += 1;
                }
                Err(e) if e.is_frame_recoverable() => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    frames_skipped += 1;
                    error!("Skipping frame {}: {}", frames_read, e);

                    if let Some(limit) = self.max_consecutive_failures {
                        if consecutive_failures >= limit {
                            error!("{} consecutive frames failed, aborting", consecutive_failures);
                            return Err(VisionError::TooManyFailures {
                                consecutive: consecutive_failures,
                            });
                        }
                    }
                }
                Err(e) => return Err(e),
            }

            if self.sink.stop_requested()? {
                break StopReason::UserStop;
            }
        };

        let summary = RunSummary {
            frames_read,
            frames_displayed,
            frames_skipped,
            stop_reason,
        };
        info!(
            "Stream stopped ({:?}): {} frames read, {} displayed, {} skipped",
            summary.stop_reason,
            summary.frames_read,
            summary.frames_displayed,
            summary.frames_skipped
        );
        Ok(summary)
    }
}
