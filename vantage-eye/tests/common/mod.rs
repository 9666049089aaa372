//! In-memory stand-ins for the camera, model, renderer and window

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use vantage_eye::config::VisionConfig;
use vantage_eye::{
    Annotator, BoundingBox, ClassLabelMap, Detection, Detector, FramePipeline, FrameSink,
    FrameSource, Label, VideoFrame, VisionError,
};

/// A frame is an id plus the drawing operations applied to it
#[derive(Debug, Clone, PartialEq)]
pub struct TestFrame {
    pub id: u32,
    pub width: i32,
    pub height: i32,
    pub ops: Vec<String>,
}

impl TestFrame {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            width: 640,
            height: 480,
            ops: Vec::new(),
        }
    }

    pub fn empty(id: u32) -> Self {
        Self {
            width: 0,
            height: 0,
            ..Self::new(id)
        }
    }
}

impl VideoFrame for TestFrame {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }
}

pub fn detection(class_id: usize, confidence: f32) -> Detection {
    Detection::new(class_id, confidence, BoundingBox::new(10.0, 20.0, 110.0, 220.0))
}

pub struct FakeSource {
    frames: VecDeque<TestFrame>,
    pub released: Rc<Cell<bool>>,
}

impl FakeSource {
    pub fn new(frames: Vec<TestFrame>) -> Self {
        Self {
            frames: frames.into(),
            released: Rc::new(Cell::new(false)),
        }
    }

    pub fn with_frame_count(count: u32) -> Self {
        Self::new((1..=count).map(TestFrame::new).collect())
    }
}

impl FrameSource for FakeSource {
    type Frame = TestFrame;

    fn next_frame(&mut self) -> Result<Option<TestFrame>, VisionError> {
        Ok(self.frames.pop_front())
    }
}

impl Drop for FakeSource {
    fn drop(&mut self) {
        self.released.set(true);
    }
}

type Script = Box<dyn FnMut(&TestFrame) -> Result<Vec<Detection>, VisionError>>;

pub struct FakeDetector {
    labels: ClassLabelMap,
    script: Script,
    pub calls: Rc<Cell<u32>>,
}

impl FakeDetector {
    pub fn new(
        script: impl FnMut(&TestFrame) -> Result<Vec<Detection>, VisionError> + 'static,
    ) -> Self {
        Self {
            labels: ClassLabelMap::coco(),
            script: Box::new(script),
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Same detections for every frame
    pub fn fixed(detections: Vec<Detection>) -> Self {
        Self::new(move |_| Ok(detections.clone()))
    }
}

impl Detector for FakeDetector {
    type Frame = TestFrame;

    fn name(&self) -> &str {
        "fake"
    }

    fn class_labels(&self) -> &ClassLabelMap {
        &self.labels
    }

    fn detect(&mut self, frame: &TestFrame) -> Result<Vec<Detection>, VisionError> {
        self.calls.set(self.calls.get() + 1);
        (self.script)(frame)
    }
}

/// Records drawing operations; drawing fails on the listed frame ids
#[derive(Default)]
pub struct RecordingAnnotator {
    pub fail_on: Vec<u32>,
}

impl RecordingAnnotator {
    pub fn failing_on(ids: &[u32]) -> Self {
        Self {
            fail_on: ids.to_vec(),
        }
    }
}

impl Annotator for RecordingAnnotator {
    type Frame = TestFrame;

    fn copy_frame(&self, frame: &TestFrame) -> Result<TestFrame, VisionError> {
        Ok(frame.clone())
    }

    fn draw_detections(
        &self,
        frame: &mut TestFrame,
        detections: &[Detection],
        labels: &[Label],
    ) -> Result<(), VisionError> {
        if self.fail_on.contains(&frame.id) {
            return Err(VisionError::OpenCv(format!("rectangle failed on frame {}", frame.id)));
        }
        for (detection, label) in detections.iter().zip(labels) {
            frame.ops.push(format!("box {} {}", detection.class_id, label));
        }
        Ok(())
    }

    fn draw_summary(&self, frame: &mut TestFrame, text: &str) -> Result<(), VisionError> {
        frame.ops.push(format!("summary {}", text));
        Ok(())
    }
}

pub fn pipeline() -> FramePipeline<RecordingAnnotator> {
    pipeline_with(RecordingAnnotator::default())
}

pub fn pipeline_with(annotator: RecordingAnnotator) -> FramePipeline<RecordingAnnotator> {
    FramePipeline::new(annotator, VisionConfig::default().tracked_classes)
}

pub struct FakeSink {
    pub shown: Rc<RefCell<Vec<TestFrame>>>,
    pub released: Rc<Cell<bool>>,
    /// Report a stop after this many frames have been shown
    pub stop_after: Option<usize>,
    pub fail_show: bool,
}

impl FakeSink {
    pub fn new() -> Self {
        Self {
            shown: Rc::new(RefCell::new(Vec::new())),
            released: Rc::new(Cell::new(false)),
            stop_after: None,
            fail_show: false,
        }
    }
}

impl FrameSink for FakeSink {
    type Frame = TestFrame;

    fn show(&mut self, frame: &TestFrame) -> Result<(), VisionError> {
        if self.fail_show {
            return Err(VisionError::Display("window closed".to_string()));
        }
        self.shown.borrow_mut().push(frame.clone());
        Ok(())
    }

    fn stop_requested(&mut self) -> Result<bool, VisionError> {
        Ok(matches!(self.stop_after, Some(n) if self.shown.borrow().len() >= n))
    }
}

impl Drop for FakeSink {
    fn drop(&mut self) {
        self.released.set(true);
    }
}
