//! Frame buffer abstraction shared by capture, detection and rendering

use opencv::core::Mat;
use opencv::prelude::*;

/// Minimal view of an image the pipeline needs without touching pixels
pub trait VideoFrame {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

impl VideoFrame for Mat {
    fn width(&self) -> i32 {
        self.cols()
    }

    fn height(&self) -> i32 {
        self.rows()
    }

    fn is_empty(&self) -> bool {
        self.empty()
    }
}
