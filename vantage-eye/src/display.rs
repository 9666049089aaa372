//! On-screen display of annotated frames

use crate::config::VisionConfig;
use crate::error::VisionError;
use opencv::{core::Mat, highgui};
use tracing::{info, warn};

/// Receives each annotated frame and reports the user stop signal
pub trait FrameSink {
    type Frame;

    fn show(&mut self, frame: &Self::Frame) -> Result<(), VisionError>;

    /// Polled once per frame, between frames
    fn stop_requested(&mut self) -> Result<bool, VisionError>;
}

/// highgui window, destroyed on [`DisplayWindow::release`] or drop
pub struct DisplayWindow {
    title: String,
    stop_key: i32,
    open: bool,
}

impl DisplayWindow {
    pub fn open(title: impl Into<String>, stop_key: i32) -> Result<Self, VisionError> {
        let title = title.into();
        highgui::named_window(&title, highgui::WINDOW_AUTOSIZE)
            .map_err(|e| {
                VisionError::Display(format!("Failed to open window {:?}: {}", title, e))
            })?;
        info!("Opened display window {:?}", title);

        Ok(Self {
            title,
            stop_key,
            open: true,
        })
    }

    pub fn from_config(config: &VisionConfig) -> Result<Self, VisionError> {
        Self::open(config.window_title.clone(), config.stop_key)
    }

    /// Destroy the window. Safe to call more than once.
    pub fn release(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = highgui::destroy_window(&self.title) {
            warn!("Failed to close window {:?}: {}", self.title, e);
        }
        info!("Closed display window {:?}", self.title);
    }
}

/// Key codes from `wait_key` may carry modifier bits above the low byte
pub fn is_stop_key(key: i32, stop_key: i32) -> bool {
    key >= 0 && (key & 0xFF) == stop_key
}

impl FrameSink for DisplayWindow {
    type Frame = Mat;

    fn show(&mut self, frame: &Mat) -> Result<(), VisionError> {
        highgui::imshow(&self.title, frame)
            .map_err(|e| VisionError::Display(format!("Failed to show frame: {}", e)))
    }

    fn stop_requested(&mut self) -> Result<bool, VisionError> {
        let key = highgui::wait_key(1)
            .map_err(|e| VisionError::Display(format!("Failed to poll keyboard: {}", e)))?;
        Ok(is_stop_key(key, self.stop_key))
    }
}

impl Drop for DisplayWindow {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_stop_key() {
        assert!(is_stop_key(27, 27));
        assert!(is_stop_key(0x10_001B, 27));
        assert!(!is_stop_key(-1, 27));
        assert!(!is_stop_key(113, 27));
        assert!(is_stop_key(113, 'q' as i32));
    }
}
