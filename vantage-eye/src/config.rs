//! Configuration for vantage-eye

use crate::error::VisionError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A class name whose detections are tallied each frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TrackedClassRepr")]
pub struct TrackedClass {
    pub name: String,
    /// Summary caption, e.g. "Persons". Derived from the name when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Accepts both `"person"` and `{"name": "person", "caption": "People"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum TrackedClassRepr {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        caption: Option<String>,
    },
}

impl From<TrackedClassRepr> for TrackedClass {
    fn from(repr: TrackedClassRepr) -> Self {
        match repr {
            TrackedClassRepr::Name(name) => TrackedClass { name, caption: None },
            TrackedClassRepr::Detailed { name, caption } => TrackedClass { name, caption },
        }
    }
}

impl TrackedClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caption: None,
        }
    }

    pub fn with_caption(name: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caption: Some(caption.into()),
        }
    }

    /// Caption shown in the summary line
    pub fn caption(&self) -> String {
        match &self.caption {
            Some(caption) => caption.clone(),
            None => default_caption(&self.name),
        }
    }
}

/// "person" -> "Persons"
fn default_caption(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            let mut caption: String = first.to_uppercase().collect();
            caption.push_str(chars.as_str());
            caption.push('s');
            caption
        }
        None => String::new(),
    }
}

/// Box and label rendering options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub box_thickness: i32,
    pub text_thickness: i32,
    pub text_scale: f64,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            box_thickness: 2,
            text_thickness: 2,
            text_scale: 1.0,
        }
    }
}

/// Counts summary line options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Text baseline origin in pixels
    pub anchor: (i32, i32),
    pub font_scale: f64,
    pub thickness: i32,
    /// BGR
    pub color: (u8, u8, u8),
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            anchor: (10, 30),
            font_scale: 0.8,
            thickness: 2,
            color: (0, 255, 0),
        }
    }
}

/// Vision system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Device index ("0") or file path / stream URL
    pub source: String,
    /// ONNX detection model
    pub model_path: PathBuf,
    /// Newline-separated class names; COCO names when unset
    pub class_names_path: Option<PathBuf>,
    /// Square model input edge in pixels
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Ordered; the summary line follows this order
    pub tracked_classes: Vec<TrackedClass>,
    pub annotation: AnnotationConfig,
    pub summary: SummaryConfig,
    pub window_title: String,
    /// Key code that stops the run (27 = Esc)
    pub stop_key: i32,
    /// Requested capture resolution (width, height), devices only
    pub resolution: Option<(u32, u32)>,
    /// Requested capture frame rate, devices only
    pub frame_rate: Option<u32>,
    /// Abort after this many consecutive detection failures; `None` never aborts
    pub max_consecutive_failures: Option<u32>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        let model_path = dirs::home_dir()
            .map(|mut p| {
                p.push(".vantage");
                p.push("models");
                p.push("yolov8n.onnx");
                p
            })
            .unwrap_or_else(|| PathBuf::from("./models/yolov8n.onnx"));

        Self {
            source: "0".to_string(),
            model_path,
            class_names_path: None,
            input_size: 640,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            tracked_classes: vec![
                TrackedClass::new("person"),
                TrackedClass::new("car"),
                TrackedClass::new("airplane"),
            ],
            annotation: AnnotationConfig::default(),
            summary: SummaryConfig::default(),
            window_title: "Vantage".to_string(),
            stop_key: 27,
            resolution: None,
            frame_rate: None,
            max_consecutive_failures: Some(30),
        }
    }
}

impl VisionConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self, VisionError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            VisionError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;
        let config = Self::from_json(&contents)
            .map_err(|e| VisionError::Config(format!("{:?}: {}", path, e)))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: VisionConfig =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Names of the tracked classes, in summary order
    pub fn tracked_names(&self) -> impl Iterator<Item = &str> {
        self.tracked_classes.iter().map(|c| c.name.as_str())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.source.trim().is_empty() {
            return Err("Video source must not be empty".to_string());
        }

        if self.input_size < 32 || self.input_size > 2048 || self.input_size % 32 != 0 {
            return Err("Input size must be a multiple of 32 between 32 and 2048".to_string());
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("Confidence threshold must be between 0 and 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err("IoU threshold must be between 0 and 1".to_string());
        }

        if self.tracked_classes.is_empty() {
            return Err("At least one tracked class is required".to_string());
        }

        let mut seen = HashSet::new();
        for class in &self.tracked_classes {
            if class.name.trim().is_empty() {
                return Err("Tracked class names must not be empty".to_string());
            }
            if !seen.insert(class.name.as_str()) {
                return Err(format!("Tracked class {:?} listed twice", class.name));
            }
        }

        if self.annotation.box_thickness < 1 || self.annotation.box_thickness > 20 {
            return Err("Box thickness must be between 1 and 20".to_string());
        }

        if self.annotation.text_thickness < 1 || self.annotation.text_thickness > 20 {
            return Err("Text thickness must be between 1 and 20".to_string());
        }

        if !self.annotation.text_scale.is_finite() || self.annotation.text_scale <= 0.0 {
            return Err("Text scale must be positive".to_string());
        }

        if !self.summary.font_scale.is_finite() || self.summary.font_scale <= 0.0 {
            return Err("Summary font scale must be positive".to_string());
        }

        if self.summary.thickness < 1 || self.summary.thickness > 20 {
            return Err("Summary thickness must be between 1 and 20".to_string());
        }

        if self.summary.anchor.0 < 0 || self.summary.anchor.1 < 0 {
            return Err("Summary anchor must be inside the frame".to_string());
        }

        if !(0..=255).contains(&self.stop_key) {
            return Err("Stop key must be a key code between 0 and 255".to_string());
        }

        if let Some(frame_rate) = self.frame_rate {
            if frame_rate == 0 || frame_rate > 120 {
                return Err("Frame rate must be between 1 and 120".to_string());
            }
        }

        if let Some((width, height)) = self.resolution {
            if width == 0 || height == 0 {
                return Err("Resolution must be non-zero".to_string());
            }
            if width > 7680 || height > 4320 {
                return Err("Resolution too large (max 8K)".to_string());
            }
        }

        if self.max_consecutive_failures == Some(0) {
            return Err(
                "max_consecutive_failures must be at least 1 (use null to disable)".to_string(),
            );
        }

        Ok(())
    }
}
