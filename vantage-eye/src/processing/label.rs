//! Display labels for detections
//!
//! A label renders as `"<class_name> <confidence>"` with exactly one space
//! and two decimals. The counting stage works on [`Label`] records; the text
//! form is for the overlay and for consumers that only see rendered text,
//! which parse it back with [`str::parse`].

use crate::detection::{ClassLabelMap, Detection};
use crate::error::VisionError;
use std::fmt;
use std::str::FromStr;

/// Class name and confidence of one detection
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub class_name: String,
    pub confidence: f32,
}

impl Label {
    pub fn new(class_name: impl Into<String>, confidence: f32) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
        }
    }

    /// Label for `detection`; ids missing from `class_labels` render as `class_<id>`
    pub fn for_detection(detection: &Detection, class_labels: &ClassLabelMap) -> Self {
        let class_name = match class_labels.get(detection.class_id) {
            Some(name) => name.to_string(),
            None => format!("class_{}", detection.class_id),
        };
        Self::new(class_name, detection.confidence)
    }
}

/// One label per detection, same order
pub fn build_labels(detections: &[Detection], class_labels: &ClassLabelMap) -> Vec<Label> {
    detections
        .iter()
        .map(|detection| Label::for_detection(detection, class_labels))
        .collect()
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.class_name, self.confidence)
    }
}

impl FromStr for Label {
    type Err = VisionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| VisionError::LabelParse {
            label: text.to_string(),
            reason: reason.to_string(),
        };

        // Split at the last space so multi-word class names survive.
        let (class_name, confidence) = text
            .rsplit_once(' ')
            .ok_or_else(|| malformed("missing separator between class name and confidence"))?;

        if class_name.is_empty() {
            return Err(malformed("empty class name"));
        }
        if class_name.trim() != class_name {
            return Err(malformed("class name has surrounding whitespace"));
        }

        if !is_fixed_two_decimals(confidence) {
            return Err(malformed("confidence is not written as d.dd"));
        }
        let confidence: f32 = confidence
            .parse()
            .map_err(|_| malformed("confidence is not a number"))?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(malformed("confidence out of range"));
        }

        Ok(Label::new(class_name, confidence))
    }
}

/// Exactly one digit, a point and two digits, as `Display` writes it
fn is_fixed_two_decimals(token: &str) -> bool {
    matches!(
        token.as_bytes(),
        [whole, b'.', tenths, hundredths]
            if whole.is_ascii_digit() && tenths.is_ascii_digit() && hundredths.is_ascii_digit()
    )
}
