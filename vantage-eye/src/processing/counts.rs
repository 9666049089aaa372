//! Per-frame tallies of tracked classes

use crate::config::TrackedClass;
use crate::error::VisionError;
use crate::processing::label::Label;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CountEntry {
    name: String,
    caption: String,
    count: u32,
}

/// Count per tracked class name, kept in configuration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCounts {
    entries: Vec<CountEntry>,
}

impl FrameCounts {
    /// All tracked classes at zero
    pub fn new(tracked: &[TrackedClass]) -> Self {
        Self {
            entries: tracked
                .iter()
                .map(|class| CountEntry {
                    name: class.name.clone(),
                    caption: class.caption(),
                    count: 0,
                })
                .collect(),
        }
    }

    /// Increment `class_name` if tracked. Returns whether it was counted.
    pub fn record(&mut self, class_name: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.name == class_name) {
            Some(entry) => {
                entry.count = entry.count.saturating_add(1);
                true
            }
            None => false,
        }
    }

    pub fn tally(&mut self, labels: &[Label]) {
        for label in labels {
            self.record(&label.class_name);
        }
    }

    /// Count a rendered label such as `"person 0.91"`
    pub fn tally_rendered(&mut self, text: &str) -> Result<bool, VisionError> {
        let label: Label = text.parse()?;
        Ok(self.record(&label.class_name))
    }

    pub fn get(&self, class_name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.name == class_name)
            .map(|e| e.count)
    }

    /// `(name, count)` pairs in configuration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|e| (e.name.as_str(), e.count))
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// e.g. `"Persons: 2, Cars: 1, Airplanes: 0"`
    pub fn summary_line(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.caption, e.count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
