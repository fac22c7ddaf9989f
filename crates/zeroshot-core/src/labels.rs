//! Candidate label parsing.
//!
//! Labels arrive as one comma-separated string. Splitting keeps order and
//! duplicates, since scores are matched back to labels by position.

use serde::{Deserialize, Serialize};

/// Handling of segments that are empty once trimmed (`"a,,b"`, `""`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Keep empty segments as empty-string labels.
    #[default]
    Preserve,
    /// Remove empty segments.
    DropEmpty,
}

/// Ordered, trimmed candidate labels for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Split `text` on commas and trim each segment.
    pub fn parse(text: &str, policy: LabelPolicy) -> Self {
        let labels = text
            .split(',')
            .map(str::trim)
            .filter(|label| policy == LabelPolicy::Preserve || !label.is_empty())
            .map(str::to_string)
            .collect();
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether any label is the empty string.
    pub fn has_empty(&self) -> bool {
        self.labels.iter().any(String::is_empty)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn into_vec(self) -> Vec<String> {
        self.labels
    }
}
