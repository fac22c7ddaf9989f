//! Core data types produced by a classification call.

use serde::{Deserialize, Serialize};

/// One candidate label with its independent [0, 1] score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    pub label: String,
    pub confidence: f32,
}

/// Label → score mapping in the order the labels were given.
///
/// Labels are not deduplicated, so this is an ordered list rather than a map.
/// Scores are multi-label sigmoid outputs and need not sum to 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationResult {
    entries: Vec<ScoredLabel>,
}

impl ClassificationResult {
    /// Zip labels with scores positionally.
    pub fn from_parts(labels: Vec<String>, scores: Vec<f32>) -> Self {
        let entries = labels
            .into_iter()
            .zip(scores)
            .map(|(label, confidence)| ScoredLabel { label, confidence })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in input order.
    pub fn entries(&self) -> &[ScoredLabel] {
        &self.entries
    }

    /// Labels in input order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// Score of the first entry carrying `label`.
    pub fn get(&self, label: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.confidence)
    }

    /// The `k` highest-scoring entries, best first. Ties keep input order.
    pub fn top_k(&self, k: usize) -> Vec<ScoredLabel> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        ranked.truncate(k);
        ranked
    }
}

/// Non-fatal problem with the request input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputWarning {
    /// No image was supplied
    MissingImage,
    /// No candidate label text was supplied
    MissingLabels,
}

impl InputWarning {
    /// Message shown to the user.
    pub fn message(&self) -> &'static str {
        "Please provide valid input and candidate labels"
    }
}

impl std::fmt::Display for InputWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingImage => write!(f, "missing image: {}", self.message()),
            Self::MissingLabels => write!(f, "missing labels: {}", self.message()),
        }
    }
}

/// Outcome of a successful classification call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Scores in label order
    pub result: ClassificationResult,

    /// Warnings raised while handling the input
    pub warnings: Vec<InputWarning>,
}
