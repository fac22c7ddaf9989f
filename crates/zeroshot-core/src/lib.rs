//! Zeroshot Core - zero-shot image classification with SigLIP 2.
//!
//! Give it an image and a comma-separated list of candidate labels; it returns
//! an independent [0, 1] score for every label, in the order the labels were
//! given.
//!
//! # Architecture
//!
//! ```text
//! "a dog, a cat" → LabelSet ─┐
//!                            ├→ ZeroShotModel (logits) → sigmoid → ClassificationResult
//! image ─────────────────────┘
//! ```
//!
//! The model is an explicit dependency of [`Classifier`], so callers and tests
//! can substitute their own [`ZeroShotModel`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use zeroshot_core::{Classifier, Config, SigLipModel};
//!
//! let config = Config::load()?;
//! let model = SigLipModel::load(&config.model, &config.model_files_dir())?;
//! let classifier = Classifier::from_config(Arc::new(model), &config);
//!
//! let outcome = classifier.classify(Some(&image), Some("a dog, a cat"))?;
//! for entry in outcome.result.top_k(3) {
//!     println!("{}: {:.3}", entry.label, entry.confidence);
//! }
//! ```

// Module declarations
pub mod classifier;
pub mod config;
pub mod decode;
pub mod error;
pub mod gallery;
pub mod labels;
pub mod math;
pub mod model;
pub mod types;

// Re-exports for convenient access
pub use classifier::Classifier;
pub use config::Config;
pub use decode::{DecodedImage, ImageDecoder};
pub use error::{
    ClassifyCause, ClassifyError, ConfigError, DecodeError, ModelError, Result, ZeroShotError,
};
pub use gallery::{Example, Gallery};
pub use labels::{LabelPolicy, LabelSet};
pub use model::{SigLipModel, ZeroShotModel};
pub use types::{Classification, ClassificationResult, InputWarning, ScoredLabel};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
