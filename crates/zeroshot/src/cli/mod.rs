//! Command implementations.

pub mod classify;
pub mod config;
pub mod models;
pub mod serve;

use std::sync::Arc;

use anyhow::Context;
use zeroshot_core::{Classifier, Config, SigLipModel};

/// Load the configured model and wrap it in a classifier.
pub fn load_classifier(config: &Config) -> anyhow::Result<Classifier> {
    let model_dir = config.model_files_dir();
    let model = SigLipModel::load(&config.model, &model_dir)
        .with_context(|| format!("Failed to load model from {}", model_dir.display()))?;
    Ok(Classifier::from_config(Arc::new(model), config))
}
