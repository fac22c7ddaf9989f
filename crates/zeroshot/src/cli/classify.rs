//! The `zeroshot classify` command: one-shot classification from the terminal.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use zeroshot_core::{Classification, Config, ImageDecoder};

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Image file to classify
    pub image: PathBuf,

    /// Comma-separated candidate labels
    #[arg(short, long)]
    pub labels: String,

    /// Number of ranked labels to print (defaults to interface.num_top_classes)
    #[arg(long)]
    pub top: Option<usize>,

    /// Print all scores as JSON instead of a ranked list
    #[arg(long)]
    pub json: bool,
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, config: Config) -> anyhow::Result<()> {
    let decoder = ImageDecoder::new(config.limits.clone());
    let decoded = decoder
        .decode_file(&args.image)
        .await
        .with_context(|| format!("Failed to read image {}", args.image.display()))?;

    let classifier = super::load_classifier(&config)?;
    let labels = args.labels;
    let outcome = tokio::task::spawn_blocking(move || {
        classifier.classify(Some(&decoded.image), Some(&labels))
    })
    .await
    .context("Classification task failed")??;

    let top = args.top.unwrap_or(config.interface.num_top_classes);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_ranked(&outcome, top));
    }

    Ok(())
}

/// Ranked, human-readable listing of the top `k` labels.
fn render_ranked(outcome: &Classification, k: usize) -> String {
    let mut out = String::new();
    for warning in &outcome.warnings {
        out.push_str(&format!("warning: {}\n", warning));
    }
    let width = outcome
        .result
        .labels()
        .map(|label| label.chars().count())
        .max()
        .unwrap_or(0);
    for entry in outcome.result.top_k(k) {
        out.push_str(&format!(
            "{:width$}  {:>6.2}%\n",
            entry.label,
            entry.confidence * 100.0,
            width = width
        ));
    }
    out
}
