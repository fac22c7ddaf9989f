//! The `zeroshot models` command for managing model files.

use std::io::Read;
use std::path::Path;

use clap::{Args, Subcommand};
use zeroshot_core::model::{TEXT_MODEL_FILENAME, TOKENIZER_FILENAME, VISION_MODEL_FILENAME};
use zeroshot_core::{Config, SigLipModel};

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the vision encoder, text encoder and tokenizer
    Download,

    /// List installed model files
    List,

    /// Show model directory path
    Path,
}

/// A file fetched from the model repository.
struct ModelFile {
    label: &'static str,
    remote_path: &'static str,
    local_name: &'static str,
}

const MODEL_FILES: &[ModelFile] = &[
    ModelFile {
        label: "Vision encoder",
        remote_path: "onnx/vision_model.onnx",
        local_name: VISION_MODEL_FILENAME,
    },
    ModelFile {
        label: "Text encoder",
        remote_path: "onnx/text_model.onnx",
        local_name: TEXT_MODEL_FILENAME,
    },
    ModelFile {
        label: "Tokenizer",
        remote_path: "tokenizer.json",
        local_name: TOKENIZER_FILENAME,
    },
];

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download => {
            let client = reqwest::Client::new();
            download_all(&config, &client).await?;
            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let model_dir = config.model_files_dir();

            if !model_dir.exists() {
                println!("No models installed.");
                println!("Run `zeroshot models download` to download required models.");
                return Ok(());
            }

            println!("Model: {}", config.model.name);
            println!("  Directory: {}\n", model_dir.display());
            for file in MODEL_FILES {
                let status = if model_dir.join(file.local_name).exists() {
                    "ready"
                } else {
                    "not installed"
                };
                println!("    - {:30} {}", file.local_name, status);
            }

            if !SigLipModel::model_exists(&model_dir) {
                println!("\nRun `zeroshot models download` to fetch missing files.");
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_files_dir().display());
        }
    }

    Ok(())
}

/// Download every model file that is not already on disk.
async fn download_all(config: &Config, client: &reqwest::Client) -> anyhow::Result<()> {
    let model_dir = config.model_files_dir();
    std::fs::create_dir_all(&model_dir)?;

    for file in MODEL_FILES {
        let dest = model_dir.join(file.local_name);
        if dest.exists() {
            tracing::info!("{} already exists at {:?}", file.label, dest);
            continue;
        }

        let url = format!(
            "https://huggingface.co/{}/resolve/main/{}",
            config.model.repo, file.remote_path
        );
        tracing::info!("Downloading {}...", file.label);
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        let expected = config.model.checksums.get(file.local_name);
        download_file(client, &url, &dest, expected.map(String::as_str)).await?;

        let file_size = std::fs::metadata(&dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB)",
            file.label,
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(())
}

/// Download a file from a URL to a local path, streaming to disk.
///
/// Writes to a `.part` file first so an interrupted download never looks
/// installed. If `expected_blake3` is provided, the file is verified before
/// it is moved into place.
async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    expected_blake3: Option<&str>,
) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let progress = create_progress_bar(response.content_length());
    let partial = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        progress.inc(chunk.len() as u64);
    }

    file.flush().await?;
    progress.finish_and_clear();

    if let Some(expected) = expected_blake3 {
        verify_blake3(&partial, expected)?;
    } else {
        tracing::debug!("  No checksum configured for {:?}; skipping verification", dest);
    }

    tokio::fs::rename(&partial, dest).await?;
    Ok(())
}

/// Byte-level progress bar; a spinner when the size is unknown.
fn create_progress_bar(total: Option<u64>) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%)",
            ) {
                pb.set_style(style.progress_chars("##-"));
            }
            pb
        }
        None => ProgressBar::new_spinner(),
    }
}

/// BLAKE3 hex digest of a file, streamed in 64KB chunks.
fn blake3_hex(path: &Path) -> std::io::Result<String> {
    let mut reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Verify a downloaded file's BLAKE3 checksum.
///
/// On mismatch, removes the corrupt file so the next run re-downloads.
fn verify_blake3(path: &Path, expected: &str) -> anyhow::Result<()> {
    let actual = blake3_hex(path)
        .map_err(|e| anyhow::anyhow!("Checksum computation failed for {}: {e}", path.display()))?;

    if !actual.eq_ignore_ascii_case(expected) {
        let _ = std::fs::remove_file(path);
        anyhow::bail!(
            "Checksum mismatch for {}:\n  expected: {}\n  actual:   {}\n\
             Corrupt file removed; try downloading again.",
            path.display(),
            expected,
            actual
        );
    }

    tracing::debug!("  Checksum verified: {}…", &actual[..16]);
    Ok(())
}
