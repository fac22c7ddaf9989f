//! Sub-configuration structs with defaults matching the hosted demo.

use crate::labels::LabelPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.zeroshot/models"),
        }
    }
}

/// Vision-language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Local model name; files live under `{model_dir}/{name}/`
    pub name: String,

    /// Hugging Face repository the ONNX exports are downloaded from
    pub repo: String,

    /// Side length of one square image patch in pixels
    pub patch_size: u32,

    /// Upper bound on image patches fed to the vision encoder
    pub max_num_patches: usize,

    /// Fixed token length labels are padded or truncated to
    pub max_text_length: usize,

    /// Learned temperature applied to image/text cosine similarity
    pub logit_scale: f32,

    /// Learned bias added after scaling
    pub logit_bias: f32,

    /// Expected BLAKE3 checksums keyed by local file name.
    /// Files without an entry are downloaded unverified.
    pub checksums: BTreeMap<String, String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "siglip2-so400m-patch16-naflex".to_string(),
            repo: "onnx-community/siglip2-so400m-patch16-naflex-ONNX".to_string(),
            patch_size: 16,
            max_num_patches: 256,
            max_text_length: 64,
            logit_scale: 117.33,
            logit_bias: -12.93,
            checksums: BTreeMap::new(),
        }
    }
}

/// Candidate label parsing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// What to do with segments that are empty after trimming
    pub empty_segments: LabelPolicy,
}

/// Resource limits to protect against problematic uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_upload_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 20,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Debug mode: verbose logs and error details in responses
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
            debug: false,
        }
    }
}

/// Web page presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Page title
    pub title: String,

    /// Text shown under the title
    pub description: String,

    /// HTML footer with reference links
    pub article: String,

    /// Number of ranked labels shown in the result panel
    pub num_top_classes: usize,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            title: "Zero Shot Image Classification".to_string(),
            description: "Classify image using zero-shot classification with SigLIP 2 model! \
                          Provide an image input and a list of candidate labels separated by \
                          commas. Read more at the links below."
                .to_string(),
            article: "<p style='text-align: center'>\
                      <a href='https://arxiv.org/abs/2502.14786' target='_blank'>SigLIP 2: \
                      Multilingual Vision-Language Encoders with Improved Semantic \
                      Understanding, Localization, and Dense Features</a> | \
                      <a href='https://huggingface.co/google/siglip2-so400m-patch16-naflex' \
                      target='_blank'>Model Page</a></p>"
                .to_string(),
            num_top_classes: 3,
        }
    }
}

/// When example results are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Compute on first request, reuse afterwards
    #[default]
    Lazy,
    /// Recompute on every request
    Off,
}

/// Example gallery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Result caching mode
    pub cache: CacheMode,

    /// Example inputs shown under the form
    pub examples: Vec<ExampleConfig>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            cache: CacheMode::Lazy,
            examples: vec![
                ExampleConfig::new(
                    "images/baklava.png",
                    "dessert on a plate, a serving of baklava, a plate and spoon",
                ),
                ExampleConfig::new("images/beignets.png", "a dog, a cat, a donut, a beignet"),
                ExampleConfig::new(
                    "images/cat.png",
                    "two sleeping cats, two cats playing, three cats laying down",
                ),
            ],
        }
    }
}

/// One example input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleConfig {
    /// Image path; relative paths resolve against the config file's directory
    pub image: PathBuf,

    /// Comma-separated candidate labels
    pub labels: String,
}

impl ExampleConfig {
    pub fn new(image: impl Into<PathBuf>, labels: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            labels: labels.into(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
