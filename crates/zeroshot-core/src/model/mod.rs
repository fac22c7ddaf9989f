//! The vision-language model capability.
//!
//! [`ZeroShotModel`] is the seam between request handling and inference:
//! given an image and ordered labels it returns one raw compatibility score
//! per label. [`SigLipModel`] implements it with SigLIP 2 NaFlex encoders
//! running locally via ONNX Runtime.
//!
//! # Usage
//!
//! ```rust,ignore
//! use zeroshot_core::model::{SigLipModel, ZeroShotModel};
//! use zeroshot_core::Config;
//!
//! let config = Config::default();
//! let model = SigLipModel::load(&config.model, &config.model_files_dir())?;
//! let logits = model.logits(&image, &["a dog".into(), "a cat".into()], 256)?;
//! ```

pub mod preprocess;
pub(crate) mod text;
pub(crate) mod vision;

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ort::session::Session;

use crate::config::ModelConfig;
use crate::error::ModelError;

use self::preprocess::preprocess;
use self::text::TextEncoder;
use self::vision::VisionEncoder;

/// Vision encoder ONNX filename.
pub const VISION_MODEL_FILENAME: &str = "vision_model.onnx";

/// Text encoder ONNX filename.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";

/// Tokenizer filename.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// All files a model directory must contain.
pub const MODEL_FILES: [&str; 3] = [VISION_MODEL_FILENAME, TEXT_MODEL_FILENAME, TOKENIZER_FILENAME];

/// Scores how well an image matches each of a set of text labels.
///
/// Implementations must be deterministic and return exactly one score per
/// label, in label order. Scores are raw logits; squashing happens in the
/// caller.
pub trait ZeroShotModel: Send + Sync {
    /// Raw compatibility scores for `labels` against `image`.
    ///
    /// `max_num_patches` bounds how many image patches the vision encoder
    /// processes.
    fn logits(
        &self,
        image: &DynamicImage,
        labels: &[String],
        max_num_patches: usize,
    ) -> Result<Vec<f32>, ModelError>;
}

/// SigLIP 2 image/text model.
pub struct SigLipModel {
    vision: VisionEncoder,
    text: TextEncoder,
    patch_size: u32,
    logit_scale: f32,
    logit_bias: f32,
}

impl SigLipModel {
    /// Load the encoders and tokenizer from `model_dir`.
    ///
    /// Expects `vision_model.onnx`, `text_model.onnx` and `tokenizer.json`.
    pub fn load(config: &ModelConfig, model_dir: &Path) -> Result<Self, ModelError> {
        if let Some(missing) = Self::missing_files(model_dir).into_iter().next() {
            return Err(ModelError::NotFound { path: missing });
        }

        tracing::info!("Loading SigLIP 2 model from {:?}", model_dir);
        let vision = VisionEncoder::load(&model_dir.join(VISION_MODEL_FILENAME))?;
        let text = TextEncoder::load(
            &model_dir.join(TEXT_MODEL_FILENAME),
            &model_dir.join(TOKENIZER_FILENAME),
            config.max_text_length,
        )?;
        tracing::info!("SigLIP 2 model loaded successfully");

        Ok(Self {
            vision,
            text,
            patch_size: config.patch_size,
            logit_scale: config.logit_scale,
            logit_bias: config.logit_bias,
        })
    }

    /// Model files not present in `model_dir`.
    pub fn missing_files(model_dir: &Path) -> Vec<PathBuf> {
        MODEL_FILES
            .iter()
            .map(|name| model_dir.join(name))
            .filter(|path| !path.exists())
            .collect()
    }

    /// Check whether all model files exist on disk.
    pub fn model_exists(model_dir: &Path) -> bool {
        Self::missing_files(model_dir).is_empty()
    }
}

impl ZeroShotModel for SigLipModel {
    fn logits(
        &self,
        image: &DynamicImage,
        labels: &[String],
        max_num_patches: usize,
    ) -> Result<Vec<f32>, ModelError> {
        let input = preprocess(image, self.patch_size, max_num_patches);
        tracing::debug!(
            "Preprocessed image into {}x{} patches (budget {})",
            input.spatial_shape.0,
            input.spatial_shape.1,
            max_num_patches
        );

        let image_embedding = self.vision.embed(&input)?;
        let text_embeddings = self.text.encode_batch(labels)?;

        text_embeddings
            .iter()
            .map(|text_embedding| {
                if text_embedding.len() != image_embedding.len() {
                    return Err(ModelError::Output(format!(
                        "Embedding dimension mismatch: image {} vs text {}",
                        image_embedding.len(),
                        text_embedding.len()
                    )));
                }
                Ok(scaled_logit(
                    crate::math::dot(&image_embedding, text_embedding),
                    self.logit_scale,
                    self.logit_bias,
                ))
            })
            .collect()
    }
}

/// SigLIP's learned affine map from cosine similarity to logit.
fn scaled_logit(cosine: f32, scale: f32, bias: f32) -> f32 {
    scale * cosine + bias
}

/// Build an ONNX session from a model file.
pub(crate) fn load_session(model_path: &Path) -> Result<Session, ModelError> {
    Session::builder()
        .map_err(|e| ModelError::Load {
            path: model_path.to_path_buf(),
            message: format!("Failed to create ONNX session builder: {e}"),
        })?
        .commit_from_file(model_path)
        .map_err(|e| ModelError::Load {
            path: model_path.to_path_buf(),
            message: format!("Failed to load ONNX model: {e}"),
        })
}
