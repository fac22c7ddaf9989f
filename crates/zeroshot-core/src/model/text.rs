//! SigLIP 2 text encoder for candidate labels.
//!
//! Tokenizes labels to a fixed length and encodes them into the same space as
//! the vision encoder's pooled output.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::error::ModelError;

/// SigLIP 2 text encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the vision encoder.
pub struct TextEncoder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    max_length: usize,
    pad_id: i64,
}

impl TextEncoder {
    /// Load the text encoder and its tokenizer.
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        max_length: usize,
    ) -> Result<Self, ModelError> {
        let session = super::load_session(model_path)?;

        let tokenizer =
            tokenizers::Tokenizer::from_file(tokenizer_path).map_err(|e| ModelError::Load {
                path: tokenizer_path.to_path_buf(),
                message: format!("Failed to load tokenizer: {e}"),
            })?;
        let pad_id = tokenizer
            .get_padding()
            .map(|padding| i64::from(padding.pad_id))
            .unwrap_or(0);

        tracing::debug!(
            "Loaded SigLIP 2 text encoder from {:?} (max_length: {}, pad_id: {})",
            model_path,
            max_length,
            pad_id
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            max_length,
            pad_id,
        })
    }

    /// Encode labels into L2-normalized embeddings, one per label, in order.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let batch_size = texts.len();
        if batch_size == 0 {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ModelError::Tokenize(e.to_string()))?;

        // SigLIP text towers are trained on fixed-length, padded sequences
        // and take input_ids only (no attention_mask).
        let input_ids = pad_ids(
            encodings.iter().map(|encoding| encoding.get_ids()),
            batch_size,
            self.max_length,
            self.pad_id,
        );

        let input_ids_value =
            Value::from_array((vec![batch_size as i64, self.max_length as i64], input_ids))
                .map_err(|e| ModelError::Inference(format!("Failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ModelError::Inference(format!("Text session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs!["input_ids" => input_ids_value])
            .map_err(|e| ModelError::Inference(format!("Text encoder inference failed: {e}")))?;

        let pooler_output = outputs
            .iter()
            .find(|(name, _)| *name == "pooler_output")
            .ok_or_else(|| {
                ModelError::Output("Text encoder did not produce pooler_output".to_string())
            })?;

        let (shape, data) = pooler_output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Output(format!("Failed to extract pooler_output: {e}")))?;

        if shape.len() != 2 || shape[0] as usize != batch_size || shape[1] <= 0 {
            return Err(ModelError::Output(format!(
                "Unexpected text pooler_output shape {:?} for {} labels",
                shape, batch_size
            )));
        }
        let embedding_dim = shape[1] as usize;

        Ok(data
            .chunks(embedding_dim)
            .map(crate::math::l2_normalize)
            .collect())
    }
}

/// Lay token id sequences out as a `[batch, max_length]` row-major buffer,
/// truncating long sequences and padding short ones with `pad_id`.
fn pad_ids<'a>(
    sequences: impl Iterator<Item = &'a [u32]>,
    batch_size: usize,
    max_length: usize,
    pad_id: i64,
) -> Vec<i64> {
    let mut input_ids = vec![pad_id; batch_size * max_length];
    for (i, ids) in sequences.enumerate().take(batch_size) {
        for (j, &id) in ids.iter().take(max_length).enumerate() {
            input_ids[i * max_length + j] = i64::from(id);
        }
    }
    input_ids
}
