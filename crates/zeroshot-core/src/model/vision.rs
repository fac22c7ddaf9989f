//! SigLIP 2 vision encoder session.
//!
//! Runs the NaFlex vision tower exported to ONNX and returns the pooled,
//! cross-modal image embedding.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::error::ModelError;

use super::preprocess::PatchInput;

/// Wraps an ONNX Runtime session for the vision encoder.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct VisionEncoder {
    session: Mutex<Session>,
}

impl VisionEncoder {
    /// Load the vision encoder from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, ModelError> {
        let session = super::load_session(model_path)?;

        tracing::debug!(
            "Loaded SigLIP 2 vision encoder from {:?} (inputs: {:?}, outputs: {:?})",
            model_path,
            session
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>(),
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Embed one preprocessed image.
    ///
    /// Returns the L2-normalized `pooler_output` vector.
    pub fn embed(&self, input: &PatchInput) -> Result<Vec<f32>, ModelError> {
        let pixel_shape: Vec<i64> = input.pixel_values.shape().iter().map(|&d| d as i64).collect();
        let pixel_data: Vec<f32> = input.pixel_values.iter().copied().collect();
        let mask_shape: Vec<i64> = input.attention_mask.shape().iter().map(|&d| d as i64).collect();
        let mask_data: Vec<i64> = input.attention_mask.iter().copied().collect();
        let (rows, cols) = input.spatial_shape;

        let pixel_values = Value::from_array((pixel_shape, pixel_data))
            .map_err(|e| ModelError::Inference(format!("Failed to create pixel tensor: {e}")))?;
        let attention_mask = Value::from_array((mask_shape, mask_data))
            .map_err(|e| ModelError::Inference(format!("Failed to create mask tensor: {e}")))?;
        let spatial_shapes = Value::from_array((vec![1i64, 2], vec![rows as i64, cols as i64]))
            .map_err(|e| {
                ModelError::Inference(format!("Failed to create spatial shape tensor: {e}"))
            })?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ModelError::Inference(format!("Vision session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![
                "pixel_values" => pixel_values,
                "pixel_attention_mask" => attention_mask,
                "spatial_shapes" => spatial_shapes,
            ])
            .map_err(|e| ModelError::Inference(format!("Vision encoder inference failed: {e}")))?;

        // pooler_output is the attention-pooled projection shared with the
        // text tower; last_hidden_state is per-patch and not comparable.
        let pooler_output = outputs
            .iter()
            .find(|(name, _)| *name == "pooler_output")
            .ok_or_else(|| {
                ModelError::Output("Vision encoder did not produce pooler_output".to_string())
            })?;

        let (shape, data) = pooler_output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Output(format!("Failed to extract pooler_output: {e}")))?;

        let mut embedding = match shape.len() {
            1 => data.to_vec(),
            2 => {
                let dim = shape[1] as usize;
                data[..dim].to_vec()
            }
            _ => {
                return Err(ModelError::Output(format!(
                    "Unexpected vision pooler_output shape: {:?}",
                    shape
                )));
            }
        };

        crate::math::l2_normalize_in_place(&mut embedding);
        Ok(embedding)
    }
}
