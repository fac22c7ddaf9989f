//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.name must not be empty".into(),
            ));
        }
        if self.model.patch_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.patch_size must be > 0".into(),
            ));
        }
        if self.model.max_num_patches == 0 {
            return Err(ConfigError::ValidationError(
                "model.max_num_patches must be > 0".into(),
            ));
        }
        if self.model.max_text_length == 0 {
            return Err(ConfigError::ValidationError(
                "model.max_text_length must be > 0".into(),
            ));
        }
        if !self.model.logit_scale.is_finite() || !self.model.logit_bias.is_finite() {
            return Err(ConfigError::ValidationError(
                "model.logit_scale and model.logit_bias must be finite".into(),
            ));
        }
        if self.limits.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.interface.num_top_classes == 0 {
            return Err(ConfigError::ValidationError(
                "interface.num_top_classes must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}
