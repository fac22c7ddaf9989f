//! Configuration management for zeroshot.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default` with the values the hosted
//! demo ships with.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Model settings
    pub model: ModelConfig,

    /// Label parsing settings
    pub labels: LabelsConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Page presentation settings
    pub interface: InterfaceConfig,

    /// Example gallery
    pub gallery: GalleryConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Directory of the file this config was loaded from, if any.
    #[serde(skip)]
    source_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.validate()?;
        config.source_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/rs.zeroshot.zeroshot/config.toml
    /// - Linux: ~/.config/zeroshot/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\zeroshot\config\config.toml
    ///
    /// Falls back to ~/.zeroshot/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("rs", "zeroshot", "zeroshot")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".zeroshot").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Directory holding the files of the configured model.
    pub fn model_files_dir(&self) -> PathBuf {
        self.model_dir().join(&self.model.name)
    }

    /// Resolve an example image path.
    ///
    /// Absolute and `~` paths are used as-is. Relative paths resolve against
    /// the directory of the loaded config file, or the working directory when
    /// running on defaults.
    pub fn resolve_example_path(&self, image: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&image.to_string_lossy()).into_owned());
        if expanded.is_absolute() {
            return expanded;
        }
        match &self.source_dir {
            Some(dir) => dir.join(expanded),
            None => expanded,
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelPolicy;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.max_num_patches, 256);
        assert_eq!(config.model.patch_size, 16);
        assert_eq!(config.interface.num_top_classes, 3);
        assert_eq!(config.server.port, 7860);
        assert!(!config.server.debug);
        assert_eq!(config.labels.empty_segments, LabelPolicy::Preserve);
        assert_eq!(config.gallery.examples.len(), 3);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[model]"));
        assert!(toml.contains("[[gallery.examples]]"));
    }

    #[test]
    fn test_load_from_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[model]\nmax_num_patches = 64\n\n[labels]\nempty_segments = \"drop_empty\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model.max_num_patches, 64);
        assert_eq!(config.model.max_text_length, 64);
        assert_eq!(config.labels.empty_segments, LabelPolicy::DropEmpty);
        assert_eq!(config.server.port, 7860);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[model]\nmax_num_patches = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("max_num_patches"));
    }

    #[test]
    fn test_load_from_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[model\nname = ").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_example_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load_from(&path).unwrap();
        let resolved = config.resolve_example_path(Path::new("images/cat.png"));
        assert_eq!(resolved, dir.path().join("images/cat.png"));

        let absolute = dir.path().join("elsewhere.png");
        assert_eq!(config.resolve_example_path(&absolute), absolute);
    }

    #[test]
    fn test_example_paths_relative_to_cwd_on_defaults() {
        let config = Config::default();
        let resolved = config.resolve_example_path(Path::new("images/cat.png"));
        assert_eq!(resolved, PathBuf::from("images/cat.png"));
    }
}
