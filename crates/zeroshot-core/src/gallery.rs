//! Example inputs shown under the form, with lazily cached results.
//!
//! Each example's classification is computed on first request and reused
//! afterwards. A failed computation is not cached, so fixing a missing image
//! on disk takes effect without a restart.

use std::path::PathBuf;

use tokio::sync::OnceCell;

use crate::classifier::Classifier;
use crate::config::{CacheMode, Config};
use crate::decode::ImageDecoder;
use crate::error::ZeroShotError;
use crate::types::Classification;

/// One example input.
#[derive(Debug, Clone)]
pub struct Example {
    /// Position in the gallery
    pub index: usize,
    /// Resolved image path
    pub image_path: PathBuf,
    /// Comma-separated candidate labels
    pub labels: String,
}

/// The example gallery.
pub struct Gallery {
    examples: Vec<Example>,
    cache: CacheMode,
    results: Vec<OnceCell<Classification>>,
}

impl Gallery {
    /// Build a gallery from resolved examples.
    pub fn new(examples: Vec<Example>, cache: CacheMode) -> Self {
        let results = examples.iter().map(|_| OnceCell::new()).collect();
        Self {
            examples,
            cache,
            results,
        }
    }

    /// Build the gallery from `[gallery]` config, resolving image paths.
    ///
    /// Examples whose image is missing are kept; requesting them reports the
    /// decode error.
    pub fn from_config(config: &Config) -> Self {
        let examples = config
            .gallery
            .examples
            .iter()
            .enumerate()
            .map(|(index, example)| {
                let image_path = config.resolve_example_path(&example.image);
                if !image_path.exists() {
                    tracing::warn!("Example image not found: {:?}", image_path);
                }
                Example {
                    index,
                    image_path,
                    labels: example.labels.clone(),
                }
            })
            .collect();
        Self::new(examples, config.gallery.cache)
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn get(&self, index: usize) -> Option<&Example> {
        self.examples.get(index)
    }

    /// Classification for example `index`, or `None` if there is no such
    /// example.
    pub async fn classify(
        &self,
        index: usize,
        classifier: &Classifier,
        decoder: &ImageDecoder,
    ) -> Result<Option<Classification>, ZeroShotError> {
        let (Some(example), Some(cell)) = (self.examples.get(index), self.results.get(index))
        else {
            return Ok(None);
        };

        let classification = match self.cache {
            CacheMode::Lazy => cell
                .get_or_try_init(|| compute(example, classifier, decoder))
                .await?
                .clone(),
            CacheMode::Off => compute(example, classifier, decoder).await?,
        };
        Ok(Some(classification))
    }
}

async fn compute(
    example: &Example,
    classifier: &Classifier,
    decoder: &ImageDecoder,
) -> Result<Classification, ZeroShotError> {
    tracing::debug!("Computing example {} from {:?}", example.index, example.image_path);
    let decoded = decoder.decode_file(&example.image_path).await?;

    let classifier = classifier.clone();
    let labels = example.labels.clone();
    let classification = tokio::task::spawn_blocking(move || {
        classifier.classify(Some(&decoded.image), Some(&labels))
    })
    .await
    .map_err(|e| ZeroShotError::Task(e.to_string()))??;

    Ok(classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::FakeModel;
    use crate::config::LimitsConfig;
    use crate::decode::tests::png_bytes;
    use crate::labels::LabelPolicy;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn setup(cache: CacheMode) -> (tempfile::TempDir, Gallery, Arc<FakeModel>, Classifier) {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("donut.png");
        std::fs::write(&image_path, png_bytes(24, 24)).unwrap();

        let gallery = Gallery::new(
            vec![
                Example {
                    index: 0,
                    image_path,
                    labels: "a dog, a donut".to_string(),
                },
                Example {
                    index: 1,
                    image_path: dir.path().join("missing.png"),
                    labels: "a cat".to_string(),
                },
            ],
            cache,
        );
        let model = Arc::new(FakeModel::new());
        let classifier = Classifier::new(model.clone(), 256, LabelPolicy::Preserve);
        (dir, gallery, model, classifier)
    }

    fn decoder() -> ImageDecoder {
        ImageDecoder::new(LimitsConfig::default())
    }

    #[tokio::test]
    async fn test_lazy_cache_computes_once() {
        let (_dir, gallery, model, classifier) = setup(CacheMode::Lazy);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        let first = gallery.classify(0, &classifier, &decoder()).await.unwrap();
        let second = gallery.classify(0, &classifier, &decoder()).await.unwrap();

        assert_eq!(first, second);
        let result = first.unwrap().result;
        assert_eq!(result.labels().collect::<Vec<_>>(), ["a dog", "a donut"]);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_off_recomputes() {
        let (_dir, gallery, model, classifier) = setup(CacheMode::Off);
        gallery.classify(0, &classifier, &decoder()).await.unwrap();
        gallery.classify(0, &classifier, &decoder()).await.unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_index_is_none() {
        let (_dir, gallery, _model, classifier) = setup(CacheMode::Lazy);
        assert!(gallery
            .classify(9, &classifier, &decoder())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let (dir, gallery, model, classifier) = setup(CacheMode::Lazy);

        let err = gallery.classify(1, &classifier, &decoder()).await;
        assert!(matches!(err, Err(ZeroShotError::Decode(_))));

        std::fs::write(dir.path().join("missing.png"), png_bytes(8, 8)).unwrap();
        let ok = gallery.classify(1, &classifier, &decoder()).await.unwrap();
        assert!(ok.is_some());
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[gallery]\ncache = \"off\"\n\n[[gallery.examples]]\nimage = \"pics/a.png\"\nlabels = \"x, y\"\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();

        let gallery = Gallery::from_config(&config);
        assert_eq!(gallery.examples().len(), 1);
        let example = gallery.get(0).unwrap();
        assert_eq!(example.image_path, dir.path().join("pics/a.png"));
        assert_eq!(example.labels, "x, y");
        assert_eq!(gallery.cache, CacheMode::Off);
    }
}
