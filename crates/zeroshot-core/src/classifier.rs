//! Request handling around the model capability.
//!
//! Turns a raw (image, label text) request into an ordered label → score
//! mapping: split and trim the labels, ask the model for one logit per label,
//! squash each logit independently with a sigmoid, and zip the results back
//! onto the labels by position.

use std::sync::Arc;

use image::DynamicImage;

use crate::config::Config;
use crate::error::{ClassifyCause, ClassifyError};
use crate::labels::{LabelPolicy, LabelSet};
use crate::math::sigmoid;
use crate::model::ZeroShotModel;
use crate::types::{Classification, ClassificationResult, InputWarning};

/// Zero-shot classifier over a shared, read-only model.
#[derive(Clone)]
pub struct Classifier {
    model: Arc<dyn ZeroShotModel>,
    max_num_patches: usize,
    policy: LabelPolicy,
}

impl Classifier {
    /// Create a classifier with an explicit patch budget and label policy.
    ///
    /// The budget is at least one patch.
    pub fn new(model: Arc<dyn ZeroShotModel>, max_num_patches: usize, policy: LabelPolicy) -> Self {
        Self {
            model,
            max_num_patches: max_num_patches.max(1),
            policy,
        }
    }

    /// Create a classifier using the patch budget and label policy from config.
    pub fn from_config(model: Arc<dyn ZeroShotModel>, config: &Config) -> Self {
        Self::new(
            model,
            config.model.max_num_patches,
            config.labels.empty_segments,
        )
    }

    pub fn max_num_patches(&self) -> usize {
        self.max_num_patches
    }

    pub fn policy(&self) -> LabelPolicy {
        self.policy
    }

    /// Classify `image` against comma-separated `candidate_labels`.
    ///
    /// Missing inputs produce warnings rather than aborting. A missing image
    /// still fails the call because the model has nothing to score; under
    /// [`LabelPolicy::DropEmpty`] an empty label set returns an empty result
    /// without invoking the model.
    pub fn classify(
        &self,
        image: Option<&DynamicImage>,
        candidate_labels: Option<&str>,
    ) -> Result<Classification, ClassifyError> {
        let mut warnings = Vec::new();
        if image.is_none() {
            warnings.push(InputWarning::MissingImage);
        }
        if candidate_labels.map_or(true, str::is_empty) {
            warnings.push(InputWarning::MissingLabels);
        }
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let labels = LabelSet::parse(candidate_labels.unwrap_or_default(), self.policy);
        if labels.has_empty() {
            tracing::debug!("Label set contains empty labels; passing them through");
        }

        tracing::info!("Attempting classification with {} labels", labels.len());

        let Some(image) = image else {
            return Err(ClassifyError::new(ClassifyCause::MissingImage).with_warnings(warnings));
        };

        if labels.is_empty() {
            tracing::info!("Classification completed successfully");
            return Ok(Classification {
                result: ClassificationResult::default(),
                warnings,
            });
        }

        let logits = self
            .model
            .logits(image, labels.as_slice(), self.max_num_patches)
            .map_err(|e| ClassifyError::new(e).with_warnings(warnings.clone()))?;

        if logits.len() != labels.len() {
            return Err(ClassifyError::new(ClassifyCause::ScoreCount {
                expected: labels.len(),
                got: logits.len(),
            })
            .with_warnings(warnings));
        }
        if let Some(index) = logits.iter().position(|logit| !logit.is_finite()) {
            return Err(ClassifyError::new(ClassifyCause::NonFiniteScore {
                index,
                label: labels.as_slice()[index].clone(),
            })
            .with_warnings(warnings));
        }

        let scores = logits.into_iter().map(sigmoid).collect();
        let result = ClassificationResult::from_parts(labels.into_vec(), scores);

        tracing::info!("Classification completed successfully");
        Ok(Classification { result, warnings })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ModelError;
    use image::RgbImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Deterministic stand-in: logit depends on the label text and image width.
    pub(crate) struct FakeModel {
        pub calls: AtomicUsize,
        pub seen_budget: Mutex<Option<usize>>,
    }

    impl FakeModel {
        pub(crate) fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen_budget: Mutex::new(None),
            }
        }
    }

    impl ZeroShotModel for FakeModel {
        fn logits(
            &self,
            image: &DynamicImage,
            labels: &[String],
            max_num_patches: usize,
        ) -> Result<Vec<f32>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_budget.lock().unwrap() = Some(max_num_patches);
            Ok(labels
                .iter()
                .map(|label| {
                    let text: u32 = label.bytes().map(u32::from).sum();
                    (text % 17) as f32 - 8.0 + image.width() as f32 * 1e-3
                })
                .collect())
        }
    }

    struct FailingModel;

    impl ZeroShotModel for FailingModel {
        fn logits(&self, _: &DynamicImage, _: &[String], _: usize) -> Result<Vec<f32>, ModelError> {
            Err(ModelError::Inference("out of memory".to_string()))
        }
    }

    struct ShortModel;

    impl ZeroShotModel for ShortModel {
        fn logits(
            &self,
            _: &DynamicImage,
            labels: &[String],
            _: usize,
        ) -> Result<Vec<f32>, ModelError> {
            Ok(vec![0.0; labels.len().saturating_sub(1)])
        }
    }

    /// Returns huge logits to exercise the squashing bounds.
    struct ExtremeModel;

    impl ZeroShotModel for ExtremeModel {
        fn logits(
            &self,
            _: &DynamicImage,
            labels: &[String],
            _: usize,
        ) -> Result<Vec<f32>, ModelError> {
            Ok(labels
                .iter()
                .enumerate()
                .map(|(i, _)| if i % 2 == 0 { 1e6 } else { -1e6 })
                .collect())
        }
    }

    /// Returns NaN for the second label.
    struct NanModel;

    impl ZeroShotModel for NanModel {
        fn logits(
            &self,
            _: &DynamicImage,
            labels: &[String],
            _: usize,
        ) -> Result<Vec<f32>, ModelError> {
            Ok(labels
                .iter()
                .enumerate()
                .map(|(i, _)| if i == 1 { f32::NAN } else { 1.0 })
                .collect())
        }
    }

    pub(crate) fn image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(64, 48))
    }

    fn classifier(model: Arc<dyn ZeroShotModel>, policy: LabelPolicy) -> Classifier {
        Classifier::new(model, 256, policy)
    }

    #[test]
    fn test_dog_and_cat_labels() {
        let c = classifier(Arc::new(FakeModel::new()), LabelPolicy::Preserve);
        let out = c.classify(Some(&image()), Some("a dog, a cat")).unwrap();

        assert!(out.warnings.is_empty());
        assert_eq!(out.result.labels().collect::<Vec<_>>(), ["a dog", "a cat"]);
        for entry in out.result.entries() {
            assert!((0.0..=1.0).contains(&entry.confidence));
        }
    }

    #[test]
    fn test_result_order_and_length_follow_input() {
        let c = classifier(Arc::new(FakeModel::new()), LabelPolicy::Preserve);
        let text = "zebra , apple,apple, ,  mango tree ,x";
        let out = c.classify(Some(&image()), Some(text)).unwrap();

        let expected: Vec<&str> = text.split(',').map(str::trim).collect();
        assert_eq!(out.result.len(), text.matches(',').count() + 1);
        assert_eq!(out.result.labels().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_scores_stay_in_unit_range_for_extreme_logits() {
        let c = classifier(Arc::new(ExtremeModel), LabelPolicy::Preserve);
        let out = c.classify(Some(&image()), Some("a,b,c,d")).unwrap();
        for entry in out.result.entries() {
            assert!((0.0..=1.0).contains(&entry.confidence));
        }
        assert!(out.result.get("a").unwrap() > 0.99);
        assert!(out.result.get("b").unwrap() < 0.01);
    }

    #[test]
    fn test_scores_are_independent_not_softmax() {
        let c = classifier(Arc::new(ExtremeModel), LabelPolicy::Preserve);
        let out = c.classify(Some(&image()), Some("a,b,c")).unwrap();
        let total: f32 = out.result.entries().iter().map(|e| e.confidence).sum();
        assert!(total > 1.5);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let c = classifier(Arc::new(FakeModel::new()), LabelPolicy::Preserve);
        let img = image();
        let first = c.classify(Some(&img), Some("sushi, pizza, ramen")).unwrap();
        let second = c.classify(Some(&img), Some("sushi, pizza, ramen")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_patch_budget_is_forwarded() {
        let model = Arc::new(FakeModel::new());
        let c = Classifier::new(model.clone(), 64, LabelPolicy::Preserve);
        c.classify(Some(&image()), Some("a")).unwrap();
        assert_eq!(*model.seen_budget.lock().unwrap(), Some(64));
    }

    #[test]
    fn test_empty_labels_preserved_as_single_empty_entry() {
        let model = Arc::new(FakeModel::new());
        let c = classifier(model.clone(), LabelPolicy::Preserve);
        let out = c.classify(Some(&image()), Some("")).unwrap();

        assert_eq!(out.warnings, vec![InputWarning::MissingLabels]);
        assert_eq!(out.result.len(), 1);
        assert_eq!(out.result.entries()[0].label, "");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_labels_dropped_to_empty_result() {
        let model = Arc::new(FakeModel::new());
        let c = classifier(model.clone(), LabelPolicy::DropEmpty);
        let out = c.classify(Some(&image()), Some("")).unwrap();

        assert_eq!(out.warnings, vec![InputWarning::MissingLabels]);
        assert!(out.result.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_absent_labels_warn_like_empty_labels() {
        let c = classifier(Arc::new(FakeModel::new()), LabelPolicy::Preserve);
        let out = c.classify(Some(&image()), None).unwrap();
        assert_eq!(out.warnings, vec![InputWarning::MissingLabels]);
        assert_eq!(out.result.labels().collect::<Vec<_>>(), [""]);
    }

    #[test]
    fn test_drop_empty_keeps_real_labels() {
        let c = classifier(Arc::new(FakeModel::new()), LabelPolicy::DropEmpty);
        let out = c.classify(Some(&image()), Some("a,, b ,")).unwrap();
        assert_eq!(out.result.labels().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_missing_image_fails_deterministically() {
        let model = Arc::new(FakeModel::new());
        let c = classifier(model.clone(), LabelPolicy::Preserve);

        let err = c.classify(None, Some("a dog, a cat")).unwrap_err();
        assert!(matches!(err.cause(), ClassifyCause::MissingImage));
        assert!(err.is_input_error());
        assert!(err.location().file().ends_with("classifier.rs"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        let again = c.classify(None, Some("a dog, a cat")).unwrap_err();
        assert_eq!(err.to_string(), again.to_string());
    }

    #[test]
    fn test_missing_image_fails_even_with_no_labels() {
        let c = classifier(Arc::new(FakeModel::new()), LabelPolicy::DropEmpty);
        let err = c.classify(None, None).unwrap_err();
        assert!(matches!(err.cause(), ClassifyCause::MissingImage));
        assert_eq!(
            err.warnings(),
            [InputWarning::MissingImage, InputWarning::MissingLabels]
        );
    }

    #[test]
    fn test_missing_image_warning_reaches_caller() {
        let c = classifier(Arc::new(FakeModel::new()), LabelPolicy::Preserve);
        let err = c.classify(None, Some("a dog, a cat")).unwrap_err();
        assert_eq!(err.warnings(), [InputWarning::MissingImage]);
    }

    #[test]
    fn test_non_finite_logit_fails_whole_call() {
        let c = classifier(Arc::new(NanModel), LabelPolicy::Preserve);
        let err = c.classify(Some(&image()), Some("a, b, c")).unwrap_err();
        match err.cause() {
            ClassifyCause::NonFiniteScore { index, label } => {
                assert_eq!(*index, 1);
                assert_eq!(label, "b");
            }
            other => panic!("unexpected cause: {other}"),
        }
        assert!(!err.is_input_error());
        assert!(err.warnings().is_empty());
    }

    #[test]
    fn test_zero_patch_budget_is_clamped() {
        let model = Arc::new(FakeModel::new());
        let c = Classifier::new(model.clone(), 0, LabelPolicy::Preserve);
        assert_eq!(c.max_num_patches(), 1);
        c.classify(Some(&image()), Some("a")).unwrap();
        assert_eq!(*model.seen_budget.lock().unwrap(), Some(1));
    }

    #[test]
    fn test_model_failure_is_wrapped_with_cause() {
        let c = classifier(Arc::new(FailingModel), LabelPolicy::Preserve);
        let err = c.classify(Some(&image()), Some("a")).unwrap_err();

        assert!(matches!(
            err.cause(),
            ClassifyCause::Model(ModelError::Inference(_))
        ));
        assert!(err.to_string().contains("out of memory"));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_score_count_mismatch_fails_whole_call() {
        let c = classifier(Arc::new(ShortModel), LabelPolicy::Preserve);
        let err = c.classify(Some(&image()), Some("a, b, c")).unwrap_err();
        assert!(matches!(
            err.cause(),
            ClassifyCause::ScoreCount {
                expected: 3,
                got: 2
            }
        ));
    }

    #[test]
    fn test_from_config_uses_model_settings() {
        let mut config = Config::default();
        config.model.max_num_patches = 128;
        config.labels.empty_segments = LabelPolicy::DropEmpty;
        let c = Classifier::from_config(Arc::new(FakeModel::new()), &config);
        assert_eq!(c.max_num_patches(), 128);
        assert_eq!(c.policy(), LabelPolicy::DropEmpty);
    }
}
