//! Symptom text to condition classifier
//!
//! Training normalises every text, fits the TF-IDF vocabulary, encodes the
//! condition labels and grows a class-balanced random forest. The classifier
//! holds either no learned state at all or the complete bundle, which is
//! also the unit persisted by the artifact store.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use crate::artifact::{ArtifactInfo, ArtifactPayload, ModelArtifactStore};
use crate::config::TextPipelineConfig;
use crate::error::{HealthInsightError, PipelineKind, Result};
use crate::ml::metrics::accuracy;
use crate::ml::{ForestParams, LabelEncoder, RandomForestClassifier, argmax};
use crate::models::PredictionResult;
use crate::pipeline::synthetic;
use crate::text::extractor::split_phrases;
use crate::text::{
    CategoryTable, NormalizerMode, SymptomCategorizer, TextNormalizer, TfidfVectorizer,
    VectorizerSettings,
};

/// Summary of a completed training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextTrainingReport {
    pub samples: usize,
    pub classes: Vec<String>,
    pub vocabulary_size: usize,
    /// Accuracy on the training texts themselves
    pub training_accuracy: f64,
}

/// Complete learned state of the text pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedTextModel {
    normalizer: NormalizerMode,
    vectorizer: TfidfVectorizer,
    forest: RandomForestClassifier,
    labels: LabelEncoder,
    categories: CategoryTable,
}

impl ArtifactPayload for TrainedTextModel {
    const KIND: &'static str = "symptom_classifier";

    fn check_consistency(&self) -> std::result::Result<(), String> {
        self.vectorizer.check_consistency()?;
        self.forest.check_consistency()?;
        if self.forest.n_features() != self.vectorizer.vocabulary_size() {
            return Err(format!(
                "forest expects {} features but the vocabulary has {} terms",
                self.forest.n_features(),
                self.vectorizer.vocabulary_size()
            ));
        }
        if self.forest.n_classes() != self.labels.len() || self.labels.len() < 2 {
            return Err(format!(
                "forest predicts {} classes but {} labels are encoded",
                self.forest.n_classes(),
                self.labels.len()
            ));
        }
        self.categories.validate().map_err(|e| e.to_string())
    }
}

impl TrainedTextModel {
    fn normalizer(&self) -> TextNormalizer {
        TextNormalizer::from_mode(self.normalizer)
    }
}

/// Text pipeline: untrained until `train*` or `load` succeeds
#[derive(Debug, Clone)]
pub struct SymptomClassifier {
    config: TextPipelineConfig,
    show_progress: bool,
    model: Option<TrainedTextModel>,
}

impl Default for SymptomClassifier {
    fn default() -> Self {
        Self::new(TextPipelineConfig::default())
    }
}

impl SymptomClassifier {
    /// Untrained classifier
    #[must_use]
    pub const fn new(config: TextPipelineConfig) -> Self {
        Self {
            config,
            show_progress: false,
            model: None,
        }
    }

    /// Draw a progress bar while growing the forest
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    #[must_use]
    pub const fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Condition labels of the trained model
    #[must_use]
    pub fn labels(&self) -> Option<&[String]> {
        self.model.as_ref().map(|m| m.labels.classes())
    }

    fn trained(&self) -> Result<&TrainedTextModel> {
        self.model.as_ref().ok_or(HealthInsightError::NotTrained {
            pipeline: PipelineKind::Symptom,
        })
    }

    /// Train on `(text, condition)` pairs
    ///
    /// On failure any previously trained state is kept untouched.
    pub fn train(&mut self, examples: &[(String, String)]) -> Result<TextTrainingReport> {
        let start = Instant::now();
        let label_names: Vec<&str> = examples.iter().map(|(_, label)| label.as_str()).collect();
        let labels = LabelEncoder::fit(&label_names);
        if labels.len() < 2 {
            return Err(HealthInsightError::insufficient_data(format!(
                "symptom training needs at least 2 distinct conditions, got {}",
                labels.len()
            )));
        }
        info!(
            "Training symptom classifier on {} examples across {} conditions",
            examples.len(),
            labels.len()
        );

        let categories = match &self.config.category_table {
            Some(path) => CategoryTable::from_file(path)?,
            None => CategoryTable::builtin(),
        };
        let normalizer = if self.config.use_lemmatizer {
            TextNormalizer::lemmatized()
        } else {
            TextNormalizer::basic()
        };

        let documents: Vec<String> = examples
            .iter()
            .map(|(text, _)| normalizer.normalize(text))
            .collect();
        let encoded = labels.transform(&label_names)?;

        let vectorizer = TfidfVectorizer::fit(VectorizerSettings::from(&self.config), &documents)?;
        let rows = vectorizer.transform_all(&documents);

        let params = ForestParams {
            n_estimators: self.config.n_estimators,
            random_seed: self.config.random_seed,
            show_progress: self.show_progress,
            ..ForestParams::default()
        };
        let forest = RandomForestClassifier::fit(&rows, &encoded, labels.len(), &params)?;

        let predicted: Vec<usize> = rows.iter().map(|row| forest.predict(row)).collect();
        let report = TextTrainingReport {
            samples: examples.len(),
            classes: labels.classes().to_vec(),
            vocabulary_size: vectorizer.vocabulary_size(),
            // at least two labels were encoded, so the set is never empty
            training_accuracy: accuracy(&encoded, &predicted).unwrap_or_default(),
        };

        self.model = Some(TrainedTextModel {
            normalizer: normalizer.mode(),
            vectorizer,
            forest,
            labels,
            categories,
        });

        info!(
            "Symptom classifier trained in {:?}: {} terms, training accuracy {:.3}",
            start.elapsed(),
            report.vocabulary_size,
            report.training_accuracy
        );
        Ok(report)
    }

    /// Train on the seeded synthetic symptom corpus
    pub fn train_default(&mut self) -> Result<TextTrainingReport> {
        self.train(&synthetic::symptom_corpus(self.config.random_seed))
    }

    /// Predict a condition and break the text into categorised symptoms
    pub fn predict(&self, text: &str) -> Result<PredictionResult> {
        let model = self.trained()?;

        let normalized = model.normalizer().normalize(text);
        let probabilities = model.forest.predict_proba(&model.vectorizer.transform(&normalized));
        let best = argmax(&probabilities);

        let classes = model.labels.classes();
        let symptoms_extracted = split_phrases(&normalized);
        let symptoms_categorized =
            SymptomCategorizer::new(model.categories.clone()).categorize(&symptoms_extracted);

        Ok(PredictionResult {
            predicted_condition: classes[best].clone(),
            confidence: probabilities[best],
            symptoms_extracted,
            symptoms_categorized,
            all_probabilities: classes
                .iter()
                .cloned()
                .zip(probabilities.iter().copied())
                .collect::<BTreeMap<_, _>>(),
        })
    }

    /// Persist the trained bundle
    pub fn save(&self, path: &Path) -> Result<usize> {
        ModelArtifactStore.save(self.trained()?, path)
    }

    /// Replace the current state with a persisted bundle
    ///
    /// A failed load leaves the current state untouched.
    pub fn load(&mut self, path: &Path) -> Result<ArtifactInfo> {
        let (model, info) = ModelArtifactStore.load::<TrainedTextModel>(path)?;
        info!(
            "Loaded symptom classifier ({} conditions, created {})",
            model.labels.len(),
            info.created_at
        );
        self.model = Some(model);
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TextPipelineConfig {
        TextPipelineConfig {
            n_estimators: 15,
            ..TextPipelineConfig::default()
        }
    }

    fn examples(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(text, label)| ((*text).to_string(), (*label).to_string()))
            .collect()
    }

    #[test]
    fn test_predict_before_training_fails_closed() {
        let classifier = SymptomClassifier::default();
        assert!(!classifier.is_trained());
        let err = classifier.predict("cough").unwrap_err();
        assert!(matches!(
            err,
            HealthInsightError::NotTrained {
                pipeline: PipelineKind::Symptom
            }
        ));

        let dir = tempfile::tempdir().unwrap();
        let err = classifier.save(&dir.path().join("model.json")).unwrap_err();
        assert!(matches!(err, HealthInsightError::NotTrained { .. }));
        assert!(!dir.path().join("model.json").exists());
    }

    #[test]
    fn test_single_label_is_insufficient() {
        let mut classifier = SymptomClassifier::new(small_config());
        let err = classifier
            .train(&examples(&[("cough and fever", "flu"), ("fever and chills", "flu")]))
            .unwrap_err();
        assert!(matches!(err, HealthInsightError::InsufficientData { .. }));
        assert!(!classifier.is_trained());
    }

    #[test]
    fn test_train_and_predict_synthetic() {
        let mut classifier = SymptomClassifier::new(small_config());
        let report = classifier.train_default().unwrap();
        assert_eq!(report.samples, 500);
        assert_eq!(report.classes.len(), 10);
        assert!(report.vocabulary_size > 0);
        assert!(report.training_accuracy > 0.5);

        let result = classifier.predict("I have a severe headache and nausea").unwrap();
        let total: f64 = result.all_probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert_eq!(result.all_probabilities.len(), 10);
        assert_eq!(
            result.confidence,
            result.all_probabilities.values().copied().fold(0.0, f64::max)
        );
        assert_eq!(result.symptoms_extracted, vec!["i have a severe headache", "nausea"]);
        assert_eq!(
            result.symptoms_categorized.get("neurological"),
            Some(&["i have a severe headache".to_string()][..])
        );
        assert_eq!(
            result.symptoms_categorized.get("gastrointestinal"),
            Some(&["nausea".to_string()][..])
        );
    }

    #[test]
    fn test_empty_text_still_predicts() {
        let mut classifier = SymptomClassifier::new(small_config());
        classifier.train_default().unwrap();

        let result = classifier.predict("").unwrap();
        assert!(result.symptoms_extracted.is_empty());
        assert!(result.symptoms_categorized.is_empty());
        let total: f64 = result.all_probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}
