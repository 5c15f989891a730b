//! Structured-feature risk predictor
//!
//! Training freezes the feature vocabulary, median imputer and standard
//! scaler, encodes the tiers, holds out a stratified validation split and
//! fits the boosted ensemble. Inference replays the frozen transforms and
//! pairs the learned tier with the rule-based category scores and their
//! recommendations. The two judgments are reported side by side and never
//! reconciled.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use crate::artifact::{ArtifactInfo, ArtifactPayload, ModelArtifactStore};
use crate::config::RiskPipelineConfig;
use crate::error::{HealthInsightError, PipelineKind, Result};
use crate::features::{FeaturePreparer, FeatureSchema, HealthRecord, RawRecord};
use crate::ml::metrics::{accuracy, roc_auc, stratified_split};
use crate::ml::{
    BoostingParams, GradientBoostingClassifier, LabelEncoder, MedianImputer, StandardScaler, argmax,
};
use crate::models::{RiskPredictionResult, RiskProfile, RiskTier};
use crate::pipeline::synthetic;
use crate::scoring::{RecommendationGenerator, RuleBasedRiskScorer};

/// Summary of a completed training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskTrainingReport {
    pub train_samples: usize,
    pub validation_samples: usize,
    /// `None` when the split held out no rows
    pub validation_accuracy: Option<f64>,
    /// High tier against the rest; `None` when the validation split cannot
    /// rank it
    pub high_risk_auc: Option<f64>,
    pub feature_names: Vec<String>,
}

/// Complete learned state of the risk pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedRiskModel {
    preparer: FeaturePreparer,
    imputer: MedianImputer,
    scaler: StandardScaler,
    labels: LabelEncoder,
    model: GradientBoostingClassifier,
}

impl ArtifactPayload for TrainedRiskModel {
    const KIND: &'static str = "risk_predictor";

    fn check_consistency(&self) -> std::result::Result<(), String> {
        self.preparer.check_consistency::<HealthRecord>()?;
        self.imputer.check_consistency()?;
        let width = self.preparer.feature_names().len();
        if self.imputer.feature_names() != self.preparer.feature_names() {
            return Err("imputer and preparer disagree on feature order".to_string());
        }
        self.scaler.check_consistency(width)?;
        self.model.check_consistency()?;
        if self.model.n_features() != width {
            return Err(format!(
                "model expects {} features, preparer yields {width}",
                self.model.n_features()
            ));
        }
        if self.model.n_classes() != self.labels.len() {
            return Err(format!(
                "model predicts {} classes but {} tiers are encoded",
                self.model.n_classes(),
                self.labels.len()
            ));
        }
        if let Some(bad) = self
            .labels
            .classes()
            .iter()
            .find(|class| class.parse::<RiskTier>().is_err())
        {
            return Err(format!("unknown risk tier {bad:?}"));
        }
        Ok(())
    }
}

impl TrainedRiskModel {
    /// Encoded classes as tiers, in encoding order
    fn tiers(&self) -> Vec<RiskTier> {
        self.labels
            .classes()
            .iter()
            .filter_map(|class| class.parse().ok())
            .collect()
    }

    fn scaled_row(&self, record: &HealthRecord) -> Result<Vec<f64>> {
        let vector = self.preparer.prepare(record)?;
        let imputed = self.imputer.transform(vector.names(), vector.values())?;
        Ok(self.scaler.transform(&imputed))
    }
}

/// Numeric pipeline: untrained until `train*` or `load` succeeds
#[derive(Debug, Clone)]
pub struct RiskPredictor {
    config: RiskPipelineConfig,
    show_progress: bool,
    model: Option<TrainedRiskModel>,
}

impl Default for RiskPredictor {
    fn default() -> Self {
        Self::new(RiskPipelineConfig::default())
    }
}

impl RiskPredictor {
    /// Untrained predictor
    #[must_use]
    pub const fn new(config: RiskPipelineConfig) -> Self {
        Self {
            config,
            show_progress: false,
            model: None,
        }
    }

    /// Draw a progress bar while boosting
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    #[must_use]
    pub const fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Training-time feature ordering
    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        self.model.as_ref().map(|m| m.preparer.feature_names())
    }

    fn trained(&self) -> Result<&TrainedRiskModel> {
        self.model.as_ref().ok_or(HealthInsightError::NotTrained {
            pipeline: PipelineKind::Risk,
        })
    }

    /// Train on records paired with their tier labels
    ///
    /// On failure any previously trained state is kept untouched.
    pub fn train(&mut self, records: &[HealthRecord], tiers: &[RiskTier]) -> Result<RiskTrainingReport> {
        let start = Instant::now();
        if records.len() != tiers.len() {
            return Err(HealthInsightError::insufficient_data(format!(
                "{} records but {} tier labels",
                records.len(),
                tiers.len()
            )));
        }

        let tier_names: Vec<&str> = tiers.iter().map(|tier| tier.as_str()).collect();
        let labels = LabelEncoder::fit(&tier_names);
        if labels.len() < 2 {
            return Err(HealthInsightError::insufficient_data(format!(
                "risk training needs at least 2 distinct tiers, got {}",
                labels.len()
            )));
        }
        let encoded = labels.transform(&tier_names)?;
        info!(
            "Training risk predictor on {} records across {} tiers",
            records.len(),
            labels.len()
        );

        let preparer = FeaturePreparer::fit(records)?;
        let prepared: Vec<Vec<Option<f64>>> = records
            .iter()
            .map(|record| preparer.prepare(record).map(|v| v.values().to_vec()))
            .collect::<Result<_>>()?;

        let imputer = MedianImputer::fit(preparer.feature_names(), &prepared)?;
        let imputed: Vec<Vec<f64>> = prepared
            .iter()
            .map(|row| imputer.transform(preparer.feature_names(), row))
            .collect::<Result<_>>()?;
        let scaler = StandardScaler::fit(&imputed)?;
        let scaled: Vec<Vec<f64>> = imputed.iter().map(|row| scaler.transform(row)).collect();

        let split = stratified_split(&encoded, self.config.validation_fraction, self.config.random_seed);
        let train_rows: Vec<Vec<f64>> = split.train.iter().map(|&i| scaled[i].clone()).collect();
        let train_labels: Vec<usize> = split.train.iter().map(|&i| encoded[i]).collect();

        let mut present = train_labels.clone();
        present.sort_unstable();
        present.dedup();
        if present.len() < 2 {
            return Err(HealthInsightError::insufficient_data(
                "fewer than 2 tiers remain in the training split",
            ));
        }

        let params = BoostingParams {
            n_stages: self.config.n_stages,
            max_depth: self.config.max_depth,
            learning_rate: self.config.learning_rate,
            show_progress: self.show_progress,
        };
        let model = GradientBoostingClassifier::fit(&train_rows, &train_labels, labels.len(), &params)?;

        let validation_labels: Vec<usize> = split.validation.iter().map(|&i| encoded[i]).collect();
        let validation_proba: Vec<Vec<f64>> = split
            .validation
            .iter()
            .map(|&i| model.predict_proba(&scaled[i]))
            .collect();
        let predicted: Vec<usize> = validation_proba.iter().map(|p| argmax(p)).collect();

        let high_risk_auc = labels.encode(RiskTier::High.as_str()).and_then(|high| {
            let scores: Vec<f64> = validation_proba.iter().map(|p| p[high]).collect();
            let positives: Vec<bool> = validation_labels.iter().map(|&l| l == high).collect();
            roc_auc(&scores, &positives)
        });

        if split.validation.is_empty() {
            warn!(
                "Validation split of {} records is empty; no validation metrics reported",
                records.len()
            );
        }

        let report = RiskTrainingReport {
            train_samples: split.train.len(),
            validation_samples: split.validation.len(),
            validation_accuracy: accuracy(&validation_labels, &predicted),
            high_risk_auc,
            feature_names: preparer.feature_names().to_vec(),
        };

        self.model = Some(TrainedRiskModel {
            preparer,
            imputer,
            scaler,
            labels,
            model,
        });

        let metric = |value: Option<f64>| value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"));
        info!(
            "Risk predictor trained in {:?}: validation accuracy {}, high-risk AUC {}",
            start.elapsed(),
            metric(report.validation_accuracy),
            metric(report.high_risk_auc)
        );
        Ok(report)
    }

    /// Train on the seeded synthetic health records
    pub fn train_default(&mut self) -> Result<RiskTrainingReport> {
        let (records, tiers) =
            synthetic::health_records(synthetic::DEFAULT_RECORD_COUNT, self.config.random_seed);
        self.train(&records, &tiers)
    }

    /// Predict from a loosely typed request record
    pub fn predict(&self, raw: &RawRecord) -> Result<RiskPredictionResult> {
        self.trained()?;
        self.predict_record(&HealthRecord::from_raw(raw)?)
    }

    /// Predict the tier and attach rule scores and recommendations
    pub fn predict_record(&self, record: &HealthRecord) -> Result<RiskPredictionResult> {
        let model = self.trained()?;

        let probabilities = model.model.predict_proba(&model.scaled_row(record)?);
        let best = argmax(&probabilities);
        let tiers = model.tiers();
        let (risk_scores, recommendations) = Self::score_record(record);

        Ok(RiskPredictionResult {
            overall_risk: tiers[best],
            confidence: probabilities[best],
            risk_scores,
            recommendations,
            all_probabilities: tiers
                .iter()
                .copied()
                .zip(probabilities.iter().copied())
                .collect::<BTreeMap<_, _>>(),
        })
    }

    /// Rule scores and recommendations alone; needs no trained state
    #[must_use]
    pub fn score_record(record: &HealthRecord) -> (RiskProfile, Vec<String>) {
        let scores = RuleBasedRiskScorer.score(record);
        let recommendations = RecommendationGenerator.generate(record, &scores);
        (scores, recommendations)
    }

    /// Persist the trained bundle
    pub fn save(&self, path: &Path) -> Result<usize> {
        ModelArtifactStore.save(self.trained()?, path)
    }

    /// Replace the current state with a persisted bundle
    ///
    /// A failed load leaves the current state untouched.
    pub fn load(&mut self, path: &Path) -> Result<ArtifactInfo> {
        let (model, info) = ModelArtifactStore.load::<TrainedRiskModel>(path)?;
        info!(
            "Loaded risk predictor ({} features, created {})",
            model.preparer.feature_names().len(),
            info.created_at
        );
        self.model = Some(model);
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> RiskPipelineConfig {
        RiskPipelineConfig {
            n_stages: 10,
            max_depth: 3,
            ..RiskPipelineConfig::default()
        }
    }

    fn trained_predictor() -> RiskPredictor {
        let (records, tiers) = synthetic::health_records(300, 42);
        let mut predictor = RiskPredictor::new(small_config());
        predictor.train(&records, &tiers).unwrap();
        predictor
    }

    #[test]
    fn test_predict_before_training_fails_closed() {
        let predictor = RiskPredictor::default();
        let err = predictor.predict(&RawRecord::new().with("age", 40)).unwrap_err();
        assert!(matches!(
            err,
            HealthInsightError::NotTrained {
                pipeline: PipelineKind::Risk
            }
        ));
        // Checked before coercion
        let err = predictor.predict(&RawRecord::new().with("age", "old")).unwrap_err();
        assert!(matches!(err, HealthInsightError::NotTrained { .. }));
    }

    #[test]
    fn test_single_tier_is_insufficient() {
        let (records, _) = synthetic::health_records(20, 1);
        let tiers = vec![RiskTier::Low; records.len()];
        let mut predictor = RiskPredictor::new(small_config());
        let err = predictor.train(&records, &tiers).unwrap_err();
        assert!(matches!(err, HealthInsightError::InsufficientData { .. }));
        assert!(!predictor.is_trained());
    }

    #[test]
    fn test_training_report() {
        let (records, tiers) = synthetic::health_records(300, 42);
        let mut predictor = RiskPredictor::new(small_config());
        let report = predictor.train(&records, &tiers).unwrap();

        assert_eq!(report.train_samples + report.validation_samples, 300);
        assert_eq!(report.feature_names.len(), 27);
        let validation = report.validation_accuracy.unwrap();
        assert!((0.0..=1.0).contains(&validation));
        if let Some(auc) = report.high_risk_auc {
            assert!((0.0..=1.0).contains(&auc));
        }
    }

    #[test]
    fn test_empty_validation_split_reports_no_metrics() {
        let (records, _) = synthetic::health_records(4, 42);
        let tiers = [RiskTier::Low, RiskTier::Low, RiskTier::High, RiskTier::High];
        let mut predictor = RiskPredictor::new(small_config());
        let report = predictor.train(&records, &tiers).unwrap();

        assert_eq!(report.train_samples, 4);
        assert_eq!(report.validation_samples, 0);
        assert_eq!(report.validation_accuracy, None);
        assert_eq!(report.high_risk_auc, None);
        assert!(predictor.is_trained());
    }

    #[test]
    fn test_prediction_pairs_tier_with_rule_scores() {
        let predictor = trained_predictor();
        let raw = RawRecord::new()
            .with("age", 55)
            .with("gender", "male")
            .with("bp_systolic", 150)
            .with("bp_diastolic", 95)
            .with("cholesterol", 250)
            .with("smoking", 1)
            .with("family_history_cvd", 1)
            .with("bmi", 20)
            .with("not_a_feature", 3);

        let result = predictor.predict(&raw).unwrap();
        let total: f64 = result.all_probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert_eq!(result.all_probabilities.len(), 3);
        assert_eq!(result.confidence, result.all_probabilities[&result.overall_risk]);
        assert_eq!(result.risk_scores.get(crate::models::RiskCategory::Cardiovascular), 1.0);
        assert_eq!(
            result.recommendations[0],
            "Consider cardiovascular screening with your doctor"
        );
    }

    #[test]
    fn test_malformed_record_is_rejected() {
        let predictor = trained_predictor();
        let raw = RawRecord::new().with("age", "fifty").with("bmi", 22);
        let err = predictor.predict(&raw).unwrap_err();
        assert!(matches!(err, HealthInsightError::MalformedFeature { .. }));
    }

    #[test]
    fn test_empty_record_predicts_from_medians() {
        let predictor = trained_predictor();
        let result = predictor.predict(&RawRecord::new()).unwrap();
        assert_eq!(result.recommendations, vec!["Continue maintaining healthy lifestyle habits"]);
        let total: f64 = result.all_probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}
