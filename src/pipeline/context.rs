//! Owning coordinator for both pipelines
//!
//! The context is constructed once, initialised by loading or training, and
//! then shared by reference with the request layer. Each pipeline sits behind
//! its own `RwLock`: predictions take the read lock and may run
//! concurrently, while training and loading take the write lock.
//!
//! Pipeline state is only ever replaced whole, so a guard recovered from a
//! poisoned lock still holds either the previous or the new state.

use log::info;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::HealthInsightConfig;
use crate::error::{HealthInsightError, Result};
use crate::features::{FeatureSchema, HealthRecord, RawRecord};
use crate::models::{PredictionResult, RiskPredictionResult, RiskProfile, RiskTier};
use crate::pipeline::risk::{RiskPredictor, RiskTrainingReport};
use crate::pipeline::symptom::{SymptomClassifier, TextTrainingReport};

/// How [`PipelineContext::initialize`] obtains trained state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitStrategy {
    /// Load both artifacts; a missing artifact is an error
    LoadOnly,
    /// Train both pipelines on synthetic data and persist them
    TrainOnly,
    /// Load each artifact that exists, train and persist the others
    #[default]
    LoadOrTrain,
}

/// How one pipeline became ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Loaded,
    Trained,
}

/// Outcome of [`PipelineContext::initialize`] per pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitSummary {
    pub symptom: InitOutcome,
    pub risk: InitOutcome,
}

/// Load and default-train hooks shared by both pipelines
trait Lifecycle {
    const NAME: &'static str;

    fn load_from(&mut self, path: &Path) -> Result<()>;

    fn train_and_save(&mut self, path: &Path) -> Result<()>;
}

impl Lifecycle for SymptomClassifier {
    const NAME: &'static str = "symptom classifier";

    fn load_from(&mut self, path: &Path) -> Result<()> {
        self.load(path).map(|_| ())
    }

    fn train_and_save(&mut self, path: &Path) -> Result<()> {
        self.train_default()?;
        self.save(path).map(|_| ())
    }
}

impl Lifecycle for RiskPredictor {
    const NAME: &'static str = "risk predictor";

    fn load_from(&mut self, path: &Path) -> Result<()> {
        self.load(path).map(|_| ())
    }

    fn train_and_save(&mut self, path: &Path) -> Result<()> {
        self.train_default()?;
        self.save(path).map(|_| ())
    }
}

fn initialize_one<P: Lifecycle>(pipeline: &mut P, path: &Path, strategy: InitStrategy) -> Result<InitOutcome> {
    match strategy {
        InitStrategy::LoadOnly => pipeline.load_from(path).map(|()| InitOutcome::Loaded),
        InitStrategy::TrainOnly => pipeline.train_and_save(path).map(|()| InitOutcome::Trained),
        InitStrategy::LoadOrTrain => match pipeline.load_from(path) {
            Ok(()) => Ok(InitOutcome::Loaded),
            Err(HealthInsightError::ArtifactNotFound { .. }) => {
                info!("No {} artifact at {}; training a new one", P::NAME, path.display());
                pipeline.train_and_save(path).map(|()| InitOutcome::Trained)
            }
            Err(e) => Err(e),
        },
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the symptom classifier and the risk predictor
#[derive(Debug)]
pub struct PipelineContext {
    config: HealthInsightConfig,
    symptom: RwLock<SymptomClassifier>,
    risk: RwLock<RiskPredictor>,
}

impl PipelineContext {
    /// Context holding two untrained pipelines
    #[must_use]
    pub fn new(config: HealthInsightConfig) -> Self {
        let symptom = RwLock::new(Self::fresh_symptom(&config));
        let risk = RwLock::new(Self::fresh_risk(&config));
        Self {
            config,
            symptom,
            risk,
        }
    }

    fn fresh_symptom(config: &HealthInsightConfig) -> SymptomClassifier {
        SymptomClassifier::new(config.text.clone()).with_progress(config.show_progress)
    }

    fn fresh_risk(config: &HealthInsightConfig) -> RiskPredictor {
        RiskPredictor::new(config.risk.clone()).with_progress(config.show_progress)
    }

    #[must_use]
    pub const fn config(&self) -> &HealthInsightConfig {
        &self.config
    }

    /// Bring both pipelines into a trained state
    pub fn initialize(&self, strategy: InitStrategy) -> Result<InitSummary> {
        let symptom = initialize_one(
            &mut *write(&self.symptom),
            &self.config.artifacts.symptom_path(),
            strategy,
        )?;
        let risk = initialize_one(
            &mut *write(&self.risk),
            &self.config.artifacts.risk_path(),
            strategy,
        )?;
        info!("Pipelines ready: symptom {symptom:?}, risk {risk:?}");
        Ok(InitSummary { symptom, risk })
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        read(&self.symptom).is_trained() && read(&self.risk).is_trained()
    }

    /// Classify a free-text symptom description
    pub fn classify_symptoms(&self, text: &str) -> Result<PredictionResult> {
        read(&self.symptom).predict(text)
    }

    /// Learned tier plus rule scores for a request record
    pub fn assess_risk(&self, raw: &RawRecord) -> Result<RiskPredictionResult> {
        read(&self.risk).predict(raw)
    }

    /// Rule scores and recommendations alone; needs no trained state
    pub fn score_risk(&self, raw: &RawRecord) -> Result<(RiskProfile, Vec<String>)> {
        Ok(RiskPredictor::score_record(&HealthRecord::from_raw(raw)?))
    }

    /// Retrain the symptom classifier on supplied examples and persist it
    ///
    /// The served classifier is replaced only once the new artifact is on
    /// disk; a failed train or save leaves memory and disk unchanged.
    pub fn retrain_symptoms(&self, examples: &[(String, String)]) -> Result<TextTrainingReport> {
        let mut served = write(&self.symptom);
        let mut candidate = Self::fresh_symptom(&self.config);
        let report = candidate.train(examples)?;
        candidate.save(&self.config.artifacts.symptom_path())?;
        *served = candidate;
        Ok(report)
    }

    /// Retrain the risk predictor on supplied records and persist it
    ///
    /// Swapped in only after the save succeeds, as for the symptom classifier.
    pub fn retrain_risk(&self, records: &[HealthRecord], tiers: &[RiskTier]) -> Result<RiskTrainingReport> {
        let mut served = write(&self.risk);
        let mut candidate = Self::fresh_risk(&self.config);
        let report = candidate.train(records, tiers)?;
        candidate.save(&self.config.artifacts.risk_path())?;
        *served = candidate;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RiskPipelineConfig, TextPipelineConfig};
    use crate::error::PipelineKind;

    fn small_config(model_dir: &Path) -> HealthInsightConfig {
        let mut config = HealthInsightConfig {
            text: TextPipelineConfig {
                n_estimators: 10,
                ..TextPipelineConfig::default()
            },
            risk: RiskPipelineConfig {
                n_stages: 5,
                max_depth: 3,
                ..RiskPipelineConfig::default()
            },
            show_progress: false,
            ..HealthInsightConfig::default()
        };
        config.artifacts.model_dir = model_dir.to_path_buf();
        config
    }

    #[test]
    fn test_uninitialised_context_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let context = PipelineContext::new(small_config(dir.path()));
        assert!(!context.is_ready());

        let err = context.classify_symptoms("cough").unwrap_err();
        assert!(matches!(
            err,
            HealthInsightError::NotTrained {
                pipeline: PipelineKind::Symptom
            }
        ));
        let err = context.assess_risk(&RawRecord::new()).unwrap_err();
        assert!(matches!(
            err,
            HealthInsightError::NotTrained {
                pipeline: PipelineKind::Risk
            }
        ));

        let (scores, recommendations) = context
            .score_risk(&RawRecord::new().with("sleep_hours", 4))
            .unwrap();
        assert!(scores.iter().all(|(_, s)| s == 0.0));
        assert_eq!(recommendations, vec!["Aim for 7-8 hours of sleep per night"]);
    }

    #[test]
    fn test_load_only_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let context = PipelineContext::new(small_config(dir.path()));
        let err = context.initialize(InitStrategy::LoadOnly).unwrap_err();
        assert!(matches!(err, HealthInsightError::ArtifactNotFound { .. }));
        assert!(!context.is_ready());
    }

    #[test]
    fn test_load_or_train_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());

        let first = PipelineContext::new(config.clone());
        let summary = first.initialize(InitStrategy::LoadOrTrain).unwrap();
        assert_eq!(summary.symptom, InitOutcome::Trained);
        assert_eq!(summary.risk, InitOutcome::Trained);
        assert!(config.artifacts.symptom_path().is_file());
        assert!(config.artifacts.risk_path().is_file());

        let second = PipelineContext::new(config);
        let summary = second.initialize(InitStrategy::LoadOrTrain).unwrap();
        assert_eq!(summary.symptom, InitOutcome::Loaded);
        assert_eq!(summary.risk, InitOutcome::Loaded);

        let text = "Chest pain and shortness of breath";
        assert_eq!(
            first.classify_symptoms(text).unwrap(),
            second.classify_symptoms(text).unwrap()
        );
        let raw = RawRecord::new().with("age", 30).with("gender", "female");
        assert_eq!(first.assess_risk(&raw).unwrap(), second.assess_risk(&raw).unwrap());
    }

    fn block_model_dir(model_dir: &Path) {
        std::fs::remove_dir_all(model_dir).unwrap();
        std::fs::write(model_dir, b"not a directory").unwrap();
    }

    #[test]
    fn test_failed_retrain_save_keeps_served_models() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("models");
        let context = PipelineContext::new(small_config(&model_dir));
        context.initialize(InitStrategy::TrainOnly).unwrap();

        let text = "fever and cough";
        let symptom_before = context.classify_symptoms(text).unwrap();
        let raw = RawRecord::new().with("age", 62).with("bp_systolic", 150);
        let risk_before = context.assess_risk(&raw).unwrap();

        block_model_dir(&model_dir);

        let examples = crate::pipeline::synthetic::symptom_corpus(5);
        let err = context.retrain_symptoms(&examples).unwrap_err();
        assert!(matches!(err, HealthInsightError::Io { .. }));
        assert_eq!(context.classify_symptoms(text).unwrap(), symptom_before);

        let (records, tiers) = crate::pipeline::synthetic::health_records(120, 7);
        let err = context.retrain_risk(&records, &tiers).unwrap_err();
        assert!(matches!(err, HealthInsightError::Io { .. }));
        assert_eq!(context.assess_risk(&raw).unwrap(), risk_before);
    }

    #[test]
    fn test_failed_retrain_on_fresh_context_stays_untrained() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let context = PipelineContext::new(small_config(&blocker.join("models")));

        let (records, tiers) = crate::pipeline::synthetic::health_records(120, 7);
        assert!(context.retrain_risk(&records, &tiers).is_err());
        assert!(matches!(
            context.assess_risk(&RawRecord::new()).unwrap_err(),
            HealthInsightError::NotTrained {
                pipeline: PipelineKind::Risk
            }
        ));
    }

    #[test]
    fn test_retrain_replaces_model_and_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let context = PipelineContext::new(config.clone());

        let (records, tiers) = crate::pipeline::synthetic::health_records(150, 3);
        let report = context.retrain_risk(&records, &tiers).unwrap();
        assert!(read(&context.risk).is_trained());

        let mut reloaded = RiskPredictor::new(config.risk.clone());
        reloaded.load(&config.artifacts.risk_path()).unwrap();
        assert_eq!(reloaded.feature_names(), Some(&report.feature_names[..]));
    }

    #[test]
    fn test_concurrent_inference() {
        let dir = tempfile::tempdir().unwrap();
        let context = PipelineContext::new(small_config(dir.path()));
        context.initialize(InitStrategy::TrainOnly).unwrap();

        let expected = context.classify_symptoms("fever and cough").unwrap();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| context.classify_symptoms("fever and cough").unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
