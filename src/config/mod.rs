//! Configuration for the symptom and risk pipelines.
//!
//! Every value has a default matching the reference training setup; a handful
//! can be overridden from the environment with [`HealthInsightConfig::from_env`].

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::error::{HealthInsightError, Result};

/// Environment variable overriding the artifact directory
pub const ENV_MODEL_DIR: &str = "HEALTH_INSIGHT_MODEL_DIR";
/// Environment variable overriding the default log filter
pub const ENV_LOG: &str = "HEALTH_INSIGHT_LOG";
/// Environment variable toggling progress bars
pub const ENV_PROGRESS: &str = "HEALTH_INSIGHT_PROGRESS";
/// Environment variable overriding every random seed
pub const ENV_SEED: &str = "HEALTH_INSIGHT_SEED";

/// Configuration for the symptom text pipeline
#[derive(Debug, Clone)]
pub struct TextPipelineConfig {
    /// Maximum number of terms kept in the vocabulary
    pub max_features: usize,
    /// Smallest and largest n-gram length
    pub ngram_range: (usize, usize),
    /// Minimum number of documents a term must occur in
    pub min_df: usize,
    /// Maximum fraction of documents a term may occur in
    pub max_df: f64,
    /// Drop English stop words before building n-grams
    pub remove_stop_words: bool,
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Seed for bootstrap sampling and feature selection
    pub random_seed: u64,
    /// Run the lemmatising backend during normalisation
    pub use_lemmatizer: bool,
    /// Optional JSON file replacing the built-in category table
    pub category_table: Option<PathBuf>,
}

impl Default for TextPipelineConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            ngram_range: (1, 2),
            min_df: 2,
            max_df: 0.8,
            remove_stop_words: true,
            n_estimators: 100,
            random_seed: 42,
            use_lemmatizer: false,
            category_table: None,
        }
    }
}

/// Configuration for the structured risk pipeline
#[derive(Debug, Clone)]
pub struct RiskPipelineConfig {
    /// Number of boosting stages
    pub n_stages: usize,
    /// Maximum depth of each regression tree
    pub max_depth: usize,
    /// Shrinkage applied to each stage
    pub learning_rate: f64,
    /// Fraction of records held out for validation
    pub validation_fraction: f64,
    /// Seed for the stratified split
    pub random_seed: u64,
}

impl Default for RiskPipelineConfig {
    fn default() -> Self {
        Self {
            n_stages: 100,
            max_depth: 6,
            learning_rate: 0.1,
            validation_fraction: 0.2,
            random_seed: 42,
        }
    }
}

/// Where trained artifacts live
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    /// Directory holding both artifacts
    pub model_dir: PathBuf,
    /// File name of the symptom classifier artifact
    pub symptom_file: String,
    /// File name of the risk predictor artifact
    pub risk_file: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./ml_models/cache"),
            symptom_file: "symptom_classifier.json".to_string(),
            risk_file: "risk_predictor.json".to_string(),
        }
    }
}

impl ArtifactConfig {
    /// Full path of the symptom classifier artifact
    #[must_use]
    pub fn symptom_path(&self) -> PathBuf {
        self.model_dir.join(&self.symptom_file)
    }

    /// Full path of the risk predictor artifact
    #[must_use]
    pub fn risk_path(&self) -> PathBuf {
        self.model_dir.join(&self.risk_file)
    }
}

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct HealthInsightConfig {
    /// Text pipeline settings
    pub text: TextPipelineConfig,
    /// Risk pipeline settings
    pub risk: RiskPipelineConfig,
    /// Artifact locations
    pub artifacts: ArtifactConfig,
    /// Default `env_logger` filter
    pub log_filter: String,
    /// Draw progress bars during training
    pub show_progress: bool,
}

impl Default for HealthInsightConfig {
    fn default() -> Self {
        Self {
            text: TextPipelineConfig::default(),
            risk: RiskPipelineConfig::default(),
            artifacts: ArtifactConfig::default(),
            log_filter: "info".to_string(),
            show_progress: true,
        }
    }
}

impl HealthInsightConfig {
    /// Build a configuration from defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from defaults plus overrides supplied by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_MODEL_DIR).filter(|d| !d.trim().is_empty()) {
            config.artifacts.model_dir = PathBuf::from(dir);
        }

        if let Some(filter) = lookup(ENV_LOG).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }

        if let Some(progress) = lookup(ENV_PROGRESS) {
            config.show_progress = parse_bool(ENV_PROGRESS, &progress)?;
        }

        if let Some(seed) = lookup(ENV_SEED) {
            let seed = seed.trim().parse::<u64>().map_err(|_| {
                HealthInsightError::InvalidConfig(format!("{ENV_SEED} must be an integer, got {seed:?}"))
            })?;
            config.text.random_seed = seed;
            config.risk.random_seed = seed;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipelines cannot train with
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.text.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(HealthInsightError::InvalidConfig(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({min_n}, {max_n})"
            )));
        }
        if !(self.text.max_df > 0.0 && self.text.max_df <= 1.0) {
            return Err(HealthInsightError::InvalidConfig(format!(
                "max_df must lie in (0, 1], got {}",
                self.text.max_df
            )));
        }
        if self.text.max_features == 0 || self.text.n_estimators == 0 {
            return Err(HealthInsightError::InvalidConfig(
                "max_features and n_estimators must be positive".to_string(),
            ));
        }
        if self.risk.n_stages == 0 || self.risk.max_depth == 0 {
            return Err(HealthInsightError::InvalidConfig(
                "n_stages and max_depth must be positive".to_string(),
            ));
        }
        if !(self.risk.learning_rate > 0.0) {
            return Err(HealthInsightError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.risk.learning_rate
            )));
        }
        if !(self.risk.validation_fraction > 0.0 && self.risk.validation_fraction < 1.0) {
            return Err(HealthInsightError::InvalidConfig(format!(
                "validation_fraction must lie in (0, 1), got {}",
                self.risk.validation_fraction
            )));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(HealthInsightError::InvalidConfig(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}

impl fmt::Display for HealthInsightConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Health Insight Configuration:")?;
        writeln!(f, "  Model Directory: {}", self.artifacts.model_dir.display())?;
        writeln!(
            f,
            "  Text: max_features={} ngram={:?} min_df={} max_df={} trees={} seed={}",
            self.text.max_features,
            self.text.ngram_range,
            self.text.min_df,
            self.text.max_df,
            self.text.n_estimators,
            self.text.random_seed
        )?;
        if let Some(table) = &self.text.category_table {
            writeln!(f, "  Category Table: {}", table.display())?;
        }
        writeln!(
            f,
            "  Risk: stages={} depth={} learning_rate={} validation={} seed={}",
            self.risk.n_stages,
            self.risk.max_depth,
            self.risk.learning_rate,
            self.risk.validation_fraction,
            self.risk.random_seed
        )?;
        writeln!(f, "  Log Filter: {}", self.log_filter)?;
        writeln!(f, "  Progress Bars: {}", self.show_progress)?;
        Ok(())
    }
}
