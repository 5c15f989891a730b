//! TF-IDF vectorizer over word n-grams
//!
//! A vectorizer only exists in fitted form: [`TfidfVectorizer::fit`] builds the
//! vocabulary and idf weights, and [`TfidfVectorizer::transform`] maps a text
//! onto that frozen vocabulary. Unknown n-grams contribute nothing.

use log::debug;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::config::TextPipelineConfig;
use crate::error::{HealthInsightError, Result};
use crate::text::stopwords::is_stop_word;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap_or_else(|_| unreachable!("static pattern")));

/// Settings frozen into a fitted vectorizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerSettings {
    pub max_features: usize,
    pub ngram_range: (usize, usize),
    pub min_df: usize,
    pub max_df: f64,
    pub remove_stop_words: bool,
}

impl From<&TextPipelineConfig> for VectorizerSettings {
    fn from(config: &TextPipelineConfig) -> Self {
        Self {
            max_features: config.max_features,
            ngram_range: config.ngram_range,
            min_df: config.min_df,
            max_df: config.max_df,
            remove_stop_words: config.remove_stop_words,
        }
    }
}

impl VectorizerSettings {
    /// Tokenise a normalised document into its n-grams
    fn ngrams(&self, document: &str) -> Vec<String> {
        let tokens: Vec<&str> = TOKEN
            .find_iter(document)
            .map(|m| m.as_str())
            .filter(|token| !(self.remove_stop_words && is_stop_word(token)))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut grams = Vec::new();
        for n in min_n..=max_n {
            if n == 0 || n > tokens.len() {
                continue;
            }
            grams.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        grams
    }

    fn counts(&self, document: &str) -> FxHashMap<String, usize> {
        let mut counts = FxHashMap::default();
        for gram in self.ngrams(document) {
            *counts.entry(gram).or_insert(0) += 1;
        }
        counts
    }
}

/// Fitted TF-IDF vectorizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    settings: VectorizerSettings,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and idf weights from normalised documents
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(settings: VectorizerSettings, documents: &[String]) -> Result<Self> {
        if documents.is_empty() {
            return Err(HealthInsightError::insufficient_data(
                "cannot fit a vocabulary on an empty corpus",
            ));
        }

        let n_docs = documents.len();
        let mut document_frequency: FxHashMap<String, usize> = FxHashMap::default();
        let mut term_frequency: FxHashMap<String, usize> = FxHashMap::default();
        for document in documents {
            for (gram, count) in settings.counts(document) {
                *term_frequency.entry(gram.clone()).or_insert(0) += count;
                *document_frequency.entry(gram).or_insert(0) += 1;
            }
        }

        let max_doc_count = settings.max_df * n_docs as f64;
        if max_doc_count < settings.min_df as f64 {
            return Err(HealthInsightError::insufficient_data(format!(
                "max_df allows {max_doc_count:.1} documents per term, fewer than min_df ({}) on {n_docs} documents",
                settings.min_df
            )));
        }

        let mut candidates: Vec<(String, usize)> = term_frequency
            .into_iter()
            .filter(|(gram, _)| {
                let df = document_frequency.get(gram).copied().unwrap_or(0);
                df >= settings.min_df && df as f64 <= max_doc_count
            })
            .collect();

        if candidates.is_empty() {
            return Err(HealthInsightError::insufficient_data(format!(
                "no term satisfies min_df={} and max_df={} on {n_docs} documents",
                settings.min_df, settings.max_df
            )));
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(settings.max_features);

        let mut terms: Vec<String> = candidates.into_iter().map(|(gram, _)| gram).collect();
        terms.sort();

        let idf: Vec<f64> = terms
            .iter()
            .map(|term| {
                let df = document_frequency.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let vocabulary: BTreeMap<String, usize> =
            terms.into_iter().enumerate().map(|(i, t)| (t, i)).collect();

        debug!(
            "Fitted TF-IDF vocabulary with {} terms on {n_docs} documents",
            vocabulary.len()
        );

        Ok(Self {
            settings,
            vocabulary,
            idf,
        })
    }

    /// Map a normalised document onto the frozen vocabulary
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn transform(&self, document: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        for (gram, count) in self.settings.counts(document) {
            if let Some(&index) = self.vocabulary.get(&gram) {
                vector[index] = count as f64 * self.idf[index];
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }

    /// Transform every document
    #[must_use]
    pub fn transform_all(&self, documents: &[String]) -> Vec<Vec<f64>> {
        documents.iter().map(|d| self.transform(d)).collect()
    }

    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Index of `term` in the output vector
    #[must_use]
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    #[must_use]
    pub const fn settings(&self) -> &VectorizerSettings {
        &self.settings
    }

    /// Check internal consistency after deserialisation
    pub(crate) fn check_consistency(&self) -> std::result::Result<(), String> {
        if self.vocabulary.is_empty() {
            return Err("vectorizer vocabulary is empty".to_string());
        }
        if self.idf.len() != self.vocabulary.len() {
            return Err(format!(
                "vectorizer has {} idf weights for {} terms",
                self.idf.len(),
                self.vocabulary.len()
            ));
        }
        let mut seen = vec![false; self.idf.len()];
        for &index in self.vocabulary.values() {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(format!("vectorizer term index {index} is invalid")),
            }
        }
        Ok(())
    }
}
