//! Splitting symptom descriptions into individual phrases

use crate::text::normalizer::TextNormalizer;

/// Separators in priority order; only the first one present is used
pub const SEPARATORS: [&str; 5] = [",", ";", " and ", " or ", "\n"];

/// Pieces with this many characters or fewer are discarded
const MIN_PHRASE_CHARS: usize = 2;

/// Symptom phrase extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct SymptomExtractor {
    normalizer: TextNormalizer,
}

impl SymptomExtractor {
    /// Extractor normalising with `normalizer` before splitting
    #[must_use]
    pub const fn new(normalizer: TextNormalizer) -> Self {
        Self { normalizer }
    }

    /// Normalise raw text and split it into phrases
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<String> {
        split_phrases(&self.normalizer.normalize(text))
    }
}

/// Split already normalised text on the first separator it contains
#[must_use]
pub fn split_phrases(normalized: &str) -> Vec<String> {
    let pieces: Vec<&str> = match SEPARATORS.iter().find(|sep| normalized.contains(*sep)) {
        Some(separator) => normalized.split(separator).collect(),
        None => vec![normalized],
    };

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| piece.chars().count() > MIN_PHRASE_CHARS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_and() {
        let extractor = SymptomExtractor::default();
        assert_eq!(
            extractor.extract("severe headache and nausea"),
            vec!["severe headache".to_string(), "nausea".to_string()]
        );
    }

    #[test]
    fn test_first_separator_wins() {
        assert_eq!(
            split_phrases("cough; fever and chills"),
            vec!["cough".to_string(), "fever and chills".to_string()]
        );
    }

    #[test]
    fn test_short_pieces_are_dropped() {
        assert_eq!(
            split_phrases("ab, cough,  , rash"),
            vec!["cough".to_string(), "rash".to_string()]
        );
    }

    #[test]
    fn test_no_separator_yields_whole_text() {
        assert_eq!(split_phrases("dizziness"), vec!["dizziness".to_string()]);
        assert!(split_phrases("").is_empty());
    }

    #[test]
    fn test_punctuation_is_normalised_away_before_splitting() {
        let extractor = SymptomExtractor::default();
        assert_eq!(
            extractor.extract("Fatigue, increased thirst, and blurred vision"),
            vec!["fatigue increased thirst".to_string(), "blurred vision".to_string()]
        );
    }
}
