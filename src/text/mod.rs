//! Symptom text processing: normalisation, phrase extraction, body-system
//! categorisation and TF-IDF vectorizing.

pub mod categorizer;
pub mod extractor;
pub mod normalizer;
pub mod stopwords;
pub mod vectorizer;

pub use categorizer::{CategorizedSymptoms, CategoryDefinition, CategoryTable, SymptomCategorizer};
pub use extractor::SymptomExtractor;
pub use normalizer::{EnglishLemmatizer, NormalizerMode, TextNormalizer};
pub use vectorizer::{TfidfVectorizer, VectorizerSettings};
