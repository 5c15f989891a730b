//! Body-system categorisation of symptom phrases
//!
//! A phrase is assigned to the first category, in table order, with a keyword
//! contained in the phrase. Table order is therefore part of the behaviour:
//! "chest pain" is respiratory because respiratory is declared before
//! cardiovascular. The table is versioned and can be replaced from JSON.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::io::Read;
use std::path::Path;

use crate::error::util::open_artifact_file;
use crate::error::{HealthInsightError, Result};

/// Name of the overflow bucket for phrases no category matches
pub const OTHER_CATEGORY: &str = "other";

/// One body-system category and its keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub name: String,
    pub keywords: Vec<String>,
}

impl CategoryDefinition {
    fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    fn matches(&self, phrase: &str) -> bool {
        self.keywords.iter().any(|keyword| phrase.contains(keyword.as_str()))
    }
}

/// Ordered, versioned list of categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    pub version: u32,
    pub categories: Vec<CategoryDefinition>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryTable {
    /// Version 1 of the built-in table
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            version: 1,
            categories: vec![
                CategoryDefinition::new(
                    "respiratory",
                    &[
                        "cough",
                        "shortness of breath",
                        "chest pain",
                        "wheezing",
                        "sore throat",
                        "runny nose",
                        "congestion",
                        "sneezing",
                    ],
                ),
                CategoryDefinition::new(
                    "gastrointestinal",
                    &[
                        "nausea",
                        "vomiting",
                        "diarrhea",
                        "constipation",
                        "abdominal pain",
                        "bloating",
                        "heartburn",
                        "loss of appetite",
                    ],
                ),
                CategoryDefinition::new(
                    "neurological",
                    &[
                        "headache",
                        "dizziness",
                        "confusion",
                        "memory loss",
                        "seizures",
                        "numbness",
                        "tingling",
                        "weakness",
                    ],
                ),
                CategoryDefinition::new(
                    "cardiovascular",
                    &[
                        "chest pain",
                        "palpitations",
                        "irregular heartbeat",
                        "swelling",
                        "shortness of breath",
                        "fainting",
                    ],
                ),
                CategoryDefinition::new(
                    "musculoskeletal",
                    &[
                        "joint pain",
                        "muscle aches",
                        "back pain",
                        "stiffness",
                        "swelling",
                        "limited mobility",
                    ],
                ),
                CategoryDefinition::new(
                    "dermatological",
                    &[
                        "rash",
                        "itching",
                        "skin changes",
                        "bruising",
                        "hair loss",
                        "nail changes",
                    ],
                ),
                CategoryDefinition::new(
                    "systemic",
                    &[
                        "fever",
                        "chills",
                        "fatigue",
                        "weight loss",
                        "weight gain",
                        "night sweats",
                        "general malaise",
                    ],
                ),
            ],
        }
    }

    /// Parse and validate a table from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut table: Self = serde_json::from_str(json)?;
        for category in &mut table.categories {
            category.name = category.name.trim().to_lowercase();
            category.keywords = category
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
        }
        table.validate()?;
        Ok(table)
    }

    /// Read a table from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut json = String::new();
        open_artifact_file(path, "category table")?
            .read_to_string(&mut json)
            .map_err(|e| {
                HealthInsightError::io(format!("Failed to read {}", path.display()), e)
            })?;
        Self::from_json_str(&json)
    }

    /// Reject empty, duplicate or reserved category names
    pub fn validate(&self) -> Result<()> {
        let mut seen = rustc_hash::FxHashSet::default();
        for category in &self.categories {
            if category.name.is_empty() {
                return Err(HealthInsightError::InvalidConfig(
                    "category table contains an unnamed category".to_string(),
                ));
            }
            if category.name == OTHER_CATEGORY {
                return Err(HealthInsightError::InvalidConfig(format!(
                    "category name {OTHER_CATEGORY:?} is reserved for the overflow bucket"
                )));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(HealthInsightError::InvalidConfig(format!(
                    "duplicate category {:?} in category table",
                    category.name
                )));
            }
        }
        Ok(())
    }

    /// Category names in precedence order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }
}

/// Phrases grouped by category, in table order, empty buckets omitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedSymptoms {
    buckets: Vec<(String, Vec<String>)>,
}

impl From<Vec<(String, Vec<String>)>> for CategorizedSymptoms {
    fn from(buckets: Vec<(String, Vec<String>)>) -> Self {
        Self {
            buckets: buckets.into_iter().filter(|(_, p)| !p.is_empty()).collect(),
        }
    }
}

impl CategorizedSymptoms {
    /// Phrases assigned to `category`, if any
    #[must_use]
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.buckets
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, phrases)| phrases.as_slice())
    }

    /// Non-empty category names in output order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate over `(category, phrases)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets
            .iter()
            .map(|(name, phrases)| (name.as_str(), phrases.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Serialize for CategorizedSymptoms {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (name, phrases) in &self.buckets {
            map.serialize_entry(name, phrases)?;
        }
        map.end()
    }
}

/// Assigns phrases to body-system categories
#[derive(Debug, Clone, Default)]
pub struct SymptomCategorizer {
    table: CategoryTable,
}

impl SymptomCategorizer {
    #[must_use]
    pub const fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub const fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Group `phrases` by the first matching category
    #[must_use]
    pub fn categorize(&self, phrases: &[String]) -> CategorizedSymptoms {
        let mut buckets: Vec<(String, Vec<String>)> = self
            .table
            .names()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();
        let mut other = Vec::new();

        for phrase in phrases {
            let lowered = phrase.to_lowercase();
            match self
                .table
                .categories
                .iter()
                .position(|category| category.matches(&lowered))
            {
                Some(index) => buckets[index].1.push(phrase.clone()),
                None => other.push(phrase.clone()),
            }
        }

        buckets.push((OTHER_CATEGORY.to_string(), other));
        CategorizedSymptoms::from(buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_headache_and_nausea() {
        let categorizer = SymptomCategorizer::default();
        let result = categorizer.categorize(&phrases(&["severe headache", "nausea"]));

        assert_eq!(
            result.categories().collect::<Vec<_>>(),
            vec!["gastrointestinal", "neurological"]
        );
        assert_eq!(result.get("neurological"), Some(&["severe headache".to_string()][..]));
        assert_eq!(result.get("gastrointestinal"), Some(&["nausea".to_string()][..]));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_first_declared_category_wins() {
        let categorizer = SymptomCategorizer::default();
        for _ in 0..10 {
            let result = categorizer.categorize(&phrases(&["chest pain", "ankle swelling"]));
            assert_eq!(result.get("respiratory"), Some(&["chest pain".to_string()][..]));
            assert_eq!(
                result.get("cardiovascular"),
                Some(&["ankle swelling".to_string()][..])
            );
            assert!(result.get("musculoskeletal").is_none());
        }
    }

    #[test]
    fn test_unmatched_phrases_go_to_other() {
        let categorizer = SymptomCategorizer::default();
        let result = categorizer.categorize(&phrases(&["blurred vision", "cough"]));
        assert_eq!(
            result.categories().collect::<Vec<_>>(),
            vec!["respiratory", OTHER_CATEGORY]
        );
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let categorizer = SymptomCategorizer::default();
        let result = categorizer.categorize(&phrases(&["fever", "rash", "cough"]));
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"respiratory":["cough"],"dermatological":["rash"],"systemic":["fever"]}"#
        );
        assert!(categorizer.categorize(&[]).is_empty());
    }

    #[test]
    fn test_custom_table_from_json() {
        let table = CategoryTable::from_json_str(
            r#"{"version": 2, "categories": [
                {"name": "Cardiovascular", "keywords": ["Chest Pain"]},
                {"name": "respiratory", "keywords": ["chest pain", "cough"]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(table.version, 2);

        let result = SymptomCategorizer::new(table).categorize(&phrases(&["chest pain"]));
        assert_eq!(result.get("cardiovascular"), Some(&["chest pain".to_string()][..]));
    }

    #[test]
    fn test_invalid_tables_are_rejected() {
        let reserved = CategoryTable::from_json_str(
            r#"{"version": 1, "categories": [{"name": "other", "keywords": ["x"]}]}"#,
        );
        assert!(matches!(reserved, Err(HealthInsightError::InvalidConfig(_))));

        let duplicate = CategoryTable::from_json_str(
            r#"{"version": 1, "categories": [
                {"name": "a", "keywords": ["x"]},
                {"name": "a", "keywords": ["y"]}
            ]}"#,
        );
        assert!(matches!(duplicate, Err(HealthInsightError::InvalidConfig(_))));
    }
}
