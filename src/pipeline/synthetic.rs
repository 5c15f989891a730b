//! Seeded synthetic training data
//!
//! Used by `train_default` on both pipelines when no external training set
//! is supplied. Generation is a pure function of the seed.

use rand::prelude::*;

use crate::features::HealthRecord;
use crate::models::RiskTier;

/// Conditions and the symptoms each one presents with
pub const CONDITION_SYMPTOMS: &[(&str, &[&str])] = &[
    (
        "common_cold",
        &["runny nose", "sore throat", "cough", "sneezing", "congestion"],
    ),
    ("flu", &["fever", "body aches", "fatigue", "cough", "headache"]),
    (
        "covid19",
        &["fever", "cough", "shortness of breath", "loss of taste", "fatigue"],
    ),
    ("allergies", &["sneezing", "runny nose", "itchy eyes", "congestion"]),
    (
        "migraine",
        &["severe headache", "nausea", "sensitivity to light", "dizziness"],
    ),
    (
        "gastroenteritis",
        &["nausea", "vomiting", "diarrhea", "abdominal pain"],
    ),
    (
        "anxiety",
        &["rapid heartbeat", "shortness of breath", "sweating", "nervousness"],
    ),
    (
        "depression",
        &["fatigue", "loss of appetite", "difficulty concentrating", "sadness"],
    ),
    (
        "hypertension",
        &["headache", "dizziness", "chest pain", "shortness of breath"],
    ),
    (
        "diabetes",
        &["increased thirst", "frequent urination", "fatigue", "blurred vision"],
    ),
];

/// Examples generated per condition
pub const EXAMPLES_PER_CONDITION: usize = 50;
/// Records generated for the default risk training set
pub const DEFAULT_RECORD_COUNT: usize = 2000;
/// Seed used by `train_default`
pub const DEFAULT_SEED: u64 = 42;

/// `(text, condition)` pairs, 2-4 distinct symptoms per text
#[must_use]
pub fn symptom_corpus(seed: u64) -> Vec<(String, String)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut corpus = Vec::with_capacity(CONDITION_SYMPTOMS.len() * EXAMPLES_PER_CONDITION);

    for (condition, symptoms) in CONDITION_SYMPTOMS {
        for _ in 0..EXAMPLES_PER_CONDITION {
            let count = rng.random_range(2..5).min(symptoms.len());
            let mut picked: Vec<&str> = symptoms.to_vec();
            picked.shuffle(&mut rng);
            picked.truncate(count);

            let mut text = picked.join(", ");
            if rng.random::<f64>() < 0.3 {
                text.push_str(&format!(" for {} days", rng.random_range(1..14)));
            }
            corpus.push((text, (*condition).to_string()));
        }
    }
    corpus
}

/// Normal sample by the Box-Muller transform
fn normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    // Shift into (0, 1] so the logarithm stays finite
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    mean + std_dev * z
}

fn uniform_int(rng: &mut StdRng, low: i32, high: i32) -> f64 {
    f64::from(rng.random_range(low..high))
}

fn flag(rng: &mut StdRng, p: f64) -> f64 {
    if rng.random_bool(p) { 1.0 } else { 0.0 }
}

/// Tier label from the larger of two heuristic scores
///
/// These heuristics deliberately differ from the canonical rule table: the
/// cardiovascular score also fires on diastolic pressure and the diabetes
/// score counts low physical activity.
#[must_use]
pub fn label_record(record: &HealthRecord) -> RiskTier {
    let v = |value: Option<f64>| value.unwrap_or(0.0);

    let mut cardiovascular: f64 = 0.0;
    if v(record.age) > 45.0 {
        cardiovascular += 0.2;
    }
    if v(record.bp_systolic) > 140.0 || v(record.bp_diastolic) > 90.0 {
        cardiovascular += 0.3;
    }
    if v(record.cholesterol) > 240.0 {
        cardiovascular += 0.2;
    }
    if v(record.bmi) > 30.0 {
        cardiovascular += 0.1;
    }
    if v(record.smoking) != 0.0 {
        cardiovascular += 0.3;
    }
    if v(record.family_history_cvd) != 0.0 {
        cardiovascular += 0.2;
    }

    let mut diabetes: f64 = 0.0;
    if v(record.age) > 45.0 {
        diabetes += 0.2;
    }
    if v(record.bmi) > 25.0 {
        diabetes += 0.2;
    }
    if v(record.glucose) > 100.0 {
        diabetes += 0.3;
    }
    if v(record.family_history_diabetes) != 0.0 {
        diabetes += 0.3;
    }
    if record.physical_activity.is_some_and(|hours| hours < 3.0) {
        diabetes += 0.1;
    }

    let max_risk = cardiovascular.max(diabetes);
    if max_risk > 0.7 {
        RiskTier::High
    } else if max_risk > 0.4 {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// `n` fully populated records with their tier labels
#[must_use]
pub fn health_records(n: usize, seed: u64) -> (Vec<HealthRecord>, Vec<RiskTier>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(n);
    let mut tiers = Vec::with_capacity(n);

    for _ in 0..n {
        let age = uniform_int(&mut rng, 18, 80);
        let gender = if rng.random_bool(0.5) { "male" } else { "female" };
        let bp_systolic = normal(&mut rng, 120.0, 20.0);
        let bp_diastolic = normal(&mut rng, 80.0, 10.0);
        let heart_rate = normal(&mut rng, 70.0, 15.0);
        let temperature = normal(&mut rng, 98.6, 1.0);
        let height = normal(&mut rng, 170.0, 10.0);
        let weight = normal(&mut rng, 70.0, 15.0);
        let bmi = weight / (height / 100.0).powi(2);

        let record = HealthRecord {
            age: Some(age),
            bp_systolic: Some(bp_systolic),
            bp_diastolic: Some(bp_diastolic),
            heart_rate: Some(heart_rate),
            temperature: Some(temperature),
            height: Some(height),
            weight: Some(weight),
            bmi: Some(bmi),
            glucose: Some(normal(&mut rng, 90.0, 20.0)),
            cholesterol: Some(normal(&mut rng, 200.0, 40.0)),
            smoking: Some(flag(&mut rng, 0.3)),
            alcohol_consumption: Some(uniform_int(&mut rng, 0, 7)),
            physical_activity: Some(uniform_int(&mut rng, 0, 10)),
            sleep_hours: Some(normal(&mut rng, 7.0, 1.5)),
            stress_level: Some(uniform_int(&mut rng, 1, 11)),
            air_quality: Some(uniform_int(&mut rng, 0, 300)),
            pollen_count: Some(uniform_int(&mut rng, 0, 100)),
            family_history_cvd: Some(flag(&mut rng, 0.2)),
            family_history_diabetes: Some(flag(&mut rng, 0.15)),
            family_history_hypertension: Some(flag(&mut rng, 0.3)),
            diet_score: Some(uniform_int(&mut rng, 1, 11)),
            salt_intake: Some(normal(&mut rng, 2300.0, 500.0)),
            allergies: Some(flag(&mut rng, 0.2)),
            respiratory_infections: Some(uniform_int(&mut rng, 0, 5)),
            lung_function: Some(normal(&mut rng, 100.0, 15.0)),
            gender: Some(gender.to_string()),
        };

        tiers.push(label_record(&record));
        records.push(record);
    }

    (records, tiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_symptom_corpus_shape() {
        let corpus = symptom_corpus(DEFAULT_SEED);
        assert_eq!(corpus.len(), CONDITION_SYMPTOMS.len() * EXAMPLES_PER_CONDITION);

        let labels: FxHashSet<&str> = corpus.iter().map(|(_, label)| label.as_str()).collect();
        assert_eq!(labels.len(), 10);

        for (text, _) in &corpus {
            let body = text.split(" for ").next().unwrap_or_default();
            let parts = body.split(", ").count();
            assert!((2..=4).contains(&parts), "{text}");
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        assert_eq!(symptom_corpus(7), symptom_corpus(7));
        assert_eq!(health_records(50, 7), health_records(50, 7));
        assert_ne!(health_records(50, 7).0, health_records(50, 8).0);
    }

    #[test]
    fn test_records_cover_every_tier() {
        let (records, tiers) = health_records(DEFAULT_RECORD_COUNT, DEFAULT_SEED);
        assert_eq!(records.len(), DEFAULT_RECORD_COUNT);
        for tier in RiskTier::all() {
            assert!(tiers.contains(&tier), "missing {tier}");
        }
        assert!(records.iter().all(|r| r.gender.is_some() && r.bmi.is_some()));
    }

    #[test]
    fn test_label_thresholds() {
        let high = HealthRecord {
            age: Some(60.0),
            smoking: Some(1.0),
            bp_diastolic: Some(95.0),
            ..HealthRecord::default()
        };
        assert_eq!(label_record(&high), RiskTier::High);

        let medium = HealthRecord {
            age: Some(60.0),
            glucose: Some(120.0),
            ..HealthRecord::default()
        };
        assert_eq!(label_record(&medium), RiskTier::Medium);

        assert_eq!(label_record(&HealthRecord::default()), RiskTier::Low);
    }
}
