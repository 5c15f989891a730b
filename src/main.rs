use anyhow::Context;
use log::info;
use std::time::Instant;

use health_insight::{HealthInsightConfig, InitStrategy, PipelineContext, RawRecord};

const DEMO_SYMPTOMS: [&str; 4] = [
    "I have a severe headache and nausea",
    "Running nose, cough, and fever for 3 days",
    "Chest pain and shortness of breath",
    "Fatigue, increased thirst, and blurred vision",
];

fn demo_records() -> [RawRecord; 2] {
    [
        RawRecord::new()
            .with("age", 55)
            .with("gender", "male")
            .with("bp_systolic", 150)
            .with("bp_diastolic", 95)
            .with("heart_rate", 80)
            .with("bmi", 28)
            .with("glucose", 110)
            .with("cholesterol", 250)
            .with("smoking", 1)
            .with("physical_activity", 2)
            .with("stress_level", 8)
            .with("family_history_cvd", 1)
            .with("family_history_diabetes", 0),
        RawRecord::new()
            .with("age", 30)
            .with("gender", "female")
            .with("bp_systolic", 115)
            .with("bp_diastolic", 75)
            .with("heart_rate", 65)
            .with("bmi", 22)
            .with("glucose", 85)
            .with("cholesterol", 180)
            .with("smoking", 0)
            .with("physical_activity", 5)
            .with("stress_level", 3)
            .with("family_history_cvd", 0)
            .with("family_history_diabetes", 0),
    ]
}

fn main() -> anyhow::Result<()> {
    let config = HealthInsightConfig::from_env().context("Failed to read configuration")?;

    // Setup logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();
    info!("{config}");

    let start = Instant::now();
    let context = PipelineContext::new(config);
    let summary = context
        .initialize(InitStrategy::LoadOrTrain)
        .context("Failed to initialise pipelines")?;
    info!(
        "Initialised in {:?} (symptom: {:?}, risk: {:?})",
        start.elapsed(),
        summary.symptom,
        summary.risk
    );

    for text in DEMO_SYMPTOMS {
        let result = context.classify_symptoms(text)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    for record in demo_records() {
        let result = context.assess_risk(&record)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
