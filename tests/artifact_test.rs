#[cfg(test)]
mod tests {
    use health_insight::artifact::{ARTIFACT_FORMAT, ARTIFACT_VERSION};
    use health_insight::config::{RiskPipelineConfig, TextPipelineConfig};
    use health_insight::pipeline::synthetic;
    use health_insight::{HealthInsightError, RiskPredictor, SymptomClassifier};

    fn trained_symptom() -> SymptomClassifier {
        let mut classifier = SymptomClassifier::new(TextPipelineConfig {
            n_estimators: 5,
            ..TextPipelineConfig::default()
        });
        classifier.train_default().unwrap();
        classifier
    }

    fn trained_risk() -> RiskPredictor {
        let (records, tiers) = synthetic::health_records(200, 42);
        let mut predictor = RiskPredictor::new(RiskPipelineConfig {
            n_stages: 5,
            max_depth: 2,
            ..RiskPipelineConfig::default()
        });
        predictor.train(&records, &tiers).unwrap();
        predictor
    }

    #[test]
    fn test_envelope_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symptom.json");
        let written = trained_symptom().save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.len(), written);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["format"], ARTIFACT_FORMAT);
        assert_eq!(json["version"], ARTIFACT_VERSION);
        assert_eq!(json["kind"], "symptom_classifier");
        assert_eq!(json["is_trained"], true);
        assert!(json["payload"]["vectorizer"].is_object());
        assert!(json["payload"]["forest"].is_object());
        assert!(json["payload"]["labels"].is_object());

        // No temporary files left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_artifacts_are_not_interchangeable() {
        let dir = tempfile::tempdir().unwrap();
        let symptom_path = dir.path().join("symptom.json");
        let risk_path = dir.path().join("risk.json");
        trained_symptom().save(&symptom_path).unwrap();
        trained_risk().save(&risk_path).unwrap();

        let err = RiskPredictor::default().load(&symptom_path).unwrap_err();
        assert!(matches!(err, HealthInsightError::CorruptArtifact { .. }));
        let err = SymptomClassifier::default().load(&risk_path).unwrap_err();
        assert!(matches!(err, HealthInsightError::CorruptArtifact { .. }));
    }

    #[test]
    fn test_partial_bundle_is_rejected_and_state_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk.json");
        let predictor = trained_risk();
        predictor.save(&path).unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        json["payload"]
            .as_object_mut()
            .unwrap()
            .remove("scaler");
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, serde_json::to_string(&json).unwrap()).unwrap();

        let mut target = predictor.clone();
        let err = target.load(&broken).unwrap_err();
        assert!(matches!(err, HealthInsightError::CorruptArtifact { .. }));
        assert!(target.is_trained());
        assert_eq!(target.feature_names(), predictor.feature_names());
    }

    #[test]
    fn test_overwrite_replaces_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk.json");
        let predictor = trained_risk();
        predictor.save(&path).unwrap();
        predictor.save(&path).unwrap();

        let mut restored = RiskPredictor::default();
        restored.load(&path).unwrap();
        assert!(restored.is_trained());
    }
}
