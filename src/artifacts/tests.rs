//! Tests for the artifacts module.

use super::*;
use crate::primitives::Matrix;

fn fitted_tree() -> DecisionTreeClassifier {
    let x = Matrix::from_vec(4, 2, vec![-12.0, 1.0, -11.0, 2.0, 4.0, 1.0, 5.0, 2.0])
        .expect("valid matrix");
    let y = vec![1, 1, 0, 0];
    let mut tree = DecisionTreeClassifier::new();
    tree.fit(&x, &y).expect("fit succeeds");
    tree
}

fn fitted_linear() -> (SoftmaxRegression, StandardScaler) {
    let x = Matrix::from_vec(4, 2, vec![-12.0, 1.0, -11.0, 2.0, 4.0, 1.0, 5.0, 2.0])
        .expect("valid matrix");
    let y = vec![1, 1, 0, 0];
    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&x).expect("fit_transform");
    let mut model = SoftmaxRegression::new().with_max_iter(500);
    model.fit(&scaled, &y).expect("fit succeeds");
    (model, scaler)
}

#[test]
fn test_model_family_parse() {
    assert_eq!("tree".parse::<ModelFamily>().expect("parse"), ModelFamily::Tree);
    assert_eq!(
        "linear".parse::<ModelFamily>().expect("parse"),
        ModelFamily::Linear
    );
    assert!("xgboost".parse::<ModelFamily>().is_err());
}

#[test]
fn test_model_family_display() {
    assert_eq!(ModelFamily::Tree.to_string(), "tree");
    assert_eq!(ModelFamily::Linear.to_string(), "linear");
}

#[test]
fn test_label_mapping_full_bijection() {
    let mapping = LabelMapping::full();
    assert_eq!(mapping.len(), 3);
    for level in RiskLevel::ALL {
        let code = mapping.code(level).expect("covered");
        assert_eq!(mapping.label_for(code), Some(level));
        assert_eq!(code, level.code());
    }
}

#[test]
fn test_label_mapping_partial_coverage() {
    // Training data without any High days: contiguous codes, High absent
    let mapping = LabelMapping::from_labels(&[RiskLevel::Moderate, RiskLevel::Low, RiskLevel::Low]);
    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping.code(RiskLevel::Low), Some(0));
    assert_eq!(mapping.code(RiskLevel::Moderate), Some(1));
    assert_eq!(mapping.code(RiskLevel::High), None);
    assert_eq!(mapping.label_for(2), None);
}

#[test]
fn test_label_mapping_json_roundtrip() {
    let mapping = LabelMapping::full();
    let json = serde_json::to_string(&mapping).expect("serialize");
    assert!(json.contains("\"Low\":0"));
    let back: LabelMapping = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, mapping);
}

#[test]
fn test_model_artifact_dispatch() {
    let artifact = ModelArtifact::Tree(fitted_tree());
    assert_eq!(artifact.family(), ModelFamily::Tree);
    assert_eq!(artifact.n_classes(), 2);

    let proba = artifact.predict_proba(&[-11.5, 1.5]).expect("predict_proba");
    assert_eq!(proba.len(), 2);
}

#[test]
fn test_bundle_save_load_roundtrip_tree() {
    let dir = tempfile::tempdir().expect("tempdir");

    let bundle = ArtifactBundle::new(
        ModelArtifact::Tree(fitted_tree()),
        None,
        LabelMapping::full(),
        vec!["min_temp_c".to_string(), "mean_aqi".to_string()],
    );
    bundle.save(dir.path()).expect("save");

    let loaded = ArtifactBundle::load(dir.path(), ModelFamily::Tree).expect("load");
    assert_eq!(loaded.family(), ModelFamily::Tree);
    assert_eq!(loaded.feature_order(), bundle.feature_order());
    assert_eq!(loaded.label_mapping(), bundle.label_mapping());
    assert!(loaded.scaler().is_none());

    let original = bundle.model().predict_proba(&[-11.5, 1.5]).expect("proba");
    let restored = loaded.model().predict_proba(&[-11.5, 1.5]).expect("proba");
    assert_eq!(original, restored);
}

#[test]
fn test_bundle_save_load_roundtrip_linear_with_scaler() {
    let dir = tempfile::tempdir().expect("tempdir");

    let (model, scaler) = fitted_linear();
    let bundle = ArtifactBundle::new(
        ModelArtifact::Linear(model),
        Some(scaler),
        LabelMapping::full(),
        vec!["min_temp_c".to_string(), "mean_aqi".to_string()],
    );
    bundle.save(dir.path()).expect("save");

    let loaded = ArtifactBundle::load(dir.path(), ModelFamily::Linear).expect("load");
    assert_eq!(loaded.family(), ModelFamily::Linear);
    assert!(loaded.scaler().is_some());
}

#[test]
fn test_load_missing_classifier_is_artifact_missing() {
    let dir = tempfile::tempdir().expect("tempdir");

    let err = ArtifactBundle::load(dir.path(), ModelFamily::Tree).unwrap_err();
    match err {
        RiesgoError::ArtifactMissing { path, remediation } => {
            assert!(path.ends_with("tree.model"));
            assert_eq!(remediation, "run training first");
        }
        other => panic!("expected ArtifactMissing, got {other:?}"),
    }
}

#[test]
fn test_load_missing_mapping_is_artifact_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    fitted_tree()
        .save(dir.path().join(ModelFamily::Tree.artifact_file()))
        .expect("save model");

    let err = ArtifactBundle::load(dir.path(), ModelFamily::Tree).unwrap_err();
    match err {
        RiesgoError::ArtifactMissing { path, .. } => {
            assert!(path.ends_with(RISK_MAPPING_FILE));
        }
        other => panic!("expected ArtifactMissing, got {other:?}"),
    }
}

#[test]
fn test_load_missing_feature_names_falls_back_to_canonical() {
    let dir = tempfile::tempdir().expect("tempdir");
    fitted_tree()
        .save(dir.path().join(ModelFamily::Tree.artifact_file()))
        .expect("save model");
    fs::write(
        dir.path().join(RISK_MAPPING_FILE),
        serde_json::to_vec(&LabelMapping::full()).expect("serialize"),
    )
    .expect("write mapping");

    let loaded = ArtifactBundle::load(dir.path(), ModelFamily::Tree).expect("load");
    assert_eq!(loaded.feature_order(), canonical_feature_order());
    assert_eq!(loaded.n_features(), 6);
}

#[test]
fn test_load_linear_without_scaler_degrades() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (model, _scaler) = fitted_linear();
    model
        .save(dir.path().join(ModelFamily::Linear.artifact_file()))
        .expect("save model");
    fs::write(
        dir.path().join(RISK_MAPPING_FILE),
        serde_json::to_vec(&LabelMapping::full()).expect("serialize"),
    )
    .expect("write mapping");

    let loaded = ArtifactBundle::load(dir.path(), ModelFamily::Linear).expect("load");
    assert!(loaded.scaler().is_none(), "missing scaler is not an error");
}

#[test]
fn test_load_corrupt_model_is_serialization_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(ModelFamily::Tree.artifact_file()), b"junk")
        .expect("write junk");
    fs::write(
        dir.path().join(RISK_MAPPING_FILE),
        serde_json::to_vec(&LabelMapping::full()).expect("serialize"),
    )
    .expect("write mapping");

    let err = ArtifactBundle::load(dir.path(), ModelFamily::Tree).unwrap_err();
    assert!(matches!(err, RiesgoError::Serialization(_)));
}
