//! Tests for the explain module.

use super::*;
use crate::artifacts::LabelMapping;
use crate::features::RiskLevel;
use crate::linear_model::SoftmaxRegression;
use crate::preprocessing::StandardScaler;
use crate::primitives::Matrix;
use crate::tree::DecisionTreeClassifier;

fn feature_order(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn tree_bundle() -> ArtifactBundle {
    let x = Matrix::from_vec(
        6,
        2,
        vec![
            -12.0, 4.0, //
            -11.0, 5.0, //
            -11.5, 4.5, //
            4.0, 1.0, //
            5.0, 1.0, //
            4.5, 1.5,
        ],
    )
    .expect("valid matrix");
    let y = vec![1, 1, 1, 0, 0, 0];
    let mut tree = DecisionTreeClassifier::new();
    tree.fit(&x, &y).expect("fit succeeds");

    ArtifactBundle::new(
        ModelArtifact::Tree(tree),
        None,
        LabelMapping::from_labels(&[RiskLevel::Low, RiskLevel::Moderate]),
        feature_order(&["min_temp_c", "mean_aqi"]),
    )
}

fn linear_parts() -> (SoftmaxRegression, StandardScaler) {
    let x = Matrix::from_vec(4, 2, vec![-10.0, 4.0, -8.0, 5.0, 8.0, 1.0, 10.0, 0.0])
        .expect("valid matrix");
    let y = vec![1, 1, 0, 0];
    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&x).expect("fit_transform");
    let mut model = SoftmaxRegression::new().with_max_iter(500);
    model.fit(&scaled, &y).expect("fit succeeds");
    (model, scaler)
}

fn linear_bundle(model: SoftmaxRegression, scaler: Option<StandardScaler>) -> ArtifactBundle {
    ArtifactBundle::new(
        ModelArtifact::Linear(model),
        scaler,
        LabelMapping::full(),
        feature_order(&["min_temp_c", "mean_aqi"]),
    )
}

#[test]
fn test_tree_explanation_end_to_end() {
    let bundle = tree_bundle();
    let row: FeatureRow = [("min_temp_c", -11.5), ("mean_aqi", 4.5)]
        .into_iter()
        .collect();

    let explanation = Explainer::new(&bundle).explain_row(&row).expect("explains");
    assert_eq!(explanation.prediction.as_str(), "Moderate");
    assert!(explanation.confidence > 0.5);
    assert_eq!(explanation.attribution.len(), 2);
    assert!(!explanation.top_reasons.is_empty());
}

#[test]
fn test_tree_attribution_matches_path_decomposition() {
    let bundle = tree_bundle();
    let explainer = Explainer::new(&bundle);

    let x = vec![-11.5, 4.5];
    let values = explainer.attribute(&x, 1).expect("attribution");

    let ModelArtifact::Tree(tree) = bundle.model() else {
        panic!("tree bundle");
    };
    assert_eq!(values, tree.path_contributions(&x, 1).expect("path"));
}

#[test]
fn test_top_reasons_subsequence_of_attribution_keys() {
    let bundle = tree_bundle();
    let row: FeatureRow = [("min_temp_c", -11.5), ("mean_aqi", 4.5)]
        .into_iter()
        .collect();

    let explanation = Explainer::new(&bundle).explain_row(&row).expect("explains");
    for reason in &explanation.top_reasons {
        assert!(explanation.attribution.contains_key(reason));
    }
}

#[test]
fn test_linear_ladder_prefers_background_tier() {
    let (model, scaler) = linear_parts();
    let bundle = linear_bundle(model, Some(scaler));
    let explainer = Explainer::new(&bundle);

    let x = vec![0.5, -0.5];
    let values = explainer.attribute(&x, 0).expect("attribution");

    // Background in model space is exactly zero (the scaler's own mean),
    // so tier 1 reduces to coefficient×value here.
    let expected = coefficient_attribution(&bundle, &x, 0).expect("coefficient tier");
    for (v, e) in values.iter().zip(expected.iter()) {
        assert!((v - e).abs() < 1e-12);
    }
}

#[test]
fn test_linear_ladder_falls_back_to_coefficients_without_scaler() {
    let (model, _scaler) = linear_parts();
    let coef = model.coefficients().expect("fitted").clone();
    let bundle = linear_bundle(model, None);
    let explainer = Explainer::new(&bundle);

    let x = vec![2.0, 3.0];
    let values = explainer.attribute(&x, 1).expect("attribution");
    assert_eq!(values[0], coef.get(1, 0) * 2.0);
    assert_eq!(values[1], coef.get(1, 1) * 3.0);
}

#[test]
fn test_linear_ladder_terminates_in_uniform() {
    // Unfitted model and no scaler: tiers 1 and 2 both fail
    let bundle = linear_bundle(SoftmaxRegression::new(), None);
    let explainer = Explainer::new(&bundle);

    let values = explainer.attribute(&[1.0, 2.0], 0).expect("never fails");
    assert_eq!(values, vec![0.5, 0.5]);
}

#[test]
fn test_uniform_attribution_weight() {
    let bundle = linear_bundle(SoftmaxRegression::new(), None);
    let values = uniform_attribution(&bundle, &[0.0; 6], 0).expect("uniform");
    assert_eq!(values, vec![1.0 / 6.0; 6]);
}

#[test]
fn test_non_finite_input_is_explanation_error() {
    let bundle = tree_bundle();
    let explainer = Explainer::new(&bundle);

    let err = explainer.attribute(&[f64::NAN, 1.0], 0).unwrap_err();
    assert!(matches!(err, RiesgoError::Explanation { .. }));
}

#[test]
fn test_exhausted_ladder_is_explanation_error() {
    // Tree family has a single strategy; a malformed vector defeats it
    let bundle = tree_bundle();
    let explainer = Explainer::new(&bundle);

    let err = explainer.attribute(&[1.0], 0).unwrap_err();
    assert!(matches!(err, RiesgoError::Explanation { .. }));
}

#[test]
fn test_top_reasons_orders_by_absolute_value() {
    let order = feature_order(&["a", "b", "c", "d"]);
    let reasons = top_reasons(&[0.1, -0.9, 0.5, -0.2], &order, 3);
    assert_eq!(reasons, vec!["b", "c", "d"]);
}

#[test]
fn test_top_reasons_ties_keep_declaration_order() {
    let order = feature_order(&["a", "b", "c", "d"]);
    let reasons = top_reasons(&[0.5, -0.5, 0.5, 0.1], &order, 4);
    assert_eq!(reasons, vec!["a", "b", "c", "d"]);
}

#[test]
fn test_top_n_is_configurable_and_attribution_stays_full() {
    let bundle = tree_bundle();
    let row: FeatureRow = [("min_temp_c", -11.5), ("mean_aqi", 4.5)]
        .into_iter()
        .collect();

    let explanation = Explainer::new(&bundle)
        .with_top_n(1)
        .explain_row(&row)
        .expect("explains");
    assert_eq!(explanation.top_reasons.len(), 1);
    assert_eq!(explanation.attribution.len(), 2);
}

#[test]
fn test_explanation_wire_contract() {
    let bundle = tree_bundle();
    let row: FeatureRow = [("min_temp_c", -11.5), ("mean_aqi", 4.5)]
        .into_iter()
        .collect();

    let explanation = Explainer::new(&bundle).explain_row(&row).expect("explains");
    let json = serde_json::to_value(&explanation).expect("serialize");

    assert!(json.get("prediction").is_some());
    assert!(json.get("confidence").is_some());
    assert!(json.get("top_reasons").is_some());
    assert!(json.get("shap_values").is_some());
    assert!(json.get("attribution").is_none(), "wire key is shap_values");
}

#[test]
fn test_explain_is_deterministic() {
    let bundle = tree_bundle();
    let row: FeatureRow = [("min_temp_c", -11.5), ("mean_aqi", 4.5)]
        .into_iter()
        .collect();
    let explainer = Explainer::new(&bundle);

    let first = explainer.explain_row(&row).expect("explains");
    let second = explainer.explain_row(&row).expect("explains");
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize"),
    );
}
