//! End-to-end pipeline test: derive features, train both model families,
//! persist the artifact bundle, reload it, and explain predictions.

use riesgo::prelude::*;

/// Deterministic grid of synthetic location-days covering all three risk
/// levels.
fn training_days() -> Vec<DailyAggregates> {
    let mut days = Vec::new();
    for temp_step in 0..11 {
        let min_temp_c = -18.0 + 3.0 * f64::from(temp_step);
        for aqi_step in 0..4 {
            let mean_aqi = 1.0 + f64::from(aqi_step);
            let wind_speed = 2.0 + f64::from((temp_step + aqi_step) % 3) * 3.0;
            days.push(DailyAggregates {
                min_temp_c,
                avg_temp_c: min_temp_c + 6.0,
                wind_speed,
                humidity: 55.0 + 2.0 * f64::from(temp_step),
                mean_aqi,
            });
        }
    }
    days
}

fn training_set() -> (Matrix<f64>, Vec<usize>) {
    let order = canonical_feature_order();
    let days = training_days();
    let mut data = Vec::new();
    let mut labels = Vec::new();
    for day in &days {
        data.extend(day.to_row().to_vector(&order));
        labels.push(day.risk_level().code());
    }
    let x = Matrix::from_vec(days.len(), order.len(), data).expect("consistent dimensions");
    (x, labels)
}

fn severe_day() -> DailyAggregates {
    DailyAggregates {
        min_temp_c: -16.0,
        avg_temp_c: -10.0,
        wind_speed: 8.0,
        humidity: 82.0,
        mean_aqi: 4.0,
    }
}

fn mild_day() -> DailyAggregates {
    DailyAggregates {
        min_temp_c: 8.0,
        avg_temp_c: 14.0,
        wind_speed: 2.0,
        humidity: 50.0,
        mean_aqi: 1.0,
    }
}

#[test]
fn train_save_load_explain_tree_family() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (x, labels) = training_set();

    let mut tree = DecisionTreeClassifier::new().with_max_depth(8);
    tree.fit(&x, &labels).expect("fit succeeds");
    assert!(tree.score(&x, &labels).expect("score") > 0.9);

    let bundle = ArtifactBundle::new(
        ModelArtifact::Tree(tree),
        None,
        LabelMapping::full(),
        canonical_feature_order(),
    );
    bundle.save(dir.path()).expect("save artifacts");

    let service =
        PredictionService::from_dir(dir.path(), ModelFamily::Tree).expect("load artifacts");

    let explanation = service
        .explain_one(&severe_day().to_row(), ModelFamily::Tree)
        .expect("explanation succeeds");
    assert_eq!(explanation.prediction.as_str(), "High");
    assert!(explanation.confidence > 0.5);
    assert_eq!(explanation.attribution.len(), 6);
    assert!(explanation.top_reasons.len() <= 3);

    let calm = service
        .explain_one(&mild_day().to_row(), ModelFamily::Tree)
        .expect("explanation succeeds");
    assert_eq!(calm.prediction.as_str(), "Low");
}

#[test]
fn train_save_load_explain_linear_family() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (x, labels) = training_set();

    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&x).expect("fit_transform");
    let mut model = SoftmaxRegression::new()
        .with_learning_rate(0.3)
        .with_max_iter(3000);
    model.fit(&scaled, &labels).expect("fit succeeds");
    assert!(model.score(&scaled, &labels).expect("score") > 0.6);

    let bundle = ArtifactBundle::new(
        ModelArtifact::Linear(model),
        Some(scaler),
        LabelMapping::full(),
        canonical_feature_order(),
    );
    bundle.save(dir.path()).expect("save artifacts");

    let service =
        PredictionService::from_dir(dir.path(), ModelFamily::Linear).expect("load artifacts");
    assert!(service.bundle().scaler().is_some());

    let explanation = service
        .explain_one(&severe_day().to_row(), ModelFamily::Linear)
        .expect("explanation succeeds");
    assert_eq!(explanation.attribution.len(), 6);
    assert!(explanation.confidence > 0.0 && explanation.confidence <= 1.0);
}

#[test]
fn reloaded_bundle_explains_bit_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (x, labels) = training_set();

    let mut tree = DecisionTreeClassifier::new().with_max_depth(8);
    tree.fit(&x, &labels).expect("fit succeeds");
    ArtifactBundle::new(
        ModelArtifact::Tree(tree),
        None,
        LabelMapping::full(),
        canonical_feature_order(),
    )
    .save(dir.path())
    .expect("save artifacts");

    let first = PredictionService::from_dir(dir.path(), ModelFamily::Tree).expect("load");
    let second = PredictionService::from_dir(dir.path(), ModelFamily::Tree).expect("load");

    let row = severe_day().to_row();
    let a = first.explain_one(&row, ModelFamily::Tree).expect("explain");
    let b = second.explain_one(&row, ModelFamily::Tree).expect("explain");
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).expect("serialize"),
        serde_json::to_string(&b).expect("serialize"),
    );
}

#[test]
fn batch_isolates_bad_rows_across_the_pipeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (x, labels) = training_set();

    let mut tree = DecisionTreeClassifier::new().with_max_depth(8);
    tree.fit(&x, &labels).expect("fit succeeds");
    ArtifactBundle::new(
        ModelArtifact::Tree(tree),
        None,
        LabelMapping::full(),
        canonical_feature_order(),
    )
    .save(dir.path())
    .expect("save artifacts");

    let service = PredictionService::from_dir(dir.path(), ModelFamily::Tree).expect("load");

    let mut bad_row = severe_day().to_row();
    bad_row.insert("wind_chill", f64::INFINITY);

    let rows = vec![severe_day().to_row(), bad_row, mild_day().to_row()];
    let results = service.explain_many(&rows, ModelFamily::Tree);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_some());
    assert!(results[1].is_none());
    assert!(results[2].is_some());
}
