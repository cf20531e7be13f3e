//! Integration tests for the evaluation harness.
//!
//! These tests split a small book dataset, fit the real models, and check
//! that scoring, selection and ensembling work together.

use data_loader::Interaction;
use evaluation::{
    compute_ensemble_weights, ensemble_recommend, select_best_model, train_test_split, Evaluator,
    Metric, Task, DEFAULT_ENSEMBLE_DEPTH,
};
use models::{CfConfig, ItemCf, MatrixFactorization, MfConfig, ModelKind, Recommender, UserCf};

fn create_dataset() -> Vec<Interaction> {
    let ratings: [(&str, &str, Option<f64>, Option<f64>); 24] = [
        ("u1", "B1", Some(5.0), Some(3.0)),
        ("u1", "B2", Some(4.0), None),
        ("u1", "B3", Some(1.0), None),
        ("u1", "B4", None, Some(2.0)),
        ("u1", "B5", Some(4.5), Some(4.0)),
        ("u2", "B1", Some(4.0), None),
        ("u2", "B2", Some(5.0), Some(5.0)),
        ("u2", "B3", Some(2.0), None),
        ("u2", "B6", Some(3.0), Some(1.0)),
        ("u2", "B5", Some(4.0), None),
        ("u3", "B3", Some(5.0), Some(4.0)),
        ("u3", "B4", Some(4.0), None),
        ("u3", "B1", Some(1.0), None),
        ("u3", "B6", Some(4.5), Some(2.0)),
        ("u3", "B2", Some(2.0), None),
        ("u4", "B2", Some(4.0), Some(1.0)),
        ("u4", "B5", Some(5.0), None),
        ("u4", "B1", Some(4.5), None),
        ("u4", "B6", None, Some(3.0)),
        ("u5", "B3", Some(4.0), None),
        ("u5", "B4", Some(5.0), Some(5.0)),
        ("u5", "B6", Some(4.0), None),
        ("u5", "B1", Some(2.0), None),
        ("u6", "B2", Some(3.0), None),
    ];
    ratings
        .into_iter()
        .map(|(user, item, rating, implicit)| Interaction {
            user_id: user.to_string(),
            item_id: item.to_string(),
            rating,
            implicit_score: implicit,
            item_name: None,
        })
        .collect()
}

#[test]
fn test_full_evaluation_round() {
    let data = create_dataset();
    let split = train_test_split(&data, 0.2, 42).unwrap();

    // u6 has a single interaction: it must be held out entirely
    assert!(split.train.iter().all(|r| r.user_id != "u6"));
    assert!(split.test.iter().any(|r| r.user_id == "u6"));

    let user_cf = UserCf::fit(&split.train, CfConfig::default());
    let item_cf = ItemCf::fit(&split.train, CfConfig::default());
    let mf = MatrixFactorization::fit(&split.train, MfConfig::default().with_iterations(20)).unwrap();
    let models: [&dyn Recommender; 3] = [&user_cf, &item_cf, &mf];

    let metrics = Evaluator::new(3).evaluate_models(&models, &split);
    assert_eq!(metrics.len(), 3);
    for (kind, record) in &metrics {
        for metric in [Metric::PrecisionAtK, Metric::RecallAtK, Metric::NdcgAtK] {
            let value = record.get(metric).unwrap_or_else(|| panic!("{kind} missing {metric}"));
            assert!((0.0..=1.0).contains(&value));
        }
        if let Some(rmse) = record.get(Metric::Rmse) {
            assert!(rmse >= 0.0);
        }
    }

    let best = select_best_model(&metrics, Metric::NdcgAtK, Task::Ranking).unwrap();
    let best_ndcg = metrics[&best].get(Metric::NdcgAtK).unwrap();
    for record in metrics.values() {
        assert!(record.get(Metric::NdcgAtK).unwrap() <= best_ndcg);
    }

    let weights = compute_ensemble_weights(&metrics);
    assert!((weights.values().sum::<f64>() - 1.0).abs() < 1e-9);

    let recs = ensemble_recommend(&models, "u1", 4, &weights, DEFAULT_ENSEMBLE_DEPTH);
    assert!(recs.len() <= 4);
    for pair in recs.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_single_interaction_user_never_panics() {
    let data = create_dataset();
    let split = train_test_split(&data, 0.2, 42).unwrap();

    let user_cf = UserCf::fit(&split.train, CfConfig::default());
    let item_cf = ItemCf::fit(&split.train, CfConfig::default());
    let mf = MatrixFactorization::fit(&split.train, MfConfig::default()).unwrap();

    // u6 never appears in train
    assert_eq!(user_cf.predict_rating("u6", "B2"), None);
    assert_eq!(item_cf.predict_rating("u6", "B2"), None);
    assert_eq!(mf.predict_rating("u6", "B2"), None);
    assert!(Recommender::recommend_top_n(&mf, "u6", 5).unwrap().is_empty());
}

#[test]
fn test_recommendations_respect_contract() {
    let data = create_dataset();
    let user_cf = UserCf::fit(&data, CfConfig::default());
    let item_cf = ItemCf::fit(&data, CfConfig::default());
    let mf = MatrixFactorization::fit(&data, MfConfig::default()).unwrap();
    let models: [&dyn Recommender; 3] = [&user_cf, &item_cf, &mf];

    for model in models {
        for user in ["u1", "u2", "u3", "u4", "u5", "u6"] {
            let recs = model.recommend_top_n(user, 3).unwrap();
            assert!(recs.len() <= 3);
            for rec in &recs {
                assert!((0.0..=1.0).contains(&rec.score), "{} score out of range", model.kind());
                let explicitly_rated = data
                    .iter()
                    .any(|r| r.user_id == user && r.item_id == rec.item_id && r.rating.is_some());
                assert!(!explicitly_rated, "{} recommended a rated item", model.kind());
            }
            for pair in recs.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
    }
    assert_eq!(models[0].kind(), ModelKind::UserCf);
}
