// Integration tests for Whiff
use std::collections::HashMap;
use std::sync::Arc;
use whiff::{
    catalog_from_records, ArtifactStore, Artifacts, CatalogItem, EmotionProbabilities, Error, ItemId,
    NoteVectorizer, RatingInput, Recommender, RecommenderConfig, TrainingConfig, TrainingRecord,
    UserContext,
};
use whiff_similarity::{emotion_scores, NotePreference, Reranker, Stage1Selector};

fn dataset() -> Vec<TrainingRecord> {
    let json = r#"[
        {"id": 1, "name": "Velvet Rose", "brand": "A", "notes": "rose, vanilla, musk",
         "gender": "female", "season": "spring", "time": "day", "impression": "romantic",
         "activity": "date", "weather": "sunny", "emotion_cluster": 0},
        {"id": 2, "name": "Night Oud", "brand": "B", "notes": "oud, smoke, leather",
         "gender": "male", "season": "winter", "time": "night", "impression": "bold",
         "activity": "party", "weather": "cold", "emotion_cluster": 1},
        {"id": 3, "name": "Citrus Day", "brand": "C", "notes": ["citrus", "bergamot", "neroli"],
         "gender": "unisex", "season": "summer", "time": "day", "impression": "fresh",
         "activity": "work", "weather": "hot", "emotion_cluster": 2},
        {"id": 4, "name": "Amber Calm", "brand": "D", "notes": "amber, sandalwood",
         "gender": "unisex", "season": "autumn", "time": "night", "impression": "calm",
         "activity": "rest", "weather": "rainy", "emotion_cluster": 3},
        {"id": 5, "name": "Green Walk", "brand": "E", "notes": "vetiver, green tea, mint",
         "gender": "male", "season": "spring", "time": "day", "impression": "natural",
         "activity": "walk", "weather": "cloudy", "emotion_cluster": 4},
        {"id": 6, "name": "Sugar Pop", "brand": "F", "notes": "caramel, vanilla, praline",
         "gender": "female", "season": "winter", "time": "day", "impression": "playful",
         "activity": "party", "weather": "cold", "emotion_cluster": 5}
    ]"#;
    let base: Vec<TrainingRecord> = serde_json::from_str(json).unwrap();
    base.iter().cycle().take(48).cloned().collect()
}

fn config() -> TrainingConfig {
    TrainingConfig {
        hidden_units: 16,
        epochs: 5,
        ..TrainingConfig::default()
    }
}

fn recommender() -> (Recommender, Vec<CatalogItem>) {
    let records = dataset();
    let (artifacts, _) = Artifacts::fit(&records, &config()).unwrap();
    let catalog = catalog_from_records(&records[..6]);
    (Recommender::with_defaults(Arc::new(artifacts)).unwrap(), catalog)
}

fn context() -> UserContext {
    serde_json::from_str(
        r#"{"gender": "Female", "season_tags": "Spring", "time_tags": "Day",
            "desired_impression": "Romantic", "activity": "date", "weather": "sunny"}"#,
    )
    .unwrap()
}

#[test]
fn test_train_save_load_recommend() {
    let records = dataset();
    let (artifacts, report) = Artifacts::fit(&records, &config()).unwrap();
    assert_eq!(report.epochs.len(), 5);
    assert!(report.evaluation.accuracy >= 0.0 && report.evaluation.accuracy <= 1.0);

    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("whiff.bin"));
    store.save(&artifacts).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, artifacts);

    let recommender = Recommender::with_defaults(Arc::new(loaded)).unwrap();
    let catalog = catalog_from_records(&records[..6]);
    let stage1 = recommender.score_stage1(&context(), &catalog).unwrap();
    assert!(stage1.probabilities.is_valid());
    assert_eq!(stage1.selection.selected.len(), 6);

    let ratings: HashMap<String, RatingInput> = stage1
        .selection
        .surfaced_notes
        .iter()
        .map(|note| (note.clone(), RatingInput::from(4)))
        .collect();
    let results = recommender.score_stage2(&catalog, &stage1, &ratings).unwrap();
    assert_eq!(results.len(), 6);
    for pair in results.windows(2) {
        assert!(pair[0].final_score >= pair[1].final_score);
    }
}

#[test]
fn test_probabilities_are_distributions() {
    let (recommender, catalog) = recommender();
    for impression in ["romantic", "bold", "fresh", "unheard-of"] {
        let ctx = UserContext {
            impression: Some(impression.to_string()),
            ..context()
        };
        let stage1 = recommender.score_stage1(&ctx, &catalog).unwrap();
        let probs = stage1.probabilities.as_slice();
        assert_eq!(probs.len(), 6);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!((probs.iter().sum::<f32>() - 1.0).abs() <= 1e-6);
    }
}

#[test]
fn test_duplicate_items_scenario() {
    let catalog = vec![
        CatalogItem::new(1, "rose, vanilla", 0),
        CatalogItem::new(2, "rose, vanilla", 0),
        CatalogItem::new(3, "oud, smoke", 1),
    ];
    let probs = EmotionProbabilities::new(vec![0.9, 0.1, 0.0, 0.0, 0.0, 0.0]);
    let vectorizer = NoteVectorizer::fit_items(&catalog);
    let vectors = vectorizer.transform_catalog(&catalog);

    assert_eq!(emotion_scores(&probs, &catalog).unwrap(), vec![0.9, 0.9, 0.1]);

    let selection = Stage1Selector::default()
        .select(&probs, &catalog, &vectors, &vectorizer)
        .unwrap();
    let ids: Vec<&ItemId> = selection.selected.iter().map(|s| &s.item_id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&&ItemId::Integer(3)));
    assert_eq!(
        ids.iter()
            .filter(|id| ***id == ItemId::Integer(1) || ***id == ItemId::Integer(2))
            .count(),
        1
    );
}

#[test]
fn test_empty_ratings_zero_note_score() {
    let (recommender, catalog) = recommender();
    let stage1 = recommender.score_stage1(&context(), &catalog).unwrap();
    let results = recommender.score_stage2(&catalog, &stage1, &HashMap::new()).unwrap();
    assert!(results.iter().all(|r| r.note_score == 0.0));
}

#[test]
fn test_single_item_catalog() {
    let (recommender, _) = recommender();
    let catalog = vec![CatalogItem::new(42, "amber", 3)];
    let stage1 = recommender.score_stage1(&context(), &catalog).unwrap();
    assert_eq!(stage1.selection.selected.len(), 1);

    let results = recommender.score_stage2(&catalog, &stage1, &HashMap::new()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].item_id, ItemId::Integer(42));
}

#[test]
fn test_stage2_is_idempotent() {
    let (recommender, catalog) = recommender();
    let stage1 = recommender.score_stage1(&context(), &catalog).unwrap();
    let ratings = HashMap::from([
        ("rose".to_string(), RatingInput::from(5)),
        ("oud".to_string(), RatingInput::from(-3)),
        ("vanilla".to_string(), RatingInput::from("four")),
    ]);
    let first = recommender.score_stage2(&catalog, &stage1, &ratings).unwrap();
    let second = recommender.score_stage2(&catalog, &stage1, &ratings).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_large_catalog_limits() {
    let (recommender, _) = recommender();
    let notes = ["rose", "oud", "citrus", "amber", "vetiver", "caramel", "musk", "smoke"];
    let catalog: Vec<CatalogItem> = (0..40)
        .map(|i| {
            let a = notes[i % notes.len()];
            let b = notes[(i / notes.len() + i + 1) % notes.len()];
            CatalogItem::new(i as u64, &format!("{}, {}", a, b), i % 6)
        })
        .collect();

    let stage1 = recommender.score_stage1(&context(), &catalog).unwrap();
    assert!(stage1.selection.selected.len() <= 10);
    assert!(stage1.selection.surfaced_notes.len() <= 15);

    let vectorizer = &recommender.artifacts().vectorizer;
    let vectors = vectorizer.transform_catalog(&catalog);
    for (i, a) in stage1.selection.selected.iter().enumerate() {
        for b in &stage1.selection.selected[i + 1..] {
            assert!(vectors[a.index].cosine_similarity(&vectors[b.index]) < 0.95);
        }
    }

    let results = recommender.score_stage2(&catalog, &stage1, &HashMap::new()).unwrap();
    assert_eq!(results.len(), 10);
}

#[test]
fn test_note_score_monotonicity() {
    let catalog = vec![
        CatalogItem::new(1, "rose", 0),
        CatalogItem::new(2, "rose, rose, vanilla", 0),
        CatalogItem::new(3, "oud", 0),
    ];
    let vectorizer = NoteVectorizer::fit_items(&catalog);
    let vectors = vectorizer.transform_catalog(&catalog);
    let probs = EmotionProbabilities::new(vec![0.5, 0.1, 0.1, 0.1, 0.1, 0.1]);
    let scores = emotion_scores(&probs, &catalog).unwrap();
    let selection = Stage1Selector::default()
        .select(&probs, &catalog, &vectors, &vectorizer)
        .unwrap();
    let preference = NotePreference::from_answers(
        &selection.surfaced_notes,
        &HashMap::from([("rose".to_string(), RatingInput::from(5))]),
    );

    let reranker = Reranker::default();
    let scored = reranker
        .score(&catalog, &vectors, &scores, &selection, &preference, &vectorizer)
        .unwrap();
    // equal emotion and bonus, so final order follows note order
    let mut by_note = scored.clone();
    by_note.sort_by(|a, b| a.note_score.partial_cmp(&b.note_score).unwrap());
    for pair in by_note.windows(2) {
        assert!(pair[0].final_score <= pair[1].final_score);
    }
}

#[test]
fn test_invalid_context_is_typed_error() {
    let (recommender, catalog) = recommender();
    let ctx = UserContext {
        weather: None,
        ..context()
    };
    assert!(matches!(
        recommender.score_stage1(&ctx, &catalog),
        Err(Error::InvalidContext(whiff::ContextField::Weather))
    ));
}

#[test]
fn test_cluster_out_of_range_is_typed_error() {
    let (recommender, _) = recommender();
    let catalog = vec![CatalogItem::new(1, "rose", 6)];
    assert!(matches!(
        recommender.score_stage1(&context(), &catalog),
        Err(Error::ClusterOutOfRange { cluster: 6, .. })
    ));
}

#[test]
fn test_custom_result_limit() {
    let records = dataset();
    let (artifacts, _) = Artifacts::fit(&records, &config()).unwrap();
    let mut cfg = RecommenderConfig::default();
    cfg.rerank.result_limit = 3;
    let recommender = Recommender::new(Arc::new(artifacts), cfg).unwrap();
    let catalog = catalog_from_records(&records[..6]);

    let stage1 = recommender.score_stage1(&context(), &catalog).unwrap();
    let results = recommender.score_stage2(&catalog, &stage1, &HashMap::new()).unwrap();
    assert_eq!(results.len(), 3);
}
