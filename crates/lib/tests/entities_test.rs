//! # Entity Extraction Tests
//!
//! Runs `EntityExtractor::extract` against the gazetteer NER mock.

use dcenrich::{config::NerConfig, EntityExtractor};
use dcenrich_test_utils::{setup_tracing, MockNerModel};

#[tokio::test]
async fn test_empty_text_never_reaches_the_model() {
    setup_tracing();

    let ner = MockNerModel::new().with_entity("Paris", "GPE", None);
    let extractor = EntityExtractor::new(&NerConfig::default());

    assert!(extractor.extract(&ner, "").await.is_empty());
    assert!(extractor.extract(&ner, "   ").await.is_empty());
    assert!(ner.inputs().is_empty());
}

#[tokio::test]
async fn test_scores_outside_unit_interval_are_dropped() {
    setup_tracing();

    let ner = MockNerModel::new()
        .with_entity("Paris", "GPE", Some(1.7))
        .with_entity("Rome", "GPE", Some(-0.2))
        .with_entity("Vienna", "GPE", Some(0.95));
    let extractor = EntityExtractor::new(&NerConfig::default());

    let entities = extractor
        .extract(&ner, "Paris and Rome and Vienna")
        .await;

    let texts: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Vienna"]);
    assert!(entities
        .iter()
        .all(|e| (0.0..=1.0).contains(&e.confidence)));
}
