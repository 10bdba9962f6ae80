//! # Pipeline Integration Tests
//!
//! Runs `EnhancementPipeline` end to end against scripted models and
//! knowledge bases from `dcenrich-test-utils`. No network access is needed.

use dcenrich::{
    BatchItem, EnhancementPipeline, EnrichConfig, EnrichError, EntityCategory, EntityLabel,
    EntityLinker, ModelRegistry, NoopObserver, ProcessingLog, ProgressEvent, ProgressLevel,
    Stage,
};
use dcenrich_test_utils::{
    blank_image, setup_tracing, text_like_image, MockCaptionModel, MockNerModel, MockOcrBackend,
    MockResolver,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const PARIS_WIKIDATA: &str = "http://www.wikidata.org/entity/Q90";
const PARIS_DBPEDIA: &str = "http://dbpedia.org/resource/Paris";

fn test_config() -> EnrichConfig {
    let mut config = EnrichConfig::default();
    config.processing.inter_item_delay_ms = 0;
    config
}

async fn registry_with(
    captioner: MockCaptionModel,
    ocr: Option<MockOcrBackend>,
    ner: MockNerModel,
) -> Arc<ModelRegistry> {
    let registry = ModelRegistry::new();
    registry.captioner.install(Box::new(captioner)).await.unwrap();
    if let Some(ocr) = ocr {
        registry.ocr.install(Box::new(ocr)).await.unwrap();
    }
    registry.ner.install(Box::new(ner)).await.unwrap();
    Arc::new(registry)
}

fn paris_linker() -> (EntityLinker, MockResolver, MockResolver) {
    let wikidata = MockResolver::new("Wikidata").with_uri("Paris", PARIS_WIKIDATA);
    let dbpedia = MockResolver::new("DBpedia").with_uri("Paris", PARIS_DBPEDIA);
    let linker = EntityLinker::new(
        Some(Box::new(wikidata.clone())),
        Some(Box::new(dbpedia.clone())),
    );
    (linker, wikidata, dbpedia)
}

fn stages(log: &ProcessingLog) -> Vec<Option<Stage>> {
    log.entries().into_iter().map(|e| e.stage).collect()
}

#[tokio::test]
async fn test_process_item_end_to_end() {
    setup_tracing();

    let ner = MockNerModel::new().with_entity("Paris", "GPE", None);
    let registry = registry_with(
        MockCaptionModel::new("A vintage photograph of a street in Paris"),
        Some(MockOcrBackend::new("RUE DE\n  RIVOLI   1890\n")),
        ner.clone(),
    )
    .await;
    let (linker, wikidata, _dbpedia) = paris_linker();
    let pipeline = EnhancementPipeline::new(registry, &test_config())
        .unwrap()
        .with_linker(linker);

    let log = ProcessingLog::default();
    let result = pipeline
        .process_item(&text_like_image(64, 48), "vko", "347", &log)
        .await
        .unwrap();

    assert_eq!(
        result.description.as_deref(),
        Some("A vintage photograph of a street in Paris")
    );
    assert_eq!(result.transcription.as_deref(), Some("RUE DE RIVOLI 1890"));
    assert_eq!(
        ner.inputs(),
        vec!["A vintage photograph of a street in Paris RUE DE RIVOLI 1890".to_string()]
    );

    let entities = result.entities();
    assert_eq!(entities.len(), 1);
    let paris = &entities[0];
    assert_eq!(paris.text, "Paris");
    assert_eq!(paris.label, EntityLabel::Gpe);
    assert_eq!((paris.start_offset, paris.end_offset), (36, 41));
    assert_eq!(paris.confidence, 0.8);
    assert_eq!(paris.description.as_deref(), Some("Countries, cities, states"));
    assert_eq!(paris.wikidata_uri.as_deref(), Some(PARIS_WIKIDATA));
    assert_eq!(paris.dbpedia_uri.as_deref(), Some(PARIS_DBPEDIA));
    assert_eq!(
        wikidata.lookups(),
        vec![("Paris".to_string(), EntityCategory::Place)]
    );

    let dc = result.dublin_core.as_ref().unwrap();
    assert_eq!(
        dc["description"],
        "A vintage photograph of a street in Paris | Contains: Paris (Countries, cities, states)"
    );
    assert_eq!(dc["subject"], "Paris");
    assert_eq!(
        dc["subject_uris"],
        format!("{PARIS_WIKIDATA} | {PARIS_DBPEDIA}")
    );
    assert_eq!(dc["type"], "Image;Photograph");
    assert_eq!(dc["coverage"], "Paris");

    assert_eq!(
        stages(&log),
        vec![
            Some(Stage::Captioning),
            Some(Stage::ExtractingText),
            Some(Stage::ExtractingEntities),
            Some(Stage::LinkingEntities),
            Some(Stage::SynthesizingDc),
            Some(Stage::Done),
        ]
    );
    let entries = log.entries();
    assert!(entries[..5].iter().all(|e| e.level == ProgressLevel::Info));
    assert_eq!(entries[0].message, "Generating image description...");
    assert_eq!(entries[5].level, ProgressLevel::Success);
    assert_eq!(entries[5].message, "AI processing completed for vko/347");
}

#[tokio::test]
async fn test_caption_options_follow_config() {
    setup_tracing();

    let captioner = MockCaptionModel::new("a ship");
    let registry = registry_with(captioner.clone(), None, MockNerModel::new()).await;
    let mut config = test_config();
    config.image_captioning.max_length = 40;
    config.image_captioning.num_beams = 2;
    let pipeline = EnhancementPipeline::new(registry, &config)
        .unwrap()
        .with_linker(EntityLinker::default());

    pipeline
        .process_item(&text_like_image(32, 32), "c", "1", &NoopObserver)
        .await
        .unwrap();

    let calls = captioner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].max_length, 40);
    assert_eq!(calls[0].num_beams, 2);
}

#[tokio::test]
async fn test_missing_models_fail_with_model_not_ready() {
    setup_tracing();

    let pipeline = EnhancementPipeline::new(Arc::new(ModelRegistry::new()), &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());
    let log = ProcessingLog::default();

    let err = pipeline
        .process_item(&text_like_image(32, 32), "vko", "1", &log)
        .await
        .unwrap_err();
    assert!(matches!(err, EnrichError::ModelNotReady { model: "caption" }));

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, ProgressLevel::Error);
    assert!(entries[0].message.starts_with("Error processing item vko/1"));
}

#[tokio::test]
async fn test_missing_ner_model_is_reported() {
    setup_tracing();

    let registry = ModelRegistry::new();
    registry
        .captioner
        .install(Box::new(MockCaptionModel::new("a map")))
        .await
        .unwrap();
    let pipeline = EnhancementPipeline::new(Arc::new(registry), &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());

    let err = pipeline
        .process_item(&text_like_image(32, 32), "vko", "2", &NoopObserver)
        .await
        .unwrap_err();
    assert!(matches!(err, EnrichError::ModelNotReady { model: "ner" }));
}

#[tokio::test]
async fn test_missing_caption_model_is_named_when_ner_is_loaded() {
    setup_tracing();

    let registry = ModelRegistry::new();
    registry
        .ner
        .install(Box::new(MockNerModel::new()))
        .await
        .unwrap();
    let pipeline = EnhancementPipeline::new(Arc::new(registry), &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());

    let err = pipeline
        .process_item(&text_like_image(32, 32), "vko", "3", &NoopObserver)
        .await
        .unwrap_err();
    assert!(matches!(err, EnrichError::ModelNotReady { model: "caption" }));
}

#[tokio::test]
async fn test_stage_failures_are_absorbed() {
    setup_tracing();

    let registry = registry_with(
        MockCaptionModel::failing("CUDA out of memory"),
        Some(MockOcrBackend::failing("tesseract crashed")),
        MockNerModel::failing(),
    )
    .await;
    let pipeline = EnhancementPipeline::new(registry, &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());
    let log = ProcessingLog::default();

    let result = pipeline
        .process_item(&text_like_image(32, 32), "vko", "3", &log)
        .await
        .unwrap();

    assert!(result.is_empty());
    assert!(result.description.is_none());
    assert!(result.transcription.is_none());
    assert!(result.entities.is_none());
    assert!(result.dublin_core.is_none());

    let stats = log.stats();
    assert_eq!(stats.total, 6);
    assert_eq!(stats.info, 5);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.error, 0);
}

#[tokio::test]
async fn test_entities_from_ocr_when_caption_fails() {
    setup_tracing();

    let registry = registry_with(
        MockCaptionModel::failing("timeout"),
        Some(MockOcrBackend::new("Letter from Vanderbilt University")),
        MockNerModel::new().with_entity("Vanderbilt University", "ORG", Some(0.93)),
    )
    .await;
    let pipeline = EnhancementPipeline::new(registry, &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());

    let result = pipeline
        .process_item(&text_like_image(40, 40), "letters", "12", &NoopObserver)
        .await
        .unwrap();

    assert!(result.description.is_none());
    let entities = result.entities();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].label, EntityLabel::Org);
    assert_eq!((entities[0].start_offset, entities[0].end_offset), (12, 33));
    assert!(entities[0].wikidata_uri.is_none());

    let dc = result.dublin_core.unwrap();
    assert_eq!(
        dc["description"],
        "Contains: Vanderbilt University (Companies, agencies, institutions, etc.)"
    );
    assert_eq!(dc["subject"], "Vanderbilt University");
    assert!(!dc.contains_key("type"));
    assert!(!dc.contains_key("coverage"));
    assert!(!dc.contains_key("subject_uris"));
}

#[tokio::test]
async fn test_low_confidence_entities_are_dropped() {
    setup_tracing();

    let ner = MockNerModel::new()
        .with_entity("Edison", "PERSON", Some(0.69))
        .with_entity("Menlo Park", "GPE", Some(0.7));
    let registry = registry_with(
        MockCaptionModel::new("Edison standing in Menlo Park"),
        None,
        ner,
    )
    .await;
    let pipeline = EnhancementPipeline::new(registry, &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());

    let result = pipeline
        .process_item(&text_like_image(32, 32), "c", "4", &NoopObserver)
        .await
        .unwrap();

    let texts: Vec<&str> = result.entities().iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Menlo Park"]);
}

#[tokio::test]
async fn test_disabled_ocr_never_calls_backend() {
    setup_tracing();

    let ocr = MockOcrBackend::new("should not be read");
    let registry = registry_with(
        MockCaptionModel::new("a poster"),
        Some(ocr.clone()),
        MockNerModel::new(),
    )
    .await;
    let mut config = test_config();
    config.ocr.enabled = false;
    let pipeline = EnhancementPipeline::new(registry, &config)
        .unwrap()
        .with_linker(EntityLinker::default());
    let log = ProcessingLog::default();

    let result = pipeline
        .process_item(&text_like_image(32, 32), "c", "5", &log)
        .await
        .unwrap();

    assert!(result.transcription.is_none());
    assert_eq!(ocr.call_count(), 0);
    // The stage is still announced.
    assert_eq!(log.stats().total, 6);
}

#[tokio::test]
async fn test_blank_page_skips_ocr_backend() {
    setup_tracing();

    let ocr = MockOcrBackend::new("phantom text");
    let registry = registry_with(
        MockCaptionModel::new("an empty sheet of paper"),
        Some(ocr.clone()),
        MockNerModel::new(),
    )
    .await;
    let pipeline = EnhancementPipeline::new(registry, &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());

    let result = pipeline
        .process_item(&blank_image(32, 32), "c", "6", &NoopObserver)
        .await
        .unwrap();

    assert!(result.transcription.is_none());
    assert_eq!(ocr.call_count(), 0);
    assert_eq!(result.dublin_core.unwrap()["type"], "Image");
}

#[tokio::test]
async fn test_whitespace_only_ocr_is_absent() {
    setup_tracing();

    let registry = registry_with(
        MockCaptionModel::new("a drawing"),
        Some(MockOcrBackend::new(" \n\t \n")),
        MockNerModel::new(),
    )
    .await;
    let pipeline = EnhancementPipeline::new(registry, &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());

    let result = pipeline
        .process_item(&text_like_image(32, 32), "c", "7", &NoopObserver)
        .await
        .unwrap();

    assert!(result.transcription.is_none());
}

#[tokio::test]
async fn test_linking_failures_leave_uris_absent() {
    setup_tracing();

    let registry = registry_with(
        MockCaptionModel::new("A painting of the Seine"),
        None,
        MockNerModel::new().with_entity("Seine", "LOC", None),
    )
    .await;
    let linker = EntityLinker::new(
        Some(Box::new(MockResolver::failing("Wikidata"))),
        Some(Box::new(MockResolver::new("DBpedia"))),
    );
    let pipeline = EnhancementPipeline::new(registry, &test_config())
        .unwrap()
        .with_linker(linker);

    let result = pipeline
        .process_item(&text_like_image(32, 32), "c", "8", &NoopObserver)
        .await
        .unwrap();

    let seine = &result.entities()[0];
    assert!(seine.wikidata_uri.is_none());
    assert!(seine.dbpedia_uri.is_none());

    let dc = result.dublin_core.unwrap();
    assert!(!dc.contains_key("subject_uris"));
    assert_eq!(dc["coverage"], "Seine");
    assert_eq!(dc["type"], "Image;Artwork");
}

#[tokio::test]
async fn test_panicking_observer_does_not_change_result() {
    setup_tracing();

    let registry = registry_with(
        MockCaptionModel::new("A vintage photograph of a street in Paris"),
        None,
        MockNerModel::new().with_entity("Paris", "GPE", None),
    )
    .await;
    let (linker, _, _) = paris_linker();
    let pipeline = EnhancementPipeline::new(registry, &test_config())
        .unwrap()
        .with_linker(linker);

    let quiet = pipeline
        .process_item(&text_like_image(32, 32), "vko", "9", &NoopObserver)
        .await
        .unwrap();
    let observer = |event: &ProgressEvent| {
        if event.stage == Some(Stage::ExtractingEntities) {
            panic!("observer failure");
        }
    };
    let noisy = pipeline
        .process_item(&text_like_image(32, 32), "vko", "9", &observer)
        .await
        .unwrap();

    assert_eq!(quiet, noisy);
}

#[tokio::test]
async fn test_batch_reports_in_order() {
    setup_tracing();

    let registry = registry_with(
        MockCaptionModel::new("a photo of Paris"),
        None,
        MockNerModel::new().with_entity("Paris", "GPE", None),
    )
    .await;
    let pipeline = EnhancementPipeline::new(registry, &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());
    let log = ProcessingLog::default();

    let items = vec![
        BatchItem::new(text_like_image(32, 32), "vko", "1"),
        BatchItem::new(text_like_image(32, 32), "vko", "2"),
        BatchItem::new(blank_image(32, 32), "maps", "1"),
    ];
    let report = pipeline.process_batch(items, &log).await;

    let keys: Vec<&str> = report.results.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["vko/1", "vko/2", "maps/1"]);
    assert!(report.failed.is_empty());
    assert_eq!(
        report.get("maps/1").unwrap().description.as_deref(),
        Some("a photo of Paris")
    );

    let entries = log.entries();
    assert_eq!(entries.len(), 3 * 7);
    assert_eq!(entries[0].message, "Processing item 1/3: vko/1");
    assert_eq!(entries[7].message, "Processing item 2/3: vko/2");
    assert_eq!(entries[14].message, "Processing item 3/3: maps/1");
    assert_eq!(log.stats().success, 3);
}

#[tokio::test]
async fn test_batch_without_models_marks_every_item_failed() {
    setup_tracing();

    let pipeline = EnhancementPipeline::new(Arc::new(ModelRegistry::new()), &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());
    let log = ProcessingLog::default();

    let items = vec![
        BatchItem::new(text_like_image(16, 16), "vko", "1"),
        BatchItem::new(text_like_image(16, 16), "vko", "2"),
    ];
    let report = pipeline.process_batch(items, &log).await;

    assert!(report.results.is_empty());
    assert_eq!(report.failed, vec!["vko/1".to_string(), "vko/2".to_string()]);
    assert_eq!(log.stats().error, 2);
}

#[tokio::test]
async fn test_empty_batch_is_empty_report() {
    let registry = registry_with(MockCaptionModel::new("x"), None, MockNerModel::new()).await;
    let pipeline = EnhancementPipeline::new(registry, &test_config())
        .unwrap()
        .with_linker(EntityLinker::default());

    let report = pipeline.process_batch(Vec::new(), &NoopObserver).await;
    assert!(report.results.is_empty());
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_batch_pauses_between_items() {
    setup_tracing();

    let registry = registry_with(MockCaptionModel::new("x"), None, MockNerModel::new()).await;
    let mut config = test_config();
    config.processing.inter_item_delay_ms = 50;
    let pipeline = EnhancementPipeline::new(registry, &config)
        .unwrap()
        .with_linker(EntityLinker::default());

    let items = (1..=3)
        .map(|i| BatchItem::new(blank_image(8, 8), "c", i.to_string()))
        .collect();
    let started = Instant::now();
    let report = pipeline.process_batch(items, &NoopObserver).await;

    assert_eq!(report.results.len(), 3);
    assert!(started.elapsed() >= Duration::from_millis(100));
}
