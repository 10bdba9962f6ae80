//! # Enhancement Pipeline
//!
//! Sequences the enrichment stages over one image:
//! caption → OCR → NER (over caption + OCR text) → entity linking → Dublin Core.
//!
//! Stages run strictly in order because each consumes the previous outputs.
//! A stage that fails leaves its field absent and the item moves on; the only
//! error `process_item` returns is `ModelNotReady`, raised before any stage
//! runs. The pipeline holds no per-item state, so one instance can serve
//! concurrent `process_item` calls on different images.

use crate::{
    caption::CaptionGenerator,
    config::EnrichConfig,
    dublin_core::synthesize,
    entities::{combine_text, EntityExtractor},
    errors::EnrichError,
    linking::EntityLinker,
    models::ModelRegistry,
    ocr::TextExtractor,
    progress::{emit, ProgressEvent, ProgressLevel, ProgressObserver, Stage},
    types::{EnrichmentResult, Image},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// One unit of batch work. The collection and item id are only used for
/// logging and for keying the report.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub image: Image,
    pub collection: String,
    pub item_id: String,
}

impl BatchItem {
    pub fn new(image: Image, collection: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            image,
            collection: collection.into(),
            item_id: item_id.into(),
        }
    }

    /// `"{collection}/{item_id}"`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.collection, self.item_id)
    }
}

/// The result of one successfully processed batch item.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub key: String,
    #[serde(flatten)]
    pub result: EnrichmentResult,
}

/// Outcome of `process_batch`, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub results: Vec<BatchEntry>,
    /// Keys of items that produced no result.
    pub failed: Vec<String>,
}

impl BatchReport {
    pub fn get(&self, key: &str) -> Option<&EnrichmentResult> {
        self.results
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.result)
    }
}

/// Orchestrates the enrichment stages against a shared `ModelRegistry`.
#[derive(Debug, Clone)]
pub struct EnhancementPipeline {
    models: Arc<ModelRegistry>,
    captioner: CaptionGenerator,
    text_extractor: TextExtractor,
    entity_extractor: EntityExtractor,
    linker: EntityLinker,
    ocr_enabled: bool,
    inter_item_delay: Duration,
}

impl EnhancementPipeline {
    /// Builds a pipeline whose stages and resolvers follow `config`.
    pub fn new(models: Arc<ModelRegistry>, config: &EnrichConfig) -> Result<Self, EnrichError> {
        let linker = EntityLinker::from_config(&config.ner, &config.linking)?;
        Ok(Self {
            models,
            captioner: CaptionGenerator::new(&config.image_captioning),
            text_extractor: TextExtractor::new(&config.ocr),
            entity_extractor: EntityExtractor::new(&config.ner),
            linker,
            ocr_enabled: config.ocr.enabled,
            inter_item_delay: config.processing.inter_item_delay(),
        })
    }

    /// Replaces the entity linker, e.g. to point the resolvers elsewhere.
    pub fn with_linker(mut self, linker: EntityLinker) -> Self {
        self.linker = linker;
        self
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    fn announce(observer: &dyn ProgressObserver, stage: Stage) {
        emit(
            observer,
            ProgressEvent::new(ProgressLevel::Info, stage.message(), Some(stage)),
        );
    }

    /// Enriches a single image.
    ///
    /// Returns `ModelNotReady` if the caption or NER model is not loaded;
    /// otherwise always returns a (possibly empty) result.
    pub async fn process_item(
        &self,
        image: &Image,
        collection: &str,
        item_id: &str,
        observer: &dyn ProgressObserver,
    ) -> Result<EnrichmentResult, EnrichError> {
        let ready = self.models.ensure_ready().and_then(|()| {
            let captioner = self.models.captioner.get().ok_or(EnrichError::ModelNotReady {
                model: self.models.captioner.name(),
            })?;
            let ner = self.models.ner.get().ok_or(EnrichError::ModelNotReady {
                model: self.models.ner.name(),
            })?;
            Ok((captioner, ner))
        });
        let (captioner, ner) = match ready {
            Ok(models) => models,
            Err(e) => {
                error!(collection = %collection, item_id = %item_id, "AI models not loaded: {e}");
                emit(
                    observer,
                    ProgressEvent::new(
                        ProgressLevel::Error,
                        format!("Error processing item {collection}/{item_id}: {e}"),
                        Some(Stage::Pending),
                    ),
                );
                return Err(e);
            }
        };

        let mut result = EnrichmentResult::default();

        // 1. Image captioning
        Self::announce(observer, Stage::Captioning);
        result.description = self.captioner.generate(captioner.as_ref(), image).await;

        // 2. OCR text extraction
        Self::announce(observer, Stage::ExtractingText);
        let ocr = if self.ocr_enabled {
            self.models.ocr.get()
        } else {
            None
        };
        result.transcription = self.text_extractor.extract(ocr.as_deref(), image).await;

        // 3. Named entity recognition over caption + transcription
        Self::announce(observer, Stage::ExtractingEntities);
        let text = combine_text(
            result.description.as_deref(),
            result.transcription.as_deref(),
        );
        let mut entities = self.entity_extractor.extract(ner.as_ref(), &text).await;

        // 4. Linked data
        Self::announce(observer, Stage::LinkingEntities);
        self.linker.link_all(&mut entities).await;
        if !entities.is_empty() {
            result.entities = Some(entities);
        }

        // 5. Dublin Core
        Self::announce(observer, Stage::SynthesizingDc);
        let dublin_core = synthesize(&result);
        if !dublin_core.is_empty() {
            result.dublin_core = Some(dublin_core);
        }

        emit(
            observer,
            ProgressEvent::new(
                ProgressLevel::Success,
                format!("AI processing completed for {collection}/{item_id}"),
                Some(Stage::Done),
            ),
        );
        info!("Successfully processed item {collection}/{item_id}");
        Ok(result)
    }

    /// Processes items one at a time, pausing between them to spare the
    /// linked-data services. There is no internal concurrency.
    pub async fn process_batch(
        &self,
        items: Vec<BatchItem>,
        observer: &dyn ProgressObserver,
    ) -> BatchReport {
        let total = items.len();
        let mut report = BatchReport::default();

        for (index, item) in items.into_iter().enumerate() {
            if index > 0 && !self.inter_item_delay.is_zero() {
                tokio::time::sleep(self.inter_item_delay).await;
            }

            let key = item.key();
            emit(
                observer,
                ProgressEvent::new(
                    ProgressLevel::Info,
                    format!("Processing item {}/{total}: {key}", index + 1),
                    None,
                ),
            );

            match self
                .process_item(&item.image, &item.collection, &item.item_id, observer)
                .await
            {
                Ok(result) => report.results.push(BatchEntry { key, result }),
                Err(e) => {
                    warn!("Item {key} produced no result: {e}");
                    report.failed.push(key);
                }
            }
        }

        info!(
            "Batch processed {} items successfully ({} failed)",
            report.results.len(),
            report.failed.len()
        );
        report
    }
}
