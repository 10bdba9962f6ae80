//! # Entity Extraction Stage
//!
//! Runs the NER model over the combined caption and OCR text, assigns a
//! confidence to every span and drops the ones below the configured
//! threshold.

use crate::{
    config::NerConfig,
    providers::{NerModel, RawEntity},
    types::{EntityLabel, EntityMatch},
};
use tracing::{debug, error, info};

/// Finds named-entity spans in text.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    confidence_threshold: f32,
    default_confidence: f32,
}

impl EntityExtractor {
    pub fn new(config: &NerConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            default_confidence: config.default_confidence,
        }
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Returns the entities found in `text`, in the order the model emitted
    /// them. Empty input, a model failure, or no surviving spans all yield an
    /// empty list.
    pub async fn extract(&self, model: &dyn NerModel, text: &str) -> Vec<EntityMatch> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let spans = match model.recognize(text).await {
            Ok(spans) => spans,
            Err(e) => {
                error!("Error extracting entities: {e}");
                return Vec::new();
            }
        };

        let entities: Vec<EntityMatch> = spans
            .into_iter()
            .filter_map(|span| self.accept(span))
            .collect();

        info!("Extracted {} named entities", entities.len());
        entities
    }

    /// Builds an `EntityMatch` from a raw span, or `None` if its confidence is
    /// outside [0, 1] or strictly below the threshold.
    fn accept(&self, span: RawEntity) -> Option<EntityMatch> {
        let confidence = span.score.unwrap_or(self.default_confidence);
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            debug!(
                "Skipping entity '{}' with malformed confidence {confidence}",
                span.text
            );
            return None;
        }
        if confidence < self.confidence_threshold {
            debug!(
                "Skipping low-confidence entity '{}' ({confidence:.2} < {:.2})",
                span.text, self.confidence_threshold
            );
            return None;
        }

        let label = EntityLabel::parse(&span.label);
        Some(EntityMatch {
            description: label.explain().map(str::to_string),
            text: span.text,
            label,
            start_offset: span.start,
            end_offset: span.end,
            confidence,
            wikidata_uri: None,
            dbpedia_uri: None,
        })
    }
}

/// Joins the caption and transcription, in that order, skipping absent ones.
pub fn combine_text(description: Option<&str>, transcription: Option<&str>) -> String {
    [description, transcription]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}
