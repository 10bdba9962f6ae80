//! # Enrichment Configuration
//!
//! Typed configuration consumed by the pipeline stages. Every field has a
//! default so that an empty document (or no document at all) yields a usable
//! configuration. Loading from files and the environment is left to the host;
//! see the `dcenrich-cli` crate.

use crate::constants::{
    DBPEDIA_SPOTLIGHT_ENDPOINT, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_ENTITY_CONFIDENCE,
    DEFAULT_INTER_ITEM_DELAY_MS, DEFAULT_LINK_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    WIKIDATA_SPARQL_ENDPOINT,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnrichConfig {
    pub image_captioning: CaptionConfig,
    pub ocr: OcrConfig,
    pub ner: NerConfig,
    pub linking: LinkingConfig,
    pub processing: ProcessingConfig,
}

/// Settings for the captioning model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptionConfig {
    pub model_name: String,
    /// OpenAI-compatible endpoint serving the vision model.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub max_length: u32,
    pub num_beams: u32,
    /// Sampling temperature. Captions are intentionally non-deterministic.
    pub temperature: f32,
    /// Longest image side sent to the model, in pixels.
    pub input_size: u32,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            model_name: "Salesforce/blip-image-captioning-base".to_string(),
            api_url: None,
            api_key: None,
            max_length: 100,
            num_beams: 4,
            temperature: 0.7,
            input_size: 384,
        }
    }
}

/// Settings for OCR preprocessing and the OCR backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    pub enabled: bool,
    pub engine: String,
    pub lang: String,
    /// Tesseract page segmentation mode.
    pub psm: u8,
    pub tesseract_path: String,
    /// Radius of the median filter used for denoising. 0 disables it.
    pub denoise_radius: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: "tesseract".to_string(),
            lang: "eng".to_string(),
            psm: 6,
            tesseract_path: "tesseract".to_string(),
            denoise_radius: 1,
        }
    }
}

/// Settings for named-entity recognition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NerConfig {
    pub model: String,
    /// REST endpoint of the NER service.
    pub api_url: Option<String>,
    pub confidence_threshold: f32,
    pub default_confidence: f32,
    pub enable_wikidata: bool,
    pub enable_dbpedia: bool,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            model: "en_core_web_sm".to_string(),
            api_url: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            default_confidence: DEFAULT_ENTITY_CONFIDENCE,
            enable_wikidata: true,
            enable_dbpedia: true,
        }
    }
}

/// Settings for the linked-data resolvers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkingConfig {
    pub wikidata_endpoint: String,
    pub dbpedia_endpoint: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub dbpedia_confidence: f32,
    pub dbpedia_support: u32,
}

impl LinkingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            wikidata_endpoint: WIKIDATA_SPARQL_ENDPOINT.to_string(),
            dbpedia_endpoint: DBPEDIA_SPOTLIGHT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_LINK_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            dbpedia_confidence: 0.5,
            dbpedia_support: 20,
        }
    }
}

/// Settings for batch processing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessingConfig {
    pub inter_item_delay_ms: u64,
}

impl ProcessingConfig {
    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.inter_item_delay_ms)
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            inter_item_delay_ms: DEFAULT_INTER_ITEM_DELAY_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config: EnrichConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EnrichConfig::default());
        assert_eq!(config.ocr.psm, 6);
        assert_eq!(config.ner.confidence_threshold, 0.7);
        assert_eq!(config.linking.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: EnrichConfig =
            serde_json::from_str(r#"{"ner": {"enable_dbpedia": false}}"#).unwrap();
        assert!(!config.ner.enable_dbpedia);
        assert!(config.ner.enable_wikidata);
        assert_eq!(config.ner.model, "en_core_web_sm");
    }
}
