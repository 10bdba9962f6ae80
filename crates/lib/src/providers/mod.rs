//! # Model Providers
//!
//! The pipeline never talks to a model implementation directly. It depends on
//! the three traits below, so the captioning, OCR and NER models can be served
//! over HTTP, spawned as a process, or mocked in tests.
//!
//! Implementations must be safe for concurrent calls. The shipped providers
//! hold no per-call state (each call is one HTTP request or one child
//! process), so the registry shares them without an inference lock.

pub mod caption;
pub mod ner;
pub mod ocr;

use crate::errors::EnrichError;
use crate::types::Image;
use async_trait::async_trait;
use dyn_clone::DynClone;
use image::GrayImage;
use serde::Deserialize;
use std::fmt::Debug;

pub use caption::VisionCaptionProvider;
pub use ner::HttpNerProvider;
pub use ocr::TesseractProvider;

/// Generation parameters forwarded to a captioning model.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionOptions {
    pub max_length: u32,
    /// Beam count, for models that support beam search. Backends without
    /// beam search ignore it.
    pub num_beams: u32,
    pub temperature: f32,
    /// Longest image side the model expects.
    pub input_size: u32,
}

/// Recognition parameters forwarded to an OCR backend.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOptions {
    pub lang: String,
    pub psm: u8,
}

/// An entity span as reported by a NER model, before filtering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawEntity {
    pub text: String,
    pub label: String,
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
    /// Model confidence, if the model exposes one.
    #[serde(default)]
    pub score: Option<f32>,
}

/// A model that describes an image in natural language.
#[async_trait]
pub trait CaptionModel: Send + Sync + Debug + DynClone {
    async fn caption(
        &self,
        image: &Image,
        options: &CaptionOptions,
    ) -> Result<String, EnrichError>;
}

dyn_clone::clone_trait_object!(CaptionModel);

/// A backend that reads text from a preprocessed, binarised page image.
#[async_trait]
pub trait OcrBackend: Send + Sync + Debug + DynClone {
    async fn recognize(&self, image: &GrayImage, options: &OcrOptions)
        -> Result<String, EnrichError>;
}

dyn_clone::clone_trait_object!(OcrBackend);

/// A named-entity recogniser.
///
/// Spans are returned in the order they occur in `text`.
#[async_trait]
pub trait NerModel: Send + Sync + Debug + DynClone {
    async fn recognize(&self, text: &str) -> Result<Vec<RawEntity>, EnrichError>;
}

dyn_clone::clone_trait_object!(NerModel);
