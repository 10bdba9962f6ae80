//! # Common Test Utilities
//!
//! Scripted stand-ins for the caption, OCR and NER models, plus image
//! fixtures, so pipeline tests run without any real model or network access.

use async_trait::async_trait;
use dcenrich::{
    providers::{CaptionModel, CaptionOptions, NerModel, OcrBackend, OcrOptions, RawEntity},
    EnrichError, EntityCategory, Image, LinkError, Resolver,
};
use image::{DynamicImage, GrayImage, Luma};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// --- Image fixtures ---

/// A uniformly white page: nothing for OCR to find.
pub fn blank_image(width: u32, height: u32) -> Image {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([255])))
}

/// A white page with dark horizontal bars standing in for lines of text.
pub fn text_like_image(width: u32, height: u32) -> Image {
    DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |_, y| {
        if (y / 4) % 3 == 1 {
            Luma([20])
        } else {
            Luma([235])
        }
    }))
}

// --- Mock Caption Model ---

/// Returns a fixed caption (or a fixed failure) and records the options it
/// was called with.
#[derive(Clone, Debug)]
pub struct MockCaptionModel {
    response: Result<String, String>,
    calls: Arc<Mutex<Vec<CaptionOptions>>>,
}

impl MockCaptionModel {
    pub fn new(caption: &str) -> Self {
        Self {
            response: Ok(caption.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<CaptionOptions> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptionModel for MockCaptionModel {
    async fn caption(
        &self,
        _image: &Image,
        options: &CaptionOptions,
    ) -> Result<String, EnrichError> {
        self.calls.lock().unwrap().push(options.clone());
        self.response.clone().map_err(EnrichError::ModelApi)
    }
}

// --- Mock OCR Backend ---

/// Returns fixed raw OCR output and counts how often it was asked.
#[derive(Clone, Debug)]
pub struct MockOcrBackend {
    response: Result<String, String>,
    calls: Arc<Mutex<usize>>,
}

impl MockOcrBackend {
    pub fn new(raw_text: &str) -> Self {
        Self {
            response: Ok(raw_text.to_string()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl OcrBackend for MockOcrBackend {
    async fn recognize(
        &self,
        _image: &GrayImage,
        _options: &OcrOptions,
    ) -> Result<String, EnrichError> {
        *self.calls.lock().unwrap() += 1;
        self.response.clone().map_err(EnrichError::OcrBackend)
    }
}

// --- Mock NER Model ---

/// A gazetteer-based recogniser: every occurrence of a known mention becomes
/// a span, reported left to right.
#[derive(Clone, Debug, Default)]
pub struct MockNerModel {
    gazetteer: Vec<(String, String, Option<f32>)>,
    fail: bool,
    inputs: Arc<Mutex<Vec<String>>>,
}

impl MockNerModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Registers a mention with its label and optional model score.
    pub fn with_entity(mut self, text: &str, label: &str, score: Option<f32>) -> Self {
        self.gazetteer
            .push((text.to_string(), label.to_string(), score));
        self
    }

    /// The texts the model was asked to analyse.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl NerModel for MockNerModel {
    async fn recognize(&self, text: &str) -> Result<Vec<RawEntity>, EnrichError> {
        self.inputs.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(EnrichError::ModelApi("NER model crashed".to_string()));
        }

        let mut spans: Vec<RawEntity> = self
            .gazetteer
            .iter()
            .flat_map(|(mention, label, score)| {
                text.match_indices(mention.as_str()).map(move |(byte, _)| {
                    let start = text[..byte].chars().count();
                    RawEntity {
                        text: mention.clone(),
                        label: label.clone(),
                        start,
                        end: start + mention.chars().count(),
                        score: *score,
                    }
                })
            })
            .collect();
        spans.sort_by_key(|span| span.start);
        Ok(spans)
    }
}

// --- Mock Resolver ---

/// A knowledge base with a fixed set of known mentions. Unknown mentions
/// resolve to `NoMatch`; a failing resolver answers every lookup with a
/// service error.
#[derive(Clone, Debug)]
pub struct MockResolver {
    name: &'static str,
    known: HashMap<String, String>,
    fail: bool,
    lookups: Arc<Mutex<Vec<(String, EntityCategory)>>>,
}

impl MockResolver {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            known: HashMap::new(),
            fail: false,
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn with_uri(mut self, text: &str, uri: &str) -> Self {
        self.known.insert(text.to_string(), uri.to_string());
        self
    }

    /// Every `(mention, category)` the resolver was asked about, in order.
    pub fn lookups(&self) -> Vec<(String, EntityCategory)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl Resolver for MockResolver {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn resolve(&self, text: &str, category: EntityCategory) -> Result<String, LinkError> {
        self.lookups
            .lock()
            .unwrap()
            .push((text.to_string(), category));
        if self.fail {
            return Err(LinkError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        self.known.get(text).cloned().ok_or(LinkError::NoMatch)
    }
}
