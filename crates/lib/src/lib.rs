//! # Cultural-Heritage Metadata Enrichment
//!
//! This crate enriches a digitised image with machine-generated metadata: a
//! caption, OCR text, named entities linked to Wikidata and DBpedia, and a
//! derived Dublin Core record.
//!
//! The models themselves are external collaborators behind the traits in
//! [`providers`]; their loaded handles live in a [`ModelRegistry`] owned by the
//! host. An [`EnhancementPipeline`] borrows the registry and runs the stages
//! for one item or a serial batch, absorbing any stage failure so that the
//! caller always gets the best partial result available.
//!
//! ```no_run
//! use dcenrich::{EnhancementPipeline, EnrichConfig, ModelRegistry, ProcessingLog};
//! use dcenrich::providers::{HttpNerProvider, VisionCaptionProvider};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), dcenrich::EnrichError> {
//! let config = EnrichConfig::default();
//! let registry = Arc::new(ModelRegistry::new());
//! registry
//!     .captioner
//!     .install(Box::new(VisionCaptionProvider::new(
//!         "http://localhost:8000/v1/chat/completions".to_string(),
//!         None,
//!         None,
//!     )?))
//!     .await?;
//! registry
//!     .ner
//!     .install(Box::new(HttpNerProvider::new(
//!         "http://localhost:8001/ents".to_string(),
//!         None,
//!     )?))
//!     .await?;
//!
//! let pipeline = EnhancementPipeline::new(registry, &config)?;
//! let image = image::open("item.jpg")?;
//! let log = ProcessingLog::default();
//! let result = pipeline.process_item(&image, "vko", "347", &log).await?;
//! println!("{:?}", result.dublin_core);
//! # Ok(())
//! # }
//! ```

pub mod caption;
pub mod config;
pub mod constants;
pub mod dublin_core;
pub mod entities;
pub mod errors;
pub mod linking;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod progress;
pub mod providers;
pub mod types;

pub use caption::CaptionGenerator;
pub use config::EnrichConfig;
pub use dublin_core::synthesize;
pub use entities::EntityExtractor;
pub use errors::EnrichError;
pub use linking::{EntityLinker, LinkError, Resolver};
pub use models::{ModelRegistry, ModelSlot, ModelState};
pub use ocr::TextExtractor;
pub use pipeline::{BatchEntry, BatchItem, BatchReport, EnhancementPipeline};
pub use progress::{
    NoopObserver, ProcessingLog, ProgressEvent, ProgressLevel, ProgressObserver, Stage,
};
pub use types::{
    DcField, DublinCore, EnrichmentResult, EntityCategory, EntityLabel, EntityMatch, Image,
};
