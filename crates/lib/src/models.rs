//! # Model Registry
//!
//! Loaded model handles live in a `ModelRegistry` owned by the host process.
//! Each model sits in a `ModelSlot` that loads at most once and records its
//! lifecycle state, so the pipeline can refuse to run before the required
//! models are available instead of failing halfway through an item.

use crate::{
    errors::EnrichError,
    providers::{CaptionModel, NerModel, OcrBackend},
};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Lifecycle of a model slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    NotLoaded,
    Loading,
    Loaded,
    /// The last load attempt failed. The slot can be loaded again.
    Failed(String),
}

/// A lazily initialised, shareable model handle.
pub struct ModelSlot<T: ?Sized> {
    name: &'static str,
    handle: OnceCell<Arc<T>>,
    state: RwLock<ModelState>,
}

impl<T: ?Sized> std::fmt::Debug for ModelSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSlot")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized> ModelSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: OnceCell::new(),
            state: RwLock::new(ModelState::NotLoaded),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> ModelState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == ModelState::Loaded
    }

    /// Returns the handle if the model has been loaded.
    pub fn get(&self) -> Option<Arc<T>> {
        self.handle.get().cloned()
    }

    fn set_state(&self, state: ModelState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Loads the model with `loader` unless it is already loaded.
    ///
    /// Concurrent callers wait for a single in-flight load. A failed load is
    /// recorded as `ModelState::Failed` and may be retried.
    pub async fn load<F, Fut>(&self, loader: F) -> Result<Arc<T>, EnrichError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Box<T>, EnrichError>>,
    {
        if let Some(handle) = self.handle.get() {
            return Ok(Arc::clone(handle));
        }

        self.set_state(ModelState::Loading);
        info!("Loading {} model...", self.name);

        let result = self
            .handle
            .get_or_try_init(|| async { loader().await.map(Arc::from) })
            .await;

        match result {
            Ok(handle) => {
                self.set_state(ModelState::Loaded);
                info!("{} model loaded successfully", self.name);
                Ok(Arc::clone(handle))
            }
            Err(e) => {
                error!("Error loading {} model: {e}", self.name);
                self.set_state(ModelState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Installs an already constructed model.
    pub async fn install(&self, model: Box<T>) -> Result<Arc<T>, EnrichError> {
        self.load(|| async move { Ok(model) }).await
    }
}

/// The process-wide set of model handles used by the pipeline.
///
/// Captioning and NER are required; OCR is optional and the pipeline simply
/// skips text extraction when it is missing.
#[derive(Debug)]
pub struct ModelRegistry {
    pub captioner: ModelSlot<dyn CaptionModel>,
    pub ocr: ModelSlot<dyn OcrBackend>,
    pub ner: ModelSlot<dyn NerModel>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            captioner: ModelSlot::new("caption"),
            ocr: ModelSlot::new("ocr"),
            ner: ModelSlot::new("ner"),
        }
    }

    /// Fails with `ModelNotReady` naming the first required model that is
    /// not loaded.
    pub fn ensure_ready(&self) -> Result<(), EnrichError> {
        if !self.captioner.is_loaded() {
            return Err(EnrichError::ModelNotReady {
                model: self.captioner.name(),
            });
        }
        if !self.ner.is_loaded() {
            return Err(EnrichError::ModelNotReady {
                model: self.ner.name(),
            });
        }
        Ok(())
    }

    /// State of every slot, for status reporting.
    pub fn status(&self) -> Vec<(&'static str, ModelState)> {
        vec![
            (self.captioner.name(), self.captioner.state()),
            (self.ocr.name(), self.ocr.state()),
            (self.ner.name(), self.ner.state()),
        ]
    }
}
