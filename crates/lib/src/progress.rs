//! # Progress Reporting
//!
//! The pipeline reports stage boundaries to an injected `ProgressObserver`.
//! Observers are best-effort: a panicking observer is contained and never
//! changes the outcome of an item.
//!
//! `ProcessingLog` is a ready-made observer that keeps a bounded, in-memory
//! history with per-level counts, for hosts that want to display or persist
//! the log themselves.

use crate::constants::DEFAULT_LOG_CAPACITY;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Severity of a progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProgressLevel {
    Info,
    Success,
    Error,
}

impl fmt::Display for ProgressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProgressLevel::Info => "INFO",
            ProgressLevel::Success => "SUCCESS",
            ProgressLevel::Error => "ERROR",
        })
    }
}

/// The per-item state machine. Stage failures advance to the next stage;
/// only a missing model stops an item before `Captioning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Pending,
    Captioning,
    ExtractingText,
    ExtractingEntities,
    LinkingEntities,
    SynthesizingDc,
    Done,
}

impl Stage {
    /// The message announced when the stage starts.
    pub fn message(self) -> &'static str {
        match self {
            Stage::Pending => "Waiting to start",
            Stage::Captioning => "Generating image description...",
            Stage::ExtractingText => "Extracting text via OCR...",
            Stage::ExtractingEntities => "Processing named entities...",
            Stage::LinkingEntities => "Linking entities to Wikidata and DBpedia...",
            Stage::SynthesizingDc => "Generating Dublin Core metadata...",
            Stage::Done => "Done",
        }
    }
}

/// One notification emitted by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub level: ProgressLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(level: ProgressLevel, message: impl Into<String>, stage: Option<Stage>) -> Self {
        Self {
            level,
            message: message.into(),
            stage,
            timestamp: Utc::now(),
        }
    }
}

/// Receives progress notifications.
pub trait ProgressObserver: Send + Sync {
    fn notify(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn notify(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// An observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn notify(&self, _event: &ProgressEvent) {}
}

/// Delivers `event`, containing any panic raised by the observer.
pub(crate) fn emit(observer: &dyn ProgressObserver, event: ProgressEvent) {
    if catch_unwind(AssertUnwindSafe(|| observer.notify(&event))).is_err() {
        warn!("Progress observer panicked on '{}'; ignoring", event.message);
    }
}

/// Counts of log entries per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub total: usize,
    pub info: usize,
    pub success: usize,
    pub error: usize,
}

/// A bounded processing log that doubles as a `ProgressObserver`.
///
/// When full, the oldest entries are discarded first.
#[derive(Debug)]
pub struct ProcessingLog {
    capacity: usize,
    entries: Mutex<VecDeque<ProgressEvent>>,
}

impl Default for ProcessingLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl ProcessingLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn add_entry(&self, level: ProgressLevel, message: impl Into<String>) {
        self.push(ProgressEvent::new(level, message, None));
    }

    fn push(&self, event: ProgressEvent) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push_back(event);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// A snapshot of the retained entries, oldest first.
    pub fn entries(&self) -> Vec<ProgressEvent> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> LogStats {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().fold(
            LogStats {
                total: entries.len(),
                ..Default::default()
            },
            |mut stats, entry| {
                match entry.level {
                    ProgressLevel::Info => stats.info += 1,
                    ProgressLevel::Success => stats.success += 1,
                    ProgressLevel::Error => stats.error += 1,
                }
                stats
            },
        )
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ProgressObserver for ProcessingLog {
    fn notify(&self, event: &ProgressEvent) {
        self.push(event.clone());
    }
}
