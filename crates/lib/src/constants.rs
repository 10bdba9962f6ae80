//! # Shared Constants
//!
//! Endpoints, separators and defaults shared across the enrichment stages.
//! Keeping them here avoids "magic strings" drifting apart between the
//! linker, the synthesizer and the configuration defaults.

/// Separator used by every joined Dublin Core value.
pub const DC_SEPARATOR: &str = " | ";

/// Public Wikidata SPARQL endpoint.
pub const WIKIDATA_SPARQL_ENDPOINT: &str = "https://query.wikidata.org/sparql";

/// Public DBpedia Spotlight annotation endpoint (English).
pub const DBPEDIA_SPOTLIGHT_ENDPOINT: &str = "https://api.dbpedia-spotlight.org/en/annotate";

/// Timeout applied to every linked-data request, in seconds.
pub const DEFAULT_LINK_TIMEOUT_SECS: u64 = 10;

/// Wikimedia asks clients to identify themselves.
pub const DEFAULT_USER_AGENT: &str = concat!("dcenrich/", env!("CARGO_PKG_VERSION"));

/// Confidence assigned to entities when the NER model exposes no score.
pub const DEFAULT_ENTITY_CONFIDENCE: f32 = 0.8;

/// Entities scored strictly below this are dropped.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Pause between batch items, in milliseconds.
pub const DEFAULT_INTER_ITEM_DELAY_MS: u64 = 100;

/// Maximum number of entries kept by a `ProcessingLog`.
pub const DEFAULT_LOG_CAPACITY: usize = 100;
