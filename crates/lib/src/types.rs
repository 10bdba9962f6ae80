//! # Enrichment Data Model
//!
//! The per-item output of the pipeline and the entity records it carries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A decoded raster image. The pipeline borrows it for one call and never
/// persists it.
pub type Image = image::DynamicImage;

/// Dublin Core fields keyed by `DcField::as_str`.
///
/// A `BTreeMap` keeps serialisation order stable across runs.
pub type DublinCore = BTreeMap<String, String>;

/// The closed set of keys the synthesizer may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DcField {
    Description,
    Subject,
    SubjectUris,
    Type,
    Coverage,
}

impl DcField {
    pub const ALL: [DcField; 5] = [
        DcField::Description,
        DcField::Subject,
        DcField::SubjectUris,
        DcField::Type,
        DcField::Coverage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DcField::Description => "description",
            DcField::Subject => "subject",
            DcField::SubjectUris => "subject_uris",
            DcField::Type => "type",
            DcField::Coverage => "coverage",
        }
    }
}

/// The per-item enrichment output. Each field is present only if its stage
/// ran and produced a non-empty value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<EntityMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dublin_core: Option<DublinCore>,
}

impl EnrichmentResult {
    /// Entities in extraction order, or an empty slice when none were found.
    pub fn entities(&self) -> &[EntityMatch] {
        self.entities.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.transcription.is_none()
            && self.entities.is_none()
            && self.dublin_core.is_none()
    }
}

/// A named-entity span detected in the caption/OCR text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityMatch {
    pub text: String,
    pub label: EntityLabel,
    /// Human-readable meaning of `label`, when the taxonomy defines one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_offset: usize,
    pub end_offset: usize,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wikidata_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbpedia_uri: Option<String>,
}

impl EntityMatch {
    pub fn category(&self) -> EntityCategory {
        self.label.category()
    }
}

/// Entity labels of the OntoNotes taxonomy used by spaCy English models.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityLabel {
    Person,
    Norp,
    Fac,
    Org,
    Gpe,
    Loc,
    Product,
    Event,
    WorkOfArt,
    Law,
    Language,
    Date,
    Time,
    Percent,
    Money,
    Quantity,
    Ordinal,
    Cardinal,
    /// A label outside the known taxonomy, kept verbatim.
    Other(String),
}

impl EntityLabel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PERSON" => Self::Person,
            "NORP" => Self::Norp,
            "FAC" => Self::Fac,
            "ORG" => Self::Org,
            "GPE" => Self::Gpe,
            "LOC" => Self::Loc,
            "PRODUCT" => Self::Product,
            "EVENT" => Self::Event,
            "WORK_OF_ART" => Self::WorkOfArt,
            "LAW" => Self::Law,
            "LANGUAGE" => Self::Language,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "PERCENT" => Self::Percent,
            "MONEY" => Self::Money,
            "QUANTITY" => Self::Quantity,
            "ORDINAL" => Self::Ordinal,
            "CARDINAL" => Self::Cardinal,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Person => "PERSON",
            Self::Norp => "NORP",
            Self::Fac => "FAC",
            Self::Org => "ORG",
            Self::Gpe => "GPE",
            Self::Loc => "LOC",
            Self::Product => "PRODUCT",
            Self::Event => "EVENT",
            Self::WorkOfArt => "WORK_OF_ART",
            Self::Law => "LAW",
            Self::Language => "LANGUAGE",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Percent => "PERCENT",
            Self::Money => "MONEY",
            Self::Quantity => "QUANTITY",
            Self::Ordinal => "ORDINAL",
            Self::Cardinal => "CARDINAL",
            Self::Other(raw) => raw,
        }
    }

    /// The glossary text spaCy reports for this label.
    pub fn explain(&self) -> Option<&'static str> {
        let text = match self {
            Self::Person => "People, including fictional",
            Self::Norp => "Nationalities or religious or political groups",
            Self::Fac => "Buildings, airports, highways, bridges, etc.",
            Self::Org => "Companies, agencies, institutions, etc.",
            Self::Gpe => "Countries, cities, states",
            Self::Loc => "Non-GPE locations, mountain ranges, bodies of water",
            Self::Product => "Objects, vehicles, foods, etc. (not services)",
            Self::Event => "Named hurricanes, battles, wars, sports events, etc.",
            Self::WorkOfArt => "Titles of books, songs, etc.",
            Self::Law => "Named documents made into laws.",
            Self::Language => "Any named language",
            Self::Date => "Absolute or relative dates or periods",
            Self::Time => "Times smaller than a day",
            Self::Percent => "Percentage, including \"%\"",
            Self::Money => "Monetary values, including unit",
            Self::Quantity => "Measurements, as of weight or distance",
            Self::Ordinal => "\"first\", \"second\", etc.",
            Self::Cardinal => "Numerals that do not fall under another type",
            Self::Other(_) => return None,
        };
        Some(text)
    }

    pub fn category(&self) -> EntityCategory {
        match self {
            Self::Person => EntityCategory::Person,
            Self::Gpe | Self::Loc => EntityCategory::Place,
            Self::Org => EntityCategory::Organization,
            _ => EntityCategory::Other,
        }
    }
}

impl From<String> for EntityLabel {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<EntityLabel> for String {
    fn from(label: EntityLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse grouping of labels that drives query selection and coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
    Person,
    Place,
    Organization,
    Other,
}
