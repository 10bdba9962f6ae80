//! # Dublin Core Synthesis
//!
//! Derives a small Dublin Core record from the caption and the linked
//! entities. The rules are fixed and the output format is consumed by
//! downstream exports, so every join uses `DC_SEPARATOR` verbatim.
//!
//! | Field          | Source                                                  |
//! |----------------|---------------------------------------------------------|
//! | `description`  | caption, then `Contains: text (label meaning), ...`     |
//! | `subject`      | every entity mention                                    |
//! | `subject_uris` | all Wikidata URIs, then all DBpedia URIs                |
//! | `type`         | first keyword rule matching the lowercased caption      |
//! | `coverage`     | mentions labelled GPE or LOC                            |

use crate::{
    constants::DC_SEPARATOR,
    types::{DcField, DublinCore, EnrichmentResult, EntityCategory},
};
use tracing::info;

/// Keyword rules for `type`, checked in order; the first hit wins.
const TYPE_RULES: [(&[&str], &str); 3] = [
    (&["photograph", "photo", "picture"], "Image;Photograph"),
    (&["painting", "artwork", "art"], "Image;Artwork"),
    (&["document", "text", "manuscript"], "Text"),
];

/// `type` when a caption exists but no keyword matched.
const FALLBACK_TYPE: &str = "Image";

/// Infers the Dublin Core type from a caption by substring match.
pub fn infer_type(caption: &str) -> &'static str {
    let caption = caption.to_lowercase();
    TYPE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| caption.contains(k)))
        .map(|(_, dc_type)| *dc_type)
        .unwrap_or(FALLBACK_TYPE)
}

fn insert_joined<I, S>(record: &mut DublinCore, field: DcField, values: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let values: Vec<S> = values.into_iter().collect();
    if values.is_empty() {
        return;
    }
    let joined = values
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(DC_SEPARATOR);
    record.insert(field.as_str().to_string(), joined);
}

/// Builds the Dublin Core record for an enrichment result.
///
/// Pure function of `result.description` and `result.entities`: any existing
/// `dublin_core` on the input is ignored, and absent inputs simply leave the
/// corresponding keys out.
pub fn synthesize(result: &EnrichmentResult) -> DublinCore {
    let mut record = DublinCore::new();
    let caption = result.description.as_deref();
    let entities = result.entities();

    // description
    let entity_descriptions: Vec<String> = entities
        .iter()
        .filter_map(|e| {
            e.description
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(|d| format!("{} ({d})", e.text))
        })
        .collect();
    let contains = (!entity_descriptions.is_empty())
        .then(|| format!("Contains: {}", entity_descriptions.join(", ")));
    insert_joined(
        &mut record,
        DcField::Description,
        caption.map(str::to_string).into_iter().chain(contains),
    );

    // subject
    insert_joined(
        &mut record,
        DcField::Subject,
        entities.iter().map(|e| e.text.as_str()),
    );

    // subject_uris
    let wikidata = entities.iter().filter_map(|e| e.wikidata_uri.as_deref());
    let dbpedia = entities.iter().filter_map(|e| e.dbpedia_uri.as_deref());
    insert_joined(&mut record, DcField::SubjectUris, wikidata.chain(dbpedia));

    // type
    if let Some(caption) = caption {
        record.insert(DcField::Type.as_str().to_string(), infer_type(caption).to_string());
    }

    // coverage
    insert_joined(
        &mut record,
        DcField::Coverage,
        entities
            .iter()
            .filter(|e| e.category() == EntityCategory::Place)
            .map(|e| e.text.as_str()),
    );

    info!(
        "Generated Dublin Core metadata with {} fields",
        record.len()
    );
    record
}
