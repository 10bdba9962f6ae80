use crate::{
    errors::EnrichError,
    providers::{NerModel, RawEntity},
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

// --- spaCy-style REST request and response structures ---

#[derive(Serialize)]
struct NerRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct NerResponse {
    #[serde(default)]
    ents: Vec<NerSpan>,
}

#[derive(Deserialize, Debug)]
struct NerSpan {
    start: usize,
    end: usize,
    label: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    score: Option<f32>,
}

/// Returns the characters of `text` in `[start, end)`.
fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

// --- HTTP NER Provider implementation ---

/// A NER model served by a REST endpoint that accepts `{"text": ...}` and
/// answers with spaCy's `{"ents": [...]}` shape.
#[derive(Clone, Debug)]
pub struct HttpNerProvider {
    client: ReqwestClient,
    api_url: String,
    model: Option<String>,
}

impl HttpNerProvider {
    /// Creates a new `HttpNerProvider`.
    pub fn new(api_url: String, model: Option<String>) -> Result<Self, EnrichError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(EnrichError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            model,
        })
    }
}

#[async_trait]
impl NerModel for HttpNerProvider {
    async fn recognize(&self, text: &str) -> Result<Vec<RawEntity>, EnrichError> {
        let request_body = NerRequest {
            text,
            model: self.model.as_deref(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request_body)
            .send()
            .await
            .map_err(EnrichError::ModelRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnrichError::ModelApi(error_text));
        }

        let ner_response: NerResponse = response
            .json()
            .await
            .map_err(EnrichError::ModelDeserialization)?;

        debug!("<-- NER model returned {} spans", ner_response.ents.len());

        let entities = ner_response
            .ents
            .into_iter()
            .map(|span| RawEntity {
                text: span
                    .text
                    .unwrap_or_else(|| char_slice(text, span.start, span.end)),
                label: span.label,
                start: span.start,
                end: span.end,
                score: span.score,
            })
            .collect();

        Ok(entities)
    }
}
