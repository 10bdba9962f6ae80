use crate::{
    config::LinkingConfig,
    errors::EnrichError,
    linking::{build_client, LinkError, Resolver},
    types::EntityCategory,
};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;

// --- DBpedia Spotlight response structures ---

#[derive(Deserialize, Debug)]
struct SpotlightResponse {
    /// Spotlight omits the key entirely when nothing was annotated.
    #[serde(rename = "Resources", default)]
    resources: Vec<SpotlightResource>,
}

#[derive(Deserialize, Debug)]
struct SpotlightResource {
    #[serde(rename = "@URI")]
    uri: String,
}

/// Resolves mentions through the DBpedia Spotlight annotation service.
///
/// Spotlight does its own typing, so the entity category is not sent.
#[derive(Clone, Debug)]
pub struct DbpediaResolver {
    client: ReqwestClient,
    endpoint: String,
    confidence: f32,
    support: u32,
}

impl DbpediaResolver {
    pub fn new(config: &LinkingConfig) -> Result<Self, EnrichError> {
        Ok(Self {
            client: build_client(config)?,
            endpoint: config.dbpedia_endpoint.clone(),
            confidence: config.dbpedia_confidence,
            support: config.dbpedia_support,
        })
    }
}

#[async_trait]
impl Resolver for DbpediaResolver {
    fn name(&self) -> &'static str {
        "DBpedia"
    }

    async fn resolve(&self, text: &str, _category: EntityCategory) -> Result<String, LinkError> {
        let confidence = self.confidence.to_string();
        let support = self.support.to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("text", text),
                ("confidence", confidence.as_str()),
                ("support", support.as_str()),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LinkError::Status { status, body });
        }

        let body = response.text().await?;
        let parsed: SpotlightResponse =
            serde_json::from_str(&body).map_err(|e| LinkError::Payload(e.to_string()))?;

        parsed
            .resources
            .into_iter()
            .next()
            .map(|resource| resource.uri)
            .ok_or(LinkError::NoMatch)
    }
}
