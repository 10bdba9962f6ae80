//! # Entity Linking
//!
//! Resolves entity mentions to identifiers in external knowledge bases.
//! Each resolver reports *why* a lookup produced nothing through `LinkError`;
//! the `EntityLinker` turns every such error into an absent URI, because
//! linking is best-effort and must never block the pipeline.

pub mod dbpedia;
pub mod wikidata;

use crate::{
    config::{LinkingConfig, NerConfig},
    errors::EnrichError,
    types::{EntityCategory, EntityLabel, EntityMatch},
};
use async_trait::async_trait;
use dyn_clone::DynClone;
use reqwest::Client as ReqwestClient;
use std::fmt::Debug;
use thiserror::Error;
use tracing::{debug, info};

pub use dbpedia::DbpediaResolver;
pub use wikidata::{build_sparql_query, WikidataResolver};

/// Reasons a lookup did not yield a URI.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Request to linked-data service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Linked-data service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed linked-data payload: {0}")]
    Payload(String),
    #[error("No matching resource")]
    NoMatch,
}

/// A knowledge-base lookup for a single mention.
#[async_trait]
pub trait Resolver: Send + Sync + Debug + DynClone {
    /// Short name used in logs (e.g. "Wikidata").
    fn name(&self) -> &'static str;

    async fn resolve(&self, text: &str, category: EntityCategory) -> Result<String, LinkError>;
}

dyn_clone::clone_trait_object!(Resolver);

/// Builds the HTTP client shared by the resolvers: explicit timeout and a
/// descriptive user agent.
pub(crate) fn build_client(config: &LinkingConfig) -> Result<ReqwestClient, EnrichError> {
    ReqwestClient::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(EnrichError::ReqwestClientBuild)
}

/// Links entities against Wikidata and DBpedia. Either resolver may be
/// disabled.
#[derive(Debug, Clone, Default)]
pub struct EntityLinker {
    wikidata: Option<Box<dyn Resolver>>,
    dbpedia: Option<Box<dyn Resolver>>,
}

impl EntityLinker {
    pub fn new(wikidata: Option<Box<dyn Resolver>>, dbpedia: Option<Box<dyn Resolver>>) -> Self {
        Self { wikidata, dbpedia }
    }

    /// Creates the resolvers enabled in `ner`, pointed at the endpoints in
    /// `linking`.
    pub fn from_config(ner: &NerConfig, linking: &LinkingConfig) -> Result<Self, EnrichError> {
        let wikidata: Option<Box<dyn Resolver>> = if ner.enable_wikidata {
            Some(Box::new(WikidataResolver::new(linking)?))
        } else {
            None
        };
        let dbpedia: Option<Box<dyn Resolver>> = if ner.enable_dbpedia {
            Some(Box::new(DbpediaResolver::new(linking)?))
        } else {
            None
        };
        Ok(Self::new(wikidata, dbpedia))
    }

    pub fn is_enabled(&self) -> bool {
        self.wikidata.is_some() || self.dbpedia.is_some()
    }

    async fn lookup(
        resolver: Option<&dyn Resolver>,
        text: &str,
        label: &EntityLabel,
    ) -> Option<String> {
        let resolver = resolver?;
        match resolver.resolve(text, label.category()).await {
            Ok(uri) => {
                debug!("Found {} URI for '{text}': {uri}", resolver.name());
                Some(uri)
            }
            Err(e) => {
                debug!("{} lookup failed for '{text}': {e}", resolver.name());
                None
            }
        }
    }

    pub async fn link_wikidata(&self, text: &str, label: &EntityLabel) -> Option<String> {
        Self::lookup(self.wikidata.as_deref(), text, label).await
    }

    pub async fn link_dbpedia(&self, text: &str, label: &EntityLabel) -> Option<String> {
        Self::lookup(self.dbpedia.as_deref(), text, label).await
    }

    /// Fills in the URIs of every entity, one lookup at a time.
    pub async fn link_all(&self, entities: &mut [EntityMatch]) {
        if !self.is_enabled() {
            return;
        }
        for entity in entities.iter_mut() {
            entity.wikidata_uri = self.link_wikidata(&entity.text, &entity.label).await;
            entity.dbpedia_uri = self.link_dbpedia(&entity.text, &entity.label).await;
        }
        let linked = entities
            .iter()
            .filter(|e| e.wikidata_uri.is_some() || e.dbpedia_uri.is_some())
            .count();
        info!("Linked {linked} of {} entities", entities.len());
    }
}
