use crate::{
    config::LinkingConfig,
    errors::EnrichError,
    linking::{build_client, LinkError, Resolver},
    types::EntityCategory,
};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;

// --- SPARQL JSON result structures ---

#[derive(Deserialize, Debug)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Deserialize, Debug)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Deserialize, Debug)]
struct SparqlTerm {
    value: String,
}

/// Escapes a mention for use inside a double-quoted SPARQL literal.
fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Builds the label-match query for `text`, constrained by entity category:
/// people must be humans (Q5), places cities (Q515) or countries (Q6256),
/// organisations any subclass of organization (Q43229). Other categories
/// match on the label alone.
pub fn build_sparql_query(text: &str, category: EntityCategory) -> String {
    let constraint = match category {
        EntityCategory::Person => "\n  ?item wdt:P31 wd:Q5 .",
        EntityCategory::Place => {
            "\n  { ?item wdt:P31 wd:Q515 } UNION { ?item wdt:P31 wd:Q6256 } ."
        }
        EntityCategory::Organization => "\n  ?item wdt:P31/wdt:P279* wd:Q43229 .",
        EntityCategory::Other => "",
    };

    format!(
        r#"SELECT ?item ?itemLabel WHERE {{
  ?item rdfs:label "{label}"@en .{constraint}
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en" }}
}}
LIMIT 1"#,
        label = escape_literal(text),
    )
}

/// Resolves mentions through the Wikidata SPARQL endpoint.
#[derive(Clone, Debug)]
pub struct WikidataResolver {
    client: ReqwestClient,
    endpoint: String,
}

impl WikidataResolver {
    pub fn new(config: &LinkingConfig) -> Result<Self, EnrichError> {
        Ok(Self {
            client: build_client(config)?,
            endpoint: config.wikidata_endpoint.clone(),
        })
    }
}

#[async_trait]
impl Resolver for WikidataResolver {
    fn name(&self) -> &'static str {
        "Wikidata"
    }

    async fn resolve(&self, text: &str, category: EntityCategory) -> Result<String, LinkError> {
        let query = build_sparql_query(text, category);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query.as_str()), ("format", "json")])
            .header(reqwest::header::ACCEPT, "application/sparql-results+json")
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LinkError::Status { status, body });
        }

        let body = response.text().await?;
        let parsed: SparqlResponse =
            serde_json::from_str(&body).map_err(|e| LinkError::Payload(e.to_string()))?;

        parsed
            .results
            .bindings
            .into_iter()
            .next()
            .and_then(|mut binding| binding.remove("item"))
            .map(|term| term.value)
            .ok_or(LinkError::NoMatch)
    }
}
