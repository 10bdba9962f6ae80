//! # Entity Linking Tests
//!
//! Exercises the Wikidata and DBpedia resolvers against mock HTTP services,
//! covering both successful lookups and every way a lookup can come back empty.

use dcenrich::{
    config::{LinkingConfig, NerConfig},
    linking::{DbpediaResolver, WikidataResolver},
    EntityCategory, EntityLabel, EntityLinker, LinkError, Resolver,
};
use dcenrich_test_utils::setup_tracing;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn linking_config(server: &MockServer) -> LinkingConfig {
    LinkingConfig {
        wikidata_endpoint: format!("{}/sparql", server.uri()),
        dbpedia_endpoint: format!("{}/rest/annotate", server.uri()),
        timeout_secs: 1,
        ..Default::default()
    }
}

fn sparql_hit(uri: &str) -> serde_json::Value {
    json!({
        "head": { "vars": ["item", "itemLabel"] },
        "results": {
            "bindings": [{
                "item": { "type": "uri", "value": uri },
                "itemLabel": { "xml:lang": "en", "type": "literal", "value": "Paris" }
            }]
        }
    })
}

// --- Wikidata ---

#[tokio::test]
async fn test_wikidata_returns_first_binding() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .and(query_param("format", "json"))
        .and(header("accept", "application/sparql-results+json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(sparql_hit("http://www.wikidata.org/entity/Q90")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resolver = WikidataResolver::new(&linking_config(&server)).unwrap();
    let uri = resolver
        .resolve("Paris", EntityCategory::Place)
        .await
        .unwrap();
    assert_eq!(uri, "http://www.wikidata.org/entity/Q90");

    let requests = server.received_requests().await.unwrap();
    let query = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "query")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert!(query.contains(r#"?item rdfs:label "Paris"@en ."#));
    assert!(query.contains("wd:Q515"));
    assert!(query.contains("wd:Q6256"));
    assert!(requests[0]
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ua| ua.starts_with("dcenrich/")));
}

#[tokio::test]
async fn test_wikidata_empty_bindings_is_no_match() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "head": { "vars": ["item"] },
            "results": { "bindings": [] }
        })))
        .mount(&server)
        .await;

    let resolver = WikidataResolver::new(&linking_config(&server)).unwrap();
    let err = resolver
        .resolve("Atlantis", EntityCategory::Place)
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::NoMatch));
}

#[tokio::test]
async fn test_wikidata_server_error_is_reported() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Query timeout"))
        .mount(&server)
        .await;

    let resolver = WikidataResolver::new(&linking_config(&server)).unwrap();
    match resolver.resolve("Paris", EntityCategory::Place).await {
        Err(LinkError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "Query timeout");
        }
        other => panic!("Expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wikidata_malformed_payload() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let resolver = WikidataResolver::new(&linking_config(&server)).unwrap();
    let err = resolver
        .resolve("Paris", EntityCategory::Place)
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::Payload(_)));
}

#[tokio::test]
async fn test_wikidata_slow_service_times_out() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sparql_hit("http://www.wikidata.org/entity/Q90"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let resolver = WikidataResolver::new(&linking_config(&server)).unwrap();
    let err = resolver
        .resolve("Paris", EntityCategory::Place)
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::Transport(ref e) if e.is_timeout()));
}

// --- DBpedia ---

#[tokio::test]
async fn test_dbpedia_returns_first_resource() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/annotate"))
        .and(query_param("text", "Ada Lovelace"))
        .and(query_param("confidence", "0.5"))
        .and(query_param("support", "20"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@text": "Ada Lovelace",
            "@confidence": "0.5",
            "Resources": [
                { "@URI": "http://dbpedia.org/resource/Ada_Lovelace", "@surfaceForm": "Ada Lovelace" },
                { "@URI": "http://dbpedia.org/resource/Lovelace", "@surfaceForm": "Lovelace" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = DbpediaResolver::new(&linking_config(&server)).unwrap();
    let uri = resolver
        .resolve("Ada Lovelace", EntityCategory::Person)
        .await
        .unwrap();
    assert_eq!(uri, "http://dbpedia.org/resource/Ada_Lovelace");
}

#[tokio::test]
async fn test_dbpedia_without_resources_is_no_match() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@text": "zzxq",
            "@confidence": "0.5"
        })))
        .mount(&server)
        .await;

    let resolver = DbpediaResolver::new(&linking_config(&server)).unwrap();
    let err = resolver
        .resolve("zzxq", EntityCategory::Other)
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::NoMatch));
}

// --- EntityLinker ---

#[tokio::test]
async fn test_linker_fills_both_uris() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(sparql_hit("http://www.wikidata.org/entity/Q90")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Resources": [{ "@URI": "http://dbpedia.org/resource/Paris" }]
        })))
        .mount(&server)
        .await;

    let linker = EntityLinker::from_config(&NerConfig::default(), &linking_config(&server)).unwrap();
    assert_eq!(
        linker.link_wikidata("Paris", &EntityLabel::Gpe).await.as_deref(),
        Some("http://www.wikidata.org/entity/Q90")
    );
    assert_eq!(
        linker.link_dbpedia("Paris", &EntityLabel::Gpe).await.as_deref(),
        Some("http://dbpedia.org/resource/Paris")
    );
}

#[tokio::test]
async fn test_linker_turns_failures_into_absent_uris() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let linker = EntityLinker::from_config(&NerConfig::default(), &linking_config(&server)).unwrap();
    assert!(linker.link_wikidata("Paris", &EntityLabel::Gpe).await.is_none());
    assert!(linker.link_dbpedia("Paris", &EntityLabel::Gpe).await.is_none());
}

#[tokio::test]
async fn test_linker_unreachable_service_is_absent() {
    setup_tracing();

    let config = LinkingConfig {
        wikidata_endpoint: "http://127.0.0.1:1/sparql".to_string(),
        dbpedia_endpoint: "http://127.0.0.1:1/rest/annotate".to_string(),
        timeout_secs: 1,
        ..Default::default()
    };
    let linker = EntityLinker::from_config(&NerConfig::default(), &config).unwrap();
    assert!(linker.link_wikidata("Paris", &EntityLabel::Gpe).await.is_none());
    assert!(linker.link_dbpedia("Paris", &EntityLabel::Gpe).await.is_none());
}

#[tokio::test]
async fn test_disabled_resolvers_make_no_requests() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ner = NerConfig {
        enable_wikidata: false,
        enable_dbpedia: false,
        ..Default::default()
    };
    let linker = EntityLinker::from_config(&ner, &linking_config(&server)).unwrap();
    assert!(!linker.is_enabled());
    assert!(linker.link_wikidata("Paris", &EntityLabel::Gpe).await.is_none());
    assert!(linker.link_dbpedia("Paris", &EntityLabel::Gpe).await.is_none());
}
