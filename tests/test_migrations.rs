//! End-to-end migration runs: a real `IndexManager` against a mock engine.

use std::io::Write;

use griddle::{Config, GriddleError, IndexManager};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREFIX: &str = "rode";
const SOURCE: &str = "rode-v1alpha1-policies";
const TARGET: &str = "rode-v1beta1-policies";
const ALIAS: &str = "rode-policies";
const TASK: &str = "node-1:7";

/// Opt into test logs with e.g. `RUST_LOG=griddle=debug cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn write_mapping(dir: &std::path::Path, kind: &str, version: &str) {
    let mut file = std::fs::File::create(dir.join(format!("{}.json", kind))).unwrap();
    file.write_all(
        serde_json::json!({
            "version": version,
            "mappings": {"_meta": {"type": PREFIX}}
        })
        .to_string()
        .as_bytes(),
    )
    .unwrap();
}

fn manager(dir: &std::path::Path, engine_url: &str) -> IndexManager {
    IndexManager::new(Config::new(PREFIX, dir), engine_url).unwrap()
}

#[tokio::test]
async fn test_stale_index_is_migrated_end_to_end() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            SOURCE: {"mappings": {"_meta": {"type": PREFIX}}},
            "kibana-internal": {"mappings": {}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/_settings", SOURCE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            SOURCE: {"settings": {"index": {"blocks": {}}}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/{}/_block/write", SOURCE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "acknowledged": true,
            "shards_acknowledged": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(format!("/{}", TARGET)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    // the new index is created with the current mapping and the alias
    Mock::given(method("PUT"))
        .and(path(format!("/{}", TARGET)))
        .and(body_json(serde_json::json!({
            "mappings": {"_meta": {"type": PREFIX}},
            "aliases": {ALIAS: {}}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_reindex"))
        .and(body_json(serde_json::json!({
            "conflicts": "proceed",
            "source": {"index": SOURCE},
            "dest": {"index": TARGET, "op_type": "create"}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"task": TASK})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/_tasks/{}", TASK)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"completed": true})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/.tasks/_doc/{}", TASK)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_aliases"))
        .and(body_json(serde_json::json!({
            "actions": [
                {"remove": {"index": SOURCE, "alias": ALIAS}},
                {"add": {"index": TARGET, "alias": ALIAS}}
            ]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/{}", SOURCE)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_mapping(dir.path(), "policies", "v1beta1");

    manager(dir.path(), &server.uri())
        .initialize(&CancellationToken::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_everything_current_is_a_noop() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            TARGET: {"mappings": {"_meta": {"type": PREFIX}}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_mapping(dir.path(), "policies", "v1beta1");

    manager(dir.path(), &server.uri())
        .initialize(&CancellationToken::new())
        .await
        .unwrap();

    // only the catalog fetch should have gone out
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_mappings_directory_fails_construction() {
    let err = IndexManager::new(
        Config::new(PREFIX, "/nonexistent/mappings"),
        "http://localhost:9200",
    )
    .unwrap_err();
    assert!(matches!(err, GriddleError::MappingLoad(_)));
}

#[tokio::test]
async fn test_registry_is_queryable_through_the_manager() {
    let dir = tempfile::tempdir().unwrap();
    write_mapping(dir.path(), "policies", "v1beta1");

    let manager = manager(dir.path(), "http://localhost:9200");
    assert_eq!(manager.registry().version("policies"), Some("v1beta1"));
    assert_eq!(
        manager.registry().index_name("policies", "test"),
        "rode-v1beta1-test-policies"
    );
    assert_eq!(
        manager.registry().alias_name("policies", ""),
        "rode-policies"
    );
}
