/*!
 * Offline session tests against a JSON store file
 */

use std::sync::Arc;
use tempfile::tempdir;

use pulsar::{build_registry, exit_code_for, PulsarError, Session};
use pulsar_core_people::{parse_person, JsonFileStore, PeopleStore};
use pulsar_proto::{ResultEnvelope, StatusCode};

fn person(name: &str, height: i32, town: &str, z: i64) -> pulsar_proto::Person {
    let raw = format!(
        r#"{{"name":"{}","coordinates":{{"x":1,"y":2}},"height":{},"eye_color":"ORANGE","nationality":"JAPAN","location":{{"x":0,"y":0,"z":{},"name":"{}"}}}}"#,
        name, height, z, town
    );
    parse_person(&raw).unwrap()
}

fn seeded_store(dir: &std::path::Path) -> Arc<JsonFileStore> {
    let store = Arc::new(JsonFileStore::new(dir.join("people.json")));
    store
        .save(&[
            person("Ann", 100, "Osaka", 1),
            person("Bob", 250, "Kyoto", 9),
        ])
        .unwrap();
    store
}

#[tokio::test]
async fn test_offline_queries_read_store_file() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path());
    let mut session = Session::offline(build_registry().unwrap(), store).unwrap();

    let sum = session.run("sum_of_height", &[]).await;
    assert_eq!(sum, ResultEnvelope::ok("350"));
    assert_eq!(exit_code_for(sum.status), 0);

    let filtered = session.run("filter_contains_name", &["nn".to_string()]).await;
    assert!(filtered.is_ok());
    assert!(filtered.text().contains("Ann"));
    assert!(!filtered.text().contains("Bob"));

    let locations = session.run("print_field_descending_location", &[]).await;
    let text = locations.text();
    assert!(text.find("Osaka").unwrap() < text.find("Kyoto").unwrap());
}

#[tokio::test]
async fn test_offline_missing_id_fails_with_exit_code() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path());
    let mut session = Session::offline(build_registry().unwrap(), store).unwrap();

    let missing = session.run("remove_by_id", &["999".to_string()]).await;
    assert_eq!(missing.status, StatusCode::ElementNotFound);
    assert_eq!(exit_code_for(missing.status), 1);
}

#[tokio::test]
async fn test_offline_changes_reach_file_only_on_save() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path());
    let mut session = Session::offline(build_registry().unwrap(), store.clone()).unwrap();

    assert!(session.run("clear", &[]).await.is_ok());
    assert_eq!(store.load().unwrap().len(), 2);

    assert!(session.run("save", &[]).await.is_ok());
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_store_with_highest_id_is_fatal() {
    let dir = tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("people.json")));
    let mut last = person("Ann", 100, "Osaka", 1);
    last.id = i64::MAX;
    store.save(&[last]).unwrap();

    let result = Session::offline(build_registry().unwrap(), store);
    match result {
        Err(err @ PulsarError::Store(_)) => {
            assert_eq!(err.exit_code(), 2);
            assert!(err.to_string().contains(&i64::MAX.to_string()));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("store with id {} loaded", i64::MAX),
    }
}

#[test]
fn test_corrupt_store_file_is_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = Session::offline(build_registry().unwrap(), Arc::new(JsonFileStore::new(path)));
    match result {
        Err(err @ PulsarError::Store(_)) => assert_eq!(err.exit_code(), 2),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("corrupt store loaded"),
    }
}
