//! File-driven runs: manifests, configuration and record snapshots read from disk

mod common;

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use common::*;
use sandboxberry::client::InMemoryOrg;
use sandboxberry::config::{ConfigManager, UserSubstitution};
use sandboxberry::manifest::{FieldBehavior, Manifest, ManifestError};
use sandboxberry::orchestration::{DependencyGraph, MigrationOrchestrator};
use sandboxberry::query_builder::build_query;

const MANIFEST_YAML: &str = r#"
objects:
  - api_name: Contact
    fields:
      - name: LastName
      - name: AccountId
        behavior: relation
        references: Account
        required: true
      - name: Birthdate
        behavior: skip
  - api_name: Account
    filter: "Help_Sandbox_Data_Set__c = true"
    fields:
      - name: Name
      - name: ParentId
        behavior: recursive
"#;

const SNAPSHOT_JSON: &str = r#"[
  {"object_type": "Account", "id": "001A", "fields": {"Name": "Acme", "ParentId": null, "Help_Sandbox_Data_Set__c": true}},
  {"object_type": "Account", "id": "001B", "fields": {"Name": "Acme West", "ParentId": "001A", "Help_Sandbox_Data_Set__c": true}},
  {"object_type": "Account", "id": "001C", "fields": {"Name": "Unused", "ParentId": null, "Help_Sandbox_Data_Set__c": false}},
  {"object_type": "Contact", "id": "003A", "fields": {"LastName": "Smith", "AccountId": "001B", "Birthdate": "1980-01-01"}}
]"#;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_yaml_manifest_loads_and_plans() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "manifest.yaml", MANIFEST_YAML);

    let manifest = Manifest::load_from_file(&path).unwrap();
    assert_eq!(manifest.object_names(), vec!["Contact", "Account"]);

    let contact = manifest.object("contact").unwrap();
    assert_eq!(contact.field("Birthdate").unwrap().behavior, FieldBehavior::Skip);
    assert_eq!(contact.dependencies(), vec!["Account".to_string()]);

    let plan = DependencyGraph::from_manifest(&manifest).plan();
    assert_eq!(plan.order(), vec!["Account", "Contact"]);

    let account = manifest.object("Account").unwrap();
    let query = build_query(
        &account.api_name,
        &account.queryable_columns(),
        account.filter.as_deref(),
        account.row_limit,
    )
    .unwrap();
    assert_eq!(
        query,
        "select Id, Name, ParentId from Account where Help_Sandbox_Data_Set__c = true"
    );
}

#[test]
fn test_invalid_manifests_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();

    let duplicate = write_file(
        &dir,
        "duplicate.yml",
        "objects:\n  - api_name: Account\n  - api_name: account\n",
    );
    assert!(matches!(
        Manifest::load_from_file(&duplicate),
        Err(ManifestError::Invalid { .. })
    ));

    let two_recursive = write_file(
        &dir,
        "recursive.yaml",
        r#"
objects:
  - api_name: Account
    fields:
      - name: ParentId
        behavior: recursive
      - name: MasterRecordId
        behavior: recursive
"#,
    );
    assert!(matches!(
        Manifest::load_from_file(&two_recursive),
        Err(ManifestError::Invalid { .. })
    ));

    let untargeted = write_file(
        &dir,
        "untargeted.yaml",
        "objects:\n  - api_name: Contact\n    fields:\n      - name: AccountId\n        behavior: relation\n",
    );
    assert!(Manifest::load_from_file(&untargeted).is_err());

    let malformed = write_file(&dir, "broken.json", "{ \"objects\": [");
    assert!(matches!(
        Manifest::load_from_file(&malformed),
        Err(ManifestError::Parse { .. })
    ));

    assert!(matches!(
        Manifest::load_from_file(dir.path().join("absent.yaml")),
        Err(ManifestError::FileRead { .. })
    ));
}

#[test]
fn test_starter_manifest_round_trips_through_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("starter.yml");

    let manifest = Manifest::starter(&["Account", "Contact", "Case"]);
    manifest.save_to_file(&path).unwrap();

    let loaded = Manifest::load_from_file(&path).unwrap();
    assert_eq!(loaded, manifest);
    assert!(loaded.objects.iter().all(|object| object.fields.is_empty()));
}

#[test]
fn test_config_file_with_environment_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "sandboxberry.yaml",
        r#"
migration:
  max_concurrent_submissions: 2
  default_row_limit: 500
users:
  fallback_user_id: "005FALLBACK"
  inactive_users: "null"
"#,
    );
    let env = HashMap::from([(
        "SANDBOXBERRY__RETRY__MAX_ATTEMPTS".to_string(),
        "7".to_string(),
    )]);

    let manager = ConfigManager::load_with_env(Some(path.clone()), Some(env)).unwrap();
    let config = manager.config();

    assert_eq!(manager.config_file(), Some(path.as_path()));
    assert_eq!(config.migration.max_concurrent_submissions, 2);
    assert_eq!(config.migration.default_row_limit, Some(500));
    assert_eq!(config.retry.max_attempts, 7);
    assert_eq!(config.users.fallback_user_id.as_deref(), Some("005FALLBACK"));
    assert_eq!(config.users.inactive_users, UserSubstitution::Null);
    assert_eq!(config.users.missing_users, UserSubstitution::FallbackUser);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ConfigManager::load_with_env(Some(dir.path().join("nope.yaml")), None).is_err());
}

#[tokio::test]
async fn test_rehearsal_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = write_file(&dir, "manifest.yaml", MANIFEST_YAML);
    let snapshot_path = write_file(&dir, "snapshot.json", SNAPSHOT_JSON);

    let manifest = Manifest::load_from_file(&manifest_path).unwrap();
    let source = Arc::new(InMemoryOrg::from_snapshot_file("source", &snapshot_path).unwrap());
    let destination = Arc::new(InMemoryOrg::new("destination"));

    let report = MigrationOrchestrator::new(
        source.clone(),
        destination.clone(),
        config_manager(fast_config()),
    )
    .run(&manifest)
    .await
    .unwrap();

    assert!(report.is_clean(), "{report:#?}");
    // 001C is excluded by the filter
    assert_eq!(report.created, 3);
    assert_eq!(report.patched, 1);

    let acme = destination_id(&destination, "Account", "Name", "Acme");
    let west = destination_id(&destination, "Account", "Name", "Acme West");
    assert_eq!(
        destination_field(&destination, "Account", "Name", "Acme West", "ParentId"),
        Some(acme)
    );
    assert_eq!(
        destination_field(&destination, "Contact", "LastName", "Smith", "AccountId"),
        Some(west)
    );
    let smith = destination.find_by("Contact", "LastName", "Smith").unwrap();
    assert!(smith.field("Birthdate").is_none());

    let json = report.to_json_pretty().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["created"], 3);
    assert_eq!(parsed["plan"]["levels"][0][0], "Account");
}
