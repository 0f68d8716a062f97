//! Fixtures shared by the integration suites: fast configuration, seeded
//! organizations and record builders.

use std::sync::Arc;

use sandboxberry::client::InMemoryOrg;
use sandboxberry::config::{ConfigManager, SandboxberryConfig};
use sandboxberry::models::SourceRecord;
use sandboxberry::orchestration::MigrationOrchestrator;

/// Configuration with millisecond retry delays so retry paths stay fast
pub fn fast_config() -> SandboxberryConfig {
    let mut config = SandboxberryConfig::default();
    config.migration.max_concurrent_submissions = 4;
    config.retry.max_attempts = 3;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config.retry.jitter_enabled = false;
    config
}

pub fn config_manager(config: SandboxberryConfig) -> Arc<ConfigManager> {
    ConfigManager::from_config(config).expect("test configuration should be valid")
}

/// Source and destination organizations
pub fn orgs() -> (Arc<InMemoryOrg>, Arc<InMemoryOrg>) {
    (
        Arc::new(InMemoryOrg::new("src")),
        Arc::new(InMemoryOrg::new("dst")),
    )
}

pub fn orchestrator(source: &Arc<InMemoryOrg>, destination: &Arc<InMemoryOrg>) -> MigrationOrchestrator {
    orchestrator_with(source, destination, fast_config())
}

pub fn orchestrator_with(
    source: &Arc<InMemoryOrg>,
    destination: &Arc<InMemoryOrg>,
    config: SandboxberryConfig,
) -> MigrationOrchestrator {
    MigrationOrchestrator::new(
        source.clone(),
        destination.clone(),
        config_manager(config),
    )
}

pub fn account(id: &str, name: &str) -> SourceRecord {
    SourceRecord::new("Account", id).with_field("Name", name)
}

pub fn contact(id: &str, last_name: &str, account_id: &str) -> SourceRecord {
    SourceRecord::new("Contact", id)
        .with_field("LastName", last_name)
        .with_field("AccountId", account_id)
}

/// Destination id of the record whose `field` equals `value`
pub fn destination_id(org: &InMemoryOrg, object_type: &str, field: &str, value: &str) -> String {
    org.find_by(object_type, field, value)
        .unwrap_or_else(|| panic!("{object_type} with {field} = {value} not found"))
        .id
}

/// String value of a field on the destination record whose `field` equals `value`
pub fn destination_field(
    org: &InMemoryOrg,
    object_type: &str,
    key_field: &str,
    key: &str,
    field: &str,
) -> Option<String> {
    org.find_by(object_type, key_field, key)
        .and_then(|record| record.field_str(field).map(str::to_string))
}
