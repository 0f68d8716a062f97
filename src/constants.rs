//! # System Constants
//!
//! Fixed names shared by the query builder, the transformer and the orchestrator.

/// Identifier column present on every queryable object
pub const ID_FIELD: &str = "Id";

/// Object type used for owner/assignee references
pub const USER_OBJECT: &str = "User";

/// Environment-managed metadata columns excluded from read queries and write payloads
pub const SYSTEM_COLUMNS: &[&str] = &[
    "IsDeleted",
    "CreatedDate",
    "CreatedById",
    "LastModifiedDate",
    "LastModifiedById",
    "SystemModstamp",
    "LastViewedDate",
    "LastReferencedDate",
];

/// Environment variable prefix for configuration overrides (`SANDBOXBERRY__RETRY__MAX_ATTEMPTS`)
pub const CONFIG_ENV_PREFIX: &str = "SANDBOXBERRY";

/// Environment variable selecting the runtime environment (development, test, production)
pub const ENVIRONMENT_VAR: &str = "SANDBOXBERRY_ENV";

/// Component names used in structured log records
pub mod components {
    pub const QUERY_BUILDER: &str = "query_builder";
    pub const RELATION_MAPPER: &str = "relation_mapper";
    pub const TRANSFORMER: &str = "object_transformer";
    pub const ORCHESTRATOR: &str = "migration_orchestrator";
    pub const CLIENT: &str = "data_api_client";
}

/// Check whether a column is one of the environment-managed system columns.
///
/// API names are case-insensitive on the remote side, so the comparison is too.
pub fn is_system_column(column: &str) -> bool {
    SYSTEM_COLUMNS
        .iter()
        .any(|system| system.eq_ignore_ascii_case(column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_column_detection() {
        assert!(is_system_column("CreatedDate"));
        assert!(is_system_column("systemmodstamp"));
        assert!(!is_system_column("Id"));
        assert!(!is_system_column("Name"));
        assert!(!is_system_column("CreatedDate__c"));
    }
}
