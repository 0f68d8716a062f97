use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

use super::errors::TransformError;
use crate::config::{UserRemapConfig, UserSubstitution};
use crate::constants::USER_OBJECT;
use crate::manifest::{FieldBehavior, ManifestObject};
use crate::mapping::RelationMapper;
use crate::models::{is_blank, LookupDeferral, RecordWrapper, SourceRecord, UserRemapSets};

/// Substitution applied to user references that cannot be targeted in the destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFallbackPolicy {
    /// Destination user written in place of missing/inactive users
    pub fallback_user_id: Option<String>,
    pub missing_users: UserSubstitution,
    pub inactive_users: UserSubstitution,
}

impl Default for UserFallbackPolicy {
    fn default() -> Self {
        Self::from_config(&UserRemapConfig::default(), None)
    }
}

impl UserFallbackPolicy {
    /// Build from configuration; `current_user_id` is used when no fallback user is configured
    pub fn from_config(config: &UserRemapConfig, current_user_id: Option<String>) -> Self {
        Self {
            fallback_user_id: config.fallback_user_id.clone().or(current_user_id),
            missing_users: config.missing_users,
            inactive_users: config.inactive_users,
        }
    }

    fn substitute(&self, substitution: UserSubstitution) -> Option<&str> {
        match substitution {
            UserSubstitution::FallbackUser => self.fallback_user_id.as_deref(),
            UserSubstitution::Null => None,
        }
    }
}

/// Side results of transforming one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutcome {
    /// References written as null that must be patched once their targets exist
    pub deferrals: Vec<LookupDeferral>,
}

impl TransformOutcome {
    pub fn is_fully_resolved(&self) -> bool {
        self.deferrals.is_empty()
    }
}

/// A record ready for submission plus the references still owed to it
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    pub record: RecordWrapper,
    pub deferrals: Vec<LookupDeferral>,
}

/// Applies one manifest object's field options to records of that type
#[derive(Debug, Clone)]
pub struct ObjectTransformer {
    object: Arc<ManifestObject>,
    mapper: Arc<RelationMapper>,
    users: Arc<UserRemapSets>,
    user_policy: UserFallbackPolicy,
    recursive_relationship_field: Option<String>,
}

impl ObjectTransformer {
    /// Create a transformer with empty user sets and the default user policy.
    ///
    /// The recursive relationship field is taken from the manifest object, if it declares one.
    pub fn new(object: Arc<ManifestObject>, mapper: Arc<RelationMapper>) -> Self {
        let recursive_relationship_field = object.recursive_field().map(|option| option.name.clone());
        Self {
            object,
            mapper,
            users: Arc::new(UserRemapSets::default()),
            user_policy: UserFallbackPolicy::default(),
            recursive_relationship_field,
        }
    }

    pub fn with_user_remap(mut self, users: Arc<UserRemapSets>) -> Self {
        self.users = users;
        self
    }

    pub fn with_user_policy(mut self, policy: UserFallbackPolicy) -> Self {
        self.user_policy = policy;
        self
    }

    /// Treat `field` as the self reference, whether or not the manifest configures it
    pub fn with_recursive_relationship_field(mut self, field: &str) -> Self {
        self.recursive_relationship_field = Some(field.to_string());
        self
    }

    pub fn object_type(&self) -> &str {
        &self.object.api_name
    }

    pub fn recursive_relationship_field(&self) -> Option<&str> {
        self.recursive_relationship_field.as_deref()
    }


    /// Transform an owned record
    pub fn transform(&self, record: SourceRecord) -> Result<TransformedRecord, TransformError> {
        let mut wrapper = RecordWrapper::new(record);
        let outcome = self.apply_transformations(&mut wrapper)?;
        Ok(TransformedRecord {
            record: wrapper,
            deferrals: outcome.deferrals,
        })
    }

    /// Rewrite `wrapper` in place for the destination.
    ///
    /// Unresolved references are written as null and returned as deferrals. Fails only
    /// when a required field would be submitted empty.
    pub fn apply_transformations(
        &self,
        wrapper: &mut RecordWrapper,
    ) -> Result<TransformOutcome, TransformError> {
        if !wrapper.object_type().eq_ignore_ascii_case(&self.object.api_name) {
            return Err(TransformError::ObjectMismatch {
                expected: self.object.api_name.clone(),
                actual: wrapper.object_type().to_string(),
                source_id: wrapper.source_id().to_string(),
            });
        }

        let mut outcome = TransformOutcome::default();

        for option in &self.object.fields {
            if self.is_recursive_field(&option.name) {
                continue;
            }

            let unresolved = match &option.behavior {
                FieldBehavior::PassThrough => None,
                FieldBehavior::Skip => {
                    wrapper.record.remove_field(&option.name);
                    None
                }
                FieldBehavior::Relation { references } => {
                    self.map_reference(wrapper, &option.name, references, &mut outcome)
                }
                FieldBehavior::User => self.map_user(wrapper, &option.name, &mut outcome),
                // Overridden recursive field: the declared one behaves as a plain self relation
                FieldBehavior::Recursive => {
                    let object_type = self.object.api_name.as_str();
                    self.map_reference(wrapper, &option.name, object_type, &mut outcome)
                }
            };

            if option.required {
                self.ensure_present(wrapper, &option.name, unresolved)?;
            }
        }

        if let Some(field) = self.recursive_relationship_field.as_deref() {
            let unresolved = self.remember_recursive_id(wrapper, field, &mut outcome);
            if self.object.field(field).is_some_and(|option| option.required) {
                self.ensure_present(wrapper, field, unresolved)?;
            }
        }

        Ok(outcome)
    }

    fn is_recursive_field(&self, field: &str) -> bool {
        self.recursive_relationship_field
            .as_deref()
            .is_some_and(|recursive| recursive.eq_ignore_ascii_case(field))
    }

    /// Rewrite one reference through the mapper; returns why the field was left null
    fn map_reference(
        &self,
        wrapper: &mut RecordWrapper,
        field: &str,
        referenced_type: &str,
        outcome: &mut TransformOutcome,
    ) -> Option<String> {
        let source_value = wrapper.record.reference_value(field)?;

        if let Some(destination_id) = self.mapper.resolve(referenced_type, &source_value) {
            wrapper.record.set_field(field, Value::String(destination_id));
            return None;
        }

        wrapper.record.set_field(field, Value::Null);
        let deferral = LookupDeferral::new(
            &self.object.api_name,
            wrapper.source_id(),
            field,
            referenced_type,
            &source_value,
        );
        trace!(deferral = %deferral, "Deferring unresolved reference");
        outcome.deferrals.push(deferral);

        Some(format!("{referenced_type} {source_value} has not been migrated"))
    }

    fn map_user(
        &self,
        wrapper: &mut RecordWrapper,
        field: &str,
        outcome: &mut TransformOutcome,
    ) -> Option<String> {
        let user_id = wrapper.record.reference_value(field)?;

        let substitution = if self.users.is_missing(&user_id) {
            Some(("missing", self.user_policy.missing_users))
        } else if self.users.is_inactive(&user_id) {
            Some(("inactive", self.user_policy.inactive_users))
        } else {
            None
        };

        let Some((status, substitution)) = substitution else {
            return self.map_reference(wrapper, field, USER_OBJECT, outcome);
        };

        match self.user_policy.substitute(substitution) {
            Some(fallback) => {
                debug!(
                    object_type = %self.object.api_name,
                    source_id = %wrapper.source_id(),
                    field = %field,
                    user_id = %user_id,
                    fallback_user_id = %fallback,
                    status,
                    "Substituting user reference"
                );
                wrapper.record.set_field(field, Value::String(fallback.to_string()));
                None
            }
            None => {
                wrapper.record.set_field(field, Value::Null);
                Some(format!("{status} user {user_id} has no substitute"))
            }
        }
    }

    fn remember_recursive_id(
        &self,
        wrapper: &mut RecordWrapper,
        field: &str,
        outcome: &mut TransformOutcome,
    ) -> Option<String> {
        let original_id = wrapper.record.reference_value(field)?;
        let object_type = self.object.api_name.as_str();
        let unresolved = self.map_reference(wrapper, field, object_type, outcome);
        if unresolved.is_some() {
            wrapper.recursive_relationship_original_id = Some(original_id);
        }
        unresolved
    }

    fn ensure_present(
        &self,
        wrapper: &RecordWrapper,
        field: &str,
        unresolved: Option<String>,
    ) -> Result<(), TransformError> {
        if !is_blank(wrapper.record.field(field)) {
            return Ok(());
        }
        Err(TransformError::required_field_unresolvable(
            &self.object.api_name,
            wrapper.source_id(),
            field,
            unresolved.unwrap_or_else(|| "no value on source record".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::FieldOption;
    use serde_json::json;

    fn transformer(object: ManifestObject) -> (ObjectTransformer, Arc<RelationMapper>) {
        let mapper = Arc::new(RelationMapper::new());
        (
            ObjectTransformer::new(Arc::new(object), Arc::clone(&mapper)),
            mapper,
        )
    }

    #[test]
    fn test_missing_recursive_field_does_not_fail() {
        let (transformer, _) = transformer(ManifestObject::new("Account"));
        let transformer = transformer.with_recursive_relationship_field("ParentId");
        let mut wrapper = RecordWrapper::new(
            SourceRecord::new("Account", "001A").with_field("Name", "Acme"),
        );

        let outcome = transformer.apply_transformations(&mut wrapper).unwrap();

        assert_eq!(wrapper.recursive_relationship_original_id, None);
        assert!(outcome.is_fully_resolved());
        assert_eq!(wrapper.record.field("Name"), Some(&json!("Acme")));
    }

    #[test]
    fn test_blank_recursive_field_is_left_alone() {
        let object = ManifestObject::new("Account").with_field(FieldOption::recursive("ParentId"));
        let (transformer, _) = transformer(object);
        let mut wrapper = RecordWrapper::new(
            SourceRecord::new("Account", "001A").with_field("ParentId", Value::Null),
        );

        let outcome = transformer.apply_transformations(&mut wrapper).unwrap();

        assert_eq!(wrapper.recursive_relationship_original_id, None);
        assert!(outcome.deferrals.is_empty());
    }

    #[test]
    fn test_unresolved_recursive_field_is_remembered_and_deferred() {
        let object = ManifestObject::new("Account").with_field(FieldOption::recursive("ParentId"));
        let (transformer, _) = transformer(object);
        let mut wrapper = RecordWrapper::new(
            SourceRecord::new("Account", "001B").with_field("ParentId", "001A"),
        );

        let outcome = transformer.apply_transformations(&mut wrapper).unwrap();

        assert_eq!(
            wrapper.recursive_relationship_original_id.as_deref(),
            Some("001A")
        );
        assert_eq!(wrapper.record.field("ParentId"), Some(&Value::Null));
        assert_eq!(outcome.deferrals.len(), 1);
        let deferral = &outcome.deferrals[0];
        assert_eq!(deferral.referenced_type, "Account");
        assert_eq!(deferral.referenced_source_id, "001A");
        assert_eq!(deferral.record_source_id, "001B");
        assert!(deferral.is_self_reference());
    }

    #[test]
    fn test_resolved_recursive_field_is_rewritten() {
        let object = ManifestObject::new("Account").with_field(FieldOption::recursive("ParentId"));
        let (transformer, mapper) = transformer(object);
        mapper.register("Account", "001A", "NEW-A").unwrap();
        let mut wrapper = RecordWrapper::new(
            SourceRecord::new("Account", "001B").with_field("ParentId", "001A"),
        );

        let outcome = transformer.apply_transformations(&mut wrapper).unwrap();

        assert_eq!(wrapper.recursive_relationship_original_id, None);
        assert_eq!(wrapper.record.field("ParentId"), Some(&json!("NEW-A")));
        assert!(outcome.is_fully_resolved());
    }

    #[test]
    fn test_relation_fields_resolve_or_defer() {
        let object = ManifestObject::new("Contact")
            .with_field(FieldOption::relation("AccountId", "Account"))
            .with_field(FieldOption::relation("ReportsToId", "Contact"));
        let (transformer, mapper) = transformer(object);
        mapper.register("Account", "001A", "NEW-A").unwrap();

        let transformed = transformer
            .transform(
                SourceRecord::new("Contact", "003A")
                    .with_field("AccountId", "001A")
                    .with_field("ReportsToId", "003Z"),
            )
            .unwrap();

        let record = &transformed.record.record;
        assert_eq!(record.field("AccountId"), Some(&json!("NEW-A")));
        assert_eq!(record.field("ReportsToId"), Some(&Value::Null));
        assert_eq!(transformed.deferrals.len(), 1);
        assert_eq!(transformed.deferrals[0].field_name, "ReportsToId");
        assert_eq!(transformed.record.recursive_relationship_original_id, None);
    }

    #[test]
    fn test_user_substitution_policies() {
        let object = ManifestObject::new("Case")
            .with_field(FieldOption::user("OwnerId"))
            .with_field(FieldOption::user("CreatedForId"))
            .with_field(FieldOption::user("AssigneeId"))
            .with_field(FieldOption::user("ReviewerId"));
        let (transformer, mapper) = transformer(object);
        mapper.register(USER_OBJECT, "005KNOWN", "005DEST").unwrap();
        let transformer = transformer
            .with_user_remap(Arc::new(UserRemapSets::new(
                ["005GONE".to_string()],
                ["005MISSING".to_string()],
            )))
            .with_user_policy(UserFallbackPolicy {
                fallback_user_id: Some("005FALLBACK".to_string()),
                missing_users: UserSubstitution::FallbackUser,
                inactive_users: UserSubstitution::Null,
            });

        let transformed = transformer
            .transform(
                SourceRecord::new("Case", "500A")
                    .with_field("OwnerId", "005MISSING")
                    .with_field("CreatedForId", "005GONE")
                    .with_field("AssigneeId", "005KNOWN")
                    .with_field("ReviewerId", ""),
            )
            .unwrap();

        let record = &transformed.record.record;
        assert_eq!(record.field("OwnerId"), Some(&json!("005FALLBACK")));
        assert_eq!(record.field("CreatedForId"), Some(&Value::Null));
        assert_eq!(record.field("AssigneeId"), Some(&json!("005DEST")));
        assert_eq!(record.field("ReviewerId"), Some(&json!("")));
        assert!(transformed.deferrals.is_empty());
    }

    #[test]
    fn test_unknown_user_is_deferred_as_user_reference() {
        let object = ManifestObject::new("Case").with_field(FieldOption::user("OwnerId"));
        let (transformer, _) = transformer(object);

        let transformed = transformer
            .transform(SourceRecord::new("Case", "500A").with_field("OwnerId", "005X"))
            .unwrap();

        assert_eq!(transformed.deferrals.len(), 1);
        assert_eq!(transformed.deferrals[0].referenced_type, USER_OBJECT);
    }

    #[test]
    fn test_required_field_without_fallback_fails_record() {
        let object = ManifestObject::new("Contact")
            .with_field(FieldOption::relation("AccountId", "Account").required());
        let (transformer, _) = transformer(object);

        let err = transformer
            .transform(SourceRecord::new("Contact", "003A").with_field("AccountId", "001Z"))
            .unwrap_err();

        match err {
            TransformError::RequiredFieldUnresolvable {
                field_name, reason, ..
            } => {
                assert_eq!(field_name, "AccountId");
                assert!(reason.contains("001Z"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_required_user_with_fallback_succeeds() {
        let object = ManifestObject::new("Case").with_field(FieldOption::user("OwnerId").required());
        let (transformer, _) = transformer(object);
        let transformer = transformer
            .with_user_remap(Arc::new(UserRemapSets::new(
                ["005GONE".to_string()],
                Vec::<String>::new(),
            )))
            .with_user_policy(UserFallbackPolicy::from_config(
                &UserRemapConfig::default(),
                Some("005ME".to_string()),
            ));

        let transformed = transformer
            .transform(SourceRecord::new("Case", "500A").with_field("OwnerId", "005GONE"))
            .unwrap();

        assert_eq!(transformed.record.record.field("OwnerId"), Some(&json!("005ME")));
    }

    #[test]
    fn test_skip_fields_are_removed_and_unconfigured_fields_pass_through() {
        let object = ManifestObject::new("Account")
            .with_field(FieldOption::skip("Legacy__c"))
            .with_field(FieldOption::pass_through("Name"));
        let (transformer, _) = transformer(object);

        let transformed = transformer
            .transform(
                SourceRecord::new("Account", "001A")
                    .with_field("Name", "Acme")
                    .with_field("Legacy__c", "old")
                    .with_field("Industry", "Retail"),
            )
            .unwrap();

        let record = &transformed.record.record;
        assert_eq!(record.field("Legacy__c"), None);
        assert_eq!(record.field("Name"), Some(&json!("Acme")));
        assert_eq!(record.field("Industry"), Some(&json!("Retail")));
    }

    #[test]
    fn test_wrong_object_type_is_rejected() {
        let (transformer, _) = transformer(ManifestObject::new("Account"));
        let err = transformer
            .transform(SourceRecord::new("Contact", "003A"))
            .unwrap_err();
        assert!(matches!(err, TransformError::ObjectMismatch { .. }));
    }

    #[test]
    fn test_recursive_field_comes_from_manifest() {
        let object = ManifestObject::new("Contact")
            .with_field(FieldOption::relation("AccountId", "Account"))
            .with_field(FieldOption::recursive("ReportsToId"));
        let (transformer, _) = transformer(object);

        assert_eq!(transformer.object_type(), "Contact");
        assert_eq!(transformer.recursive_relationship_field(), Some("ReportsToId"));
    }
}
