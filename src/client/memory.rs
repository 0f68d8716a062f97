//! # In-Memory Organization
//!
//! A self-contained [`DataApiClient`] holding records in process memory. It mints its
//! own identifiers, so it behaves like a real destination with a separate identifier
//! space. Used for rehearsal runs from a JSON snapshot and throughout the tests.
//!
//! Query support covers what the query builder emits: a column list, one object type,
//! an optional filter of `Field = value` terms joined by `and`, and an optional limit.
//! Filter terms outside that subset (relationship paths, other operators) are ignored
//! with a warning.
//!
//! ```rust
//! use sandboxberry::client::{DataApiClient, InMemoryOrg};
//! use sandboxberry::models::SourceRecord;
//!
//! # tokio_test::block_on(async {
//! let org = InMemoryOrg::new("source");
//! org.seed(SourceRecord::new("Account", "001A").with_field("Name", "Acme"));
//!
//! let records = org.query("select Id, Name from Account").await.unwrap();
//! assert_eq!(records[0].id, "001A");
//! # });
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use tracing::{debug, warn};

use super::errors::ApiError;
use super::traits::DataApiClient;
use crate::constants::{is_system_column, ID_FIELD};
use crate::models::{FieldMap, SourceRecord};

/// Operation kinds that can be scripted to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrgOperation {
    Query,
    Create,
    Update,
}

/// A record as stored by the organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub object_type: String,
    pub id: String,
    pub fields: FieldMap,
}

impl StoredRecord {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Default)]
struct OrgState {
    /// Keyed by lowercase object type; insertion order preserved per type
    records: BTreeMap<String, Vec<StoredRecord>>,
    next_id: u64,
    scripted_failures: HashMap<(OrgOperation, String), VecDeque<ApiError>>,
    queries: Vec<String>,
    create_calls: usize,
    update_calls: usize,
}

#[derive(Debug)]
pub struct InMemoryOrg {
    name: String,
    current_user_id: Option<String>,
    state: Mutex<OrgState>,
}

impl InMemoryOrg {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            current_user_id: None,
            state: Mutex::new(OrgState::default()),
        }
    }

    pub fn with_current_user(mut self, user_id: &str) -> Self {
        self.current_user_id = Some(user_id.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a record under its existing identifier
    pub fn seed(&self, record: SourceRecord) {
        let mut state = self.state.lock();
        let stored = StoredRecord {
            object_type: record.object_type.clone(),
            id: record.id,
            fields: record.fields,
        };
        state
            .records
            .entry(record.object_type.to_ascii_lowercase())
            .or_default()
            .push(stored);
    }

    pub fn seed_all(&self, records: impl IntoIterator<Item = SourceRecord>) {
        for record in records {
            self.seed(record);
        }
    }

    /// Build an organization from a JSON array of source records
    pub fn from_snapshot_file(name: &str, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let records: Vec<SourceRecord> = serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let org = Self::new(name);
        org.seed_all(records);
        Ok(org)
    }

    /// Make the next calls of `operation` on `object_type` fail with the given errors, in order
    pub fn fail_next(&self, operation: OrgOperation, object_type: &str, errors: Vec<ApiError>) {
        let mut state = self.state.lock();
        state
            .scripted_failures
            .entry((operation, object_type.to_ascii_lowercase()))
            .or_default()
            .extend(errors);
    }

    pub fn records(&self, object_type: &str) -> Vec<StoredRecord> {
        self.state
            .lock()
            .records
            .get(&object_type.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn get(&self, object_type: &str, id: &str) -> Option<StoredRecord> {
        self.state
            .lock()
            .records
            .get(&object_type.to_ascii_lowercase())
            .and_then(|records| records.iter().find(|r| r.id == id).cloned())
    }

    /// First record of a type whose `field` equals the given string
    pub fn find_by(&self, object_type: &str, field: &str, value: &str) -> Option<StoredRecord> {
        self.records(object_type)
            .into_iter()
            .find(|r| r.field_str(field) == Some(value))
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().queries.clone()
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().create_calls
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().update_calls
    }

    fn take_scripted_failure(
        state: &mut OrgState,
        operation: OrgOperation,
        object_type: &str,
    ) -> Option<ApiError> {
        state
            .scripted_failures
            .get_mut(&(operation, object_type.to_ascii_lowercase()))
            .and_then(VecDeque::pop_front)
    }

    fn check_writable(operation: &str, fields: &FieldMap) -> Result<(), ApiError> {
        if let Some(name) = fields
            .keys()
            .find(|name| name.eq_ignore_ascii_case(ID_FIELD) || is_system_column(name))
        {
            return Err(ApiError::validation(
                operation,
                format!("field '{name}' is not writeable"),
            ));
        }
        Ok(())
    }
}

/// Parsed subset of the query dialect
#[derive(Debug, PartialEq)]
struct ParsedQuery {
    columns: Vec<String>,
    object_type: String,
    predicates: Vec<(String, Value)>,
    limit: Option<usize>,
}

fn find_keyword(haystack: &str, keyword: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(keyword)
}

/// Split on a lowercase keyword, matching it case-insensitively
fn split_keyword<'a>(haystack: &'a str, keyword: &str) -> Vec<&'a str> {
    let lowered = haystack.to_ascii_lowercase();
    let mut parts = Vec::new();
    let mut start = 0;
    while let Some(offset) = lowered[start..].find(keyword) {
        parts.push(&haystack[start..start + offset]);
        start += offset + keyword.len();
    }
    parts.push(&haystack[start..]);
    parts
}

fn parse_literal(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Value::String(raw[1..raw.len() - 1].to_string());
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

fn parse_query(query: &str) -> Result<ParsedQuery, ApiError> {
    let malformed = |reason: &str| ApiError::validation("query", format!("{reason}: {query}"));

    let trimmed = query.trim();
    if !trimmed.to_ascii_lowercase().starts_with("select ") {
        return Err(malformed("query must start with select"));
    }
    let from_at = find_keyword(trimmed, " from ").ok_or_else(|| malformed("missing from"))?;
    let columns: Vec<String> = trimmed["select ".len()..from_at]
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let mut rest = &trimmed[from_at + " from ".len()..];

    let mut limit = None;
    if let Some(limit_at) = find_keyword(rest, " limit ") {
        let raw = rest[limit_at + " limit ".len()..].trim();
        limit = Some(raw.parse::<usize>().map_err(|_| malformed("bad limit"))?);
        rest = &rest[..limit_at];
    }

    let mut predicates = Vec::new();
    let object_type = match find_keyword(rest, " where ") {
        Some(where_at) => {
            let filter = &rest[where_at + " where ".len()..];
            for term in split_keyword(filter, " and ") {
                match term.split_once('=') {
                    Some((field, literal))
                        if !field.contains('.')
                            && !field.trim_end().ends_with(&['!', '<', '>'][..]) =>
                    {
                        predicates.push((field.trim().to_string(), parse_literal(literal)));
                    }
                    _ => warn!(term = %term.trim(), "Ignoring unsupported filter term"),
                }
            }
            rest[..where_at].trim().to_string()
        }
        None => rest.trim().to_string(),
    };

    if object_type.is_empty() || columns.is_empty() {
        return Err(malformed("missing object type or columns"));
    }

    Ok(ParsedQuery {
        columns,
        object_type,
        predicates,
        limit,
    })
}

#[async_trait]
impl DataApiClient for InMemoryOrg {
    async fn query(&self, query: &str) -> Result<Vec<SourceRecord>, ApiError> {
        let parsed = parse_query(query)?;
        let mut state = self.state.lock();
        state.queries.push(query.to_string());

        if let Some(err) = Self::take_scripted_failure(&mut state, OrgOperation::Query, &parsed.object_type)
        {
            return Err(err);
        }

        let stored = state
            .records
            .get(&parsed.object_type.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default();

        let matches = stored.into_iter().filter(|record| {
            parsed.predicates.iter().all(|(field, expected)| {
                record.fields.get(field).unwrap_or(&Value::Null) == expected
            })
        });

        let records: Vec<SourceRecord> = matches
            .take(parsed.limit.unwrap_or(usize::MAX))
            .map(|record| {
                let mut fields = FieldMap::new();
                for column in &parsed.columns {
                    if column.eq_ignore_ascii_case(ID_FIELD) {
                        fields.insert(column.clone(), Value::String(record.id.clone()));
                    } else {
                        let value = record.fields.get(column).cloned().unwrap_or(Value::Null);
                        fields.insert(column.clone(), value);
                    }
                }
                SourceRecord {
                    object_type: record.object_type,
                    id: record.id,
                    fields,
                }
            })
            .collect();

        debug!(
            org = %self.name,
            object_type = %parsed.object_type,
            returned = records.len(),
            "In-memory query"
        );
        Ok(records)
    }

    async fn create(&self, object_type: &str, fields: &FieldMap) -> Result<String, ApiError> {
        let mut state = self.state.lock();
        state.create_calls += 1;

        if let Some(err) = Self::take_scripted_failure(&mut state, OrgOperation::Create, object_type) {
            return Err(err);
        }
        Self::check_writable("create", fields)?;

        state.next_id += 1;
        let id = format!("{}-{:06}", self.name, state.next_id);
        state
            .records
            .entry(object_type.to_ascii_lowercase())
            .or_default()
            .push(StoredRecord {
                object_type: object_type.to_string(),
                id: id.clone(),
                fields: fields.clone(),
            });
        Ok(id)
    }

    async fn update(
        &self,
        object_type: &str,
        id: &str,
        fields: &FieldMap,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        state.update_calls += 1;

        if let Some(err) = Self::take_scripted_failure(&mut state, OrgOperation::Update, object_type) {
            return Err(err);
        }
        Self::check_writable("update", fields)?;

        let record = state
            .records
            .get_mut(&object_type.to_ascii_lowercase())
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| ApiError::not_found("update", format!("{object_type}/{id}")))?;

        for (name, value) in fields {
            record.fields.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    fn current_user_id(&self) -> Option<String> {
        self.current_user_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiErrorKind;
    use serde_json::json;

    fn seeded() -> InMemoryOrg {
        let org = InMemoryOrg::new("src");
        org.seed(
            SourceRecord::new("Account", "001A")
                .with_field("Name", "Acme")
                .with_field("Help__c", true),
        );
        org.seed(
            SourceRecord::new("Account", "001B")
                .with_field("Name", "Globex")
                .with_field("Help__c", false),
        );
        org
    }

    #[test]
    fn test_parse_query_with_filter_and_limit() {
        let parsed =
            parse_query("select Id, Name from Account where Name = 'Acme' and Help__c = true limit 5")
                .unwrap();
        assert_eq!(parsed.columns, vec!["Id", "Name"]);
        assert_eq!(parsed.object_type, "Account");
        assert_eq!(
            parsed.predicates,
            vec![
                ("Name".to_string(), json!("Acme")),
                ("Help__c".to_string(), json!(true))
            ]
        );
        assert_eq!(parsed.limit, Some(5));
    }

    #[test]
    fn test_parse_query_rejects_garbage() {
        assert!(parse_query("delete everything").is_err());
    }

    #[tokio::test]
    async fn test_query_projects_and_filters() {
        let org = seeded();
        let rows = org
            .query("select Id, Name from Account where Help__c = true")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "001A");
        assert_eq!(json!(rows[0].fields), json!({"Id": "001A", "Name": "Acme"}));
    }

    #[tokio::test]
    async fn test_relationship_path_filter_is_ignored() {
        let org = seeded();
        let rows = org
            .query("select Id from Account where Parent__r.Help__c = true limit 1")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_create_mints_new_ids_and_update_patches() {
        let org = InMemoryOrg::new("dst");
        let mut fields = FieldMap::new();
        fields.insert("Name".into(), json!("Acme"));

        let id = org.create("Account", &fields).await.unwrap();
        assert_eq!(id, "dst-000001");

        let mut patch = FieldMap::new();
        patch.insert("ParentId".into(), json!("dst-000009"));
        org.update("Account", &id, &patch).await.unwrap();

        let stored = org.get("Account", &id).unwrap();
        assert_eq!(stored.field_str("ParentId"), Some("dst-000009"));
        assert_eq!(org.create_calls(), 1);
        assert_eq!(org.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_id_and_system_columns() {
        let org = InMemoryOrg::new("dst");
        let mut fields = FieldMap::new();
        fields.insert("CreatedDate".into(), json!("2020-01-01"));
        let err = org.create("Account", &fields).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_scripted_failures_are_consumed_in_order() {
        let org = InMemoryOrg::new("dst");
        org.fail_next(
            OrgOperation::Create,
            "Account",
            vec![ApiError::rate_limited("create", "slow down")],
        );
        let fields = FieldMap::new();
        assert_eq!(
            org.create("Account", &fields).await.unwrap_err().kind,
            ApiErrorKind::RateLimited
        );
        assert!(org.create("Account", &fields).await.is_ok());
    }
}
