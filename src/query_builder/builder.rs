use thiserror::Error;

/// Errors raised while assembling a read query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryBuildError {
    #[error("Cannot build a query for '{object_name}' without any columns")]
    EmptyColumns { object_name: String },
    #[error("Cannot build a query without an object name")]
    EmptyObjectName,
}

/// Read query for a single object type
///
/// Mirrors the remote query dialect: `select <cols> from <object> [where <filter>] [limit <n>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoqlQuery {
    object_name: String,
    select_fields: Vec<String>,
    filter: Option<String>,
    row_limit: Option<u32>,
}

impl SoqlQuery {
    /// Create a new query against the given object type
    pub fn new(object_name: &str) -> Self {
        Self {
            object_name: object_name.to_string(),
            select_fields: Vec::new(),
            filter: None,
            row_limit: None,
        }
    }

    /// Set the columns to select, replacing any previous selection
    pub fn select<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.select_fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self
    }

    /// Set the filter predicate; blank predicates are ignored
    pub fn filter(mut self, predicate: Option<&str>) -> Self {
        self.filter = predicate
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, row_limit: Option<u32>) -> Self {
        self.row_limit = row_limit;
        self
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn columns(&self) -> &[String] {
        &self.select_fields
    }

    /// Build the complete query string
    pub fn build(&self) -> Result<String, QueryBuildError> {
        if self.object_name.trim().is_empty() {
            return Err(QueryBuildError::EmptyObjectName);
        }
        if self.select_fields.is_empty() {
            return Err(QueryBuildError::EmptyColumns {
                object_name: self.object_name.clone(),
            });
        }

        let mut query = format!(
            "select {} from {}",
            self.select_fields.join(", "),
            self.object_name
        );

        if let Some(ref predicate) = self.filter {
            query.push_str(" where ");
            query.push_str(predicate);
        }

        if let Some(limit) = self.row_limit {
            query.push_str(&format!(" limit {limit}"));
        }

        Ok(query)
    }
}

/// Build a read query from an object name, a column list, an optional filter and an optional row limit
pub fn build_query<S: AsRef<str>>(
    object_name: &str,
    columns: &[S],
    filter: Option<&str>,
    row_limit: Option<u32>,
) -> Result<String, QueryBuildError> {
    SoqlQuery::new(object_name)
        .select(columns)
        .filter(filter)
        .limit(row_limit)
        .build()
}
