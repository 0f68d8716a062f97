//! # Query Builder
//!
//! Builds the read queries issued against the source organization and strips
//! environment-managed columns from column lists before queries and writes.
//!
//! ## Key Components
//!
//! - [`builder`] - Fluent [`SoqlQuery`] builder and the [`build_query`] shorthand
//! - [`columns`] - System column filtering ([`remove_system_columns`])
//!
//! ## Example Usage
//!
//! ```rust
//! use sandboxberry::query_builder::{build_query, remove_system_columns};
//!
//! let columns = vec!["Id".to_string(), "Name".to_string(), "CreatedDate".to_string()];
//! let columns = remove_system_columns(&columns);
//! let query = build_query("Account", &columns, Some("Industry = 'Retail'"), Some(50)).unwrap();
//! assert_eq!(query, "select Id, Name from Account where Industry = 'Retail' limit 50");
//! ```
//!
//! Both operations are pure string and collection transforms.

pub mod builder;
pub mod columns;

pub use builder::{build_query, QueryBuildError, SoqlQuery};
pub use columns::remove_system_columns;
