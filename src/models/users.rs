use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Users that cannot be targeted directly in the destination organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRemapSets {
    #[serde(default)]
    pub inactive: HashSet<String>,
    #[serde(default)]
    pub missing: HashSet<String>,
}

impl UserRemapSets {
    pub fn new<I, M>(inactive: I, missing: M) -> Self
    where
        I: IntoIterator<Item = String>,
        M: IntoIterator<Item = String>,
    {
        Self {
            inactive: inactive.into_iter().collect(),
            missing: missing.into_iter().collect(),
        }
    }

    pub fn is_inactive(&self, user_id: &str) -> bool {
        self.inactive.contains(user_id)
    }

    pub fn is_missing(&self, user_id: &str) -> bool {
        self.missing.contains(user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.inactive.is_empty() && self.missing.is_empty()
    }
}
