//! Build session identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one build invocation's analysis results.
///
/// Ids are supplied by the build pipeline and are unique per invocation;
/// once attached to a result they never change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildSessionId(String);

impl BuildSessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random session id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BuildSessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BuildSessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
