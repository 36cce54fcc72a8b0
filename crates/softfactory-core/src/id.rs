//! Resource identifiers.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Logical identifier of a resource inside one graph.
///
/// Identifiers are path-like (`network/private-subnet-1`) and derived only from
/// configuration, so the same input always yields the same identifiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier of a resource nested under this one.
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}/{}", self.0, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_ids_nest() {
        let network = ResourceId::new("network");
        assert_eq!(network.child("private-subnet-1").as_str(), "network/private-subnet-1");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ResourceId::new("artifact-store");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"artifact-store\"");
    }
}
