//! Logical resource identifiers.
//!
//! Identifiers only depend on configuration, never on construction order, so
//! recompiling unchanged input yields the same identifiers.

use softfactory_core::ResourceId;

pub const ARTIFACT_STORE: &str = "artifact-store";
pub const SOURCE_ARCHIVE_STORE: &str = "source-archive-store";
pub const AUDIT_LOG_STORE: &str = "audit-log-store";
pub const AUDIT_TRAIL: &str = "audit-trail";
pub const NETWORK: &str = "network";
pub const BUILD_ROLE: &str = "build-role";
pub const PIPELINE: &str = "pipeline";

pub const WORKERS: &str = "workers";
pub const WORKBENCH: &str = "workbench";

pub fn id(name: &str) -> ResourceId {
    ResourceId::new(name)
}

/// Subnet of the given tier in the zone with the given 1-based number.
pub fn subnet(tier: &str, zone: u8) -> ResourceId {
    id(NETWORK).child(&format!("{}-subnet-{}", tier, zone))
}

pub fn endpoint(service: &str) -> ResourceId {
    id(NETWORK).child(&format!("{}-endpoint", service))
}

pub fn build_project(action: &str) -> ResourceId {
    id("build").child(action)
}

pub fn worker(part: &str) -> ResourceId {
    id(WORKERS).child(part)
}

pub fn workbench(part: &str) -> ResourceId {
    id(WORKBENCH).child(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_ids() {
        assert_eq!(subnet("private", 1).as_str(), "network/private-subnet-1");
        assert_eq!(endpoint("object-storage").as_str(), "network/object-storage-endpoint");
        assert_eq!(build_project("compile").as_str(), "build/compile");
        assert_eq!(worker("broker").as_str(), "workers/broker");
    }
}
