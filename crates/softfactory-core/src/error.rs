//! Resource graph invariant errors.

use thiserror::Error;

use crate::ResourceId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate resource id: {0}")]
    DuplicateResource(ResourceId),

    #[error("naming collision: '{name}' is used by both {first} and {second}")]
    NamingCollision {
        name: String,
        first: ResourceId,
        second: ResourceId,
    },

    #[error("{owner} references unknown resource {missing}")]
    DanglingReference {
        owner: ResourceId,
        missing: ResourceId,
    },

    #[error("cycle detected in dependencies: {0}")]
    CycleDetected(String),
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
