use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
pub mod ids;
pub mod model;
pub mod mutation;
pub mod node;

pub use error::{EditError, InvalidReason};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use model::{
    EdgeKind, EdgeRecord, NodeLocation, Orphan, OrphanKind, TreeDocument, TreeModel, TreeSlot,
};
pub use mutation::{EditOutcome, MovePlan, Mutation};
pub use node::{Node, NodeMeta, NodePatch};

/// Opaque page identifier. Unique across the root tree and every orphan tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
