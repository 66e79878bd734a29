use crate::{EdgeId, NodeId};
use thiserror::Error;

/// Why a structurally well-formed request was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    #[error("the root page cannot be deleted or moved")]
    RootImmutable,
    #[error("a page cannot become its own parent")]
    SelfParent,
    #[error("target parent lies inside the moved subtree")]
    Cycle,
    #[error("page id {0} already exists")]
    DuplicateId(NodeId),
    #[error("edge id {0} already exists")]
    DuplicateEdge(EdgeId),
    #[error("page {0} is not an orphan head")]
    NotAnOrphan(NodeId),
}

/// Error taxonomy of the mutation layer.
///
/// A request that is valid but would not change anything is not an error; it
/// is reported as [`crate::EditOutcome::NoOp`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("page {0} not found")]
    NotFound(NodeId),
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),
    #[error("invalid operation: {0}")]
    InvalidOperation(InvalidReason),
}

impl From<InvalidReason> for EditError {
    fn from(reason: InvalidReason) -> Self {
        EditError::InvalidOperation(reason)
    }
}
