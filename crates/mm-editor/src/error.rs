//! Editor error types.

use mm_core::id::{ConnectionId, NodeId};
use thiserror::Error;

/// Failures reported by a `MindMapStore`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    #[error("Duplicate id: {0}")]
    Duplicate(String),

    #[error("Store backend failed: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Failures of the external generation service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    Request(String),

    #[error("Generation response did not match the requested schema: {0}")]
    InvalidResponse(String),
}

/// Errors raised by editor operations. The canvas turns these into
/// notifications; none of them are fatal.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    #[error("Connection not found: {0}")]
    UnknownConnection(ConnectionId),

    #[error("Node {0} is not an entity")]
    NotAnEntity(NodeId),

    #[error("AI enhance is already running")]
    EnhanceInFlight,

    #[error("No AI enhance is running")]
    NoEnhanceInFlight,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
