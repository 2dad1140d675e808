//! Error types for the pf-engine service layer.

use pf_store::{OpStatus, StoreError};

use crate::collaborators::CollaboratorError;

/// Engine error taxonomy.
///
/// `RouteUnavailable` and `ResourceConflict` are operator-recoverable (open
/// a valve, wait, or pick another target). `PreconditionFailed` is a usage
/// error and is never retried automatically. `Store` covers persistence
/// failures inside the atomic step; by then the batch has already been
/// rolled back.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no route available from {from} to {to}")]
    RouteUnavailable { from: String, to: String },

    #[error("route conflicts with active operations on segments: {}", segments.join(", "))]
    ResourceConflict { segments: Vec<String> },

    #[error("operation {op_id} is {status:?}, expected Active")]
    PreconditionFailed { op_id: String, status: OpStatus },

    #[error("unknown equipment: {0}")]
    UnknownEquipment(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("topology lock poisoned by a panicking writer")]
    TopologyPoisoned,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Topology error: {0}")]
    Topology(#[from] pf_topology::LoadError),
}

/// Result type for pf-engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
