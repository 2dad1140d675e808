//! Topology-specific error types.

use std::path::PathBuf;

use pf_core::{EquipId, NodeId, PfError, SegId, ValveId};

/// Topology construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// A segment refers to a node that doesn't exist.
    InvalidNodeRef { segment: SegId, node: NodeId },

    /// A segment refers to a valve that doesn't exist.
    InvalidValveRef { segment: SegId, valve: ValveId },

    /// A segment's endpoints are the same node.
    DegenerateSegment { segment: SegId },

    /// An equipment unit refers to a node that doesn't exist.
    InvalidPortRef { equipment: EquipId, node: NodeId },

    /// An equipment port node is not declared as a port.
    PortKindMismatch { equipment: EquipId, node: NodeId },

    /// Two objects of the same kind share a name.
    DuplicateName { kind: &'static str, name: String },
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::InvalidNodeRef { segment, node } => {
                write!(f, "Segment {} refers to non-existent node {}", segment, node)
            }
            TopologyError::InvalidValveRef { segment, valve } => {
                write!(
                    f,
                    "Segment {} refers to non-existent valve {}",
                    segment, valve
                )
            }
            TopologyError::DegenerateSegment { segment } => {
                write!(f, "Segment {} connects a node to itself", segment)
            }
            TopologyError::InvalidPortRef { equipment, node } => {
                write!(
                    f,
                    "Equipment {} refers to non-existent port node {}",
                    equipment, node
                )
            }
            TopologyError::PortKindMismatch { equipment, node } => {
                write!(
                    f,
                    "Equipment {} port node {} is not declared as a port",
                    equipment, node
                )
            }
            TopologyError::DuplicateName { kind, name } => {
                write!(f, "Duplicate {} name: {}", kind, name)
            }
        }
    }
}

impl std::error::Error for TopologyError {}

impl From<TopologyError> for PfError {
    fn from(err: TopologyError) -> Self {
        PfError::Invariant {
            what: Box::leak(err.to_string().into_boxed_str()),
        }
    }
}

/// Errors loading a plant definition from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read plant file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse plant YAML: {0}")]
    Parse(String),

    #[error("Plant definition invalid: {0}")]
    Definition(String),
}
