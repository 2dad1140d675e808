//! Persisted record types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type OpId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValveState {
    Open,
    Closed,
}

/// Operation lifecycle status.
///
/// Operations are created directly in `Active` (there is no pending stage)
/// and terminate in `Completed` or `Cancelled`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OpStatus {
    Active,
    Completed,
    Cancelled,
}

/// The top-level transactional unit of transfer work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    pub op_id: OpId,
    pub op_type: String,
    pub status: OpStatus,
    pub source: String,
    pub dest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    /// Ordered segment names of the reserved route.
    pub route: Vec<String>,
    /// RFC3339 timestamps.
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
}

/// Association between an ACTIVE operation and one segment it occupies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationEntry {
    pub op_id: OpId,
    pub segment: String,
}

/// Denormalized segment row: which valve gates it and its endpoints.
///
/// Mirrors the topology so release logic (shared-valve suppression) needs
/// no graph handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentRow {
    pub valve: String,
    pub from: String,
    pub to: String,
}

/// The whole persisted plant state. Cheap to clone; transactions work on a
/// clone and commit by swap.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PlantState {
    pub valves: BTreeMap<String, ValveState>,
    pub segments: BTreeMap<String, SegmentRow>,
    pub operations: BTreeMap<OpId, Operation>,
    pub reservations: Vec<ReservationEntry>,
}
