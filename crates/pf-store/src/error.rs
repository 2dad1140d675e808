//! Store error types.

use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown valve: {name}")]
    UnknownValve { name: String },

    #[error("unknown segment: {name}")]
    UnknownSegment { name: String },

    #[error("unknown operation: {op_id}")]
    UnknownOperation { op_id: String },

    #[error("operation already exists: {op_id}")]
    DuplicateOperation { op_id: String },

    #[error("segment {segment} is already reserved by active operation {held_by}")]
    SegmentAlreadyReserved { segment: String, held_by: String },

    #[error("store lock poisoned by a panicking writer")]
    Poisoned,

    #[error("state snapshot not found: {path}")]
    SnapshotNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
