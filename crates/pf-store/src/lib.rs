//! pf-store: shared persistent state for the reservation engine.
//!
//! Provides:
//! - Persisted record types (valves, segments, operations, reservations)
//! - `PlantStore` with an explicit, all-or-nothing transaction boundary
//! - The reservation ledger: sole arbiter of segment mutual exclusion
//! - JSON snapshot persistence
//!
//! The store addresses everything by name (plain strings), deliberately
//! decoupled from the in-memory routing graph's compact ids.

pub mod error;
pub mod ledger;
pub mod snapshot;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use ledger::Released;
pub use store::{ActiveOperation, PlantStore, Tx};
pub use types::{OpId, OpStatus, Operation, PlantState, ReservationEntry, SegmentRow, ValveState};
