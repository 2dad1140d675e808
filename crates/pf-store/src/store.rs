//! The plant store and its transaction boundary.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::types::{OpId, OpStatus, Operation, PlantState, ValveState};

/// Shared store of valve states, operations, and reservations.
///
/// All mutation goes through `transaction`, which holds the single lock for
/// the whole closure: two concurrent transactions are fully serialized, so a
/// conflict check and the reservation that follows it can never interleave
/// with another writer.
#[derive(Debug)]
pub struct PlantStore {
    state: Mutex<PlantState>,
}

impl PlantStore {
    pub fn new(initial: PlantState) -> Self {
        Self {
            state: Mutex::new(initial),
        }
    }

    /// Run `f` as one atomic unit.
    ///
    /// The closure works on a clone of the state. On `Ok` the clone is
    /// swapped in; on `Err` it is discarded and the store is untouched, so a
    /// failure can never leave valve changes, operation rows, or reservation
    /// entries half-applied.
    pub fn transaction<R, E>(&self, f: impl FnOnce(&mut Tx<'_>) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        let mut work = guard.clone();
        let result = f(&mut Tx { state: &mut work });
        if result.is_ok() {
            *guard = work;
        }
        result
    }

    /// Read-only access to a consistent snapshot of the state.
    pub fn read<R>(&self, f: impl FnOnce(&PlantState) -> R) -> StoreResult<R> {
        let guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&guard))
    }
}

/// Transactional view over the working copy of the state.
///
/// Ledger operations live in the `ledger` module as further methods on `Tx`.
pub struct Tx<'a> {
    pub(crate) state: &'a mut PlantState,
}

impl Tx<'_> {
    pub fn valve_state(&self, name: &str) -> StoreResult<ValveState> {
        self.state
            .valves
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::UnknownValve {
                name: name.to_string(),
            })
    }

    pub fn set_valve(&mut self, name: &str, state: ValveState) -> StoreResult<()> {
        match self.state.valves.get_mut(name) {
            Some(slot) => {
                *slot = state;
                Ok(())
            }
            None => Err(StoreError::UnknownValve {
                name: name.to_string(),
            }),
        }
    }

    /// Names of all currently open valves.
    pub fn open_valves(&self) -> HashSet<String> {
        self.state
            .valves
            .iter()
            .filter(|(_, &s)| s == ValveState::Open)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn operation(&self, op_id: &str) -> StoreResult<&Operation> {
        self.state
            .operations
            .get(op_id)
            .ok_or_else(|| StoreError::UnknownOperation {
                op_id: op_id.to_string(),
            })
    }

    pub fn insert_operation(&mut self, op: Operation) -> StoreResult<()> {
        if self.state.operations.contains_key(&op.op_id) {
            return Err(StoreError::DuplicateOperation { op_id: op.op_id });
        }
        self.state.operations.insert(op.op_id.clone(), op);
        Ok(())
    }

    /// Move an operation to a terminal status, stamping its end time.
    pub fn finish_operation(
        &mut self,
        op_id: &str,
        status: OpStatus,
        ended_at: String,
    ) -> StoreResult<()> {
        let op = self
            .state
            .operations
            .get_mut(op_id)
            .ok_or_else(|| StoreError::UnknownOperation {
                op_id: op_id.to_string(),
            })?;
        op.status = status;
        op.ended_at = Some(ended_at);
        Ok(())
    }

    /// Segment rows are read-only inside a transaction; they change only on
    /// an administrative topology rebuild.
    pub fn segment_valve(&self, segment: &str) -> StoreResult<&str> {
        self.state
            .segments
            .get(segment)
            .map(|row| row.valve.as_str())
            .ok_or_else(|| StoreError::UnknownSegment {
                name: segment.to_string(),
            })
    }
}

impl PlantStore {
    /// Replace valve and segment rows after an administrative topology
    /// rebuild, preserving operation history and reservations.
    ///
    /// New valves come in `Closed` unless the caller says otherwise; valves
    /// that survive the rebuild keep their live state.
    pub fn rebuild_rows(
        &self,
        valves: impl IntoIterator<Item = (String, ValveState)>,
        segments: impl IntoIterator<Item = (String, crate::types::SegmentRow)>,
    ) -> StoreResult<()> {
        self.transaction::<_, StoreError>(|tx| {
            let old_valves = std::mem::take(&mut tx.state.valves);
            for (name, initial) in valves {
                let state = old_valves.get(&name).copied().unwrap_or(initial);
                tx.state.valves.insert(name, state);
            }
            tx.state.segments = segments.into_iter().collect();
            Ok(())
        })
    }
}

/// Summary of one active operation, as reported to operators.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveOperation {
    pub op_id: OpId,
    pub op_type: String,
    pub route: Vec<String>,
    pub started_at: String,
}

impl PlantStore {
    /// All ACTIVE operations, oldest first.
    pub fn list_active(&self) -> StoreResult<Vec<ActiveOperation>> {
        self.read(|state| {
            let mut active: Vec<_> = state
                .operations
                .values()
                .filter(|op| op.status == OpStatus::Active)
                .map(|op| ActiveOperation {
                    op_id: op.op_id.clone(),
                    op_type: op.op_type.clone(),
                    route: op.route.clone(),
                    started_at: op.started_at.clone(),
                })
                .collect();
            active.sort_by(|a, b| a.started_at.cmp(&b.started_at));
            active
        })
    }
}
