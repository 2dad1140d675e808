//! The reservation ledger: sole arbiter of segment mutual exclusion.
//!
//! Invariant: a segment appears in at most one reservation entry whose
//! operation is ACTIVE at any instant. `reserve` enforces this as a
//! uniqueness constraint in addition to the caller's conflict check, so the
//! invariant holds even if a caller skips the check.

use std::collections::BTreeSet;

use crate::error::{StoreError, StoreResult};
use crate::store::Tx;
use crate::types::{OpStatus, ReservationEntry};

/// What `release` freed: the segments, and the valves that are now safe to
/// close (valves still gating another active operation's segment are
/// withheld).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Released {
    pub segments: Vec<String>,
    pub valves: Vec<String>,
}

impl Tx<'_> {
    /// Union of segments held by all ACTIVE operations.
    pub fn active_segment_ids(&self) -> BTreeSet<String> {
        self.state
            .reservations
            .iter()
            .filter(|entry| self.op_is_active(&entry.op_id))
            .map(|entry| entry.segment.clone())
            .collect()
    }

    /// Candidate segments that overlap an ACTIVE operation's holdings.
    /// Empty means no conflict.
    pub fn check_conflict(&self, candidate: &[String]) -> Vec<String> {
        let active = self.active_segment_ids();
        candidate
            .iter()
            .filter(|seg| active.contains(*seg))
            .cloned()
            .collect()
    }

    /// Insert reservation entries for `op_id`.
    ///
    /// Fails with `SegmentAlreadyReserved` if any segment is already held by
    /// an ACTIVE operation; the surrounding transaction then rolls back.
    pub fn reserve(&mut self, op_id: &str, segments: &[String]) -> StoreResult<()> {
        for segment in segments {
            if let Some(holder) = self.active_holder(segment) {
                return Err(StoreError::SegmentAlreadyReserved {
                    segment: segment.clone(),
                    held_by: holder,
                });
            }
        }
        for segment in segments {
            self.state.reservations.push(ReservationEntry {
                op_id: op_id.to_string(),
                segment: segment.clone(),
            });
        }
        Ok(())
    }

    /// Delete `op_id`'s reservation entries and report what was freed.
    ///
    /// A freed segment's valve is reported as closable only when no segment
    /// gated by that valve remains held by another ACTIVE operation.
    pub fn release(&mut self, op_id: &str) -> StoreResult<Released> {
        let (mine, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.state.reservations)
            .into_iter()
            .partition(|entry| entry.op_id == op_id);
        self.state.reservations = kept;

        let segments: Vec<String> = mine.into_iter().map(|entry| entry.segment).collect();

        let still_active = self.active_segment_ids();
        let mut still_gated: BTreeSet<&str> = BTreeSet::new();
        for segment in &still_active {
            still_gated.insert(self.segment_valve(segment)?);
        }

        let mut valves = Vec::new();
        for segment in &segments {
            let valve = self.segment_valve(segment)?;
            if !still_gated.contains(valve) && !valves.iter().any(|v| v == valve) {
                valves.push(valve.to_string());
            }
        }

        Ok(Released { segments, valves })
    }

    fn op_is_active(&self, op_id: &str) -> bool {
        self.state
            .operations
            .get(op_id)
            .map(|op| op.status == OpStatus::Active)
            .unwrap_or(false)
    }

    fn active_holder(&self, segment: &str) -> Option<String> {
        self.state
            .reservations
            .iter()
            .find(|entry| entry.segment == segment && self.op_is_active(&entry.op_id))
            .map(|entry| entry.op_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PlantStore;
    use crate::types::{Operation, PlantState, SegmentRow, ValveState};

    fn active_op(op_id: &str, route: &[&str]) -> Operation {
        Operation {
            op_id: op_id.into(),
            op_type: "transfer".into(),
            status: OpStatus::Active,
            source: "SRC".into(),
            dest: "DST".into(),
            via: None,
            route: route.iter().map(|s| s.to_string()).collect(),
            started_at: "2026-08-28T00:00:00Z".into(),
            ended_at: None,
        }
    }

    fn seeded() -> PlantStore {
        let mut state = PlantState::default();
        for valve in ["V-A", "V-B", "V-SHARED"] {
            state.valves.insert(valve.into(), ValveState::Open);
        }
        for (seg, valve) in [("A", "V-A"), ("B", "V-B"), ("C", "V-SHARED"), ("D", "V-SHARED")] {
            state.segments.insert(
                seg.into(),
                SegmentRow {
                    valve: valve.into(),
                    from: "X".into(),
                    to: "Y".into(),
                },
            );
        }
        PlantStore::new(state)
    }

    #[test]
    fn conflict_is_intersection_with_active_holdings() {
        let store = seeded();
        store
            .transaction::<_, StoreError>(|tx| {
                tx.insert_operation(active_op("op-1", &["A", "B"]))?;
                tx.reserve("op-1", &["A".into(), "B".into()])?;

                assert_eq!(tx.check_conflict(&["B".into(), "C".into()]), vec!["B"]);
                assert!(tx.check_conflict(&["C".into(), "D".into()]).is_empty());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn reserve_rejects_doubly_held_segment() {
        let store = seeded();
        let result = store.transaction::<(), StoreError>(|tx| {
            tx.insert_operation(active_op("op-1", &["A"]))?;
            tx.reserve("op-1", &["A".into()])?;
            tx.insert_operation(active_op("op-2", &["A"]))?;
            tx.reserve("op-2", &["A".into()])?;
            Ok(())
        });
        match result {
            Err(StoreError::SegmentAlreadyReserved { segment, held_by }) => {
                assert_eq!(segment, "A");
                assert_eq!(held_by, "op-1");
            }
            other => panic!("expected SegmentAlreadyReserved, got {other:?}"),
        }
        // The whole transaction rolled back; op-1 was never committed.
        assert!(store.list_active().unwrap().is_empty());
    }

    #[test]
    fn release_frees_segments_and_valves() {
        let store = seeded();
        store
            .transaction::<_, StoreError>(|tx| {
                tx.insert_operation(active_op("op-1", &["A", "B"]))?;
                tx.reserve("op-1", &["A".into(), "B".into()])?;
                Ok(())
            })
            .unwrap();

        let released = store
            .transaction::<_, StoreError>(|tx| {
                tx.finish_operation("op-1", OpStatus::Completed, "2026-08-28T01:00:00Z".into())?;
                tx.release("op-1")
            })
            .unwrap();

        assert_eq!(released.segments, vec!["A", "B"]);
        assert_eq!(released.valves, vec!["V-A", "V-B"]);

        store
            .transaction::<_, StoreError>(|tx| {
                assert!(tx.active_segment_ids().is_empty());
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn shared_valve_is_withheld_from_release() {
        let store = seeded();
        store
            .transaction::<_, StoreError>(|tx| {
                // Segments C and D share V-SHARED; two operations hold one each.
                tx.insert_operation(active_op("op-1", &["C"]))?;
                tx.reserve("op-1", &["C".into()])?;
                tx.insert_operation(active_op("op-2", &["D"]))?;
                tx.reserve("op-2", &["D".into()])?;
                Ok(())
            })
            .unwrap();

        let released = store
            .transaction::<_, StoreError>(|tx| {
                tx.finish_operation("op-1", OpStatus::Completed, "2026-08-28T01:00:00Z".into())?;
                tx.release("op-1")
            })
            .unwrap();

        // op-2 still holds D behind the same valve, so V-SHARED stays open.
        assert_eq!(released.segments, vec!["C"]);
        assert!(released.valves.is_empty());
    }

    #[test]
    fn entries_of_finished_operations_do_not_block() {
        let store = seeded();
        store
            .transaction::<_, StoreError>(|tx| {
                let mut op = active_op("op-1", &["A"]);
                op.status = OpStatus::Cancelled;
                tx.insert_operation(op)?;
                // A stale entry for a non-active operation must not conflict.
                tx.state.reservations.push(ReservationEntry {
                    op_id: "op-1".into(),
                    segment: "A".into(),
                });
                assert!(tx.check_conflict(&["A".into()]).is_empty());
                tx.insert_operation(active_op("op-2", &["A"]))?;
                tx.reserve("op-2", &["A".into()])
            })
            .unwrap();
    }
}
