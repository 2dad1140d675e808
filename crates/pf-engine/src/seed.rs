//! Initial plant state from the plant definition.

use pf_store::{PlantState, SegmentRow, ValveState};
use pf_topology::{PlantDef, ValveStateDef};

pub(crate) fn valve_state(def: ValveStateDef) -> ValveState {
    match def {
        ValveStateDef::Open => ValveState::Open,
        ValveStateDef::Closed => ValveState::Closed,
    }
}

/// Seed a fresh store state from a plant definition: valve rows at their
/// declared initial states, segment rows denormalized from the topology,
/// and no operations or reservations.
pub fn seed_state(def: &PlantDef) -> PlantState {
    let mut state = PlantState::default();

    for valve in &def.valves {
        state
            .valves
            .insert(valve.name.clone(), valve_state(valve.state));
    }

    for seg in &def.segments {
        state.segments.insert(
            seg.name.clone(),
            SegmentRow {
                valve: seg.valve.clone(),
                from: seg.from.clone(),
                to: seg.to.clone(),
            },
        );
    }

    state
}
