//! The operation controller: request -> route -> conflict check -> reserve,
//! as one transaction, plus the complete/cancel sides of the state machine.

use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::Utc;
use pf_core::{EquipId, NodeId, ValveId};
use pf_routing::RouteFinder;
use pf_store::{OpStatus, Operation, PlantStore, SegmentRow, Tx, ValveState};
use pf_topology::{build_topology, PlantDef, Topology};
use uuid::Uuid;

use crate::collaborators::{BatchCustody, EquipmentStates, ValveActuator};
use crate::error::{EngineError, EngineResult};
use crate::seed;

/// Equipment state labels the engine applies at the seams.
const IN_TRANSFER: &str = "in-transfer";
const IDLE: &str = "idle";

/// A request to start a transfer operation.
#[derive(Debug, Clone)]
pub struct TransferRequest<'a> {
    pub op_type: &'a str,
    pub source: &'a str,
    pub dest: &'a str,
    /// Intermediate equipment the route must pass through (IN -> OUT).
    pub via: Option<&'a str>,
}

/// A successfully started operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStarted {
    pub op_id: String,
    pub route: Vec<String>,
}

/// A completed or cancelled operation and the valves that were closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferClosed {
    pub op_id: String,
    pub closed_valves: Vec<String>,
}

/// A planning-mode route preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    pub segments: Vec<String>,
    pub valves_to_open: Vec<String>,
}

/// Orchestrates transfer operations over the shared plant store.
///
/// The topology is read-mostly; it is replaced only through the explicit
/// `rebuild_topology` administrative call, never implicitly mid-request.
pub struct OperationController<A, E, B> {
    topology: RwLock<Topology>,
    store: Arc<PlantStore>,
    actuator: A,
    equipment: E,
    custody: B,
}

impl<A, E, B> OperationController<A, E, B>
where
    A: ValveActuator,
    E: EquipmentStates,
    B: BatchCustody,
{
    pub fn new(
        topology: Topology,
        store: Arc<PlantStore>,
        actuator: A,
        equipment: E,
        custody: B,
    ) -> Self {
        Self {
            topology: RwLock::new(topology),
            store,
            actuator,
            equipment,
            custody,
        }
    }

    /// Replace the topology and the store's valve/segment rows from a fresh
    /// plant definition. Valves that survive the rebuild keep their live
    /// state; operation history and reservations are preserved.
    pub fn rebuild_topology(&self, def: &PlantDef) -> EngineResult<()> {
        let topo = build_topology(def)?;
        self.store.rebuild_rows(
            def.valves
                .iter()
                .map(|v| (v.name.clone(), seed::valve_state(v.state))),
            def.segments.iter().map(|s| {
                (
                    s.name.clone(),
                    SegmentRow {
                        valve: s.valve.clone(),
                        from: s.from.clone(),
                        to: s.to.clone(),
                    },
                )
            }),
        )?;

        let mut guard = self
            .topology
            .write()
            .map_err(|_| EngineError::TopologyPoisoned)?;
        *guard = topo;
        tracing::info!("topology rebuilt");
        Ok(())
    }

    /// Start a transfer routed through currently open valves.
    ///
    /// One transaction covers the route check, conflict check, valve rows,
    /// operation creation, and reservation; any failure rolls it all back.
    /// Actuator commands for the route's valves are issued after the commit,
    /// from the committed rows.
    pub fn start_transfer(&self, req: &TransferRequest<'_>) -> EngineResult<TransferStarted> {
        let topo = self.topology()?;
        let (start, end, via) = self.resolve_endpoints(&topo, req)?;

        let (started, opened) = self.store.transaction(|tx| {
            let open_ids = open_valve_ids(&topo, &tx.open_valves());
            let finder = RouteFinder::new(&topo);
            let outcome = match via {
                Some(unit) => finder.find_multi_leg_path(start, unit, end, &open_ids),
                None => finder.find_path(start, end, &open_ids),
            };
            let route_ids = outcome.found().ok_or_else(|| EngineError::RouteUnavailable {
                from: node_name(&topo, start),
                to: node_name(&topo, end),
            })?;
            self.commit_start(&topo, tx, req, &route_ids)
        })?;
        self.actuate(&opened, ValveState::Open)?;

        tracing::info!(
            op_id = %started.op_id,
            source = req.source,
            dest = req.dest,
            segments = started.route.len(),
            "transfer started"
        );
        Ok(started)
    }

    /// Start a transfer using the planning graph (every valve treated as
    /// open), for sources with no upstream valve dependency.
    ///
    /// Safety still rests on the conflict check and reservation; only the
    /// live valve-state filter is skipped. The valves on the chosen route
    /// are recorded as open in the same transaction.
    pub fn start_unconstrained_transfer(
        &self,
        req: &TransferRequest<'_>,
    ) -> EngineResult<TransferStarted> {
        let topo = self.topology()?;
        let (start, end, via) = self.resolve_endpoints(&topo, req)?;

        let (started, opened) = self.store.transaction(|tx| {
            let finder = RouteFinder::new(&topo);
            let suggestion =
                finder
                    .suggest_route(start, end, via)
                    .ok_or_else(|| EngineError::RouteUnavailable {
                        from: node_name(&topo, start),
                        to: node_name(&topo, end),
                    })?;
            self.commit_start(&topo, tx, req, &suggestion.segments)
        })?;
        self.actuate(&opened, ValveState::Open)?;

        tracing::info!(
            op_id = %started.op_id,
            source = req.source,
            dest = req.dest,
            "unconstrained transfer started"
        );
        Ok(started)
    }

    /// Preview a route between two nodes as if every valve were open.
    /// Never reserves anything.
    pub fn suggest_route(
        &self,
        from_node: &str,
        to_node: &str,
        via: Option<&str>,
    ) -> EngineResult<RoutePlan> {
        let topo = self.topology()?;
        let start = topo
            .node_by_name(from_node)
            .ok_or_else(|| EngineError::UnknownNode(from_node.to_string()))?;
        let end = topo
            .node_by_name(to_node)
            .ok_or_else(|| EngineError::UnknownNode(to_node.to_string()))?;
        let via = match via {
            Some(name) => Some(
                topo.equipment_by_name(name)
                    .ok_or_else(|| EngineError::UnknownEquipment(name.to_string()))?,
            ),
            None => None,
        };

        let suggestion = RouteFinder::new(&topo)
            .suggest_route(start, end, via)
            .ok_or_else(|| EngineError::RouteUnavailable {
                from: from_node.to_string(),
                to: to_node.to_string(),
            })?;

        Ok(RoutePlan {
            segments: topo.segment_names(&suggestion.segments),
            valves_to_open: valve_names(&topo, &suggestion.valves_to_open),
        })
    }

    /// Complete an ACTIVE operation: release its segments, close the freed
    /// valves, hand material custody to the destination, and reset equipment
    /// states. One transaction; a failure anywhere rolls back everything.
    /// Close commands reach the actuator only after the commit.
    pub fn complete_transfer(&self, op_id: &str) -> EngineResult<TransferClosed> {
        let closed = self.store.transaction::<_, EngineError>(|tx| {
            let op = self.take_active(tx, op_id)?;
            let released = tx.release(op_id)?;
            for valve in &released.valves {
                tx.set_valve(valve, ValveState::Closed)?;
            }
            tx.finish_operation(op_id, OpStatus::Completed, Utc::now().to_rfc3339())?;

            self.custody.transfer_custody(op_id, &op.source, &op.dest)?;
            self.equipment.set_state(&op.source, IDLE)?;
            self.equipment.set_state(&op.dest, IDLE)?;

            Ok(TransferClosed {
                op_id: op.op_id,
                closed_valves: released.valves,
            })
        })?;
        self.actuate(&closed.closed_valves, ValveState::Closed)?;

        tracing::info!(op_id, valves = closed.closed_valves.len(), "transfer completed");
        Ok(closed)
    }

    /// Cancel an ACTIVE operation: same resource release as `complete`, no
    /// custody transfer. Equipment states revert to the caller-supplied
    /// pre-operation labels.
    pub fn cancel_transfer(
        &self,
        op_id: &str,
        restore_states: &[(String, String)],
    ) -> EngineResult<TransferClosed> {
        let closed = self.store.transaction::<_, EngineError>(|tx| {
            let op = self.take_active(tx, op_id)?;
            let released = tx.release(op_id)?;
            for valve in &released.valves {
                tx.set_valve(valve, ValveState::Closed)?;
            }
            tx.finish_operation(op_id, OpStatus::Cancelled, Utc::now().to_rfc3339())?;

            for (equipment, label) in restore_states {
                self.equipment.set_state(equipment, label)?;
            }

            Ok(TransferClosed {
                op_id: op.op_id,
                closed_valves: released.valves,
            })
        })?;
        self.actuate(&closed.closed_valves, ValveState::Closed)?;

        tracing::info!(op_id, "transfer cancelled");
        Ok(closed)
    }

    /// All ACTIVE operations, oldest first.
    pub fn list_active_operations(&self) -> EngineResult<Vec<pf_store::ActiveOperation>> {
        Ok(self.store.list_active()?)
    }

    fn topology(&self) -> EngineResult<RwLockReadGuard<'_, Topology>> {
        self.topology.read().map_err(|_| EngineError::TopologyPoisoned)
    }

    /// Resolve the source's OUT port, the destination's IN port, and the
    /// optional intermediate unit.
    fn resolve_endpoints(
        &self,
        topo: &Topology,
        req: &TransferRequest<'_>,
    ) -> EngineResult<(NodeId, NodeId, Option<EquipId>)> {
        let start = self
            .equipment_unit(topo, req.source)?
            .outlet;
        let end = self.equipment_unit(topo, req.dest)?.inlet;
        let via = match req.via {
            Some(name) => Some(
                topo.equipment_by_name(name)
                    .ok_or_else(|| EngineError::UnknownEquipment(name.to_string()))?,
            ),
            None => None,
        };
        Ok((start, end, via))
    }

    fn equipment_unit<'t>(
        &self,
        topo: &'t Topology,
        name: &str,
    ) -> EngineResult<&'t pf_topology::Equipment> {
        topo.equipment_by_name(name)
            .and_then(|id| topo.equipment_unit(id))
            .ok_or_else(|| EngineError::UnknownEquipment(name.to_string()))
    }

    /// The common tail of both start variants: conflict check, valve rows,
    /// operation row, reservation, equipment states. Returns the started
    /// operation and the route's valve names for post-commit actuation.
    fn commit_start(
        &self,
        topo: &Topology,
        tx: &mut Tx<'_>,
        req: &TransferRequest<'_>,
        route_ids: &[pf_core::SegId],
    ) -> Result<(TransferStarted, Vec<String>), EngineError> {
        let route = topo.segment_names(route_ids);
        tracing::debug!(segments = route.len(), "route computed");

        let conflicts = tx.check_conflict(&route);
        if !conflicts.is_empty() {
            return Err(EngineError::ResourceConflict {
                segments: conflicts,
            });
        }

        // Idempotent for valves that are already open.
        let valves = valve_names(topo, &topo.route_valves(route_ids));
        for name in &valves {
            tx.set_valve(name, ValveState::Open)?;
        }

        let op_id = Uuid::new_v4().to_string();
        tx.insert_operation(Operation {
            op_id: op_id.clone(),
            op_type: req.op_type.to_string(),
            status: OpStatus::Active,
            source: req.source.to_string(),
            dest: req.dest.to_string(),
            via: req.via.map(str::to_string),
            route: route.clone(),
            started_at: Utc::now().to_rfc3339(),
            ended_at: None,
        })?;
        tx.reserve(&op_id, &route)?;

        self.equipment.set_state(req.source, IN_TRANSFER)?;
        self.equipment.set_state(req.dest, IN_TRANSFER)?;

        Ok((TransferStarted { op_id, route }, valves))
    }

    /// Drive the valve hardware to match the committed valve rows.
    ///
    /// Runs after the transaction so a rolled-back batch never reaches the
    /// actuator; the committed store state is the source of truth and the
    /// actuator is idempotent.
    fn actuate(&self, valves: &[String], state: ValveState) -> EngineResult<()> {
        for valve in valves {
            self.actuator.set_state(valve, state)?;
        }
        Ok(())
    }

    /// Load an operation and insist it is still ACTIVE.
    fn take_active(&self, tx: &Tx<'_>, op_id: &str) -> EngineResult<Operation> {
        let op = tx.operation(op_id)?.clone();
        if op.status != OpStatus::Active {
            return Err(EngineError::PreconditionFailed {
                op_id: op_id.to_string(),
                status: op.status,
            });
        }
        Ok(op)
    }
}

fn open_valve_ids(topo: &Topology, open_names: &HashSet<String>) -> HashSet<ValveId> {
    open_names
        .iter()
        .filter_map(|name| topo.valve_by_name(name))
        .collect()
}

fn valve_names(topo: &Topology, ids: &[ValveId]) -> Vec<String> {
    ids.iter()
        .filter_map(|&id| topo.valve(id).map(|v| v.name.clone()))
        .collect()
}

fn node_name(topo: &Topology, id: NodeId) -> String {
    topo.node(id).map(|n| n.name.clone()).unwrap_or_default()
}
