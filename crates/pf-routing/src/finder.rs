//! Breadth-first route search.

use std::collections::{HashSet, VecDeque};

use pf_core::{EquipId, NodeId, SegId, ValveId};
use pf_topology::Topology;

/// Result of a route computation.
///
/// `NotFound` is an ordinary operational outcome (a valve is shut, or the
/// plant simply has no such path); it is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Ordered segments connecting start to end. Empty when start == end.
    Found(Vec<SegId>),
    /// No path through the permitted segments.
    NotFound,
}

impl RouteOutcome {
    /// Convert to `Option`, discarding the NotFound case.
    pub fn found(self) -> Option<Vec<SegId>> {
        match self {
            RouteOutcome::Found(route) => Some(route),
            RouteOutcome::NotFound => None,
        }
    }
}

/// A planning-mode route plus the valves that would need opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSuggestion {
    pub segments: Vec<SegId>,
    /// Distinct valves gating the suggested segments, in first-use order.
    pub valves_to_open: Vec<ValveId>,
}

/// Computes routes over a frozen topology.
///
/// Traversal order per node is the segment declaration order from the plant
/// definition, so tie-breaks among equal-length routes are stable across
/// rebuilds of the same definition.
pub struct RouteFinder<'a> {
    topo: &'a Topology,
}

impl<'a> RouteFinder<'a> {
    pub fn new(topo: &'a Topology) -> Self {
        Self { topo }
    }

    /// Shortest route by segment count from `start` to `end`, using only
    /// segments whose valve is in `open_valves`.
    ///
    /// `start == end` is trivially satisfied by the empty route.
    pub fn find_path(
        &self,
        start: NodeId,
        end: NodeId,
        open_valves: &HashSet<ValveId>,
    ) -> RouteOutcome {
        match self.bfs(start, end, Some(open_valves)) {
            Some(route) => RouteOutcome::Found(route),
            None => RouteOutcome::NotFound,
        }
    }

    /// Route from `start` to `end` passing through `via`'s internal IN->OUT
    /// path: three legs, concatenated.
    ///
    /// Any leg failing fails the whole call; partial legs are never surfaced.
    pub fn find_multi_leg_path(
        &self,
        start: NodeId,
        via: EquipId,
        end: NodeId,
        open_valves: &HashSet<ValveId>,
    ) -> RouteOutcome {
        let Some(unit) = self.topo.equipment_unit(via) else {
            return RouteOutcome::NotFound;
        };

        let legs = [(start, unit.inlet), (unit.inlet, unit.outlet), (unit.outlet, end)];
        let mut route = Vec::new();
        for (leg_start, leg_end) in legs {
            match self.bfs(leg_start, leg_end, Some(open_valves)) {
                Some(leg) => route.extend(leg),
                None => return RouteOutcome::NotFound,
            }
        }
        RouteOutcome::Found(route)
    }

    /// Planning-mode route: same search, but every valve is treated as open.
    ///
    /// Returns the segments plus the distinct valves that would need opening.
    /// Used for previews and for sources with no upstream valve dependency;
    /// never a substitute for the conflict check.
    pub fn suggest_route(
        &self,
        start: NodeId,
        end: NodeId,
        via: Option<EquipId>,
    ) -> Option<RouteSuggestion> {
        let segments = match via {
            None => self.bfs(start, end, None)?,
            Some(equip) => {
                let unit = self.topo.equipment_unit(equip)?;
                let mut route = self.bfs(start, unit.inlet, None)?;
                route.extend(self.bfs(unit.inlet, unit.outlet, None)?);
                route.extend(self.bfs(unit.outlet, end, None)?);
                route
            }
        };
        let valves_to_open = self.topo.route_valves(&segments);
        Some(RouteSuggestion {
            segments,
            valves_to_open,
        })
    }

    /// Breadth-first search over outgoing segments.
    ///
    /// `open_valves: None` means the planning view where every valve passes.
    /// Returns the segment list from `start` to `end`, or `None`.
    fn bfs(
        &self,
        start: NodeId,
        end: NodeId,
        open_valves: Option<&HashSet<ValveId>>,
    ) -> Option<Vec<SegId>> {
        let n = self.topo.nodes().len();
        if start.index() as usize >= n || end.index() as usize >= n {
            return None;
        }
        if start == end {
            return Some(Vec::new());
        }

        // Parent pointers: the segment by which each node was first reached.
        let mut reached_by: Vec<Option<SegId>> = vec![None; n];
        let mut visited = vec![false; n];
        visited[start.index() as usize] = true;

        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for &seg_id in self.topo.outgoing(node) {
                let seg = self.topo.segment(seg_id)?;
                if let Some(open) = open_valves {
                    if !open.contains(&seg.valve) {
                        continue;
                    }
                }
                let to_idx = seg.to.index() as usize;
                if visited[to_idx] {
                    continue;
                }
                visited[to_idx] = true;
                reached_by[to_idx] = Some(seg_id);
                if seg.to == end {
                    return Some(self.reconstruct(start, end, &reached_by));
                }
                queue.push_back(seg.to);
            }
        }

        None
    }

    /// Walk parent pointers backwards from `end` to `start`.
    fn reconstruct(&self, start: NodeId, end: NodeId, reached_by: &[Option<SegId>]) -> Vec<SegId> {
        let mut route = Vec::new();
        let mut node = end;
        while node != start {
            let seg_id = reached_by[node.index() as usize]
                .expect("every node on a reconstructed path was reached by a segment");
            route.push(seg_id);
            node = self
                .topo
                .segment(seg_id)
                .expect("reached_by only holds valid segment ids")
                .from;
        }
        route.reverse();
        route
    }
}
