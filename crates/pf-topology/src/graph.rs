//! Frozen topology data structures.

use std::collections::HashMap;

use pf_core::{EquipId, NodeId, SegId, ValveId};

/// Kind of a topology node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Equipment port (IN or OUT connection point).
    Port,
    /// Pipeline junction with no valve of its own.
    Junction,
}

/// A node in the plant network: an equipment port or a junction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
}

/// A valve gating one or more segments.
///
/// Valves hold no state here; live OPEN/CLOSED state belongs to the
/// plant store, not the routing graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Valve {
    pub id: ValveId,
    pub name: String,
}

/// A directed pipe segment between two nodes, gated by exactly one valve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: SegId,
    pub name: String,
    pub valve: ValveId,
    pub from: NodeId,
    pub to: NodeId,
}

/// An equipment unit with an IN port and an OUT port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equipment {
    pub id: EquipId,
    pub name: String,
    pub inlet: NodeId,
    pub outlet: NodeId,
}

/// The topology: a validated, immutable snapshot of the plant network.
///
/// The graph stores:
/// - All nodes, valves, segments, and equipment in vectors (indexed by ID).
/// - Compact adjacency: for each node, its outgoing segments.
/// - Name lookup maps for resolving external identifiers.
///
/// Replaced wholesale by an explicit rebuild; never mutated in place.
#[derive(Debug, Clone)]
pub struct Topology {
    pub(crate) nodes: Vec<Node>,
    pub(crate) valves: Vec<Valve>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) equipment: Vec<Equipment>,

    /// Offsets for node->segment adjacency: node i's outgoing segments are
    /// out_segs[out_seg_offsets[i]..out_seg_offsets[i+1]].
    pub(crate) out_seg_offsets: Vec<usize>,

    /// Flat list of outgoing segment IDs (sorted per node for deterministic
    /// traversal order, stable across rebuilds).
    pub(crate) out_segs: Vec<SegId>,

    pub(crate) node_by_name: HashMap<String, NodeId>,
    pub(crate) valve_by_name: HashMap<String, ValveId>,
    pub(crate) segment_by_name: HashMap<String, SegId>,
    pub(crate) equipment_by_name: HashMap<String, EquipId>,
}

impl Topology {
    /// Return all nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return all valves.
    pub fn valves(&self) -> &[Valve] {
        &self.valves
    }

    /// Return all segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Return all equipment units.
    pub fn equipment(&self) -> &[Equipment] {
        &self.equipment
    }

    /// Get a node by ID (returns None if ID out of bounds).
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index() as usize)
    }

    /// Get a valve by ID (returns None if ID out of bounds).
    pub fn valve(&self, id: ValveId) -> Option<&Valve> {
        self.valves.get(id.index() as usize)
    }

    /// Get a segment by ID (returns None if ID out of bounds).
    pub fn segment(&self, id: SegId) -> Option<&Segment> {
        self.segments.get(id.index() as usize)
    }

    /// Get an equipment unit by ID (returns None if ID out of bounds).
    pub fn equipment_unit(&self, id: EquipId) -> Option<&Equipment> {
        self.equipment.get(id.index() as usize)
    }

    /// Outgoing segments of a node, in deterministic (declaration) order.
    pub fn outgoing(&self, node_id: NodeId) -> &[SegId] {
        let idx = node_id.index() as usize;
        if idx >= self.nodes.len() {
            return &[];
        }
        let start = self.out_seg_offsets[idx];
        let end = self.out_seg_offsets[idx + 1];
        &self.out_segs[start..end]
    }

    /// Resolve a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.node_by_name.get(name).copied()
    }

    /// Resolve a valve by name.
    pub fn valve_by_name(&self, name: &str) -> Option<ValveId> {
        self.valve_by_name.get(name).copied()
    }

    /// Resolve a segment by name.
    pub fn segment_by_name(&self, name: &str) -> Option<SegId> {
        self.segment_by_name.get(name).copied()
    }

    /// Resolve an equipment unit by name.
    pub fn equipment_by_name(&self, name: &str) -> Option<EquipId> {
        self.equipment_by_name.get(name).copied()
    }

    /// Map a list of segment IDs to their names.
    pub fn segment_names(&self, ids: &[SegId]) -> Vec<String> {
        ids.iter()
            .filter_map(|&id| self.segment(id).map(|s| s.name.clone()))
            .collect()
    }

    /// Distinct valve IDs gating the given segments, in first-use order.
    pub fn route_valves(&self, ids: &[SegId]) -> Vec<ValveId> {
        let mut seen = Vec::new();
        for &id in ids {
            if let Some(seg) = self.segment(id) {
                if !seen.contains(&seg.valve) {
                    seen.push(seg.valve);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TopologyBuilder;

    #[test]
    fn node_kind_equality() {
        assert_eq!(NodeKind::Port, NodeKind::Port);
        assert_ne!(NodeKind::Port, NodeKind::Junction);
    }

    #[test]
    fn lookups_and_accessors() {
        let mut b = TopologyBuilder::new();
        let v = b.add_valve("V-1");
        let n1 = b.add_node("A_OUT", NodeKind::Port);
        let n2 = b.add_node("B_IN", NodeKind::Port);
        let s = b.add_segment("SEG-A-B", v, n1, n2);
        let e = b.add_equipment("B", n2, n2);
        let topo = b.build().unwrap();

        assert_eq!(topo.node_by_name("A_OUT"), Some(n1));
        assert_eq!(topo.valve_by_name("V-1"), Some(v));
        assert_eq!(topo.segment_by_name("SEG-A-B"), Some(s));
        assert_eq!(topo.equipment_by_name("B"), Some(e));
        assert_eq!(topo.segment(s).unwrap().from, n1);
        assert_eq!(topo.outgoing(n1), &[s]);
        assert!(topo.outgoing(n2).is_empty());
        assert_eq!(topo.segment_names(&[s]), vec!["SEG-A-B".to_string()]);
        assert_eq!(topo.route_valves(&[s]), vec![v]);
    }
}
