//! Incremental topology builder.

use std::collections::HashMap;

use pf_core::{EquipId, NodeId, PfResult, SegId, ValveId};

use crate::graph::{Equipment, Node, NodeKind, Segment, Topology, Valve};
use crate::validate;

/// Builder for constructing a topology incrementally.
///
/// Use the `add_*` methods to declare valves, nodes, equipment, and
/// segments, then call `build()` to validate and freeze the result into
/// an immutable `Topology`.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    nodes: Vec<Node>,
    valves: Vec<Valve>,
    segments: Vec<Segment>,
    equipment: Vec<Equipment>,
    next_node_id: u32,
    next_valve_id: u32,
    next_seg_id: u32,
    next_equip_id: u32,
}

impl TopologyBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a valve and return its ID.
    pub fn add_valve(&mut self, name: impl Into<String>) -> ValveId {
        let id = ValveId::from_index(self.next_valve_id);
        self.next_valve_id += 1;
        self.valves.push(Valve {
            id,
            name: name.into(),
        });
        id
    }

    /// Declare a node (port or junction) and return its ID.
    pub fn add_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.push(Node {
            id,
            name: name.into(),
            kind,
        });
        id
    }

    /// Declare a directed segment gated by `valve` from `from` to `to`.
    pub fn add_segment(
        &mut self,
        name: impl Into<String>,
        valve: ValveId,
        from: NodeId,
        to: NodeId,
    ) -> SegId {
        let id = SegId::from_index(self.next_seg_id);
        self.next_seg_id += 1;
        self.segments.push(Segment {
            id,
            name: name.into(),
            valve,
            from,
            to,
        });
        id
    }

    /// Declare an equipment unit with its IN and OUT port nodes.
    pub fn add_equipment(
        &mut self,
        name: impl Into<String>,
        inlet: NodeId,
        outlet: NodeId,
    ) -> EquipId {
        let id = EquipId::from_index(self.next_equip_id);
        self.next_equip_id += 1;
        self.equipment.push(Equipment {
            id,
            name: name.into(),
            inlet,
            outlet,
        });
        id
    }

    /// Build and validate the topology, returning an immutable `Topology`.
    pub fn build(self) -> PfResult<Topology> {
        validate::validate_structure(&self.nodes, &self.valves, &self.segments, &self.equipment)?;

        let (out_seg_offsets, out_segs) = Self::build_adjacency(&self.nodes, &self.segments);

        let node_by_name = self.nodes.iter().map(|n| (n.name.clone(), n.id)).collect();
        let valve_by_name = self.valves.iter().map(|v| (v.name.clone(), v.id)).collect();
        let segment_by_name = self
            .segments
            .iter()
            .map(|s| (s.name.clone(), s.id))
            .collect();
        let equipment_by_name = self
            .equipment
            .iter()
            .map(|e| (e.name.clone(), e.id))
            .collect();

        Ok(Topology {
            nodes: self.nodes,
            valves: self.valves,
            segments: self.segments,
            equipment: self.equipment,
            out_seg_offsets,
            out_segs,
            node_by_name,
            valve_by_name,
            segment_by_name,
            equipment_by_name,
        })
    }

    /// Build compact adjacency: for each node, its outgoing segments.
    ///
    /// Each node's list is sorted by segment ID so that traversal order is
    /// the segment declaration order, stable across rebuilds.
    fn build_adjacency(nodes: &[Node], segments: &[Segment]) -> (Vec<usize>, Vec<SegId>) {
        let mut node_to_segs: HashMap<NodeId, Vec<SegId>> = HashMap::new();
        for seg in segments {
            node_to_segs.entry(seg.from).or_default().push(seg.id);
        }

        for segs in node_to_segs.values_mut() {
            segs.sort_by_key(|s| s.index());
        }

        let mut offsets = Vec::with_capacity(nodes.len() + 1);
        let mut flat = Vec::new();
        offsets.push(0);

        for node in nodes {
            if let Some(segs) = node_to_segs.get(&node.id) {
                flat.extend_from_slice(segs);
            }
            offsets.push(flat.len());
        }

        (offsets, flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_basic() {
        let mut b = TopologyBuilder::new();
        let v1 = b.add_valve("V-1");
        let n1 = b.add_node("N1", NodeKind::Junction);
        let n2 = b.add_node("N2", NodeKind::Junction);
        let s1 = b.add_segment("S1", v1, n1, n2);

        assert_eq!(v1.index(), 0);
        assert_eq!(n1.index(), 0);
        assert_eq!(n2.index(), 1);
        assert_eq!(s1.index(), 0);
        assert_eq!(b.segments.len(), 1);
    }

    #[test]
    fn builder_build_adjacency() {
        let mut b = TopologyBuilder::new();
        let v = b.add_valve("V-1");
        let n1 = b.add_node("N1", NodeKind::Junction);
        let n2 = b.add_node("N2", NodeKind::Junction);
        let n3 = b.add_node("N3", NodeKind::Junction);
        let s1 = b.add_segment("S1", v, n1, n2);
        let s2 = b.add_segment("S2", v, n1, n3);
        let s3 = b.add_segment("S3", v, n2, n3);

        let topo = b.build().unwrap();
        assert_eq!(topo.outgoing(n1), &[s1, s2]);
        assert_eq!(topo.outgoing(n2), &[s3]);
        assert!(topo.outgoing(n3).is_empty());
    }

    #[test]
    fn adjacency_order_is_declaration_order() {
        // Insert segments out of name order; traversal order still follows
        // declaration order, not map iteration order.
        let mut b = TopologyBuilder::new();
        let v = b.add_valve("V-1");
        let n1 = b.add_node("N1", NodeKind::Junction);
        let n2 = b.add_node("N2", NodeKind::Junction);
        let sz = b.add_segment("Z", v, n1, n2);
        let sa = b.add_segment("A", v, n1, n2);
        let topo = b.build().unwrap();
        assert_eq!(topo.outgoing(n1), &[sz, sa]);
    }
}
