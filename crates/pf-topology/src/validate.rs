//! Topology validation logic.

use std::collections::HashSet;

use pf_core::PfResult;

use crate::error::TopologyError;
use crate::graph::{Equipment, Node, NodeKind, Segment, Valve};

/// Validate the topology structure: all references exist, names are unique,
/// equipment ports are ports, segments are non-degenerate.
pub(crate) fn validate_structure(
    nodes: &[Node],
    valves: &[Valve],
    segments: &[Segment],
    equipment: &[Equipment],
) -> PfResult<()> {
    // Names must be unique per kind; external callers address objects by name.
    check_unique_names("node", nodes.iter().map(|n| n.name.as_str()))?;
    check_unique_names("valve", valves.iter().map(|v| v.name.as_str()))?;
    check_unique_names("segment", segments.iter().map(|s| s.name.as_str()))?;
    check_unique_names("equipment", equipment.iter().map(|e| e.name.as_str()))?;

    for seg in segments {
        for node in [seg.from, seg.to] {
            if node.index() as usize >= nodes.len() {
                return Err(TopologyError::InvalidNodeRef {
                    segment: seg.id,
                    node,
                }
                .into());
            }
        }
        if seg.valve.index() as usize >= valves.len() {
            return Err(TopologyError::InvalidValveRef {
                segment: seg.id,
                valve: seg.valve,
            }
            .into());
        }
        if seg.from == seg.to {
            return Err(TopologyError::DegenerateSegment { segment: seg.id }.into());
        }
    }

    for equip in equipment {
        for node_id in [equip.inlet, equip.outlet] {
            let Some(node) = nodes.get(node_id.index() as usize) else {
                return Err(TopologyError::InvalidPortRef {
                    equipment: equip.id,
                    node: node_id,
                }
                .into());
            };
            if node.kind != NodeKind::Port {
                return Err(TopologyError::PortKindMismatch {
                    equipment: equip.id,
                    node: node_id,
                }
                .into());
            }
        }
    }

    Ok(())
}

fn check_unique_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> PfResult<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(TopologyError::DuplicateName {
                kind,
                name: name.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::Id;

    #[test]
    fn validate_empty_topology() {
        assert!(validate_structure(&[], &[], &[], &[]).is_ok());
    }

    #[test]
    fn validate_invalid_node_ref() {
        let nodes = vec![Node {
            id: Id::from_index(0),
            name: "N1".into(),
            kind: NodeKind::Junction,
        }];
        let valves = vec![Valve {
            id: Id::from_index(0),
            name: "V1".into(),
        }];
        let segments = vec![Segment {
            id: Id::from_index(0),
            name: "S1".into(),
            valve: Id::from_index(0),
            from: Id::from_index(0),
            to: Id::from_index(99), // Invalid!
        }];

        let result = validate_structure(&nodes, &valves, &segments, &[]);
        assert!(matches!(
            result.unwrap_err(),
            pf_core::PfError::Invariant { .. }
        ));
    }

    #[test]
    fn validate_equipment_port_must_be_port() {
        let nodes = vec![Node {
            id: Id::from_index(0),
            name: "J1".into(),
            kind: NodeKind::Junction,
        }];
        let equipment = vec![Equipment {
            id: Id::from_index(0),
            name: "E1".into(),
            inlet: Id::from_index(0),
            outlet: Id::from_index(0),
        }];

        let result = validate_structure(&nodes, &[], &[], &equipment);
        assert!(result.is_err());
    }

    #[test]
    fn validate_duplicate_segment_name() {
        let nodes = vec![
            Node {
                id: Id::from_index(0),
                name: "N1".into(),
                kind: NodeKind::Junction,
            },
            Node {
                id: Id::from_index(1),
                name: "N2".into(),
                kind: NodeKind::Junction,
            },
        ];
        let valves = vec![Valve {
            id: Id::from_index(0),
            name: "V1".into(),
        }];
        let seg = |i: u32, from: u32, to: u32| Segment {
            id: Id::from_index(i),
            name: "S".into(),
            valve: Id::from_index(0),
            from: Id::from_index(from),
            to: Id::from_index(to),
        };
        let segments = vec![seg(0, 0, 1), seg(1, 1, 0)];

        let result = validate_structure(&nodes, &valves, &segments, &[]);
        assert!(result.is_err());
    }
}
