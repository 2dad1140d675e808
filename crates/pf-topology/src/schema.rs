//! Plant-definition schema.
//!
//! This is the external topology source: a plain serde document listing
//! valves, nodes, equipment, and valve-gated segments. It carries no
//! routing state of its own.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantDef {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub valves: Vec<ValveDef>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub equipment: Vec<EquipmentDef>,
    #[serde(default)]
    pub segments: Vec<SegmentDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValveDef {
    pub name: String,
    /// State the valve is in when the plant state is first seeded.
    #[serde(default)]
    pub state: ValveStateDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ValveStateDef {
    Open,
    #[default]
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub name: String,
    pub kind: NodeKindDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeKindDef {
    /// Equipment port (an IN or OUT connection point of a unit).
    Port,
    /// Pipeline junction with no valve of its own.
    Junction,
}

/// An equipment unit referenced by transfers: tank, reactor, filter, melter.
///
/// `in_node` and `out_node` name the unit's port nodes; the unit's internal
/// IN->OUT path (if any) is expressed as ordinary segments between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EquipmentDef {
    pub name: String,
    pub in_node: String,
    pub out_node: String,
}

/// A directed pipe segment gated by exactly one valve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentDef {
    pub name: String,
    pub valve: String,
    pub from: String,
    pub to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_plant_yaml() {
        let yaml = r#"
version: 1
name: demo
valves:
  - name: V-R01-W1
  - name: V-W1-FZ1
    state: Open
nodes:
  - name: R01_OUT
    kind: Port
  - name: W1
    kind: Junction
  - name: FZ1_IN
    kind: Port
equipment:
  - name: R01
    in_node: R01_OUT
    out_node: R01_OUT
segments:
  - name: SEG-R01-W1
    valve: V-R01-W1
    from: R01_OUT
    to: W1
"#;
        let def: PlantDef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.valves.len(), 2);
        assert_eq!(def.valves[0].state, ValveStateDef::Closed);
        assert_eq!(def.valves[1].state, ValveStateDef::Open);
        assert_eq!(def.nodes[1].kind, NodeKindDef::Junction);
        assert_eq!(def.segments[0].valve, "V-R01-W1");
    }
}
