//! Plant-definition loading and topology construction.
//!
//! Loading is explicit: callers read the definition, validate it, and build
//! a fresh `Topology`. There is no implicit mid-request reload.

use std::collections::HashMap;
use std::path::Path;

use crate::builder::TopologyBuilder;
use crate::error::LoadError;
use crate::graph::{NodeKind, Topology};
use crate::schema::{NodeKindDef, PlantDef};

/// Load a plant definition from a YAML file.
pub fn load_plant(path: &Path) -> Result<PlantDef, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let def: PlantDef =
        serde_yaml::from_str(&content).map_err(|e| LoadError::Parse(e.to_string()))?;

    Ok(def)
}

/// Validate cross-references inside a plant definition.
///
/// Structural graph invariants are re-checked by `TopologyBuilder::build`;
/// this pass reports dangling names with the original identifiers so load
/// failures point at the offending line of the definition.
pub fn validate_plant(def: &PlantDef) -> Result<(), LoadError> {
    let node_names: HashMap<&str, NodeKindDef> = def
        .nodes
        .iter()
        .map(|n| (n.name.as_str(), n.kind))
        .collect();
    let valve_names: Vec<&str> = def.valves.iter().map(|v| v.name.as_str()).collect();

    for seg in &def.segments {
        if !valve_names.contains(&seg.valve.as_str()) {
            return Err(LoadError::Definition(format!(
                "segment '{}' references unknown valve '{}'",
                seg.name, seg.valve
            )));
        }
        for node in [&seg.from, &seg.to] {
            if !node_names.contains_key(node.as_str()) {
                return Err(LoadError::Definition(format!(
                    "segment '{}' references unknown node '{}'",
                    seg.name, node
                )));
            }
        }
    }

    for equip in &def.equipment {
        for node in [&equip.in_node, &equip.out_node] {
            match node_names.get(node.as_str()) {
                None => {
                    return Err(LoadError::Definition(format!(
                        "equipment '{}' references unknown node '{}'",
                        equip.name, node
                    )))
                }
                Some(NodeKindDef::Junction) => {
                    return Err(LoadError::Definition(format!(
                        "equipment '{}' port '{}' must be a Port node",
                        equip.name, node
                    )))
                }
                Some(NodeKindDef::Port) => {}
            }
        }
    }

    Ok(())
}

/// Build a frozen `Topology` from a validated plant definition.
pub fn build_topology(def: &PlantDef) -> Result<Topology, LoadError> {
    validate_plant(def)?;

    let mut builder = TopologyBuilder::new();

    let mut valve_ids = HashMap::new();
    for valve in &def.valves {
        valve_ids.insert(valve.name.as_str(), builder.add_valve(&valve.name));
    }

    let mut node_ids = HashMap::new();
    for node in &def.nodes {
        let kind = match node.kind {
            NodeKindDef::Port => NodeKind::Port,
            NodeKindDef::Junction => NodeKind::Junction,
        };
        node_ids.insert(node.name.as_str(), builder.add_node(&node.name, kind));
    }

    for seg in &def.segments {
        builder.add_segment(
            &seg.name,
            valve_ids[seg.valve.as_str()],
            node_ids[seg.from.as_str()],
            node_ids[seg.to.as_str()],
        );
    }

    for equip in &def.equipment {
        builder.add_equipment(
            &equip.name,
            node_ids[equip.in_node.as_str()],
            node_ids[equip.out_node.as_str()],
        );
    }

    builder
        .build()
        .map_err(|e| LoadError::Definition(e.to_string()))
}
