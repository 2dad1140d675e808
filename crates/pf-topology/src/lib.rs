//! pf-topology: valve-gated plant network model for pipeflow.
//!
//! Provides:
//! - Serde schema for the external plant-definition file
//! - Incremental topology builder with validation
//! - Frozen, immutable `Topology` with compact outgoing-segment adjacency
//!
//! The in-memory routing graph is deliberately decoupled from any persistence
//! layer: the plant definition is loaded into plain records and frozen into a
//! `Topology` that is rebuilt only through an explicit administrative call.
//!
//! # Example
//!
//! ```
//! use pf_topology::{NodeKind, TopologyBuilder};
//!
//! let mut builder = TopologyBuilder::new();
//! let v = builder.add_valve("V-1");
//! let a = builder.add_node("R01_OUT", NodeKind::Port);
//! let b = builder.add_node("W1", NodeKind::Junction);
//! builder.add_segment("SEG-R01-W1", v, a, b);
//! let topo = builder.build().unwrap();
//!
//! assert_eq!(topo.outgoing(a).len(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod load;
pub mod schema;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::TopologyBuilder;
pub use error::{LoadError, TopologyError};
pub use graph::{Equipment, Node, NodeKind, Segment, Topology, Valve};
pub use load::{build_topology, load_plant, validate_plant};
pub use schema::{EquipmentDef, NodeDef, NodeKindDef, PlantDef, SegmentDef, ValveDef, ValveStateDef};
