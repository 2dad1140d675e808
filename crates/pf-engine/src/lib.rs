//! pf-engine: transfer-operation orchestration for pipeflow.
//!
//! This crate is the service layer: it ties the frozen topology, the route
//! finder, and the reservation ledger together into the operation state
//! machine (start / complete / cancel), and delegates physical effects to
//! collaborator traits at the seams (valve actuation, equipment state,
//! batch custody).
//!
//! Every start/complete/cancel runs as one store transaction; custody and
//! equipment-state calls execute inside that transaction so any failure
//! rolls the whole batch back. Valve actuator commands are issued after the
//! commit, from the committed valve rows, so a rolled-back batch never
//! reaches the hardware.

pub mod collaborators;
pub mod controller;
pub mod error;
pub mod seed;

// Re-export key types for convenience
pub use collaborators::{
    BatchCustody, CollaboratorError, EquipmentStates, InMemoryEquipmentStates, LoggingActuator,
    LoggingCustody, ValveActuator,
};
pub use controller::{
    OperationController, RoutePlan, TransferClosed, TransferRequest, TransferStarted,
};
pub use error::{EngineError, EngineResult};
pub use seed::seed_state;
