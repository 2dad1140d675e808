//! Collaborator contracts at the engine's seams.
//!
//! The engine owns routing and reservation; valve hardware, equipment state
//! labels, and batch custody belong to collaborators. Equipment-state and
//! custody calls run inside the operation transaction, so their failure
//! aborts the whole operation. The valve actuator is driven after the
//! commit, from the committed valve rows.

use std::collections::BTreeMap;
use std::sync::Mutex;

use pf_store::ValveState;

/// Failure reported by a collaborator.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Drives physical valves. Calls are idempotent and synchronous.
pub trait ValveActuator: Send + Sync {
    fn set_state(&self, valve: &str, state: ValveState) -> Result<(), CollaboratorError>;
}

/// Tracks a state label per equipment unit ("idle", "in-transfer", ...).
pub trait EquipmentStates: Send + Sync {
    fn state(&self, equipment: &str) -> Option<String>;
    fn set_state(&self, equipment: &str, label: &str) -> Result<(), CollaboratorError>;
}

/// Moves material custody when a transfer completes. The engine knows
/// nothing of mass or composition.
pub trait BatchCustody: Send + Sync {
    fn transfer_custody(
        &self,
        op_id: &str,
        source: &str,
        dest: &str,
    ) -> Result<(), CollaboratorError>;
}

impl<T: ValveActuator + ?Sized> ValveActuator for std::sync::Arc<T> {
    fn set_state(&self, valve: &str, state: ValveState) -> Result<(), CollaboratorError> {
        (**self).set_state(valve, state)
    }
}

impl<T: EquipmentStates + ?Sized> EquipmentStates for std::sync::Arc<T> {
    fn state(&self, equipment: &str) -> Option<String> {
        (**self).state(equipment)
    }

    fn set_state(&self, equipment: &str, label: &str) -> Result<(), CollaboratorError> {
        (**self).set_state(equipment, label)
    }
}

impl<T: BatchCustody + ?Sized> BatchCustody for std::sync::Arc<T> {
    fn transfer_custody(
        &self,
        op_id: &str,
        source: &str,
        dest: &str,
    ) -> Result<(), CollaboratorError> {
        (**self).transfer_custody(op_id, source, dest)
    }
}

/// Actuator that only logs; for plants without hardware hookup.
#[derive(Debug, Default)]
pub struct LoggingActuator;

impl ValveActuator for LoggingActuator {
    fn set_state(&self, valve: &str, state: ValveState) -> Result<(), CollaboratorError> {
        tracing::info!(valve, ?state, "valve actuated");
        Ok(())
    }
}

/// In-memory equipment state labels.
#[derive(Debug, Default)]
pub struct InMemoryEquipmentStates {
    labels: Mutex<BTreeMap<String, String>>,
}

impl EquipmentStates for InMemoryEquipmentStates {
    fn state(&self, equipment: &str) -> Option<String> {
        self.labels
            .lock()
            .ok()
            .and_then(|labels| labels.get(equipment).cloned())
    }

    fn set_state(&self, equipment: &str, label: &str) -> Result<(), CollaboratorError> {
        let mut labels = self
            .labels
            .lock()
            .map_err(|_| CollaboratorError::new("equipment state lock poisoned"))?;
        labels.insert(equipment.to_string(), label.to_string());
        Ok(())
    }
}

/// Custody collaborator that only logs the handover.
#[derive(Debug, Default)]
pub struct LoggingCustody;

impl BatchCustody for LoggingCustody {
    fn transfer_custody(
        &self,
        op_id: &str,
        source: &str,
        dest: &str,
    ) -> Result<(), CollaboratorError> {
        tracing::info!(op_id, source, dest, "material custody transferred");
        Ok(())
    }
}
