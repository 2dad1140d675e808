//! State snapshot persistence.
//!
//! The whole plant state is saved as one pretty-printed JSON document so a
//! CLI invocation can pick up where the previous one left off.

use std::fs;
use std::path::Path;

use crate::error::{StoreError, StoreResult};
use crate::store::PlantStore;
use crate::types::PlantState;

impl PlantStore {
    /// Load a store from a snapshot file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Err(StoreError::SnapshotNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let state: PlantState = serde_json::from_str(&content)?;
        Ok(PlantStore::new(state))
    }

    /// Save the current state to a snapshot file, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = self.read(|state| serde_json::to_string_pretty(state))??;
        fs::write(path, json)?;
        Ok(())
    }
}
