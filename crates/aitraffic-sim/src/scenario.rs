//! Scenario documents: already-decoded traffic entries as JSON.
//!
//! A scenario lists entities by type tag with their initial state, plus
//! any flight plans the entries refer to by name. Entries that cannot be
//! spawned are skipped with a warning; the rest of the scenario still loads.

use std::path::Path;

use serde::{Deserialize, Serialize};

use aitraffic_core::error::{ScenarioError, SpawnError};
use aitraffic_core::params::{InitialState, WaypointRecord};
use aitraffic_core::types::{EntityId, ViewerState};

use crate::engine::TrafficManager;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    /// Where the viewer sits while the scenario is replayed headless.
    pub viewer: ViewerState,
    pub flight_plans: Vec<NamedFlightPlan>,
    pub entries: Vec<ScenarioEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedFlightPlan {
    pub name: String,
    pub waypoints: Vec<WaypointRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioEntry {
    /// Entity type tag, e.g. `"aircraft"` or `"ballistic"`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub state: InitialState,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Register the flight plans and spawn every entry that validates.
    /// Returns the ids of the spawned entities, in entry order.
    pub fn spawn_into(&self, manager: &mut TrafficManager) -> Vec<EntityId> {
        for plan in &self.flight_plans {
            manager.register_flight_plan(&plan.name, plan.waypoints.clone());
        }

        let mut spawned = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            match manager.spawn_tagged(&entry.kind, entry.state.clone()) {
                Ok(id) => spawned.push(id),
                Err(SpawnError::UnknownKind(tag)) => {
                    tracing::warn!(index, tag = %tag, "unknown entity type, entry skipped");
                }
                Err(e) => {
                    tracing::warn!(index, tag = %entry.kind, error = %e, "scenario entry skipped");
                }
            }
        }
        tracing::info!(scenario = %self.name, spawned = spawned.len(), entries = self.entries.len(), "scenario loaded");
        spawned
    }
}
