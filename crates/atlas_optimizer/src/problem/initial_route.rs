use serde::{Deserialize, Serialize};

/// Missions a vehicle should visit first, in order.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct InitialRoute {
    vehicle_id: String,
    #[serde(default)]
    mission_ids: Vec<String>,
}

impl InitialRoute {
    pub fn new(vehicle_id: impl Into<String>, mission_ids: Vec<String>) -> Self {
        InitialRoute {
            vehicle_id: vehicle_id.into(),
            mission_ids,
        }
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn mission_ids(&self) -> &[String] {
        &self.mission_ids
    }
}
