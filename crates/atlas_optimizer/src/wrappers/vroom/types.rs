use serde::{Deserialize, Serialize};

/// Time window bound used when a window is left open.
pub const OPEN_END: i64 = 1 << 30;

#[derive(Serialize, Debug, Default, PartialEq)]
pub struct VroomProblem {
    pub vehicles: Vec<VroomVehicle>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<VroomJob>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shipments: Vec<VroomShipment>,
    pub matrix: Vec<Vec<i64>>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct VroomVehicle {
    pub id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub capacity: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<[i64; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub breaks: Vec<VroomBreak>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct VroomBreak {
    pub id: usize,
    pub service: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub time_windows: Vec<[i64; 2]>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct VroomJob {
    pub id: usize,
    pub location_index: usize,
    pub service: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<usize>,
    pub priority: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub time_windows: Vec<[i64; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pickup: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delivery: Vec<i64>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct VroomShipmentStep {
    pub id: usize,
    pub service: i64,
    pub location_index: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub time_windows: Vec<[i64; 2]>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct VroomShipment {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub amount: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<usize>,
    pub priority: u32,
    pub pickup: VroomShipmentStep,
    pub delivery: VroomShipmentStep,
}

#[derive(Deserialize, Debug, Default)]
pub struct VroomSummary {
    #[serde(default)]
    pub cost: f64,
}

#[derive(Deserialize, Debug)]
pub struct VroomStep {
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub id: Option<usize>,
    #[serde(default)]
    pub arrival: i64,
    #[serde(default)]
    pub waiting_time: i64,
    #[serde(default)]
    pub service: i64,
    #[serde(default)]
    pub load: Vec<i64>,
}

#[derive(Deserialize, Debug)]
pub struct VroomRoute {
    pub vehicle: usize,
    #[serde(default)]
    pub steps: Vec<VroomStep>,
}

#[derive(Deserialize, Debug)]
pub struct VroomUnassigned {
    pub id: usize,
}

#[derive(Deserialize, Debug, Default)]
pub struct VroomSolution {
    #[serde(default)]
    pub summary: VroomSummary,
    #[serde(default)]
    pub routes: Vec<VroomRoute>,
    #[serde(default)]
    pub unassigned: Vec<VroomUnassigned>,
}
