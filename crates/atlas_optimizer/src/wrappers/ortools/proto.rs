//! Messages exchanged with the or-tools solver.

#[derive(Clone, PartialEq, prost::Message)]
pub struct TimeWindow {
    #[prost(int64, tag = "1")]
    pub start: i64,
    #[prost(int64, tag = "2")]
    pub end: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Service {
    #[prost(message, repeated, tag = "1")]
    pub time_windows: Vec<TimeWindow>,
    #[prost(float, repeated, tag = "2")]
    pub quantities: Vec<f32>,
    #[prost(int64, tag = "3")]
    pub duration: i64,
    #[prost(uint32, tag = "4")]
    pub priority: u32,
    #[prost(int32, repeated, tag = "5")]
    pub vehicle_indices: Vec<i32>,
    #[prost(int32, tag = "6")]
    pub matrix_index: i32,
    #[prost(int64, tag = "7")]
    pub setup_duration: i64,
    #[prost(string, tag = "8")]
    pub id: String,
    #[prost(float, tag = "9")]
    pub late_multiplier: f32,
    #[prost(int64, tag = "10")]
    pub exclusion_cost: i64,
    #[prost(int32, tag = "11")]
    pub problem_index: i32,
    #[prost(int32, tag = "12")]
    pub alternative_index: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Rest {
    #[prost(message, repeated, tag = "1")]
    pub time_windows: Vec<TimeWindow>,
    #[prost(int64, tag = "2")]
    pub duration: i64,
    #[prost(string, tag = "3")]
    pub id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Capacity {
    #[prost(float, tag = "1")]
    pub limit: f32,
    #[prost(float, tag = "2")]
    pub overload_multiplier: f32,
    #[prost(bool, tag = "3")]
    pub counting: bool,
}

/// Parameters shared by identical vehicles.
#[derive(Clone, PartialEq, prost::Message)]
pub struct VehicleType {
    #[prost(float, tag = "1")]
    pub cost_fixed: f32,
    #[prost(float, tag = "2")]
    pub cost_distance_multiplier: f32,
    #[prost(float, tag = "3")]
    pub cost_time_multiplier: f32,
    #[prost(float, tag = "4")]
    pub cost_waiting_time_multiplier: f32,
    #[prost(float, tag = "5")]
    pub cost_value_multiplier: f32,
    #[prost(float, tag = "6")]
    pub cost_late_multiplier: f32,
    #[prost(message, repeated, tag = "7")]
    pub capacities: Vec<Capacity>,
    #[prost(message, optional, tag = "8")]
    pub time_window: Option<TimeWindow>,
    #[prost(message, repeated, tag = "9")]
    pub rests: Vec<Rest>,
    #[prost(int32, tag = "10")]
    pub matrix_index: i32,
    #[prost(int32, tag = "11")]
    pub start_index: i32,
    #[prost(int32, tag = "12")]
    pub end_index: i32,
    #[prost(int64, tag = "13")]
    pub duration: i64,
    #[prost(int64, tag = "14")]
    pub distance: i64,
    #[prost(string, repeated, tag = "15")]
    pub skills: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Vehicle {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(int32, tag = "2")]
    pub type_index: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Matrix {
    #[prost(float, repeated, tag = "1")]
    pub time: Vec<f32>,
    #[prost(float, repeated, tag = "2")]
    pub distance: Vec<f32>,
    #[prost(float, repeated, tag = "3")]
    pub value: Vec<f32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Relation {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(string, repeated, tag = "2")]
    pub linked_ids: Vec<String>,
    #[prost(int64, tag = "3")]
    pub lapse: i64,
    #[prost(string, repeated, tag = "4")]
    pub linked_vehicle_ids: Vec<String>,
}

/// Services a vehicle starts its search from.
#[derive(Clone, PartialEq, prost::Message)]
pub struct InitialRoute {
    #[prost(string, tag = "1")]
    pub vehicle_id: String,
    #[prost(string, repeated, tag = "2")]
    pub service_ids: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Problem {
    #[prost(message, repeated, tag = "1")]
    pub vehicle_types: Vec<VehicleType>,
    #[prost(message, repeated, tag = "2")]
    pub vehicles: Vec<Vehicle>,
    #[prost(message, repeated, tag = "3")]
    pub services: Vec<Service>,
    #[prost(message, repeated, tag = "4")]
    pub matrices: Vec<Matrix>,
    #[prost(message, repeated, tag = "5")]
    pub relations: Vec<Relation>,
    #[prost(message, repeated, tag = "6")]
    pub routes: Vec<InitialRoute>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Activity {
    #[prost(string, tag = "1")]
    pub id: String,
    /// Index of the service in the problem.
    #[prost(int32, tag = "2")]
    pub index: i32,
    #[prost(int64, tag = "3")]
    pub start_time: i64,
    /// `start`, `end`, `service` or `break`.
    #[prost(string, tag = "4")]
    pub r#type: String,
    #[prost(int32, tag = "5")]
    pub alternative: i32,
    #[prost(float, repeated, tag = "6")]
    pub quantities: Vec<f32>,
    #[prost(int64, tag = "7")]
    pub current_distance: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CostDetails {
    #[prost(float, tag = "1")]
    pub fixed: f32,
    #[prost(float, tag = "2")]
    pub distance: f32,
    #[prost(float, tag = "3")]
    pub distance_fake: f32,
    #[prost(float, tag = "4")]
    pub time: f32,
    #[prost(float, tag = "5")]
    pub time_fake: f32,
    #[prost(float, tag = "6")]
    pub time_without_wait: f32,
    #[prost(float, tag = "7")]
    pub value: f32,
    #[prost(float, tag = "8")]
    pub lateness: f32,
    #[prost(float, tag = "9")]
    pub overload: f32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Route {
    #[prost(message, repeated, tag = "1")]
    pub activities: Vec<Activity>,
    #[prost(message, optional, tag = "2")]
    pub cost_details: Option<CostDetails>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SolverResult {
    #[prost(double, tag = "1")]
    pub cost: f64,
    /// Seconds.
    #[prost(double, tag = "2")]
    pub duration: f64,
    #[prost(uint64, tag = "3")]
    pub iterations: u64,
    #[prost(message, repeated, tag = "4")]
    pub routes: Vec<Route>,
}
