use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use super::time_window::TimeWindow;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Capacity {
    unit_id: String,
    #[serde(default)]
    limit: Option<f64>,
    #[serde(default)]
    overload_multiplier: Option<f64>,
}

impl Capacity {
    pub fn new(unit_id: impl Into<String>, limit: Option<f64>) -> Self {
        Capacity {
            unit_id: unit_id.into(),
            limit,
            overload_multiplier: None,
        }
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn limit(&self) -> Option<f64> {
        self.limit
    }

    pub fn overload_multiplier(&self) -> Option<f64> {
        self.overload_multiplier
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Rest {
    id: String,
    duration: SignedDuration,
    #[serde(default)]
    timewindows: Vec<TimeWindow>,
}

impl Rest {
    pub fn new(id: impl Into<String>, duration: SignedDuration, timewindows: Vec<TimeWindow>) -> Self {
        Rest {
            id: id.into(),
            duration,
            timewindows,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    pub fn timewindows(&self) -> &[TimeWindow] {
        &self.timewindows
    }
}

fn default_cost_time_multiplier() -> f64 {
    1.0
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Vehicle {
    id: String,
    #[serde(default)]
    start_point_id: Option<String>,
    #[serde(default)]
    end_point_id: Option<String>,
    #[serde(default)]
    matrix_id: Option<String>,
    #[serde(default)]
    capacities: Vec<Capacity>,
    #[serde(default)]
    timewindow: Option<TimeWindow>,
    #[serde(default)]
    rests: Vec<Rest>,
    #[serde(default)]
    cost_fixed: f64,
    #[serde(default)]
    cost_distance_multiplier: f64,
    #[serde(default = "default_cost_time_multiplier")]
    cost_time_multiplier: f64,
    #[serde(default)]
    cost_waiting_time_multiplier: Option<f64>,
    #[serde(default)]
    cost_value_multiplier: f64,
    #[serde(default)]
    cost_late_multiplier: Option<f64>,
    #[serde(default)]
    duration: Option<SignedDuration>,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    skills: Vec<String>,
}

impl Vehicle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start_point_id(&self) -> Option<&str> {
        self.start_point_id.as_deref()
    }

    pub fn end_point_id(&self) -> Option<&str> {
        self.end_point_id.as_deref()
    }

    pub fn matrix_id(&self) -> Option<&str> {
        self.matrix_id.as_deref()
    }

    pub fn capacities(&self) -> &[Capacity] {
        &self.capacities
    }

    /// Capacity limit for a unit, `None` when the vehicle has no bound for it.
    pub fn capacity(&self, unit_id: &str) -> Option<f64> {
        self.capacities
            .iter()
            .find(|capacity| capacity.unit_id == unit_id)
            .and_then(|capacity| capacity.limit)
    }

    pub fn timewindow(&self) -> Option<&TimeWindow> {
        self.timewindow.as_ref()
    }

    pub fn rests(&self) -> &[Rest] {
        &self.rests
    }

    pub fn cost_fixed(&self) -> f64 {
        self.cost_fixed
    }

    pub fn cost_distance_multiplier(&self) -> f64 {
        self.cost_distance_multiplier
    }

    pub fn cost_time_multiplier(&self) -> f64 {
        self.cost_time_multiplier
    }

    pub fn cost_waiting_time_multiplier(&self) -> f64 {
        self.cost_waiting_time_multiplier
            .unwrap_or(self.cost_time_multiplier)
    }

    pub fn cost_value_multiplier(&self) -> f64 {
        self.cost_value_multiplier
    }

    pub fn cost_late_multiplier(&self) -> Option<f64> {
        self.cost_late_multiplier
    }

    pub fn duration(&self) -> Option<SignedDuration> {
        self.duration
    }

    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Whether the vehicle holds every skill in `required`.
    pub fn has_skills(&self, required: &[String]) -> bool {
        required.iter().all(|skill| self.skills.contains(skill))
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    id: Option<String>,
    start_point_id: Option<String>,
    end_point_id: Option<String>,
    matrix_id: Option<String>,
    capacities: Vec<Capacity>,
    timewindow: Option<TimeWindow>,
    rests: Vec<Rest>,
    cost_fixed: f64,
    cost_distance_multiplier: f64,
    cost_time_multiplier: Option<f64>,
    cost_value_multiplier: f64,
    duration: Option<SignedDuration>,
    distance: Option<f64>,
    skills: Vec<String>,
}

impl VehicleBuilder {
    pub fn set_id(&mut self, id: impl Into<String>) -> &mut VehicleBuilder {
        self.id = Some(id.into());
        self
    }

    pub fn set_start_point_id(&mut self, point_id: impl Into<String>) -> &mut VehicleBuilder {
        self.start_point_id = Some(point_id.into());
        self
    }

    pub fn set_end_point_id(&mut self, point_id: impl Into<String>) -> &mut VehicleBuilder {
        self.end_point_id = Some(point_id.into());
        self
    }

    pub fn set_matrix_id(&mut self, matrix_id: impl Into<String>) -> &mut VehicleBuilder {
        self.matrix_id = Some(matrix_id.into());
        self
    }

    pub fn add_capacity(&mut self, unit_id: impl Into<String>, limit: f64) -> &mut VehicleBuilder {
        self.capacities.push(Capacity::new(unit_id, Some(limit)));
        self
    }

    pub fn set_timewindow(&mut self, timewindow: TimeWindow) -> &mut VehicleBuilder {
        self.timewindow = Some(timewindow);
        self
    }

    pub fn add_rest(&mut self, rest: Rest) -> &mut VehicleBuilder {
        self.rests.push(rest);
        self
    }

    pub fn set_cost_fixed(&mut self, cost_fixed: f64) -> &mut VehicleBuilder {
        self.cost_fixed = cost_fixed;
        self
    }

    pub fn set_cost_distance_multiplier(&mut self, multiplier: f64) -> &mut VehicleBuilder {
        self.cost_distance_multiplier = multiplier;
        self
    }

    pub fn set_cost_time_multiplier(&mut self, multiplier: f64) -> &mut VehicleBuilder {
        self.cost_time_multiplier = Some(multiplier);
        self
    }

    pub fn set_cost_value_multiplier(&mut self, multiplier: f64) -> &mut VehicleBuilder {
        self.cost_value_multiplier = multiplier;
        self
    }

    pub fn set_duration(&mut self, duration: SignedDuration) -> &mut VehicleBuilder {
        self.duration = Some(duration);
        self
    }

    pub fn set_distance(&mut self, distance: f64) -> &mut VehicleBuilder {
        self.distance = Some(distance);
        self
    }

    pub fn set_skills(&mut self, skills: Vec<String>) -> &mut VehicleBuilder {
        self.skills = skills;
        self
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            id: self.id.expect("Expected vehicle id"),
            start_point_id: self.start_point_id,
            end_point_id: self.end_point_id,
            matrix_id: self.matrix_id,
            capacities: self.capacities,
            timewindow: self.timewindow,
            rests: self.rests,
            cost_fixed: self.cost_fixed,
            cost_distance_multiplier: self.cost_distance_multiplier,
            cost_time_multiplier: self
                .cost_time_multiplier
                .unwrap_or_else(default_cost_time_multiplier),
            cost_waiting_time_multiplier: None,
            cost_value_multiplier: self.cost_value_multiplier,
            cost_late_multiplier: None,
            duration: self.duration,
            distance: self.distance,
            skills: self.skills,
        }
    }
}
