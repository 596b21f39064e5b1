use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use super::time_window::TimeWindow;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Quantity {
    unit_id: String,
    value: f64,
}

impl Quantity {
    pub fn new(unit_id: impl Into<String>, value: f64) -> Self {
        Quantity {
            unit_id: unit_id.into(),
            value,
        }
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Activity {
    point_id: String,
    #[serde(default)]
    duration: SignedDuration,
    #[serde(default)]
    setup_duration: SignedDuration,
    #[serde(default)]
    timewindows: Vec<TimeWindow>,
    #[serde(default)]
    late_multiplier: Option<f64>,
}

impl Activity {
    pub fn new(point_id: impl Into<String>) -> Self {
        Activity {
            point_id: point_id.into(),
            duration: SignedDuration::ZERO,
            setup_duration: SignedDuration::ZERO,
            timewindows: Vec::new(),
            late_multiplier: None,
        }
    }

    pub fn point_id(&self) -> &str {
        &self.point_id
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    pub fn setup_duration(&self) -> SignedDuration {
        self.setup_duration
    }

    pub fn timewindows(&self) -> &[TimeWindow] {
        &self.timewindows
    }

    pub fn late_multiplier(&self) -> Option<f64> {
        self.late_multiplier
    }

    pub fn with_duration(mut self, duration: SignedDuration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_setup_duration(mut self, setup_duration: SignedDuration) -> Self {
        self.setup_duration = setup_duration;
        self
    }

    pub fn with_timewindows(mut self, timewindows: Vec<TimeWindow>) -> Self {
        self.timewindows = timewindows;
        self
    }

    pub fn with_late_multiplier(mut self, late_multiplier: f64) -> Self {
        self.late_multiplier = Some(late_multiplier);
        self
    }
}

fn default_priority() -> u32 {
    4
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Service {
    id: String,
    #[serde(default)]
    activity: Option<Activity>,
    #[serde(default)]
    activities: Vec<Activity>,
    #[serde(default)]
    quantities: Vec<Quantity>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default = "default_priority")]
    priority: u32,
    #[serde(default)]
    sticky_vehicle_ids: Vec<String>,
    #[serde(default)]
    exclusion_cost: Option<f64>,
}

impl Service {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The single activity of the service, `None` when it only has alternatives.
    pub fn activity(&self) -> Option<&Activity> {
        self.activity.as_ref()
    }

    pub fn alternative_activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Every activity the service may be performed with, the main one first.
    pub fn candidate_activities(&self) -> impl Iterator<Item = &Activity> {
        self.activity.iter().chain(self.activities.iter())
    }

    pub fn first_activity(&self) -> Option<&Activity> {
        self.candidate_activities().next()
    }

    pub fn has_single_activity(&self) -> bool {
        self.activity.is_some()
    }

    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    pub fn quantity(&self, unit_id: &str) -> f64 {
        self.quantities
            .iter()
            .filter(|quantity| quantity.unit_id == unit_id)
            .map(|quantity| quantity.value)
            .sum()
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn sticky_vehicle_ids(&self) -> &[String] {
        &self.sticky_vehicle_ids
    }

    pub fn exclusion_cost(&self) -> Option<f64> {
        self.exclusion_cost
    }
}

#[derive(Default)]
pub struct ServiceBuilder {
    id: Option<String>,
    activity: Option<Activity>,
    activities: Vec<Activity>,
    quantities: Vec<Quantity>,
    skills: Vec<String>,
    priority: Option<u32>,
    sticky_vehicle_ids: Vec<String>,
    exclusion_cost: Option<f64>,
}

impl ServiceBuilder {
    pub fn set_id(&mut self, id: impl Into<String>) -> &mut ServiceBuilder {
        self.id = Some(id.into());
        self
    }

    pub fn set_activity(&mut self, activity: Activity) -> &mut ServiceBuilder {
        self.activity = Some(activity);
        self
    }

    pub fn add_alternative_activity(&mut self, activity: Activity) -> &mut ServiceBuilder {
        self.activities.push(activity);
        self
    }

    pub fn add_quantity(&mut self, unit_id: impl Into<String>, value: f64) -> &mut ServiceBuilder {
        self.quantities.push(Quantity::new(unit_id, value));
        self
    }

    pub fn set_quantities(&mut self, quantities: Vec<Quantity>) -> &mut ServiceBuilder {
        self.quantities = quantities;
        self
    }

    pub fn set_skills(&mut self, skills: Vec<String>) -> &mut ServiceBuilder {
        self.skills = skills;
        self
    }

    pub fn set_priority(&mut self, priority: u32) -> &mut ServiceBuilder {
        self.priority = Some(priority);
        self
    }

    pub fn set_sticky_vehicle_ids(&mut self, sticky_vehicle_ids: Vec<String>) -> &mut ServiceBuilder {
        self.sticky_vehicle_ids = sticky_vehicle_ids;
        self
    }

    pub fn set_exclusion_cost(&mut self, exclusion_cost: f64) -> &mut ServiceBuilder {
        self.exclusion_cost = Some(exclusion_cost);
        self
    }

    pub fn build(self) -> Service {
        Service {
            id: self.id.expect("Expected service id"),
            activity: self.activity,
            activities: self.activities,
            quantities: self.quantities,
            skills: self.skills,
            priority: self.priority.unwrap_or_else(default_priority),
            sticky_vehicle_ids: self.sticky_vehicle_ids,
            exclusion_cost: self.exclusion_cost,
        }
    }
}
