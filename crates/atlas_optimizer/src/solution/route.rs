use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use super::{
    cost_details::CostDetails,
    step::{Load, Step},
};

/// Aggregates over a route, left empty when the solver does not provide them.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteDetails {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub total_time: Option<i64>,
    pub total_travel_time: Option<i64>,
    pub total_distance: Option<f64>,
    pub total_waiting_time: Option<i64>,
    pub total_travel_value: Option<f64>,
}

fn add_option<T: AddAssign + Copy>(target: &mut Option<T>, value: Option<T>) {
    match (target.as_mut(), value) {
        (Some(target), Some(value)) => *target += value,
        (None, Some(value)) => *target = Some(value),
        _ => {}
    }
}

impl AddAssign<&RouteDetails> for RouteDetails {
    fn add_assign(&mut self, other: &RouteDetails) {
        add_option(&mut self.total_time, other.total_time);
        add_option(&mut self.total_travel_time, other.total_travel_time);
        add_option(&mut self.total_distance, other.total_distance);
        add_option(&mut self.total_waiting_time, other.total_waiting_time);
        add_option(&mut self.total_travel_value, other.total_travel_value);
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Route {
    pub vehicle_id: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub initial_loads: Vec<Load>,
    #[serde(default)]
    pub cost_details: CostDetails,
    #[serde(default)]
    pub details: RouteDetails,
}

impl Route {
    pub fn new(vehicle_id: impl Into<String>) -> Self {
        Route {
            vehicle_id: vehicle_id.into(),
            steps: Vec::new(),
            initial_loads: Vec::new(),
            cost_details: CostDetails::default(),
            details: RouteDetails::default(),
        }
    }

    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| step.service_id())
    }

    pub fn has_services(&self) -> bool {
        self.service_ids().next().is_some()
    }

    /// Fills the route aggregates from the step timings.
    pub fn compute_details(&mut self) {
        let start_time = self.steps.first().and_then(|step| step.info.begin_time);
        let end_time = self
            .steps
            .last()
            .and_then(|step| step.info.departure_time.or(step.info.begin_time));

        let sum_i64 =
            |f: fn(&Step) -> Option<i64>| -> Option<i64> { Some(self.steps.iter().filter_map(f).sum()) };

        self.details = RouteDetails {
            start_time,
            end_time,
            total_time: start_time.zip(end_time).map(|(start, end)| end - start),
            total_travel_time: sum_i64(|step| step.info.travel_time),
            total_distance: Some(
                self.steps
                    .iter()
                    .filter_map(|step| step.info.travel_distance)
                    .sum(),
            ),
            total_waiting_time: sum_i64(|step| step.info.waiting_time),
            total_travel_value: None,
        };
    }
}
