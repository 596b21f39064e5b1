use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct CostDetails {
    pub fixed: f64,
    pub time: f64,
    pub distance: f64,
    pub value: f64,
    pub lateness: f64,
    pub overload: f64,
}

impl CostDetails {
    pub fn total(&self) -> f64 {
        self.fixed + self.time + self.distance + self.value + self.lateness + self.overload
    }
}

impl AddAssign<&CostDetails> for CostDetails {
    fn add_assign(&mut self, other: &CostDetails) {
        self.fixed += other.fixed;
        self.time += other.time;
        self.distance += other.distance;
        self.value += other.value;
        self.lateness += other.lateness;
        self.overload += other.overload;
    }
}
