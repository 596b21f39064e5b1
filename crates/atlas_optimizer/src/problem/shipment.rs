use serde::{Deserialize, Serialize};

use super::service::{Activity, Quantity};

fn default_priority() -> u32 {
    4
}

/// Paired pickup and delivery performed by the same vehicle.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Shipment {
    id: String,
    pickup: Activity,
    delivery: Activity,
    #[serde(default)]
    quantities: Vec<Quantity>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default = "default_priority")]
    priority: u32,
}

impl Shipment {
    pub fn new(id: impl Into<String>, pickup: Activity, delivery: Activity) -> Self {
        Shipment {
            id: id.into(),
            pickup,
            delivery,
            quantities: Vec::new(),
            skills: Vec::new(),
            priority: default_priority(),
        }
    }

    pub fn with_quantities(mut self, quantities: Vec<Quantity>) -> Self {
        self.quantities = quantities;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pickup(&self) -> &Activity {
        &self.pickup
    }

    pub fn delivery(&self) -> &Activity {
        &self.delivery
    }

    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }
}
