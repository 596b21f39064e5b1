use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    Depot,
    Service {
        service_id: String,
        #[serde(default)]
        alternative: usize,
    },
    Rest {
        rest_id: String,
    },
    Pickup {
        shipment_id: String,
    },
    Delivery {
        shipment_id: String,
    },
}

/// Timing of a step, in seconds from the horizon start.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct StepInfo {
    pub begin_time: Option<i64>,
    pub departure_time: Option<i64>,
    pub travel_time: Option<i64>,
    pub travel_distance: Option<f64>,
    pub travel_value: Option<f64>,
    pub waiting_time: Option<i64>,
    pub current_distance: Option<f64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Load {
    pub unit_id: String,
    pub current: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Step {
    #[serde(flatten)]
    pub kind: StepKind,
    #[serde(default)]
    pub point_id: Option<String>,
    #[serde(default)]
    pub info: StepInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loads: Vec<Load>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Step {
    pub fn new(kind: StepKind, point_id: Option<String>) -> Self {
        Step {
            kind,
            point_id,
            info: StepInfo::default(),
            loads: Vec::new(),
            reason: None,
        }
    }

    pub fn service(service_id: impl Into<String>, point_id: Option<String>) -> Self {
        Step::new(
            StepKind::Service {
                service_id: service_id.into(),
                alternative: 0,
            },
            point_id,
        )
    }

    /// Entry of the unassigned list for a service no route serves.
    pub fn unassigned_service(service_id: impl Into<String>) -> Self {
        Step::service(service_id, None)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn service_id(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Service { service_id, .. } => Some(service_id),
            _ => None,
        }
    }

    /// Identifier of the job behind the step, if any.
    pub fn job_id(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Service { service_id, .. } => Some(service_id),
            StepKind::Pickup { shipment_id } | StepKind::Delivery { shipment_id } => {
                Some(shipment_id)
            }
            StepKind::Depot | StepKind::Rest { .. } => None,
        }
    }
}
