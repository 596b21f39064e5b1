use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Order,
    Sequence,
    SameRoute,
    Shipment,
    MinimumDayLapse,
    MaximumDayLapse,
    ForceFirst,
    NeverFirst,
    ForceEnd,
    VehicleGroupDuration,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Order => "order",
            RelationType::Sequence => "sequence",
            RelationType::SameRoute => "same_route",
            RelationType::Shipment => "shipment",
            RelationType::MinimumDayLapse => "minimum_day_lapse",
            RelationType::MaximumDayLapse => "maximum_day_lapse",
            RelationType::ForceFirst => "force_first",
            RelationType::NeverFirst => "never_first",
            RelationType::ForceEnd => "force_end",
            RelationType::VehicleGroupDuration => "vehicle_group_duration",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Relation {
    #[serde(rename = "type")]
    relation_type: RelationType,
    #[serde(default)]
    linked_ids: Vec<String>,
    #[serde(default)]
    linked_vehicle_ids: Vec<String>,
    #[serde(default)]
    lapse: Option<i64>,
}

impl Relation {
    pub fn new(relation_type: RelationType, linked_ids: Vec<String>) -> Self {
        Relation {
            relation_type,
            linked_ids,
            linked_vehicle_ids: Vec::new(),
            lapse: None,
        }
    }

    pub fn relation_type(&self) -> RelationType {
        self.relation_type
    }

    pub fn linked_ids(&self) -> &[String] {
        &self.linked_ids
    }

    pub fn linked_vehicle_ids(&self) -> &[String] {
        &self.linked_vehicle_ids
    }

    pub fn lapse(&self) -> Option<i64> {
        self.lapse
    }
}
