use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue};

use crate::{
    geometry::hull::convex_hull,
    problem::vehicle_routing_problem::VehicleRoutingProblem,
};

/// Convex hulls of the clusters produced by a split.
///
/// Built by the split itself and handed back to the caller, which decides
/// whether to write it anywhere.
#[derive(Debug, Clone, Default)]
pub struct ClusterDebug {
    features: Vec<Feature>,
}

impl ClusterDebug {
    /// Adds the hull of every service location of `problem`, with the cluster
    /// load per unit, total service duration and vehicles as properties.
    pub fn record(&mut self, problem: &VehicleRoutingProblem) {
        let locations: Vec<_> = problem
            .services()
            .iter()
            .filter_map(|service| problem.service_location(service))
            .collect();
        if locations.is_empty() {
            return;
        }

        let hull = convex_hull(locations.iter().copied());

        let mut properties = JsonObject::new();
        properties.insert(
            String::from("name"),
            JsonValue::from(format!("cluster {}", self.features.len())),
        );
        properties.insert(
            String::from("services"),
            JsonValue::from(problem.services().len()),
        );
        properties.insert(
            String::from("duration"),
            JsonValue::from(
                problem
                    .services()
                    .iter()
                    .filter_map(|service| service.first_activity())
                    .map(|activity| activity.duration().as_secs())
                    .sum::<i64>(),
            ),
        );
        for unit in problem.units() {
            let total: f64 = problem
                .services()
                .iter()
                .map(|service| service.quantity(unit.id()))
                .sum();
            properties.insert(unit.id().to_owned(), JsonValue::from(total));
        }
        properties.insert(
            String::from("vehicles"),
            JsonValue::from(
                problem
                    .vehicles()
                    .iter()
                    .map(|vehicle| vehicle.id().to_owned())
                    .collect::<Vec<_>>(),
            ),
        );

        self.features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(&hull))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    pub fn extend(&mut self, other: ClusterDebug) {
        self.features.extend(other.features);
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn into_geojson(self) -> GeoJson {
        GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features: self.features,
            foreign_members: None,
        })
    }
}
