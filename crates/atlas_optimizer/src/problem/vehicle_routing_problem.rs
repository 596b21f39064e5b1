use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::{
    configuration::Configuration, initial_route::InitialRoute, location::Location, matrix::Matrix, point::Point,
    relation::Relation, service::Service, shipment::Shipment, unit::Unit, vehicle::Vehicle,
};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VehicleRoutingProblem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    points: Vec<Point>,
    #[serde(default)]
    units: Vec<Unit>,
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    shipments: Vec<Shipment>,
    #[serde(default)]
    vehicles: Vec<Vehicle>,
    /// Never mutated after loading, shared by every sub-problem.
    #[serde(default)]
    matrices: Arc<Vec<Matrix>>,
    #[serde(default)]
    relations: Vec<Relation>,
    #[serde(default)]
    routes: Vec<InitialRoute>,
    #[serde(default)]
    configuration: Configuration,
}

impl VehicleRoutingProblem {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }

    pub fn routes(&self) -> &[InitialRoute] {
        &self.routes
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn matrices(&self) -> &[Matrix] {
        &self.matrices
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    /// Number of jobs to plan: services plus both ends of each shipment.
    pub fn size(&self) -> usize {
        self.services.len() + 2 * self.shipments.len()
    }

    pub fn point(&self, point_id: &str) -> Option<&Point> {
        self.points.iter().find(|point| point.id() == point_id)
    }

    pub fn points_by_id(&self) -> FxHashMap<&str, &Point> {
        self.points.iter().map(|point| (point.id(), point)).collect()
    }

    pub fn service(&self, service_id: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|service| service.id() == service_id)
    }

    pub fn services_by_id(&self) -> FxHashMap<&str, &Service> {
        self.services
            .iter()
            .map(|service| (service.id(), service))
            .collect()
    }

    pub fn vehicle(&self, vehicle_id: &str) -> Option<&Vehicle> {
        self.vehicles
            .iter()
            .find(|vehicle| vehicle.id() == vehicle_id)
    }

    pub fn matrix(&self, matrix_id: &str) -> Option<&Matrix> {
        self.matrices.iter().find(|matrix| matrix.id() == matrix_id)
    }

    /// Matrix a vehicle travels on, the first one when it names none.
    pub fn vehicle_matrix(&self, vehicle: &Vehicle) -> Option<&Matrix> {
        match vehicle.matrix_id() {
            Some(matrix_id) => self.matrix(matrix_id),
            None => self.matrices.first(),
        }
    }

    /// Location of the first activity of a service.
    pub fn service_location(&self, service: &Service) -> Option<&Location> {
        service
            .first_activity()
            .and_then(|activity| self.point(activity.point_id()))
            .and_then(|point| point.location())
    }

    pub fn push_service(&mut self, service: Service) {
        self.services.push(service);
    }

    pub fn push_shipment(&mut self, shipment: Shipment) {
        self.shipments.push(shipment);
    }

    /// Copy restricted to the given jobs and vehicles.
    ///
    /// `job_ids` selects services and shipments alike; a kept shipment brings
    /// both its pickup and delivery. Points are reduced to the ones referenced
    /// by the kept jobs and vehicles, in their original order. Relations are
    /// kept when they link at least one kept job. Initial routes of kept
    /// vehicles are reduced to their kept missions.
    pub fn sub_problem(
        &self,
        id: String,
        job_ids: &FxHashSet<&str>,
        vehicle_ids: Option<&[&str]>,
    ) -> VehicleRoutingProblem {
        let services: Vec<Service> = self
            .services
            .iter()
            .filter(|service| job_ids.contains(service.id()))
            .cloned()
            .collect();

        let shipments: Vec<Shipment> = self
            .shipments
            .iter()
            .filter(|shipment| job_ids.contains(shipment.id()))
            .cloned()
            .collect();

        let vehicles: Vec<Vehicle> = match vehicle_ids {
            Some(vehicle_ids) => self
                .vehicles
                .iter()
                .filter(|vehicle| vehicle_ids.contains(&vehicle.id()))
                .cloned()
                .collect(),
            None => self.vehicles.clone(),
        };

        let mut used_points: FxHashSet<&str> = FxHashSet::default();
        for service in &services {
            for activity in service.candidate_activities() {
                used_points.insert(activity.point_id());
            }
        }
        for shipment in &shipments {
            used_points.insert(shipment.pickup().point_id());
            used_points.insert(shipment.delivery().point_id());
        }
        for vehicle in &vehicles {
            used_points.extend(vehicle.start_point_id());
            used_points.extend(vehicle.end_point_id());
        }

        let points = self
            .points
            .iter()
            .filter(|point| used_points.contains(point.id()))
            .cloned()
            .collect();

        let relations = self
            .relations
            .iter()
            .filter(|relation| {
                relation
                    .linked_ids()
                    .iter()
                    .any(|linked_id| job_ids.contains(linked_id.as_str()))
            })
            .cloned()
            .collect();

        let routes = self
            .routes
            .iter()
            .filter(|route| vehicles.iter().any(|vehicle| vehicle.id() == route.vehicle_id()))
            .filter_map(|route| {
                let mission_ids: Vec<String> = route
                    .mission_ids()
                    .iter()
                    .filter(|mission_id| job_ids.contains(mission_id.as_str()))
                    .cloned()
                    .collect();
                (!mission_ids.is_empty())
                    .then(|| InitialRoute::new(route.vehicle_id(), mission_ids))
            })
            .collect();

        VehicleRoutingProblem {
            id,
            points,
            units: self.units.clone(),
            services,
            shipments,
            vehicles,
            matrices: Arc::clone(&self.matrices),
            relations,
            routes,
            configuration: self.configuration.clone(),
        }
    }
}

#[derive(Default)]
pub struct VehicleRoutingProblemBuilder {
    id: Option<String>,
    points: Vec<Point>,
    units: Vec<Unit>,
    services: Vec<Service>,
    shipments: Vec<Shipment>,
    vehicles: Vec<Vehicle>,
    matrices: Vec<Matrix>,
    relations: Vec<Relation>,
    routes: Vec<InitialRoute>,
    configuration: Option<Configuration>,
}

impl VehicleRoutingProblemBuilder {
    pub fn set_id(&mut self, id: impl Into<String>) -> &mut VehicleRoutingProblemBuilder {
        self.id = Some(id.into());
        self
    }

    pub fn set_points(&mut self, points: Vec<Point>) -> &mut VehicleRoutingProblemBuilder {
        self.points = points;
        self
    }

    pub fn set_units(&mut self, units: Vec<Unit>) -> &mut VehicleRoutingProblemBuilder {
        self.units = units;
        self
    }

    pub fn set_services(&mut self, services: Vec<Service>) -> &mut VehicleRoutingProblemBuilder {
        self.services = services;
        self
    }

    pub fn set_shipments(&mut self, shipments: Vec<Shipment>) -> &mut VehicleRoutingProblemBuilder {
        self.shipments = shipments;
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut VehicleRoutingProblemBuilder {
        self.vehicles = vehicles;
        self
    }

    pub fn set_matrices(&mut self, matrices: Vec<Matrix>) -> &mut VehicleRoutingProblemBuilder {
        self.matrices = matrices;
        self
    }

    pub fn set_relations(&mut self, relations: Vec<Relation>) -> &mut VehicleRoutingProblemBuilder {
        self.relations = relations;
        self
    }

    pub fn set_routes(&mut self, routes: Vec<InitialRoute>) -> &mut VehicleRoutingProblemBuilder {
        self.routes = routes;
        self
    }

    pub fn set_configuration(
        &mut self,
        configuration: Configuration,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.configuration = Some(configuration);
        self
    }

    pub fn build(self) -> VehicleRoutingProblem {
        VehicleRoutingProblem {
            id: self.id.unwrap_or_else(|| String::from("problem")),
            points: self.points,
            units: self.units,
            services: self.services,
            shipments: self.shipments,
            vehicles: self.vehicles,
            matrices: Arc::new(self.matrices),
            relations: self.relations,
            routes: self.routes,
            configuration: self.configuration.unwrap_or_default(),
        }
    }
}
