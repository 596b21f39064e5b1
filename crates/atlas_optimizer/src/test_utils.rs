use jiff::SignedDuration;

use crate::problem::{
    location::Location,
    matrix::Matrix,
    point::Point,
    service::{Activity, Quantity, Service, ServiceBuilder},
    shipment::Shipment,
    unit::Unit,
    vehicle::{Vehicle, VehicleBuilder},
    vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
};

pub const DEPOT: (f64, f64) = (48.85, 2.35);

pub struct TestProblem;

impl TestProblem {
    /// Services spread on a line north of the depot, one point each.
    pub fn grid(services: usize, vehicles: usize) -> VehicleRoutingProblem {
        let locations: Vec<(f64, f64)> = (0..services)
            .map(|i| (DEPOT.0 + 0.01 * (i + 1) as f64, DEPOT.1))
            .collect();

        Self::from_locations(&locations, vehicles)
    }

    /// One service of 1 kg and 5 minutes per location, vehicles of 10 kg
    /// leaving from and returning to the depot.
    pub fn from_locations(locations: &[(f64, f64)], vehicles: usize) -> VehicleRoutingProblem {
        let services = (0..locations.len())
            .map(|i| service(&format!("s{i}"), &format!("p{i}"), 1.0))
            .collect();
        let vehicles = (0..vehicles)
            .map(|i| vehicle(&format!("v{i}"), 10.0))
            .collect();

        Self::build(locations, services, vehicles)
    }

    pub fn build(
        locations: &[(f64, f64)],
        services: Vec<Service>,
        vehicles: Vec<Vehicle>,
    ) -> VehicleRoutingProblem {
        let mut points = vec![Point::new(
            "depot",
            Some(Location::from_lat_lon(DEPOT.0, DEPOT.1)),
            Some(0),
        )];
        points.extend(locations.iter().enumerate().map(|(i, &(lat, lon))| {
            Point::new(
                format!("p{i}"),
                Some(Location::from_lat_lon(lat, lon)),
                Some(i + 1),
            )
        }));

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_id("test")
            .set_matrices(vec![haversine_matrix(&points)])
            .set_points(points)
            .set_units(vec![Unit::new("kg")])
            .set_services(services)
            .set_vehicles(vehicles);
        builder.build()
    }
}

/// Time at 10 m/s and distance in meters between every pair of points.
pub fn haversine_matrix(points: &[Point]) -> Matrix {
    let size = points.len();
    let mut time = Vec::with_capacity(size * size);
    let mut distance = Vec::with_capacity(size * size);

    for from in points {
        for to in points {
            let meters = match (from.location(), to.location()) {
                (Some(a), Some(b)) => a.haversine_distance(b).round(),
                _ => 0.0,
            };
            distance.push(meters);
            time.push((meters / 10.0).round());
        }
    }

    Matrix::new("m", size)
        .with_time(time)
        .with_distance(distance)
}

pub fn service(id: &str, point_id: &str, kg: f64) -> Service {
    let mut builder = ServiceBuilder::default();
    builder
        .set_id(id)
        .set_activity(Activity::new(point_id).with_duration(SignedDuration::from_mins(5)))
        .add_quantity("kg", kg);
    builder.build()
}

/// One kg carried from `pickup` to `delivery`.
pub fn shipment(id: &str, pickup: &str, delivery: &str) -> Shipment {
    Shipment::new(id, Activity::new(pickup), Activity::new(delivery))
        .with_quantities(vec![Quantity::new("kg", 1.0)])
}

pub fn vehicle(id: &str, kg: f64) -> Vehicle {
    let mut builder = VehicleBuilder::default();
    builder
        .set_id(id)
        .set_start_point_id("depot")
        .set_end_point_id("depot")
        .set_matrix_id("m")
        .add_capacity("kg", kg);
    builder.build()
}

pub fn service_ids(problem: &VehicleRoutingProblem) -> Vec<&str> {
    problem.services().iter().map(|service| service.id()).collect()
}
