use fxhash::{FxHashMap, FxHashSet};
use prost::Message;

use crate::{
    problem::{
        matrix::MatrixDimension,
        point::Point,
        service::{Activity, Service},
        time_window::TimeWindow,
        vehicle::Vehicle,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    wrappers::error::SolveError,
};

use super::proto;

/// End of an open service or rest time window.
pub const OPEN_END: i64 = 1 << 56;
/// End of an open vehicle shift.
const OPEN_SHIFT_END: i64 = i32::MAX as i64;
/// Capacities above this are treated as unbounded.
const UNBOUNDED_CAPACITY: f64 = 1e22;

fn time_window(time_window: &TimeWindow) -> proto::TimeWindow {
    proto::TimeWindow {
        start: time_window.start_secs().unwrap_or(0),
        end: time_window.end_secs().unwrap_or(OPEN_END),
    }
}

fn matrix_index(points: &FxHashMap<&str, &Point>, point_id: &str) -> Result<i32, SolveError> {
    points
        .get(point_id)
        .and_then(|point| point.matrix_index())
        .map(|index| index as i32)
        .ok_or_else(|| SolveError::Encode(format!("point {point_id} has no matrix index")))
}

/// Vehicles allowed to perform a service.
fn vehicle_indices(problem: &VehicleRoutingProblem, service: &Service) -> Vec<i32> {
    let vehicles = problem.vehicles();
    let sticky: Vec<i32> = service
        .sticky_vehicle_ids()
        .iter()
        .filter_map(|id| vehicles.iter().position(|vehicle| vehicle.id() == id))
        .map(|index| index as i32)
        .collect();
    if !sticky.is_empty() {
        return sticky;
    }

    if !service.skills().is_empty() && vehicles.iter().all(|vehicle| vehicle.skills().is_empty()) {
        return Vec::new();
    }

    vehicles
        .iter()
        .enumerate()
        .filter(|(_, vehicle)| vehicle.has_skills(service.skills()))
        .map(|(index, _)| index as i32)
        .collect()
}

struct ServiceContext<'a> {
    points: &'a FxHashMap<&'a str, &'a Point>,
    problem_index: usize,
    quantities: Vec<f32>,
    vehicle_indices: Vec<i32>,
}

fn encode_service(
    context: &ServiceContext,
    service: &Service,
    id: String,
    activity: &Activity,
    alternative_index: usize,
) -> Result<proto::Service, SolveError> {
    Ok(proto::Service {
        time_windows: activity.timewindows().iter().map(time_window).collect(),
        quantities: context.quantities.clone(),
        duration: activity.duration().as_secs(),
        priority: service.priority(),
        vehicle_indices: context.vehicle_indices.clone(),
        matrix_index: matrix_index(context.points, activity.point_id())?,
        setup_duration: activity.setup_duration().as_secs(),
        id,
        late_multiplier: activity.late_multiplier().unwrap_or(0.0) as f32,
        exclusion_cost: service
            .exclusion_cost()
            .map_or(-1, |cost| cost.round() as i64),
        problem_index: context.problem_index as i32,
        alternative_index: alternative_index as i32,
    })
}

fn encode_services(
    problem: &VehicleRoutingProblem,
    points: &FxHashMap<&str, &Point>,
) -> Result<Vec<proto::Service>, SolveError> {
    let mut services = Vec::with_capacity(problem.services().len());

    for (problem_index, service) in problem.services().iter().enumerate() {
        let context = ServiceContext {
            points,
            problem_index,
            quantities: problem
                .units()
                .iter()
                .map(|unit| service.quantity(unit.id()) as f32)
                .collect(),
            vehicle_indices: vehicle_indices(problem, service),
        };

        match service.activity() {
            Some(activity) => services.push(encode_service(
                &context,
                service,
                service.id().to_owned(),
                activity,
                0,
            )?),
            None => {
                for (alternative, activity) in service.alternative_activities().iter().enumerate() {
                    services.push(encode_service(
                        &context,
                        service,
                        format!("{}_activity{alternative}", service.id()),
                        activity,
                        alternative,
                    )?);
                }
            }
        }
    }

    Ok(services)
}

fn vehicle_type(
    problem: &VehicleRoutingProblem,
    points: &FxHashMap<&str, &Point>,
    vehicle: &Vehicle,
) -> Result<proto::VehicleType, SolveError> {
    let endpoint = |point_id: Option<&str>| point_id.map_or(Ok(-1), |id| matrix_index(points, id));

    Ok(proto::VehicleType {
        cost_fixed: vehicle.cost_fixed() as f32,
        cost_distance_multiplier: vehicle.cost_distance_multiplier() as f32,
        cost_time_multiplier: vehicle.cost_time_multiplier() as f32,
        cost_waiting_time_multiplier: vehicle.cost_waiting_time_multiplier() as f32,
        cost_value_multiplier: vehicle.cost_value_multiplier() as f32,
        cost_late_multiplier: vehicle.cost_late_multiplier().unwrap_or(0.0) as f32,
        capacities: problem
            .units()
            .iter()
            .map(|unit| {
                let capacity = vehicle
                    .capacities()
                    .iter()
                    .find(|capacity| capacity.unit_id() == unit.id());
                proto::Capacity {
                    limit: capacity
                        .and_then(|capacity| capacity.limit())
                        .filter(|limit| *limit < UNBOUNDED_CAPACITY)
                        .map_or(-1.0, |limit| limit as f32),
                    overload_multiplier: capacity
                        .and_then(|capacity| capacity.overload_multiplier())
                        .unwrap_or(0.0) as f32,
                    counting: unit.counting(),
                }
            })
            .collect(),
        time_window: Some(proto::TimeWindow {
            start: vehicle
                .timewindow()
                .and_then(|timewindow| timewindow.start_secs())
                .unwrap_or(0),
            end: vehicle
                .timewindow()
                .and_then(|timewindow| timewindow.end_secs())
                .unwrap_or(OPEN_SHIFT_END),
        }),
        rests: vehicle
            .rests()
            .iter()
            .map(|rest| proto::Rest {
                time_windows: rest.timewindows().iter().map(time_window).collect(),
                duration: rest.duration().as_secs(),
                id: rest.id().to_owned(),
            })
            .collect(),
        matrix_index: vehicle
            .matrix_id()
            .and_then(|matrix_id| {
                problem
                    .matrices()
                    .iter()
                    .position(|matrix| matrix.id() == matrix_id)
            })
            .unwrap_or(0) as i32,
        start_index: endpoint(vehicle.start_point_id())?,
        end_index: endpoint(vehicle.end_point_id())?,
        duration: vehicle.duration().map_or(-1, |duration| duration.as_secs()),
        distance: vehicle.distance().map_or(-1, |distance| distance.round() as i64),
        skills: vehicle.skills().to_vec(),
    })
}

/// Vehicles with their index in a deduplicated list of vehicle types.
fn encode_vehicles(
    problem: &VehicleRoutingProblem,
    points: &FxHashMap<&str, &Point>,
) -> Result<(Vec<proto::VehicleType>, Vec<proto::Vehicle>), SolveError> {
    let mut types = Vec::new();
    let mut type_indices: FxHashMap<Vec<u8>, i32> = FxHashMap::default();
    let mut vehicles = Vec::with_capacity(problem.vehicles().len());

    for vehicle in problem.vehicles() {
        let vehicle_type = vehicle_type(problem, points, vehicle)?;
        let type_index = *type_indices
            .entry(vehicle_type.encode_to_vec())
            .or_insert_with(|| {
                types.push(vehicle_type);
                types.len() as i32 - 1
            });

        vehicles.push(proto::Vehicle {
            id: vehicle.id().to_owned(),
            type_index,
        });
    }

    Ok((types, vehicles))
}

fn encode_relations(
    problem: &VehicleRoutingProblem,
    services: &[proto::Service],
) -> Vec<proto::Relation> {
    let service_ids: FxHashSet<&str> = services.iter().map(|service| service.id.as_str()).collect();

    problem
        .relations()
        .iter()
        .filter_map(|relation| {
            let mut linked_ids: Vec<String> = Vec::new();
            for id in relation.linked_ids() {
                if service_ids.contains(id.as_str()) && !linked_ids.contains(id) {
                    linked_ids.push(id.clone());
                }
            }
            let mut linked_vehicle_ids: Vec<String> = Vec::new();
            for id in relation.linked_vehicle_ids() {
                if problem.vehicle(id).is_some() && !linked_vehicle_ids.contains(id) {
                    linked_vehicle_ids.push(id.clone());
                }
            }
            if linked_ids.is_empty() && linked_vehicle_ids.is_empty() {
                return None;
            }

            Some(proto::Relation {
                r#type: relation.relation_type().as_str().to_owned(),
                linked_ids,
                lapse: relation.lapse().unwrap_or(-1),
                linked_vehicle_ids,
            })
        })
        .collect()
}

/// Initial routes restricted to known vehicles and encoded services.
fn encode_routes(
    problem: &VehicleRoutingProblem,
    services: &[proto::Service],
) -> Vec<proto::InitialRoute> {
    let service_ids: FxHashSet<&str> = services.iter().map(|service| service.id.as_str()).collect();

    problem
        .routes()
        .iter()
        .filter(|route| problem.vehicle(route.vehicle_id()).is_some())
        .filter_map(|route| {
            let kept: Vec<String> = route
                .mission_ids()
                .iter()
                .filter(|id| service_ids.contains(id.as_str()))
                .cloned()
                .collect();
            (!kept.is_empty()).then(|| proto::InitialRoute {
                vehicle_id: route.vehicle_id().to_owned(),
                service_ids: kept,
            })
        })
        .collect()
}

pub fn encode_problem(problem: &VehicleRoutingProblem) -> Result<proto::Problem, SolveError> {
    let points = problem.points_by_id();
    let services = encode_services(problem, &points)?;
    let (vehicle_types, vehicles) = encode_vehicles(problem, &points)?;
    let relations = encode_relations(problem, &services);
    let routes = encode_routes(problem, &services);

    let matrices = problem
        .matrices()
        .iter()
        .map(|matrix| {
            let flat = |values: Option<&[f64]>| {
                values
                    .unwrap_or_default()
                    .iter()
                    .map(|value| *value as f32)
                    .collect()
            };
            proto::Matrix {
                time: flat(matrix.dimension(MatrixDimension::Time)),
                distance: flat(matrix.dimension(MatrixDimension::Distance)),
                value: flat(matrix.dimension(MatrixDimension::Value)),
            }
        })
        .collect();

    Ok(proto::Problem {
        vehicle_types,
        vehicles,
        services,
        matrices,
        relations,
        routes,
    })
}
