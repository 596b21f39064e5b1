use crate::{
    problem::{matrix::MatrixDimension, vehicle_routing_problem::VehicleRoutingProblem},
    solution::{
        route::Route,
        solution::Solution,
        step::{Load, Step, StepKind},
    },
    wrappers::{SolverWrapper, error::DecodeError},
};

use super::{
    VroomWrapper,
    encode::VroomEncoded,
    types::{VroomRoute, VroomSolution},
};

/// Step kind and point behind a vroom job id.
fn job_step(
    problem: &VehicleRoutingProblem,
    id: usize,
) -> Result<(StepKind, Option<&str>), DecodeError> {
    let services = problem.services();
    if let Some(service) = services.get(id) {
        return Ok((
            StepKind::Service {
                service_id: service.id().to_owned(),
                alternative: 0,
            },
            service.first_activity().map(|activity| activity.point_id()),
        ));
    }

    let offset = id - services.len();
    let shipment = problem
        .shipments()
        .get(offset / 2)
        .ok_or(DecodeError::UnknownJob(id as i64))?;
    let shipment_id = shipment.id().to_owned();
    Ok(if offset % 2 == 0 {
        (
            StepKind::Pickup { shipment_id },
            Some(shipment.pickup().point_id()),
        )
    } else {
        (
            StepKind::Delivery { shipment_id },
            Some(shipment.delivery().point_id()),
        )
    })
}

fn build_route(
    problem: &VehicleRoutingProblem,
    encoded: &VroomEncoded,
    route: &VroomRoute,
) -> Result<Route, DecodeError> {
    let vehicle = problem
        .vehicles()
        .get(route.vehicle)
        .ok_or(DecodeError::UnknownVehicle(route.vehicle))?;
    let matrix = problem.vehicle_matrix(vehicle);
    let mut previous_index: Option<usize> = None;
    let mut steps = Vec::with_capacity(route.steps.len());

    for step in &route.steps {
        let (kind, point_id) = match (step.step_type.as_str(), step.id) {
            ("start", _) | ("end", _) => {
                let point_id = if step.step_type == "start" {
                    vehicle.start_point_id()
                } else {
                    vehicle.end_point_id()
                };
                let Some(point_id) = point_id else {
                    continue;
                };
                (StepKind::Depot, Some(point_id))
            }
            ("job", Some(id)) | ("pickup", Some(id)) | ("delivery", Some(id)) => {
                job_step(problem, id)?
            }
            ("break", Some(id)) => {
                let Some((_, rest_id)) = encoded.rests.get(id) else {
                    continue;
                };
                (
                    StepKind::Rest {
                        rest_id: rest_id.clone(),
                    },
                    None,
                )
            }
            _ => continue,
        };

        let mut decoded = Step::new(kind, point_id.map(str::to_owned));
        let begin_time = step.arrival + step.waiting_time;
        decoded.info.begin_time = Some(begin_time);
        decoded.info.departure_time = Some(begin_time + step.service);
        decoded.info.waiting_time = Some(step.waiting_time);

        let matrix_index = point_id
            .and_then(|point_id| problem.point(point_id))
            .and_then(|point| point.matrix_index());
        if let (Some(matrix), Some(from), Some(to)) = (matrix, previous_index, matrix_index) {
            decoded.info.travel_time = matrix
                .get(MatrixDimension::Time, from, to)
                .map(|time| time.round() as i64);
            decoded.info.travel_distance = matrix.get(MatrixDimension::Distance, from, to);
            decoded.info.travel_value = matrix.get(MatrixDimension::Value, from, to);
        }
        if matrix_index.is_some() {
            previous_index = matrix_index;
        }

        decoded.loads = encoded
            .units
            .iter()
            .zip(&step.load)
            .map(|(unit_id, current)| Load {
                unit_id: unit_id.clone(),
                current: *current as f64,
            })
            .collect();
        steps.push(decoded);
    }

    let mut decoded = Route::new(vehicle.id());
    decoded.initial_loads = steps.first().map(|step| step.loads.clone()).unwrap_or_default();
    decoded.steps = steps;
    decoded.cost_details.fixed = if decoded.steps.is_empty() {
        0.0
    } else {
        vehicle.cost_fixed()
    };
    decoded.compute_details();

    Ok(decoded)
}

/// Reads a vroom result, one route per vehicle whether used or not.
pub fn decode_solution(
    problem: &VehicleRoutingProblem,
    encoded: &VroomEncoded,
    payload: &[u8],
) -> Result<Solution, DecodeError> {
    let result: VroomSolution = serde_json::from_slice(payload)?;

    let mut routes: Vec<Route> = problem
        .vehicles()
        .iter()
        .map(|vehicle| Route::new(vehicle.id()))
        .collect();
    let mut cost = result.summary.cost;
    for route in &result.routes {
        let decoded = build_route(problem, encoded, route)?;
        cost += decoded.cost_details.fixed;
        routes[route.vehicle] = decoded;
    }

    let unassigned = result
        .unassigned
        .iter()
        .map(|unassigned| {
            job_step(problem, unassigned.id).map(|(kind, _)| Step::new(kind, None))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut solution = Solution {
        cost,
        solvers: vec![String::from(VroomWrapper::NAME)],
        routes,
        unassigned,
        ..Solution::default()
    };
    for route in &solution.routes {
        solution.cost_details += &route.cost_details;
    }
    Ok(solution)
}
