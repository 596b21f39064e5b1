use fxhash::FxHashSet;
use jiff::SignedDuration;
use prost::Message;

use crate::{
    problem::{
        matrix::{Matrix, MatrixDimension},
        vehicle::Vehicle,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::{
        cost_details::CostDetails,
        route::Route,
        solution::Solution,
        step::{Load, Step, StepInfo, StepKind},
    },
    wrappers::{SolverWrapper, error::DecodeError},
};

use super::{OrtoolsWrapper, proto};

fn cost_details(details: Option<&proto::CostDetails>) -> CostDetails {
    let Some(details) = details else {
        return CostDetails::default();
    };

    CostDetails {
        fixed: details.fixed as f64,
        time: (details.time + details.time_fake + details.time_without_wait) as f64,
        distance: (details.distance + details.distance_fake) as f64,
        value: details.value as f64,
        lateness: details.lateness as f64,
        overload: details.overload as f64,
    }
}

fn loads(problem: &VehicleRoutingProblem, quantities: &[f32]) -> Vec<Load> {
    problem
        .units()
        .iter()
        .zip(quantities)
        .map(|(unit, current)| Load {
            unit_id: unit.id().to_owned(),
            current: *current as f64,
        })
        .collect()
}

/// Travel from the previous located step, read from the vehicle matrix.
fn travel(matrix: Option<&Matrix>, from: Option<usize>, to: Option<usize>, info: &mut StepInfo) {
    let (Some(matrix), Some(from), Some(to)) = (matrix, from, to) else {
        return;
    };

    info.travel_time = matrix
        .get(MatrixDimension::Time, from, to)
        .map(|time| time.round() as i64);
    info.travel_distance = matrix.get(MatrixDimension::Distance, from, to);
    info.travel_value = matrix.get(MatrixDimension::Value, from, to);
}

struct Planned<'a> {
    services: Vec<bool>,
    rests: FxHashSet<(&'a str, &'a str)>,
}

fn build_route<'a>(
    problem: &'a VehicleRoutingProblem,
    vehicle: &'a Vehicle,
    route: &proto::Route,
    planned: &mut Planned<'a>,
) -> Result<Route, DecodeError> {
    let matrix = problem.vehicle_matrix(vehicle);
    let mut previous_index: Option<usize> = None;
    let mut steps = Vec::with_capacity(route.activities.len());

    for activity in &route.activities {
        let (kind, point_id, duration) = match activity.r#type.as_str() {
            "start" | "end" => {
                let point_id = if activity.r#type == "start" {
                    vehicle.start_point_id()
                } else {
                    vehicle.end_point_id()
                };
                let Some(point_id) = point_id else {
                    continue;
                };
                (StepKind::Depot, Some(point_id), 0)
            }
            "service" => {
                let index = usize::try_from(activity.index)
                    .map_err(|_| DecodeError::UnknownJob(activity.index as i64))?;
                let service = problem
                    .services()
                    .get(index)
                    .ok_or(DecodeError::UnknownJob(activity.index as i64))?;
                let alternative = activity.alternative.max(0) as usize;
                let performed = service
                    .candidate_activities()
                    .nth(alternative)
                    .or_else(|| service.first_activity());
                planned.services[index] = true;

                (
                    StepKind::Service {
                        service_id: service.id().to_owned(),
                        alternative,
                    },
                    performed.map(|performed| performed.point_id()),
                    performed.map_or(0, |performed| performed.duration().as_secs()),
                )
            }
            "break" => {
                let Some(rest) = vehicle.rests().iter().find(|rest| rest.id() == activity.id)
                else {
                    continue;
                };
                planned.rests.insert((vehicle.id(), rest.id()));
                (
                    StepKind::Rest {
                        rest_id: rest.id().to_owned(),
                    },
                    None,
                    rest.duration().as_secs(),
                )
            }
            _ => continue,
        };

        let matrix_index = point_id
            .and_then(|point_id| problem.point(point_id))
            .and_then(|point| point.matrix_index());

        let mut step = Step::new(kind, point_id.map(str::to_owned));
        step.info.begin_time = Some(activity.start_time);
        step.info.departure_time = Some(activity.start_time + duration);
        step.info.current_distance = Some(activity.current_distance as f64);
        if matrix_index.is_some() {
            travel(matrix, previous_index, matrix_index, &mut step.info);
            previous_index = matrix_index;
        }
        step.loads = loads(problem, &activity.quantities);
        steps.push(step);
    }

    let mut decoded = Route::new(vehicle.id());
    decoded.initial_loads = route
        .activities
        .first()
        .map(|activity| loads(problem, &activity.quantities))
        .unwrap_or_default();
    decoded.steps = steps;
    decoded.cost_details = cost_details(route.cost_details.as_ref());
    decoded.compute_details();

    Ok(decoded)
}

/// Routes are listed in vehicle order.
pub fn build_solution(
    problem: &VehicleRoutingProblem,
    result: &proto::SolverResult,
) -> Result<Solution, DecodeError> {
    if result.routes.len() > problem.vehicles().len() {
        return Err(DecodeError::UnknownVehicle(result.routes.len()));
    }

    let mut planned = Planned {
        services: vec![false; problem.services().len()],
        rests: FxHashSet::default(),
    };

    let mut routes = Vec::with_capacity(problem.vehicles().len());
    for (index, vehicle) in problem.vehicles().iter().enumerate() {
        match result.routes.get(index) {
            Some(route) => routes.push(build_route(problem, vehicle, route, &mut planned)?),
            None => routes.push(Route::new(vehicle.id())),
        }
    }

    let mut unassigned: Vec<Step> = problem
        .services()
        .iter()
        .zip(&planned.services)
        .filter(|(_, planned)| !**planned)
        .map(|(service, _)| Step::unassigned_service(service.id()))
        .collect();
    for vehicle in problem.vehicles() {
        for rest in vehicle.rests() {
            if !planned.rests.contains(&(vehicle.id(), rest.id())) {
                unassigned.push(Step::new(
                    StepKind::Rest {
                        rest_id: rest.id().to_owned(),
                    },
                    None,
                ));
            }
        }
    }

    let mut total_cost_details = CostDetails::default();
    for route in &routes {
        total_cost_details += &route.cost_details;
    }

    Ok(Solution {
        cost: result.cost,
        elapsed: SignedDuration::try_from_secs_f64(result.duration).unwrap_or_default(),
        iterations: Some(result.iterations),
        solvers: vec![String::from(OrtoolsWrapper::NAME)],
        routes,
        unassigned,
        cost_details: total_cost_details,
        ..Solution::default()
    })
}

pub fn decode_result(
    problem: &VehicleRoutingProblem,
    payload: &[u8],
) -> Result<Solution, DecodeError> {
    let result = proto::SolverResult::decode(payload)?;
    build_solution(problem, &result)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestProblem;

    use super::*;

    fn activity(kind: &str, index: i32, start_time: i64) -> proto::Activity {
        proto::Activity {
            r#type: String::from(kind),
            index,
            start_time,
            quantities: vec![index.max(0) as f32],
            ..proto::Activity::default()
        }
    }

    #[test]
    fn test_decode_result() {
        let problem = TestProblem::grid(3, 2);
        let result = proto::SolverResult {
            cost: 42.0,
            duration: 1.5,
            iterations: 12,
            routes: vec![
                proto::Route {
                    activities: vec![
                        activity("start", -1, 0),
                        activity("service", 1, 100),
                        activity("service", 0, 500),
                        activity("end", -1, 1000),
                    ],
                    cost_details: Some(proto::CostDetails {
                        time: 30.0,
                        time_fake: 2.0,
                        fixed: 10.0,
                        ..proto::CostDetails::default()
                    }),
                },
                proto::Route::default(),
            ],
        };

        let solution = decode_result(&problem, &result.encode_to_vec()).unwrap();

        assert_eq!(solution.cost, 42.0);
        assert_eq!(solution.iterations, Some(12));
        assert_eq!(solution.elapsed, SignedDuration::from_millis(1500));
        assert_eq!(solution.routes.len(), 2);
        assert_eq!(
            solution.routes[0].service_ids().collect::<Vec<_>>(),
            vec!["s1", "s0"]
        );
        assert_eq!(solution.unassigned_service_ids().collect::<Vec<_>>(), vec!["s2"]);
        assert_eq!(solution.cost_details.time, 32.0);
        assert_eq!(solution.cost_details.fixed, 10.0);

        let steps = &solution.routes[0].steps;
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].point_id.as_deref(), Some("depot"));
        assert_eq!(steps[1].point_id.as_deref(), Some("p1"));
        assert_eq!(steps[1].info.departure_time, Some(400));
        let expected = problem.matrices()[0].time(0, 2).map(|t| t.round() as i64);
        assert_eq!(steps[1].info.travel_time, expected);
        assert_eq!(steps[1].loads[0].current, 1.0);
        assert_eq!(solution.routes[0].details.total_time, Some(1000));
    }

    #[test]
    fn test_unknown_service_index() {
        let problem = TestProblem::grid(1, 1);
        let result = proto::SolverResult {
            routes: vec![proto::Route {
                activities: vec![activity("service", 7, 0)],
                cost_details: None,
            }],
            ..proto::SolverResult::default()
        };

        assert!(matches!(
            build_solution(&problem, &result),
            Err(DecodeError::UnknownJob(7))
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let problem = TestProblem::grid(1, 1);
        assert!(decode_result(&problem, &[0x0a, 0xff]).is_err());
    }
}
