use crate::problem::{
    configuration::FirstSolutionStrategy, vehicle_routing_problem::VehicleRoutingProblem,
};

use super::error::SolveError;

/// Precondition a solver requires from a problem before it is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assertion {
    MatricesVehiclesAndPointsDefinition,
    PointsSameDefinition,
    SquareMatrix,
    VehiclesObjective,
    VehiclesNoZeroDuration,
    NoShipments,
    NoAlternativeActivities,
    NoInitialRoutes,
    FirstSolutionStrategyIsValid,
    HomogeneousCosts,
    NoCostFixed,
    SingleDimension,
    MatricesOnlyOne,
    NoRelations,
    VehiclesNoDurationLimit,
    NoFirstSolutionStrategy,
}

impl Assertion {
    pub fn name(&self) -> &'static str {
        match self {
            Assertion::MatricesVehiclesAndPointsDefinition => {
                "correctness_matrices_vehicles_and_points_definition"
            }
            Assertion::PointsSameDefinition => "points_same_definition",
            Assertion::SquareMatrix => "square_matrix",
            Assertion::VehiclesObjective => "vehicles_objective",
            Assertion::VehiclesNoZeroDuration => "vehicles_no_zero_duration",
            Assertion::NoShipments => "no_shipments",
            Assertion::NoAlternativeActivities => "no_alternative_activities",
            Assertion::NoInitialRoutes => "no_initial_routes",
            Assertion::FirstSolutionStrategyIsValid => "first_solution_strategy_is_valid",
            Assertion::HomogeneousCosts => "homogeneous_costs",
            Assertion::NoCostFixed => "no_cost_fixed",
            Assertion::SingleDimension => "single_dimension",
            Assertion::MatricesOnlyOne => "matrices_only_one",
            Assertion::NoRelations => "no_relations",
            Assertion::VehiclesNoDurationLimit => "vehicles_no_duration_limit",
            Assertion::NoFirstSolutionStrategy => "no_first_solution_strategy",
        }
    }

    pub fn holds(&self, problem: &VehicleRoutingProblem) -> bool {
        let vehicles = problem.vehicles();
        match self {
            Assertion::MatricesVehiclesAndPointsDefinition => {
                let matrices_exist = vehicles
                    .iter()
                    .all(|vehicle| problem.vehicle_matrix(vehicle).is_some());
                let indices_in_bounds = problem.points().iter().all(|point| {
                    point.matrix_index().is_none_or(|index| {
                        vehicles.iter().all(|vehicle| {
                            problem
                                .vehicle_matrix(vehicle)
                                .is_some_and(|matrix| index < matrix.size())
                        })
                    })
                });
                matrices_exist && indices_in_bounds
            }
            Assertion::PointsSameDefinition => problem
                .points()
                .iter()
                .all(|point| point.matrix_index().is_some()),
            Assertion::SquareMatrix => problem.matrices().iter().all(|matrix| matrix.is_square()),
            Assertion::VehiclesObjective => vehicles.iter().all(|vehicle| {
                vehicle.cost_time_multiplier() > 0.0
                    || vehicle.cost_distance_multiplier() > 0.0
                    || vehicle.cost_value_multiplier() > 0.0
                    || vehicle.duration().is_some()
            }),
            Assertion::VehiclesNoZeroDuration => vehicles
                .iter()
                .all(|vehicle| vehicle.duration().is_none_or(|duration| !duration.is_zero())),
            Assertion::NoShipments => problem.shipments().is_empty(),
            Assertion::NoAlternativeActivities => problem
                .services()
                .iter()
                .all(|service| service.has_single_activity()),
            Assertion::NoInitialRoutes => problem.routes().is_empty(),
            Assertion::FirstSolutionStrategyIsValid => {
                let strategies = &problem.configuration().preprocessing.first_solution_strategy;
                match strategies.first() {
                    None => true,
                    Some(FirstSolutionStrategy::SelfSelection) => strategies.len() == 1,
                    Some(_) => !strategies.contains(&FirstSolutionStrategy::SelfSelection),
                }
            }
            Assertion::HomogeneousCosts => vehicles.windows(2).all(|pair| {
                pair[0].cost_time_multiplier() == pair[1].cost_time_multiplier()
                    && pair[0].cost_distance_multiplier() == pair[1].cost_distance_multiplier()
                    && pair[0].cost_value_multiplier() == pair[1].cost_value_multiplier()
            }),
            Assertion::NoCostFixed => vehicles.iter().all(|vehicle| vehicle.cost_fixed() == 0.0),
            Assertion::SingleDimension => vehicles.iter().all(|vehicle| {
                !(vehicle.cost_time_multiplier() > 0.0 && vehicle.cost_distance_multiplier() > 0.0)
            }),
            Assertion::MatricesOnlyOne => problem.matrices().len() <= 1,
            Assertion::NoRelations => problem.relations().is_empty(),
            Assertion::VehiclesNoDurationLimit => {
                vehicles.iter().all(|vehicle| vehicle.duration().is_none())
            }
            Assertion::NoFirstSolutionStrategy => {
                let strategies = &problem.configuration().preprocessing.first_solution_strategy;
                strategies.is_empty() || strategies == &[FirstSolutionStrategy::SelfSelection]
            }
        }
    }
}

/// Assertions every solver requires.
pub const COMMON_ASSERTIONS: [Assertion; 2] = [
    Assertion::MatricesVehiclesAndPointsDefinition,
    Assertion::PointsSameDefinition,
];

/// Fails on the first assertion the problem violates.
pub fn check(
    problem: &VehicleRoutingProblem,
    solver: &'static str,
    assertions: &[Assertion],
) -> Result<(), SolveError> {
    match COMMON_ASSERTIONS
        .iter()
        .chain(assertions)
        .find(|assertion| !assertion.holds(problem))
    {
        Some(assertion) => Err(SolveError::Assertion {
            solver,
            assertion: assertion.name(),
        }),
        None => Ok(()),
    }
}
