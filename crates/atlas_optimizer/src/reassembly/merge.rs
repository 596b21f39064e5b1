use fxhash::FxHashSet;
use tracing::warn;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solution::{solution::Solution, step::Step},
};

/// Folds independently solved parts into one solution.
///
/// Costs, elapsed times and iterations add up, routes and unassigned entries
/// are concatenated in part order.
pub fn merge_solutions(solutions: impl IntoIterator<Item = Solution>) -> Solution {
    let mut merged: Solution = solutions.into_iter().sum();
    merged.compute_total_details();
    merged
}

/// Reports services of `problem` neither routed nor unassigned in `solution`
/// as unassigned, and drops entries of services served twice.
pub fn reconcile(problem: &VehicleRoutingProblem, solution: &mut Solution) {
    let mut seen: FxHashSet<String> = FxHashSet::default();

    for route in &mut solution.routes {
        route.steps.retain(|step| match step.service_id() {
            Some(service_id) => seen.insert(service_id.to_owned()),
            None => true,
        });
    }
    solution.unassigned.retain(|step| match step.service_id() {
        Some(service_id) => seen.insert(service_id.to_owned()),
        None => true,
    });

    for service in problem.services() {
        if !seen.contains(service.id()) {
            warn!(service = service.id(), "service missing from merged solution");
            solution.unassigned.push(Step::unassigned_service(service.id()));
        }
    }
}
