use fxhash::{FxHashMap, FxHashSet};
use jiff::SignedDuration;
use tracing::{debug, info, instrument};

use crate::{
    partition::sub_work_item,
    problem::work_item::WorkItem,
    solution::{progress::ProgressCallback, route::Route},
    wrappers::{Solver, SolveOutcome, error::SolveError, kill_handle::KillHandle},
};

use super::{
    cumulated::{self, Cumulated},
    merge,
};

/// Solves the clusters of a density partition and stitches them into routes
/// over the whole fleet.
///
/// Each cluster is solved alone and its route replaced by one synthetic
/// service. A second pass plans the synthetic services with the noise and
/// every service the clusters left out. Each route of the second pass is then
/// expanded and solved again for its vehicle.
#[instrument(skip_all, level = "debug", fields(problem = work_item.problem().id()))]
pub fn repair(
    work_item: &WorkItem,
    clusters: &[WorkItem],
    noise: &[String],
    solver: &Solver,
    kill: &KillHandle,
    progress: &mut ProgressCallback<'_>,
) -> Result<SolveOutcome, SolveError> {
    let problem = work_item.problem();
    let mut elapsed = SignedDuration::ZERO;

    let mut cumulated: FxHashMap<String, Cumulated> = FxHashMap::default();
    let mut second_pass_ids: Vec<String> = noise.to_vec();
    for (index, cluster) in clusters.iter().enumerate() {
        let solution = match solver.solve(cluster.problem(), kill, progress)? {
            SolveOutcome::Completed(solution) => solution,
            SolveOutcome::Killed => return Ok(SolveOutcome::Killed),
        };
        elapsed += solution.elapsed;

        second_pass_ids.extend(solution.unassigned_service_ids().map(str::to_owned));
        if let Some(route) = solution.routes.iter().find(|route| route.has_services()) {
            if let Some(synthetic) = cumulated::cumulate(cluster.problem(), index, route) {
                second_pass_ids.push(synthetic.service.id().to_owned());
                cumulated.insert(synthetic.service.id().to_owned(), synthetic);
            }
        }
    }
    debug!(
        synthetic = cumulated.len(),
        services = second_pass_ids.len(),
        "second pass"
    );

    let mut unformed = problem.clone();
    for synthetic in second_pass_ids.iter().filter_map(|id| cumulated.get(id)) {
        unformed.push_service(synthetic.service.clone());
    }
    let kept: FxHashSet<&str> = second_pass_ids.iter().map(String::as_str).collect();
    let mut second_pass = unformed.sub_problem(format!("{}_combined", problem.id()), &kept, None);
    second_pass
        .configuration_mut()
        .preprocessing
        .clear_partitioning();

    let combined = match solver.solve(&second_pass, kill, progress)? {
        SolveOutcome::Completed(solution) => solution,
        SolveOutcome::Killed => return Ok(SolveOutcome::Killed),
    };
    elapsed += combined.elapsed;

    let mut solutions = Vec::new();
    let mut used_vehicles: FxHashSet<&str> = FxHashSet::default();
    for (index, route) in combined.routes.iter().enumerate() {
        let service_ids = cumulated::expand(route.service_ids(), &cumulated);
        if service_ids.is_empty() {
            continue;
        }

        let mut final_route = sub_work_item(
            work_item,
            index,
            &service_ids,
            Some(&[route.vehicle_id.as_str()][..]),
        );
        final_route
            .problem_mut()
            .configuration_mut()
            .preprocessing
            .clear_partitioning();

        match solver.solve(final_route.problem(), kill, progress)? {
            SolveOutcome::Completed(solution) => solutions.push(solution),
            SolveOutcome::Killed => return Ok(SolveOutcome::Killed),
        }
        used_vehicles.insert(route.vehicle_id.as_str());
    }

    let mut solution = merge::merge_solutions(solutions);
    solution.elapsed += elapsed;
    solution
        .unassigned
        .extend(cumulated::expand_unassigned(&combined.unassigned, &cumulated));
    for vehicle in problem.vehicles() {
        if !used_vehicles.contains(vehicle.id()) {
            solution.routes.push(Route::new(vehicle.id()));
        }
    }
    if solution.solvers.is_empty() {
        solution.solvers.push(solver.name().to_owned());
    }
    merge::reconcile(problem, &mut solution);
    solution.compute_total_details();

    info!(
        clusters = clusters.len(),
        routes = solution.non_empty_routes_count(),
        unassigned = solution.unassigned.len(),
        "density repair done"
    );
    Ok(SolveOutcome::Completed(solution))
}
