use tracing::{info, instrument, warn};

use crate::{
    partition::{
        self, SplitResult, debug::ClusterDebug, density, kmeans_split::should_split,
        sub_work_item,
    },
    problem::{
        configuration::Partition, vehicle_routing_problem::VehicleRoutingProblem,
        work_item::WorkItem,
    },
    reassembly::{density_repair, merge},
    solution::progress::ProgressCallback,
    wrappers::{Solver, SolveOutcome, error::SolveError, kill_handle::KillHandle},
};

/// Outcome of a job and the cluster hulls collected while splitting it.
#[derive(Debug)]
pub struct PipelineOutput {
    pub outcome: SolveOutcome,
    pub debug: ClusterDebug,
}

/// Density clustering parameters, when the work item asks for it and is
/// large enough.
fn density_parameters(work_item: &WorkItem) -> Option<(f64, usize)> {
    let preprocessing = &work_item.problem().configuration().preprocessing;
    match (&preprocessing.partition, preprocessing.max_split_size) {
        (Some(Partition::Density { epsilon, min_points }), Some(max_split_size))
            if should_split(work_item, max_split_size) =>
        {
            Some((*epsilon, *min_points))
        }
        _ => None,
    }
}

/// Splits a problem into the work items that would be solved.
///
/// A density partition yields its clusters, and the noise as one more work
/// item over the whole fleet.
#[instrument(skip_all, level = "debug", fields(problem = problem.id()))]
pub fn split(problem: VehicleRoutingProblem) -> SplitResult {
    let work_item = WorkItem::new(problem);

    let Some((epsilon, min_points)) = density_parameters(&work_item) else {
        return partition::split_work_items(vec![work_item]);
    };

    match density::density_split(&work_item, epsilon, min_points) {
        Ok(split) => {
            let mut work_items = split.clusters;
            if !split.noise.is_empty() {
                let noise: Vec<&str> = split.noise.iter().map(String::as_str).collect();
                let mut noise_item = sub_work_item(&work_item, work_items.len(), &noise, None);
                noise_item
                    .problem_mut()
                    .configuration_mut()
                    .preprocessing
                    .clear_partitioning();
                work_items.push(noise_item);
            }
            SplitResult {
                work_items,
                debug: split.debug,
            }
        }
        Err(error) => {
            warn!(%error, "cannot cluster problem by density, keeping it whole");
            SplitResult::unsplit(work_item)
        }
    }
}

/// Runs the split, solve and merge steps of one job with a single solver.
pub struct Optimizer {
    solver: Solver,
}

impl Optimizer {
    pub fn new(solver: Solver) -> Self {
        Optimizer { solver }
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Solves `problem`, one work item after the other.
    ///
    /// A kill observed while solving any part stops the job and discards the
    /// parts already solved.
    #[instrument(skip_all, level = "debug", fields(problem = problem.id(), solver = self.solver.name()))]
    pub fn solve(
        &self,
        problem: VehicleRoutingProblem,
        kill: &KillHandle,
        progress: &mut ProgressCallback<'_>,
    ) -> Result<PipelineOutput, SolveError> {
        self.solver.check(&problem)?;

        let SplitResult {
            work_items,
            mut debug,
        } = partition::split_work_items(vec![WorkItem::new(problem)]);
        info!(parts = work_items.len(), "solving problem");

        let mut solutions = Vec::with_capacity(work_items.len());
        for work_item in &work_items {
            let outcome = match density_parameters(work_item) {
                Some((epsilon, min_points)) => {
                    self.solve_density(work_item, epsilon, min_points, &mut debug, kill, progress)?
                }
                None => self.solver.solve(work_item.problem(), kill, progress)?,
            };

            match outcome {
                SolveOutcome::Completed(solution) => solutions.push(solution),
                SolveOutcome::Killed => {
                    info!("job killed");
                    return Ok(PipelineOutput {
                        outcome: SolveOutcome::Killed,
                        debug,
                    });
                }
            }
        }

        let solution = merge::merge_solutions(solutions);
        info!(
            cost = solution.cost,
            routes = solution.non_empty_routes_count(),
            unassigned = solution.unassigned.len(),
            "problem solved"
        );
        Ok(PipelineOutput {
            outcome: SolveOutcome::Completed(solution),
            debug,
        })
    }

    fn solve_density(
        &self,
        work_item: &WorkItem,
        epsilon: f64,
        min_points: usize,
        debug: &mut ClusterDebug,
        kill: &KillHandle,
        progress: &mut ProgressCallback<'_>,
    ) -> Result<SolveOutcome, SolveError> {
        match density::density_split(work_item, epsilon, min_points) {
            Ok(split) => {
                debug.extend(split.debug);
                density_repair::repair(
                    work_item,
                    &split.clusters,
                    &split.noise,
                    &self.solver,
                    kill,
                    progress,
                )
            }
            Err(error) => {
                warn!(%error, "cannot cluster problem by density, solving it whole");
                self.solver.solve(work_item.problem(), kill, progress)
            }
        }
    }
}
