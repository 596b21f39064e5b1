use atlas_optimizer::{
    pipeline::{Optimizer, PipelineOutput},
    problem::configuration::Partition,
    solution::{progress::Progress, solution::Solution},
    wrappers::{Solver, SolveOutcome, SolverKind, kill_handle::KillHandle},
};
use fxhash::FxHashSet;

use crate::test_utils::FakeSolver;

mod test_utils;

/// Routes every job of its input on the first vehicle, in input order.
const ROUTE_EVERYTHING: &str = r#"jobs=$(grep -o '"location_index"' "$2" | wc -l)
steps=""
i=0
while [ "$i" -lt "$jobs" ]; do
  [ -n "$steps" ] && steps="$steps,"
  steps="$steps{\"type\":\"job\",\"id\":$i,\"arrival\":0,\"service\":300,\"load\":[0]}"
  i=$((i + 1))
done
printf '{"summary":{"cost":%s},"routes":[{"vehicle":0,"steps":[%s]}]}' "$jobs" "$steps" > "$4"
echo done"#;

fn completed(output: PipelineOutput) -> Solution {
    match output.outcome {
        SolveOutcome::Completed(solution) => solution,
        SolveOutcome::Killed => panic!("expected a solution"),
    }
}

#[test]
fn test_density_repair_routes_every_service() {
    let fake = FakeSolver::new(ROUTE_EVERYTHING);
    let mut locations: Vec<(f64, f64)> =
        (0..6).map(|i| (48.0 + 0.0005 * i as f64, 2.0)).collect();
    locations.push((43.0, 5.0));
    let mut problem = test_utils::create_problem(&locations, 2);
    let preprocessing = &mut problem.configuration_mut().preprocessing;
    preprocessing.max_split_size = Some(3);
    preprocessing.partition = Some(Partition::Density {
        epsilon: 500.0,
        min_points: 3,
    });

    let optimizer = Optimizer::new(Solver::new(SolverKind::Vroom, fake.settings()));
    let output = optimizer
        .solve(problem, &KillHandle::new(), &mut |_: &Progress| {})
        .unwrap();

    assert!(!output.debug.is_empty());
    let solution = completed(output);
    assert!(solution.unassigned.is_empty());
    assert_eq!(solution.non_empty_routes_count(), 1);

    let route = solution
        .routes
        .iter()
        .find(|route| route.has_services())
        .unwrap();
    assert_eq!(route.vehicle_id, "v0");
    let routed: FxHashSet<&str> = route.service_ids().collect();
    let expected: FxHashSet<&str> = ["s0", "s1", "s2", "s3", "s4", "s5", "s6"]
        .into_iter()
        .collect();
    assert_eq!(routed, expected);
    assert_eq!(route.service_ids().count(), 7);
    assert!(solution.routes.iter().any(|route| route.vehicle_id == "v1"));
    assert!(fake.leftover_files().is_empty());
}

#[test]
fn test_kmeans_split_keeps_every_service() {
    let fake = FakeSolver::new(ROUTE_EVERYTHING);
    let mut problem = test_utils::create_line_problem(12, 4);
    let preprocessing = &mut problem.configuration_mut().preprocessing;
    preprocessing.max_split_size = Some(4);

    let optimizer = Optimizer::new(Solver::new(SolverKind::Vroom, fake.settings()));
    let solution = completed(
        optimizer
            .solve(problem, &KillHandle::new(), &mut |_: &Progress| {})
            .unwrap(),
    );

    let mut routed: Vec<&str> = solution.assigned_service_ids().collect();
    routed.sort_unstable();
    let mut expected: Vec<String> = (0..12).map(|i| format!("s{i}")).collect();
    expected.sort_unstable();
    assert_eq!(routed, expected);
    assert!(solution.unassigned.is_empty());
    assert!(solution.cost > 0.0);
}
