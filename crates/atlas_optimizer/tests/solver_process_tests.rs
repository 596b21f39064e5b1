use std::{
    thread,
    time::{Duration, Instant},
};

use jiff::SignedDuration;

use atlas_optimizer::{
    solution::{progress::Progress, solution::MAX_COST},
    wrappers::{Solver, SolveOutcome, SolverKind, error::SolveError, kill_handle::KillHandle},
};

use crate::test_utils::FakeSolver;

mod test_utils;

fn wait_for_pids(kill: &KillHandle) -> Vec<u32> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let pids = kill.tracked_pids();
        if !pids.is_empty() || Instant::now() > deadline {
            return pids;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_no_solution_marker() {
    let fake = FakeSolver::new("echo 'Iteration : 1 Cost : 12'\necho 'No solution found...'");
    let solver = Solver::new(SolverKind::Ortools, fake.settings());
    let problem = test_utils::create_line_problem(3, 1);

    let outcome = solver
        .solve(&problem, &KillHandle::new(), &mut |_: &Progress| {})
        .unwrap();

    let SolveOutcome::Completed(solution) = outcome else {
        panic!("expected a solution");
    };
    assert_eq!(solution.cost, MAX_COST);
    assert!(solution.routes.iter().all(|route| route.steps.is_empty()));
    assert_eq!(solution.unassigned.len(), 3);
    assert!(fake.leftover_files().is_empty());
}

/// Writes a partial result, then garbage, then the final result, reporting an
/// iteration after each of the first two writes.
const STREAMING_SOLVER: &str = r#"job() { printf '{"type":"job","id":%s,"arrival":0,"service":300,"load":[0]}' "$1"; }
printf '{"summary":{"cost":40},"routes":[{"vehicle":0,"steps":[%s]}]}' "$(job 0)" > "$4"
echo 'Iteration : 1 Cost : 40 Time : 125'
sleep 0.5
printf 'not json' > "$4"
echo 'Iteration : 2 Cost : 30 Time : 250'
sleep 0.5
printf '{"summary":{"cost":25},"routes":[{"vehicle":0,"steps":[%s,%s]}]}' "$(job 0)" "$(job 1)" > "$4"
echo 'Final Iteration : 3 Cost : 25 Time : 500'"#;

#[test]
fn test_streams_intermediate_solutions() {
    let fake = FakeSolver::new(STREAMING_SOLVER);
    let solver = Solver::new(SolverKind::Vroom, fake.settings());
    let mut problem = test_utils::create_line_problem(2, 1);
    problem
        .configuration_mut()
        .restitution
        .intermediate_solutions = true;

    let mut updates: Vec<Progress> = Vec::new();
    let outcome = solver
        .solve(&problem, &KillHandle::new(), &mut |progress: &Progress| {
            updates.push(progress.clone())
        })
        .unwrap();

    let reported: Vec<(Option<u64>, Option<f64>, Option<SignedDuration>)> = updates
        .iter()
        .map(|update| (update.iterations, update.cost, update.elapsed))
        .collect();
    assert_eq!(
        reported,
        vec![
            (Some(1), Some(40.0), Some(SignedDuration::from_millis(125))),
            (Some(2), Some(30.0), Some(SignedDuration::from_millis(250))),
            (Some(3), Some(25.0), Some(SignedDuration::from_millis(500))),
        ]
    );

    let partial = updates[0].solution.as_ref().unwrap();
    assert_eq!(partial.cost, 40.0);
    assert_eq!(partial.routes[0].service_ids().collect::<Vec<_>>(), vec!["s0"]);

    // The unreadable write keeps the previous snapshot.
    let kept = updates[1].solution.as_ref().unwrap();
    assert_eq!(kept.cost, 40.0);
    assert!(updates[2].solution.is_none());

    let SolveOutcome::Completed(solution) = outcome else {
        panic!("expected a solution");
    };
    assert_eq!(solution.cost, 25.0);
    assert_eq!(
        solution.routes[0].service_ids().collect::<Vec<_>>(),
        vec!["s0", "s1"]
    );
    assert_eq!(solution.iterations, Some(3));
    assert!(fake.leftover_files().is_empty());
}

#[test]
fn test_kill_running_solver() {
    let fake = FakeSolver::new("exec sleep 30");
    let solver = Solver::new(SolverKind::Ortools, fake.settings());
    let problem = test_utils::create_line_problem(3, 1);
    let kill = KillHandle::new();

    let started = Instant::now();
    let (outcome, pids) = thread::scope(|scope| {
        let handle = scope.spawn(|| solver.solve(&problem, &kill, &mut |_: &Progress| {}));

        let pids = wait_for_pids(&kill);
        kill.kill();
        (handle.join().unwrap(), pids)
    });

    assert!(!pids.is_empty());
    assert!(matches!(outcome, Ok(SolveOutcome::Killed)));
    assert!(started.elapsed() < Duration::from_secs(20));
    assert!(kill.tracked_pids().is_empty());
    assert!(pids.iter().all(|pid| !test_utils::is_running(*pid)));
    assert!(fake.leftover_files().is_empty());
}

#[test]
fn test_kill_reaches_grandchildren() {
    let fake = FakeSolver::new("sleep 30 &\necho started\nwait");
    let solver = Solver::new(SolverKind::Vroom, fake.settings());
    let problem = test_utils::create_line_problem(2, 1);
    let kill = KillHandle::new();

    let started = Instant::now();
    let outcome = thread::scope(|scope| {
        let handle = scope.spawn(|| solver.solve(&problem, &kill, &mut |_: &Progress| {}));

        wait_for_pids(&kill);
        thread::sleep(Duration::from_millis(200));
        kill.kill();
        handle.join().unwrap()
    });

    assert!(matches!(outcome, Ok(SolveOutcome::Killed)));
    assert!(started.elapsed() < Duration::from_secs(20));
    assert!(kill.tracked_pids().is_empty());
}

#[test]
fn test_failing_solver() {
    let fake = FakeSolver::new("echo 'segfault somewhere' >&2\nexit 3");
    let solver = Solver::new(SolverKind::Ortools, fake.settings());
    let problem = test_utils::create_line_problem(2, 1);

    let result = solver.solve(&problem, &KillHandle::new(), &mut |_: &Progress| {});

    assert!(matches!(result, Err(SolveError::Unknown(_))));
    assert!(fake.leftover_files().is_empty());
}

#[test]
fn test_missing_executable() {
    let fake = FakeSolver::new("exit 0");
    let mut settings = fake.settings();
    settings.vroom_exec = fake.dir.path().join("missing");
    let solver = Solver::new(SolverKind::Vroom, settings);
    let problem = test_utils::create_line_problem(2, 1);

    let result = solver.solve(&problem, &KillHandle::new(), &mut |_: &Progress| {});

    assert!(matches!(result, Err(SolveError::ExecutableMissing(_))));
}

#[test]
fn test_kill_before_start_spawns_nothing() {
    let fake = FakeSolver::new("touch \"$(dirname \"$0\")/started\"");
    let solver = Solver::new(SolverKind::Ortools, fake.settings());
    let problem = test_utils::create_line_problem(2, 1);
    let kill = KillHandle::new();
    kill.kill();

    let outcome = solver
        .solve(&problem, &kill, &mut |_: &Progress| {})
        .unwrap();

    assert!(matches!(outcome, SolveOutcome::Killed));
    assert!(fake.leftover_files().is_empty());
}
