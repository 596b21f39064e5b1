pub mod assertions;
pub mod command_line;
pub mod error;
pub mod kill_handle;
pub mod ortools;
pub mod process;
pub mod process_tree;
pub mod settings;
pub mod stream;
pub mod vroom;

use std::{fmt, fs, io::Write, path::Path, str::FromStr, time::Instant};

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, instrument, warn};

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solution::{progress::ProgressCallback, solution::Solution},
};

use self::{
    assertions::Assertion,
    command_line::CommandLine,
    error::{DecodeError, SolveError},
    kill_handle::KillHandle,
    ortools::OrtoolsWrapper,
    process::Termination,
    settings::SolverSettings,
    stream::{NO_SOLUTION_MARKER, OutputTracker},
    vroom::VroomWrapper,
};

/// Result of a solver run that was not a failure.
#[derive(Debug)]
pub enum SolveOutcome {
    Completed(Solution),
    Killed,
}

/// An external solver driven through exchange files.
pub trait SolverWrapper {
    /// What the encoder remembers to read the result back.
    type Encoded;

    const NAME: &'static str;

    fn settings(&self) -> &SolverSettings;

    fn executable(&self) -> &Path;

    /// Solver specific assertions, on top of the common ones.
    fn assertions(&self) -> &'static [Assertion];

    /// Solution of a problem not worth starting the solver for.
    fn trivial_solution(&self, _problem: &VehicleRoutingProblem) -> Option<Solution> {
        None
    }

    fn encode(
        &self,
        problem: &VehicleRoutingProblem,
    ) -> Result<(Vec<u8>, Self::Encoded), SolveError>;

    fn command_line(
        &self,
        problem: &VehicleRoutingProblem,
        input: &Path,
        output: &Path,
    ) -> CommandLine;

    fn decode(
        &self,
        problem: &VehicleRoutingProblem,
        encoded: &Self::Encoded,
        payload: &[u8],
    ) -> Result<Solution, DecodeError>;
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    #[default]
    Ortools,
    Vroom,
}

impl FromStr for SolverKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ortools" | "or-tools" => Ok(SolverKind::Ortools),
            "vroom" => Ok(SolverKind::Vroom),
            _ => Err(format!("unknown solver {value}")),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Ortools => write!(f, "{}", OrtoolsWrapper::NAME),
            SolverKind::Vroom => write!(f, "{}", VroomWrapper::NAME),
        }
    }
}

/// The solver a job runs with, chosen once per job.
pub enum Solver {
    Ortools(OrtoolsWrapper),
    Vroom(VroomWrapper),
}

impl Solver {
    pub fn new(kind: SolverKind, settings: SolverSettings) -> Self {
        match kind {
            SolverKind::Ortools => Solver::Ortools(OrtoolsWrapper::new(settings)),
            SolverKind::Vroom => Solver::Vroom(VroomWrapper::new(settings)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Solver::Ortools(_) => OrtoolsWrapper::NAME,
            Solver::Vroom(_) => VroomWrapper::NAME,
        }
    }

    /// Checks the solver assertions without running anything.
    pub fn check(&self, problem: &VehicleRoutingProblem) -> Result<(), SolveError> {
        match self {
            Solver::Ortools(wrapper) => {
                assertions::check(problem, OrtoolsWrapper::NAME, wrapper.assertions())
            }
            Solver::Vroom(wrapper) => {
                assertions::check(problem, VroomWrapper::NAME, wrapper.assertions())
            }
        }
    }

    pub fn solve(
        &self,
        problem: &VehicleRoutingProblem,
        kill: &KillHandle,
        progress: &mut ProgressCallback<'_>,
    ) -> Result<SolveOutcome, SolveError> {
        match self {
            Solver::Ortools(wrapper) => run(wrapper, problem, kill, progress),
            Solver::Vroom(wrapper) => run(wrapper, problem, kill, progress),
        }
    }
}

fn exchange_file(settings: &SolverSettings, prefix: &str) -> Result<NamedTempFile, SolveError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix);
    let file = match &settings.tmp_dir {
        Some(tmp_dir) => builder.tempfile_in(tmp_dir)?,
        None => builder.tempfile()?,
    };
    Ok(file)
}

/// Runs one problem through a solver process.
///
/// Both exchange files are removed when they go out of scope, whatever the
/// outcome.
#[instrument(skip_all, level = "debug", fields(solver = W::NAME, problem = problem.id()))]
pub fn run<W: SolverWrapper>(
    wrapper: &W,
    problem: &VehicleRoutingProblem,
    kill: &KillHandle,
    progress: &mut ProgressCallback<'_>,
) -> Result<SolveOutcome, SolveError> {
    assertions::check(problem, W::NAME, wrapper.assertions())?;

    if kill.is_killed() {
        return Ok(SolveOutcome::Killed);
    }
    if let Some(solution) = wrapper.trivial_solution(problem) {
        return Ok(SolveOutcome::Completed(solution));
    }

    let started = Instant::now();
    let (payload, encoded) = wrapper.encode(problem)?;

    let mut input = exchange_file(wrapper.settings(), &format!("optimize-{}-input", W::NAME))?;
    input.write_all(&payload)?;
    input.flush()?;
    let output = exchange_file(wrapper.settings(), &format!("optimize-{}-output", W::NAME))?;

    let command_line = wrapper.command_line(problem, input.path(), output.path());
    let intermediate_solutions = problem.configuration().restitution.intermediate_solutions;
    info!(
        services = problem.services().len(),
        vehicles = problem.vehicles().len(),
        "running {}",
        W::NAME
    );

    let read_output = || -> Result<Solution, DecodeError> {
        let payload = fs::read(output.path())?;
        wrapper.decode(problem, &encoded, &payload)
    };

    let mut tracker = OutputTracker::default();
    let mut latest: Option<Solution> = None;
    let termination = process::run_streaming(
        command_line.command(wrapper.executable()),
        kill,
        |line| {
            let (tokens, update) = tracker.observe(line);
            let Some(mut update) = update else {
                return;
            };

            if tokens.wants_partial_solution(intermediate_solutions) {
                match read_output() {
                    Ok(solution) if !solution.routes.is_empty() => latest = Some(solution),
                    Ok(_) => {}
                    Err(error) => warn!(%error, "cannot decode intermediate solution"),
                }
                update.solution = latest.clone();
            }
            progress(&update);
        },
    )?;

    let last_line = match termination {
        Termination::Killed => {
            info!("{} killed", W::NAME);
            return Ok(SolveOutcome::Killed);
        }
        Termination::Exited { last_line } => last_line,
    };

    let mut solution = if last_line.as_deref().map(str::trim) == Some(NO_SOLUTION_MARKER) {
        warn!("{} found no solution", W::NAME);
        Solution::no_solution(problem, W::NAME)
    } else {
        let solution = read_output()?;
        match latest {
            Some(latest) if solution.routes.is_empty() => latest,
            _ => solution,
        }
    };

    if solution.iterations.is_none() {
        solution.iterations = tracker.iterations();
    }
    if solution.elapsed.is_zero() {
        solution.elapsed = SignedDuration::try_from(started.elapsed()).unwrap_or_default();
    }
    solution.compute_total_details();

    info!(cost = solution.cost, elapsed = %solution.elapsed, "{} done", W::NAME);
    Ok(SolveOutcome::Completed(solution))
}
