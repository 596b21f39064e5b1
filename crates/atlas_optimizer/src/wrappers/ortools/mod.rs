pub mod decode;
pub mod encode;
pub mod proto;

use std::path::Path;

use prost::Message;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solution::solution::Solution,
};

use super::{
    SolverWrapper,
    assertions::Assertion,
    command_line::CommandLine,
    error::{DecodeError, SolveError},
    settings::SolverSettings,
};

const ASSERTIONS: [Assertion; 5] = [
    Assertion::SquareMatrix,
    Assertion::VehiclesObjective,
    Assertion::VehiclesNoZeroDuration,
    Assertion::NoShipments,
    Assertion::FirstSolutionStrategyIsValid,
];

/// The or-tools solver, fed with protobuf files.
pub struct OrtoolsWrapper {
    settings: SolverSettings,
}

impl OrtoolsWrapper {
    pub fn new(settings: SolverSettings) -> Self {
        OrtoolsWrapper { settings }
    }
}

impl SolverWrapper for OrtoolsWrapper {
    type Encoded = ();

    const NAME: &'static str = "ortools";

    fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    fn executable(&self) -> &Path {
        &self.settings.ortools_exec
    }

    fn assertions(&self) -> &'static [Assertion] {
        &ASSERTIONS
    }

    fn trivial_solution(&self, problem: &VehicleRoutingProblem) -> Option<Solution> {
        (problem.vehicles().is_empty() || problem.services().is_empty())
            .then(|| Solution::empty(problem, Self::NAME))
    }

    fn encode(&self, problem: &VehicleRoutingProblem) -> Result<(Vec<u8>, ()), SolveError> {
        let message = encode::encode_problem(problem)?;
        Ok((message.encode_to_vec(), ()))
    }

    fn command_line(
        &self,
        problem: &VehicleRoutingProblem,
        input: &Path,
        output: &Path,
    ) -> CommandLine {
        let configuration = problem.configuration();
        let preprocessing = &configuration.preprocessing;
        let resolution = &configuration.resolution;

        let mut command_line = CommandLine::default();
        command_line
            .option(
                "-time_limit_in_ms",
                resolution
                    .duration
                    .or(self.settings.default_duration)
                    .map(|duration| duration.as_millis()),
            )
            .flag("-nearby", preprocessing.prefer_short_segment)
            .option(
                "-neighbourhood",
                preprocessing
                    .neighbourhood_size
                    .filter(|_| !resolution.evaluate_only),
            )
            .option(
                "-no_solution_improvement_limit",
                resolution
                    .iterations_without_improvement
                    .or(self.settings.default_iterations_without_improvement),
            )
            .option(
                "-minimum_duration",
                resolution
                    .minimum_duration
                    .or(resolution.initial_time_out)
                    .map(|duration| duration.as_millis()),
            )
            .option(
                "-time_out_multiplier",
                resolution
                    .time_out_multiplier
                    .or(self.settings.default_time_out_multiplier),
            )
            .option(
                "-init_duration",
                resolution.init_duration.map(|duration| duration.as_millis()),
            )
            .option(
                "-vehicle_limit",
                resolution
                    .vehicle_limit
                    .filter(|limit| *limit < problem.vehicles().len()),
            )
            .option(
                "-solver_parameter",
                preprocessing
                    .first_solution_strategy
                    .first()
                    .and_then(|strategy| strategy.code()),
            )
            .flag(
                "-only_first_solution",
                resolution.evaluate_only || resolution.batch_heuristic,
            )
            .flag(
                "-intermediate_solutions",
                configuration.restitution.intermediate_solutions,
            )
            .path("-instance_file", input)
            .path("-solution_file", output);
        command_line
    }

    fn decode(
        &self,
        problem: &VehicleRoutingProblem,
        _encoded: &(),
        payload: &[u8],
    ) -> Result<Solution, DecodeError> {
        decode::decode_result(problem, payload)
    }
}
