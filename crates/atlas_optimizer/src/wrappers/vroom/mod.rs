pub mod decode;
pub mod encode;
pub mod types;

use std::path::Path;

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

use self::encode::VroomEncoded;

const ASSERTIONS: [Assertion; 9] = [
    Assertion::NoAlternativeActivities,
    Assertion::NoInitialRoutes,
    Assertion::HomogeneousCosts,
    Assertion::NoCostFixed,
    Assertion::SingleDimension,
    Assertion::MatricesOnlyOne,
    Assertion::NoRelations,
    Assertion::VehiclesNoDurationLimit,
    Assertion::NoFirstSolutionStrategy,
];

/// The vroom solver, fed with JSON files.
pub struct VroomWrapper {
    settings: SolverSettings,
}

impl VroomWrapper {
    pub fn new(settings: SolverSettings) -> Self {
        VroomWrapper { settings }
    }
}

impl SolverWrapper for VroomWrapper {
    type Encoded = VroomEncoded;

    const NAME: &'static str = "vroom";

    fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    fn executable(&self) -> &Path {
        &self.settings.vroom_exec
    }

    fn assertions(&self) -> &'static [Assertion] {
        &ASSERTIONS
    }

    fn trivial_solution(&self, problem: &VehicleRoutingProblem) -> Option<Solution> {
        let nothing_to_plan = problem.services().is_empty() && problem.shipments().is_empty();
        (problem.points().is_empty() || problem.vehicles().is_empty() || nothing_to_plan)
            .then(|| Solution::empty(problem, Self::NAME))
    }

    fn encode(
        &self,
        problem: &VehicleRoutingProblem,
    ) -> Result<(Vec<u8>, VroomEncoded), SolveError> {
        let (document, encoded) = encode::encode_problem(problem)?;
        let payload =
            serde_json::to_vec(&document).map_err(|error| SolveError::Encode(error.to_string()))?;
        Ok((payload, encoded))
    }

    fn command_line(
        &self,
        problem: &VehicleRoutingProblem,
        input: &Path,
        output: &Path,
    ) -> CommandLine {
        let mut command_line = CommandLine::default();
        command_line
            .path("-i", input)
            .path("-o", output)
            .option(
                "-l",
                problem
                    .configuration()
                    .resolution
                    .duration
                    .or(self.settings.default_duration)
                    .map(|duration| duration.as_secs_f64()),
            );
        command_line
    }

    fn decode(
        &self,
        problem: &VehicleRoutingProblem,
        encoded: &VroomEncoded,
        payload: &[u8],
    ) -> Result<Solution, DecodeError> {
        decode::decode_solution(problem, encoded, payload)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use jiff::SignedDuration;

    use crate::{
        problem::service::{Activity, ServiceBuilder},
        test_utils::TestProblem,
        wrappers::assertions,
    };

    use super::*;

    #[test]
    fn test_command_line() {
        let mut problem = TestProblem::grid(2, 1);
        let wrapper = VroomWrapper::new(SolverSettings::default());

        let command_line =
            wrapper.command_line(&problem, Path::new("/tmp/in"), Path::new("/tmp/out"));
        assert_eq!(command_line.arguments().len(), 4);

        problem.configuration_mut().resolution.duration = Some(SignedDuration::from_millis(2500));
        let command_line =
            wrapper.command_line(&problem, Path::new("/tmp/in"), Path::new("/tmp/out"));
        let expected: Vec<OsString> = ["-i", "/tmp/in", "-o", "/tmp/out", "-l", "2.5"]
            .into_iter()
            .map(OsString::from)
            .collect();
        assert_eq!(command_line.arguments(), expected.as_slice());
    }

    #[test]
    fn test_trivial_solution_without_services() {
        let problem = TestProblem::grid(0, 2);
        let wrapper = VroomWrapper::new(SolverSettings::default());

        let solution = wrapper.trivial_solution(&problem).unwrap();

        assert_eq!(solution.cost, 0.0);
        assert_eq!(solution.routes.len(), 2);
        assert_eq!(solution.solvers, vec!["vroom"]);
        assert!(wrapper.trivial_solution(&TestProblem::grid(2, 1)).is_none());
    }

    #[test]
    fn test_encode_produces_json() {
        let problem = TestProblem::grid(3, 1);
        let wrapper = VroomWrapper::new(SolverSettings::default());

        let (payload, encoded) = wrapper.encode(&problem).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(json["jobs"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["matrix"].as_array().map(Vec::len), Some(4));
        assert_eq!(encoded.units, vec!["kg"]);
    }

    #[test]
    fn test_rejects_alternative_activities() {
        let mut problem = TestProblem::grid(2, 1);
        let wrapper = VroomWrapper::new(SolverSettings::default());
        assert!(assertions::check(&problem, VroomWrapper::NAME, wrapper.assertions()).is_ok());

        let mut builder = ServiceBuilder::default();
        builder
            .set_id("either")
            .add_alternative_activity(Activity::new("p0"))
            .add_alternative_activity(Activity::new("p1"));
        problem.push_service(builder.build());

        let error =
            assertions::check(&problem, VroomWrapper::NAME, wrapper.assertions()).unwrap_err();
        assert!(matches!(
            error,
            SolveError::Assertion {
                solver: "vroom",
                assertion: "no_alternative_activities",
            }
        ));
    }
}
