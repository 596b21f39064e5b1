use super::vehicle_routing_problem::VehicleRoutingProblem;

/// One unit of solving work: a problem and the size it accounts for.
#[derive(Debug, Clone)]
pub struct WorkItem {
    problem: VehicleRoutingProblem,
    problem_size: usize,
    depth: usize,
}

impl WorkItem {
    pub fn new(problem: VehicleRoutingProblem) -> Self {
        let problem_size = problem.size();
        WorkItem {
            problem,
            problem_size,
            depth: 0,
        }
    }

    /// Work item produced by splitting a parent at `depth - 1`.
    pub fn split_from(problem: VehicleRoutingProblem, depth: usize) -> Self {
        let problem_size = problem.size();
        WorkItem {
            problem,
            problem_size,
            depth,
        }
    }

    pub fn problem(&self) -> &VehicleRoutingProblem {
        &self.problem
    }

    pub fn problem_mut(&mut self) -> &mut VehicleRoutingProblem {
        &mut self.problem
    }

    pub fn into_problem(self) -> VehicleRoutingProblem {
        self.problem
    }

    pub fn problem_size(&self) -> usize {
        self.problem_size
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
