use std::{
    iter::Sum,
    ops::{Add, AddAssign},
};

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::{
    cost_details::CostDetails,
    route::{Route, RouteDetails},
    step::{Step, StepKind},
};

/// Cost reported when the solver found no solution at all.
pub const MAX_COST: f64 = ((1u64 << 62) - 1) as f64;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Solution {
    pub cost: f64,
    #[serde(default)]
    pub elapsed: SignedDuration,
    #[serde(default)]
    pub iterations: Option<u64>,
    #[serde(default)]
    pub solvers: Vec<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub unassigned: Vec<Step>,
    #[serde(default)]
    pub cost_details: CostDetails,
    #[serde(default)]
    pub details: RouteDetails,
}

impl Solution {
    /// One empty route per vehicle, every job unassigned.
    pub fn empty(problem: &VehicleRoutingProblem, solver: &str) -> Self {
        let mut unassigned: Vec<Step> = problem
            .services()
            .iter()
            .map(|service| Step::unassigned_service(service.id()))
            .collect();
        for shipment in problem.shipments() {
            unassigned.push(Step::new(
                StepKind::Pickup {
                    shipment_id: shipment.id().to_owned(),
                },
                None,
            ));
            unassigned.push(Step::new(
                StepKind::Delivery {
                    shipment_id: shipment.id().to_owned(),
                },
                None,
            ));
        }

        Solution {
            solvers: vec![solver.to_owned()],
            routes: problem
                .vehicles()
                .iter()
                .map(|vehicle| Route::new(vehicle.id()))
                .collect(),
            unassigned,
            ..Solution::default()
        }
    }

    /// Result of a solver reporting it could not find any solution.
    pub fn no_solution(problem: &VehicleRoutingProblem, solver: &str) -> Self {
        Solution {
            cost: MAX_COST,
            ..Solution::empty(problem, solver)
        }
    }

    pub fn is_no_solution(&self) -> bool {
        self.cost >= MAX_COST
    }

    /// Ids of the services planned in a route.
    pub fn assigned_service_ids(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().flat_map(|route| route.service_ids())
    }

    pub fn unassigned_service_ids(&self) -> impl Iterator<Item = &str> {
        self.unassigned.iter().filter_map(|step| step.service_id())
    }

    pub fn non_empty_routes_count(&self) -> usize {
        self.routes.iter().filter(|route| route.has_services()).count()
    }

    /// Sums each route aggregate into the solution when every route has it.
    pub fn compute_total_details(&mut self) {
        fn total<T: Add<Output = T> + Default>(
            routes: &[Route],
            f: impl Fn(&RouteDetails) -> Option<T>,
        ) -> Option<T> {
            routes
                .iter()
                .map(|route| f(&route.details))
                .try_fold(T::default(), |total, value| value.map(|value| total + value))
        }

        self.details = RouteDetails {
            start_time: None,
            end_time: None,
            total_time: total(&self.routes, |details| details.total_time),
            total_travel_time: total(&self.routes, |details| details.total_travel_time),
            total_distance: total(&self.routes, |details| details.total_distance),
            total_waiting_time: total(&self.routes, |details| details.total_waiting_time),
            total_travel_value: total(&self.routes, |details| details.total_travel_value),
        };
    }
}

impl AddAssign for Solution {
    fn add_assign(&mut self, other: Solution) {
        self.cost += other.cost;
        self.elapsed += other.elapsed;
        self.iterations = match (self.iterations, other.iterations) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        for solver in other.solvers {
            if !self.solvers.contains(&solver) {
                self.solvers.push(solver);
            }
        }
        self.routes.extend(other.routes);
        self.unassigned.extend(other.unassigned);
        self.cost_details += &other.cost_details;
        self.details += &other.details;
    }
}

impl Add for Solution {
    type Output = Solution;

    fn add(mut self, other: Solution) -> Solution {
        self += other;
        self
    }
}

impl Sum for Solution {
    fn sum<I: Iterator<Item = Solution>>(iter: I) -> Solution {
        iter.fold(Solution::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestProblem;

    use super::*;

    fn solution(cost: f64, vehicle_id: &str, service_ids: &[&str], unassigned: &[&str]) -> Solution {
        let mut route = Route::new(vehicle_id);
        route.steps = service_ids
            .iter()
            .map(|id| Step::service(*id, None))
            .collect();
        route.details.total_time = Some(100);

        Solution {
            cost,
            elapsed: SignedDuration::from_secs(1),
            solvers: vec![String::from("ortools")],
            routes: vec![route],
            unassigned: unassigned
                .iter()
                .map(|id| Step::unassigned_service(*id))
                .collect(),
            ..Solution::default()
        }
    }

    #[test]
    fn test_add_solutions() {
        let a = solution(10.0, "v0", &["s0", "s1"], &["s4"]);
        let mut b = solution(5.0, "v1", &["s2"], &["s3"]);
        b.solvers.push(String::from("vroom"));

        let merged = a + b;

        assert_eq!(merged.cost, 15.0);
        assert_eq!(merged.elapsed, SignedDuration::from_secs(2));
        assert_eq!(merged.routes.len(), 2);
        assert_eq!(merged.solvers, vec!["ortools", "vroom"]);
        assert_eq!(
            merged.assigned_service_ids().collect::<Vec<_>>(),
            vec!["s0", "s1", "s2"]
        );
        assert_eq!(
            merged.unassigned_service_ids().collect::<Vec<_>>(),
            vec!["s4", "s3"]
        );
    }

    #[test]
    fn test_sum_of_nothing_is_empty() {
        let merged: Solution = Vec::new().into_iter().sum();
        assert_eq!(merged.cost, 0.0);
        assert!(merged.routes.is_empty());
    }

    #[test]
    fn test_compute_total_details_requires_every_route() {
        let mut merged = solution(1.0, "v0", &["s0"], &[]) + solution(1.0, "v1", &["s1"], &[]);
        merged.compute_total_details();
        assert_eq!(merged.details.total_time, Some(200));
        assert_eq!(merged.details.total_distance, None);

        merged.routes[1].details.total_time = None;
        merged.compute_total_details();
        assert_eq!(merged.details.total_time, None);
    }

    #[test]
    fn test_no_solution() {
        let problem = TestProblem::grid(3, 2);
        let solution = Solution::no_solution(&problem, "ortools");

        assert!(solution.is_no_solution());
        assert_eq!(solution.routes.len(), 2);
        assert!(solution.routes.iter().all(|route| route.steps.is_empty()));
        assert_eq!(solution.unassigned.len(), 3);
    }
}
