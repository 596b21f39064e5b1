use fxhash::FxHashMap;
use jiff::SignedDuration;

use crate::{
    problem::{
        service::{Activity, Quantity, Service, ServiceBuilder},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::{route::Route, step::Step},
};

pub const CUMULATED_PREFIX: &str = "cumulated_";

/// A synthetic service standing for a whole solved route, and the services it
/// replaces in route order.
#[derive(Debug, Clone)]
pub struct Cumulated {
    pub service: Service,
    pub members: Vec<String>,
}

/// Time between the start of the first service of a route and the departure
/// from its last one.
///
/// Falls back to the sum of the service durations when the route carries no
/// timing.
fn service_span(route: &Route, services: &FxHashMap<&str, &Service>) -> SignedDuration {
    let mut service_steps = route.steps.iter().filter(|step| step.service_id().is_some());
    let first = service_steps.next();
    let last = service_steps.last().or(first);

    let timed = first
        .and_then(|step| step.info.begin_time)
        .zip(last.and_then(|step| step.info.departure_time));
    if let Some((begin, departure)) = timed {
        return SignedDuration::from_secs((departure - begin).max(0));
    }

    route
        .service_ids()
        .filter_map(|service_id| services.get(service_id))
        .filter_map(|service| service.first_activity())
        .fold(SignedDuration::ZERO, |total, activity| total + activity.duration())
}

/// Builds the synthetic service of the `index`-th cluster from its solved
/// route, or `None` when the route serves nothing.
///
/// The service sits on the first service of the cluster, lasts as long as the
/// route takes to serve the cluster and carries the summed load of the route.
/// It has no time window.
pub fn cumulate(cluster: &VehicleRoutingProblem, index: usize, route: &Route) -> Option<Cumulated> {
    let members: Vec<String> = route.service_ids().map(str::to_owned).collect();
    if members.is_empty() {
        return None;
    }

    let anchor = cluster
        .services()
        .iter()
        .find_map(|service| service.first_activity())?;
    let services = cluster.services_by_id();
    let served: Vec<&Service> = members
        .iter()
        .filter_map(|member| services.get(member.as_str()).copied())
        .collect();

    let quantities = cluster
        .units()
        .iter()
        .map(|unit| {
            let total = served.iter().map(|service| service.quantity(unit.id())).sum();
            Quantity::new(unit.id(), total)
        })
        .collect();

    let mut skills: Vec<String> = Vec::new();
    for skill in served.iter().flat_map(|service| service.skills()) {
        if !skills.contains(skill) {
            skills.push(skill.clone());
        }
    }

    // Vehicles allowed for every constrained member.
    let mut sticky: Option<Vec<String>> = None;
    for service in &served {
        if service.sticky_vehicle_ids().is_empty() {
            continue;
        }
        sticky = Some(match sticky {
            None => service.sticky_vehicle_ids().to_vec(),
            Some(ids) => ids
                .into_iter()
                .filter(|id| service.sticky_vehicle_ids().contains(id))
                .collect(),
        });
    }

    let mut builder = ServiceBuilder::default();
    builder
        .set_id(format!("{CUMULATED_PREFIX}{index}"))
        .set_activity(
            Activity::new(anchor.point_id()).with_duration(service_span(route, &services)),
        )
        .set_quantities(quantities)
        .set_skills(skills)
        .set_sticky_vehicle_ids(sticky.unwrap_or_default());
    if let Some(priority) = served.iter().map(|service| service.priority()).min() {
        builder.set_priority(priority);
    }

    Some(Cumulated {
        service: builder.build(),
        members,
    })
}

/// Replaces every synthetic service id by the ids it stands for.
pub fn expand<'a>(
    service_ids: impl IntoIterator<Item = &'a str>,
    cumulated: &'a FxHashMap<String, Cumulated>,
) -> Vec<&'a str> {
    let mut expanded = Vec::new();
    for service_id in service_ids {
        match cumulated.get(service_id) {
            Some(cumulated) => expanded.extend(cumulated.members.iter().map(String::as_str)),
            None => expanded.push(service_id),
        }
    }
    expanded
}

/// Unassigned entries of a second pass, with synthetic services expanded.
pub fn expand_unassigned(
    unassigned: &[Step],
    cumulated: &FxHashMap<String, Cumulated>,
) -> Vec<Step> {
    let mut expanded = Vec::with_capacity(unassigned.len());
    for step in unassigned {
        match step.service_id().and_then(|service_id| cumulated.get(service_id)) {
            Some(cumulated) => expanded.extend(
                cumulated
                    .members
                    .iter()
                    .map(|member| Step::unassigned_service(member.as_str())),
            ),
            None => expanded.push(step.clone()),
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::vehicle_routing_problem::VehicleRoutingProblemBuilder,
        test_utils::{self, TestProblem},
    };

    use super::*;

    fn timed_route(vehicle_id: &str, services: &[(&str, i64, i64)]) -> Route {
        let mut route = Route::new(vehicle_id);
        route.steps = services
            .iter()
            .map(|&(service_id, begin, departure)| {
                let mut step = Step::service(service_id, None);
                step.info.begin_time = Some(begin);
                step.info.departure_time = Some(departure);
                step
            })
            .collect();
        route
    }

    #[test]
    fn test_cumulate_route() {
        let problem = TestProblem::grid(3, 1);
        let route = timed_route("v0", &[("s2", 1000, 1300), ("s0", 1500, 1800)]);

        let cumulated = cumulate(&problem, 4, &route).unwrap();

        assert_eq!(cumulated.members, vec!["s2", "s0"]);
        let service = &cumulated.service;
        assert_eq!(service.id(), "cumulated_4");
        assert_eq!(service.quantity("kg"), 2.0);
        let activity = service.activity().unwrap();
        assert_eq!(activity.point_id(), "p0");
        assert_eq!(activity.duration(), SignedDuration::from_secs(800));
        assert!(activity.timewindows().is_empty());
    }

    #[test]
    fn test_untimed_route_sums_durations() {
        let problem = TestProblem::grid(3, 1);
        let mut route = Route::new("v0");
        route.steps = vec![Step::service("s0", None), Step::service("s1", None)];

        let cumulated = cumulate(&problem, 0, &route).unwrap();

        assert_eq!(
            cumulated.service.activity().unwrap().duration(),
            SignedDuration::from_mins(10)
        );
    }

    #[test]
    fn test_empty_route_is_not_cumulated() {
        let problem = TestProblem::grid(3, 1);
        assert!(cumulate(&problem, 0, &Route::new("v0")).is_none());
    }

    #[test]
    fn test_skills_and_sticky_vehicles() {
        let base = TestProblem::grid(2, 0);
        let mut a = ServiceBuilder::default();
        a.set_id("a")
            .set_activity(Activity::new("p0"))
            .set_skills(vec![String::from("frozen")])
            .set_sticky_vehicle_ids(vec![String::from("v0"), String::from("v1")])
            .set_priority(6);
        let mut b = ServiceBuilder::default();
        b.set_id("b")
            .set_activity(Activity::new("p1"))
            .set_skills(vec![String::from("frozen"), String::from("fragile")])
            .set_sticky_vehicle_ids(vec![String::from("v1")])
            .set_priority(2);

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_points(base.points().to_vec())
            .set_units(base.units().to_vec())
            .set_services(vec![a.build(), b.build()])
            .set_vehicles(vec![test_utils::vehicle("v1", 10.0)]);
        let problem = builder.build();

        let mut route = Route::new("v1");
        route.steps = vec![Step::service("a", None), Step::service("b", None)];
        let cumulated = cumulate(&problem, 0, &route).unwrap();

        assert_eq!(cumulated.service.skills(), ["frozen", "fragile"]);
        assert_eq!(cumulated.service.sticky_vehicle_ids(), ["v1"]);
        assert_eq!(cumulated.service.priority(), 2);
    }

    #[test]
    fn test_expand() {
        let problem = TestProblem::grid(3, 1);
        let route = timed_route("v0", &[("s0", 0, 10), ("s1", 20, 30)]);
        let cumulated = cumulate(&problem, 0, &route).unwrap();
        let by_id: FxHashMap<String, Cumulated> =
            [(cumulated.service.id().to_owned(), cumulated)].into_iter().collect();

        assert_eq!(expand(["s2", "cumulated_0"], &by_id), vec!["s2", "s0", "s1"]);

        let unassigned = vec![
            Step::unassigned_service("cumulated_0"),
            Step::unassigned_service("s2"),
        ];
        let expanded: Vec<Step> = expand_unassigned(&unassigned, &by_id);
        assert_eq!(
            expanded.iter().filter_map(|step| step.service_id()).collect::<Vec<_>>(),
            vec!["s0", "s1", "s2"]
        );
    }
}
