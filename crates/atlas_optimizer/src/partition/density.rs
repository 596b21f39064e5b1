use fxhash::FxHashSet;
use tracing::{debug, instrument};

use crate::{
    clustering::dbscan::Dbscan,
    problem::{
        location::Location, time_window::SecondsRange,
        vehicle_routing_problem::VehicleRoutingProblem, work_item::WorkItem,
    },
};

use super::{SplitError, debug::ClusterDebug, sub_work_item};

/// Added to the distance of services that must not share a cluster.
pub const INCOMPATIBILITY_PENALTY: f64 = (1u64 << 56) as f64;
const OPEN_END: i64 = 1 << 56;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensityClusters {
    pub clusters: Vec<Vec<String>>,
    pub noise: Vec<String>,
}

struct ServiceFeatures<'a> {
    location: &'a Location,
    range: SecondsRange,
    /// One flag per vehicle-specific unit set: does the service load it.
    unit_flags: Vec<bool>,
}

/// Unit sets a vehicle carries on top of the units every vehicle carries.
fn vehicle_unit_sets(problem: &VehicleRoutingProblem) -> Vec<Vec<&str>> {
    let per_vehicle: Vec<FxHashSet<&str>> = problem
        .vehicles()
        .iter()
        .map(|vehicle| {
            vehicle
                .capacities()
                .iter()
                .map(|capacity| capacity.unit_id())
                .collect()
        })
        .collect();

    let Some(first) = per_vehicle.first() else {
        return Vec::new();
    };
    let common: FxHashSet<&str> = first
        .iter()
        .copied()
        .filter(|unit| per_vehicle.iter().all(|units| units.contains(unit)))
        .collect();

    let mut sets: Vec<Vec<&str>> = Vec::new();
    for units in &per_vehicle {
        let mut specific: Vec<&str> = units.difference(&common).copied().collect();
        specific.sort_unstable();
        if !specific.is_empty() && !sets.contains(&specific) {
            sets.push(specific);
        }
    }
    sets
}

/// Density clusters of services under a haversine metric in meters.
///
/// Services whose time windows cannot overlap, or that need different
/// vehicle-specific units, never share a cluster. Services left without a
/// dense neighbourhood are reported as noise.
#[instrument(skip_all, level = "debug")]
pub fn density_clusters(
    problem: &VehicleRoutingProblem,
    epsilon: f64,
    min_points: usize,
) -> Result<DensityClusters, SplitError> {
    let points = problem.points_by_id();
    let unit_sets = vehicle_unit_sets(problem);

    let features: Vec<ServiceFeatures> = problem
        .services()
        .iter()
        .map(|service| -> Result<ServiceFeatures, SplitError> {
            let activity = service
                .first_activity()
                .ok_or_else(|| SplitError::MissingLocation(service.id().to_owned()))?;
            let location = points
                .get(activity.point_id())
                .and_then(|point| point.location())
                .ok_or_else(|| SplitError::MissingLocation(service.id().to_owned()))?;

            Ok(ServiceFeatures {
                location,
                range: SecondsRange::covering(activity.timewindows(), OPEN_END),
                unit_flags: unit_sets
                    .iter()
                    .map(|units| units.iter().any(|unit| service.quantity(unit) != 0.0))
                    .collect(),
            })
        })
        .collect::<Result<_, _>>()?;

    let distance = |a: usize, b: usize| {
        let (a, b) = (&features[a], &features[b]);
        let mut distance = a.location.haversine_distance(b.location);
        if !a.range.overlaps(&b.range) {
            distance += INCOMPATIBILITY_PENALTY;
        }
        if a.unit_flags != b.unit_flags {
            distance += INCOMPATIBILITY_PENALTY;
        }
        distance
    };

    let admits = |members: &[usize], candidate: usize| {
        let candidate = &features[candidate];
        if features[members[0]].unit_flags != candidate.unit_flags {
            return false;
        }
        members
            .iter()
            .try_fold(candidate.range, |range, &member| {
                range.intersection(&features[member].range)
            })
            .is_some()
    };

    let result = Dbscan::new(epsilon, min_points).cluster(features.len(), distance, admits);
    debug!(
        clusters = result.clusters.len(),
        noise = result.noise.len(),
        "density clustering"
    );

    let id = |index: &usize| problem.services()[*index].id().to_owned();
    Ok(DensityClusters {
        clusters: result
            .clusters
            .iter()
            .map(|cluster| cluster.iter().map(id).collect())
            .collect(),
        noise: result.noise.iter().map(id).collect(),
    })
}

/// Cluster sub-problems of a density partition and the services left out.
#[derive(Debug, Default)]
pub struct DensitySplit {
    /// One work item per cluster, restricted to the first vehicle.
    pub clusters: Vec<WorkItem>,
    pub noise: Vec<String>,
    pub debug: ClusterDebug,
}

#[instrument(skip_all, level = "debug")]
pub fn density_split(
    work_item: &WorkItem,
    epsilon: f64,
    min_points: usize,
) -> Result<DensitySplit, SplitError> {
    let problem = work_item.problem();
    let first_vehicle = problem.vehicles().first().ok_or(SplitError::NoVehicles)?;
    let DensityClusters { clusters, noise } = density_clusters(problem, epsilon, min_points)?;

    let mut split = DensitySplit {
        noise,
        ..DensitySplit::default()
    };
    for (index, cluster) in clusters.iter().enumerate() {
        let service_ids: Vec<&str> = cluster.iter().map(String::as_str).collect();
        let mut sub = sub_work_item(
            work_item,
            index,
            &service_ids,
            Some(&[first_vehicle.id()][..]),
        );
        sub.problem_mut()
            .configuration_mut()
            .preprocessing
            .clear_partitioning();
        split.debug.record(sub.problem());
        split.clusters.push(sub);
    }

    Ok(split)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{
        problem::{
            service::{Activity, Service, ServiceBuilder},
            time_window::TimeWindow,
            vehicle::VehicleBuilder,
        },
        test_utils::{self, TestProblem},
    };

    use super::*;

    fn timed_service(id: &str, point_id: &str, start: i64, end: i64) -> Service {
        let mut builder = ServiceBuilder::default();
        builder
            .set_id(id)
            .set_activity(
                Activity::new(point_id).with_timewindows(vec![TimeWindow::from_secs(start, end)]),
            )
            .add_quantity("kg", 1.0);
        builder.build()
    }

    fn nearby(count: usize) -> Vec<(f64, f64)> {
        (0..count)
            .map(|i| (48.0 + 0.0005 * i as f64, 2.0))
            .collect()
    }

    #[test]
    fn test_dense_group_and_isolated_noise() {
        let mut locations = nearby(5);
        locations.push((43.0, 5.0));
        let problem = TestProblem::from_locations(&locations, 2);

        let result = density_clusters(&problem, 500.0, 3).unwrap();

        assert_eq!(
            result.clusters,
            vec![vec!["s0", "s1", "s2", "s3", "s4"]]
        );
        assert_eq!(result.noise, vec!["s5"]);
    }

    #[test]
    fn test_disjoint_time_windows_are_separated() {
        let services = vec![
            timed_service("morning_0", "p0", 0, 3600),
            timed_service("morning_1", "p1", 0, 3600),
            timed_service("afternoon_0", "p2", 7200, 9000),
            timed_service("afternoon_1", "p3", 7200, 9000),
        ];
        let problem = TestProblem::build(&nearby(4), services, vec![test_utils::vehicle("v", 10.0)]);

        let result = density_clusters(&problem, 5_000.0, 2).unwrap();

        assert_eq!(
            result.clusters,
            vec![
                vec!["morning_0", "morning_1"],
                vec!["afternoon_0", "afternoon_1"]
            ]
        );
    }

    #[test]
    fn test_pairwise_overlap_is_not_enough() {
        // Each window overlaps its neighbour, the first and last do not.
        let services = vec![
            timed_service("a", "p0", 0, 100),
            timed_service("b", "p1", 50, 150),
            timed_service("c", "p2", 120, 200),
        ];
        let problem = TestProblem::build(&nearby(3), services, vec![test_utils::vehicle("v", 10.0)]);

        let result = density_clusters(&problem, 5_000.0, 1).unwrap();

        for cluster in &result.clusters {
            assert!(!(cluster.contains(&String::from("a")) && cluster.contains(&String::from("c"))));
        }
    }

    #[test]
    fn test_vehicle_specific_units_are_separated() {
        let mut frozen = VehicleBuilder::default();
        frozen
            .set_id("frozen")
            .set_start_point_id("depot")
            .add_capacity("kg", 10.0)
            .add_capacity("frozen", 5.0);
        let vehicles = vec![test_utils::vehicle("dry", 10.0), frozen.build()];

        let mut services: Vec<Service> = (0..4)
            .map(|i| test_utils::service(&format!("s{i}"), &format!("p{i}"), 1.0))
            .collect();
        let mut builder = ServiceBuilder::default();
        builder
            .set_id("cold")
            .set_activity(Activity::new("p4"))
            .add_quantity("frozen", 1.0);
        services.push(builder.build());

        let problem = TestProblem::build(&nearby(5), services, vehicles);

        let result = density_clusters(&problem, 5_000.0, 2).unwrap();

        assert_eq!(result.clusters, vec![vec!["s0", "s1", "s2", "s3"]]);
        assert_eq!(result.noise, vec!["cold"]);
    }

    #[test]
    fn test_density_split_uses_first_vehicle() {
        let mut locations = nearby(6);
        locations.push((43.0, 5.0));
        let mut problem = TestProblem::from_locations(&locations, 3);
        problem.configuration_mut().preprocessing.max_split_size = Some(2);
        let work_item = WorkItem::new(problem);

        let split = density_split(&work_item, 500.0, 3).unwrap();

        assert_eq!(split.clusters.len(), 1);
        assert_eq!(split.noise, vec!["s6"]);
        let cluster = split.clusters[0].problem();
        assert_eq!(cluster.services().len(), 6);
        assert_eq!(cluster.vehicles().len(), 1);
        assert_eq!(cluster.vehicles()[0].id(), "v0");
        assert_eq!(cluster.configuration().preprocessing.max_split_size, None);
        assert_eq!(split.debug.features().len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_clusters_never_mix_disjoint_windows(
            windows in prop::collection::vec((0i64..20, 1i64..6), 4..40),
        ) {
            let services: Vec<Service> = windows
                .iter()
                .enumerate()
                .map(|(i, &(start, length))| {
                    timed_service(&format!("s{i}"), &format!("p{i}"), start * 600, (start + length) * 600)
                })
                .collect();
            let problem = TestProblem::build(
                &nearby(windows.len()),
                services,
                vec![test_utils::vehicle("v", 10.0)],
            );

            let result = density_clusters(&problem, 50_000.0, 2).unwrap();

            let mut seen = result.noise.len();
            for cluster in &result.clusters {
                seen += cluster.len();
                for a in cluster {
                    for b in cluster {
                        let (ia, ib): (usize, usize) = (a[1..].parse().unwrap(), b[1..].parse().unwrap());
                        let (sa, la) = windows[ia];
                        let (sb, lb) = windows[ib];
                        prop_assert!(sa <= sb + lb && sb <= sa + la);
                    }
                }
            }
            prop_assert_eq!(seen, windows.len());
        }
    }
}
