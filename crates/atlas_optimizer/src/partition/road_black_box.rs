use tracing::{debug, instrument};

use crate::{
    clustering::hierarchical::ClusterTree,
    problem::{
        configuration::{CutSymbol, PartitionEntity},
        location::Location,
        vehicle::Vehicle,
        work_item::WorkItem,
    },
};

use super::{
    SplitError, SplitResult,
    leaves::{self, Leaf},
    sub_work_item,
};

/// Splits a problem on the locations of its services, balancing the cut
/// metric (a unit load, service duration or visits) across `clusters` parts.
///
/// Every part keeps the whole fleet, unless the partition targets vehicles
/// and there are enough of them: the heaviest cluster then goes to the vehicle
/// with the largest capacity for the metric, and so on.
#[instrument(skip_all, level = "debug")]
pub fn split_road_black_box(
    work_item: &WorkItem,
    metric: &CutSymbol,
    entity: Option<PartitionEntity>,
    clusters: Option<usize>,
) -> Result<SplitResult, SplitError> {
    let problem = work_item.problem();
    let vehicles = problem.vehicles();
    if vehicles.is_empty() {
        return Err(SplitError::NoVehicles);
    }
    if problem.services().is_empty() {
        return Err(SplitError::NoServices);
    }
    if !problem.shipments().is_empty() {
        return Err(SplitError::Shipments(problem.shipments().len()));
    }

    let metric_index = leaves::metric_index(metric, problem.units())?;
    let leaves = leaves::service_leaves(problem)?;
    let locations: Vec<&Location> = leaves
        .iter()
        .map(|leaf| {
            leaf.point
                .location()
                .ok_or_else(|| SplitError::MissingLocation(leaf.service_ids[0].to_owned()))
        })
        .collect::<Result<_, _>>()?;

    let tree = ClusterTree::average_linkage(
        leaves.iter().map(|leaf| leaf.metrics.clone()).collect(),
        |a, b| locations[a].euclidean_distance(locations[b]),
    );

    let wanted = clusters.unwrap_or(vehicles.len()).max(1);
    let metric_index = leaves::effective_metric(&leaves, metric_index);
    let mut cut = tree.cut(wanted, metric_index);
    debug!(requested = wanted, produced = cut.len(), "cut road tree");
    fold_surplus(&mut cut, &leaves, &locations, metric_index, wanted);

    let assignment: Option<Vec<&Vehicle>> = (entity == Some(PartitionEntity::Vehicle)
        && cut.len() <= vehicles.len())
    .then(|| assign_vehicles(&cut, &leaves, vehicles, metric, metric_index));

    let mut result = SplitResult::default();
    for (index, cluster) in cut.iter().enumerate() {
        let service_ids: Vec<&str> = cluster
            .iter()
            .flat_map(|&leaf| leaves[leaf].service_ids.iter().copied())
            .collect();
        let vehicle_ids: Option<Vec<&str>> = assignment
            .as_ref()
            .map(|vehicles| vec![vehicles[index].id()]);

        let mut sub = sub_work_item(work_item, index, &service_ids, vehicle_ids.as_deref());
        sub.problem_mut()
            .configuration_mut()
            .preprocessing
            .clear_partitioning();
        result.debug.record(sub.problem());
        result.work_items.push(sub);
    }

    Ok(result)
}

fn cluster_metric(cluster: &[usize], leaves: &[Leaf], metric: usize) -> f64 {
    cluster.iter().map(|&leaf| leaves[leaf].metrics[metric]).sum()
}

fn centroid(cluster: &[usize], locations: &[&Location]) -> Location {
    let count = cluster.len().max(1) as f64;
    let (lat, lon) = cluster.iter().fold((0.0, 0.0), |(lat, lon), &leaf| {
        (lat + locations[leaf].lat(), lon + locations[leaf].lon())
    });
    Location::from_lat_lon(lat / count, lon / count)
}

/// Merges the lightest clusters into their closest neighbour until at most
/// `wanted` remain.
fn fold_surplus(
    cut: &mut Vec<Vec<usize>>,
    leaves: &[Leaf],
    locations: &[&Location],
    metric: usize,
    wanted: usize,
) {
    while cut.len() > wanted {
        let lightest = (0..cut.len())
            .min_by(|&a, &b| {
                cluster_metric(&cut[a], leaves, metric)
                    .total_cmp(&cluster_metric(&cut[b], leaves, metric))
            })
            .unwrap_or(0);
        let folded = cut.remove(lightest);
        let center = centroid(&folded, locations);

        let closest = (0..cut.len())
            .min_by(|&a, &b| {
                let da = centroid(&cut[a], locations).euclidean_distance(&center);
                let db = centroid(&cut[b], locations).euclidean_distance(&center);
                da.total_cmp(&db)
            })
            .unwrap_or(0);

        cut[closest].extend(folded);
        cut[closest].sort_unstable();
    }
}

/// Pairs clusters and vehicles, both sorted by decreasing metric/capacity.
fn assign_vehicles<'a>(
    cut: &[Vec<usize>],
    leaves: &[Leaf],
    vehicles: &'a [Vehicle],
    metric: &CutSymbol,
    metric_index: usize,
) -> Vec<&'a Vehicle> {
    let capacity = |vehicle: &Vehicle| -> f64 {
        let limit = match metric {
            CutSymbol::Unit(unit_id) => vehicle.capacity(unit_id),
            CutSymbol::Duration => vehicle.duration().map(|duration| duration.as_secs_f64()),
            CutSymbol::Visits => None,
        };
        limit.unwrap_or(f64::INFINITY)
    };

    let mut by_capacity: Vec<&Vehicle> = vehicles.iter().collect();
    by_capacity.sort_by(|a, b| capacity(b).total_cmp(&capacity(a)));

    let mut by_metric: Vec<usize> = (0..cut.len()).collect();
    by_metric.sort_by(|&a, &b| {
        cluster_metric(&cut[b], leaves, metric_index)
            .total_cmp(&cluster_metric(&cut[a], leaves, metric_index))
    });

    let mut assignment: Vec<&Vehicle> = vec![by_capacity[0]; cut.len()];
    for (rank, &cluster) in by_metric.iter().enumerate() {
        assignment[cluster] = by_capacity[rank];
    }
    assignment
}
