use tracing::{debug, instrument, warn};

use crate::{
    clustering::kmeans::KMeans,
    problem::{location::Location, work_item::WorkItem},
};

use super::{SplitError, SplitResult, sub_work_item};

/// Whether a work item is too large and can be split in halves.
pub fn should_split(work_item: &WorkItem, max_split_size: usize) -> bool {
    let problem = work_item.problem();

    problem.vehicles().len() > 1
        && problem.shipments().is_empty()
        && work_item.problem_size() > max_split_size
        && problem.services().len() > max_split_size
        && !problem.configuration().has_schedule_range()
}

/// Recursively bisects a work item until no part exceeds the configured
/// maximum split size. Every part keeps the whole fleet.
#[instrument(skip_all, level = "debug")]
pub fn split_clusters(work_item: WorkItem) -> SplitResult {
    match work_item
        .problem()
        .configuration()
        .preprocessing
        .max_split_size
    {
        Some(max_split_size) => split_recursive(work_item, max_split_size.max(1)),
        None => SplitResult::unsplit(work_item),
    }
}

fn split_recursive(mut work_item: WorkItem, max_split_size: usize) -> SplitResult {
    if !should_split(&work_item, max_split_size) {
        let mut result = SplitResult::default();
        if work_item.depth() > 0 {
            work_item
                .problem_mut()
                .configuration_mut()
                .preprocessing
                .clear_partitioning();
            result.debug.record(work_item.problem());
        }
        result.work_items.push(work_item);
        return result;
    }

    let halves = match bisect(&work_item) {
        Ok(halves) => halves,
        Err(error) => {
            warn!(%error, problem = work_item.problem().id(), "cannot bisect problem");
            return SplitResult::unsplit(work_item);
        }
    };

    let mut result = SplitResult::default();
    for half in halves {
        result.extend(split_recursive(half, max_split_size));
    }
    result
}

/// Two-means on service locations, or an even split of the service list when
/// the locations cannot be told apart.
fn bisect(work_item: &WorkItem) -> Result<Vec<WorkItem>, SplitError> {
    let problem = work_item.problem();
    let points = problem.points_by_id();

    let locations: Vec<&Location> = problem
        .services()
        .iter()
        .map(|service| {
            service
                .first_activity()
                .and_then(|activity| points.get(activity.point_id()))
                .and_then(|point| point.location())
                .ok_or_else(|| SplitError::MissingLocation(service.id().to_owned()))
        })
        .collect::<Result<_, _>>()?;

    let mut groups = KMeans::new(2).cluster(&locations, |a, b| a.euclidean_distance(b));
    if groups.len() < 2 {
        let middle = locations.len() / 2;
        groups = vec![(0..middle).collect(), (middle..locations.len()).collect()];
    }

    debug!(
        services = locations.len(),
        first = groups[0].len(),
        second = groups[1].len(),
        "bisected problem"
    );

    Ok(groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let service_ids: Vec<&str> = group
                .iter()
                .map(|&service| problem.services()[service].id())
                .collect();
            sub_work_item(work_item, index, &service_ids, None)
        })
        .collect())
}
