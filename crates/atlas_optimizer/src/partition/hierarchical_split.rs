use tracing::{debug, instrument};

use crate::{
    clustering::hierarchical::ClusterTree,
    problem::{matrix::MatrixDimension, work_item::WorkItem},
};

use super::{
    SplitError, SplitResult,
    leaves::{self, DURATION_METRIC},
    sub_work_item,
};

/// Splits a problem into `vehicles * days` clusters of similar service
/// duration, each handed to a single vehicle in turn.
///
/// Distances come from the travel matrix of the first vehicle, time when it
/// has one and distance otherwise.
#[instrument(skip_all, level = "debug")]
pub fn split_hierarchical(work_item: &WorkItem, days: usize) -> Result<SplitResult, SplitError> {
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
    if let Some(service) = problem
        .services()
        .iter()
        .find(|service| !service.has_single_activity())
    {
        return Err(SplitError::AlternativeActivities(service.id().to_owned()));
    }

    let matrix = problem
        .vehicle_matrix(&vehicles[0])
        .ok_or(SplitError::MissingMatrix)?;
    let dimension = if matrix.has_dimension(MatrixDimension::Time) {
        MatrixDimension::Time
    } else if matrix.has_dimension(MatrixDimension::Distance) {
        MatrixDimension::Distance
    } else {
        return Err(SplitError::MissingMatrix);
    };

    let leaves = leaves::service_leaves(problem)?;
    let matrix_indices: Vec<usize> = leaves
        .iter()
        .map(|leaf| {
            leaf.point
                .matrix_index()
                .filter(|&index| index < matrix.size())
                .ok_or_else(|| SplitError::MissingMatrixIndex(leaf.point.id().to_owned()))
        })
        .collect::<Result<_, _>>()?;

    let tree = ClusterTree::average_linkage(
        leaves.iter().map(|leaf| leaf.metrics.clone()).collect(),
        |a, b| {
            let (from, to) = (matrix_indices[a], matrix_indices[b]);
            let there = matrix.get(dimension, from, to).unwrap_or(0.0);
            let back = matrix.get(dimension, to, from).unwrap_or(0.0);
            (there + back) / 2.0
        },
    );

    let clusters = vehicles.len() * days.max(1);
    let metric = leaves::effective_metric(&leaves, DURATION_METRIC);
    let cut = tree.cut(clusters, metric);
    debug!(requested = clusters, produced = cut.len(), "cut hierarchical tree");

    let mut result = SplitResult::default();
    for (index, cluster) in cut.iter().enumerate() {
        let service_ids: Vec<&str> = cluster
            .iter()
            .flat_map(|&leaf| leaves[leaf].service_ids.iter().copied())
            .collect();
        let vehicle_id = vehicles[index % vehicles.len()].id();

        let mut sub = sub_work_item(work_item, index, &service_ids, Some(&[vehicle_id][..]));
        sub.problem_mut()
            .configuration_mut()
            .preprocessing
            .clear_partitioning();
        result.debug.record(sub.problem());
        result.work_items.push(sub);
    }

    Ok(result)
}
