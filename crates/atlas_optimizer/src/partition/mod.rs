pub mod debug;
pub mod density;
pub mod hierarchical_split;
pub mod kmeans_split;
pub mod leaves;
pub mod road_black_box;

use fxhash::FxHashSet;
use tracing::{info, instrument, warn};

use crate::problem::{configuration::Partition, work_item::WorkItem};

use self::debug::ClusterDebug;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SplitError {
    #[error("problem has no vehicle")]
    NoVehicles,
    #[error("problem has no service")]
    NoServices,
    #[error("problem has {0} shipments")]
    Shipments(usize),
    #[error("service {0} has alternative activities")]
    AlternativeActivities(String),
    #[error("service {0} has no located activity")]
    MissingLocation(String),
    #[error("point {0} has no usable matrix index")]
    MissingMatrixIndex(String),
    #[error("no matrix to measure distances")]
    MissingMatrix,
    #[error("unknown unit {0}")]
    UnknownUnit(String),
}

/// Work items produced by a split and the hulls of their clusters.
#[derive(Debug, Default)]
pub struct SplitResult {
    pub work_items: Vec<WorkItem>,
    pub debug: ClusterDebug,
}

impl SplitResult {
    pub fn unsplit(work_item: WorkItem) -> Self {
        SplitResult {
            work_items: vec![work_item],
            debug: ClusterDebug::default(),
        }
    }

    pub fn extend(&mut self, other: SplitResult) {
        self.work_items.extend(other.work_items);
        self.debug.extend(other.debug);
    }
}

/// Splits every work item according to its partition configuration.
///
/// Density partitions need a solver and are left to the pipeline.
#[instrument(skip_all, level = "debug")]
pub fn split_work_items(work_items: Vec<WorkItem>) -> SplitResult {
    let mut result = SplitResult::default();

    for work_item in work_items {
        let partition = work_item
            .problem()
            .configuration()
            .preprocessing
            .partition
            .clone();

        let split = match partition {
            Some(Partition::Hierarchical { days }) => {
                hierarchical_split::split_hierarchical(&work_item, days)
            }
            Some(Partition::RoadBlackBox {
                metric,
                entity,
                clusters,
            }) => road_black_box::split_road_black_box(&work_item, &metric, entity, clusters),
            Some(Partition::Density { .. }) => {
                result.extend(SplitResult::unsplit(work_item));
                continue;
            }
            None => {
                result.extend(kmeans_split::split_clusters(work_item));
                continue;
            }
        };

        match split {
            Ok(split) => {
                info!(
                    problem = work_item.problem().id(),
                    parts = split.work_items.len(),
                    "split problem"
                );
                result.extend(split)
            }
            Err(error) => {
                warn!(%error, problem = work_item.problem().id(), "cannot split problem, solving it whole");
                result.extend(SplitResult::unsplit(work_item));
            }
        }
    }

    result
}

/// Sub-problem of `parent` restricted to some services and vehicles, with time
/// budgets scaled to its share of the parent.
pub(crate) fn sub_work_item(
    parent: &WorkItem,
    index: usize,
    service_ids: &[&str],
    vehicle_ids: Option<&[&str]>,
) -> WorkItem {
    let problem = parent.problem();
    let kept: FxHashSet<&str> = service_ids.iter().copied().collect();
    let mut sub = problem.sub_problem(format!("{}_{index}", problem.id()), &kept, vehicle_ids);

    let ratio = sub.size() as f64 / parent.problem_size().max(1) as f64;
    sub.configuration_mut().resolution.apportion(ratio);

    WorkItem::split_from(sub, parent.depth() + 1)
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use crate::{
        problem::configuration::{CutSymbol, Partition},
        test_utils::{self, TestProblem},
    };

    use super::*;

    #[test]
    fn test_sub_work_item_apportions_budget() {
        let mut problem = TestProblem::grid(4, 2);
        problem.configuration_mut().resolution.duration = Some(SignedDuration::from_secs(8));
        let parent = WorkItem::new(problem);

        let sub = sub_work_item(&parent, 3, &["s0"], None);

        assert_eq!(sub.problem().id(), "test_3");
        assert_eq!(sub.problem_size(), 1);
        assert_eq!(sub.depth(), 1);
        assert_eq!(
            sub.problem().configuration().resolution.duration,
            Some(SignedDuration::from_secs(2))
        );
    }

    #[test]
    fn test_density_partition_is_left_whole() {
        let mut problem = TestProblem::grid(4, 2);
        problem.configuration_mut().preprocessing.partition = Some(Partition::Density {
            epsilon: 100.0,
            min_points: 2,
        });

        let result = split_work_items(vec![WorkItem::new(problem)]);

        assert_eq!(result.work_items.len(), 1);
        assert!(result.debug.is_empty());
    }

    #[test]
    fn test_failed_split_falls_back_to_whole_problem() {
        let mut problem = TestProblem::grid(4, 0);
        problem.configuration_mut().preprocessing.partition =
            Some(Partition::Hierarchical { days: 5 });

        let result = split_work_items(vec![WorkItem::new(problem)]);

        assert_eq!(result.work_items.len(), 1);
        assert_eq!(result.work_items[0].problem().services().len(), 4);
    }

    fn shipment_count(result: &SplitResult) -> usize {
        result
            .work_items
            .iter()
            .map(|work_item| work_item.problem().shipments().len())
            .sum()
    }

    #[test]
    fn test_hierarchical_split_keeps_shipments() {
        let mut problem = TestProblem::grid(4, 2);
        problem.push_shipment(test_utils::shipment("sh", "p0", "p2"));
        problem.configuration_mut().preprocessing.partition =
            Some(Partition::Hierarchical { days: 1 });

        let result = split_work_items(vec![WorkItem::new(problem)]);

        assert_eq!(result.work_items.len(), 1);
        assert_eq!(shipment_count(&result), 1);
        assert_eq!(result.work_items[0].problem().services().len(), 4);
    }

    #[test]
    fn test_road_black_box_split_keeps_shipments() {
        let mut problem = TestProblem::grid(4, 2);
        problem.push_shipment(test_utils::shipment("sh", "p0", "p2"));
        problem.configuration_mut().preprocessing.partition = Some(Partition::RoadBlackBox {
            metric: CutSymbol::Visits,
            entity: None,
            clusters: Some(2),
        });

        let result = split_work_items(vec![WorkItem::new(problem)]);

        assert_eq!(result.work_items.len(), 1);
        assert_eq!(shipment_count(&result), 1);
        assert_eq!(result.work_items[0].problem().services().len(), 4);
    }
}
