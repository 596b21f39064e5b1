use fxhash::FxHashMap;
use smallvec::smallvec;

use crate::{
    clustering::hierarchical::Metrics,
    problem::{
        configuration::CutSymbol, point::Point, unit::Unit,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
};

use super::SplitError;

pub const DURATION_METRIC: usize = 0;
pub const VISITS_METRIC: usize = 1;
const UNIT_METRICS_OFFSET: usize = 2;

/// Services sharing a point, clustered as a single item.
#[derive(Debug, Clone)]
pub struct Leaf<'a> {
    pub point: &'a Point,
    pub service_ids: Vec<&'a str>,
    /// Total duration, visit count, then one load per problem unit.
    pub metrics: Metrics,
}

/// Groups services by the point of their first activity, points in order of
/// first appearance.
pub fn service_leaves(problem: &VehicleRoutingProblem) -> Result<Vec<Leaf<'_>>, SplitError> {
    let points = problem.points_by_id();
    let mut leaves: Vec<Leaf> = Vec::new();
    let mut leaf_by_point: FxHashMap<&str, usize> = FxHashMap::default();

    for service in problem.services() {
        let activity = service
            .first_activity()
            .ok_or_else(|| SplitError::MissingLocation(service.id().to_owned()))?;
        let point = points
            .get(activity.point_id())
            .copied()
            .ok_or_else(|| SplitError::MissingLocation(service.id().to_owned()))?;

        let index = *leaf_by_point.entry(point.id()).or_insert_with(|| {
            let metrics: Metrics = smallvec![0.0; UNIT_METRICS_OFFSET + problem.units().len()];
            leaves.push(Leaf {
                point,
                service_ids: Vec::new(),
                metrics,
            });
            leaves.len() - 1
        });

        let leaf = &mut leaves[index];
        leaf.service_ids.push(service.id());
        leaf.metrics[DURATION_METRIC] += activity.duration().as_secs_f64();
        leaf.metrics[VISITS_METRIC] += 1.0;
        for (offset, unit) in problem.units().iter().enumerate() {
            leaf.metrics[UNIT_METRICS_OFFSET + offset] += service.quantity(unit.id());
        }
    }

    Ok(leaves)
}

pub fn metric_index(symbol: &CutSymbol, units: &[Unit]) -> Result<usize, SplitError> {
    match symbol {
        CutSymbol::Duration => Ok(DURATION_METRIC),
        CutSymbol::Visits => Ok(VISITS_METRIC),
        CutSymbol::Unit(unit_id) => units
            .iter()
            .position(|unit| unit.id() == unit_id)
            .map(|position| UNIT_METRICS_OFFSET + position)
            .ok_or_else(|| SplitError::UnknownUnit(unit_id.clone())),
    }
}

/// The requested metric, or visits when no leaf carries any of it.
pub fn effective_metric(leaves: &[Leaf], metric: usize) -> usize {
    if leaves.iter().any(|leaf| leaf.metrics[metric] > 0.0) {
        metric
    } else {
        VISITS_METRIC
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{self, TestProblem};

    use super::*;

    #[test]
    fn test_services_on_same_point_share_a_leaf() {
        let services = vec![
            test_utils::service("a", "p0", 1.0),
            test_utils::service("b", "p1", 2.0),
            test_utils::service("c", "p0", 3.0),
        ];
        let problem = TestProblem::build(
            &[(48.0, 2.0), (48.1, 2.0)],
            services,
            vec![test_utils::vehicle("v", 10.0)],
        );

        let leaves = service_leaves(&problem).unwrap();

        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].point.id(), "p0");
        assert_eq!(leaves[0].service_ids, vec!["a", "c"]);
        assert_eq!(leaves[0].metrics.as_slice(), &[600.0, 2.0, 4.0]);
        assert_eq!(leaves[1].metrics.as_slice(), &[300.0, 1.0, 2.0]);
    }

    #[test]
    fn test_metric_index() {
        let units = vec![Unit::new("kg"), Unit::new("l")];

        assert_eq!(metric_index(&CutSymbol::Duration, &units), Ok(0));
        assert_eq!(metric_index(&CutSymbol::Unit(String::from("l")), &units), Ok(3));
        assert_eq!(
            metric_index(&CutSymbol::Unit(String::from("m3")), &units),
            Err(SplitError::UnknownUnit(String::from("m3")))
        );
    }
}
