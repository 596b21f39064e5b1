use std::ops::{Index, IndexMut};

use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::{debug, instrument};

/// Position of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(usize);

impl NodeIdx {
    pub const fn new(index: usize) -> Self {
        NodeIdx(index)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl Index<NodeIdx> for Vec<ClusterNode> {
    type Output = ClusterNode;

    fn index(&self, idx: NodeIdx) -> &ClusterNode {
        &self[idx.0]
    }
}

impl IndexMut<NodeIdx> for Vec<ClusterNode> {
    fn index_mut(&mut self, idx: NodeIdx) -> &mut ClusterNode {
        &mut self[idx.0]
    }
}

/// Additive quantities carried by a node (duration, visits, unit loads...).
pub type Metrics = SmallVec<[f64; 4]>;

#[derive(Debug, Clone)]
pub struct ClusterNode {
    item: Option<usize>,
    level: usize,
    size: usize,
    parent: Option<NodeIdx>,
    children: Option<(NodeIdx, NodeIdx)>,
    metrics: Metrics,
}

impl ClusterNode {
    /// Item index for a leaf.
    pub fn item(&self) -> Option<usize> {
        self.item
    }

    /// 0 for leaves, one more than the highest child otherwise.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Number of leaves below the node.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn parent(&self) -> Option<NodeIdx> {
        self.parent
    }

    pub fn children(&self) -> Option<(NodeIdx, NodeIdx)> {
        self.children
    }

    pub fn metrics(&self) -> &[f64] {
        &self.metrics
    }
}

/// Binary tree produced by average-linkage agglomerative clustering.
///
/// Nodes live in an arena: leaves first, in item order, then one node per
/// merge, so a parent always has a higher index than its children.
#[derive(Debug, Clone, Default)]
pub struct ClusterTree {
    nodes: Vec<ClusterNode>,
    root: Option<NodeIdx>,
}

#[derive(Debug, Clone, Copy)]
struct Nearest {
    linkage: f64,
    slot: usize,
}

impl ClusterTree {
    /// Builds the tree over `metrics.len()` items.
    ///
    /// The closest pair of clusters under average linkage is merged first;
    /// ties go to the pair with the lowest node indices.
    #[instrument(skip_all, level = "debug")]
    pub fn average_linkage<D>(metrics: Vec<Metrics>, distance: D) -> Self
    where
        D: Fn(usize, usize) -> f64 + Sync,
    {
        let n = metrics.len();
        let mut nodes: Vec<ClusterNode> = metrics
            .into_iter()
            .enumerate()
            .map(|(item, metrics)| ClusterNode {
                item: Some(item),
                level: 0,
                size: 1,
                parent: None,
                children: None,
                metrics,
            })
            .collect();

        if n <= 1 {
            let root = (n == 1).then(|| NodeIdx::new(0));
            return ClusterTree { nodes, root };
        }

        // Pairwise distance sums between the clusters held in each slot.
        let mut sums: Vec<f64> = (0..n * n)
            .into_par_iter()
            .map(|cell| {
                let (a, b) = (cell / n, cell % n);
                if a == b { 0.0 } else { distance(a, b) }
            })
            .collect();

        let mut slot_node: Vec<NodeIdx> = (0..n).map(NodeIdx::new).collect();
        let mut active = vec![true; n];

        let linkage = |sums: &[f64], nodes: &[ClusterNode], slot_node: &[NodeIdx], a: usize, b: usize| {
            let sizes = nodes[slot_node[a].get()].size * nodes[slot_node[b].get()].size;
            sums[a * n + b] / sizes as f64
        };

        let nearest_of = |sums: &[f64],
                          nodes: &[ClusterNode],
                          slot_node: &[NodeIdx],
                          active: &[bool],
                          slot: usize|
         -> Option<Nearest> {
            let mut best: Option<Nearest> = None;
            for other in (0..n).filter(|&other| other != slot && active[other]) {
                let candidate = Nearest {
                    linkage: linkage(sums, nodes, slot_node, slot, other),
                    slot: other,
                };
                if best.is_none_or(|best| closer(&candidate, &best, slot_node)) {
                    best = Some(candidate);
                }
            }
            best
        };

        let mut nearest: Vec<Option<Nearest>> = (0..n)
            .map(|slot| nearest_of(&sums, &nodes, &slot_node, &active, slot))
            .collect();

        for _ in 0..n - 1 {
            let Some((a, b)) = closest_pair(&nearest, &slot_node, &active) else {
                break;
            };

            let left = slot_node[a];
            let right = slot_node[b];
            let merged = NodeIdx::new(nodes.len());
            let mut metrics = nodes[left.get()].metrics.clone();
            for (total, value) in metrics.iter_mut().zip(nodes[right.get()].metrics.iter()) {
                *total += value;
            }

            nodes.push(ClusterNode {
                item: None,
                level: nodes[left.get()].level.max(nodes[right.get()].level) + 1,
                size: nodes[left.get()].size + nodes[right.get()].size,
                parent: None,
                children: Some((left, right)),
                metrics,
            });
            nodes[left].parent = Some(merged);
            nodes[right].parent = Some(merged);

            for other in (0..n).filter(|&other| active[other] && other != a && other != b) {
                let sum = sums[a * n + other] + sums[b * n + other];
                sums[a * n + other] = sum;
                sums[other * n + a] = sum;
            }

            slot_node[a] = merged;
            active[b] = false;
            nearest[b] = None;

            for other in (0..n).filter(|&other| active[other] && other != a) {
                let stale = nearest[other].is_none_or(|current| current.slot == a || current.slot == b);
                if stale {
                    nearest[other] = nearest_of(&sums, &nodes, &slot_node, &active, other);
                } else {
                    let candidate = Nearest {
                        linkage: linkage(&sums, &nodes, &slot_node, other, a),
                        slot: a,
                    };
                    if nearest[other].is_some_and(|current| closer(&candidate, &current, &slot_node)) {
                        nearest[other] = Some(candidate);
                    }
                }
            }
            nearest[a] = nearest_of(&sums, &nodes, &slot_node, &active, a);
        }

        let root = (0..n)
            .find(|&slot| active[slot])
            .map(|slot| slot_node[slot]);

        debug!(nodes = nodes.len(), "built cluster tree");

        ClusterTree { nodes, root }
    }

    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    pub fn node(&self, idx: NodeIdx) -> &ClusterNode {
        &self.nodes[idx]
    }

    pub fn root(&self) -> Option<NodeIdx> {
        self.root
    }

    /// Cuts the tree into clusters of roughly `total / clusters` on `metric`.
    ///
    /// Levels are walked upward from the leaves. A node is cut as soon as the
    /// metric it still holds reaches the threshold, the root is always cut, and
    /// the metric of every cut node is removed from its ancestors. Cuts left
    /// without items are skipped.
    pub fn cut(&self, clusters: usize, metric: usize) -> Vec<Vec<usize>> {
        let Some(root) = self.root else {
            return Vec::new();
        };

        let threshold = self.nodes[root].metrics[metric] / clusters.max(1) as f64;
        let mut remaining: Vec<f64> = self
            .nodes
            .iter()
            .map(|node| node.metrics[metric])
            .collect();
        let mut detached = vec![false; self.nodes.len()];
        let mut result = Vec::new();

        for level in 0..=self.nodes[root].level {
            for (position, node) in self.nodes.iter().enumerate() {
                let idx = NodeIdx::new(position);
                if node.level != level || detached[idx.get()] {
                    continue;
                }
                if remaining[idx.get()] < threshold && idx != root {
                    continue;
                }

                let items = self.attached_items(idx, &detached);
                detached[idx.get()] = true;

                let removed = remaining[idx.get()];
                let mut ancestor = node.parent;
                while let Some(parent) = ancestor {
                    remaining[parent.get()] -= removed;
                    ancestor = self.nodes[parent].parent;
                }

                if !items.is_empty() {
                    result.push(items);
                }
            }
        }

        result
    }

    fn attached_items(&self, idx: NodeIdx, detached: &[bool]) -> Vec<usize> {
        let mut items = Vec::new();
        let mut stack = vec![idx];

        while let Some(current) = stack.pop() {
            if current != idx && detached[current.get()] {
                continue;
            }
            let node = &self.nodes[current];
            if let Some(item) = node.item {
                items.push(item);
            }
            if let Some((left, right)) = node.children {
                stack.push(left);
                stack.push(right);
            }
        }

        items.sort_unstable();
        items
    }
}

fn closer(candidate: &Nearest, current: &Nearest, slot_node: &[NodeIdx]) -> bool {
    candidate.linkage < current.linkage
        || (candidate.linkage == current.linkage
            && slot_node[candidate.slot] < slot_node[current.slot])
}

fn closest_pair(
    nearest: &[Option<Nearest>],
    slot_node: &[NodeIdx],
    active: &[bool],
) -> Option<(usize, usize)> {
    let mut best: Option<(f64, NodeIdx, NodeIdx, usize, usize)> = None;

    for (slot, candidate) in nearest.iter().enumerate() {
        let Some(candidate) = candidate else {
            continue;
        };
        if !active[slot] {
            continue;
        }

        let (a, b) = (slot_node[slot], slot_node[candidate.slot]);
        let key = (candidate.linkage, a.min(b), a.max(b));
        let better = match best {
            None => true,
            Some((linkage, low, high, _, _)) => {
                key.0 < linkage || (key.0 == linkage && (key.1, key.2) < (low, high))
            }
        };
        if better {
            best = Some((key.0, key.1, key.2, slot, candidate.slot));
        }
    }

    best.map(|(_, _, _, a, b)| (a.min(b), a.max(b)))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use smallvec::smallvec;

    use super::*;

    fn line_tree(points: &[f64], metrics: Vec<Metrics>) -> ClusterTree {
        ClusterTree::average_linkage(metrics, |a, b| (points[a] - points[b]).abs())
    }

    fn unit_metrics(n: usize) -> Vec<Metrics> {
        (0..n).map(|_| smallvec![1.0]).collect()
    }

    #[test]
    fn test_merge_order_and_levels() {
        let points = [0.0, 1.0, 10.0, 11.0];
        let tree = line_tree(&points, unit_metrics(4));

        assert_eq!(tree.nodes().len(), 7);
        assert_eq!(
            tree.node(NodeIdx::new(4)).children(),
            Some((NodeIdx::new(0), NodeIdx::new(1)))
        );
        assert_eq!(
            tree.node(NodeIdx::new(5)).children(),
            Some((NodeIdx::new(2), NodeIdx::new(3)))
        );

        let root = tree.root().unwrap();
        assert_eq!(root, NodeIdx::new(6));
        assert_eq!(tree.node(root).level(), 2);
        assert_eq!(tree.node(root).size(), 4);
        assert_eq!(tree.node(root).metrics(), &[4.0]);
        assert_eq!(tree.node(NodeIdx::new(0)).parent(), Some(NodeIdx::new(4)));
    }

    #[test]
    fn test_average_linkage_uses_mean_distance() {
        // {0, 1} sits at mean distance 3.5 from 4 and 4.5 from -4.
        let points = [0.0, 1.0, 4.0, -4.0];
        let tree = line_tree(&points, unit_metrics(4));

        assert_eq!(
            tree.node(NodeIdx::new(5)).children(),
            Some((NodeIdx::new(4), NodeIdx::new(2)))
        );
    }

    #[test]
    fn test_cut_balanced() {
        let points = [0.0, 1.0, 10.0, 11.0];
        let tree = line_tree(&points, unit_metrics(4));

        assert_eq!(tree.cut(2, 0), vec![vec![0, 1], vec![2, 3]]);
        assert_eq!(tree.cut(1, 0), vec![vec![0, 1, 2, 3]]);
        assert_eq!(tree.cut(4, 0), vec![vec![0], vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_cut_on_second_metric() {
        let points = [0.0, 1.0, 10.0, 11.0, 12.0];
        let metrics: Vec<Metrics> = vec![
            smallvec![1.0, 3.0],
            smallvec![1.0, 3.0],
            smallvec![1.0, 1.0],
            smallvec![1.0, 1.0],
            smallvec![1.0, 0.0],
        ];
        let tree = line_tree(&points, metrics);

        let clusters = tree.cut(2, 1);
        assert_eq!(clusters[0], vec![0, 1]);
        assert_eq!(clusters.concat().len(), 5);
    }

    #[test]
    fn test_cut_keeps_every_item_once() {
        let points: Vec<f64> = (0..40).map(|i| ((i * 37) % 101) as f64).collect();
        let tree = line_tree(&points, unit_metrics(points.len()));

        let mut items = tree.cut(5, 0).concat();
        items.sort_unstable();

        assert_eq!(items, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_and_empty() {
        let tree = line_tree(&[0.0], unit_metrics(1));
        assert_eq!(tree.root(), Some(NodeIdx::new(0)));
        assert_eq!(tree.cut(3, 0), vec![vec![0]]);

        let tree = line_tree(&[], Vec::new());
        assert!(tree.root().is_none());
        assert!(tree.cut(3, 0).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_cut_clusters_stay_below_twice_the_share(
            weights in prop::collection::vec(0.5..5.0f64, 2..80),
            clusters in 1usize..8,
        ) {
            let points: Vec<f64> = (0..weights.len()).map(|i| ((i * 61) % 113) as f64).collect();
            let metrics: Vec<Metrics> = weights.iter().map(|&w| smallvec![w]).collect();
            let tree = line_tree(&points, metrics);
            let threshold = weights.iter().sum::<f64>() / clusters as f64;

            for cluster in tree.cut(clusters, 0) {
                let load: f64 = cluster.iter().map(|&item| weights[item]).sum();
                prop_assert!(cluster.len() == 1 || load < 2.0 * threshold + 1e-9);
            }
        }
    }
}
