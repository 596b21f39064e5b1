use tracing::debug;

pub const MAX_ITERATIONS: usize = 100;

/// K-means where each centroid is the medoid of its cluster.
///
/// Initial centroids are the first `clusters` items at distinct positions, so
/// the same input always produces the same partition. Empty clusters are
/// dropped from the result.
#[derive(Debug, Clone, Copy)]
pub struct KMeans {
    clusters: usize,
    max_iterations: usize,
}

impl KMeans {
    pub fn new(clusters: usize) -> Self {
        KMeans {
            clusters,
            max_iterations: MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Returns groups of item indices, each sorted ascending.
    pub fn cluster<T, D>(&self, items: &[T], distance: D) -> Vec<Vec<usize>>
    where
        D: Fn(&T, &T) -> f64,
    {
        if items.is_empty() || self.clusters == 0 {
            return Vec::new();
        }

        let mut centroids: Vec<usize> = Vec::with_capacity(self.clusters);
        for index in 0..items.len() {
            if centroids.len() == self.clusters {
                break;
            }
            if centroids
                .iter()
                .all(|&centroid| distance(&items[centroid], &items[index]) > 0.0)
            {
                centroids.push(index);
            }
        }

        let mut groups = assign(items, &centroids, &distance);
        for iteration in 0..self.max_iterations {
            let next_centroids: Vec<usize> = groups
                .iter()
                .map(|members| medoid(items, members, &distance))
                .collect();

            if next_centroids == centroids {
                debug!(iteration, "k-means converged");
                break;
            }

            centroids = next_centroids;
            groups = assign(items, &centroids, &distance);
        }

        groups
    }
}

fn assign<T, D>(items: &[T], centroids: &[usize], distance: &D) -> Vec<Vec<usize>>
where
    D: Fn(&T, &T) -> f64,
{
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); centroids.len()];

    for (index, item) in items.iter().enumerate() {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (group, &centroid) in centroids.iter().enumerate() {
            let d = distance(item, &items[centroid]);
            if d < best_distance {
                best = group;
                best_distance = d;
            }
        }
        groups[best].push(index);
    }

    groups.retain(|members| !members.is_empty());
    groups
}

/// Member minimising the sum of squared distances to the other members.
fn medoid<T, D>(items: &[T], members: &[usize], distance: &D) -> usize
where
    D: Fn(&T, &T) -> f64,
{
    let mut best = members[0];
    let mut best_score = f64::INFINITY;

    for &candidate in members {
        let score: f64 = members
            .iter()
            .map(|&other| {
                let d = distance(&items[candidate], &items[other]);
                d * d
            })
            .sum();

        if score < best_score {
            best = candidate;
            best_score = score;
        }
    }

    best
}
