use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use rayon::prelude::*;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbscanClusters {
    pub clusters: Vec<Vec<usize>>,
    pub noise: Vec<usize>,
}

/// Density-based clustering.
///
/// A neighbourhood contains the point itself, so `min_points = 1` turns every
/// point into a core point.
#[derive(Debug, Clone, Copy)]
pub struct Dbscan {
    epsilon: f64,
    min_points: usize,
}

impl Dbscan {
    pub fn new(epsilon: f64, min_points: usize) -> Self {
        Dbscan {
            epsilon,
            min_points,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Clusters `len` items.
    ///
    /// `admits(members, candidate)` is asked before a reachable item joins a
    /// cluster; a refused item stays free for a later cluster or ends as noise.
    pub fn cluster<D, A>(&self, len: usize, distance: D, mut admits: A) -> DbscanClusters
    where
        D: Fn(usize, usize) -> f64 + Sync,
        A: FnMut(&[usize], usize) -> bool,
    {
        let neighbourhoods: Vec<Vec<usize>> = (0..len)
            .into_par_iter()
            .map(|point| {
                (0..len)
                    .filter(|&other| other == point || distance(point, other) <= self.epsilon)
                    .collect()
            })
            .collect();

        let mut visited = FixedBitSet::with_capacity(len);
        let mut assigned = FixedBitSet::with_capacity(len);
        let mut clusters = Vec::new();

        for point in 0..len {
            if visited.contains(point) || assigned.contains(point) {
                continue;
            }
            visited.insert(point);

            if neighbourhoods[point].len() < self.min_points {
                continue;
            }

            let mut members = vec![point];
            assigned.insert(point);

            let mut queue: VecDeque<usize> = neighbourhoods[point]
                .iter()
                .copied()
                .filter(|&other| other != point)
                .collect();

            while let Some(candidate) = queue.pop_front() {
                if assigned.contains(candidate) || !admits(&members, candidate) {
                    continue;
                }

                members.push(candidate);
                assigned.insert(candidate);

                if !visited.contains(candidate) {
                    visited.insert(candidate);
                    if neighbourhoods[candidate].len() >= self.min_points {
                        queue.extend(
                            neighbourhoods[candidate]
                                .iter()
                                .copied()
                                .filter(|&other| !assigned.contains(other)),
                        );
                    }
                }
            }

            members.sort_unstable();
            clusters.push(members);
        }

        let noise = (0..len).filter(|&point| !assigned.contains(point)).collect();

        DbscanClusters { clusters, noise }
    }
}
