use jiff::SignedDuration;

use super::solution::Solution;

/// Progress reported by a running solver.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub iterations: Option<u64>,
    pub cost: Option<f64>,
    pub elapsed: Option<SignedDuration>,
    /// Decoded intermediate solution, when requested.
    pub solution: Option<Solution>,
}

pub type ProgressCallback<'a> = dyn FnMut(&Progress) + Send + 'a;
