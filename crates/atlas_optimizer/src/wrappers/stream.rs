use std::sync::LazyLock;

use jiff::SignedDuration;
use regex::Regex;
use tracing::{Level, debug, info, warn};

use crate::solution::progress::Progress;

static ITERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Iteration : ([0-9]+)").expect("valid regex"));
static COST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" Cost : ([0-9.eE+]+)").expect("valid regex"));
static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Time : ([0-9.eE+]+)").expect("valid regex"));
static BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Final Iteration :|First solution strategy :|Using the provided initial solution\.|OR-Tools v[0-9]+\.[0-9]+$",
    )
    .expect("valid regex")
});

/// Last line printed by a solver that could not build any solution.
pub const NO_SOLUTION_MARKER: &str = "No solution found...";

/// Tokens found on one line of solver output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineTokens {
    pub iteration: Option<u64>,
    pub cost: Option<f64>,
    /// Milliseconds since the solver started.
    pub time: Option<f64>,
    pub is_final: bool,
    pub is_banner: bool,
}

impl LineTokens {
    pub fn parse(line: &str) -> Self {
        let capture = |regex: &Regex| {
            regex
                .captures(line)
                .and_then(|captures| captures.get(1))
                .map(|value| value.as_str())
        };

        LineTokens {
            iteration: capture(&ITERATION).and_then(|value| value.parse().ok()),
            cost: capture(&COST).and_then(|value| value.parse().ok()),
            time: capture(&TIME).and_then(|value| value.parse().ok()),
            is_final: line.contains("Final Iteration :"),
            is_banner: BANNER.is_match(line),
        }
    }

    fn has_tokens(&self) -> bool {
        self.iteration.is_some() || self.cost.is_some() || self.time.is_some()
    }

    /// An iteration was reported together with its time.
    pub fn is_progress(&self) -> bool {
        self.iteration.is_some() && self.time.is_some()
    }

    /// Whether the result file is worth decoding after this line.
    pub fn wants_partial_solution(&self, intermediate_solutions: bool) -> bool {
        intermediate_solutions && self.cost.is_some() && !self.is_final
    }

    pub fn level(&self) -> Level {
        if self.is_banner {
            Level::INFO
        } else if self.has_tokens() {
            Level::DEBUG
        } else {
            Level::WARN
        }
    }
}

/// Running values of a solver, updated line after line.
#[derive(Debug, Default)]
pub struct OutputTracker {
    iterations: Option<u64>,
    cost: Option<f64>,
    elapsed: Option<SignedDuration>,
}

impl OutputTracker {
    /// Records the tokens of a line, returning the progress to report when
    /// the line is an iteration report.
    pub fn observe(&mut self, line: &str) -> (LineTokens, Option<Progress>) {
        let tokens = LineTokens::parse(line);
        let level = tokens.level();
        if level == Level::INFO {
            info!(target: "solver", "{}", line.trim());
        } else if level == Level::DEBUG {
            debug!(target: "solver", "{}", line.trim());
        } else {
            warn!(target: "solver", "{}", line.trim());
        }

        self.iterations = tokens.iteration.or(self.iterations);
        self.cost = tokens.cost.or(self.cost);
        if let Some(time) = tokens.time {
            self.elapsed = SignedDuration::try_from_secs_f64(time / 1000.0).ok();
        }

        let progress = tokens.is_progress().then(|| Progress {
            iterations: self.iterations,
            cost: self.cost,
            elapsed: self.elapsed,
            solution: None,
        });

        (tokens, progress)
    }

    pub fn iterations(&self) -> Option<u64> {
        self.iterations
    }

    pub fn cost(&self) -> Option<f64> {
        self.cost
    }
}
