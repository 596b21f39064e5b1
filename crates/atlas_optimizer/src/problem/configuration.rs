use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub preprocessing: Preprocessing,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub restitution: Restitution,
    #[serde(default)]
    pub schedule: Option<Schedule>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Preprocessing {
    /// Problems with more services than this are split before solving.
    #[serde(default)]
    pub max_split_size: Option<usize>,
    #[serde(default)]
    pub partition: Option<Partition>,
    #[serde(default)]
    pub first_solution_strategy: Vec<FirstSolutionStrategy>,
    #[serde(default)]
    pub neighbourhood_size: Option<u32>,
    #[serde(default)]
    pub prefer_short_segment: bool,
}

impl Preprocessing {
    /// Sub-problems are solved as-is.
    pub fn clear_partitioning(&mut self) {
        self.max_split_size = None;
        self.partition = None;
    }
}

fn default_days() -> usize {
    5
}

fn default_epsilon() -> f64 {
    4_000.0
}

fn default_min_points() -> usize {
    4
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Partition {
    /// Average-linkage tree cut into `vehicles * days` duration-balanced clusters.
    Hierarchical {
        #[serde(default = "default_days")]
        days: usize,
    },
    /// Average-linkage tree cut on a named unit or on duration.
    RoadBlackBox {
        metric: CutSymbol,
        #[serde(default)]
        entity: Option<PartitionEntity>,
        #[serde(default)]
        clusters: Option<usize>,
    },
    /// Density clusters solved independently then repaired by a second pass.
    Density {
        #[serde(default = "default_epsilon")]
        epsilon: f64,
        #[serde(default = "default_min_points")]
        min_points: usize,
    },
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CutSymbol {
    Duration,
    Visits,
    Unit(String),
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartitionEntity {
    Vehicle,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FirstSolutionStrategy {
    SelfSelection,
    PathCheapestArc,
    GlobalCheapestArc,
    LocalCheapestInsertion,
    Savings,
    ParallelCheapestInsertion,
    FirstUnbound,
    Christofides,
}

impl FirstSolutionStrategy {
    /// Code understood by the or-tools wrapper, `None` lets the solver choose.
    pub fn code(&self) -> Option<u32> {
        match self {
            FirstSolutionStrategy::SelfSelection => None,
            FirstSolutionStrategy::PathCheapestArc => Some(0),
            FirstSolutionStrategy::GlobalCheapestArc => Some(1),
            FirstSolutionStrategy::LocalCheapestInsertion => Some(2),
            FirstSolutionStrategy::Savings => Some(3),
            FirstSolutionStrategy::ParallelCheapestInsertion => Some(4),
            FirstSolutionStrategy::FirstUnbound => Some(5),
            FirstSolutionStrategy::Christofides => Some(6),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Resolution {
    #[serde(default)]
    pub duration: Option<SignedDuration>,
    #[serde(default)]
    pub minimum_duration: Option<SignedDuration>,
    #[serde(default)]
    pub initial_time_out: Option<SignedDuration>,
    #[serde(default)]
    pub time_out_multiplier: Option<f64>,
    #[serde(default)]
    pub iterations_without_improvement: Option<u64>,
    #[serde(default)]
    pub init_duration: Option<SignedDuration>,
    #[serde(default)]
    pub vehicle_limit: Option<usize>,
    #[serde(default)]
    pub evaluate_only: bool,
    #[serde(default)]
    pub batch_heuristic: bool,
}

impl Resolution {
    /// Scales the time budgets by `ratio`, used when a problem is split.
    pub fn apportion(&mut self, ratio: f64) {
        let scale = |duration: SignedDuration| {
            SignedDuration::from_millis((duration.as_millis() as f64 * ratio).ceil() as i64)
        };

        self.duration = self.duration.map(scale);
        self.minimum_duration = self.minimum_duration.map(scale);
        self.initial_time_out = self.initial_time_out.map(scale);
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Restitution {
    #[serde(default)]
    pub intermediate_solutions: bool,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleRange {
    pub start: u32,
    pub end: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Schedule {
    #[serde(default)]
    pub range_indices: Option<ScheduleRange>,
}

impl Configuration {
    pub fn has_schedule_range(&self) -> bool {
        self.schedule
            .as_ref()
            .is_some_and(|schedule| schedule.range_indices.is_some())
    }
}
