use std::{collections::HashMap, sync::Arc};

use jiff::Timestamp;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{RwLock as AsyncRwLock, watch};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    partition::debug::ClusterDebug,
    pipeline::{Optimizer, PipelineOutput},
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solution::{progress::Progress, solution::Solution},
    wrappers::{
        Solver, SolveOutcome, SolverKind, kill_handle::KillHandle, settings::SolverSettings,
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Killed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Killed | JobStatus::Failed
        )
    }
}

/// One submitted problem and everything known about its resolution.
pub struct Job {
    id: String,
    solver: SolverKind,
    status: watch::Sender<JobStatus>,
    kill: KillHandle,
    progress: RwLock<Option<Progress>>,
    solution: RwLock<Option<Solution>>,
    debug: RwLock<ClusterDebug>,
    error: RwLock<Option<String>>,
    created_at: Timestamp,
}

impl Job {
    fn new(id: String, solver: SolverKind) -> Self {
        Job {
            id,
            solver,
            status: watch::Sender::new(JobStatus::Pending),
            kill: KillHandle::new(),
            progress: RwLock::new(None),
            solution: RwLock::new(None),
            debug: RwLock::new(ClusterDebug::default()),
            error: RwLock::new(None),
            created_at: Timestamp::now(),
        }
    }

    fn run(&self, optimizer: &Optimizer, problem: VehicleRoutingProblem) {
        self.status.send_replace(JobStatus::Running);
        info!(job = %self.id, solver = %self.solver, "job started");

        let mut on_progress = |progress: &Progress| {
            if let Some(solution) = &progress.solution {
                *self.solution.write() = Some(solution.clone());
            }
            *self.progress.write() = Some(Progress {
                iterations: progress.iterations,
                cost: progress.cost,
                elapsed: progress.elapsed,
                solution: None,
            });
        };

        let status = match optimizer.solve(problem, &self.kill, &mut on_progress) {
            Ok(PipelineOutput { outcome, debug }) => {
                *self.debug.write() = debug;
                match outcome {
                    SolveOutcome::Completed(solution) => {
                        *self.solution.write() = Some(solution);
                        JobStatus::Completed
                    }
                    SolveOutcome::Killed => JobStatus::Killed,
                }
            }
            Err(err) => {
                error!(job = %self.id, error = %err, "job failed");
                *self.error.write() = Some(err.to_string());
                JobStatus::Failed
            }
        };

        info!(job = %self.id, ?status, "job finished");
        self.status.send_replace(status);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn solver(&self) -> SolverKind {
        self.solver
    }

    pub fn status(&self) -> JobStatus {
        *self.status.borrow()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Latest progress reported by the running solver.
    pub fn progress(&self) -> Option<Progress> {
        self.progress.read().clone()
    }

    /// The final solution, or the latest intermediate one while running.
    pub fn solution(&self) -> Option<Solution> {
        self.solution.read().clone()
    }

    pub fn debug(&self) -> ClusterDebug {
        self.debug.read().clone()
    }

    pub fn error(&self) -> Option<String> {
        self.error.read().clone()
    }

    /// Kills the solver processes of the job, if any are running.
    pub fn stop(&self) {
        self.kill.kill();
    }

    /// Waits until the job has completed, failed or been killed.
    pub async fn finished(&self) -> JobStatus {
        let mut receiver = self.status.subscribe();
        match receiver.wait_for(JobStatus::is_finished).await {
            Ok(status) => *status,
            Err(_) => self.status(),
        }
    }
}

/// Registry of the jobs of the process, each solved on its own blocking task.
#[derive(Default)]
pub struct JobManager {
    settings: SolverSettings,
    jobs: AsyncRwLock<HashMap<String, Arc<Job>>>,
}

impl JobManager {
    pub fn new(settings: SolverSettings) -> Self {
        JobManager {
            settings,
            jobs: AsyncRwLock::new(HashMap::new()),
        }
    }

    pub async fn submit(&self, problem: VehicleRoutingProblem, kind: SolverKind) -> String {
        let job_id = Uuid::new_v4().to_string();
        let job = Arc::new(Job::new(job_id.clone(), kind));
        self.jobs
            .write()
            .await
            .insert(job_id.clone(), Arc::clone(&job));

        let optimizer = Optimizer::new(Solver::new(kind, self.settings.clone()));
        tokio::task::spawn_blocking(move || job.run(&optimizer, problem));

        job_id
    }

    pub async fn job(&self, job_id: &str) -> Option<Arc<Job>> {
        self.jobs.read().await.get(job_id).cloned()
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).map(|job| job.status())
    }

    pub async fn solution(&self, job_id: &str) -> Option<Solution> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .and_then(|job| job.solution())
    }

    /// Kills a job, returning whether it exists. The job stays registered
    /// until removed.
    pub async fn stop(&self, job_id: &str) -> bool {
        match self.jobs.read().await.get(job_id) {
            Some(job) => {
                job.stop();
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, job_id: &str) -> Option<Arc<Job>> {
        let job = self.jobs.write().await.remove(job_id)?;
        job.stop();
        Some(job)
    }

    pub async fn job_ids(&self) -> Vec<String> {
        let mut job_ids: Vec<String> = self.jobs.read().await.keys().cloned().collect();
        job_ids.sort();
        job_ids
    }
}
