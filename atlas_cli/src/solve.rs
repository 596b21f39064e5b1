use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use atlas_optimizer::{
    job_manager::{Job, JobManager, JobStatus},
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solution::solution::Solution,
    wrappers::{SolverKind, settings::SolverSettings},
};
use clap::Args;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::{file_utils, parsers};

#[derive(Args)]
pub struct SolveArgs {
    /// A problem file, or a folder of them
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long, default_value = "ortools")]
    solver: SolverKind,

    /// Overrides the time limit of every problem (e.g., "30s", "5m", "PT1H30M")
    #[arg(short, long, value_parser = parsers::parse_duration)]
    duration: Option<jiff::SignedDuration>,

    /// Solution file, or folder of .solution.json files when solving a folder
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Cluster hulls file, or folder of .clusters.geojson files when solving a folder
    #[arg(long)]
    debug_geojson: Option<PathBuf>,

    /// Overrides ATLAS_ORTOOLS_EXEC
    #[arg(long)]
    ortools_exec: Option<PathBuf>,

    /// Overrides ATLAS_VROOM_EXEC
    #[arg(long)]
    vroom_exec: Option<PathBuf>,

    /// Overrides ATLAS_TMP_DIR
    #[arg(long)]
    tmp_dir: Option<PathBuf>,
}

impl SolveArgs {
    fn settings(&self) -> SolverSettings {
        let mut settings = SolverSettings::from_env();
        if let Some(exec) = &self.ortools_exec {
            settings.ortools_exec = exec.clone();
        }
        if let Some(exec) = &self.vroom_exec {
            settings.vroom_exec = exec.clone();
        }
        if let Some(tmp_dir) = &self.tmp_dir {
            settings.tmp_dir = Some(tmp_dir.clone());
        }
        settings
    }
}

/// `target` itself for a single problem, a file named after the problem in
/// `target` otherwise.
fn output_path(target: &Path, batch: bool, name: &str, extension: &str) -> PathBuf {
    if batch {
        target.join(format!("{name}.{extension}"))
    } else {
        target.to_path_buf()
    }
}

fn read_problem(path: &Path) -> anyhow::Result<VehicleRoutingProblem> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let problem = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse {}", path.display()))?;
    Ok(problem)
}

fn progress_bar(name: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.enable_steady_tick(Duration::from_millis(200));
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {prefix} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_prefix(name.to_owned());
    bar.set_message("pending...");
    bar
}

/// Waits for the job, killing it on Ctrl-C.
async fn follow(job: &Job, bar: &ProgressBar) -> JobStatus {
    let finished = job.finished();
    tokio::pin!(finished);
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            status = &mut finished => return status,
            _ = tokio::signal::ctrl_c() => {
                warn!(job = job.id(), "interrupted, killing solver");
                job.stop();
            }
            _ = ticker.tick() => {
                if let Some(progress) = job.progress() {
                    bar.set_message(format!(
                        "running... iterations = {}, cost = {}",
                        progress.iterations.map_or(String::from("-"), |i| i.to_string()),
                        progress.cost.map_or(String::from("-"), |c| format!("{c:.2}")),
                    ));
                }
            }
        }
    }
}

fn summary(solution: &Solution) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["vehicle", "services", "duration (s)", "distance (m)", "cost"]);
    for route in solution.routes.iter().filter(|route| route.has_services()) {
        table.add_row(vec![
            route.vehicle_id.clone(),
            route.service_ids().count().to_string(),
            route
                .details
                .total_time
                .map_or(String::from("-"), |time| time.to_string()),
            route
                .details
                .total_distance
                .map_or(String::from("-"), |distance| format!("{distance:.0}")),
            format!("{:.2}", route.cost_details.total()),
        ]);
    }
    table
}

pub async fn run(args: SolveArgs) -> anyhow::Result<()> {
    let manager = JobManager::new(args.settings());

    let paths = file_utils::problem_files(&args.input)?;
    let batch = args.input.is_dir();

    for path in paths {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("problem"));

        let mut problem = read_problem(&path)?;
        if let Some(duration) = args.duration {
            problem.configuration_mut().resolution.duration = Some(duration);
        }

        let job_id = manager.submit(problem, args.solver).await;
        let job = manager
            .job(&job_id)
            .await
            .context("job vanished before it started")?;

        let bar = progress_bar(&name);
        let status = follow(&job, &bar).await;
        bar.finish_and_clear();

        match status {
            JobStatus::Completed => {}
            JobStatus::Killed => {
                info!(problem = %name, "solve killed");
                break;
            }
            _ => {
                let error = job.error().unwrap_or_default();
                warn!(problem = %name, %error, "solve failed");
                continue;
            }
        }

        let Some(solution) = job.solution() else {
            continue;
        };
        info!(
            problem = %name,
            cost = solution.cost,
            routes = solution.non_empty_routes_count(),
            unassigned = solution.unassigned.len(),
            elapsed = %solution.elapsed,
            "solved"
        );
        println!("{}", summary(&solution));

        if let Some(output) = &args.output {
            let path = output_path(output, batch, &name, "solution.json");
            file_utils::write_json(&path, &solution)?;
        }
        if let Some(debug_geojson) = &args.debug_geojson {
            let path = output_path(debug_geojson, batch, &name, "clusters.geojson");
            file_utils::write_json(&path, &job.debug().into_geojson())?;
        }

        manager.remove(&job_id).await;
    }

    Ok(())
}
