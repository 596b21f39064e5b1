use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context;
use atlas_optimizer::{pipeline, problem::vehicle_routing_problem::VehicleRoutingProblem};
use clap::Args;
use comfy_table::Table;
use tracing::info;

use crate::file_utils;

#[derive(Args)]
pub struct SplitArgs {
    /// The problem file to split
    #[arg(short, long)]
    input: PathBuf,

    /// Output folder of the parts and of their cluster hulls
    #[arg(short, long)]
    output: PathBuf,
}

pub fn run(args: SplitArgs) -> anyhow::Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("cannot open {}", args.input.display()))?;
    let problem: VehicleRoutingProblem = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse {}", args.input.display()))?;
    let problem_id = problem.id().to_owned();

    let result = pipeline::split(problem);
    info!(problem = %problem_id, parts = result.work_items.len(), "problem split");

    let mut table = Table::new();
    table.set_header(vec!["part", "services", "vehicles", "depth"]);
    for (index, work_item) in result.work_items.iter().enumerate() {
        let part = work_item.problem();
        table.add_row(vec![
            part.id().to_owned(),
            part.services().len().to_string(),
            part.vehicles().len().to_string(),
            work_item.depth().to_string(),
        ]);
        file_utils::write_json(&args.output.join(format!("part_{index}.json")), part)?;
    }
    println!("{table}");

    if !result.debug.is_empty() {
        file_utils::write_json(
            &args.output.join("clusters.geojson"),
            &result.debug.into_geojson(),
        )?;
    }

    Ok(())
}
