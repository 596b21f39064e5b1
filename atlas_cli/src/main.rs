use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{solve::SolveArgs, split::SplitArgs};

mod file_utils;
mod parsers;
mod solve;
mod split;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solves problems with an external solver
    Solve {
        #[command(flatten)]
        args: SolveArgs,
    },
    /// Writes the parts a problem would be solved in, without solving them
    Split {
        #[command(flatten)]
        args: SplitArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Some(Commands::Solve { args }) => solve::run(args).await?,
        Some(Commands::Split { args }) => split::run(args)?,
        None => {}
    }

    Ok(())
}
