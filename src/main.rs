// DAGBENCH -- DAG SCHEDULING POLICY COMPARISON
// DRIVES THE SEQUENTIAL / STATIC (RAND, HLFET, ETF) / WORK-STEALING EXECUTORS,
// PARSES THEIR CYCLE LOGS, AND REPORTS THEM SIDE BY SIDE ON SHARED SCALES.
//
// SINGLE-THREADED: ONE (INPUT, POLICY) RUN IS FULLY PARSED AND RECORDED
// BEFORE THE NEXT ONE STARTS.

mod cli;

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[command(name = "dagbench")]
#[command(about = "DAGBENCH -- DAG SCHEDULING POLICY COMPARISON")]
struct Cli {
    // DEBUG DIAGNOSTICS ON STDERR (RUST_LOG TAKES PRECEDENCE)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "RUN EVERY POLICY ON EVERY INPUT, COMPARE AVERAGE, WORST AND MISSES")]
    Sweep(cli::sweep::SweepArgs),
    #[command(about = "RUN EVERY POLICY ON ONE INPUT, DRAW HISTOGRAMS ON A SHARED SCALE")]
    Hist(cli::hist::HistArgs),
    #[command(about = "REDUCE EXISTING LOG FILES WITHOUT RUNNING ANYTHING")]
    Parse(cli::parse::ParseArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // FIRST CTRL+C STOPS THE RUNNING EXECUTOR AND ENDS THE SWEEP AT THE
    // NEXT INPUT BOUNDARY. THE REPORT STILL PRINTS.
    ctrlc::set_handler(move || {
        SHUTDOWN.store(true, Ordering::Relaxed);
    })?;

    match &cli.command {
        Command::Sweep(args) => cli::sweep::run_sweep(args, &SHUTDOWN)?,
        Command::Hist(args) => cli::hist::run_hist(args, &SHUTDOWN)?,
        Command::Parse(args) => cli::parse::run_parse(args)?,
    }

    if SHUTDOWN.load(Ordering::Relaxed) {
        println!("DAGBENCH INTERRUPTED.");
    }
    Ok(())
}
