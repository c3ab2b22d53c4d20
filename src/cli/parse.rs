// OFFLINE MODE: REDUCE EXISTING LOGS WITHOUT LAUNCHING ANYTHING

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use tracing::warn;

use dagbench::logparse::{parse_file, ParseOptions};
use dagbench::report::{histogram_chart, run_summary};
use dagbench::scale::shared_scale;

use super::StatOpts;

#[derive(Args, Debug)]
pub struct ParseArgs {
    // LOG FILES (*.gz ACCEPTED)
    #[arg(required = true)]
    pub logs: Vec<PathBuf>,

    #[arg(long)]
    pub buffer_size: Option<u32>,

    // DRAW A HISTOGRAM PER LOG ON THE SHARED SCALE
    #[arg(long)]
    pub chart: bool,

    #[arg(long, default_value_t = 8)]
    pub height: usize,

    #[command(flatten)]
    pub stats: StatOpts,
}

pub fn run_parse(args: &ParseArgs) -> Result<()> {
    let options = ParseOptions {
        deadline_threshold_us: args.stats.threshold(args.buffer_size)?,
        outlier_cutoff_ms: args.stats.outlier_cutoff_ms,
    };

    let mut parsed = Vec::new();
    for path in &args.logs {
        match parse_file(path, options) {
            Ok(stats) => {
                for line in run_summary(&path.display().to_string(), &stats) {
                    println!("{}", line);
                }
                println!();
                parsed.push((path, stats));
            }
            Err(e) => {
                warn!("{}", e);
                println!("RESULTS FOR {}", path.display());
                println!("  MISSING DATA ({})", e);
                println!();
            }
        }
    }

    if parsed.is_empty() {
        bail!("NO LOG CONTAINED CYCLE MEASUREMENTS");
    }

    let hists: Vec<&[f64]> = parsed.iter().map(|(_, s)| s.histogram_ms.as_slice()).collect();
    let bounds = shared_scale(&hists, args.stats.bins);
    println!(
        "SHARED SCALE:    X 0..{}ms  Y 0..{}  ({} BINS)",
        bounds.max_time_ms, bounds.max_bin_count, args.stats.bins
    );

    if args.chart {
        for (path, stats) in &parsed {
            println!();
            let title = path.display().to_string();
            for line in histogram_chart(&title, &stats.histogram_ms, bounds, args.stats.bins, args.height) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
