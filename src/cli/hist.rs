use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Result};
use clap::Args;

use dagbench::report::{histogram_chart, run_summary, save_report, separator};
use dagbench::runner::ProcessExecutor;
use dagbench::sweep::{Driver, SeriesEntry};

use super::{print_banner, RunOpts};

#[derive(Args, Debug)]
pub struct HistArgs {
    // ONE DAG FILE
    pub input: PathBuf,

    pub threads: u32,

    pub buffer_size: Option<u32>,

    // ROWS PER CHART
    #[arg(long, default_value_t = 8)]
    pub height: usize,

    #[arg(long)]
    pub save: bool,

    #[command(flatten)]
    pub run: RunOpts,
}

pub fn run_hist(args: &HistArgs, shutdown: &AtomicBool) -> Result<()> {
    if !args.input.is_file() {
        bail!("INPUT {} IS NOT A FILE", args.input.display());
    }
    let config = args.run.to_config(args.threads, args.buffer_size)?;

    print_banner("DAGBENCH CYCLE-TIME HISTOGRAMS", &config);
    println!("INPUT:           {}", args.input.display());
    println!();

    let mut driver = Driver::new(config.clone(), ProcessExecutor::new(&config));
    let report = driver.sweep(std::slice::from_ref(&args.input), shutdown);
    if report.points.is_empty() {
        bail!("INTERRUPTED BEFORE ANY RUN");
    }

    let bounds = report.scale_at(0, config.histogram_bins);
    let mut lines = vec![
        separator(),
        format!(
            "SHARED SCALE: X 0..{}ms  Y 0..{}",
            bounds.max_time_ms, bounds.max_bin_count
        ),
        separator(),
    ];

    for s in &report.series {
        lines.push(String::new());
        match s.entries().first() {
            Some(SeriesEntry::Measured { stats, partial }) => {
                let source = format!(
                    "{}{}",
                    config.log_path(s.policy()).display(),
                    if *partial { " (PARTIAL)" } else { "" }
                );
                lines.extend(run_summary(&source, stats));
                lines.extend(histogram_chart(
                    s.policy().title(),
                    &stats.histogram_ms,
                    bounds,
                    config.histogram_bins,
                    args.height,
                ));
            }
            Some(SeriesEntry::Missing(reason)) => {
                lines.push(format!("{}: {}", s.policy().title(), reason.label()));
            }
            None => {}
        }
    }

    for line in &lines {
        println!("{}", line);
    }
    if args.save {
        let path = save_report(&config.work_dir.join("tmp"), "hist", &lines)?;
        println!("\nSAVED TO {}", path.display());
    }
    Ok(())
}
