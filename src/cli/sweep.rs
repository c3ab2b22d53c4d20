use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Result};
use clap::Args;

use dagbench::report::{comparison_report, save_report};
use dagbench::runner::ProcessExecutor;
use dagbench::sweep::{discover_inputs, Driver};

use super::{print_banner, RunOpts};

#[derive(Args, Debug)]
pub struct SweepArgs {
    // DAG FILE OR DIRECTORY OF DAG FILES
    pub input: PathBuf,

    pub threads: u32,

    // AUDIO BUFFER SIZE: ENABLES DEADLINE-MISS COUNTING
    pub buffer_size: Option<u32>,

    // ALSO WRITE THE REPORT TO <work-dir>/tmp/sweep-<stamp>.log
    #[arg(long)]
    pub save: bool,

    #[command(flatten)]
    pub run: RunOpts,
}

pub fn run_sweep(args: &SweepArgs, shutdown: &AtomicBool) -> Result<()> {
    let config = args.run.to_config(args.threads, args.buffer_size)?;
    let inputs = discover_inputs(&args.input)?;
    if inputs.is_empty() {
        bail!("NO INPUT FILES IN {}", args.input.display());
    }

    print_banner("DAGBENCH SWEEP", &config);
    println!("INPUT:           {} ({} FILES)", args.input.display(), inputs.len());
    println!();

    let mut driver = Driver::new(config.clone(), ProcessExecutor::new(&config));
    let report = driver.sweep(&inputs, shutdown);

    let lines = comparison_report(&report, config.deadline_threshold_us);
    for line in &lines {
        println!("{}", line);
    }

    if args.save {
        let path = save_report(&config.work_dir.join("tmp"), "sweep", &lines)?;
        println!("\nSAVED TO {}", path.display());
    }
    Ok(())
}
