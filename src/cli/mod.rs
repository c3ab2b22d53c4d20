pub mod hist;
pub mod parse;
pub mod sweep;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use dagbench::config::{Policy, SweepConfig, DEFAULT_BIN_DIR};
use dagbench::logparse::{deadline_threshold_us, DEFAULT_OUTLIER_CUTOFF_MS, DEFAULT_SAMPLE_RATE};
use dagbench::scale::DEFAULT_HISTOGRAM_BINS;

// OPTIONS SHARED BY EVERY SUBCOMMAND THAT LAUNCHES EXECUTORS
#[derive(Args, Debug, Clone)]
pub struct RunOpts {
    // POLICIES TO SWEEP, IN ORDER (COMMA SEPARATED)
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = Policy::ALL)]
    pub policies: Vec<Policy>,

    // MEASUREMENT WINDOW PER RUN IN MILLISECONDS
    #[arg(long, default_value_t = 3_000)]
    pub timeout_ms: u64,

    // DIRECTORY HOLDING seq_exec, static_sched_exec, work_stealing_exec
    #[arg(long, default_value = DEFAULT_BIN_DIR)]
    pub bin_dir: PathBuf,

    // EXECUTORS RUN HERE AND WRITE THEIR LOGS UNDER tmp/
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,

    #[command(flatten)]
    pub stats: StatOpts,
}

// OPTIONS THAT ONLY AFFECT HOW LOGS ARE REDUCED
#[derive(Args, Debug, Clone)]
pub struct StatOpts {
    // SAMPLE RATE USED TO DERIVE THE DEADLINE FROM THE BUFFER SIZE
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    // CYCLES AT OR ABOVE THIS MANY MS ARE LEFT OUT OF HISTOGRAMS
    #[arg(long, default_value_t = DEFAULT_OUTLIER_CUTOFF_MS)]
    pub outlier_cutoff_ms: u64,

    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
    pub bins: usize,
}

impl StatOpts {
    pub fn threshold(&self, buffer_size: Option<u32>) -> Result<Option<u64>> {
        buffer_size
            .map(|b| {
                deadline_threshold_us(b, self.sample_rate).context("SAMPLE RATE MUST BE NON-ZERO")
            })
            .transpose()
    }
}

impl RunOpts {
    pub fn to_config(&self, threads: u32, buffer_size: Option<u32>) -> Result<SweepConfig> {
        let config = SweepConfig {
            policies: self.policies.clone(),
            threads,
            timeout: Duration::from_millis(self.timeout_ms),
            deadline_threshold_us: self.stats.threshold(buffer_size)?,
            histogram_bins: self.stats.bins,
            outlier_cutoff_ms: self.stats.outlier_cutoff_ms,
            bin_dir: self.bin_dir.clone(),
            work_dir: self.work_dir.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

pub fn print_banner(title: &str, config: &SweepConfig) {
    let names: Vec<&str> = config.policies.iter().map(|p| p.name()).collect();
    println!("{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
    println!("THREADS:         {}", config.threads);
    println!("POLICIES:        {}", names.join(", "));
    println!("TIMEOUT:         {} ms", config.timeout.as_millis());
    match config.deadline_threshold_us {
        Some(t) => println!("DEADLINE:        {}µs", t),
        None => println!("DEADLINE:        (NO BUFFER SIZE, MISSES NOT COUNTED)"),
    }
    println!("BIN DIR:         {}", config.bin_dir.display());
    println!("WORK DIR:        {}", config.work_dir.display());
}
