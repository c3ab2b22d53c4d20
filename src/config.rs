// DAGBENCH SWEEP CONFIGURATION
// PURE-RUST MODULE: POLICIES, DEFAULTS, VALIDATION
// ONE CONFIG DRIVES EVERY SWEEP. NO PER-POLICY COPIES OF THE PIPELINE.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use clap::ValueEnum;

use crate::logparse::{ParseOptions, DEFAULT_OUTLIER_CUTOFF_MS};
use crate::scale::DEFAULT_HISTOGRAM_BINS;

// EACH RUN IS AN AUDIO LOOP THAT NEVER EXITS ON ITS OWN. THE TIMEOUT IS THE
// MEASUREMENT WINDOW, NOT A FAILURE BOUND.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

pub const DEFAULT_BIN_DIR: &str = "target/release";
pub const DEFAULT_THREADS: u32 = 4;

// POLICY
// EACH POLICY IS ONE EXECUTOR INVOCATION WITH A WELL-KNOWN LOG PATH

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, ValueEnum)]
pub enum Policy {
    #[value(name = "seq")]
    Sequential,
    #[value(name = "rand")]
    StaticRandom,
    #[value(name = "hlfet")]
    StaticHlfet,
    #[value(name = "etf")]
    StaticEtf,
    #[value(name = "ws")]
    WorkStealing,
}

impl Policy {
    pub const ALL: [Policy; 5] = [
        Policy::Sequential,
        Policy::StaticRandom,
        Policy::StaticHlfet,
        Policy::StaticEtf,
        Policy::WorkStealing,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Sequential => "seq",
            Self::StaticRandom => "rand",
            Self::StaticHlfet => "hlfet",
            Self::StaticEtf => "etf",
            Self::WorkStealing => "ws",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Sequential => "SEQUENTIAL",
            Self::StaticRandom => "RANDOM STATIC",
            Self::StaticHlfet => "HLFET",
            Self::StaticEtf => "ETF",
            Self::WorkStealing => "WORK STEALING",
        }
    }

    pub fn executable(self) -> &'static str {
        match self {
            Self::Sequential => "seq_exec",
            Self::StaticRandom | Self::StaticHlfet | Self::StaticEtf => "static_sched_exec",
            Self::WorkStealing => "work_stealing_exec",
        }
    }

    // LOG WRITTEN BY THE EXECUTOR, RELATIVE TO ITS WORKING DIRECTORY
    pub fn log_file(self) -> &'static str {
        match self {
            Self::Sequential => "tmp/seq_log.txt",
            Self::StaticRandom => "tmp/static_rand_sched_log.txt",
            Self::StaticHlfet => "tmp/static_hlfet_sched_log.txt",
            Self::StaticEtf => "tmp/static_etf_sched_log.txt",
            Self::WorkStealing => "tmp/work_stealing_log.txt",
        }
    }

    // POSITIONAL ARGUMENTS: INPUT, THEN THREAD COUNT AND STATIC HEURISTIC
    // WHERE THE EXECUTOR TAKES THEM
    pub fn args(self, input: &Path, threads: u32) -> Vec<OsString> {
        let mut args = vec![input.as_os_str().to_os_string()];
        match self {
            Self::Sequential => {}
            Self::WorkStealing => args.push(threads.to_string().into()),
            Self::StaticRandom | Self::StaticHlfet | Self::StaticEtf => {
                args.push(threads.to_string().into());
                args.push(self.name().into());
            }
        }
        args
    }
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    // SWEPT IN THIS ORDER FOR EVERY INPUT
    pub policies: Vec<Policy>,
    pub threads: u32,
    pub timeout: Duration,
    pub deadline_threshold_us: Option<u64>,
    pub histogram_bins: usize,
    pub outlier_cutoff_ms: u64,
    // WHERE THE EXECUTOR BINARIES LIVE
    pub bin_dir: PathBuf,
    // EXECUTORS RUN HERE AND WRITE THEIR LOGS UNDER tmp/
    pub work_dir: PathBuf,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            policies: Policy::ALL.to_vec(),
            threads: DEFAULT_THREADS,
            timeout: DEFAULT_TIMEOUT,
            deadline_threshold_us: None,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            outlier_cutoff_ms: DEFAULT_OUTLIER_CUTOFF_MS,
            bin_dir: PathBuf::from(DEFAULT_BIN_DIR),
            work_dir: PathBuf::from("."),
        }
    }
}

impl SweepConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            deadline_threshold_us: self.deadline_threshold_us,
            outlier_cutoff_ms: self.outlier_cutoff_ms,
        }
    }

    pub fn log_path(&self, policy: Policy) -> PathBuf {
        self.work_dir.join(policy.log_file())
    }

    pub fn validate(&self) -> Result<()> {
        if self.policies.is_empty() {
            bail!("NO POLICIES SELECTED");
        }
        let mut seen = HashSet::new();
        for p in &self.policies {
            if !seen.insert(*p) {
                bail!("POLICY {} LISTED TWICE", p.name());
            }
        }
        if self.threads == 0 {
            bail!("THREAD COUNT MUST BE AT LEAST 1");
        }
        if self.timeout.is_zero() {
            bail!("TIMEOUT MUST BE NON-ZERO");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = SweepConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.policies.len(), 5);
        assert_eq!(cfg.histogram_bins, 100);
        assert_eq!(cfg.outlier_cutoff_ms, 100);
        assert_eq!(cfg.timeout, Duration::from_secs(3));
    }

    #[test]
    fn duplicate_policy_rejected() {
        let cfg = SweepConfig {
            policies: vec![Policy::Sequential, Policy::StaticEtf, Policy::Sequential],
            ..SweepConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("seq"));
    }

    #[test]
    fn empty_policies_and_zero_threads_rejected() {
        let cfg = SweepConfig { policies: vec![], ..SweepConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = SweepConfig { threads: 0, ..SweepConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = SweepConfig { timeout: Duration::ZERO, ..SweepConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn policy_arguments() {
        let input = Path::new("dags/dag10.ag");
        assert_eq!(Policy::Sequential.args(input, 8), vec![OsString::from("dags/dag10.ag")]);
        assert_eq!(
            Policy::WorkStealing.args(input, 8),
            vec![OsString::from("dags/dag10.ag"), OsString::from("8")]
        );
        assert_eq!(
            Policy::StaticHlfet.args(input, 2),
            vec![
                OsString::from("dags/dag10.ag"),
                OsString::from("2"),
                OsString::from("hlfet"),
            ]
        );
    }

    #[test]
    fn log_paths_are_distinct() {
        let cfg = SweepConfig::default();
        let paths: HashSet<PathBuf> = Policy::ALL.iter().map(|p| cfg.log_path(*p)).collect();
        assert_eq!(paths.len(), Policy::ALL.len());
        assert_eq!(cfg.log_path(Policy::StaticEtf), Path::new("./tmp/static_etf_sched_log.txt"));
    }

    #[test]
    fn value_enum_names_match() {
        for p in Policy::ALL {
            assert_eq!(Policy::from_str(p.name(), false), Ok(p));
        }
    }
}
