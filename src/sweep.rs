// DAGBENCH SWEEP DRIVER
// FOR EACH INPUT (NATURAL ORDER), FOR EACH POLICY (CONFIG ORDER):
//   RUN EXECUTOR -> PARSE ITS LOG -> APPEND TO THAT POLICY'S SERIES
//
// EVERY SERIES GETS EXACTLY ONE ENTRY PER INPUT, MEASURED OR MISSING, SO
// POSITION i MEANS THE SAME PROBLEM SIZE IN EVERY SERIES. A FAILURE NEVER
// SKIPS OR SHIFTS AN ENTRY, IT ONLY REPLACES IT WITH A MISSING MARKER.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::config::{Policy, SweepConfig};
use crate::error::ParseError;
use crate::logparse::{parse_file, RunStatistics};
use crate::natsort::natural_cmp;
use crate::runner::{Executor, RunOutcome};
use crate::scale::{shared_scale, ScaleBounds};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    InputNotFound,
    // THE LOG HELD NO CYCLE LINE
    NoCycles,
    LaunchFailed(String),
    LogUnreadable(String),
    // SHUTDOWN ARRIVED BEFORE THIS POLICY RAN
    Interrupted,
}

impl MissingReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InputNotFound => "NO INPUT",
            Self::NoCycles => "NO CYCLES",
            Self::LaunchFailed(_) => "LAUNCH FAILED",
            Self::LogUnreadable(_) => "NO LOG",
            Self::Interrupted => "INTERRUPTED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesEntry {
    // partial: THE EXECUTOR WAS STOPPED OR DIED, THE LOG MAY BE TRUNCATED
    Measured { stats: RunStatistics, partial: bool },
    Missing(MissingReason),
}

impl SeriesEntry {
    pub fn stats(&self) -> Option<&RunStatistics> {
        match self {
            Self::Measured { stats, .. } => Some(stats),
            Self::Missing(_) => None,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Measured { partial: true, .. })
    }
}

// APPEND-ONLY, ONE ENTRY PER SWEPT INPUT
#[derive(Debug, Clone)]
pub struct PolicySeries {
    policy: Policy,
    entries: Vec<SeriesEntry>,
}

impl PolicySeries {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            entries: Vec::new(),
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn push(&mut self, entry: SeriesEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[SeriesEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn averages(&self) -> Vec<Option<u64>> {
        self.entries
            .iter()
            .map(|e| e.stats().and_then(RunStatistics::average_duration_us))
            .collect()
    }

    pub fn worst(&self) -> Vec<Option<u64>> {
        self.entries
            .iter()
            .map(|e| e.stats().map(|s| s.max_duration_us))
            .collect()
    }

    pub fn misses(&self) -> Vec<Option<u64>> {
        self.entries
            .iter()
            .map(|e| e.stats().map(|s| s.deadline_misses))
            .collect()
    }

    pub fn average_margins(&self) -> Vec<Option<i64>> {
        self.entries
            .iter()
            .map(|e| e.stats().and_then(RunStatistics::average_margin_us))
            .collect()
    }
}

// DIGITS OF THE FILE NAME, CONCATENATED IN ORDER: dag_12_3.ag -> "123"
pub fn problem_size_label(file_name: &str) -> String {
    file_name.chars().filter(char::is_ascii_digit).collect()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn sort_inputs(inputs: &mut [PathBuf]) {
    inputs.sort_by(|a, b| natural_cmp(&file_name_of(a), &file_name_of(b)));
}

// A DIRECTORY EXPANDS TO ITS REGULAR FILES (NOT RECURSIVE), NATURALLY
// SORTED; A FILE IS A SINGLE INPUT
pub fn discover_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("INPUT {} NOT FOUND", path.display());
    }

    let mut inputs = Vec::new();
    for entry in fs::read_dir(path).with_context(|| format!("READING {}", path.display()))? {
        let entry = entry?;
        let p = entry.path();
        if p.is_file() {
            inputs.push(p);
        }
    }
    sort_inputs(&mut inputs);
    Ok(inputs)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPoint {
    pub input: PathBuf,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct SweepReport {
    pub points: Vec<SweepPoint>,
    pub series: Vec<PolicySeries>,
    // SHUTDOWN ENDED THE SWEEP BEFORE EVERY INPUT WAS VISITED
    pub interrupted: bool,
}

impl SweepReport {
    pub fn series_for(&self, policy: Policy) -> Option<&PolicySeries> {
        self.series.iter().find(|s| s.policy() == policy)
    }

    // HISTOGRAMS OF EVERY POLICY AT ONE SWEEP POSITION. MISSING ENTRIES
    // CONTRIBUTE AN EMPTY SEQUENCE
    pub fn histograms_at(&self, index: usize) -> Vec<(Policy, &[f64])> {
        self.series
            .iter()
            .map(|s| {
                let hist = s
                    .entries()
                    .get(index)
                    .and_then(SeriesEntry::stats)
                    .map(|st| st.histogram_ms.as_slice())
                    .unwrap_or(&[]);
                (s.policy(), hist)
            })
            .collect()
    }

    pub fn scale_at(&self, index: usize, bins: usize) -> ScaleBounds {
        let hists: Vec<&[f64]> = self.histograms_at(index).into_iter().map(|(_, h)| h).collect();
        shared_scale(&hists, bins)
    }
}

pub struct Driver<E: Executor> {
    config: SweepConfig,
    executor: E,
}

impl<E: Executor> Driver<E> {
    pub fn new(config: SweepConfig, executor: E) -> Self {
        Self { config, executor }
    }

    // SWEEP EVERY INPUT AGAINST EVERY CONFIGURED POLICY. NEVER FAILS:
    // EVERY PROBLEM BECOMES A MISSING ENTRY AT ITS OWN POSITION
    pub fn sweep(&mut self, inputs: &[PathBuf], shutdown: &AtomicBool) -> SweepReport {
        let mut inputs = inputs.to_vec();
        sort_inputs(&mut inputs);

        let mut series: Vec<PolicySeries> =
            self.config.policies.iter().map(|p| PolicySeries::new(*p)).collect();
        let mut points = Vec::with_capacity(inputs.len());
        let mut interrupted = false;

        for input in &inputs {
            if shutdown.load(Ordering::Relaxed) {
                interrupted = true;
                break;
            }

            let label = problem_size_label(&file_name_of(input));
            info!(input = %input.display(), size = %label, "sweeping input");
            points.push(SweepPoint {
                input: input.clone(),
                label,
            });

            if !input.is_file() {
                warn!(input = %input.display(), "input not found, recording missing entries");
                for s in &mut series {
                    s.push(SeriesEntry::Missing(MissingReason::InputNotFound));
                }
                continue;
            }

            for s in &mut series {
                let entry = if shutdown.load(Ordering::Relaxed) {
                    interrupted = true;
                    SeriesEntry::Missing(MissingReason::Interrupted)
                } else {
                    self.measure(s.policy(), input, shutdown)
                };
                s.push(entry);
            }
        }

        debug_assert!(series.iter().all(|s| s.len() == points.len()));
        SweepReport {
            points,
            series,
            interrupted,
        }
    }

    pub fn measure(&mut self, policy: Policy, input: &Path, shutdown: &AtomicBool) -> SeriesEntry {
        let outcome = self.executor.run(policy, input, shutdown);
        match &outcome {
            RunOutcome::LaunchFailed(msg) => {
                warn!(policy = policy.name(), "{}", msg);
                return SeriesEntry::Missing(MissingReason::LaunchFailed(msg.clone()));
            }
            RunOutcome::TimedOut => debug!(policy = policy.name(), "measurement window elapsed"),
            RunOutcome::Interrupted => info!(policy = policy.name(), "run interrupted"),
            RunOutcome::Exited(code) => debug!(policy = policy.name(), ?code, "executor exited"),
        }

        let log = self.config.log_path(policy);
        match parse_file(&log, self.config.parse_options()) {
            Ok(stats) => {
                debug!(
                    policy = policy.name(),
                    cycles = stats.cycle_count,
                    worst_us = stats.max_duration_us,
                    "log parsed"
                );
                SeriesEntry::Measured {
                    stats,
                    partial: outcome.is_partial(),
                }
            }
            Err(e @ ParseError::MissingData { .. }) => {
                warn!(policy = policy.name(), "{}", e);
                SeriesEntry::Missing(MissingReason::NoCycles)
            }
            Err(e @ ParseError::Io { .. }) => {
                warn!(policy = policy.name(), "{}", e);
                SeriesEntry::Missing(MissingReason::LogUnreadable(e.to_string()))
            }
        }
    }
}
