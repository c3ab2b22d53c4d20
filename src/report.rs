// DAGBENCH REPORTS
// TEXT RENDERING OF PARSED RUNS, SWEEP TABLES AND SHARED-SCALE HISTOGRAMS.
// EVERY FUNCTION RETURNS LINES; CALLERS PRINT AND/OR SAVE THEM.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use crate::logparse::RunStatistics;
use crate::scale::{histogram, ScaleBounds};
use crate::sweep::{SeriesEntry, SweepReport};

const CELL: usize = 12;
const SUB_LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn separator() -> String {
    "=".repeat(60)
}

fn opt<T: std::fmt::Display>(v: Option<T>, unit: &str) -> String {
    match v {
        Some(v) => format!("{}{}", v, unit),
        None => "-".to_string(),
    }
}

pub fn run_summary(source: &str, stats: &RunStatistics) -> Vec<String> {
    let outliers = stats.cycle_count.saturating_sub(stats.histogram_ms.len() as u64);
    vec![
        format!("RESULTS FOR {}", source),
        format!("  CYCLES:            {}", stats.cycle_count),
        format!("  WORST TIME:        {}µs", stats.max_duration_us),
        format!("  AVERAGE TIME:      {}", opt(stats.average_duration_us(), "µs")),
        format!("  AVG TIME LEFT:     {}", opt(stats.average_margin_us(), "µs")),
        format!("  DEADLINE MISSES:   {}", stats.deadline_misses),
        format!(
            "  HISTOGRAM:         {} SAMPLES ({} OUTLIERS)",
            stats.histogram_ms.len(),
            outliers
        ),
    ]
}

fn cell<T: std::fmt::Display>(entry: &SeriesEntry, value: Option<T>) -> String {
    match (entry, value) {
        (SeriesEntry::Missing(_), _) | (_, None) => "-".to_string(),
        (e, Some(v)) if e.is_partial() => format!("{}*", v),
        (_, Some(v)) => v.to_string(),
    }
}

fn table<T, F>(report: &SweepReport, title: &str, value: F) -> Vec<String>
where
    T: std::fmt::Display,
    F: Fn(&RunStatistics) -> Option<T>,
{
    let mut lines = vec![title.to_string()];

    let mut header = format!("{:>8}", "SIZE");
    let mut rule = "-".repeat(8);
    for s in &report.series {
        header.push_str(&format!(" {:>w$}", s.policy().name().to_uppercase(), w = CELL));
        rule.push(' ');
        rule.push_str(&"-".repeat(CELL));
    }
    lines.push(header);
    lines.push(rule);

    for (i, point) in report.points.iter().enumerate() {
        let label = if point.label.is_empty() { "?" } else { &point.label };
        let mut row = format!("{:>8}", label);
        for s in &report.series {
            let text = match s.entries().get(i) {
                Some(entry) => cell(entry, entry.stats().and_then(&value)),
                None => "-".to_string(),
            };
            row.push_str(&format!(" {:>w$}", text, w = CELL));
        }
        lines.push(row);
    }
    lines.push(String::new());
    lines
}

// SIDE-BY-SIDE TABLES OF EVERY SERIES, ONE ROW PER PROBLEM SIZE
pub fn comparison_report(report: &SweepReport, threshold_us: Option<u64>) -> Vec<String> {
    let mut lines = vec![
        separator(),
        "DAGBENCH SCHEDULING COMPARISON".to_string(),
        separator(),
    ];
    if let Some(t) = threshold_us {
        lines.push(format!("DEADLINE:    {}µs", t));
    }
    lines.push(format!("INPUTS:      {}", report.points.len()));
    if report.interrupted {
        lines.push("SWEEP INTERRUPTED -- REMAINING INPUTS NOT RUN".to_string());
    }
    lines.push(String::new());

    lines.extend(table(report, "AVERAGE CYCLE TIME (µs)", RunStatistics::average_duration_us));
    lines.extend(table(report, "WORST CYCLE TIME (µs)", |s| Some(s.max_duration_us)));
    if threshold_us.is_some() {
        lines.extend(table(report, "DEADLINE MISSES", |s| Some(s.deadline_misses)));
    }
    lines.extend(table(report, "AVG TIME LEFT BEFORE DEADLINE (µs)", RunStatistics::average_margin_us));

    // WHY ENTRIES ARE MISSING
    let mut notes = Vec::new();
    for s in &report.series {
        for (i, entry) in s.entries().iter().enumerate() {
            if let SeriesEntry::Missing(reason) = entry {
                let input = report
                    .points
                    .get(i)
                    .map(|p| p.input.display().to_string())
                    .unwrap_or_default();
                notes.push(format!("  {:<6} {:<14} {}", s.policy().name(), reason.label(), input));
            }
        }
    }
    lines.push("* = PARTIAL RUN (STOPPED AT TIMEOUT OR ABNORMAL EXIT)".to_string());
    if !notes.is_empty() {
        lines.push("MISSING:".to_string());
        lines.extend(notes);
    }
    lines.push(separator());
    lines
}

// VERTICAL BAR CHART OF ONE SERIES OVER THE SHARED DOMAIN. COLUMN I IS
// BIN I; BAR HEIGHTS ARE SCALED AGAINST bounds.max_bin_count SO CHARTS
// RENDERED WITH THE SAME BOUNDS ARE DIRECTLY COMPARABLE
pub fn histogram_chart(
    title: &str,
    values: &[f64],
    bounds: ScaleBounds,
    bins: usize,
    height: usize,
) -> Vec<String> {
    let bins = bins.max(1);
    let height = height.max(1);
    let counts = histogram(values, bins, bounds.max_time_ms as f64);
    let levels = (height * 8) as u64;
    let ceiling = bounds.max_bin_count.max(1);
    let scaled: Vec<u64> = counts.iter().map(|c| c * levels / ceiling).collect();

    let mut lines = vec![format!("{} ({} SAMPLES)", title, values.len())];
    for row in (0..height).rev() {
        let floor = (row * 8) as u64;
        let bar: String = scaled
            .iter()
            .map(|&s| SUB_LEVELS[s.saturating_sub(floor).min(8) as usize])
            .collect();
        let axis = if row == height - 1 {
            format!("{:>5}", bounds.max_bin_count)
        } else {
            " ".repeat(5)
        };
        lines.push(format!("{} |{}", axis, bar));
    }
    lines.push(format!("{:>5} +{}", 0, "-".repeat(bins)));
    let right = format!("{}ms", bounds.max_time_ms);
    lines.push(format!(
        "{:>5}  0{:>width$}",
        "",
        right,
        width = bins.saturating_sub(1).max(right.len())
    ));
    lines
}

// WRITE A REPORT UNDER dir WITH A TIMESTAMPED NAME. RETURNS THE PATH
pub fn save_report(dir: &Path, prefix: &str, lines: &[String]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("MKDIR {} FAILED", dir.display()))?;
    let stamp = Command::new("date")
        .arg("+%Y%m%d-%H%M%S")
        .output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                Some(String::from_utf8_lossy(&o.stdout).trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string());
    let path = dir.join(format!("{}-{}.log", prefix, stamp));
    fs::write(&path, lines.join("\n") + "\n")
        .with_context(|| format!("WRITE {} FAILED", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Policy;
    use crate::sweep::{MissingReason, PolicySeries, SweepPoint};

    fn stats(durations: &[u64]) -> RunStatistics {
        RunStatistics {
            cycle_count: durations.len() as u64,
            sum_duration_us: durations.iter().sum(),
            max_duration_us: durations.iter().copied().max().unwrap_or(0),
            deadline_misses: 0,
            margin_count: 0,
            sum_margin_us: 0,
            histogram_ms: durations.iter().map(|d| *d as f64 / 1000.0).collect(),
        }
    }

    #[test]
    fn summary_lists_every_figure() {
        let lines = run_summary("tmp/seq_log.txt", &stats(&[500, 1500]));
        assert_eq!(lines[0], "RESULTS FOR tmp/seq_log.txt");
        assert!(lines.iter().any(|l| l.contains("CYCLES:") && l.ends_with(" 2")));
        assert!(lines.iter().any(|l| l.contains("AVERAGE TIME:") && l.ends_with("1000µs")));
        assert!(lines.iter().any(|l| l.contains("AVG TIME LEFT:") && l.ends_with("-")));
    }

    #[test]
    fn table_marks_missing_and_partial() {
        let mut seq = PolicySeries::new(Policy::Sequential);
        seq.push(SeriesEntry::Measured { stats: stats(&[100, 300]), partial: true });
        seq.push(SeriesEntry::Missing(MissingReason::NoCycles));
        let report = SweepReport {
            points: vec![
                SweepPoint { input: "d/dag1.ag".into(), label: "1".into() },
                SweepPoint { input: "d/dag2.ag".into(), label: "2".into() },
            ],
            series: vec![seq],
            interrupted: false,
        };
        let lines = comparison_report(&report, None);
        let avg_row = lines
            .iter()
            .skip_while(|l| !l.starts_with("AVERAGE CYCLE TIME"))
            .nth(3)
            .unwrap();
        assert!(avg_row.trim_end().ends_with("200*"));
        let missing_row = lines
            .iter()
            .skip_while(|l| !l.starts_with("AVERAGE CYCLE TIME"))
            .nth(4)
            .unwrap();
        assert!(missing_row.trim_end().ends_with('-'));
        assert!(lines.iter().any(|l| l.contains("NO CYCLES") && l.contains("dag2.ag")));
        // NO THRESHOLD, NO MISSES TABLE
        assert!(!lines.iter().any(|l| l == "DEADLINE MISSES"));
    }

    #[test]
    fn chart_tallest_bar_reaches_top_only_at_ceiling() {
        let bounds = ScaleBounds { max_time_ms: 10, max_bin_count: 4 };
        let values = [1.0, 1.0, 1.0];
        let lines = histogram_chart("SEQ", &values, bounds, 10, 2);
        // TITLE, 2 ROWS, AXIS, LABELS
        assert_eq!(lines.len(), 5);
        // 3/4 OF 16 LEVELS = 12: TOP ROW PARTIAL (4/8), BOTTOM ROW FULL
        assert_eq!(lines[1].chars().filter(|c| *c == '▄').count(), 1);
        assert_eq!(lines[2].chars().filter(|c| *c == '█').count(), 1);
    }

    #[test]
    fn save_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_report(dir.path(), "sweep", &["A".to_string(), "B".to_string()]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "A\nB\n");
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("sweep-"));
    }
}
