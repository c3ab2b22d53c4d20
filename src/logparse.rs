// DAGBENCH LOG PARSER
// TURNS ONE FREE-FORM SCHEDULER LOG INTO RUN STATISTICS
//
// THE EXECUTORS INTERLEAVE CYCLE TIMINGS WITH ARBITRARY DIAGNOSTIC TEXT:
//
//   End of cycle at: Instant { .. }
//   In: 1450µs
//   Time left before the deadline: 21769µs
//
// ONLY TWO LINE SHAPES CARRY DATA. EVERYTHING ELSE IS SKIPPED, NO LINE SHAPE
// IS EVER AN ERROR. THE ONLY FAILURE IS A LOG WITHOUT A SINGLE CYCLE.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::ParseError;

// UNIT MARKER CLOSING EVERY TIMING TOKEN
pub const MICROS_MARKER: &str = "µs";

// FIRST TOKEN OF A DEADLINE LINE
pub const DEADLINE_SENTINEL: &str = "Time";

// POSITION OF THE SLACK TOKEN ON A DEADLINE LINE (1-INDEXED)
pub const DEADLINE_FIELD: usize = 6;

// CYCLES AT OR ABOVE THIS MANY MS ARE COLD-START SPIKES: COUNTED, NOT PLOTTED
pub const DEFAULT_OUTLIER_CUTOFF_MS: u64 = 100;

// JACK DEFAULT
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLine {
    // <label> <n>µs: ONE CYCLE TOOK n MICROSECONDS
    Cycle(u64),
    // Time .. .. .. .. <n>µs: n MICROSECONDS LEFT BEFORE THE NEXT DEADLINE
    Deadline(i64),
    Other,
}

fn parse_micros<T: std::str::FromStr>(token: &str) -> Option<T> {
    token.strip_suffix(MICROS_MARKER)?.parse().ok()
}

// CLASSIFY ONE LINE. CYCLE LINES ARE EXACTLY TWO TOKENS; DEADLINE LINES ARE
// RECOGNISED BY THEIR SENTINEL AND READ FROM A FIXED FIELD
pub fn classify_line(line: &str) -> LogLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.len() == 2 {
        if let Some(us) = parse_micros::<u64>(tokens[1]) {
            return LogLine::Cycle(us);
        }
    }

    if tokens.first() == Some(&DEADLINE_SENTINEL) {
        if let Some(slack) = tokens
            .get(DEADLINE_FIELD - 1)
            .and_then(|t| parse_micros::<i64>(t))
        {
            return LogLine::Deadline(slack);
        }
    }

    LogLine::Other
}

// CYCLE LENGTH BUDGET FOR ONE AUDIO BUFFER: 2 * buffer / rate SECONDS,
// FLOORED TO WHOLE MICROSECONDS. None FOR A ZERO SAMPLE RATE
pub fn deadline_threshold_us(buffer_size: u32, sample_rate: u32) -> Option<u64> {
    (2 * buffer_size as u64 * 1_000_000).checked_div(sample_rate as u64)
}

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    // CYCLES STRICTLY LONGER THAN THIS COUNT AS DEADLINE MISSES
    // WITHOUT A THRESHOLD NO MISSES ARE COUNTED
    pub deadline_threshold_us: Option<u64>,
    pub outlier_cutoff_ms: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            deadline_threshold_us: None,
            outlier_cutoff_ms: DEFAULT_OUTLIER_CUTOFF_MS,
        }
    }
}

// REDUCTION OF ONE LOG FILE. ONLY EVER BUILT WITH AT LEAST ONE CYCLE
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    pub cycle_count: u64,
    pub sum_duration_us: u64,
    pub max_duration_us: u64,
    pub deadline_misses: u64,
    pub margin_count: u64,
    pub sum_margin_us: i64,
    // CYCLE DURATIONS IN MS, FILE ORDER, OUTLIERS REMOVED
    pub histogram_ms: Vec<f64>,
}

impl RunStatistics {
    // FLOOR OF THE MEAN CYCLE DURATION. THE DENOMINATOR IS THE NUMBER OF
    // CYCLE LINES, NEVER THE NUMBER OF LINES IN THE FILE
    pub fn average_duration_us(&self) -> Option<u64> {
        self.sum_duration_us.checked_div(self.cycle_count)
    }

    // FLOOR OF THE MEAN DEADLINE SLACK, OVER DEADLINE LINES ONLY
    pub fn average_margin_us(&self) -> Option<i64> {
        if self.margin_count == 0 {
            return None;
        }
        Some(self.sum_margin_us.div_euclid(self.margin_count as i64))
    }
}

// STREAMING REDUCER. FEED LINES IN FILE ORDER, THEN finish
#[derive(Debug, Default)]
pub struct RunAccumulator {
    options: ParseOptions,
    stats: RunStatistics,
}

impl RunAccumulator {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            stats: RunStatistics::default(),
        }
    }

    pub fn push_line(&mut self, line: &str) -> LogLine {
        let kind = classify_line(line);
        match kind {
            LogLine::Cycle(us) => self.record_cycle(us),
            LogLine::Deadline(slack) => self.record_margin(slack),
            LogLine::Other => {}
        }
        kind
    }

    pub fn record_cycle(&mut self, duration_us: u64) {
        let s = &mut self.stats;
        s.cycle_count += 1;
        s.sum_duration_us = s.sum_duration_us.saturating_add(duration_us);
        s.max_duration_us = s.max_duration_us.max(duration_us);

        if let Some(threshold) = self.options.deadline_threshold_us {
            if duration_us > threshold {
                s.deadline_misses += 1;
            }
        }

        if duration_us < self.options.outlier_cutoff_ms.saturating_mul(1000) {
            s.histogram_ms.push(duration_us as f64 / 1000.0);
        }
    }

    pub fn record_margin(&mut self, slack_us: i64) {
        self.stats.margin_count += 1;
        self.stats.sum_margin_us = self.stats.sum_margin_us.saturating_add(slack_us);
    }

    pub fn finish(self, source_name: &str) -> Result<RunStatistics, ParseError> {
        if self.stats.cycle_count == 0 {
            return Err(ParseError::MissingData {
                source_name: source_name.to_string(),
            });
        }
        Ok(self.stats)
    }
}

pub fn parse_text(content: &str, options: ParseOptions) -> Result<RunStatistics, ParseError> {
    let mut acc = RunAccumulator::new(options);
    for line in content.lines() {
        acc.push_line(line);
    }
    acc.finish("<text>")
}

// PARSE A LOG FROM ANY BUFFERED READER. INVALID UTF-8 IS REPLACED, NOT
// REJECTED: A HALF-FLUSHED MULTIBYTE MARKER MUST NOT LOSE THE WHOLE FILE
pub fn parse_reader<R: BufRead>(
    mut reader: R,
    source_name: &str,
    options: ParseOptions,
) -> Result<RunStatistics, ParseError> {
    let mut acc = RunAccumulator::new(options);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| ParseError::Io {
                path: source_name.into(),
                source,
            })?;
        if n == 0 {
            break;
        }
        acc.push_line(&String::from_utf8_lossy(&buf));
    }
    acc.finish(source_name)
}

// PARSE A LOG FILE. *.gz FILES ARE DECOMPRESSED ON THE FLY
pub fn parse_file(path: &Path, options: ParseOptions) -> Result<RunStatistics, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path.display().to_string();

    if path.extension().is_some_and(|ext| ext == "gz") {
        parse_reader(BufReader::new(GzDecoder::new(file)), &name, options)
    } else {
        parse_reader(BufReader::new(file), &name, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_line_two_tokens() {
        assert_eq!(classify_line("In: 1450µs"), LogLine::Cycle(1450));
        assert_eq!(classify_line("  c1\t500µs  "), LogLine::Cycle(500));
        assert_eq!(classify_line("In: 0µs"), LogLine::Cycle(0));
    }

    #[test]
    fn cycle_line_wrong_shape() {
        // THREE TOKENS
        assert_eq!(classify_line("In: 1450 µs"), LogLine::Other);
        assert_eq!(classify_line("cycle took 1450µs"), LogLine::Other);
        // NO MARKER
        assert_eq!(classify_line("In: 1450"), LogLine::Other);
        assert_eq!(classify_line("In: 1450ms"), LogLine::Other);
        // MARKER WITHOUT NUMBER
        assert_eq!(classify_line("In: µs"), LogLine::Other);
        assert_eq!(classify_line("In: abcµs"), LogLine::Other);
        // DURATIONS ARE NEVER NEGATIVE
        assert_eq!(classify_line("In: -3µs"), LogLine::Other);
    }

    #[test]
    fn deadline_line_sixth_token() {
        assert_eq!(
            classify_line("Time left before the deadline: 21769µs"),
            LogLine::Deadline(21769)
        );
        assert_eq!(classify_line("Time a b c d -40µs"), LogLine::Deadline(-40));
        // EXTRA TRAILING TOKENS DO NOT MATTER
        assert_eq!(classify_line("Time a b c d 7µs tail"), LogLine::Deadline(7));
    }

    #[test]
    fn deadline_line_wrong_shape() {
        // TOO SHORT: NO SIXTH TOKEN
        assert_eq!(classify_line("Time left before the"), LogLine::Other);
        // SENTINEL IS CASE SENSITIVE AND MUST BE THE FIRST TOKEN
        assert_eq!(classify_line("time a b c d 7µs"), LogLine::Other);
        assert_eq!(classify_line("x Time b c d 7µs"), LogLine::Other);
        // SIXTH TOKEN UNPARSABLE
        assert_eq!(classify_line("Time a b c d e"), LogLine::Other);
    }

    #[test]
    fn two_token_sentinel_line_is_a_cycle() {
        assert_eq!(classify_line("Time 12µs"), LogLine::Cycle(12));
    }

    #[test]
    fn blank_and_garbage_lines() {
        assert_eq!(classify_line(""), LogLine::Other);
        assert_eq!(classify_line("   "), LogLine::Other);
        assert_eq!(classify_line("Beginning of the execution"), LogLine::Other);
        assert_eq!(classify_line("End of cycle at: Instant {"), LogLine::Other);
    }

    #[test]
    fn threshold_floors() {
        // 2 * 512 / 44100 S = 23219.954.. US
        assert_eq!(deadline_threshold_us(512, 44_100), Some(23_219));
        // 2 * 441 / 44100 S = 20000 US EXACTLY
        assert_eq!(deadline_threshold_us(441, 44_100), Some(20_000));
        assert_eq!(deadline_threshold_us(64, 48_000), Some(2_666));
        assert_eq!(deadline_threshold_us(512, 0), None);
    }

    #[test]
    fn accumulator_counts_independently() {
        let mut acc = RunAccumulator::new(ParseOptions::default());
        assert_eq!(acc.push_line("In: 100µs"), LogLine::Cycle(100));
        assert_eq!(acc.push_line("Time left before the deadline: 10µs"), LogLine::Deadline(10));
        assert_eq!(acc.push_line("Time left before the deadline: 20µs"), LogLine::Deadline(20));
        let stats = acc.finish("t").unwrap();
        assert_eq!(stats.cycle_count, 1);
        assert_eq!(stats.margin_count, 2);
        assert_eq!(stats.average_margin_us(), Some(15));
    }

    #[test]
    fn negative_margin_average_floors() {
        let mut acc = RunAccumulator::new(ParseOptions::default());
        acc.record_cycle(1);
        acc.record_margin(-3);
        acc.record_margin(0);
        let stats = acc.finish("t").unwrap();
        // -3 / 2 = -1.5 -> FLOOR -2
        assert_eq!(stats.average_margin_us(), Some(-2));
    }

    #[test]
    fn empty_accumulator_is_missing_data() {
        let acc = RunAccumulator::new(ParseOptions::default());
        let err = acc.finish("empty.txt").unwrap_err();
        assert!(err.is_missing_data());
        assert!(err.to_string().contains("empty.txt"));
    }

    #[test]
    fn no_margins_means_no_margin_average() {
        let stats = parse_text("In: 10µs\n", ParseOptions::default()).unwrap();
        assert_eq!(stats.margin_count, 0);
        assert_eq!(stats.average_margin_us(), None);
        assert_eq!(stats.average_duration_us(), Some(10));
    }

    #[test]
    fn custom_outlier_cutoff() {
        let opts = ParseOptions { deadline_threshold_us: None, outlier_cutoff_ms: 1 };
        let stats = parse_text("a 999µs\na 1000µs\na 5µs\n", opts).unwrap();
        assert_eq!(stats.histogram_ms, vec![0.999, 0.005]);
        assert_eq!(stats.cycle_count, 3);
    }
}
