// DAGBENCH SHARED HISTOGRAM SCALE
// COMPARATIVE CHARTS ARE ONLY COMPARABLE IF THEY SHARE AXES.
//
// TWO PASSES: THE X DOMAIN DEPENDS ON EVERY SERIES, AND THE BIN EDGES (SO THE
// PER-BIN COUNTS, SO THE Y DOMAIN) DEPEND ON THE X DOMAIN.

pub const DEFAULT_HISTOGRAM_BINS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleBounds {
    // UPPER END OF THE SHARED X RANGE [0, max_time_ms)
    pub max_time_ms: u64,
    // SHARED Y LIMIT: THE TALLEST BAR OF ANY SERIES, PLUS ONE
    pub max_bin_count: u64,
}

// COUNT values INTO bins EQUAL-WIDTH BINS OVER [0, upper]
// THE LAST BIN IS CLOSED ON THE RIGHT; VALUES OUTSIDE THE RANGE ARE DROPPED
pub fn histogram(values: &[f64], bins: usize, upper: f64) -> Vec<u64> {
    let bins = bins.max(1);
    let mut counts = vec![0u64; bins];
    if upper.is_nan() || upper <= 0.0 {
        return counts;
    }

    for &v in values {
        if !(0.0..=upper).contains(&v) {
            continue;
        }
        // THE SCALED INDEX CAN LAND ONE BIN OFF FOR VALUES ON AN EDGE.
        // THE EDGES THEMSELVES DECIDE.
        let mut idx = (((v / upper) * bins as f64) as usize).min(bins - 1);
        if v < bin_edge(upper, bins, idx) {
            idx = idx.saturating_sub(1);
        } else if idx + 1 < bins && v >= bin_edge(upper, bins, idx + 1) {
            idx += 1;
        }
        counts[idx] += 1;
    }
    counts
}

// LEFT EDGE OF BIN i
fn bin_edge(upper: f64, bins: usize, i: usize) -> f64 {
    upper * i as f64 / bins as f64
}

pub fn shared_scale<S: AsRef<[f64]>>(series: &[S], bins: usize) -> ScaleBounds {
    // PASS 1: DOMAIN. +1 KEEPS THE LARGEST SAMPLE OFF THE RIGHT EDGE.
    let max_value = series
        .iter()
        .flat_map(|s| s.as_ref().iter().copied())
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);
    let max_time_ms = (max_value.ceil() as u64).saturating_add(1);

    // PASS 2: RE-BIN EVERY SERIES OVER THE SHARED DOMAIN
    let tallest = series
        .iter()
        .flat_map(|s| histogram(s.as_ref(), bins, max_time_ms as f64))
        .max()
        .unwrap_or(0);

    ScaleBounds {
        max_time_ms,
        max_bin_count: tallest + 1,
    }
}
