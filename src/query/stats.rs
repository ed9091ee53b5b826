//! Statistics over per-day duration vectors: nearest-rank percentiles,
//! robust spread measures and sample variance.

use super::filters::DayDurationRow;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DayDurationStats {
    pub count: usize,
    pub mean_seconds: f64,
    pub median_seconds: f64,
    pub p25_seconds: f64,
    pub p75_seconds: f64,
    pub p90_seconds: f64,
    pub p95_seconds: f64,
    pub min_seconds: f64,
    pub max_seconds: f64,
    pub iqr_seconds: f64,
    pub mad_seconds: f64,
    pub variance_seconds: f64,
    pub stddev_seconds: f64,
}

/// Nearest-rank percentile over an ascending-sorted slice.
fn percentile(sorted: &[f64], percent: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((percent / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Middle value after sorting; the mean of the two middle values for even
/// counts.
fn median(sorted: &[f64]) -> f64 {
    let count = sorted.len();
    if count == 0 {
        return 0.0;
    }
    if count % 2 == 1 {
        sorted[count / 2]
    } else {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    }
}

/// Empty input produces the all-zero summary.
#[must_use]
pub fn compute_day_duration_stats(rows: &[DayDurationRow]) -> DayDurationStats {
    if rows.is_empty() {
        return DayDurationStats::default();
    }

    let mut sorted: Vec<f64> = rows.iter().map(|row| row.total_seconds as f64).collect();
    sorted.sort_by(|left, right| left.total_cmp(right));

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let median_value = median(&sorted);

    let mut deviations: Vec<f64> = sorted
        .iter()
        .map(|value| (value - median_value).abs())
        .collect();
    deviations.sort_by(|left, right| left.total_cmp(right));

    let variance = if count > 1 {
        sorted
            .iter()
            .map(|value| (value - mean) * (value - mean))
            .sum::<f64>()
            / (count - 1) as f64
    } else {
        0.0
    };

    let p25 = percentile(&sorted, 25.0);
    let p75 = percentile(&sorted, 75.0);

    DayDurationStats {
        count,
        mean_seconds: mean,
        median_seconds: median_value,
        p25_seconds: p25,
        p75_seconds: p75,
        p90_seconds: percentile(&sorted, 90.0),
        p95_seconds: percentile(&sorted, 95.0),
        min_seconds: sorted[0],
        max_seconds: sorted[count - 1],
        iqr_seconds: p75 - p25,
        mad_seconds: median(&deviations),
        variance_seconds: variance,
        stddev_seconds: variance.sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(durations: &[i64]) -> Vec<DayDurationRow> {
        durations
            .iter()
            .enumerate()
            .map(|(index, &total_seconds)| DayDurationRow {
                date: format!("2025-01-{:02}", index + 1),
                total_seconds,
            })
            .collect()
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = compute_day_duration_stats(&[]);
        assert_eq!(stats, DayDurationStats::default());
    }

    #[test]
    fn ten_day_reference_distribution() {
        let stats = compute_day_duration_stats(&rows(&[
            3600, 7200, 7200, 10_800, 10_800, 14_400, 14_400, 18_000, 21_600, 25_200,
        ]));

        assert_eq!(stats.count, 10);
        assert_eq!(stats.median_seconds, 12_600.0);
        assert_eq!(stats.p25_seconds, 7200.0);
        assert_eq!(stats.p75_seconds, 18_000.0);
        assert_eq!(stats.iqr_seconds, 10_800.0);
        assert_eq!(stats.min_seconds, 3600.0);
        assert_eq!(stats.max_seconds, 25_200.0);
        assert_eq!(stats.mean_seconds, 13_320.0);
    }

    #[test]
    fn percentile_ordering_invariant() {
        let stats = compute_day_duration_stats(&rows(&[1200, 9000, 600, 4800, 3600, 7200, 300]));
        assert!(stats.p25_seconds <= stats.median_seconds);
        assert!(stats.median_seconds <= stats.p75_seconds);
        assert!(stats.p75_seconds <= stats.p90_seconds);
        assert!(stats.p90_seconds <= stats.p95_seconds);
        assert!(stats.iqr_seconds >= 0.0);
    }

    #[test]
    fn single_value_has_zero_spread() {
        let stats = compute_day_duration_stats(&rows(&[3600]));
        assert_eq!(stats.median_seconds, 3600.0);
        assert_eq!(stats.variance_seconds, 0.0);
        assert_eq!(stats.stddev_seconds, 0.0);
        assert_eq!(stats.mad_seconds, 0.0);
    }

    #[test]
    fn mad_is_robust_to_outliers() {
        let stats = compute_day_duration_stats(&rows(&[3600, 3600, 3600, 3600, 360_000]));
        assert_eq!(stats.median_seconds, 3600.0);
        assert_eq!(stats.mad_seconds, 0.0);
        assert!(stats.stddev_seconds > 100_000.0);
    }
}
