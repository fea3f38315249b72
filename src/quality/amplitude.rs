//! Amplitude statistics over a bounded trace sample.

use statrs::statistics::{Data, OrderStatistics, Statistics};

use crate::acquisition::TraceSample;
use crate::config::defaults::EPSILON;
use crate::types::{AmplitudeStats, Percentiles};

/// Descriptive statistics of the finite values in the working set.
///
/// Returns `None` when the working set holds no finite value. NaN/Inf and
/// zero counts are taken from the full (non-decimated) sample.
pub fn compute_amplitude_stats(sample: &TraceSample) -> Option<AmplitudeStats> {
    let finite: Vec<f64> = sample.values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    let n = finite.len();

    let (min, max) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let mean = Statistics::mean(finite.iter());
    let std = Statistics::population_std_dev(finite.iter());
    let rms = Statistics::quadratic_mean(finite.iter());
    let mean_abs = finite.iter().map(|v| v.abs()).sum::<f64>() / n as f64;
    let max_abs = min.abs().max(max.abs());

    let mut data = Data::new(finite.clone());
    let median = OrderStatistics::median(&mut data);
    let mut pct = |p: usize| OrderStatistics::percentile(&mut data, p);
    let percentiles = Percentiles {
        p1: pct(1),
        p5: pct(5),
        p10: pct(10),
        p25: pct(25),
        p75: pct(75),
        p90: pct(90),
        p95: pct(95),
        p99: pct(99),
    };

    let (skewness, kurtosis) = if n > 10 {
        shape_moments(&finite, mean)
    } else {
        (None, None)
    };

    Some(AmplitudeStats {
        min,
        max,
        mean,
        median,
        std,
        rms,
        percentiles,
        skewness,
        kurtosis,
        dynamic_range_db: 20.0 * (max_abs / (std + EPSILON)).max(EPSILON).log10(),
        signal_to_noise: mean_abs / (std + EPSILON),
        zero_percentage: sample.zero_percentage(),
        nan_count: sample.nan_count,
        inf_count: sample.inf_count,
        sample_count: n,
    })
}

/// Population skewness and excess kurtosis
fn shape_moments(values: &[f64], mean: f64) -> (Option<f64>, Option<f64>) {
    let n = values.len() as f64;
    let (m2, m3, m4) = values.iter().fold((0.0, 0.0, 0.0), |(a2, a3, a4), &v| {
        let d = v - mean;
        let d2 = d * d;
        (a2 + d2, a3 + d2 * d, a4 + d2 * d2)
    });
    let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);
    if m2 <= EPSILON {
        return (None, None);
    }
    (Some(m3 / m2.powf(1.5)), Some(m4 / (m2 * m2) - 3.0))
}
