//! Aggregates over a trace header sample.

use std::collections::{HashMap, HashSet};

use super::pca::coordinate_pca;
use crate::types::{
    CoordinateSource, CoordinateSpread, FieldRange, GeometryStats, TraceHeaderRecord,
    TraceHeaderSample,
};

fn unique_count(records: &[TraceHeaderRecord], f: impl Fn(&TraceHeaderRecord) -> i64) -> usize {
    records.iter().map(f).collect::<HashSet<_>>().len()
}

fn field_range(
    records: &[TraceHeaderRecord],
    f: impl Fn(&TraceHeaderRecord) -> i64,
) -> Option<FieldRange> {
    let mut it = records.iter().map(f);
    let first = it.next()?;
    let (min, max) = it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    Some(FieldRange { min, max })
}

fn has_spread(points: &[(f64, f64)]) -> bool {
    points
        .first()
        .is_some_and(|first| points.iter().any(|p| p != first))
}

fn spread_of(points: &[(f64, f64)], source: CoordinateSource) -> CoordinateSpread {
    let (mut x_lo, mut x_hi) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_lo, mut y_hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        x_lo = x_lo.min(x);
        x_hi = x_hi.max(x);
        y_lo = y_lo.min(y);
        y_hi = y_hi.max(y);
    }
    CoordinateSpread {
        source,
        x_range: x_hi - x_lo,
        y_range: y_hi - y_lo,
    }
}

/// Derive read-only statistics from a header sample.
///
/// Coordinates come from the source position, or from the receiver position
/// when every sampled source sits at the same point.
pub fn compute_geometry_stats(sample: &TraceHeaderSample) -> GeometryStats {
    let records = &sample.records;
    if records.is_empty() {
        return GeometryStats::default();
    }

    let mut cdp_counts: HashMap<i64, usize> = HashMap::new();
    for r in records {
        *cdp_counts.entry(r.cdp).or_insert(0) += 1;
    }
    let dominant = cdp_counts.values().copied().max().unwrap_or(0);

    let nonzero_offsets: Vec<i64> = records
        .iter()
        .map(|r| r.offset)
        .filter(|o| *o != 0)
        .collect();
    let unique_nonzero_offsets = nonzero_offsets.iter().collect::<HashSet<_>>().len();

    let sources: Vec<(f64, f64)> = records.iter().map(|r| (r.source_x, r.source_y)).collect();
    let (points, source) = if has_spread(&sources) {
        (sources, CoordinateSource::Source)
    } else {
        let receivers: Vec<(f64, f64)> =
            records.iter().map(|r| (r.receiver_x, r.receiver_y)).collect();
        (receivers, CoordinateSource::Receiver)
    };

    GeometryStats {
        traces_sampled: records.len(),
        unique_inlines: unique_count(records, |r| r.inline),
        unique_crosslines: unique_count(records, |r| r.crossline),
        unique_cdps: cdp_counts.len(),
        unique_field_records: unique_count(records, |r| r.field_record),
        unique_shot_points: unique_count(records, |r| r.shot_point),
        unique_offsets: unique_count(records, |r| r.offset),
        nonzero_offset_count: nonzero_offsets.len(),
        unique_nonzero_offsets,
        dominant_cdp_fraction: dominant as f64 / records.len() as f64,
        inline_range: field_range(records, |r| r.inline),
        crossline_range: field_range(records, |r| r.crossline),
        cdp_range: field_range(records, |r| r.cdp),
        field_record_range: field_range(records, |r| r.field_record),
        offset_range: field_range(records, |r| r.offset),
        coordinate_spread: Some(spread_of(&points, source)),
        pca: coordinate_pca(&points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(i: usize, inline: i64, crossline: i64, cdp: i64, offset: i64) -> TraceHeaderRecord {
        TraceHeaderRecord {
            trace_index: i,
            inline,
            crossline,
            cdp,
            offset,
            source_x: i as f64 * 10.0,
            source_y: (i % 3) as f64 * 10.0,
            ..Default::default()
        }
    }

    fn sample(records: Vec<TraceHeaderRecord>) -> TraceHeaderSample {
        TraceHeaderSample {
            total_traces: records.len(),
            stride: 1,
            skipped: 0,
            records,
        }
    }

    #[test]
    fn test_empty_sample() {
        let stats = compute_geometry_stats(&TraceHeaderSample::default());
        assert_eq!(stats.traces_sampled, 0);
        assert!(stats.pca.is_none());
    }

    #[test]
    fn test_unique_counts_and_ranges() {
        let records = vec![
            rec(0, 10, 100, 1, 0),
            rec(1, 10, 101, 1, 50),
            rec(2, 11, 100, 2, 50),
            rec(3, 12, 102, 1, 100),
        ];
        let stats = compute_geometry_stats(&sample(records));
        assert_eq!(stats.unique_inlines, 3);
        assert_eq!(stats.unique_crosslines, 3);
        assert_eq!(stats.unique_cdps, 2);
        assert_eq!(stats.unique_offsets, 3);
        assert_eq!(stats.nonzero_offset_count, 3);
        assert_eq!(stats.unique_nonzero_offsets, 2);
        assert!((stats.dominant_cdp_fraction - 0.75).abs() < 1e-12);
        assert_eq!(stats.inline_range, Some(FieldRange { min: 10, max: 12 }));
        assert_eq!(stats.inline_range.unwrap().span(), 2);
    }

    #[test]
    fn test_receiver_fallback_when_sources_fixed() {
        let records: Vec<TraceHeaderRecord> = (0..6)
            .map(|i| TraceHeaderRecord {
                trace_index: i,
                source_x: 100.0,
                source_y: 200.0,
                receiver_x: 100.0 + i as f64 * 25.0,
                receiver_y: 200.0,
                ..Default::default()
            })
            .collect();
        let stats = compute_geometry_stats(&sample(records));
        let spread = stats.coordinate_spread.unwrap();
        assert_eq!(spread.source, CoordinateSource::Receiver);
        assert!((spread.x_range - 125.0).abs() < 1e-9);
        assert!(stats.pca.unwrap().major_variance > 0.9999);
    }
}
