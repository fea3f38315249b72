//! Two-dimensional principal component split of a coordinate cloud.

use std::collections::HashSet;

use crate::config::defaults::EPSILON;
use crate::types::PcaResult;

/// Major/minor variance ratios of the centred (x, y) cloud.
///
/// Returns `None` for fewer than three distinct points or a cloud with no
/// spread at all.
pub fn coordinate_pca(points: &[(f64, f64)]) -> Option<PcaResult> {
    let distinct: HashSet<(u64, u64)> = points
        .iter()
        .map(|(x, y)| (x.to_bits(), y.to_bits()))
        .collect();
    if distinct.len() < 3 {
        return None;
    }

    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0_f64, 0.0_f64), |(ax, ay), &(x, y)| (ax + x, ay + y));
    let (mx, my) = (sx / n, sy / n);

    let (mut cxx, mut cyy, mut cxy) = (0.0_f64, 0.0_f64, 0.0_f64);
    for &(x, y) in points {
        let dx = x - mx;
        let dy = y - my;
        cxx += dx * dx;
        cyy += dy * dy;
        cxy += dx * dy;
    }
    cxx /= n;
    cyy /= n;
    cxy /= n;

    // Closed-form eigenvalues of the symmetric 2x2 covariance
    let half_trace = (cxx + cyy) / 2.0;
    let disc = (((cxx - cyy) / 2.0).powi(2) + cxy * cxy).sqrt();
    let l1 = half_trace + disc;
    let l2 = (half_trace - disc).max(0.0);
    let total = l1 + l2;
    if !total.is_finite() || total <= EPSILON {
        return None;
    }

    Some(PcaResult {
        major_variance: l1 / total,
        minor_variance: l2 / total,
        eigenvalues: [l1, l2],
        points: points.len(),
    })
}
