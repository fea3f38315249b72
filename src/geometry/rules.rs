//! Ordered classification rules
//!
//! Each rule is an independent predicate over [`GeometryStats`]. The
//! classifier evaluates them in order and keeps the first verdict. The last
//! rule always answers.

use crate::config::ClassifierConfig;
use crate::types::{ConfidenceLevel, GeometryStats, PrimarySorting, StackType, SurveyType};

/// Outcome of a rule that accepted the sample
#[derive(Debug, Clone, PartialEq)]
pub struct RuleVerdict {
    pub survey_type: SurveyType,
    pub primary_sorting: PrimarySorting,
    pub stack_type: StackType,
    pub confidence: ConfidenceLevel,
    pub method: &'static str,
    /// Header evidence strong enough to earn a confidence step on its own
    pub strong: bool,
    /// PCA agrees with the inferred dimension
    pub coordinates_verified: bool,
    pub evidence: Vec<String>,
}

pub trait ClassificationRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, stats: &GeometryStats, config: &ClassifierConfig) -> Option<RuleVerdict>;
}

/// The default cascade, in evaluation order
pub fn default_rules() -> Vec<Box<dyn ClassificationRule>> {
    vec![
        Box::new(InlineCrosslineGrid),
        Box::new(ShotGatherRecords),
        Box::new(CdpShotPointLine),
        Box::new(DominantCdpGather),
        Box::new(VariationFallback),
    ]
}

// ============================================================================
// Shared heuristics
// ============================================================================

/// Prestack when the share of distinct non-zero offsets exceeds the
/// configured fraction. No non-zero offsets reads as poststack.
pub fn infer_stack_type(stats: &GeometryStats, config: &ClassifierConfig) -> (StackType, String) {
    if stats.nonzero_offset_count == 0 {
        return (
            StackType::Poststack,
            "stack: no non-zero offsets, poststack".to_string(),
        );
    }
    let ratio = stats.unique_nonzero_offsets as f64 / stats.nonzero_offset_count as f64;
    if ratio > config.prestack_distinct_offset_fraction {
        (
            StackType::Prestack,
            format!(
                "stack: {:.1}% of non-zero offsets distinct (> {:.1}%), prestack",
                ratio * 100.0,
                config.prestack_distinct_offset_fraction * 100.0
            ),
        )
    } else {
        (
            StackType::Poststack,
            format!(
                "stack: {:.1}% of non-zero offsets distinct (<= {:.1}%), poststack",
                ratio * 100.0,
                config.prestack_distinct_offset_fraction * 100.0
            ),
        )
    }
}

/// Line vs area from the PCA split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Linear,
    Areal,
    Ambiguous,
    Unavailable,
}

pub fn coordinate_layout(stats: &GeometryStats, config: &ClassifierConfig) -> Layout {
    match stats.major_variance() {
        None => Layout::Unavailable,
        Some(r) if r > config.pca_linear_threshold => Layout::Linear,
        Some(r) if r < config.pca_areal_threshold => Layout::Areal,
        Some(_) => Layout::Ambiguous,
    }
}

fn layout_evidence(stats: &GeometryStats, config: &ClassifierConfig) -> String {
    match (stats.major_variance(), coordinate_layout(stats, config)) {
        (Some(r), Layout::Linear) => format!(
            "coordinates collinear (PCA major variance {:.5} > {})",
            r, config.pca_linear_threshold
        ),
        (Some(r), Layout::Areal) => format!(
            "coordinates areal (PCA major variance {:.5} < {})",
            r, config.pca_areal_threshold
        ),
        (Some(r), _) => format!("coordinate layout ambiguous (PCA major variance {r:.5})"),
        (None, _) => "coordinates unavailable for PCA".to_string(),
    }
}

// ============================================================================
// Rules
// ============================================================================

/// Inline and crossline both vary: a 3D volume
pub struct InlineCrosslineGrid;

impl ClassificationRule for InlineCrosslineGrid {
    fn name(&self) -> &'static str {
        "inline_crossline_grid"
    }

    fn evaluate(&self, stats: &GeometryStats, config: &ClassifierConfig) -> Option<RuleVerdict> {
        let min = config.min_unique_for_dimension;
        if stats.unique_inlines < min || stats.unique_crosslines < min {
            return None;
        }

        let primary_sorting = if stats.unique_inlines >= stats.unique_crosslines {
            PrimarySorting::Inline
        } else {
            PrimarySorting::Crossline
        };
        let (stack_type, stack_note) = infer_stack_type(stats, config);
        let areal = coordinate_layout(stats, config) == Layout::Areal;

        Some(RuleVerdict {
            survey_type: SurveyType::ThreeD,
            primary_sorting,
            stack_type,
            confidence: if areal {
                ConfidenceLevel::High
            } else {
                ConfidenceLevel::Medium
            },
            method: self.name(),
            strong: true,
            coordinates_verified: areal,
            evidence: vec![
                format!("{} unique inlines (>= {min})", stats.unique_inlines),
                format!("{} unique crosslines (>= {min})", stats.unique_crosslines),
                layout_evidence(stats, config),
                stack_note,
            ],
        })
    }
}

/// Many field records over a handful of CDPs: raw shot gathers.
///
/// Coordinates decide the dimension: collinear is 2D, areal is 3D. When the
/// PCA ratio falls between the two thresholds, or no coordinates vary, the
/// survey type is reported as `ShotGather` rather than `Undetermined`. The
/// gather layout itself is established, so the result stays usable for QC
/// profile selection; confidence drops to medium.
pub struct ShotGatherRecords;

impl ClassificationRule for ShotGatherRecords {
    fn name(&self) -> &'static str {
        "field_record_gathers"
    }

    fn evaluate(&self, stats: &GeometryStats, config: &ClassifierConfig) -> Option<RuleVerdict> {
        if stats.unique_field_records < config.min_unique_for_dimension
            || stats.unique_cdps > config.max_cdps_for_shot_gather
        {
            return None;
        }

        let (survey_type, resolved) = match coordinate_layout(stats, config) {
            Layout::Linear => (SurveyType::TwoD, true),
            Layout::Areal => (SurveyType::ThreeD, true),
            Layout::Ambiguous | Layout::Unavailable => (SurveyType::ShotGather, false),
        };

        Some(RuleVerdict {
            survey_type,
            primary_sorting: PrimarySorting::ShotPoint,
            stack_type: StackType::Prestack,
            confidence: if resolved {
                ConfidenceLevel::High
            } else {
                ConfidenceLevel::Medium
            },
            method: self.name(),
            strong: true,
            coordinates_verified: resolved,
            evidence: vec![
                format!(
                    "{} unique field records (>= {})",
                    stats.unique_field_records, config.min_unique_for_dimension
                ),
                format!(
                    "{} unique CDPs (<= {}), traces grouped by shot",
                    stats.unique_cdps, config.max_cdps_for_shot_gather
                ),
                layout_evidence(stats, config),
            ],
        })
    }
}

/// CDP or shot-point numbers vary along a single line: 2D
pub struct CdpShotPointLine;

impl ClassificationRule for CdpShotPointLine {
    fn name(&self) -> &'static str {
        "cdp_shotpoint_line"
    }

    fn evaluate(&self, stats: &GeometryStats, config: &ClassifierConfig) -> Option<RuleVerdict> {
        let min = config.min_unique_for_dimension;
        if stats.unique_cdps < min && stats.unique_shot_points < min {
            return None;
        }

        let primary_sorting = if stats.unique_cdps >= stats.unique_shot_points {
            PrimarySorting::Cdp
        } else {
            PrimarySorting::ShotPoint
        };
        let (stack_type, stack_note) = infer_stack_type(stats, config);
        let linear = coordinate_layout(stats, config) == Layout::Linear;

        Some(RuleVerdict {
            survey_type: SurveyType::TwoD,
            primary_sorting,
            stack_type,
            confidence: if linear {
                ConfidenceLevel::High
            } else {
                ConfidenceLevel::Medium
            },
            method: self.name(),
            strong: false,
            coordinates_verified: linear,
            evidence: vec![
                format!(
                    "{} unique CDPs, {} unique shot points (>= {min})",
                    stats.unique_cdps, stats.unique_shot_points
                ),
                layout_evidence(stats, config),
                stack_note,
            ],
        })
    }
}

/// One CDP dominates while offsets vary: a prestack CDP gather
pub struct DominantCdpGather;

impl ClassificationRule for DominantCdpGather {
    fn name(&self) -> &'static str {
        "cdp_gather"
    }

    fn evaluate(&self, stats: &GeometryStats, config: &ClassifierConfig) -> Option<RuleVerdict> {
        if stats.dominant_cdp_fraction <= config.dominant_cdp_fraction
            || stats.unique_offsets < config.min_distinct_offsets_for_gather
        {
            return None;
        }

        let (survey_type, resolved) = match coordinate_layout(stats, config) {
            Layout::Linear => (SurveyType::TwoD, true),
            Layout::Areal => (SurveyType::ThreeD, true),
            Layout::Ambiguous | Layout::Unavailable => (SurveyType::Undetermined, false),
        };

        Some(RuleVerdict {
            survey_type,
            primary_sorting: PrimarySorting::Cdp,
            stack_type: StackType::Prestack,
            confidence: ConfidenceLevel::Medium,
            method: self.name(),
            strong: false,
            coordinates_verified: resolved,
            evidence: vec![
                format!(
                    "one CDP on {:.0}% of sampled traces (> {:.0}%)",
                    stats.dominant_cdp_fraction * 100.0,
                    config.dominant_cdp_fraction * 100.0
                ),
                format!(
                    "{} distinct offsets (>= {})",
                    stats.unique_offsets, config.min_distinct_offsets_for_gather
                ),
            ],
        })
    }
}

/// Best-effort guess from whichever header family varies at all
pub struct VariationFallback;

impl ClassificationRule for VariationFallback {
    fn name(&self) -> &'static str {
        "variation_fallback"
    }

    fn evaluate(&self, stats: &GeometryStats, config: &ClassifierConfig) -> Option<RuleVerdict> {
        let (stack_type, stack_note) = infer_stack_type(stats, config);
        let guess = |survey_type, primary_sorting, stack_type, note: String| RuleVerdict {
            survey_type,
            primary_sorting,
            stack_type,
            confidence: ConfidenceLevel::Low,
            method: "variation_fallback",
            strong: false,
            coordinates_verified: false,
            evidence: vec![note],
        };

        let mut verdict = if stats.unique_inlines > 1 && stats.unique_crosslines > 1 {
            let sorting = if stats.unique_inlines >= stats.unique_crosslines {
                PrimarySorting::Inline
            } else {
                PrimarySorting::Crossline
            };
            guess(
                SurveyType::ThreeD,
                sorting,
                stack_type,
                format!(
                    "weak variation in inline ({}) and crossline ({})",
                    stats.unique_inlines, stats.unique_crosslines
                ),
            )
        } else if stats.unique_field_records > 1 {
            guess(
                SurveyType::ShotGather,
                PrimarySorting::ShotPoint,
                StackType::Prestack,
                format!("weak variation in field record ({})", stats.unique_field_records),
            )
        } else if stats.unique_cdps > 1 || stats.unique_shot_points > 1 {
            let sorting = if stats.unique_cdps >= stats.unique_shot_points {
                PrimarySorting::Cdp
            } else {
                PrimarySorting::ShotPoint
            };
            guess(
                SurveyType::TwoD,
                sorting,
                stack_type,
                format!(
                    "weak variation in CDP ({}) / shot point ({})",
                    stats.unique_cdps, stats.unique_shot_points
                ),
            )
        } else if stats.unique_inlines > 1 || stats.unique_crosslines > 1 {
            let sorting = if stats.unique_inlines > 1 {
                PrimarySorting::Inline
            } else {
                PrimarySorting::Crossline
            };
            guess(
                SurveyType::TwoD,
                sorting,
                stack_type,
                "single varying line number".to_string(),
            )
        } else {
            match coordinate_layout(stats, config) {
                Layout::Linear => guess(
                    SurveyType::TwoD,
                    PrimarySorting::Undetermined,
                    stack_type,
                    "only coordinates vary, collinear".to_string(),
                ),
                Layout::Areal => guess(
                    SurveyType::ThreeD,
                    PrimarySorting::Undetermined,
                    stack_type,
                    "only coordinates vary, areal".to_string(),
                ),
                Layout::Ambiguous | Layout::Unavailable => RuleVerdict {
                    survey_type: SurveyType::Undetermined,
                    primary_sorting: PrimarySorting::Undetermined,
                    stack_type: StackType::Undetermined,
                    confidence: ConfidenceLevel::VeryLow,
                    method: "no_variation",
                    strong: false,
                    coordinates_verified: false,
                    evidence: vec!["no header family varies across the sample".to_string()],
                },
            }
        };

        if verdict.survey_type != SurveyType::Undetermined
            && verdict.stack_type != StackType::Prestack
        {
            verdict.evidence.push(stack_note);
        }
        Some(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PcaResult;

    fn pca(major: f64) -> Option<PcaResult> {
        Some(PcaResult {
            major_variance: major,
            minor_variance: 1.0 - major,
            eigenvalues: [major, 1.0 - major],
            points: 100,
        })
    }

    fn cfg() -> ClassifierConfig {
        ClassifierConfig::default()
    }

    #[test]
    fn test_grid_rule_areal_is_high() {
        let stats = GeometryStats {
            unique_inlines: 12,
            unique_crosslines: 9,
            pca: pca(0.85),
            ..Default::default()
        };
        let v = InlineCrosslineGrid.evaluate(&stats, &cfg()).unwrap();
        assert_eq!(v.survey_type, SurveyType::ThreeD);
        assert_eq!(v.primary_sorting, PrimarySorting::Inline);
        assert_eq!(v.confidence, ConfidenceLevel::High);
        assert!(v.coordinates_verified);
    }

    #[test]
    fn test_grid_rule_needs_both_dimensions() {
        let stats = GeometryStats {
            unique_inlines: 12,
            unique_crosslines: 2,
            ..Default::default()
        };
        assert!(InlineCrosslineGrid.evaluate(&stats, &cfg()).is_none());
    }

    #[test]
    fn test_shot_gather_dimension_from_pca() {
        let mut stats = GeometryStats {
            unique_field_records: 40,
            unique_cdps: 3,
            pca: pca(0.9999),
            ..Default::default()
        };
        let v = ShotGatherRecords.evaluate(&stats, &cfg()).unwrap();
        assert_eq!(v.survey_type, SurveyType::TwoD);
        assert_eq!(v.stack_type, StackType::Prestack);

        stats.pca = pca(0.9995);
        let v = ShotGatherRecords.evaluate(&stats, &cfg()).unwrap();
        assert_eq!(v.survey_type, SurveyType::ShotGather);
        assert_eq!(v.confidence, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_shot_gather_rejects_many_cdps() {
        let stats = GeometryStats {
            unique_field_records: 40,
            unique_cdps: 11,
            ..Default::default()
        };
        assert!(ShotGatherRecords.evaluate(&stats, &cfg()).is_none());
    }

    #[test]
    fn test_line_rule_sorting() {
        let stats = GeometryStats {
            unique_cdps: 2,
            unique_shot_points: 30,
            pca: pca(0.99995),
            ..Default::default()
        };
        let v = CdpShotPointLine.evaluate(&stats, &cfg()).unwrap();
        assert_eq!(v.primary_sorting, PrimarySorting::ShotPoint);
        assert_eq!(v.confidence, ConfidenceLevel::High);
    }

    #[test]
    fn test_stack_heuristic() {
        let mut stats = GeometryStats {
            nonzero_offset_count: 100,
            unique_nonzero_offsets: 11,
            ..Default::default()
        };
        assert_eq!(infer_stack_type(&stats, &cfg()).0, StackType::Prestack);
        stats.unique_nonzero_offsets = 10;
        assert_eq!(infer_stack_type(&stats, &cfg()).0, StackType::Poststack);
        stats.nonzero_offset_count = 0;
        assert_eq!(infer_stack_type(&stats, &cfg()).0, StackType::Poststack);
    }

    #[test]
    fn test_dominant_cdp_gather() {
        let stats = GeometryStats {
            unique_cdps: 1,
            unique_offsets: 8,
            dominant_cdp_fraction: 1.0,
            ..Default::default()
        };
        let v = DominantCdpGather.evaluate(&stats, &cfg()).unwrap();
        assert_eq!(v.primary_sorting, PrimarySorting::Cdp);
        assert_eq!(v.stack_type, StackType::Prestack);
        assert_eq!(v.confidence, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_fallback_without_variation() {
        let v = VariationFallback
            .evaluate(&GeometryStats::default(), &cfg())
            .unwrap();
        assert_eq!(v.survey_type, SurveyType::Undetermined);
        assert_eq!(v.confidence, ConfidenceLevel::VeryLow);
    }

    #[test]
    fn test_fallback_weak_guess() {
        let stats = GeometryStats {
            unique_cdps: 2,
            ..Default::default()
        };
        let v = VariationFallback.evaluate(&stats, &cfg()).unwrap();
        assert_eq!(v.survey_type, SurveyType::TwoD);
        assert_eq!(v.confidence, ConfidenceLevel::Low);
    }
}
