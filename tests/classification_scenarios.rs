//! Geometry Classification Scenarios
//!
//! End-to-end checks of the rule cascade through the public API: statistics
//! handed straight to the classifier, and synthetic surveys read through the
//! in-memory reader.

use std::path::Path;
use std::sync::Arc;

use seisqc::config::ClassifierConfig;
use seisqc::geometry::{ClassificationCache, InMemoryClassificationCache};
use seisqc::reader::SyntheticSurvey;
use seisqc::types::{GeometryStats, PcaResult, TraceHeaderSample};
use seisqc::{
    ConfidenceLevel, GeometryClassifier, MemoryReader, PrimarySorting, StackType, SurveyType,
    TraceReader,
};

fn pca(major: f64, points: usize) -> PcaResult {
    PcaResult {
        major_variance: major,
        minor_variance: 1.0 - major,
        eigenvalues: [major * 100.0, (1.0 - major) * 100.0],
        points,
    }
}

fn classifier() -> GeometryClassifier {
    GeometryClassifier::new(ClassifierConfig::default())
}

// ============================================================================
// Statistics-level scenarios
// ============================================================================

#[test]
fn inline_crossline_grid_with_areal_coordinates_is_3d() {
    let stats = GeometryStats {
        traces_sampled: 108,
        unique_inlines: 12,
        unique_crosslines: 9,
        unique_cdps: 108,
        pca: Some(pca(0.85, 108)),
        ..Default::default()
    };
    let r = classifier().classify_stats(stats, 0);
    assert_eq!(r.survey_type, SurveyType::ThreeD);
    assert!(
        r.confidence.rank() >= ConfidenceLevel::Medium.rank(),
        "confidence {:?} below medium",
        r.confidence
    );
    assert!(r.evidence_supports_confidence());
}

#[test]
fn many_field_records_over_few_cdps_on_a_line_is_2d_prestack() {
    let stats = GeometryStats {
        traces_sampled: 960,
        unique_field_records: 40,
        unique_shot_points: 40,
        unique_cdps: 3,
        unique_offsets: 24,
        nonzero_offset_count: 960,
        unique_nonzero_offsets: 24,
        pca: Some(pca(0.9999, 40)),
        ..Default::default()
    };
    let r = classifier().classify_stats(stats, 0);
    assert_eq!(r.survey_type, SurveyType::TwoD);
    assert_eq!(r.stack_type, StackType::Prestack);
    assert_eq!(r.primary_sorting, PrimarySorting::ShotPoint);
}

#[test]
fn classification_is_deterministic() {
    let reader = MemoryReader::new();
    reader.insert("/survey/a.sgy", SyntheticSurvey::line_2d(80, 20));
    let handle = reader.open(Path::new("/survey/a.sgy")).unwrap();

    let c = classifier();
    let first = c.classify_file(Path::new("/survey/a.sgy"), handle.as_ref());
    c.clear_cache();
    let second = c.classify_file(Path::new("/survey/a.sgy"), handle.as_ref());
    assert_eq!(first, second);
}

#[test]
fn no_readable_headers_is_undetermined_very_low() {
    let r = classifier().classify(&TraceHeaderSample {
        total_traces: 50,
        skipped: 50,
        ..Default::default()
    });
    assert_eq!(r.survey_type, SurveyType::Undetermined);
    assert_eq!(r.primary_sorting, PrimarySorting::Undetermined);
    assert_eq!(r.stack_type, StackType::Undetermined);
    assert_eq!(r.confidence, ConfidenceLevel::VeryLow);
    assert_eq!(r.traces_skipped, 50);
}

// ============================================================================
// Synthetic surveys through the reader
// ============================================================================

fn classify(survey: SyntheticSurvey) -> seisqc::ClassificationResult {
    let reader = MemoryReader::new();
    reader.insert("/s.sgy", survey);
    let handle = reader.open(Path::new("/s.sgy")).unwrap();
    classifier().classify_file(Path::new("/s.sgy"), handle.as_ref())
}

#[test]
fn synthetic_3d_grid() {
    let r = classify(SyntheticSurvey::grid_3d(12, 9, 20));
    assert_eq!(r.survey_type, SurveyType::ThreeD);
    assert_eq!(r.primary_sorting, PrimarySorting::Inline);
    assert_eq!(r.stack_type, StackType::Poststack);
    let geometry = r.geometry.unwrap();
    assert_eq!(geometry.unique_inlines, 12);
    assert_eq!(geometry.unique_crosslines, 9);
}

#[test]
fn synthetic_shot_gathers_on_a_line() {
    let r = classify(SyntheticSurvey::shot_gathers(40, 24, 20));
    assert_eq!(r.survey_type, SurveyType::TwoD);
    assert_eq!(r.stack_type, StackType::Prestack);
    assert_eq!(r.primary_sorting, PrimarySorting::ShotPoint);
}

#[test]
fn partially_unreadable_headers_are_counted() {
    let r = classify(SyntheticSurvey::line_2d(60, 10).with_unreadable_traces([3, 7, 11]));
    assert_eq!(r.survey_type, SurveyType::TwoD);
    assert_eq!(r.traces_skipped, 3);
    assert_eq!(r.traces_analyzed, 57);
}

#[test]
fn injected_cache_is_consulted_and_filled() {
    let cache = Arc::new(InMemoryClassificationCache::new());
    let c = GeometryClassifier::with_cache(ClassifierConfig::default(), cache.clone());
    let reader = MemoryReader::new();
    reader.insert("/cube.sgy", SyntheticSurvey::grid_3d(5, 5, 10));
    let handle = reader.open(Path::new("/cube.sgy")).unwrap();

    let r = c.classify_file(Path::new("/cube.sgy"), handle.as_ref());
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(Path::new("/cube.sgy")), Some(r));
}

#[test]
fn classification_round_trips_through_json() {
    let r = classify(SyntheticSurvey::grid_3d(6, 7, 10));
    let json = serde_json::to_string(&r).unwrap();
    assert!(json.contains("\"survey_type\":\"3D\""));
    let back: seisqc::ClassificationResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.survey_type, r.survey_type);
    assert_eq!(back.primary_sorting, r.primary_sorting);
    assert_eq!(back.stack_type, r.stack_type);
    assert_eq!(back.confidence, r.confidence);
    assert_eq!(back.evidence, r.evidence);
    let (a, b) = (back.geometry.unwrap(), r.geometry.unwrap());
    assert_eq!(a.unique_cdps, b.unique_cdps);
    assert!((a.major_variance().unwrap() - b.major_variance().unwrap()).abs() < 1e-12);
}
