//! Geometry Classifier
//!
//! Turns a trace header sample into {survey type, primary sorting, stack
//! type, confidence}:
//!
//! 1. [`stats::compute_geometry_stats`] reduces the sample to unique counts,
//!    ranges and a PCA split of the coordinates.
//! 2. The ordered [`rules`] cascade picks the first rule that accepts.
//! 3. Confidence escalates one step each for a strong rule, a PCA that
//!    agrees with the inferred dimension, and a large sample (two steps for
//!    a very large one). Every step appends an evidence line.

pub mod cache;
pub mod pca;
pub mod rules;
pub mod stats;

pub use cache::{ClassificationCache, InMemoryClassificationCache};
pub use rules::{default_rules, ClassificationRule, RuleVerdict};
pub use stats::compute_geometry_stats;

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::acquisition::HeaderSampler;
use crate::config::ClassifierConfig;
use crate::reader::TraceHandle;
use crate::types::{ClassificationResult, GeometryStats, SurveyType, TraceHeaderSample};

pub struct GeometryClassifier {
    config: ClassifierConfig,
    rules: Vec<Box<dyn ClassificationRule>>,
    cache: Arc<dyn ClassificationCache>,
}

impl GeometryClassifier {
    /// Default cascade with a private in-memory cache
    pub fn new(config: ClassifierConfig) -> Self {
        Self::with_cache(config, Arc::new(InMemoryClassificationCache::new()))
    }

    pub fn with_cache(config: ClassifierConfig, cache: Arc<dyn ClassificationCache>) -> Self {
        Self {
            config,
            rules: default_rules(),
            cache,
        }
    }

    /// Replace the rule cascade. The last rule should always answer.
    pub fn with_rules(mut self, rules: Vec<Box<dyn ClassificationRule>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn ClassificationCache> {
        &self.cache
    }

    /// Pure classification of one header sample. Never fails: a sample with
    /// no readable traces yields an undetermined, very-low verdict.
    pub fn classify(&self, sample: &TraceHeaderSample) -> ClassificationResult {
        if sample.is_empty() {
            return ClassificationResult::undetermined(
                format!(
                    "no readable trace headers ({} sampled, {} unreadable, {} declared)",
                    sample.len() + sample.skipped,
                    sample.skipped,
                    sample.total_traces
                ),
                sample.skipped,
            );
        }
        let stats = compute_geometry_stats(sample);
        self.classify_stats(stats, sample.skipped)
    }

    /// Run the cascade and confidence escalation over precomputed statistics.
    pub fn classify_stats(&self, stats: GeometryStats, traces_skipped: usize) -> ClassificationResult {
        let Some(verdict) = self
            .rules
            .iter()
            .find_map(|rule| rule.evaluate(&stats, &self.config))
        else {
            return ClassificationResult::undetermined("no classification rule accepted", traces_skipped);
        };

        let mut confidence = verdict.confidence;
        let mut evidence = verdict.evidence;
        let n = stats.traces_sampled;
        let c = &self.config;

        if verdict.survey_type != SurveyType::Undetermined {
            if verdict.strong {
                confidence = confidence.escalate();
                evidence.push(format!("strong-evidence method: {}", verdict.method));
            }
            if verdict.coordinates_verified {
                confidence = confidence.escalate();
                evidence.push("coordinate verification agrees with header geometry".to_string());
            }
            if n > c.large_sample_traces {
                confidence = confidence.escalate();
                evidence.push(format!("{n} traces analyzed (> {})", c.large_sample_traces));
            }
            if n > c.very_large_sample_traces {
                confidence = confidence.escalate();
                evidence.push(format!("{n} traces analyzed (> {})", c.very_large_sample_traces));
            }
        }

        debug!(
            method = verdict.method,
            survey_type = %verdict.survey_type,
            confidence = %confidence,
            traces = n,
            "Geometry classified"
        );

        ClassificationResult {
            survey_type: verdict.survey_type,
            primary_sorting: verdict.primary_sorting,
            stack_type: verdict.stack_type,
            confidence,
            method: verdict.method.to_string(),
            evidence,
            traces_analyzed: n,
            traces_skipped,
            geometry: Some(stats),
        }
    }

    /// Sample headers from an open file and classify, reusing a cached
    /// verdict for the same path.
    pub fn classify_file(&self, path: &Path, handle: &dyn TraceHandle) -> ClassificationResult {
        if let Some(hit) = self.cache.get(path) {
            debug!(path = %path.display(), "Classification cache hit");
            return hit;
        }
        let sample = HeaderSampler::new(self.config.max_header_samples).sample(handle);
        let result = self.classify(&sample);
        self.cache.insert(path.to_path_buf(), result.clone());
        result
    }

    pub fn cached(&self, path: &Path) -> Option<ClassificationResult> {
        self.cache.get(path)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
