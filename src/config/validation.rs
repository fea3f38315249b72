//! Survey config checks
//!
//! Unknown keys are found by walking the raw `toml::Value` before serde sees
//! the document; each one is reported with the nearest known key (edit
//! distance <= 3) as a hint. Plausibility checks run on the parsed
//! `SurveyConfig`. Neither pass rejects an unknown key.

use std::collections::HashSet;

/// Unknown key or legal-but-unusual value
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for SurveyConfig.
///
/// Maintained by hand to match the struct hierarchy in survey_config.rs.
/// Any new field added to SurveyConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [batch]
        "batch",
        "batch.max_concurrent_files",
        "batch.max_memory_gb",
        "batch.timeout_seconds",
        "batch.default_analysis_type",
        "batch.max_traces_per_file",
        "batch.continue_on_error",
        "batch.error_threshold",
        "batch.max_retry_attempts",
        "batch.progress_interval_secs",
        "batch.memory_check_interval_secs",
        // [classifier]
        "classifier",
        "classifier.min_unique_for_dimension",
        "classifier.max_cdps_for_shot_gather",
        "classifier.pca_linear_threshold",
        "classifier.pca_areal_threshold",
        "classifier.prestack_distinct_offset_fraction",
        "classifier.dominant_cdp_fraction",
        "classifier.min_distinct_offsets_for_gather",
        "classifier.large_sample_traces",
        "classifier.very_large_sample_traces",
        "classifier.max_header_samples",
        // [validation]
        "validation",
        "validation.min_file_size_bytes",
        "validation.min_sample_interval_us",
        "validation.max_sample_interval_us",
        "validation.normal_interval_min_us",
        "validation.normal_interval_max_us",
        "validation.max_sample_count",
        "validation.warn_sample_count",
        "validation.standard_format_codes",
        // [quality]
        "quality",
        "quality.quick_trace_sample",
        "quality.amplitude_decimation",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Edit distance over chars
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smaller key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Plausibility Range Validation
// ============================================================================

/// Validate plausible ranges on a parsed SurveyConfig.
///
/// Returns (errors, warnings). Errors are values that cannot work; warnings
/// are legal but unusual.
pub fn validate_physical_ranges(
    config: &super::SurveyConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let b = &config.batch;
    let v = &config.validation;

    // Smaller files cannot hold even the binary header.
    if v.min_file_size_bytes < 400 {
        errors.push(format!(
            "validation.min_file_size_bytes = {} is below the 400-byte binary header",
            v.min_file_size_bytes
        ));
    }

    if v.standard_format_codes.is_empty() {
        errors.push("validation.standard_format_codes must not be empty".to_string());
    }

    if b.max_concurrent_files > 256 {
        warnings.push(ValidationWarning {
            field: "batch.max_concurrent_files".to_string(),
            message: format!(
                "max_concurrent_files = {} is unusually high, each worker holds a trace sample in memory",
                b.max_concurrent_files
            ),
            suggestion: None,
        });
    }

    if b.max_memory_gb.is_finite() && b.max_memory_gb < 0.5 {
        warnings.push(ValidationWarning {
            field: "batch.max_memory_gb".to_string(),
            message: format!(
                "max_memory_gb = {:.2} is below 0.5 GiB, reclamation hints will fire constantly",
                b.max_memory_gb
            ),
            suggestion: None,
        });
    }

    if b.timeout_seconds > 0 && b.timeout_seconds < 10 {
        warnings.push(ValidationWarning {
            field: "batch.timeout_seconds".to_string(),
            message: format!(
                "timeout_seconds = {} is very short for multi-gigabyte files",
                b.timeout_seconds
            ),
            suggestion: None,
        });
    }

    if b.max_traces_per_file > 100_000 {
        warnings.push(ValidationWarning {
            field: "batch.max_traces_per_file".to_string(),
            message: format!(
                "max_traces_per_file = {} defeats bounded sampling",
                b.max_traces_per_file
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurveyConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("batch", "batch"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("treshold", "threshold"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [batch]
            max_concurrent_files = 2
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"batch".to_string()));
        assert!(keys.contains(&"batch.max_concurrent_files".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys(
            r#"
[batch]
error_treshold = 0.3
"#,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("batch.error_threshold")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let warnings = validate_unknown_keys(
            r#"
[batch]
max_concurrent_files = 2
continue_on_error = true

[classifier]
pca_linear_threshold = 0.9997

[quality]
amplitude_decimation = 1
"#,
        );
        assert!(warnings.is_empty(), "got: {:?}", warnings);
    }

    #[test]
    fn test_unknown_section_produces_warning() {
        let warnings = validate_unknown_keys("[petrophysics]\nporosity = 0.2\n");
        assert!(warnings.iter().any(|w| w.field == "petrophysics"));
    }

    #[test]
    fn test_no_suggestion_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_defaults_clean() {
        let (errors, warnings) = validate_physical_ranges(&SurveyConfig::default());
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_empty_format_codes_is_error() {
        let mut config = SurveyConfig::default();
        config.validation.standard_format_codes.clear();
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("standard_format_codes")));
    }

    #[test]
    fn test_tiny_memory_ceiling_warns() {
        let mut config = SurveyConfig::default();
        config.batch.max_memory_gb = 0.1;
        let (_, warnings) = validate_physical_ranges(&config);
        assert!(warnings.iter().any(|w| w.field == "batch.max_memory_gb"));
    }
}
