//! File discovery
//!
//! Resolves a glob-style pattern into a sorted, de-duplicated file list.
//! Supported forms:
//!
//! - an existing file: that file
//! - an existing directory: every seismic file directly inside it
//! - `dir/line_*.sgy`, `dir/**/*.segy`: glob below the literal prefix
//! - a pattern without extension (`dir/line_*`, `dir/line_01`): matches
//!   `.sgy`/`.segy`
//!
//! `*` and `?` stay within one path component; `**` crosses components.

use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions treated as seismic trace files, compared case-insensitively
pub const SEISMIC_EXTENSIONS: &[&str] = &["sgy", "segy"];

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Empty file pattern")]
    EmptyPattern,

    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub fn is_seismic_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SEISMIC_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

fn has_glob(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// Translate a glob (relative, `/`-separated) into an anchored regex.
pub fn glob_to_regex(glob: &str) -> String {
    let mut re = String::from("^");
    let chars: Vec<char> = glob.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                // `**/` also matches zero directories
                if chars.get(i + 2) == Some(&'/') {
                    re.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    re.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    re
}

/// Split a pattern into the literal directory prefix and the glob remainder.
fn split_pattern(pattern: &Path) -> (PathBuf, Vec<String>) {
    let mut base = PathBuf::new();
    let mut rest: Vec<String> = Vec::new();
    for comp in pattern.components() {
        let s = comp.as_os_str().to_string_lossy().into_owned();
        if rest.is_empty() && !has_glob(&s) {
            base.push(comp);
        } else if !matches!(comp, Component::CurDir) {
            rest.push(s);
        }
    }
    if base.as_os_str().is_empty() {
        base.push(".");
    }
    (base, rest)
}

fn relative_slash_path(path: &Path, base: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Seismic files next to `path` whose stem is `path`'s file name.
fn seismic_siblings(path: &Path) -> Vec<PathBuf> {
    let Some(stem) = path.file_name() else {
        return Vec::new();
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Vec::new();
    }
    WalkDir::new(parent)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_type().is_file()
                && is_seismic_file(e.path())
                && e.path().file_stem() == Some(stem)
        })
        .map(|e| parent.join(e.file_name()))
        .collect()
}

pub fn discover(pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(DiscoveryError::EmptyPattern);
    }
    let pattern_path = Path::new(pattern);
    let mut found: BTreeSet<PathBuf> = BTreeSet::new();

    if !has_glob(pattern) {
        if pattern_path.is_file() {
            found.insert(pattern_path.to_path_buf());
        } else if pattern_path.is_dir() {
            for entry in WalkDir::new(pattern_path)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(Result::ok)
            {
                if entry.file_type().is_file() && is_seismic_file(entry.path()) {
                    found.insert(entry.into_path());
                }
            }
        } else if pattern_path.extension().is_none() {
            found.extend(seismic_siblings(pattern_path));
        }
        if found.is_empty() {
            warn!(pattern, "Pattern matches no file or directory");
        }
        return Ok(found.into_iter().collect());
    }

    let (base, rest) = split_pattern(pattern_path);
    if !base.is_dir() {
        warn!(base = %base.display(), "Pattern base directory does not exist");
        return Ok(Vec::new());
    }

    let glob = rest.join("/");
    let last = rest.last().map(String::as_str).unwrap_or("");
    let mut regex_src = glob_to_regex(&glob);
    if !last.contains('.') {
        regex_src.push_str(r"\.(?i:sgy|segy)");
    }
    regex_src.push('$');
    let re = Regex::new(&regex_src).map_err(|source| DiscoveryError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut walker = WalkDir::new(&base).min_depth(1);
    if !glob.contains("**") {
        walker = walker.max_depth(rest.len());
    }
    for entry in walker.into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(rel) = relative_slash_path(entry.path(), &base) {
            if re.is_match(&rel) {
                found.insert(entry.into_path());
            }
        }
    }

    debug!(pattern, matched = found.len(), "Discovery complete");
    Ok(found.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let p = dir.join(rel);
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(p, b"x").unwrap();
    }

    fn names(paths: &[PathBuf], base: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| relative_slash_path(p, base).unwrap())
            .collect()
    }

    fn layout() -> TempDir {
        let dir = TempDir::new().unwrap();
        for f in [
            "line_01.sgy",
            "line_02.SEGY",
            "line_03.txt",
            "cube.segy",
            "sub/line_10.sgy",
            "sub/deeper/line_11.sgy",
        ] {
            touch(dir.path(), f);
        }
        dir
    }

    #[test]
    fn test_glob_translation() {
        assert_eq!(glob_to_regex("a*.sgy"), r"^a[^/]*\.sgy");
        assert_eq!(glob_to_regex("**/x?"), r"^(?:.*/)?x[^/]");
    }

    #[test]
    fn test_directory_pattern() {
        let dir = layout();
        let found = discover(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(
            names(&found, dir.path()),
            vec!["cube.segy", "line_01.sgy", "line_02.SEGY"]
        );
    }

    #[test]
    fn test_pattern_with_extension() {
        let dir = layout();
        let pattern = format!("{}/line_*.sgy", dir.path().display());
        let found = discover(&pattern).unwrap();
        assert_eq!(names(&found, dir.path()), vec!["line_01.sgy"]);
    }

    #[test]
    fn test_pattern_without_extension() {
        let dir = layout();
        let pattern = format!("{}/line_*", dir.path().display());
        let found = discover(&pattern).unwrap();
        assert_eq!(names(&found, dir.path()), vec!["line_01.sgy", "line_02.SEGY"]);
    }

    #[test]
    fn test_literal_path_without_extension() {
        let dir = layout();
        let found = discover(&format!("{}/line_01", dir.path().display())).unwrap();
        assert_eq!(found, vec![dir.path().join("line_01.sgy")]);

        let found = discover(&format!("{}/line_02", dir.path().display())).unwrap();
        assert_eq!(names(&found, dir.path()), vec!["line_02.SEGY"]);

        // line_03 exists only as .txt
        assert!(discover(&format!("{}/line_03", dir.path().display()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_recursive_pattern() {
        let dir = layout();
        let pattern = format!("{}/**/line_1*.sgy", dir.path().display());
        let found = discover(&pattern).unwrap();
        assert_eq!(
            names(&found, dir.path()),
            vec!["sub/deeper/line_11.sgy", "sub/line_10.sgy"]
        );
    }

    #[test]
    fn test_single_file_and_missing() {
        let dir = layout();
        let file = dir.path().join("cube.segy");
        assert_eq!(discover(file.to_str().unwrap()).unwrap(), vec![file]);
        let missing = format!("{}/nope/*.sgy", dir.path().display());
        assert!(discover(&missing).unwrap().is_empty());
        assert!(matches!(discover("  "), Err(DiscoveryError::EmptyPattern)));
    }
}
