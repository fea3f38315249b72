//! Classification cache collaborator
//!
//! Injected into the classifier so amplitude-only analyses can reuse an
//! earlier verdict and each test can start from a fresh cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::types::ClassificationResult;

pub trait ClassificationCache: Send + Sync {
    fn get(&self, path: &Path) -> Option<ClassificationResult>;

    fn insert(&self, path: PathBuf, result: ClassificationResult);

    /// Drop every cached verdict
    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Path-keyed cache behind a `RwLock`
#[derive(Debug, Default)]
pub struct InMemoryClassificationCache {
    entries: RwLock<HashMap<PathBuf, ClassificationResult>>,
}

impl InMemoryClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClassificationCache for InMemoryClassificationCache {
    fn get(&self, path: &Path) -> Option<ClassificationResult> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
    }

    fn insert(&self, path: PathBuf, result: ClassificationResult) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path, result);
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
