//! Expert few-shot exemplars, indexed by category.
//!
//! The library is loaded once at judge initialization and is read-only for the
//! rest of the run, so it can be shared across workers behind an `Arc`.

mod loader;

use crate::model::Exemplar;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A document that could not be loaded. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExemplarLoadWarning {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExemplarLibrary {
    /// Each list is kept sorted by quality_score descending (stable).
    by_category: BTreeMap<String, Vec<Exemplar>>,
    warnings: Vec<ExemplarLoadWarning>,
}

impl ExemplarLibrary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from already-parsed exemplars; their iteration order is the load order.
    pub fn from_exemplars(exemplars: impl IntoIterator<Item = Exemplar>) -> Self {
        let mut lib = Self::default();
        for ex in exemplars {
            lib.by_category
                .entry(ex.category.clone())
                .or_default()
                .push(ex);
        }
        lib.rank();
        lib
    }

    /// Load every exemplar document in `dir`. Unreadable or malformed documents
    /// are skipped and recorded in [`ExemplarLibrary::warnings`].
    pub fn load_dir(dir: &Path) -> Self {
        let mut lib = Self::default();

        let files = match loader::list_documents(dir) {
            Ok(files) => files,
            Err(e) => {
                lib.warn(dir, format!("exemplar directory unavailable: {}", e));
                return lib;
            }
        };

        for path in files {
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    lib.warn(&path, format!("failed to read: {}", e));
                    continue;
                }
            };
            match loader::parse_document(&raw) {
                Ok(doc) => {
                    tracing::debug!(
                        path = %path.display(),
                        category = %doc.category,
                        count = doc.exemplars.len(),
                        "loaded exemplar document"
                    );
                    let slot = lib.by_category.entry(doc.category.clone()).or_default();
                    if !slot.is_empty() {
                        tracing::warn!(
                            path = %path.display(),
                            category = %doc.category,
                            "category already loaded from another document; appending"
                        );
                    }
                    slot.extend(doc.exemplars);
                }
                Err(message) => lib.warn(&path, message),
            }
        }

        lib.rank();
        lib
    }

    fn warn(&mut self, path: &Path, message: String) {
        tracing::warn!(path = %path.display(), error = %message, "skipping exemplar document");
        self.warnings.push(ExemplarLoadWarning {
            path: path.to_path_buf(),
            message,
        });
    }

    fn rank(&mut self) {
        for list in self.by_category.values_mut() {
            // sort_by is stable: equal scores keep load order.
            list.sort_by(|a, b| b.quality_score.total_cmp(&a.quality_score));
        }
    }

    /// Up to `limit` exemplars of `category`, best first. Unknown categories
    /// yield an empty list.
    pub fn get_top(&self, category: &str, limit: usize) -> Vec<&Exemplar> {
        self.by_category
            .get(category)
            .map(|list| list.iter().take(limit).collect())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> &[ExemplarLoadWarning] {
        &self.warnings
    }

    /// Category → exemplar count.
    pub fn categories(&self) -> BTreeMap<&str, usize> {
        self.by_category
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
