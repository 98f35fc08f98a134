//! Exemplar document parsing.
//!
//! One document per category:
//!
//! ```yaml
//! category: performance
//! examples:
//!   - query: { user_query: "..." }
//!     expert_response: "..."
//!     expert_reasoning: "..."
//!     key_points: ["..."]
//!     quality_score: 0.95
//! ```

use crate::model::{Exemplar, ExemplarQuery};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DOCUMENT_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

#[derive(Debug, Deserialize)]
struct ExemplarDocument {
    category: Option<String>,
    #[serde(default, alias = "exemplars")]
    examples: Vec<ExemplarEntry>,
}

#[derive(Debug, Deserialize)]
struct ExemplarEntry {
    #[serde(default)]
    query: ExemplarQuery,
    #[serde(alias = "expert_answer")]
    expert_response: String,
    #[serde(default)]
    expert_reasoning: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    quality_score: f64,
}

#[derive(Debug)]
pub(crate) struct ParsedDocument {
    pub(crate) category: String,
    pub(crate) exemplars: Vec<Exemplar>,
}

/// Document files in `dir`, sorted by file name so load order is stable.
pub(crate) fn list_documents(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| DOCUMENT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if ext_ok {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn parse_document(raw: &str) -> Result<ParsedDocument, String> {
    let doc: ExemplarDocument =
        serde_yaml::from_str(raw).map_err(|e| format!("invalid exemplar document: {}", e))?;
    let category = doc
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| "missing 'category'".to_string())?;

    let mut exemplars = Vec::with_capacity(doc.examples.len());
    for (idx, entry) in doc.examples.into_iter().enumerate() {
        if !entry.quality_score.is_finite() {
            return Err(format!("example {}: quality_score is not a finite number", idx));
        }
        exemplars.push(Exemplar {
            category: category.clone(),
            query: entry.query,
            expert_answer: entry.expert_response,
            expert_reasoning: entry.expert_reasoning,
            key_points: entry.key_points,
            quality_score: entry.quality_score,
        });
    }
    Ok(ParsedDocument {
        category,
        exemplars,
    })
}
