use super::EvaluationReport;
use anyhow::Context;
use std::path::Path;

pub fn write_json(report: &EvaluationReport, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
    }
    std::fs::write(out, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("failed to write report '{}'", out.display()))?;
    Ok(())
}

pub fn read_json(path: &Path) -> anyhow::Result<EvaluationReport> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid report '{}'", path.display()))
}
