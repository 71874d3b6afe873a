pub mod json_export;
pub mod tsv_export;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::core::model::ResultSet;

pub use json_export::JsonExporter;
pub use tsv_export::TsvExporter;

/// Everything written for one processed document.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// File stem shared by the `.tsv`, `.json` and `.log` outputs.
    pub base_name: String,
    pub source_file: String,
    pub file_hash: String,
    pub processed_at: DateTime<Local>,
    pub results: ResultSet,
}

pub trait Exporter {
    fn output_path(&self, record: &DocumentRecord) -> PathBuf;

    fn render(&self, record: &DocumentRecord) -> Result<String>;
}

/// Writes every exporter's output for `record` as one unit.
///
/// All outputs are first staged next to their targets as `*.tmp`; the
/// targets are replaced only once every output has been staged. A failed
/// render or write leaves all previous outputs untouched.
pub fn export_all(exporters: &[&dyn Exporter], record: &DocumentRecord) -> Result<()> {
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(exporters.len());
    for exporter in exporters {
        let path = exporter.output_path(record);
        let tmp = staging_path(&path);
        if let Err(err) = stage(*exporter, record, &path, &tmp) {
            discard(&staged);
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        staged.push((tmp, path));
    }

    for (idx, (tmp, path)) in staged.iter().enumerate() {
        if let Err(err) = fs::rename(tmp, path) {
            discard(&staged[idx..]);
            return Err(err).with_context(|| format!("failed to replace {}", path.display()));
        }
    }
    Ok(())
}

fn stage(exporter: &dyn Exporter, record: &DocumentRecord, path: &Path, tmp: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = exporter.render(record)?;
    fs::write(tmp, data).with_context(|| format!("failed to write {}", tmp.display()))
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        if let Err(err) = fs::remove_file(tmp) {
            log::debug!("could not remove staged {}: {err}", tmp.display());
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
