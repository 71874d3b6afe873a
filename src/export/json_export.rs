use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::core::model::ExtractionItem;
use crate::export::{DocumentRecord, Exporter};

#[derive(Debug, Serialize)]
struct FieldEvidence<'a> {
    value: &'a str,
    page: Option<u32>,
    snippet: Option<&'a str>,
    notes: &'a str,
    confidence: f64,
}

impl<'a> From<&'a ExtractionItem> for FieldEvidence<'a> {
    fn from(item: &'a ExtractionItem) -> Self {
        Self {
            value: &item.value,
            page: item.evidence.page,
            snippet: item.evidence.snippet.as_deref(),
            notes: &item.evidence.notes,
            confidence: item.evidence.confidence,
        }
    }
}

/// Builds the evidence document: a `_metadata` block followed by one entry
/// per catalog field, in catalog order.
pub fn serialize_evidence(record: &DocumentRecord) -> Result<Value> {
    let mut payload = Map::new();
    payload.insert(
        "_metadata".to_string(),
        json!({
            "source_file": record.source_file,
            "file_hash": record.file_hash,
            "processed_at": record.processed_at.to_rfc3339(),
        }),
    );
    for (spec, item) in record.results.iter() {
        payload.insert(
            spec.key.to_string(),
            serde_json::to_value(FieldEvidence::from(item))?,
        );
    }
    Ok(Value::Object(payload))
}

#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for JsonExporter {
    fn output_path(&self, record: &DocumentRecord) -> PathBuf {
        self.out_dir.join(format!("{}.json", record.base_name))
    }

    fn render(&self, record: &DocumentRecord) -> Result<String> {
        serde_json::to_string_pretty(&serialize_evidence(record)?)
            .with_context(|| format!("failed to render evidence for {}", record.source_file))
    }
}
