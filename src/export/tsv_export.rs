use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::{ResultSet, FIELDS};
use crate::export::{DocumentRecord, Exporter};

fn escape_cell(value: &str) -> String {
    value.replace('"', "\"\"").replace('\t', " ")
}

fn render_cell(value: &str, quote: bool) -> String {
    let escaped = escape_cell(value);
    if quote {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

/// One tab-separated row, one column per catalog field.
pub fn format_row(results: &ResultSet) -> String {
    results
        .iter()
        .map(|(spec, item)| render_cell(&item.value, spec.quote))
        .collect::<Vec<_>>()
        .join("\t")
}

/// Column labels, escaped and quoted the same way as the values.
pub fn header_row() -> String {
    FIELDS
        .iter()
        .map(|spec| render_cell(spec.label, spec.quote))
        .collect::<Vec<_>>()
        .join("\t")
}

#[derive(Debug, Clone)]
pub struct TsvExporter {
    out_dir: PathBuf,
}

impl TsvExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for TsvExporter {
    fn output_path(&self, record: &DocumentRecord) -> PathBuf {
        self.out_dir.join(format!("{}.tsv", record.base_name))
    }

    fn render(&self, record: &DocumentRecord) -> Result<String> {
        let mut row = format_row(&record.results);
        row.push('\n');
        Ok(row)
    }
}
