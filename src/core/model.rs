use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::confidence::{clamp_confidence, UNKNOWN};

/// Placeholder value written for every field that could not be resolved.
pub const UNKNOWN_VALUE: &str = "不明";

/// One non-blank line of extracted text, tagged with its 1-based page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedLine {
    pub page: u32,
    pub raw_text: String,
    pub normalized_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub page: Option<u32>,
    pub snippet: Option<String>,
    pub notes: String,
    pub confidence: f64,
}

impl Evidence {
    pub fn new(
        page: Option<u32>,
        snippet: Option<String>,
        notes: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            page,
            snippet,
            notes: notes.into(),
            confidence: clamp_confidence(confidence),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionItem {
    pub value: String,
    pub evidence: Evidence,
}

impl ExtractionItem {
    pub fn new(value: impl Into<String>, evidence: Evidence) -> Self {
        Self {
            value: value.into(),
            evidence,
        }
    }

    /// The "unknown" placeholder carrying a diagnostic reason.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self::new(UNKNOWN_VALUE, Evidence::new(None, None, reason, UNKNOWN))
    }

    pub fn is_unknown(&self) -> bool {
        self.value == UNKNOWN_VALUE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub quote: bool,
}

impl FieldSpec {
    const fn new(key: &'static str, label: &'static str, quote: bool) -> Self {
        Self { key, label, quote }
    }
}

/// Output columns, in order. Downstream tooling depends on both the
/// order and the count; changing either is a format-version bump.
pub const FIELDS: [FieldSpec; 11] = [
    FieldSpec::new("company_name", "会社名", false),
    FieldSpec::new("securities_code", "証券コード", false),
    FieldSpec::new("fiscal_period", "対象期間", true),
    FieldSpec::new("summary", "サマリー", true),
    FieldSpec::new("net_sales", "売上高", true),
    FieldSpec::new("operating_profit", "営業利益", true),
    FieldSpec::new("ordinary_profit", "経常利益", true),
    FieldSpec::new("net_profit", "当期純利益", true),
    FieldSpec::new("eps", "EPS", true),
    FieldSpec::new("dividend", "配当", true),
    FieldSpec::new("risk", "リスク", true),
];

/// Exactly one [`ExtractionItem`] per entry of [`FIELDS`], in catalog order.
///
/// There is no way to add, remove or replace an item once the set is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    items: Vec<ExtractionItem>,
}

impl ResultSet {
    pub fn from_fn<F>(mut resolve: F) -> Self
    where
        F: FnMut(&FieldSpec) -> ExtractionItem,
    {
        Self {
            items: FIELDS.iter().map(|spec| resolve(spec)).collect(),
        }
    }

    /// Builds a set from resolved items; catalog fields missing from the map
    /// are filled by `fallback`. Keys outside the catalog are dropped.
    pub fn from_map<F>(mut resolved: HashMap<&str, ExtractionItem>, mut fallback: F) -> Self
    where
        F: FnMut(&FieldSpec) -> ExtractionItem,
    {
        Self::from_fn(|spec| {
            resolved
                .remove(spec.key)
                .unwrap_or_else(|| fallback(spec))
        })
    }

    pub fn get(&self, key: &str) -> Option<&ExtractionItem> {
        FIELDS
            .iter()
            .position(|spec| spec.key == key)
            .map(|idx| &self.items[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, &ExtractionItem)> {
        FIELDS.iter().zip(self.items.iter())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
