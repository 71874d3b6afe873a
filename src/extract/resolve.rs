use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::confidence::{INFERRED, MANUAL_REVIEW};
use crate::core::model::{Evidence, ExtractionItem, NormalizedLine, ResultSet, UNKNOWN_VALUE};
use crate::extract::metric::extract_metric;
use crate::extract::unit::{detect_unit, Unit};
use crate::extract::ExtractionConfig;
use crate::parser::{normalize_pages, DocumentText};

pub const RULE_NOT_IMPLEMENTED: &str = "抽出ルール未実装";

const NO_LINES: &str = "抽出できませんでした";
const RISK_NOTE: &str = "リスク抽出未実装";

static SECURITIES_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([0-9]{4})\b").expect("securities code pattern is valid"));

/// A metric field with an implemented search rule. Keywords are tried in
/// order; the first one that resolves wins.
#[derive(Debug, Clone, Copy)]
pub struct MetricRule {
    pub key: &'static str,
    pub keywords: &'static [&'static str],
}

pub const METRIC_RULES: &[MetricRule] = &[
    MetricRule {
        key: "net_sales",
        keywords: &["売上高", "営業収益", "Net sales", "Revenue"],
    },
    MetricRule {
        key: "operating_profit",
        keywords: &["営業利益", "Operating profit", "Operating income"],
    },
];

/// Resolves every catalog field. Never fails: anything that cannot be
/// extracted becomes an unknown item with the reason in its notes.
pub fn resolve_fields(text: &DocumentText, config: &ExtractionConfig) -> ResultSet {
    match text {
        DocumentText::Unreadable(reason) => {
            ResultSet::from_fn(|_| ExtractionItem::unknown(reason.clone()))
        }
        DocumentText::Pages(pages) => resolve_pages(pages, config),
    }
}

fn resolve_pages(pages: &[String], config: &ExtractionConfig) -> ResultSet {
    let lines = normalize_pages(pages);
    log::debug!("{} page(s), {} non-blank line(s)", pages.len(), lines.len());

    let mut resolved: HashMap<&str, ExtractionItem> = HashMap::new();
    resolved.insert("company_name", company_name(&lines));
    resolved.insert("securities_code", securities_code(&lines));

    if lines.is_empty() {
        for rule in METRIC_RULES {
            resolved.insert(rule.key, ExtractionItem::unknown(NO_LINES));
        }
    } else {
        let unit = detect_unit(&lines);
        for rule in METRIC_RULES {
            resolved.insert(rule.key, resolve_metric(&lines, rule, unit, config));
        }
    }

    resolved.insert("risk", risk_placeholder());

    ResultSet::from_map(resolved, |_| ExtractionItem::unknown(RULE_NOT_IMPLEMENTED))
}

fn company_name(lines: &[NormalizedLine]) -> ExtractionItem {
    match lines.iter().find(|line| line.page == 1) {
        Some(line) => ExtractionItem::new(
            line.raw_text.clone(),
            Evidence::new(Some(1), Some(line.raw_text.clone()), "先頭行から推定", INFERRED),
        ),
        None => ExtractionItem::unknown("会社名を抽出できませんでした"),
    }
}

fn securities_code(lines: &[NormalizedLine]) -> ExtractionItem {
    lines
        .iter()
        .find_map(|line| {
            SECURITIES_CODE
                .captures(&line.normalized_text)
                .map(|caps| (line, caps[1].to_string()))
        })
        .map(|(line, code)| {
            ExtractionItem::new(
                code,
                Evidence::new(
                    Some(line.page),
                    Some(line.raw_text.clone()),
                    "4桁コードを検出",
                    INFERRED,
                ),
            )
        })
        .unwrap_or_else(|| ExtractionItem::unknown("証券コード抽出ルール未実装"))
}

fn resolve_metric(
    lines: &[NormalizedLine],
    rule: &MetricRule,
    unit: Option<Unit>,
    config: &ExtractionConfig,
) -> ExtractionItem {
    let mut first_miss = None;
    for keyword in rule.keywords {
        let item = extract_metric(
            lines,
            keyword,
            unit,
            &config.section_keywords,
            config.section_radius,
        );
        if !item.is_unknown() {
            return item;
        }
        first_miss.get_or_insert(item);
    }
    first_miss.unwrap_or_else(|| ExtractionItem::unknown(RULE_NOT_IMPLEMENTED))
}

fn risk_placeholder() -> ExtractionItem {
    ExtractionItem::new(
        format!("{UNKNOWN_VALUE}\n要確認: {RISK_NOTE}"),
        Evidence::new(None, None, RISK_NOTE, MANUAL_REVIEW),
    )
}
