use crate::core::confidence::DETECTED;
use crate::core::model::{Evidence, ExtractionItem, NormalizedLine};
use crate::extract::numbers::{format_thousands, parse_numbers};
use crate::extract::section::{contains_keyword, find_section_indices, focus_window};
use crate::extract::unit::Unit;

struct Candidate<'a> {
    line: &'a NormalizedLine,
    numbers: Vec<i64>,
}

/// Finds the line carrying `keyword` and reads its first number.
///
/// The search is biased toward lines within `radius` of a section header
/// (`section_keywords`) and falls back to the whole document. Among
/// matching lines the one with the most numbers wins, earliest first on
/// ties: a results-table row carries current and prior periods, prose
/// mentioning the keyword usually carries one.
pub fn extract_metric<S: AsRef<str>>(
    lines: &[NormalizedLine],
    keyword: &str,
    unit: Option<Unit>,
    section_keywords: &[S],
    radius: usize,
) -> ExtractionItem {
    let sections = find_section_indices(lines, section_keywords);
    let window = focus_window(lines, &sections, radius);

    let candidate = best_candidate(window.iter().copied(), keyword)
        .or_else(|| best_candidate(lines.iter(), keyword));

    let Some(candidate) = candidate else {
        log::debug!("no line with a number matched {keyword:?}");
        return ExtractionItem::unknown(format!("{keyword}を含む行が見つかりませんでした"));
    };

    let Some(&value) = candidate.numbers.first() else {
        return ExtractionItem::unknown(format!("{keyword}の行から数値を読み取れませんでした"));
    };

    let formatted = match unit {
        Some(unit) => format!("{} ({unit})", format_thousands(value)),
        None => format_thousands(value),
    };

    ExtractionItem::new(
        formatted,
        Evidence::new(
            Some(candidate.line.page),
            Some(candidate.line.raw_text.clone()),
            format!("{keyword}を検出"),
            DETECTED,
        ),
    )
}

fn best_candidate<'a, I>(lines: I, keyword: &str) -> Option<Candidate<'a>>
where
    I: IntoIterator<Item = &'a NormalizedLine>,
{
    let mut best: Option<Candidate<'a>> = None;
    for line in lines {
        if !contains_keyword(&line.normalized_text, keyword) {
            continue;
        }
        let numbers = parse_numbers(&line.normalized_text);
        if numbers.is_empty() {
            continue;
        }
        let better = best
            .as_ref()
            .map_or(true, |current| numbers.len() > current.numbers.len());
        if better {
            best = Some(Candidate { line, numbers });
        }
    }
    best
}
