//! Line normalization for extracted page text.
//!
//! PDF text layers of Japanese disclosures mix full-width and half-width
//! forms freely ("１２３" next to "123"), and some producers emit kana with a
//! separate combining voiced mark. Everything downstream matches on the
//! normalized form, so both are folded here once.
use unicode_normalization::UnicodeNormalization;

use crate::core::model::NormalizedLine;

const FULLWIDTH_START: u32 = 0xFF01; // '！'
const FULLWIDTH_END: u32 = 0xFF5E; // '～'
const FULLWIDTH_OFFSET: u32 = 0xFEE0;

/// Splits each page into lines and keeps the non-blank ones, in
/// (page, position) order. Pages are numbered from 1.
pub fn normalize_pages<S: AsRef<str>>(pages: &[S]) -> Vec<NormalizedLine> {
    let mut lines = Vec::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_no = (idx + 1) as u32;
        for raw in page.as_ref().lines() {
            if let Some(line) = normalize_line(page_no, raw) {
                lines.push(line);
            }
        }
    }
    lines
}

fn normalize_line(page: u32, raw: &str) -> Option<NormalizedLine> {
    let raw_text = collapse_whitespace(raw);
    if raw_text.is_empty() {
        return None;
    }
    let folded: String = raw_text.nfc().map(to_half_width).collect();
    let normalized_text = collapse_whitespace(&folded);
    if normalized_text.is_empty() {
        return None;
    }
    Some(NormalizedLine {
        page,
        raw_text,
        normalized_text,
    })
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Folds the full-width ASCII block and the minus sign to ASCII.
pub fn to_half_width(c: char) -> char {
    let code = c as u32;
    if (FULLWIDTH_START..=FULLWIDTH_END).contains(&code) {
        return char::from_u32(code - FULLWIDTH_OFFSET).unwrap_or(c);
    }
    match c {
        '\u{2212}' => '-', // MINUS SIGN
        '\u{3000}' => ' ', // IDEOGRAPHIC SPACE
        _ => c,
    }
}
