use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?[0-9][0-9,]*").expect("number token pattern is valid"));

/// Every integer on the line, in order. Thousands separators are removed;
/// tokens that do not fit an `i64` are skipped.
pub fn parse_numbers(text: &str) -> Vec<i64> {
    NUMBER_TOKEN
        .find_iter(text)
        .filter_map(|token| token.as_str().replace(',', "").parse::<i64>().ok())
        .collect()
}

pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
