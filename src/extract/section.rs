use crate::core::model::NormalizedLine;

/// Substring match that ignores ASCII case ("Net Sales" vs "net sales").
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    if keyword.is_ascii() {
        text.to_ascii_lowercase().contains(&keyword.to_ascii_lowercase())
    } else {
        text.contains(keyword)
    }
}

/// Indices of all lines mentioning any of `keywords`.
pub fn find_section_indices<S: AsRef<str>>(lines: &[NormalizedLine], keywords: &[S]) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| {
            keywords
                .iter()
                .any(|keyword| contains_keyword(&line.normalized_text, keyword.as_ref()))
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Concatenates the lines within `radius` of every index. Overlapping
/// windows repeat lines; callers rely on first-seen order only.
pub fn focus_window<'a>(
    lines: &'a [NormalizedLine],
    indices: &[usize],
    radius: usize,
) -> Vec<&'a NormalizedLine> {
    let mut window = Vec::new();
    for &idx in indices {
        let start = idx.saturating_sub(radius);
        let end = idx.saturating_add(radius).saturating_add(1).min(lines.len());
        if start < end {
            window.extend(lines[start..end].iter());
        }
    }
    window
}
