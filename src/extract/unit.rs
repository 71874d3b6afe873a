use std::fmt;

use crate::core::model::NormalizedLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    ThousandYen,
    MillionYen,
    HundredMillionYen,
}

impl Unit {
    pub fn label(self) -> &'static str {
        match self {
            Unit::ThousandYen => "千円",
            Unit::MillionYen => "百万円",
            Unit::HundredMillionYen => "億円",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const DECLARATION_MARKERS: &[&str] = &["単位", "unit:", "units:"];

// Checked in order; "hundred million yen" contains "million yen".
const UNIT_PATTERNS: &[(&str, Unit)] = &[
    ("百万円", Unit::MillionYen),
    ("千円", Unit::ThousandYen),
    ("億円", Unit::HundredMillionYen),
    ("hundred million yen", Unit::HundredMillionYen),
    ("hundreds of millions of yen", Unit::HundredMillionYen),
    ("million yen", Unit::MillionYen),
    ("millions of yen", Unit::MillionYen),
    ("thousand yen", Unit::ThousandYen),
    ("thousands of yen", Unit::ThousandYen),
];

/// Reads the reporting unit from the first unit-declaration line.
/// Later declarations are ignored; documents are assumed single-unit.
pub fn detect_unit(lines: &[NormalizedLine]) -> Option<Unit> {
    let declaration = lines.iter().find_map(|line| {
        let lowered = line.normalized_text.to_lowercase();
        DECLARATION_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
            .then_some(lowered)
    })?;

    UNIT_PATTERNS
        .iter()
        .find(|(pattern, _)| declaration.contains(pattern))
        .map(|&(_, unit)| unit)
}
