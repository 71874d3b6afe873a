pub mod metric;
pub mod numbers;
pub mod resolve;
pub mod section;
pub mod unit;

pub use resolve::resolve_fields;
pub use unit::{detect_unit, Unit};

/// Default number of lines searched on each side of a section header.
pub const DEFAULT_SECTION_RADIUS: usize = 25;

/// Headers of the results table in the summary page of a disclosure.
pub const DEFAULT_SECTION_KEYWORDS: &[&str] = &[
    "連結経営成績",
    "経営成績",
    "Consolidated Operating Results",
    "Operating Results",
];

/// Tunables for the metric search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    pub section_radius: usize,
    pub section_keywords: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            section_radius: DEFAULT_SECTION_RADIUS,
            section_keywords: DEFAULT_SECTION_KEYWORDS
                .iter()
                .map(|keyword| keyword.to_string())
                .collect(),
        }
    }
}

impl ExtractionConfig {
    pub fn with_section_radius(mut self, radius: usize) -> Self {
        self.section_radius = radius;
        self
    }
}
