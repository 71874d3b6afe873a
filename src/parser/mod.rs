pub mod normalize;
pub mod pdf_reader;
pub mod text_extractor;

pub use normalize::normalize_pages;
pub use pdf_reader::PdfReader;
pub use text_extractor::PdftotextSource;

use anyhow::Result;
use std::path::Path;

/// Produces the raw text of every page of a document, in page order.
/// Pages without a text layer yield an empty string.
pub trait TextSource {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// Outcome of asking a [`TextSource`] for a document's pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentText {
    Pages(Vec<String>),
    Unreadable(String),
}

impl DocumentText {
    pub fn read(source: &dyn TextSource, path: &Path) -> Self {
        match source.read_pages(path) {
            Ok(pages) => DocumentText::Pages(pages),
            Err(err) => {
                log::warn!("failed to read text from {}: {err:#}", path.display());
                DocumentText::Unreadable(format!("PDF読み込み失敗: {err:#}"))
            }
        }
    }
}
