use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::parser::pdf_reader::PdfReader;
use crate::parser::TextSource;

/// Reads page text through poppler's `pdftotext`.
#[derive(Debug, Clone)]
pub struct PdftotextSource {
    pdftotext: PathBuf,
    pdfinfo: PathBuf,
    layout: bool,
}

impl Default for PdftotextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PdftotextSource {
    pub fn new() -> Self {
        Self {
            pdftotext: PathBuf::from("pdftotext"),
            pdfinfo: PathBuf::from("pdfinfo"),
            layout: true,
        }
    }

    pub fn with_pdftotext(mut self, program: PathBuf) -> Self {
        self.pdftotext = program;
        self
    }

    pub fn with_pdfinfo(mut self, program: PathBuf) -> Self {
        self.pdfinfo = program;
        self
    }

    pub fn with_layout(mut self, layout: bool) -> Self {
        self.layout = layout;
        self
    }

    fn run_pdftotext(&self, path: &Path) -> Result<String> {
        let mut command = Command::new(&self.pdftotext);
        if self.layout {
            command.arg("-layout");
        }
        let output = command
            .args(["-enc", "UTF-8"])
            .arg(path)
            .arg("-")
            .output()
            .with_context(|| "failed to invoke pdftotext; is poppler-utils installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("pdftotext failed with status {}: {}", output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextSource for PdftotextSource {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>> {
        let stdout = self.run_pdftotext(path)?;
        let mut pages = split_pages(&stdout);

        let reader = PdfReader::new(path.to_path_buf()).with_pdfinfo(self.pdfinfo.clone());
        match reader.page_count() {
            Ok(count) => pages.resize(count, String::new()),
            Err(err) => log::debug!("keeping {} page(s) from pdftotext: {err:#}", pages.len()),
        }

        Ok(pages)
    }
}

/// pdftotext terminates every page with a form feed.
fn split_pages(stdout: &str) -> Vec<String> {
    let mut pages: Vec<String> = stdout.split('\u{c}').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|last| last.trim().is_empty()) {
        pages.pop();
    }
    pages
}
