use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct PdfReader {
    path: PathBuf,
    pdfinfo: PathBuf,
}

impl PdfReader {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            pdfinfo: PathBuf::from("pdfinfo"),
        }
    }

    pub fn with_pdfinfo(mut self, pdfinfo: PathBuf) -> Self {
        self.pdfinfo = pdfinfo;
        self
    }

    pub fn page_count(&self) -> Result<usize> {
        let output = Command::new(&self.pdfinfo)
            .arg(&self.path)
            .output()
            .with_context(|| format!("failed to invoke pdfinfo on {}", self.path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("pdfinfo failed with status {}: {}", output.status, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_page_count(&stdout).with_context(|| {
            format!(
                "pdfinfo output did not contain a usable 'Pages:' line for {}",
                self.path.display()
            )
        })
    }
}

fn parse_page_count(stdout: &str) -> Result<usize> {
    for line in stdout.lines() {
        if let Some(rest) = line.strip_prefix("Pages:") {
            let num_str = rest.trim();
            let pages: usize = num_str.parse().with_context(|| {
                format!("failed to parse page count from 'Pages:' line: {num_str}")
            })?;
            return Ok(pages);
        }
    }

    anyhow::bail!("no 'Pages:' line in pdfinfo output");
}
