use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use sha2::{Digest, Sha256};

use crate::export::{export_all, DocumentRecord, JsonExporter, TsvExporter};
use crate::extract::{resolve_fields, ExtractionConfig};
use crate::ledger::{Ledger, LedgerEntry, LedgerStore};
use crate::parser::{DocumentText, TextSource};

const HASH_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub extraction: ExtractionConfig,
}

impl PipelineConfig {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            extraction: ExtractionConfig::default(),
        }
    }

    pub fn with_extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub processed: bool,
    pub file_hash: String,
}

/// Processes each distinct document content at most once.
///
/// Text extraction and ledger persistence are injected so that tests can
/// run without poppler or an on-disk ledger.
pub struct Pipeline {
    config: PipelineConfig,
    source: Box<dyn TextSource>,
    store: Box<dyn LedgerStore>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        source: Box<dyn TextSource>,
        store: Box<dyn LedgerStore>,
    ) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ledger(&self) -> Ledger {
        self.store.load()
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.config.input_dir, &self.config.output_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    /// Processes one document unless its content was processed before.
    /// The outcome (and any error) is appended to `<base>.log`.
    pub fn process(&self, path: &Path) -> Result<ProcessOutcome> {
        self.ensure_dirs()?;
        let base_name = base_name(path)?;
        let mut run_log = RunLog::start(path);

        let result = self.run(path, &base_name, &mut run_log);
        match &result {
            Ok(outcome) if outcome.processed => {
                log::info!("processed {}", path.display());
                run_log.push("success: outputs generated");
            }
            Ok(_) => log::info!("skipped {} (already processed)", path.display()),
            Err(err) => run_log.push(format!("failure: {err:#}")),
        }

        let written = run_log.append_to(&self.log_path(&base_name));
        let outcome = result?;
        written?;
        Ok(outcome)
    }

    fn run(&self, path: &Path, base_name: &str, run_log: &mut RunLog) -> Result<ProcessOutcome> {
        let ledger = self.store.load();
        let file_hash = hash_file(path)?;
        log::debug!("{} sha256={file_hash}", path.display());

        let (ledger, outcome) = self.step(path, base_name, ledger, file_hash, run_log)?;
        if outcome.processed {
            self.store.save(&ledger)?;
        }
        Ok(outcome)
    }

    /// Runs extraction against an explicit ledger value and returns the
    /// ledger to persist. Outputs are written before the ledger changes.
    pub fn step(
        &self,
        path: &Path,
        base_name: &str,
        mut ledger: Ledger,
        file_hash: String,
        run_log: &mut RunLog,
    ) -> Result<(Ledger, ProcessOutcome)> {
        if ledger.contains(&file_hash) {
            run_log.push("skip: same hash already processed");
            return Ok((
                ledger,
                ProcessOutcome {
                    processed: false,
                    file_hash,
                },
            ));
        }

        let text = DocumentText::read(self.source.as_ref(), path);
        if let DocumentText::Unreadable(reason) = &text {
            run_log.push(format!("read failure: {reason}"));
        }

        let record = DocumentRecord {
            base_name: base_name.to_string(),
            source_file: file_name(path),
            file_hash: file_hash.clone(),
            processed_at: Local::now(),
            results: resolve_fields(&text, &self.config.extraction),
        };

        let tsv = TsvExporter::new(self.config.output_dir.clone());
        let json = JsonExporter::new(self.config.output_dir.clone());
        export_all(&[&tsv, &json], &record)?;

        ledger.record(
            file_hash.clone(),
            LedgerEntry {
                file: record.source_file.clone(),
                processed_at: record.processed_at.to_rfc3339(),
            },
        );

        Ok((
            ledger,
            ProcessOutcome {
                processed: true,
                file_hash,
            },
        ))
    }

    /// Processes every PDF in the input directory in file-name order and
    /// returns how many were actually processed. A failing document is
    /// logged and does not stop the batch.
    pub fn batch(&self) -> Result<usize> {
        self.ensure_dirs()?;
        let files = list_pdfs(&self.config.input_dir)?;
        log::info!(
            "batch: {} PDF(s) in {}",
            files.len(),
            self.config.input_dir.display()
        );

        let mut processed = 0;
        for path in files {
            match self.process(&path) {
                Ok(outcome) if outcome.processed => processed += 1,
                Ok(_) => {}
                Err(err) => log::error!("failed to process {}: {err:#}", path.display()),
            }
        }
        Ok(processed)
    }

    fn log_path(&self, base_name: &str) -> PathBuf {
        self.config.output_dir.join(format!("{base_name}.log"))
    }
}

/// Per-document processing log, appended to `<base>.log`.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn start(path: &Path) -> Self {
        Self {
            lines: vec![format!(
                "[{}] start: {}",
                Local::now().to_rfc3339(),
                path.display()
            )],
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn append_to(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log {}", path.display()))?;
        let mut text = self.lines.join("\n");
        text.push('\n');
        file.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Hex SHA-256 of the file, read in fixed-size chunks.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut buf)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// PDF files directly inside `dir`, sorted by file name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && is_pdf(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn base_name(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .with_context(|| format!("no file name in {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
