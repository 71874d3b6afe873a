use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use tanshin::ledger::{JsonLedgerStore, Ledger, LedgerEntry, LedgerStore, MemoryLedgerStore};
use tanshin::parser::{PdftotextSource, TextSource};
use tanshin::pipeline::{hash_file, Pipeline, PipelineConfig};
use tanshin::FIELDS;

const EXAMPLE_PAGE: &str = "Example Corp\nSecurities code 1234\nNet sales 1,234,567 (million yen)";

fn temp_output_dir(prefix: &str) -> PathBuf {
    let mut out = std::env::temp_dir();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let pid = std::process::id();
    out.push(format!("{prefix}-{pid}-{now}"));
    out
}

/// Serves page text by file name; names without an entry fail to read.
#[derive(Default)]
struct FakeSource {
    pages: HashMap<String, Vec<String>>,
}

impl FakeSource {
    fn with(mut self, file: &str, pages: &[&str]) -> Self {
        self.pages.insert(
            file.to_string(),
            pages.iter().map(|page| page.to_string()).collect(),
        );
        self
    }
}

impl TextSource for FakeSource {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.pages.get(&name) {
            Some(pages) => Ok(pages.clone()),
            None => anyhow::bail!("cannot decode {name}"),
        }
    }
}

fn pipeline_with(root: &Path, source: FakeSource, store: Box<dyn LedgerStore>) -> Pipeline {
    let config = PipelineConfig::new(root.join("input"), root.join("output"));
    Pipeline::new(config, Box::new(source), store)
}

fn write_pdf(root: &Path, name: &str, content: &[u8]) -> Result<PathBuf> {
    let dir = root.join("input");
    fs::create_dir_all(&dir)?;
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}

#[test]
fn end_to_end_example_document() -> Result<()> {
    let root = temp_output_dir("tanshin-e2e");
    let source = FakeSource::default().with("example.pdf", &[EXAMPLE_PAGE]);
    let pipeline = pipeline_with(&root, source, Box::new(MemoryLedgerStore::new()));
    let path = write_pdf(&root, "example.pdf", b"%PDF-1.7 example")?;

    let outcome = pipeline.process(&path)?;
    assert!(outcome.processed);
    assert_eq!(outcome.file_hash.len(), 64);

    let tsv = fs::read_to_string(root.join("output/example.tsv"))?;
    let row = tsv.strip_suffix('\n').expect("row ends with a newline");
    let columns: Vec<_> = row.split('\t').collect();
    assert_eq!(columns.len(), FIELDS.len());
    assert_eq!(columns[0], "Example Corp");
    assert_eq!(columns[1], "1234");
    assert_eq!(columns[2], "\"不明\"");
    assert!(columns[4].contains("1,234,567"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("output/example.json"))?)?;
    let object = json.as_object().expect("evidence is an object");
    assert_eq!(object.len(), FIELDS.len() + 1);
    for spec in FIELDS.iter() {
        assert!(object.contains_key(spec.key), "missing {}", spec.key);
    }
    assert_eq!(json["_metadata"]["source_file"], "example.pdf");
    assert_eq!(json["_metadata"]["file_hash"], outcome.file_hash.as_str());
    assert_eq!(json["company_name"]["value"], "Example Corp");
    assert_eq!(json["company_name"]["page"], 1);
    assert_eq!(json["company_name"]["confidence"].as_f64(), Some(0.6));
    assert_eq!(json["securities_code"]["confidence"].as_f64(), Some(0.6));
    assert_eq!(json["ordinary_profit"]["value"], "不明");
    assert!(json["ordinary_profit"]["snippet"].is_null());
    assert!(json["risk"]["value"].as_str().unwrap().contains("要確認"));

    assert!(pipeline.ledger().contains(&outcome.file_hash));

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn read_failure_still_writes_eleven_unknown_columns() -> Result<()> {
    let root = temp_output_dir("tanshin-unreadable");
    let pipeline = pipeline_with(&root, FakeSource::default(), Box::new(MemoryLedgerStore::new()));
    let path = write_pdf(&root, "broken.pdf", b"not really a pdf")?;

    assert!(pipeline.process(&path)?.processed);

    let tsv = fs::read_to_string(root.join("output/broken.tsv"))?;
    assert_eq!(tsv.trim_end_matches('\n').split('\t').count(), 11);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("output/broken.json"))?)?;
    let notes: Vec<_> = FIELDS
        .iter()
        .map(|spec| json[spec.key]["notes"].as_str().unwrap().to_string())
        .collect();
    assert!(notes[0].starts_with("PDF読み込み失敗"));
    assert!(notes.iter().all(|note| note == &notes[0]));
    for spec in FIELDS.iter() {
        assert_eq!(json[spec.key]["value"], "不明");
    }

    let log = fs::read_to_string(root.join("output/broken.log"))?;
    assert!(log.contains("read failure: PDF読み込み失敗"));
    assert!(log.contains("success: outputs generated"));

    // Marked done: the same bytes are not retried.
    assert!(!pipeline.process(&path)?.processed);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn same_content_is_processed_once() -> Result<()> {
    let root = temp_output_dir("tanshin-idempotent");
    let source = FakeSource::default()
        .with("a.pdf", &[EXAMPLE_PAGE])
        .with("b.pdf", &[EXAMPLE_PAGE]);
    let pipeline = pipeline_with(&root, source, Box::new(MemoryLedgerStore::new()));
    let path = write_pdf(&root, "a.pdf", b"%PDF same bytes")?;

    assert!(pipeline.process(&path)?.processed);
    let tsv_path = root.join("output/a.tsv");
    fs::write(&tsv_path, "edited by hand\n")?;
    let ledger_size = pipeline.ledger().len();

    let second = pipeline.process(&path)?;
    assert!(!second.processed);
    assert_eq!(fs::read_to_string(&tsv_path)?, "edited by hand\n");
    assert_eq!(pipeline.ledger().len(), ledger_size);

    // Identical bytes under another name are skipped too.
    let copy = write_pdf(&root, "b.pdf", b"%PDF same bytes")?;
    assert!(!pipeline.process(&copy)?.processed);
    assert!(!root.join("output/b.tsv").exists());

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn evidence_text_carries_exact_confidence_levels() -> Result<()> {
    let root = temp_output_dir("tanshin-confidence");
    let source = FakeSource::default().with("x.pdf", &[EXAMPLE_PAGE]);
    let pipeline = pipeline_with(&root, source, Box::new(MemoryLedgerStore::new()));
    let path = write_pdf(&root, "x.pdf", b"%PDF x")?;

    pipeline.process(&path)?;

    let text = fs::read_to_string(root.join("output/x.json"))?;
    let confidences: Vec<_> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("\"confidence\""))
        .collect();
    assert_eq!(confidences.len(), FIELDS.len());
    for line in confidences {
        assert!(
            matches!(
                line,
                "\"confidence\": 0.6" | "\"confidence\": 0.7" | "\"confidence\": 0.2" | "\"confidence\": 0.1"
            ),
            "unexpected confidence line: {line}"
        );
    }

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn failed_rewrite_keeps_previous_row_and_evidence_together() -> Result<()> {
    let root = temp_output_dir("tanshin-rewrite");
    let source = FakeSource::default().with("report.pdf", &[EXAMPLE_PAGE]);
    let pipeline = pipeline_with(&root, source, Box::new(MemoryLedgerStore::new()));
    let path = write_pdf(&root, "report.pdf", b"%PDF first edition")?;

    let first = pipeline.process(&path)?;
    let row = fs::read_to_string(root.join("output/report.tsv"))?;
    let evidence = fs::read_to_string(root.join("output/report.json"))?;

    // New content, but the evidence file cannot be staged.
    fs::write(&path, b"%PDF second edition")?;
    fs::create_dir_all(root.join("output/report.json.tmp"))?;
    assert!(pipeline.process(&path).is_err());

    assert_eq!(fs::read_to_string(root.join("output/report.tsv"))?, row);
    assert_eq!(fs::read_to_string(root.join("output/report.json"))?, evidence);
    assert!(!root.join("output/report.tsv.tmp").exists());
    let ledger = pipeline.ledger();
    assert_eq!(ledger.len(), 1);
    assert!(ledger.contains(&first.file_hash));

    // Once the obstacle is gone the new edition is picked up.
    fs::remove_dir_all(root.join("output/report.json.tmp"))?;
    assert!(pipeline.process(&path)?.processed);
    assert_eq!(pipeline.ledger().len(), 2);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn preloaded_ledger_skips_known_content() -> Result<()> {
    let root = temp_output_dir("tanshin-preloaded");
    let path = write_pdf(&root, "known.pdf", b"%PDF known")?;
    let file_hash = hash_file(&path)?;

    let mut ledger = Ledger::new();
    ledger.record(
        file_hash.clone(),
        LedgerEntry {
            file: "earlier-name.pdf".to_string(),
            processed_at: "2025-01-01T00:00:00+09:00".to_string(),
        },
    );
    let source = FakeSource::default().with("known.pdf", &[EXAMPLE_PAGE]);
    let pipeline = pipeline_with(&root, source, Box::new(MemoryLedgerStore::with_ledger(ledger)));

    let outcome = pipeline.process(&path)?;
    assert!(!outcome.processed);
    assert_eq!(outcome.file_hash, file_hash);
    assert!(!root.join("output/known.tsv").exists());
    assert!(fs::read_to_string(root.join("output/known.log"))?.contains("skip: "));

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn batch_rerun_processes_nothing() -> Result<()> {
    let root = temp_output_dir("tanshin-batch");
    let source = FakeSource::default()
        .with("2025_a.pdf", &[EXAMPLE_PAGE])
        .with("2025_b.PDF", &["B Corp\n売上高 10 20"]);
    let store = JsonLedgerStore::in_dir(&root.join("output"));
    let pipeline = pipeline_with(&root, source, Box::new(store));

    write_pdf(&root, "2025_a.pdf", b"%PDF a")?;
    write_pdf(&root, "2025_b.PDF", b"%PDF b")?;
    write_pdf(&root, "notes.txt", b"ignored")?;

    assert_eq!(pipeline.batch()?, 2);
    assert_eq!(pipeline.batch()?, 0);

    assert!(root.join("output/2025_a.tsv").exists());
    assert!(root.join("output/2025_b.json").exists());
    assert!(!root.join("output/notes.tsv").exists());

    let ledger: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("output/.done.json"))?)?;
    let files: Vec<_> = ledger
        .as_object()
        .unwrap()
        .values()
        .map(|entry| entry["file"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(files.len(), 2);
    assert!(files.contains(&"2025_a.pdf".to_string()));

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn batch_continues_past_a_failing_document() -> Result<()> {
    let root = temp_output_dir("tanshin-batch-failure");
    let source = FakeSource::default()
        .with("a_bad.pdf", &[EXAMPLE_PAGE])
        .with("b_ok.pdf", &[EXAMPLE_PAGE]);
    let pipeline = pipeline_with(&root, source, Box::new(MemoryLedgerStore::new()));

    write_pdf(&root, "a_bad.pdf", b"%PDF bad")?;
    write_pdf(&root, "b_ok.pdf", b"%PDF ok")?;
    // A directory where the row should go makes the first document fail.
    fs::create_dir_all(root.join("output/a_bad.tsv"))?;

    assert_eq!(pipeline.batch()?, 1);
    assert!(root.join("output/b_ok.tsv").is_file());
    assert_eq!(pipeline.ledger().len(), 1);

    let log = fs::read_to_string(root.join("output/a_bad.log"))?;
    assert!(log.contains("failure: "));

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn corrupt_ledger_file_is_treated_as_empty() -> Result<()> {
    let root = temp_output_dir("tanshin-corrupt");
    let output = root.join("output");
    fs::create_dir_all(&output)?;
    fs::write(output.join(".done.json"), "[[[ definitely not a ledger")?;

    let source = FakeSource::default().with("doc.pdf", &[EXAMPLE_PAGE]);
    let pipeline = pipeline_with(&root, source, Box::new(JsonLedgerStore::in_dir(&output)));
    let path = write_pdf(&root, "doc.pdf", b"%PDF doc")?;

    assert!(pipeline.process(&path)?.processed);
    assert_eq!(pipeline.ledger().len(), 1);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

/// Requires poppler-utils and a sample at test/sample_tanshin.pdf.
#[test]
#[ignore]
fn pdftotext_reads_sample_document() -> Result<()> {
    let sample = PathBuf::from("test/sample_tanshin.pdf");
    if !sample.exists() {
        eprintln!("Skipping test: test/sample_tanshin.pdf not found");
        return Ok(());
    }

    let pages = PdftotextSource::new().read_pages(&sample)?;
    assert!(!pages.is_empty());
    assert!(pages.iter().any(|page| !page.trim().is_empty()));
    Ok(())
}
