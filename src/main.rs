use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};

use tanshin::export::json_export::serialize_evidence;
use tanshin::export::tsv_export::{format_row, header_row};
use tanshin::export::DocumentRecord;
use tanshin::extract::{resolve_fields, ExtractionConfig, DEFAULT_SECTION_RADIUS};
use tanshin::ledger::JsonLedgerStore;
use tanshin::parser::{DocumentText, PdftotextSource};
use tanshin::pipeline::{hash_file, Pipeline, PipelineConfig};
use tanshin::watch::watch;

#[derive(Parser, Debug)]
#[command(name = "tanshin")]
#[command(version, about = "Extract financial fields from disclosure PDFs into TSV rows with JSON evidence", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process every PDF in the input directory once
    Batch {
        #[command(flatten)]
        dirs: DirArgs,

        #[command(flatten)]
        tools: ToolArgs,
    },

    /// Watch the input directory and process PDFs as they appear
    Watch {
        #[command(flatten)]
        dirs: DirArgs,

        #[command(flatten)]
        tools: ToolArgs,
    },

    /// Extract a single PDF to stdout without touching the ledger
    Extract {
        /// Input PDF file path
        input: PathBuf,

        /// Print the JSON evidence instead of the TSV row
        #[arg(long)]
        json: bool,

        /// Print the column header before the TSV row
        #[arg(long, conflicts_with = "json")]
        header: bool,

        #[command(flatten)]
        tools: ToolArgs,
    },
}

#[derive(Args, Debug)]
struct DirArgs {
    /// Input directory
    #[arg(long, default_value = "input")]
    input: PathBuf,

    /// Output directory
    #[arg(long, default_value = "output")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct ToolArgs {
    /// Lines searched on each side of a results-section header
    #[arg(long, default_value_t = DEFAULT_SECTION_RADIUS)]
    section_radius: usize,

    /// pdftotext executable
    #[arg(long, default_value = "pdftotext")]
    pdftotext: PathBuf,

    /// pdfinfo executable
    #[arg(long, default_value = "pdfinfo")]
    pdfinfo: PathBuf,

    /// Read text in reading order instead of pdftotext's -layout mode
    #[arg(long)]
    no_layout: bool,
}

impl ToolArgs {
    fn extraction(&self) -> ExtractionConfig {
        ExtractionConfig::default().with_section_radius(self.section_radius)
    }

    fn source(&self) -> PdftotextSource {
        PdftotextSource::new()
            .with_pdftotext(self.pdftotext.clone())
            .with_pdfinfo(self.pdfinfo.clone())
            .with_layout(!self.no_layout)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Batch { dirs, tools } => {
            let pipeline = build_pipeline(dirs, &tools);
            let processed = pipeline.batch()?;
            println!("processed: {processed}");
            Ok(())
        }
        Commands::Watch { dirs, tools } => {
            let pipeline = build_pipeline(dirs, &tools);
            println!("watching for new PDFs...");
            watch(&pipeline)
        }
        Commands::Extract {
            input,
            json,
            header,
            tools,
        } => extract_single(input, json, header, &tools),
    }
}

fn build_pipeline(dirs: DirArgs, tools: &ToolArgs) -> Pipeline {
    let config = PipelineConfig::new(dirs.input, dirs.output).with_extraction(tools.extraction());
    let store = JsonLedgerStore::in_dir(&config.output_dir);
    Pipeline::new(config, Box::new(tools.source()), Box::new(store))
}

fn extract_single(input: PathBuf, json: bool, header: bool, tools: &ToolArgs) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("Input is not a file: {}", input.display());
    }

    let text = DocumentText::read(&tools.source(), &input);
    let record = DocumentRecord {
        base_name: input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
        source_file: input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        file_hash: hash_file(&input)?,
        processed_at: Local::now(),
        results: resolve_fields(&text, &tools.extraction()),
    };

    if json {
        let payload = serialize_evidence(&record)?;
        let data = serde_json::to_string_pretty(&payload)
            .with_context(|| "failed to render evidence JSON")?;
        println!("{data}");
    } else {
        if header {
            println!("{}", header_row());
        }
        println!("{}", format_row(&record.results));
    }

    Ok(())
}
