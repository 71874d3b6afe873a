use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use notify::{Event, RecursiveMode, Watcher};

use crate::pipeline::{is_pdf, Pipeline};

/// Runs the pipeline once per created or modified PDF in the input
/// directory. Blocks until the watcher shuts down.
///
/// There is no debounce: a file still being written may be processed more
/// than once, each time its content hash changes.
pub fn watch(pipeline: &Pipeline) -> Result<()> {
    pipeline.ensure_dirs()?;
    let input_dir = &pipeline.config().input_dir;

    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher
        .watch(input_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", input_dir.display()))?;
    log::info!("watching {} for PDFs", input_dir.display());

    for res in rx {
        match res {
            Ok(event) => {
                for path in pdf_paths(&event) {
                    if let Err(err) = pipeline.process(&path) {
                        log::error!("failed to process {}: {err:#}", path.display());
                    }
                }
            }
            Err(err) => log::warn!("watch error: {err:?}"),
        }
    }

    Ok(())
}

/// PDF paths touched by a create or modify event.
pub fn pdf_paths(event: &Event) -> Vec<PathBuf> {
    if !(event.kind.is_create() || event.kind.is_modify()) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|path| is_pdf(path) && path.is_file())
        .cloned()
        .collect()
}
