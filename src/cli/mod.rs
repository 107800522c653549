//! CLI commands

mod check;
mod progress;
mod style;
mod submit;

pub use check::{CheckOptions, run_check};
pub use progress::CliProgress;
pub use submit::{SubmitOptions, run_submit};

use receipt_intake::config::Config;
use receipt_intake::error::{Error, Result};
use receipt_intake::ingest::{FileIngestor, mime_type_for_path};
use receipt_intake::preview::{InMemoryPreviewProvider, ResourceReclaimer};
use receipt_intake::store::SubmissionStore;
use receipt_intake::types::RawFile;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Ingestor and store sharing one preview reclaimer
fn build_pipeline(config: &Config) -> (FileIngestor, SubmissionStore) {
    let reclaimer = Arc::new(ResourceReclaimer::new(Arc::new(
        InMemoryPreviewProvider::new(),
    )));
    (
        FileIngestor::new(config.limits(), reclaimer.clone()),
        SubmissionStore::new(reclaimer),
    )
}

/// Read files from disk, guessing MIME types from extensions
async fn read_files(paths: &[PathBuf]) -> Result<Vec<RawFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let payload = tokio::fs::read(path)
            .await
            .map_err(|e| Error::InvalidArgument(format!("cannot read {}: {e}", path.display())))?;
        files.push(RawFile::new(
            display_name(path),
            mime_type_for_path(path),
            payload,
        ));
    }
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
