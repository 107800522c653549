//! Check command - validate files without submitting them

use crate::cli::style::{Stylize, check, cross};
use crate::cli::{build_pipeline, plural, read_files};
use anstream::println;
use receipt_intake::config::Config;
use receipt_intake::error::{Error, Result};
use receipt_intake::ingest::{RejectedFile, format_file_size};
use receipt_intake::types::PendingSubmission;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Print the result as JSON
    pub json: bool,
}

#[derive(Serialize)]
struct RejectionJson<'a> {
    name: &'a str,
    code: &'a str,
    message: String,
}

#[derive(Serialize)]
struct CheckJson<'a> {
    accepted: &'a [Arc<PendingSubmission>],
    rejected: Vec<RejectionJson<'a>>,
}

/// Run the check command
pub async fn run_check(config: &Config, paths: &[PathBuf], options: CheckOptions) -> Result<()> {
    let files = read_files(paths).await?;
    let (ingestor, store) = build_pipeline(config);

    let report = ingestor.ingest(files);
    let rejected = report.rejected;
    store.add(report.accepted)?;
    let snapshot = store.snapshot();

    if options.json {
        let output = CheckJson {
            accepted: &snapshot.submissions,
            rejected: rejected.iter().map(rejection_json).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_accepted(&snapshot.submissions);
        print_rejected(&rejected);
    }

    store.clear_all();

    if rejected.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "{} file{} rejected",
            rejected.len(),
            plural(rejected.len())
        )))
    }
}

fn rejection_json(rejection: &RejectedFile) -> RejectionJson<'_> {
    RejectionJson {
        name: &rejection.name,
        code: rejection.code(),
        message: rejection.error.to_string(),
    }
}

fn print_accepted(accepted: &[Arc<PendingSubmission>]) {
    if accepted.is_empty() {
        return;
    }
    println!("Accepted {} file{}:", accepted.len(), plural(accepted.len()));
    for submission in accepted {
        println!(
            "  {} {} {}",
            check(),
            submission.name,
            format!("({}, {})", submission.kind, format_file_size(submission.size)).muted()
        );
    }
}

fn print_rejected(rejected: &[RejectedFile]) {
    if rejected.is_empty() {
        return;
    }
    println!("Rejected {} file{}:", rejected.len(), plural(rejected.len()));
    for rejection in rejected {
        println!(
            "  {} {} [{}] {}",
            cross(),
            rejection.name,
            rejection.code().failure(),
            rejection.error
        );
    }
}
