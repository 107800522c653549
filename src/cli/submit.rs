//! Submit command - turn receipt files into invoices

use crate::cli::style::{Stylize, cross};
use crate::cli::{CliProgress, build_pipeline, plural, read_files};
use anstream::{eprintln, println};
use dialoguer::Confirm;
use receipt_intake::action::HttpInvoiceAction;
use receipt_intake::adjust::normalize_rotation;
use receipt_intake::config::Config;
use receipt_intake::error::{Error, Result};
use receipt_intake::ingest::format_file_size;
use receipt_intake::process::{BatchOutcome, SubmissionProcessor};
use receipt_intake::store::SubmissionStore;
use std::path::PathBuf;

/// Options for the submit command
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions<'a> {
    /// Endpoint overriding the configured one
    pub endpoint: Option<&'a str>,
    /// Rotate the pixels of every image by this many degrees (a multiple of 90)
    pub rotate: Option<i32>,
    /// Preview the batch and prompt for confirmation before submitting
    pub confirm: bool,
    /// Dry run - show what would be submitted without calling the endpoint
    pub dry_run: bool,
}

/// Run the submit command
pub async fn run_submit(config: &Config, paths: &[PathBuf], options: SubmitOptions<'_>) -> Result<()> {
    let endpoint = options
        .endpoint
        .map(String::from)
        .or_else(|| config.endpoint.clone())
        .ok_or_else(|| {
            Error::InvalidArgument(
                "No invoice endpoint configured. Pass --endpoint or set INTAKE_ENDPOINT".to_string(),
            )
        })?;

    let files = read_files(paths).await?;
    let (ingestor, store) = build_pipeline(config);

    let report = ingestor.ingest(files);
    for rejection in &report.rejected {
        eprintln!("{} Skipping {}: {}", cross(), rejection.name, rejection.error);
    }
    store.add(report.accepted)?;

    if store.snapshot().is_empty() {
        println!("No files to submit");
        return Ok(());
    }

    if let Some(degrees) = options.rotate {
        apply_rotation(&store, degrees)?;
    }

    print_batch(&store, &endpoint);

    if options.dry_run {
        println!("Dry run - nothing submitted");
        store.clear_all();
        return Ok(());
    }

    if options.confirm
        && !Confirm::new()
            .with_prompt("Proceed with submission?")
            .default(true)
            .interact()
            .map_err(|e| Error::InvalidArgument(format!("Failed to read confirmation: {e}")))?
    {
        println!("Aborted");
        store.clear_all();
        return Ok(());
    }

    let action = HttpInvoiceAction::new(endpoint, config.token.clone(), config.timeout())?;
    let progress = CliProgress::new(store.snapshot().pending_count());
    let outcome = SubmissionProcessor::new()
        .process_pending(&store, &action, &progress)
        .await;

    store.clear_all();

    match outcome {
        BatchOutcome::Processed(report) => {
            println!();
            if report.success() {
                println!(
                    "Created {} invoice{}",
                    report.completed.len(),
                    plural(report.completed.len())
                );
                Ok(())
            } else {
                println!(
                    "Created {} invoice{}, {} failed",
                    report.completed.len(),
                    plural(report.completed.len()),
                    report.failed.len().failure()
                );
                Err(Error::Action(format!(
                    "{} submission{} failed",
                    report.failed.len(),
                    plural(report.failed.len())
                )))
            }
        }
        BatchOutcome::NothingToProcess | BatchOutcome::AlreadyInFlight => Ok(()),
    }
}

/// Rotate the pixels of every image; PDFs are reported and left as they are
fn apply_rotation(store: &SubmissionStore, degrees: i32) -> Result<()> {
    for submission in store.snapshot().submissions.iter() {
        match store.rotate_payload(submission.id, degrees) {
            Ok(rotated) => {
                println!(
                    "  Rotated {} by {}° {}",
                    rotated.name,
                    normalize_rotation(0, degrees),
                    format!("({})", format_file_size(rotated.size)).muted()
                );
            }
            Err(Error::RotationUnsupported(_)) => {
                println!("  {} is a PDF, not rotating", submission.name.muted());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn print_batch(store: &SubmissionStore, endpoint: &str) {
    let snapshot = store.snapshot();
    println!(
        "Submitting {} file{} to {}:",
        snapshot.len(),
        plural(snapshot.len()),
        endpoint.accent()
    );
    for submission in snapshot.submissions.iter() {
        let rotation = submission
            .adjustments
            .filter(|a| a.rotation != 0)
            .map(|a| format!(", rotated {}°", a.rotation))
            .unwrap_or_default();
        println!(
            "  - {} {}",
            submission.name,
            format!(
                "({}, {}{rotation})",
                submission.kind,
                format_file_size(submission.size)
            )
            .muted()
        );
    }
    println!();
}
