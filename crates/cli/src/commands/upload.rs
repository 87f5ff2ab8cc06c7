//! upload - Resize and upload images, then print markdown snippets
//!
//! Files are processed one at a time in the order given (`--dir` contents
//! first). A failed file is reported immediately and the batch continues.

use std::path::{Path, PathBuf};

use r2img_core::files::collect_images;
use r2img_core::{
    Config, Error, ObjectStore, ResizeOptions, Result, UploadOptions, Uploaded, Uploader,
};
use serde::Serialize;

use super::Cli;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};

#[derive(Debug, Serialize)]
struct UploadOutput<'a> {
    status: &'static str,
    uploaded: &'a [Uploaded],
    failed: Vec<FailedEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FailedEntry {
    source: String,
    error: String,
}

/// Execute the upload action
pub async fn execute<S>(cli: &Cli, config: &Config, store: &S, formatter: &Formatter) -> ExitCode
where
    S: ObjectStore + ?Sized,
{
    let paths = match collect_inputs(cli) {
        Ok(paths) => paths,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    if paths.is_empty() {
        formatter.error("No input files. Pass image paths or --dir, or use --list / --delete.");
        return ExitCode::UsageError;
    }

    let options = UploadOptions {
        prefix: cli.prefix.clone(),
        resize: ResizeOptions {
            enabled: !cli.no_resize,
            max_width: cli.width,
            quality: cli.quality,
        },
    };
    let uploader = Uploader::new(store, config, options);

    let total = paths.len();
    let spinner = ProgressBar::spinner(formatter.config(), &progress_message(1, total, &paths[0]));
    let mut done = 0;

    let summary = uploader
        .upload_batch(&paths, |path, result| {
            done += 1;
            spinner.suspend(|| report(formatter, path, result));
            if let Some(next) = paths.get(done) {
                spinner.set_message(&progress_message(done + 1, total, next));
            }
        })
        .await;
    spinner.finish_and_clear();

    if formatter.is_json() {
        let output = UploadOutput {
            status: if summary.is_success() {
                "success"
            } else if summary.uploaded.is_empty() {
                "failed"
            } else {
                "partial"
            },
            uploaded: &summary.uploaded,
            failed: summary
                .failed
                .iter()
                .map(|f| FailedEntry {
                    source: f.source.display().to_string(),
                    error: f.error.to_string(),
                })
                .collect(),
            skipped: summary
                .skipped
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        };
        formatter.json(&output);
    } else if formatter.is_quiet() {
        // Quiet mode still prints the snippets, bare, for piping.
        for uploaded in &summary.uploaded {
            println!("{}", uploaded.markdown());
        }
    } else if !summary.uploaded.is_empty() {
        formatter.println("");
        formatter.println(&markdown_block(&summary.uploaded));
    }

    if !summary.skipped.is_empty() {
        formatter.warning(&format!(
            "Stopped early: {} file(s) not attempted",
            summary.skipped.len()
        ));
    }

    if let Some(fatal) = summary.fatal_error() {
        return ExitCode::from(fatal);
    }

    if summary.failed.is_empty() {
        ExitCode::Success
    } else {
        formatter.warning(&format!(
            "Completed with errors: {} succeeded, {} failed",
            summary.uploaded.len(),
            summary.failed.len()
        ));
        ExitCode::GeneralError
    }
}

/// `--dir` images first, then positional files, in the order given
fn collect_inputs(cli: &Cli) -> Result<Vec<PathBuf>> {
    let mut paths = match &cli.dir {
        Some(dir) => collect_images(dir)?,
        None => Vec::new(),
    };
    paths.extend(cli.files.iter().cloned());
    Ok(paths)
}

fn report(formatter: &Formatter, path: &Path, result: &Result<Uploaded>) {
    match result {
        Ok(uploaded) => {
            if !formatter.is_json() {
                formatter.println(&format_upload_line(uploaded));
            }
        }
        Err(e) => formatter.error(&format_failure_line(path, e)),
    }
}

/// `<file>: <reason>`, unless the error already names the file
fn format_failure_line(path: &Path, error: &Error) -> String {
    match error {
        Error::FileRead { .. } | Error::UnsupportedFormat { .. } => error.to_string(),
        _ => format!("{}: {error}", path.display()),
    }
}

fn markdown_block(uploaded: &[Uploaded]) -> String {
    let mut block = String::from("Markdown:");
    for item in uploaded {
        block.push_str("\n  ");
        block.push_str(&item.markdown());
    }
    block
}

fn format_upload_line(uploaded: &Uploaded) -> String {
    let name = uploaded
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| uploaded.source.display().to_string());
    format!(
        "{name} -> {} ({})",
        uploaded.url,
        humansize::format_size(uploaded.size_bytes, humansize::BINARY)
    )
}

fn progress_message(index: usize, total: usize, path: &Path) -> String {
    format!("[{index}/{total}] {}", path.display())
}
