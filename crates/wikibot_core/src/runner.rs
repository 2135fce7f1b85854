use std::thread::sleep;
use std::time::Duration;

use anyhow::Result;
use similar::{ChangeTag, TextDiff};

use crate::api::{RemotePage, WikiWriteApi};
use crate::error::{AuthError, ScanError};
use crate::mutation::{BatchStats, ChangeReport, MutationOutcome};
use crate::policy::ReasonCode;

pub const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    /// Pause after each submitted edit.
    pub delay: Duration,
    pub minor: bool,
    pub progress_every: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            delay: Duration::ZERO,
            minor: false,
            progress_every: PROGRESS_EVERY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Edited,
    WouldEdit { diff: String },
    Unchanged,
    Missing,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub title: String,
    pub status: PageStatus,
    pub report: Option<ChangeReport>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub stats: BatchStats,
    pub pages: Vec<PageResult>,
    /// Set when an authentication failure stopped the batch early.
    pub aborted: Option<String>,
}

/// Fetches each page, runs `transform`, and submits approved edits with
/// `summary`. Per-page failures are counted and skipped; an authentication
/// failure stops the loop and is reported in [`BatchReport::aborted`].
pub fn run_batch<A, F, S>(
    api: &mut A,
    titles: &[String],
    options: &RunOptions,
    mut transform: F,
    summary: S,
) -> BatchReport
where
    A: WikiWriteApi,
    F: FnMut(&mut A, &RemotePage) -> Result<MutationOutcome>,
    S: Fn(&ChangeReport) -> String,
{
    let mut report = BatchReport {
        stats: BatchStats::new(titles.len()),
        ..BatchReport::default()
    };

    for (index, title) in titles.iter().enumerate() {
        let result = process_page(api, title, options, &mut transform, &summary, &mut report.stats);
        match result {
            Ok(page) => report.pages.push(page),
            Err(error) if error.downcast_ref::<AuthError>().is_some() => {
                tracing::error!(page = %title, error = %error, "authentication failed; stopping batch");
                report.stats.record_error(None);
                report.aborted = Some(error.to_string());
                break;
            }
            Err(error) => {
                let reason = error
                    .downcast_ref::<ScanError>()
                    .map(|_| ReasonCode::Unterminated);
                tracing::warn!(page = %title, error = %format!("{error:#}"), "page failed");
                report.stats.record_error(reason);
                report.pages.push(PageResult {
                    title: title.clone(),
                    status: PageStatus::Failed {
                        message: format!("{error:#}"),
                    },
                    report: None,
                });
            }
        }

        let done = index + 1;
        if options.progress_every > 0 && done % options.progress_every == 0 && done < titles.len() {
            tracing::info!(
                processed = done,
                total = titles.len(),
                edited = report.stats.edited,
                errors = report.stats.errors,
                "progress"
            );
        }
    }

    report
}

fn process_page<A, F, S>(
    api: &mut A,
    title: &str,
    options: &RunOptions,
    transform: &mut F,
    summary: &S,
    stats: &mut BatchStats,
) -> Result<PageResult>
where
    A: WikiWriteApi,
    F: FnMut(&mut A, &RemotePage) -> Result<MutationOutcome>,
    S: Fn(&ChangeReport) -> String,
{
    let Some(page) = api.get_page_content(title)? else {
        tracing::info!(page = %title, "page not found");
        stats.record_missing();
        return Ok(PageResult {
            title: title.to_string(),
            status: PageStatus::Missing,
            report: None,
        });
    };

    let outcome = transform(api, &page)?;
    if !outcome.applied() {
        tracing::debug!(page = %title, reason = %outcome.report.reason, "no edit");
        stats.record(&outcome.report);
        return Ok(PageResult {
            title: title.to_string(),
            status: PageStatus::Unchanged,
            report: Some(outcome.report),
        });
    }

    let status = if options.dry_run {
        PageStatus::WouldEdit {
            diff: render_diff(&page.content, &outcome.text),
        }
    } else {
        let message = summary(&outcome.report);
        api.edit_page(title, &outcome.text, &message, options.minor)?;
        tracing::info!(page = %title, summary = %message, "edited");
        if !options.delay.is_zero() {
            sleep(options.delay);
        }
        PageStatus::Edited
    };
    stats.record(&outcome.report);

    Ok(PageResult {
        title: title.to_string(),
        status,
        report: Some(outcome.report),
    })
}

/// Line diff with three lines of context, hunks separated by `...`.
pub fn render_diff(original: &str, modified: &str) -> String {
    let diff = TextDiff::from_lines(original, modified);
    let mut output = String::new();

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push_str("...\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };
                output.push_str(sign);
                output.push_str(change.value());
                if change.missing_newline() {
                    output.push('\n');
                }
            }
        }
    }

    output
}
