use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::api::{WikiReadApi, WikiWriteApi};
use crate::error::AuthError;
use crate::intersect::unix_timestamp;
use crate::mutation::{prepend_talk_banners, wikiproject_banner};
use crate::presets;
use crate::titles::with_namespace;

/// Whether a source talk-page template is a WikiProject banner.
pub fn is_project_banner(template: &str) -> bool {
    let name = template.trim();
    if name.contains("WikiProject") || name.contains("WPBIO") {
        return true;
    }
    name.strip_prefix("WP")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_uppercase)
}

/// Maps banner names to local project names, first by exact name and then
/// by the project part of the name. Unknown banners are dropped; the result
/// keeps first-seen order without duplicates.
pub fn map_projects<S: AsRef<str>>(banners: &[S]) -> Vec<String> {
    let mut projects: Vec<String> = Vec::new();
    for banner in banners {
        let name = banner.as_ref().trim();
        let mapped = presets::WIKIPROJECT_MAP
            .iter()
            .find(|(source, _)| *source == name)
            .or_else(|| {
                let lowered = name.to_lowercase();
                presets::WIKIPROJECT_MAP.iter().find(|(source, _)| {
                    let key = source.trim_start_matches("WikiProject ").to_lowercase();
                    lowered.contains(&key)
                })
            })
            .map(|(_, project)| project.to_string());
        if let Some(project) = mapped
            && !projects.contains(&project)
        {
            projects.push(project);
        }
    }
    projects
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    NoEnglish,
    NoWikiproject,
    Added,
    Skipped,
    Test,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferEntry {
    pub title: String,
    pub source_title: Option<String>,
    pub source_banners: Vec<String>,
    pub banners: Vec<String>,
    pub status: TransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub processed: usize,
    pub added: usize,
    pub skipped: usize,
    pub no_english: usize,
    pub no_wikiproject: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferLog {
    pub generated_at_unix: u64,
    pub summary: TransferSummary,
    pub entries: Vec<TransferEntry>,
    /// Set when an authentication failure stopped the run early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

/// Copies WikiProject banners from source-edition talk pages onto local talk
/// pages as `{{Vikiproje}}` banners.
pub struct WikiProjectTransfer<'a, T, S, W> {
    pub target: &'a mut T,
    pub source: &'a mut S,
    pub wikidata: &'a mut W,
    pub source_site: String,
    /// Report what would be added without editing.
    pub test_mode: bool,
    pub delay: Duration,
}

impl<T, S, W> WikiProjectTransfer<'_, T, S, W>
where
    T: WikiWriteApi,
    S: WikiReadApi,
    W: WikiReadApi,
{
    pub fn run(&mut self, titles: &[String]) -> TransferLog {
        let mut log = TransferLog::default();

        for (index, title) in titles.iter().enumerate() {
            tracing::info!(page = %title, position = index + 1, total = titles.len(), "processing");
            let entry = match self.transfer(title, &mut log.summary) {
                Ok(entry) => entry,
                Err(error) if error.downcast_ref::<AuthError>().is_some() => {
                    tracing::error!(page = %title, error = %error, "authentication failed; stopping");
                    log.summary.errors += 1;
                    log.aborted = Some(error.to_string());
                    break;
                }
                Err(error) => {
                    tracing::warn!(page = %title, error = %format!("{error:#}"), "transfer failed");
                    log.summary.errors += 1;
                    TransferEntry {
                        title: title.clone(),
                        source_title: None,
                        source_banners: Vec::new(),
                        banners: Vec::new(),
                        status: TransferStatus::Failed,
                        error: Some(format!("{error:#}")),
                    }
                }
            };
            let edited = entry.status == TransferStatus::Added;
            log.entries.push(entry);

            if edited && !self.delay.is_zero() && index + 1 < titles.len() {
                sleep(self.delay);
            }
        }

        log
    }

    fn transfer(&mut self, title: &str, summary: &mut TransferSummary) -> Result<TransferEntry> {
        let mut entry = TransferEntry {
            title: title.to_string(),
            source_title: None,
            source_banners: Vec::new(),
            banners: Vec::new(),
            status: TransferStatus::NoEnglish,
            error: None,
        };

        let Some(source_title) = self.source_title(title)? else {
            summary.no_english += 1;
            return Ok(entry);
        };
        entry.source_title = Some(source_title.clone());

        let source_talk = with_namespace(presets::SOURCE_TALK_NAMESPACE, &source_title);
        entry.source_banners = self
            .source
            .get_page_templates(&source_talk)
            .with_context(|| format!("failed to list templates on {source_talk}"))?
            .into_iter()
            .filter(|template| is_project_banner(template))
            .collect();
        let projects = map_projects(&entry.source_banners);
        entry.banners = projects.iter().map(|project| wikiproject_banner(project)).collect();
        if projects.is_empty() {
            summary.no_wikiproject += 1;
            entry.status = TransferStatus::NoWikiproject;
            return Ok(entry);
        }

        if self.test_mode {
            summary.skipped += 1;
            entry.status = TransferStatus::Test;
            return Ok(entry);
        }

        let talk_title = with_namespace(presets::TALK_NAMESPACE, title);
        let existing = self.target.get_page_content(&talk_title)?;
        let outcome = prepend_talk_banners(existing.as_ref().map(|page| page.content.as_str()), &projects);
        summary.processed += 1;
        if !outcome.applied() {
            summary.skipped += 1;
            entry.status = TransferStatus::Skipped;
            return Ok(entry);
        }

        self.target
            .edit_page(&talk_title, &outcome.text, presets::WIKIPROJECT_SUMMARY, false)?;
        tracing::info!(page = %talk_title, projects = ?projects, "banners added");
        summary.added += 1;
        entry.status = TransferStatus::Added;
        Ok(entry)
    }

    fn source_title(&mut self, title: &str) -> Result<Option<String>> {
        let items = self.target.get_wikibase_items(&[title.to_string()])?;
        let Some(item) = items.get(title) else {
            return Ok(None);
        };
        let links = self
            .wikidata
            .get_sitelinks(std::slice::from_ref(item), &self.source_site)?;
        Ok(links.get(item).cloned())
    }
}

/// Writes the run log as `wikiproject_log_<unix seconds>.json` under `dir`.
pub fn write_log(dir: &Path, log: &mut TransferLog) -> Result<PathBuf> {
    log.generated_at_unix = unix_timestamp()?;
    let path = dir.join(format!("wikiproject_log_{}.json", log.generated_at_unix));
    let rendered = serde_json::to_string_pretty(log).context("failed to serialize run log")?;
    fs::write(&path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
