use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use crate::api::{CategoryMember, MemberKind, WikiReadApi};
use crate::titles::{article_url, compare_turkish};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryIntersection {
    pub first: String,
    pub second: String,
    pub first_count: usize,
    pub second_count: usize,
    /// Shared members in Turkish alphabetical order.
    pub common: Vec<CategoryMember>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntersectionExport {
    pub generated_at_unix: u64,
    pub category1: CategorySize,
    pub category2: CategorySize,
    pub common: CommonPages,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySize {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommonPages {
    pub count: usize,
    pub articles: Vec<ExportedArticle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedArticle {
    pub title: String,
    pub pageid: i64,
    pub url: String,
}

/// Members present in both lists, matched by title.
pub fn intersect_members(first: &[CategoryMember], second: &[CategoryMember]) -> Vec<CategoryMember> {
    let second_titles: BTreeSet<&str> = second.iter().map(|member| member.title.as_str()).collect();
    let mut seen = BTreeSet::new();
    let mut common: Vec<CategoryMember> = first
        .iter()
        .filter(|member| second_titles.contains(member.title.as_str()))
        .filter(|member| seen.insert(member.title.clone()))
        .cloned()
        .collect();
    common.sort_by(|left, right| compare_turkish(&left.title, &right.title));
    common
}

/// Lists both categories concurrently, one client per thread.
pub fn fetch_intersection<A>(
    first_api: &mut A,
    second_api: &mut A,
    first: &str,
    second: &str,
) -> Result<CategoryIntersection>
where
    A: WikiReadApi + Send,
{
    let (first_members, second_members) = thread::scope(|scope| {
        let first_handle =
            scope.spawn(move || first_api.get_category_members(first, MemberKind::Page, None));
        let second_handle =
            scope.spawn(move || second_api.get_category_members(second, MemberKind::Page, None));
        let first_members = first_handle
            .join()
            .map_err(|_| anyhow!("category listing thread panicked"))?;
        let second_members = second_handle
            .join()
            .map_err(|_| anyhow!("category listing thread panicked"))?;
        Ok::<_, anyhow::Error>((first_members, second_members))
    })?;

    let first_members = first_members.with_context(|| format!("failed to list {first}"))?;
    let second_members = second_members.with_context(|| format!("failed to list {second}"))?;
    tracing::info!(
        first = first,
        first_count = first_members.len(),
        second = second,
        second_count = second_members.len(),
        "fetched category members"
    );

    Ok(CategoryIntersection {
        first: first.to_string(),
        second: second.to_string(),
        first_count: first_members.len(),
        second_count: second_members.len(),
        common: intersect_members(&first_members, &second_members),
    })
}

impl CategoryIntersection {
    pub fn titles(&self) -> Vec<String> {
        self.common.iter().map(|member| member.title.clone()).collect()
    }

    pub fn to_export(&self, base_url: &str, article_path: &str, generated_at_unix: u64) -> IntersectionExport {
        IntersectionExport {
            generated_at_unix,
            category1: CategorySize {
                name: self.first.clone(),
                count: self.first_count,
            },
            category2: CategorySize {
                name: self.second.clone(),
                count: self.second_count,
            },
            common: CommonPages {
                count: self.common.len(),
                articles: self
                    .common
                    .iter()
                    .map(|member| ExportedArticle {
                        title: member.title.clone(),
                        pageid: member.page_id,
                        url: article_url(base_url, article_path, &member.title),
                    })
                    .collect(),
            },
        }
    }
}

pub fn write_export(path: &Path, export: &IntersectionExport) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(export).context("failed to serialize intersection export")?;
    fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))
}

pub fn unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before UNIX_EPOCH")?
        .as_secs())
}
