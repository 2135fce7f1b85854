use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::api::{MemberKind, WikiReadApi};
use crate::titles::normalize_title;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Titles(Vec<String>),
    File(PathBuf),
    Category {
        name: String,
        namespace: Option<i32>,
    },
    Search {
        query: String,
        namespace: i32,
        limit: usize,
    },
}

/// Parses a page-list file body: one title per line, blank lines and lines
/// starting with `#` are ignored.
pub fn parse_page_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_title)
        .collect()
}

pub fn read_page_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read page list {}", path.display()))?;
    Ok(parse_page_list(&content))
}

/// Splits a comma-separated `--pages` argument.
pub fn split_titles(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(normalize_title)
        .collect()
}

/// Collects titles from every source in order, dropping duplicates. `limit`
/// caps the final list.
pub fn resolve_pages<A: WikiReadApi>(
    api: &mut A,
    sources: &[PageSource],
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let mut seen = BTreeSet::new();
    let mut titles = Vec::new();

    for source in sources {
        let batch = match source {
            PageSource::Titles(list) => list.clone(),
            PageSource::File(path) => read_page_list(path)?,
            PageSource::Category { name, namespace } => api
                .get_category_members(name, MemberKind::Page, *namespace)
                .with_context(|| format!("failed to list members of {name}"))?
                .into_iter()
                .map(|member| member.title)
                .collect(),
            PageSource::Search {
                query,
                namespace,
                limit,
            } => api
                .search(query, *namespace, *limit)
                .with_context(|| format!("failed to search for {query}"))?
                .into_iter()
                .map(|hit| hit.title)
                .collect(),
        };
        tracing::debug!(?source, count = batch.len(), "resolved page source");

        for title in batch {
            if seen.insert(title.clone()) {
                titles.push(title);
            }
        }
    }

    if let Some(limit) = limit {
        titles.truncate(limit);
    }
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use tempfile::tempdir;

    #[test]
    fn page_list_skips_blank_and_comment_lines() {
        let titles = parse_page_list("# başlık\nAli_Koç\n\n  Veli  \n#Gizli\n");
        assert_eq!(titles, vec!["Ali Koç", "Veli"]);
    }

    #[test]
    fn read_page_list_reports_missing_file() {
        let error = read_page_list(Path::new("/nonexistent/sayfalar.txt")).expect_err("must fail");
        assert!(error.to_string().contains("failed to read page list"));
    }

    #[test]
    fn split_titles_trims_entries() {
        assert_eq!(split_titles(" A , B,,C "), vec!["A", "B", "C"]);
    }

    #[test]
    fn resolve_pages_merges_sources_in_order() {
        let temp = tempdir().expect("tempdir");
        let list_path = temp.path().join("sayfalar.txt");
        fs::write(&list_path, "B\nC\n").expect("write list");

        let mut api = MockApi::default().with_members("Kategori:Futbolcular", &["C", "D"]);
        api.search_hits = vec!["E".to_string(), "A".to_string()];

        let titles = resolve_pages(
            &mut api,
            &[
                PageSource::Titles(vec!["A".to_string(), "B".to_string()]),
                PageSource::File(list_path),
                PageSource::Category {
                    name: "Futbolcular".to_string(),
                    namespace: Some(0),
                },
                PageSource::Search {
                    query: "futbolcu".to_string(),
                    namespace: 0,
                    limit: 10,
                },
            ],
            None,
        )
        .expect("resolve");
        assert_eq!(titles, vec!["A", "B", "C", "D", "E"]);

        let limited = resolve_pages(
            &mut api,
            &[PageSource::Titles(vec!["A".to_string(), "B".to_string()])],
            Some(1),
        )
        .expect("resolve");
        assert_eq!(limited, vec!["A"]);
    }
}
