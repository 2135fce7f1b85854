use std::collections::BTreeMap;

use anyhow::{Result, bail};

use crate::api::{
    CategoryMember, EditResult, MemberKind, RemotePage, SearchHit, WikiReadApi, WikiWriteApi,
    api_category_title,
};
use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedEdit {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub minor: bool,
}

/// In-memory wiki used by the batch tests.
#[derive(Default)]
pub(crate) struct MockApi {
    pub pages: BTreeMap<String, String>,
    pub members: BTreeMap<String, Vec<CategoryMember>>,
    pub subcategories: BTreeMap<String, Vec<CategoryMember>>,
    pub page_categories: BTreeMap<String, Vec<String>>,
    pub page_templates: BTreeMap<String, Vec<String>>,
    pub wikibase_items: BTreeMap<String, String>,
    pub sitelinks: BTreeMap<String, BTreeMap<String, String>>,
    pub search_hits: Vec<String>,
    pub failing_titles: BTreeMap<String, String>,
    pub auth_failure_on: Option<String>,
    pub edits: Vec<RecordedEdit>,
    pub logged_in: bool,
    pub request_count: usize,
}

impl MockApi {
    pub fn with_page(mut self, title: &str, content: &str) -> Self {
        self.pages.insert(title.to_string(), content.to_string());
        self
    }

    pub fn with_members(mut self, category: &str, titles: &[&str]) -> Self {
        self.members
            .insert(api_category_title(category), member_list(titles));
        self
    }

    pub fn with_subcategories(mut self, category: &str, titles: &[&str]) -> Self {
        self.subcategories
            .insert(api_category_title(category), member_list(titles));
        self
    }

    pub fn with_page_categories(mut self, title: &str, categories: &[&str]) -> Self {
        self.page_categories.insert(
            title.to_string(),
            categories.iter().map(|name| name.to_string()).collect(),
        );
        self
    }

    pub fn with_page_templates(mut self, title: &str, templates: &[&str]) -> Self {
        self.page_templates.insert(
            title.to_string(),
            templates.iter().map(|name| name.to_string()).collect(),
        );
        self
    }

    pub fn with_item(mut self, title: &str, item: &str) -> Self {
        self.wikibase_items
            .insert(title.to_string(), item.to_string());
        self
    }

    pub fn with_sitelink(mut self, site: &str, item: &str, title: &str) -> Self {
        self.sitelinks
            .entry(site.to_string())
            .or_default()
            .insert(item.to_string(), title.to_string());
        self
    }

    pub fn edited_titles(&self) -> Vec<&str> {
        self.edits.iter().map(|edit| edit.title.as_str()).collect()
    }
}

fn member_list(titles: &[&str]) -> Vec<CategoryMember> {
    titles
        .iter()
        .enumerate()
        .map(|(index, title)| CategoryMember {
            title: title.to_string(),
            page_id: 1000 + index as i64,
            namespace: if title.contains(':') { 14 } else { 0 },
        })
        .collect()
}

impl WikiReadApi for MockApi {
    fn get_page_contents(&mut self, titles: &[String]) -> Result<Vec<RemotePage>> {
        self.request_count += 1;
        let mut output = Vec::new();
        for title in titles {
            if let Some(message) = self.failing_titles.get(title) {
                bail!("{message}");
            }
            if let Some(content) = self.pages.get(title) {
                output.push(RemotePage {
                    title: title.clone(),
                    namespace: 0,
                    page_id: 1,
                    revision_id: 1,
                    timestamp: "2026-01-01T00:00:00Z".to_string(),
                    content: content.clone(),
                });
            }
        }
        Ok(output)
    }

    fn get_category_members(
        &mut self,
        category: &str,
        kind: MemberKind,
        _namespace: Option<i32>,
    ) -> Result<Vec<CategoryMember>> {
        self.request_count += 1;
        let source = match kind {
            MemberKind::Page => &self.members,
            MemberKind::Subcategory => &self.subcategories,
        };
        Ok(source
            .get(&api_category_title(category))
            .cloned()
            .unwrap_or_default())
    }

    fn get_page_categories(&mut self, title: &str) -> Result<Vec<String>> {
        self.request_count += 1;
        Ok(self.page_categories.get(title).cloned().unwrap_or_default())
    }

    fn get_page_templates(&mut self, title: &str) -> Result<Vec<String>> {
        self.request_count += 1;
        Ok(self.page_templates.get(title).cloned().unwrap_or_default())
    }

    fn get_wikibase_items(&mut self, titles: &[String]) -> Result<BTreeMap<String, String>> {
        self.request_count += 1;
        if let Some(message) = titles
            .iter()
            .find_map(|title| self.failing_titles.get(title))
        {
            bail!("{message}");
        }
        Ok(titles
            .iter()
            .filter_map(|title| {
                self.wikibase_items
                    .get(title)
                    .map(|item| (title.clone(), item.clone()))
            })
            .collect())
    }

    fn get_sitelinks(&mut self, ids: &[String], site: &str) -> Result<BTreeMap<String, String>> {
        self.request_count += 1;
        let Some(links) = self.sitelinks.get(site) else {
            return Ok(BTreeMap::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| links.get(id).map(|title| (id.clone(), title.clone())))
            .collect())
    }

    fn search(&mut self, _query: &str, namespace: i32, limit: usize) -> Result<Vec<SearchHit>> {
        self.request_count += 1;
        Ok(self
            .search_hits
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, title)| SearchHit {
                title: title.clone(),
                namespace,
                page_id: 2000 + index as i64,
            })
            .collect())
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

impl WikiWriteApi for MockApi {
    fn login(&mut self, _username: &str, _password: &str) -> Result<()> {
        self.request_count += 1;
        self.logged_in = true;
        Ok(())
    }

    fn edit_page(
        &mut self,
        title: &str,
        content: &str,
        summary: &str,
        minor: bool,
    ) -> Result<EditResult> {
        self.request_count += 1;
        if self.auth_failure_on.as_deref() == Some(title) {
            return Err(AuthError::new("[assertuserfailed] session expired").into());
        }
        self.edits.push(RecordedEdit {
            title: title.to_string(),
            content: content.to_string(),
            summary: summary.to_string(),
            minor,
        });
        self.pages.insert(title.to_string(), content.to_string());
        Ok(EditResult {
            title: title.to_string(),
            new_revision_id: Some(self.edits.len() as i64 + 1),
            no_change: false,
        })
    }
}
