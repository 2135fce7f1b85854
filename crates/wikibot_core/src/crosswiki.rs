use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::api::{MemberKind, NS_MAIN, WikiReadApi, api_category_title};
use crate::titles::compare_turkish;

/// Titles per pageprops or wbgetentities request.
pub const LOOKUP_BATCH: usize = 50;
/// Articles sampled from each uncovered source subcategory.
pub const ARTICLE_SAMPLE: usize = 50;

/// The three endpoints a cross-wiki run talks to: the local wiki, the source
/// edition and Wikidata.
pub struct CrossWiki<'a, T, S, W> {
    pub target: &'a mut T,
    pub source: &'a mut S,
    pub wikidata: &'a mut W,
    /// Wikidata site id of the source edition, e.g. `enwiki`.
    pub source_site: String,
    /// Wikidata site id of the local wiki, e.g. `trwiki`.
    pub target_site: String,
    /// Pause between lookup batches.
    pub pause: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingMember {
    pub source_title: String,
    pub target_title: String,
    pub item: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub category: String,
    pub source_category: String,
    pub source_count: usize,
    pub target_count: usize,
    pub missing: Vec<MissingMember>,
    pub failed_batches: usize,
}

impl SyncPlan {
    pub fn missing_titles(&self) -> Vec<String> {
        self.missing
            .iter()
            .map(|member| member.target_title.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoveredCategory {
    pub source: String,
    pub target: String,
    pub item: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UncoveredCategory {
    pub source: String,
    pub item: String,
    pub subcategory_count: usize,
    pub subcategories_with_target: usize,
    pub article_count: usize,
    pub articles_with_target: usize,
}

impl UncoveredCategory {
    pub fn subcategory_percentage(&self) -> u32 {
        percentage(self.subcategories_with_target, self.subcategory_count)
    }

    pub fn article_percentage(&self) -> u32 {
        percentage(self.articles_with_target, self.article_count)
    }

    /// Local content that would populate the category if it were created.
    pub fn potential(&self) -> usize {
        self.subcategories_with_target + self.articles_with_target
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryComparison {
    pub category: String,
    pub source_category: String,
    pub total: usize,
    /// Highest potential first.
    pub missing: Vec<UncoveredCategory>,
    pub existing: Vec<CoveredCategory>,
    pub no_wikidata: Vec<String>,
}

impl<T, S, W> CrossWiki<'_, T, S, W>
where
    T: WikiReadApi,
    S: WikiReadApi,
    W: WikiReadApi,
{
    /// Resolves the source-edition name of a local category, without its
    /// namespace prefix.
    pub fn source_category(&mut self, category: &str) -> Result<String> {
        let title = api_category_title(category);
        let items = self
            .target
            .get_wikibase_items(std::slice::from_ref(&title))
            .with_context(|| format!("failed to look up Wikidata item for {title}"))?;
        let Some(item) = items.get(&title).cloned() else {
            bail!("no Wikidata item for {title}");
        };

        let links = self
            .wikidata
            .get_sitelinks(std::slice::from_ref(&item), &self.source_site)
            .with_context(|| format!("failed to read sitelinks of {item}"))?;
        let Some(source_title) = links.get(&item) else {
            bail!("{item} has no {} sitelink", self.source_site);
        };

        let source = bare_title(source_title).to_string();
        tracing::info!(category = category, item = %item, source = %source, "resolved source category");
        Ok(source)
    }

    /// Source-edition articles of the category whose local article exists
    /// but is not yet a member. Failed lookup batches are logged and skipped.
    pub fn plan_sync(&mut self, category: &str) -> Result<SyncPlan> {
        let source_category = self.source_category(category)?;
        let source_members = self
            .source
            .get_category_members(&source_category, MemberKind::Page, Some(NS_MAIN))
            .with_context(|| format!("failed to list source category {source_category}"))?;
        let target_members: BTreeSet<String> = self
            .target
            .get_category_members(category, MemberKind::Page, None)
            .with_context(|| format!("failed to list {category}"))?
            .into_iter()
            .map(|member| member.title)
            .collect();
        tracing::info!(
            source_count = source_members.len(),
            target_count = target_members.len(),
            "comparing category members"
        );

        let mut plan = SyncPlan {
            category: category.to_string(),
            source_category,
            source_count: source_members.len(),
            target_count: target_members.len(),
            ..SyncPlan::default()
        };

        let titles: Vec<String> = source_members.into_iter().map(|member| member.title).collect();
        let batch_count = titles.len().div_ceil(LOOKUP_BATCH);
        for (index, batch) in titles.chunks(LOOKUP_BATCH).enumerate() {
            match self.target_titles(batch) {
                Ok(resolved) => {
                    plan.missing.extend(
                        resolved
                            .into_iter()
                            .filter(|member| !target_members.contains(&member.target_title)),
                    );
                }
                Err(error) => {
                    plan.failed_batches += 1;
                    tracing::warn!(
                        batch = index + 1,
                        batches = batch_count,
                        error = %format!("{error:#}"),
                        "lookup batch failed; skipping"
                    );
                }
            }
            if index + 1 < batch_count {
                self.wait();
            }
        }

        tracing::info!(missing = plan.missing.len(), "sync plan ready");
        Ok(plan)
    }

    /// Classifies the source category's subcategories by whether a local
    /// counterpart exists, and measures local coverage of each missing one.
    pub fn compare(&mut self, category: &str, sample: usize) -> Result<CategoryComparison> {
        let source_category = self.source_category(category)?;
        let subcategories: Vec<String> = self
            .source
            .get_category_members(&source_category, MemberKind::Subcategory, None)
            .with_context(|| format!("failed to list subcategories of {source_category}"))?
            .into_iter()
            .map(|member| bare_title(&member.title).to_string())
            .collect();

        let mut comparison = CategoryComparison {
            category: category.to_string(),
            source_category,
            total: subcategories.len(),
            ..CategoryComparison::default()
        };

        let batch_count = subcategories.len().div_ceil(LOOKUP_BATCH);
        for (index, batch) in subcategories.chunks(LOOKUP_BATCH).enumerate() {
            let titles: Vec<String> = batch.iter().map(|name| api_category_title(name)).collect();
            let items = self.source.get_wikibase_items(&titles)?;
            let ids: Vec<String> = items.values().cloned().collect();
            let links = if ids.is_empty() {
                BTreeMap::new()
            } else {
                self.wikidata.get_sitelinks(&ids, &self.target_site)?
            };

            for (name, title) in batch.iter().zip(&titles) {
                let Some(item) = items.get(title) else {
                    comparison.no_wikidata.push(name.clone());
                    continue;
                };
                match links.get(item) {
                    Some(target) => comparison.existing.push(CoveredCategory {
                        source: name.clone(),
                        target: bare_title(target).to_string(),
                        item: item.clone(),
                    }),
                    None => comparison.missing.push(UncoveredCategory {
                        source: name.clone(),
                        item: item.clone(),
                        ..UncoveredCategory::default()
                    }),
                }
            }
            if index + 1 < batch_count {
                self.wait();
            }
        }

        for uncovered in &mut comparison.missing {
            if let Err(error) = self.measure_coverage(uncovered, sample) {
                tracing::warn!(
                    category = %uncovered.source,
                    error = %format!("{error:#}"),
                    "coverage check failed"
                );
            }
        }

        comparison.missing.sort_by_key(|uncovered| Reverse(uncovered.potential()));
        comparison.existing.sort_by(|left, right| left.source.cmp(&right.source));
        comparison.no_wikidata.sort();
        Ok(comparison)
    }

    fn measure_coverage(&mut self, uncovered: &mut UncoveredCategory, sample: usize) -> Result<()> {
        let subcategories: Vec<String> = self
            .source
            .get_category_members(&uncovered.source, MemberKind::Subcategory, None)?
            .into_iter()
            .map(|member| member.title)
            .collect();
        uncovered.subcategory_count = subcategories.len();
        uncovered.subcategories_with_target = self.count_with_target(&subcategories)?;

        let mut articles: Vec<String> = self
            .source
            .get_category_members(&uncovered.source, MemberKind::Page, Some(NS_MAIN))?
            .into_iter()
            .map(|member| member.title)
            .collect();
        articles.truncate(sample);
        uncovered.article_count = articles.len();
        uncovered.articles_with_target = self.count_with_target(&articles)?;
        Ok(())
    }

    fn count_with_target(&mut self, titles: &[String]) -> Result<usize> {
        let mut count = 0;
        for batch in titles.chunks(LOOKUP_BATCH) {
            count += self.target_titles(batch)?.len();
        }
        Ok(count)
    }

    /// Maps source titles to their local counterparts. Titles without an
    /// item or without a local sitelink are dropped.
    fn target_titles(&mut self, titles: &[String]) -> Result<Vec<MissingMember>> {
        let items = self.source.get_wikibase_items(titles)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = items.values().cloned().collect();
        let links = self.wikidata.get_sitelinks(&ids, &self.target_site)?;

        Ok(titles
            .iter()
            .filter_map(|title| {
                let item = items.get(title)?;
                let target = links.get(item)?;
                Some(MissingMember {
                    source_title: title.clone(),
                    target_title: target.clone(),
                    item: item.clone(),
                })
            })
            .collect())
    }

    fn wait(&self) {
        if !self.pause.is_zero() {
            sleep(self.pause);
        }
    }
}

/// Local titles in Turkish alphabetical order, as shown in reports.
pub fn sorted_targets(plan: &SyncPlan) -> Vec<String> {
    let mut titles = plan.missing_titles();
    titles.sort_by(|left, right| compare_turkish(left, right));
    titles
}

fn bare_title(title: &str) -> &str {
    title.split_once(':').map(|(_, rest)| rest).unwrap_or(title)
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;

    fn setup() -> (MockApi, MockApi, MockApi) {
        let target = MockApi::default()
            .with_item("Category:Fizikçiler", "Q1")
            .with_members("Fizikçiler", &["Albert Einstein"]);
        let source = MockApi::default()
            .with_members("Physicists", &["Albert Einstein", "Niels Bohr", "Obscure Person", "No Item"])
            .with_item("Albert Einstein", "Q10")
            .with_item("Niels Bohr", "Q11")
            .with_item("Obscure Person", "Q12");
        let wikidata = MockApi::default()
            .with_sitelink("enwiki", "Q1", "Category:Physicists")
            .with_sitelink("trwiki", "Q10", "Albert Einstein")
            .with_sitelink("trwiki", "Q11", "Niels Bohr");
        (target, source, wikidata)
    }

    fn crosswiki<'a>(
        target: &'a mut MockApi,
        source: &'a mut MockApi,
        wikidata: &'a mut MockApi,
    ) -> CrossWiki<'a, MockApi, MockApi, MockApi> {
        CrossWiki {
            target,
            source,
            wikidata,
            source_site: "enwiki".to_string(),
            target_site: "trwiki".to_string(),
            pause: Duration::ZERO,
        }
    }

    #[test]
    fn source_category_follows_sitelink() {
        let (mut target, mut source, mut wikidata) = setup();
        let mut wiki = crosswiki(&mut target, &mut source, &mut wikidata);
        assert_eq!(wiki.source_category("Kategori:Fizikçiler").expect("resolve"), "Physicists");

        let error = wiki.source_category("Kimyagerler").expect_err("no item");
        assert!(error.to_string().contains("no Wikidata item"));
    }

    #[test]
    fn plan_sync_lists_local_articles_outside_the_category() {
        let (mut target, mut source, mut wikidata) = setup();
        let plan = crosswiki(&mut target, &mut source, &mut wikidata)
            .plan_sync("Fizikçiler")
            .expect("plan");

        assert_eq!(plan.source_category, "Physicists");
        assert_eq!(plan.source_count, 4);
        assert_eq!(plan.target_count, 1);
        assert_eq!(plan.failed_batches, 0);
        assert_eq!(
            plan.missing,
            vec![MissingMember {
                source_title: "Niels Bohr".to_string(),
                target_title: "Niels Bohr".to_string(),
                item: "Q11".to_string(),
            }]
        );
    }

    #[test]
    fn plan_sync_skips_failed_batches() {
        let (mut target, mut source, mut wikidata) = setup();
        source
            .failing_titles
            .insert("Niels Bohr".to_string(), "HTTP 503".to_string());
        let plan = crosswiki(&mut target, &mut source, &mut wikidata)
            .plan_sync("Fizikçiler")
            .expect("plan");

        assert_eq!(plan.failed_batches, 1);
        assert!(plan.missing.is_empty());
    }

    #[test]
    fn compare_ranks_uncovered_subcategories_by_potential() {
        let target = MockApi::default().with_item("Category:Fizikçiler", "Q1");
        let source = MockApi::default()
            .with_subcategories(
                "Physicists",
                &["Category:German physicists", "Category:Greek physicists", "Category:Tiny"],
            )
            .with_item("Category:German physicists", "Q20")
            .with_item("Category:Greek physicists", "Q21")
            .with_members("German physicists", &["Max Planck", "Otto Hahn"])
            .with_members("Greek physicists", &["Unknown Greek"])
            .with_item("Max Planck", "Q30")
            .with_item("Otto Hahn", "Q31");
        let wikidata = MockApi::default()
            .with_sitelink("enwiki", "Q1", "Category:Physicists")
            .with_sitelink("trwiki", "Q30", "Max Planck")
            .with_sitelink("trwiki", "Q31", "Otto Hahn");
        let (mut target, mut source, mut wikidata) = (target, source, wikidata);

        let comparison = crosswiki(&mut target, &mut source, &mut wikidata)
            .compare("Fizikçiler", ARTICLE_SAMPLE)
            .expect("compare");

        assert_eq!(comparison.total, 3);
        assert_eq!(comparison.no_wikidata, vec!["Tiny"]);
        assert!(comparison.existing.is_empty());
        assert_eq!(comparison.missing.len(), 2);
        assert_eq!(comparison.missing[0].source, "German physicists");
        assert_eq!(comparison.missing[0].articles_with_target, 2);
        assert_eq!(comparison.missing[0].article_percentage(), 100);
        assert_eq!(comparison.missing[1].source, "Greek physicists");
        assert_eq!(comparison.missing[1].article_percentage(), 0);
    }

    #[test]
    fn compare_reports_existing_counterparts() {
        let target = MockApi::default().with_item("Category:Fizikçiler", "Q1");
        let source = MockApi::default()
            .with_subcategories("Physicists", &["Category:Nuclear physicists"])
            .with_item("Category:Nuclear physicists", "Q40");
        let wikidata = MockApi::default()
            .with_sitelink("enwiki", "Q1", "Category:Physicists")
            .with_sitelink("trwiki", "Q40", "Kategori:Nükleer fizikçiler");
        let (mut target, mut source, mut wikidata) = (target, source, wikidata);

        let comparison = crosswiki(&mut target, &mut source, &mut wikidata)
            .compare("Fizikçiler", ARTICLE_SAMPLE)
            .expect("compare");

        assert_eq!(
            comparison.existing,
            vec![CoveredCategory {
                source: "Nuclear physicists".to_string(),
                target: "Nükleer fizikçiler".to_string(),
                item: "Q40".to_string(),
            }]
        );
    }

    #[test]
    fn sorted_targets_use_turkish_order() {
        let plan = SyncPlan {
            missing: ["Zeki", "Çetin", "Cem"]
                .iter()
                .map(|title| MissingMember {
                    source_title: title.to_string(),
                    target_title: title.to_string(),
                    item: "Q".to_string(),
                })
                .collect(),
            ..SyncPlan::default()
        };
        assert_eq!(sorted_targets(&plan), vec!["Cem", "Çetin", "Zeki"]);
    }

    #[test]
    fn percentage_rounds_and_handles_empty() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
    }
}
