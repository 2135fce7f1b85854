use anyhow::Result;

use crate::api::WikiWriteApi;
use crate::category::CategoryNamespace;
use crate::mutation::{
    Change, ChangeReport, InfoboxRules, RetargetRules, UnsourcedRules, add_category,
    normalize_infobox, remove_unsourced, retarget_category, strip_category,
};
use crate::policy::{PageMeta, ReasonCode};
use crate::presets;
use crate::runner::{BatchReport, RunOptions, run_batch};

pub fn run_unsourced<A: WikiWriteApi>(
    api: &mut A,
    titles: &[String],
    rules: &UnsourcedRules,
    options: &RunOptions,
) -> BatchReport {
    run_batch(
        api,
        titles,
        options,
        |_, page| Ok(remove_unsourced(&page.content, &PageMeta::new(&page.title), rules)?),
        |report| presets::unsourced_summary(report.changes.len(), report.reason == ReasonCode::Draft),
    )
}

pub fn run_infobox<A: WikiWriteApi>(
    api: &mut A,
    titles: &[String],
    rules: &InfoboxRules,
    options: &RunOptions,
) -> BatchReport {
    run_batch(
        api,
        titles,
        options,
        |_, page| Ok(normalize_infobox(&page.content, rules)?),
        |_| presets::INFOBOX_SUMMARY.to_string(),
    )
}

/// Needs the live category list of every page, so each page costs one extra
/// read request.
pub fn run_retarget<A: WikiWriteApi>(
    api: &mut A,
    titles: &[String],
    rules: &RetargetRules,
    options: &RunOptions,
) -> BatchReport {
    run_batch(
        api,
        titles,
        options,
        |api, page| -> Result<_> {
            let categories = api.get_page_categories(&page.title)?;
            let meta = PageMeta::new(&page.title).with_categories(&categories);
            Ok(retarget_category(&page.content, &meta, rules))
        },
        |_| presets::retarget_summary(&rules.from, &rules.to),
    )
}

pub fn run_strip_category<A: WikiWriteApi>(
    api: &mut A,
    titles: &[String],
    namespace: &CategoryNamespace,
    category: &str,
    options: &RunOptions,
) -> BatchReport {
    let name = namespace.strip_prefix(category).to_string();
    run_batch(
        api,
        titles,
        options,
        |_, page| Ok(strip_category(&page.content, namespace, &name)),
        |_| presets::strip_category_summary(&name),
    )
}

pub fn run_add_category<A: WikiWriteApi>(
    api: &mut A,
    titles: &[String],
    namespace: &CategoryNamespace,
    category: &str,
    options: &RunOptions,
) -> BatchReport {
    let name = namespace.strip_prefix(category).to_string();
    run_batch(
        api,
        titles,
        options,
        |_, page| Ok(add_category(&page.content, namespace, &name)),
        |report| presets::add_category_summary(&name, was_uncommented(report)),
    )
}

fn was_uncommented(report: &ChangeReport) -> bool {
    report
        .changes
        .iter()
        .any(|change| matches!(change, Change::CategoryUncommented { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::PageStatus;
    use crate::testing::MockApi;

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn unsourced_uses_draft_summary_for_drafts() {
        let mut api = MockApi::default().with_page("Taslak:Deneme", "{{Kaynaksız}}\n{{Kaynaksız}}\nMetin");
        let report = run_unsourced(
            &mut api,
            &titles(&["Taslak:Deneme"]),
            &UnsourcedRules::default(),
            &RunOptions::default(),
        );

        assert_eq!(report.stats.edited, 1);
        assert_eq!(api.pages["Taslak:Deneme"], "Metin");
        assert_eq!(
            api.edits[0].summary,
            "Bot: Taslak maddeden 2 kaynaksız şablonu kaldırıldı"
        );
    }

    #[test]
    fn infobox_edits_are_minor_when_requested() {
        let mut api = MockApi::default().with_page(
            "Ali",
            "{{Futbolcu bilgi kutusu\n| adı = Ali\n| kilo = 70\n}}\nMetin",
        );
        let options = RunOptions {
            minor: true,
            ..RunOptions::default()
        };
        let rules = InfoboxRules::football().expect("preset rules");

        let report = run_infobox(&mut api, &titles(&["Ali"]), &rules, &options);

        assert_eq!(report.stats.edited, 1);
        assert!(api.edits[0].minor);
        assert_eq!(api.edits[0].summary, presets::INFOBOX_SUMMARY);
        assert!(api.pages["Ali"].contains("| ad = Ali"));
        assert!(!api.pages["Ali"].contains("kilo"));
    }

    #[test]
    fn retarget_reads_live_categories() {
        let mut api = MockApi::default()
            .with_page("Ali", "Metin\n[[Kategori:Bilgi kutusu bulunmayan kişiler]]")
            .with_page("Veli", "Metin\n[[Kategori:Bilgi kutusu bulunmayan kişiler]]")
            .with_page_categories("Ali", &["Türk futbolcular", "Bilgi kutusu bulunmayan kişiler"])
            .with_page_categories("Veli", &["Türk yazarlar"]);

        let report = run_retarget(
            &mut api,
            &titles(&["Ali", "Veli"]),
            &RetargetRules::default(),
            &RunOptions::default(),
        );

        assert_eq!(api.edited_titles(), vec!["Ali"]);
        assert_eq!(
            api.pages["Ali"],
            "Metin\n[[Kategori:Bilgi kutusu bulunmayan futbolcular]]"
        );
        assert_eq!(report.stats.declined, 1);
        assert_eq!(report.pages[1].status, PageStatus::Unchanged);
    }

    #[test]
    fn strip_category_accepts_prefixed_name() {
        let mut api = MockApi::default()
            .with_page("A", "Metin\n[[Kategori:Eski]]\n[[Kategori:Kalan]]")
            .with_page("B", "Metin\n[[Kategori:Kalan]]");
        let report = run_strip_category(
            &mut api,
            &titles(&["A", "B"]),
            &CategoryNamespace::default(),
            "Kategori:Eski",
            &RunOptions::default(),
        );

        assert_eq!(api.edited_titles(), vec!["A"]);
        assert_eq!(api.pages["A"], "Metin\n[[Kategori:Kalan]]");
        assert_eq!(api.edits[0].summary, "[[Kategori:Eski]] kategorisi kaldırıldı");
        assert_eq!(report.stats.reason_count(ReasonCode::NotFound), 1);
    }

    #[test]
    fn add_category_summary_reflects_uncommenting() {
        let mut api = MockApi::default()
            .with_page("A", "Metin\n<!-- [[Kategori:Fizikçiler]] -->")
            .with_page("B", "Metin\n[[Kategori:Başka]]");
        run_add_category(
            &mut api,
            &titles(&["A", "B"]),
            &CategoryNamespace::default(),
            "Fizikçiler",
            &RunOptions::default(),
        );

        assert_eq!(api.edited_titles(), vec!["A", "B"]);
        assert_eq!(
            api.edits[0].summary,
            "[[Kategori:Fizikçiler]] kategorisi yorumdan çıkarıldı ve aktif hale getirildi"
        );
        assert_eq!(api.edits[1].summary, "[[Kategori:Fizikçiler]] kategorisi eklendi");
        assert!(api.pages["B"].contains("[[Kategori:Başka]]\n[[Kategori:Fizikçiler]]"));
    }
}
