use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::category::{
    CategoryNamespace, CategoryRemoval, CategoryReplacement, InsertKind, insert_category,
    remove_category, replace_category,
};
use crate::error::ScanError;
use crate::params::{ParameterRenameRule, delete_parameters, rename_parameters};
use crate::policy::{
    CategoryPredicate, DraftMarkers, MutationDecision, PageMeta, ReasonCode, Verdict,
    decide_infobox, decide_retarget, decide_unsourced_removal,
};
use crate::presets;
use crate::scanner::{Span, TemplateMatcher, find_template_spans, template_mentions};

/// A single edit made to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    TemplateRemoved { name: String },
    ParameterRenamed { from: String, to: String },
    ParameterDeleted { key: String },
    CategoryRemoved { name: String },
    CategoryAdded { name: String },
    CategoryUncommented { name: String },
    CategoryReplaced { from: String, to: String },
    BannerAdded { project: String },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemplateRemoved { name } => write!(f, "{{{{{name}}}}} kaldırıldı"),
            Self::ParameterRenamed { from, to } => write!(f, "{from} → {to}"),
            Self::ParameterDeleted { key } => write!(f, "{key} silindi"),
            Self::CategoryRemoved { name } => write!(f, "[[Kategori:{name}]] kaldırıldı"),
            Self::CategoryAdded { name } => write!(f, "[[Kategori:{name}]] eklendi"),
            Self::CategoryUncommented { name } => {
                write!(f, "[[Kategori:{name}]] yorumdan çıkarıldı")
            }
            Self::CategoryReplaced { from, to } => {
                write!(f, "[[Kategori:{from}]] → [[Kategori:{to}]]")
            }
            Self::BannerAdded { project } => write!(f, "Vikiproje {project} eklendi"),
        }
    }
}

/// What an operation did to one page. `applied` is true only when the
/// decision approved the edit and the text actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReport {
    pub applied: bool,
    pub verdict: Verdict,
    pub reason: ReasonCode,
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub text: String,
    pub report: ChangeReport,
}

impl MutationOutcome {
    fn unchanged(doc: &str, decision: MutationDecision) -> Self {
        Self {
            text: doc.to_string(),
            report: ChangeReport {
                applied: false,
                verdict: decision.verdict,
                reason: decision.reason,
                changes: Vec::new(),
            },
        }
    }

    fn edited(doc: &str, text: String, decision: MutationDecision, changes: Vec<Change>) -> Self {
        if text == doc {
            return Self::unchanged(doc, MutationDecision::skipped(ReasonCode::NoChange));
        }
        Self {
            text,
            report: ChangeReport {
                applied: decision.is_approved(),
                verdict: decision.verdict,
                reason: decision.reason,
                changes,
            },
        }
    }

    pub fn applied(&self) -> bool {
        self.report.applied
    }
}

#[derive(Debug, Clone)]
pub struct UnsourcedRules {
    pub templates: TemplateMatcher,
    pub draft: DraftMarkers,
}

impl Default for UnsourcedRules {
    fn default() -> Self {
        Self {
            templates: TemplateMatcher::new(presets::UNSOURCED_TEMPLATES),
            draft: DraftMarkers::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InfoboxRules {
    pub templates: TemplateMatcher,
    pub renames: Vec<ParameterRenameRule>,
    pub deletes: Vec<String>,
}

impl InfoboxRules {
    pub fn new<S: AsRef<str>>(
        templates: &[S],
        renames: &[(S, S)],
        deletes: &[S],
    ) -> Result<Self, regex::Error> {
        let renames = renames
            .iter()
            .map(|(from, to)| ParameterRenameRule::new(from.as_ref(), to.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            templates: TemplateMatcher::new(templates),
            renames,
            deletes: deletes.iter().map(|name| name.as_ref().to_string()).collect(),
        })
    }

    pub fn football() -> Result<Self, regex::Error> {
        Self::new(
            presets::INFOBOX_TEMPLATES,
            presets::INFOBOX_RENAMES,
            presets::INFOBOX_DELETES,
        )
    }
}

#[derive(Debug, Clone)]
pub struct RetargetRules {
    pub namespace: CategoryNamespace,
    pub from: String,
    pub to: String,
    pub predicate: CategoryPredicate,
}

impl Default for RetargetRules {
    fn default() -> Self {
        Self {
            namespace: CategoryNamespace::default(),
            from: presets::PEOPLE_WITHOUT_INFOBOX.to_string(),
            to: presets::FOOTBALLERS_WITHOUT_INFOBOX.to_string(),
            predicate: CategoryPredicate::contains(presets::FOOTBALLER_CATEGORY_KEYWORD),
        }
    }
}

/// Drops every live unsourced template when the page is a draft or already
/// cites sources.
pub fn remove_unsourced(
    doc: &str,
    meta: &PageMeta<'_>,
    rules: &UnsourcedRules,
) -> Result<MutationOutcome, ScanError> {
    let scan = find_template_spans(doc, &rules.templates)?;
    if scan.live.is_empty() {
        return Ok(MutationOutcome::unchanged(
            doc,
            MutationDecision::skipped(ReasonCode::NotFound),
        ));
    }

    let decision = decide_unsourced_removal(doc, meta, &rules.draft);
    if !decision.is_approved() {
        return Ok(MutationOutcome::unchanged(doc, decision));
    }

    let mut text = doc.to_string();
    for template in scan.live.iter().rev() {
        text = cut_span(&text, template.span);
    }
    let changes = scan
        .live
        .iter()
        .map(|template| Change::TemplateRemoved {
            name: template.name.clone(),
        })
        .collect();
    Ok(MutationOutcome::edited(doc, text, decision, changes))
}

/// Applies rename rules, then delete rules, to every live invocation of the
/// infobox.
pub fn normalize_infobox(doc: &str, rules: &InfoboxRules) -> Result<MutationOutcome, ScanError> {
    let scan = find_template_spans(doc, &rules.templates)?;
    if scan.live.is_empty() {
        return Ok(MutationOutcome::unchanged(doc, decide_infobox(0, 0)));
    }

    let mut text = String::with_capacity(doc.len());
    let mut cursor = 0usize;
    let mut changes = Vec::new();
    for template in &scan.live {
        let (renamed, renames) = rename_parameters(template.span.slice(doc), &rules.renames);
        let (cleaned, deletes) = delete_parameters(&renamed, &rules.deletes);
        changes.extend(renames.into_iter().map(|rename| Change::ParameterRenamed {
            from: rename.from,
            to: rename.to,
        }));
        changes.extend(
            deletes
                .into_iter()
                .map(|delete| Change::ParameterDeleted { key: delete.key }),
        );
        text.push_str(&doc[cursor..template.span.start]);
        text.push_str(&cleaned);
        cursor = template.span.end;
    }
    text.push_str(&doc[cursor..]);

    let decision = decide_infobox(scan.live.len(), changes.len());
    if !decision.is_approved() {
        return Ok(MutationOutcome::unchanged(doc, decision));
    }
    Ok(MutationOutcome::edited(doc, text, decision, changes))
}

/// Swaps the maintenance category when the page's own categories satisfy
/// the predicate.
pub fn retarget_category(doc: &str, meta: &PageMeta<'_>, rules: &RetargetRules) -> MutationOutcome {
    let CategoryReplacement::Replaced { text, count } =
        replace_category(doc, &rules.namespace, &rules.from, &rules.to)
    else {
        return MutationOutcome::unchanged(doc, MutationDecision::skipped(ReasonCode::NotFound));
    };

    let decision = decide_retarget(meta, &rules.predicate);
    if !decision.is_approved() {
        return MutationOutcome::unchanged(doc, decision);
    }
    let changes = (0..count)
        .map(|_| Change::CategoryReplaced {
            from: rules.from.clone(),
            to: rules.to.clone(),
        })
        .collect();
    MutationOutcome::edited(doc, text, decision, changes)
}

pub fn add_category(doc: &str, ns: &CategoryNamespace, name: &str) -> MutationOutcome {
    let name = ns.strip_prefix(name).to_string();
    let insertion = insert_category(doc, ns, &name);
    let change = match insertion.kind {
        InsertKind::AlreadyActive => {
            return MutationOutcome::unchanged(doc, MutationDecision::skipped(ReasonCode::NoChange));
        }
        InsertKind::Uncommented => Change::CategoryUncommented { name },
        InsertKind::Inserted => Change::CategoryAdded { name },
    };
    MutationOutcome::edited(
        doc,
        insertion.text,
        MutationDecision::approved(ReasonCode::Approved),
        vec![change],
    )
}

pub fn strip_category(doc: &str, ns: &CategoryNamespace, name: &str) -> MutationOutcome {
    let name = ns.strip_prefix(name).to_string();
    match remove_category(doc, ns, &name) {
        CategoryRemoval::NotFound => {
            MutationOutcome::unchanged(doc, MutationDecision::skipped(ReasonCode::NotFound))
        }
        CategoryRemoval::NotChanged => {
            MutationOutcome::unchanged(doc, MutationDecision::skipped(ReasonCode::NoChange))
        }
        CategoryRemoval::Removed { text, count } => MutationOutcome::edited(
            doc,
            text,
            MutationDecision::approved(ReasonCode::Approved),
            (0..count)
                .map(|_| Change::CategoryRemoved { name: name.clone() })
                .collect(),
        ),
    }
}

pub fn wikiproject_banner(project: &str) -> String {
    format!(
        "{{{{{}|Proje={}|sınıf=|önem=}}}}",
        presets::WIKIPROJECT_BANNER,
        project
    )
}

/// Puts one banner per project at the top of a talk page. Pages that already
/// carry a project banner are left alone.
pub fn prepend_talk_banners<S: AsRef<str>>(existing: Option<&str>, projects: &[S]) -> MutationOutcome {
    let doc = existing.unwrap_or("");
    let mut unique: Vec<&str> = Vec::new();
    for project in projects {
        let project = project.as_ref().trim();
        if !project.is_empty() && !unique.contains(&project) {
            unique.push(project);
        }
    }
    if unique.is_empty() {
        return MutationOutcome::unchanged(doc, MutationDecision::skipped(ReasonCode::NotFound));
    }

    let banner_prefix = presets::WIKIPROJECT_BANNER.to_lowercase();
    let has_banner = template_mentions(doc)
        .iter()
        .any(|mention| mention.name.to_lowercase().starts_with(&banner_prefix));
    if has_banner {
        return MutationOutcome::unchanged(doc, MutationDecision::skipped(ReasonCode::NoChange));
    }

    let banners = unique
        .iter()
        .map(|project| wikiproject_banner(project))
        .collect::<Vec<_>>()
        .join("\n");
    let text = if doc.trim().is_empty() {
        banners
    } else {
        format!("{banners}\n\n{doc}")
    };
    let changes = unique
        .iter()
        .map(|project| Change::BannerAdded {
            project: project.to_string(),
        })
        .collect();
    MutationOutcome::edited(
        doc,
        text,
        MutationDecision::approved(ReasonCode::Approved),
        changes,
    )
}

/// Running totals for a batch, owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub processed: usize,
    pub edited: usize,
    pub skipped: usize,
    pub declined: usize,
    pub missing: usize,
    pub errors: usize,
    pub reasons: BTreeMap<String, usize>,
    pub changes: BTreeMap<String, usize>,
}

impl BatchStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, report: &ChangeReport) {
        self.processed += 1;
        *self.reasons.entry(report.reason.to_string()).or_default() += 1;
        if report.applied {
            self.edited += 1;
            for change in &report.changes {
                *self.changes.entry(change.to_string()).or_default() += 1;
            }
        } else if report.verdict == Verdict::Reject {
            self.declined += 1;
        } else {
            self.skipped += 1;
        }
    }

    pub fn record_missing(&mut self) {
        self.processed += 1;
        self.missing += 1;
        *self
            .reasons
            .entry(ReasonCode::NotFound.to_string())
            .or_default() += 1;
    }

    /// Counts a page that failed. Structural scan failures also carry their
    /// reason code.
    pub fn record_error(&mut self, reason: Option<ReasonCode>) {
        self.processed += 1;
        self.errors += 1;
        if let Some(reason) = reason {
            *self.reasons.entry(reason.to_string()).or_default() += 1;
        }
    }

    pub fn reason_count(&self, reason: ReasonCode) -> usize {
        self.reasons.get(reason.as_str()).copied().unwrap_or(0)
    }
}

/// Removes one template span together with the whitespace around it. The
/// gap left behind keeps at most one blank line.
fn cut_span(doc: &str, span: Span) -> String {
    let before = &doc[..span.start];
    let after = &doc[span.end..];
    let lead = before.len() - before.trim_end().len();
    let trail = after.len() - after.trim_start().len();
    let start = span.start - lead;
    let end = span.end + trail;

    let newlines_before = doc[start..span.start].matches('\n').count();
    let newlines_after = doc[span.end..end].matches('\n').count();
    let joint = if start == 0 || end == doc.len() || lead + trail == 0 {
        ""
    } else if newlines_before.max(newlines_after) >= 2 {
        "\n\n"
    } else if newlines_before + newlines_after > 0 {
        "\n"
    } else if doc[end..].starts_with([',', '.', ';', ':', '!', '?', ')']) {
        ""
    } else {
        " "
    };

    format!("{}{}{}", &doc[..start], joint, &doc[end..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footballer_categories() -> Vec<String> {
        vec!["Türk futbolcular".to_string()]
    }

    #[test]
    fn unsourced_template_is_removed_when_page_has_refs() {
        let doc = "{{Kaynaksız}}\nSome text with <ref>cite</ref>.";
        let outcome =
            remove_unsourced(doc, &PageMeta::new("X"), &UnsourcedRules::default()).expect("scan");
        assert_eq!(outcome.text, "Some text with <ref>cite</ref>.");
        assert!(outcome.applied());
        assert_eq!(outcome.report.reason, ReasonCode::HasSources);
        assert_eq!(
            outcome.report.changes,
            vec![Change::TemplateRemoved {
                name: "Kaynaksız".to_string()
            }]
        );
    }

    #[test]
    fn unsourced_template_stays_without_refs() {
        let doc = "{{Kaynaksız}}\nSome text, no refs.";
        let outcome =
            remove_unsourced(doc, &PageMeta::new("X"), &UnsourcedRules::default()).expect("scan");
        assert_eq!(outcome.text, doc);
        assert!(!outcome.applied());
        assert_eq!(outcome.report.verdict, Verdict::Reject);
        assert_eq!(outcome.report.reason, ReasonCode::NoSources);
    }

    #[test]
    fn unsourced_removal_keeps_paragraph_breaks() {
        let doc = "Giriş.\n\n{{Kaynak yok|tarih=Mart 2021}}\n\nGövde <ref>a</ref>\n{{kaynaksız}} satır\nSon";
        let outcome =
            remove_unsourced(doc, &PageMeta::new("X"), &UnsourcedRules::default()).expect("scan");
        assert_eq!(outcome.text, "Giriş.\n\nGövde <ref>a</ref>\nsatır\nSon");
        assert_eq!(outcome.report.changes.len(), 2);
    }

    #[test]
    fn inline_removal_does_not_leave_space_before_punctuation() {
        let rules = UnsourcedRules::default();
        let outcome = remove_unsourced("x {{Kaynaksız}}, y<ref/>", &PageMeta::new("X"), &rules)
            .expect("scan");
        assert_eq!(outcome.text, "x, y<ref/>");
        let outcome = remove_unsourced("x {{Kaynaksız}} y<ref/>", &PageMeta::new("X"), &rules)
            .expect("scan");
        assert_eq!(outcome.text, "x y<ref/>");
    }

    #[test]
    fn draft_made_only_of_the_template_becomes_empty() {
        let outcome = remove_unsourced(
            "{{Kaynaksız}}",
            &PageMeta::new("Taslak:X"),
            &UnsourcedRules::default(),
        )
        .expect("scan");
        assert!(outcome.applied());
        assert_eq!(outcome.text, "");
    }

    #[test]
    fn unsourced_removal_is_idempotent() {
        let doc = "Taslak metin\n{{Kaynaksız}}";
        let rules = UnsourcedRules::default();
        let meta = PageMeta::new("Taslak:Deneme");
        let first = remove_unsourced(doc, &meta, &rules).expect("scan");
        assert_eq!(first.text, "Taslak metin");
        assert_eq!(first.report.reason, ReasonCode::Draft);
        let second = remove_unsourced(&first.text, &meta, &rules).expect("scan");
        assert_eq!(second.text, first.text);
        assert_eq!(second.report.reason, ReasonCode::NotFound);
    }

    #[test]
    fn commented_unsourced_template_is_not_removed() {
        let doc = "<!-- {{Kaynaksız}} -->\nMetin <ref>a</ref>";
        let outcome =
            remove_unsourced(doc, &PageMeta::new("X"), &UnsourcedRules::default()).expect("scan");
        assert_eq!(outcome.text, doc);
        assert_eq!(outcome.report.reason, ReasonCode::NotFound);
    }

    #[test]
    fn unterminated_unsourced_template_aborts_page() {
        let doc = "{{Kaynaksız|tarih=2020\nMetin <ref>a</ref>";
        let error = remove_unsourced(doc, &PageMeta::new("X"), &UnsourcedRules::default())
            .expect_err("must fail");
        assert!(matches!(error, ScanError::Unterminated { offset: 0, .. }));
    }

    #[test]
    fn infobox_rename_scenario() {
        let rules = InfoboxRules::football().expect("rules");
        let outcome =
            normalize_infobox("{{Futbolcu bilgi kutusu|adı = Ali}}", &rules).expect("scan");
        assert_eq!(outcome.text, "{{Futbolcu bilgi kutusu|ad = Ali}}");
        assert!(outcome.applied());
        assert_eq!(outcome.report.changes[0].to_string(), "adı → ad");
    }

    #[test]
    fn infobox_renames_then_deletes() {
        let rules = InfoboxRules::football().expect("rules");
        let doc = "Giriş\n{{Futbolcu bilgi kutusu\n| isim = Ali\n| boy = 1,80\n| kilo = 75\n| kulüp = {{bayrak|TUR}}\n}}\nMetin";
        let outcome = normalize_infobox(doc, &rules).expect("scan");
        assert_eq!(
            outcome.text,
            "Giriş\n{{Futbolcu bilgi kutusu\n| ad = Ali\n| boyu = 1,80\n| kulüp = {{bayrak|TUR}}\n}}\nMetin"
        );
        let labels: Vec<String> = outcome.report.changes.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["boy → boyu", "isim → ad", "kilo silindi"]);
    }

    #[test]
    fn infobox_without_matching_rules_is_declined() {
        let rules = InfoboxRules::football().expect("rules");
        let outcome = normalize_infobox("{{Futbolcu|ad=Ali}}", &rules).expect("scan");
        assert_eq!(outcome.report.reason, ReasonCode::NoChange);
        assert!(!outcome.applied());
        let missing = normalize_infobox("{{Bilgi kutusu kişi|adı=Ali}}", &rules).expect("scan");
        assert_eq!(missing.report.reason, ReasonCode::NotFound);
    }

    #[test]
    fn retarget_requires_footballer_category() {
        let rules = RetargetRules::default();
        let doc = "Metin\n[[Kategori:Bilgi kutusu bulunmayan kişiler]]";
        let categories = footballer_categories();
        let outcome = retarget_category(doc, &PageMeta::new("Ali").with_categories(&categories), &rules);
        assert_eq!(outcome.text, "Metin\n[[Kategori:Bilgi kutusu bulunmayan futbolcular]]");
        assert!(outcome.applied());

        let others = vec!["Türk şarkıcılar".to_string()];
        let declined = retarget_category(doc, &PageMeta::new("Veli").with_categories(&others), &rules);
        assert_eq!(declined.text, doc);
        assert_eq!(declined.report.reason, ReasonCode::PolicyDeclined);

        let absent = retarget_category("Metin", &PageMeta::new("Ali").with_categories(&categories), &rules);
        assert_eq!(absent.report.reason, ReasonCode::NotFound);
    }

    #[test]
    fn add_category_reports_uncommenting() {
        let ns = CategoryNamespace::default();
        let outcome = add_category("Metin\n<!-- [[Kategori:A]] -->", &ns, "Kategori:A");
        assert_eq!(outcome.text, "Metin\n[[Kategori:A]]");
        assert_eq!(
            outcome.report.changes,
            vec![Change::CategoryUncommented {
                name: "A".to_string()
            }]
        );
        let again = add_category(&outcome.text, &ns, "A");
        assert!(!again.applied());
        assert_eq!(again.report.reason, ReasonCode::NoChange);
    }

    #[test]
    fn strip_category_reports_not_found_second_time() {
        let ns = CategoryNamespace::default();
        let first = strip_category("Metin\n[[Kategori:A]]", &ns, "A");
        assert_eq!(first.text, "Metin");
        let second = strip_category(&first.text, &ns, "A");
        assert_eq!(second.report.reason, ReasonCode::NotFound);
    }

    #[test]
    fn talk_banners_are_prepended_once() {
        let outcome = prepend_talk_banners(Some("== Başlık =="), &["Fizik", "Bilim", "Fizik"]);
        assert_eq!(
            outcome.text,
            "{{Vikiproje|Proje=Fizik|sınıf=|önem=}}\n{{Vikiproje|Proje=Bilim|sınıf=|önem=}}\n\n== Başlık =="
        );
        assert_eq!(outcome.report.changes.len(), 2);

        let again = prepend_talk_banners(Some(outcome.text.as_str()), &["Fizik"]);
        assert_eq!(again.report.reason, ReasonCode::NoChange);

        let fresh = prepend_talk_banners(None, &["Tıp"]);
        assert_eq!(fresh.text, "{{Vikiproje|Proje=Tıp|sınıf=|önem=}}");
        let empty = prepend_talk_banners::<&str>(Some("x"), &[]);
        assert_eq!(empty.report.reason, ReasonCode::NotFound);
    }

    #[test]
    fn batch_stats_accumulate_reports() {
        let mut stats = BatchStats::new(4);
        let rules = UnsourcedRules::default();
        for doc in ["{{Kaynaksız}}\nA <ref>x</ref>", "{{Kaynaksız}}\nB", "C"] {
            let outcome = remove_unsourced(doc, &PageMeta::new("X"), &rules).expect("scan");
            stats.record(&outcome.report);
        }
        stats.record_missing();
        assert_eq!(stats.processed, 4);
        assert_eq!(stats.edited, 1);
        assert_eq!(stats.declined, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.reason_count(ReasonCode::NotFound), 2);
        assert_eq!(stats.changes.get("{{Kaynaksız}} kaldırıldı"), Some(&1));
    }
}
