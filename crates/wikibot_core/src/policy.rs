use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::scanner::{strip_comments, template_mentions};

pub const DEFAULT_DRAFT_PREFIXES: &[&str] = &["Taslak:"];
pub const DEFAULT_DRAFT_KEYWORDS: &[&str] = &["taslak", "stub"];

static REF_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<ref(?:\s[^>]*?)?>.*?</ref\s*>|<ref(?:\s[^>]*?)?/>")
        .unwrap_or_else(|err| panic!("invalid REF_TAG regex: {err}"))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Apply,
    Skip,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReasonCode {
    Approved,
    Draft,
    HasSources,
    NoSources,
    NotFound,
    NoChange,
    PolicyDeclined,
    Unterminated,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Draft => "draft",
            Self::HasSources => "has_sources",
            Self::NoSources => "no_sources",
            Self::NotFound => "not_found",
            Self::NoChange => "no_change",
            Self::PolicyDeclined => "policy_declined",
            Self::Unterminated => "unterminated",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationDecision {
    pub verdict: Verdict,
    pub reason: ReasonCode,
}

impl MutationDecision {
    pub fn approved(reason: ReasonCode) -> Self {
        Self {
            verdict: Verdict::Apply,
            reason,
        }
    }

    pub fn skipped(reason: ReasonCode) -> Self {
        Self {
            verdict: Verdict::Skip,
            reason,
        }
    }

    pub fn declined(reason: ReasonCode) -> Self {
        Self {
            verdict: Verdict::Reject,
            reason,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.verdict == Verdict::Apply
    }
}

/// What the caller knows about a page besides its text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageMeta<'a> {
    pub title: &'a str,
    /// Visible categories without namespace prefix; `None` when not fetched.
    pub categories: Option<&'a [String]>,
}

impl<'a> PageMeta<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            categories: None,
        }
    }

    pub fn with_categories(mut self, categories: &'a [String]) -> Self {
        self.categories = Some(categories);
        self
    }
}

/// Signals that mark a page as an unfinished draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftMarkers {
    pub title_prefixes: Vec<String>,
    pub template_keywords: Vec<String>,
}

impl Default for DraftMarkers {
    fn default() -> Self {
        Self {
            title_prefixes: DEFAULT_DRAFT_PREFIXES.iter().map(|p| p.to_string()).collect(),
            template_keywords: DEFAULT_DRAFT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

pub fn is_draft(content: &str, title: &str, markers: &DraftMarkers) -> bool {
    if markers
        .title_prefixes
        .iter()
        .any(|prefix| title.trim_start().starts_with(prefix.as_str()))
    {
        return true;
    }
    template_mentions(content)
        .iter()
        .filter(|mention| !mention.commented)
        .any(|mention| {
            let name = mention.name.to_lowercase();
            markers
                .template_keywords
                .iter()
                .any(|keyword| name.contains(&keyword.to_lowercase()))
        })
}

/// True when a `<ref>...</ref>` or `<ref .../>` tag survives comment removal.
pub fn has_references(content: &str) -> bool {
    REF_TAG.is_match(&strip_comments(content))
}

/// Decision for removing unsourced templates from a page that carries one.
pub fn decide_unsourced_removal(
    content: &str,
    meta: &PageMeta<'_>,
    markers: &DraftMarkers,
) -> MutationDecision {
    if is_draft(content, meta.title, markers) {
        MutationDecision::approved(ReasonCode::Draft)
    } else if has_references(content) {
        MutationDecision::approved(ReasonCode::HasSources)
    } else {
        MutationDecision::declined(ReasonCode::NoSources)
    }
}

/// Decision for infobox normalization given how many invocations were found
/// and how many rules fired.
pub fn decide_infobox(invocations: usize, rules_matched: usize) -> MutationDecision {
    if invocations == 0 {
        MutationDecision::skipped(ReasonCode::NotFound)
    } else if rules_matched == 0 {
        MutationDecision::declined(ReasonCode::NoChange)
    } else {
        MutationDecision::approved(ReasonCode::Approved)
    }
}

/// Case-insensitive substring test over page category names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPredicate {
    needle: String,
}

impl CategoryPredicate {
    pub fn contains(needle: &str) -> Self {
        Self {
            needle: needle.trim().to_lowercase(),
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        !self.needle.is_empty() && category.to_lowercase().contains(&self.needle)
    }
}

/// Retargeting is allowed only when one of the page's own categories
/// satisfies the predicate. Unknown categories count as no match.
pub fn decide_retarget(meta: &PageMeta<'_>, predicate: &CategoryPredicate) -> MutationDecision {
    let matched = meta
        .categories
        .is_some_and(|categories| categories.iter().any(|name| predicate.matches(name)));
    if matched {
        MutationDecision::approved(ReasonCode::Approved)
    } else {
        MutationDecision::declined(ReasonCode::PolicyDeclined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_with_refs_is_approved_with_sources() {
        let content = "{{Kaynaksız}}\nSome text with <ref>cite</ref>.";
        let decision = decide_unsourced_removal(content, &PageMeta::new("X"), &DraftMarkers::default());
        assert_eq!(decision, MutationDecision::approved(ReasonCode::HasSources));
    }

    #[test]
    fn page_without_refs_is_declined() {
        let content = "{{Kaynaksız}}\nSome text, no refs.";
        let decision = decide_unsourced_removal(content, &PageMeta::new("X"), &DraftMarkers::default());
        assert_eq!(decision, MutationDecision::declined(ReasonCode::NoSources));
    }

    #[test]
    fn draft_detection_uses_title_prefix_and_live_templates() {
        let markers = DraftMarkers::default();
        assert!(is_draft("Metin", "Taslak:Ali Veli", &markers));
        assert!(is_draft("{{Futbolcu-taslak}}", "Ali Veli", &markers));
        assert!(is_draft("{{Physics-stub}}", "X", &markers));
        assert!(!is_draft("<!-- {{taslak}} -->", "X", &markers));
        assert!(!is_draft("Taslak metni", "X", &markers));
    }

    #[test]
    fn draft_wins_over_sources() {
        let content = "{{Kaynaksız}}{{taslak}}<ref>x</ref>";
        let decision = decide_unsourced_removal(content, &PageMeta::new("X"), &DraftMarkers::default());
        assert_eq!(decision.reason, ReasonCode::Draft);
    }

    #[test]
    fn references_inside_comments_do_not_count() {
        assert!(!has_references("<!-- <ref>x</ref> -->"));
        assert!(has_references("a<ref name=\"b\" />"));
        assert!(has_references("a<ref name=b>x\ny</ref>"));
        assert!(!has_references("<references />"));
    }

    #[test]
    fn decisions_are_deterministic() {
        let content = "{{Kaynaksız}}\nText <ref>a</ref>";
        let meta = PageMeta::new("Başlık");
        let markers = DraftMarkers::default();
        let first = decide_unsourced_removal(content, &meta, &markers);
        for _ in 0..5 {
            assert_eq!(decide_unsourced_removal(content, &meta, &markers), first);
        }
    }

    #[test]
    fn infobox_decision_tracks_matches() {
        assert_eq!(decide_infobox(0, 0).reason, ReasonCode::NotFound);
        assert_eq!(decide_infobox(1, 0), MutationDecision::declined(ReasonCode::NoChange));
        assert!(decide_infobox(1, 2).is_approved());
    }

    #[test]
    fn retarget_requires_matching_category() {
        let predicate = CategoryPredicate::contains("futbolcu");
        let categories = vec!["Türk Futbolcular".to_string(), "Yaşayan insanlar".to_string()];
        let meta = PageMeta::new("Ali").with_categories(&categories);
        assert!(decide_retarget(&meta, &predicate).is_approved());

        let others = vec!["Türk şarkıcılar".to_string()];
        let meta = PageMeta::new("Veli").with_categories(&others);
        assert_eq!(
            decide_retarget(&meta, &predicate),
            MutationDecision::declined(ReasonCode::PolicyDeclined)
        );
        assert!(!decide_retarget(&PageMeta::new("Veli"), &predicate).is_approved());
    }
}
