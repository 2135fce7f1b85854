use crate::scanner::{Span, find_comment_spans, is_inside_any, normalize_spaces};

pub const DEFAULT_CATEGORY_NAMESPACE: &str = "Kategori";
pub const CATEGORY_NAMESPACE_ALIASES: &[&str] = &["Category"];

/// Local category namespace name plus accepted aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNamespace {
    local: String,
    aliases: Vec<String>,
}

impl Default for CategoryNamespace {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY_NAMESPACE, CATEGORY_NAMESPACE_ALIASES)
    }
}

impl CategoryNamespace {
    pub fn new<S: AsRef<str>>(local: &str, aliases: &[S]) -> Self {
        let local = local.trim().trim_end_matches(':').to_string();
        let aliases = aliases
            .iter()
            .map(|alias| alias.as_ref().trim().trim_end_matches(':').to_string())
            .filter(|alias| !alias.is_empty() && !alias.eq_ignore_ascii_case(&local))
            .collect();
        Self { local, aliases }
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn accepts(&self, prefix: &str) -> bool {
        let prefix = prefix.trim().to_lowercase();
        self.local.to_lowercase() == prefix
            || self
                .aliases
                .iter()
                .any(|alias| alias.to_lowercase() == prefix)
    }

    /// Bracket form used for inserted tags.
    pub fn tag(&self, name: &str) -> String {
        format!("[[{}:{}]]", self.local, self.strip_prefix(name))
    }

    /// Drops a leading `Kategori:`/`Category:` from user-supplied names.
    pub fn strip_prefix<'a>(&self, name: &'a str) -> &'a str {
        let trimmed = name.trim();
        match trimmed.split_once(':') {
            Some((prefix, rest)) if self.accepts(prefix) => rest.trim(),
            _ => trimmed,
        }
    }

    fn same_name(&self, left: &str, right: &str) -> bool {
        comparable_name(self.strip_prefix(left)) == comparable_name(self.strip_prefix(right))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchScope {
    #[default]
    Live,
    Commented,
    Anywhere,
}

/// One category link as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReference {
    pub name: String,
    pub prefix: String,
    pub sort_key: Option<String>,
    pub text: String,
    pub span: Span,
    pub commented: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRemoval {
    Removed { text: String, count: usize },
    NotFound,
    NotChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertKind {
    AlreadyActive,
    Uncommented,
    Inserted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInsertion {
    pub text: String,
    pub kind: InsertKind,
}

impl CategoryInsertion {
    pub fn was_already_active(&self) -> bool {
        self.kind == InsertKind::AlreadyActive
    }

    pub fn was_uncommented(&self) -> bool {
        self.kind == InsertKind::Uncommented
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryReplacement {
    Replaced { text: String, count: usize },
    NotFound,
}

/// Every category link in document order, commented ones included.
pub fn all_categories(doc: &str, ns: &CategoryNamespace) -> Vec<CategoryReference> {
    let comments = find_comment_spans(doc);
    let mut refs = Vec::new();
    let mut cursor = 0usize;

    while let Some(found) = doc[cursor..].find("[[") {
        let start = cursor + found;
        let inner_start = start + 2;
        let Some(close) = doc[inner_start..].find("]]") else {
            break;
        };
        let inner_end = inner_start + close;
        let inner = &doc[inner_start..inner_end];
        cursor = inner_start;

        if inner.contains(['\n', '[']) || inner.trim_start().starts_with(':') {
            continue;
        }
        let Some((prefix, rest)) = inner.split_once(':') else {
            continue;
        };
        if !ns.accepts(prefix) {
            continue;
        }
        let (name, sort_key) = match rest.split_once('|') {
            Some((name, key)) => (name, Some(key.to_string())),
            None => (rest, None),
        };
        let name = normalize_spaces(&name.replace('_', " "));
        if name.is_empty() {
            continue;
        }

        let end = inner_end + 2;
        refs.push(CategoryReference {
            name,
            prefix: prefix.trim().to_string(),
            sort_key,
            text: doc[start..end].to_string(),
            span: Span::new(start, end),
            commented: is_inside_any(start, &comments),
        });
        cursor = end;
    }

    refs
}

pub fn live_categories(doc: &str, ns: &CategoryNamespace) -> Vec<CategoryReference> {
    all_categories(doc, ns)
        .into_iter()
        .filter(|reference| !reference.commented)
        .collect()
}

pub fn has_category(doc: &str, ns: &CategoryNamespace, name: &str, scope: MatchScope) -> bool {
    all_categories(doc, ns).iter().any(|reference| {
        let in_scope = match scope {
            MatchScope::Live => !reference.commented,
            MatchScope::Commented => reference.commented,
            MatchScope::Anywhere => true,
        };
        in_scope && ns.same_name(&reference.name, name)
    })
}

/// Removes every link to `name` (any sort key, commented or not) along with
/// the whitespace that follows it.
pub fn remove_category(doc: &str, ns: &CategoryNamespace, name: &str) -> CategoryRemoval {
    let matches: Vec<CategoryReference> = all_categories(doc, ns)
        .into_iter()
        .filter(|reference| ns.same_name(&reference.name, name))
        .collect();
    if matches.is_empty() {
        return CategoryRemoval::NotFound;
    }

    let text = cut_references(doc, &matches);
    if text == doc {
        return CategoryRemoval::NotChanged;
    }
    CategoryRemoval::Removed {
        text,
        count: matches.len(),
    }
}

/// Makes `name` a live category of the page.
///
/// A commented-out link is cut from its comment and placed live right after
/// it instead of adding a duplicate. New tags go after the last live
/// category link, or after a blank line at the end of the page.
pub fn insert_category(doc: &str, ns: &CategoryNamespace, name: &str) -> CategoryInsertion {
    let refs = all_categories(doc, ns);
    let matching: Vec<&CategoryReference> = refs
        .iter()
        .filter(|reference| ns.same_name(&reference.name, name))
        .collect();

    if matching.iter().any(|reference| !reference.commented) {
        return CategoryInsertion {
            text: doc.to_string(),
            kind: InsertKind::AlreadyActive,
        };
    }

    let comments = find_comment_spans(doc);
    if let Some(reference) = matching.first()
        && let Some(comment) = comments
            .iter()
            .find(|comment| comment.contains(reference.span.start))
    {
        return CategoryInsertion {
            text: uncomment(doc, *comment, reference),
            kind: InsertKind::Uncommented,
        };
    }

    let tag = ns.tag(name);
    let text = match refs.iter().rev().find(|reference| !reference.commented) {
        Some(last) => format!(
            "{}\n{}{}",
            &doc[..last.span.end],
            tag,
            &doc[last.span.end..]
        ),
        None if doc.trim().is_empty() => tag,
        None => format!("{}\n\n{}", doc.trim_end(), tag),
    };
    CategoryInsertion {
        text,
        kind: InsertKind::Inserted,
    }
}

/// Points every link to `from` at `to`, keeping prefix and sort key. When
/// `to` is already live the `from` links are removed instead.
pub fn replace_category(
    doc: &str,
    ns: &CategoryNamespace,
    from: &str,
    to: &str,
) -> CategoryReplacement {
    let refs = all_categories(doc, ns);
    let matches: Vec<CategoryReference> = refs
        .iter()
        .filter(|reference| ns.same_name(&reference.name, from))
        .cloned()
        .collect();
    if matches.is_empty() {
        return CategoryReplacement::NotFound;
    }

    let target_live = refs
        .iter()
        .any(|reference| !reference.commented && ns.same_name(&reference.name, to));
    if target_live {
        return CategoryReplacement::Replaced {
            text: cut_references(doc, &matches),
            count: matches.len(),
        };
    }

    let target = ns.strip_prefix(to);
    let mut text = String::with_capacity(doc.len());
    let mut cursor = 0usize;
    for reference in &matches {
        text.push_str(&doc[cursor..reference.span.start]);
        text.push_str("[[");
        text.push_str(&reference.prefix);
        text.push(':');
        text.push_str(target);
        if let Some(key) = &reference.sort_key {
            text.push('|');
            text.push_str(key);
        }
        text.push_str("]]");
        cursor = reference.span.end;
    }
    text.push_str(&doc[cursor..]);

    CategoryReplacement::Replaced {
        text,
        count: matches.len(),
    }
}

fn comparable_name(name: &str) -> String {
    normalize_spaces(&name.replace('_', " ")).to_lowercase()
}

fn cut_references(doc: &str, refs: &[CategoryReference]) -> String {
    let mut ranges: Vec<(usize, usize)> = Vec::with_capacity(refs.len());
    for reference in refs {
        let start = reference.span.start;
        let end = reference.span.end + leading_whitespace(&doc[reference.span.end..]);
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => ranges.push((start, end)),
        }
    }
    // A tag that closed the page takes the whitespace before it too.
    if let Some(last) = ranges.last_mut()
        && last.1 == doc.len()
    {
        last.0 -= trailing_whitespace(&doc[..last.0]);
    }

    let mut text = String::with_capacity(doc.len());
    let mut cursor = 0usize;
    for (start, end) in ranges {
        text.push_str(&doc[cursor..start]);
        cursor = end;
    }
    text.push_str(&doc[cursor..]);
    text
}

fn uncomment(doc: &str, comment: Span, reference: &CategoryReference) -> String {
    let closed = comment.slice(doc).ends_with("-->") && comment.len() >= 7;
    let body_end = if closed { comment.end - 3 } else { comment.end };
    let tag_end =
        (reference.span.end + leading_whitespace(&doc[reference.span.end..body_end])).min(body_end);

    let remaining = format!(
        "{}{}",
        &doc[comment.start..reference.span.start],
        &doc[tag_end..comment.end]
    );
    let remaining_body = remaining
        .trim_start_matches("<!--")
        .trim_end_matches("-->")
        .trim();

    let replacement = match (remaining_body.is_empty(), closed) {
        (true, _) => reference.text.clone(),
        (false, true) => format!("{remaining}\n{}", reference.text),
        (false, false) => format!("{}\n{remaining}", reference.text),
    };
    format!(
        "{}{}{}",
        &doc[..comment.start],
        replacement,
        &doc[comment.end..]
    )
}

fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

fn trailing_whitespace(text: &str) -> usize {
    text.len() - text.trim_end().len()
}
