use crate::error::ScanError;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const TEMPLATE_NAMESPACES: &[&str] = &["Şablon", "Template"];

/// Half-open byte range `[start, end)` into a document. Every delimiter the
/// scanner reacts to is ASCII, so bounds fall on `char` boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(end > start, "span must be non-empty");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn slice<'a>(&self, doc: &'a str) -> &'a str {
        &doc[self.start..self.end]
    }
}

/// A located `{{...}}` invocation whose name matched a [`TemplateMatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpan {
    pub span: Span,
    pub name: String,
}

/// Result of a template scan. `live` excludes matches that start inside a
/// comment block; those are listed in `commented` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateScan {
    pub live: Vec<TemplateSpan>,
    pub commented: Vec<TemplateSpan>,
}

impl TemplateScan {
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

/// Accepts a template by any of its synonymous names.
///
/// Names compare the way MediaWiki resolves titles: underscores and runs of
/// whitespace equal a single space, a `Şablon:`/`Template:` prefix is
/// ignored, and only the first letter is case-insensitive.
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    aliases: Vec<String>,
}

impl TemplateMatcher {
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for alias in aliases {
            let key = normalize_template_name(alias.as_ref());
            if !key.is_empty() && !normalized.contains(&key) {
                normalized.push(key);
            }
        }
        Self {
            aliases: normalized,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let key = normalize_template_name(name);
        !key.is_empty() && self.aliases.iter().any(|alias| *alias == key)
    }
}

/// One `{{name` occurrence, terminated or not. Used for cheap name-only
/// checks that must not fail on malformed markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMention {
    pub name: String,
    pub offset: usize,
    pub commented: bool,
}

/// Parsed view of a template span: its name and raw top-level parameter
/// fragments (`name = value` text, pipes excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInvocation {
    pub name: String,
    pub params: Vec<String>,
}

impl TemplateInvocation {
    /// Parses a complete `{{...}}` invocation. Returns `None` when the text
    /// is not wrapped in double braces.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() < 4 || !text.starts_with("{{") || !text.ends_with("}}") {
            return None;
        }
        let body_end = text.len() - 2;
        let pipes = top_level_pipes(text);
        let name_end = pipes.first().copied().unwrap_or(body_end);
        let name = text[2..name_end].trim().to_string();

        let mut params = Vec::with_capacity(pipes.len());
        for (index, pipe) in pipes.iter().enumerate() {
            let end = pipes.get(index + 1).copied().unwrap_or(body_end);
            params.push(text[pipe + 1..end].to_string());
        }
        Some(Self { name, params })
    }

    /// Looks up a parameter value by name (trimmed, case-insensitive key).
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find_map(|fragment| {
            let (name, value) = fragment.split_once('=')?;
            if name.trim().to_lowercase() == key.trim().to_lowercase() {
                Some(value.trim())
            } else {
                None
            }
        })
    }
}

/// Finds every `<!-- ... -->` block. Comments do not nest; an unclosed
/// opener runs to the end of the document.
pub fn find_comment_spans(doc: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0usize;

    while let Some(found) = doc[cursor..].find(COMMENT_OPEN) {
        let start = cursor + found;
        let body = start + COMMENT_OPEN.len();
        let end = match doc[body..].find(COMMENT_CLOSE) {
            Some(close) => body + close + COMMENT_CLOSE.len(),
            None => doc.len(),
        };
        spans.push(Span::new(start, end));
        cursor = end;
    }

    spans
}

pub fn is_inside_any(offset: usize, spans: &[Span]) -> bool {
    spans.iter().any(|span| span.contains(offset))
}

/// Returns `doc` with every comment block removed.
pub fn strip_comments(doc: &str) -> String {
    let mut output = String::with_capacity(doc.len());
    let mut cursor = 0usize;
    for span in find_comment_spans(doc) {
        output.push_str(&doc[cursor..span.start]);
        cursor = span.end;
    }
    output.push_str(&doc[cursor..]);
    output
}

/// Locates invocations of the templates accepted by `matcher`.
///
/// A match that cannot be closed before the end of the document is a
/// structural error; the caller must not edit the page. Unterminated
/// candidates inside comments are ignored since they are never rendered.
pub fn find_template_spans(doc: &str, matcher: &TemplateMatcher) -> Result<TemplateScan, ScanError> {
    let comments = find_comment_spans(doc);
    let mut scan = TemplateScan {
        live: scan_region(doc, 0, doc.len(), &comments, matcher, true)?,
        commented: Vec::new(),
    };

    for comment in &comments {
        let found = scan_region(doc, comment.start, comment.end, &[], matcher, false)?;
        scan.commented.extend(found);
    }

    Ok(scan)
}

/// Lists every `{{name` occurrence in document order without requiring the
/// invocation to be closed.
pub fn template_mentions(doc: &str) -> Vec<TemplateMention> {
    let comments = find_comment_spans(doc);
    let bytes = doc.as_bytes();
    let mut mentions = Vec::new();
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        if bytes[cursor] != b'{' {
            cursor += 1;
            continue;
        }
        let run = run_length(bytes, cursor, b'{');
        if run == 2 {
            let name = read_template_name(doc, cursor + 2);
            if !name.is_empty() {
                mentions.push(TemplateMention {
                    name: name.to_string(),
                    offset: cursor,
                    commented: is_inside_any(cursor, &comments),
                });
            }
        }
        cursor += run;
    }

    mentions
}

/// Byte offsets of the pipes separating top-level parameters of a complete
/// invocation. Pipes inside nested templates, links and comments are
/// skipped.
pub fn top_level_pipes(text: &str) -> Vec<usize> {
    let comments = find_comment_spans(text);
    let bytes = text.as_bytes();
    let mut stack: Vec<Brace> = Vec::new();
    let mut link_depth = 0usize;
    let mut pipes = Vec::new();
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        if let Some(comment) = comment_at(&comments, cursor) {
            cursor = comment.end;
            continue;
        }
        match bytes[cursor] {
            b'{' => {
                let run = run_length(bytes, cursor, b'{');
                push_opens(&mut stack, run);
                cursor += run;
            }
            b'}' => {
                let run = run_length(bytes, cursor, b'}');
                pop_closes(&mut stack, run);
                cursor += run;
            }
            b'[' if bytes.get(cursor + 1) == Some(&b'[') => {
                link_depth += 1;
                cursor += 2;
            }
            b']' if bytes.get(cursor + 1) == Some(&b']') && link_depth > 0 => {
                link_depth -= 1;
                cursor += 2;
            }
            b'|' if stack.len() == 1 && link_depth == 0 => {
                pipes.push(cursor);
                cursor += 1;
            }
            _ => cursor += 1,
        }
    }

    pipes
}

pub fn normalize_template_name(name: &str) -> String {
    let mut value = normalize_spaces(&name.replace('_', " "));
    if let Some((prefix, rest)) = value.split_once(':')
        && TEMPLATE_NAMESPACES
            .iter()
            .any(|namespace| namespace.to_lowercase() == prefix.trim().to_lowercase())
    {
        value = rest.trim().to_string();
    }

    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn normalize_spaces(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous_was_space = false;

    for ch in value.chars() {
        if ch.is_whitespace() {
            if !previous_was_space {
                output.push(' ');
                previous_was_space = true;
            }
        } else {
            output.push(ch);
            previous_was_space = false;
        }
    }

    output.trim().to_string()
}

fn scan_region(
    doc: &str,
    start: usize,
    end: usize,
    comments: &[Span],
    matcher: &TemplateMatcher,
    strict: bool,
) -> Result<Vec<TemplateSpan>, ScanError> {
    let bytes = &doc.as_bytes()[..end];
    let mut found = Vec::new();
    let mut cursor = start;

    while cursor < end {
        if let Some(comment) = comment_at(comments, cursor) {
            cursor = comment.end;
            continue;
        }
        if bytes[cursor] != b'{' {
            cursor += 1;
            continue;
        }

        let run = run_length(bytes, cursor, b'{');
        if run != 2 {
            cursor += run;
            continue;
        }
        let name = read_template_name(&doc[..end], cursor + 2);
        if !matcher.matches(name) {
            cursor += run;
            continue;
        }

        match match_braces(bytes, cursor, comments) {
            Some(close) => {
                found.push(TemplateSpan {
                    span: Span::new(cursor, close),
                    name: name.to_string(),
                });
                cursor = close;
            }
            None if strict => {
                return Err(ScanError::Unterminated {
                    name: name.to_string(),
                    offset: cursor,
                });
            }
            None => cursor += run,
        }
    }

    Ok(found)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    Double,
    Triple,
}

/// Returns the end offset of the invocation opened at `start`, or `None`
/// when depth never returns to zero.
fn match_braces(bytes: &[u8], start: usize, comments: &[Span]) -> Option<usize> {
    let mut stack: Vec<Brace> = Vec::new();
    let mut cursor = start;

    while cursor < bytes.len() {
        if let Some(comment) = comment_at(comments, cursor) {
            cursor = comment.end;
            continue;
        }
        match bytes[cursor] {
            b'{' => {
                let run = run_length(bytes, cursor, b'{');
                push_opens(&mut stack, run);
                cursor += run;
            }
            b'}' => {
                let run = run_length(bytes, cursor, b'}');
                if let Some(used) = pop_closes(&mut stack, run) {
                    return Some(cursor + used);
                }
                cursor += run;
            }
            _ => cursor += 1,
        }
    }

    None
}

// `{{{` opens a template parameter, which closes with `}}}`.
fn push_opens(stack: &mut Vec<Brace>, mut run: usize) {
    while run >= 2 {
        if run == 3 {
            stack.push(Brace::Triple);
            run = 0;
        } else {
            stack.push(Brace::Double);
            run -= 2;
        }
    }
}

/// Consumes a run of closing braces. Returns how many bytes were used when
/// the stack empties.
fn pop_closes(stack: &mut Vec<Brace>, run: usize) -> Option<usize> {
    let mut used = 0usize;
    while run - used >= 2 {
        let Some(top) = stack.pop() else {
            break;
        };
        used += if top == Brace::Triple && run - used >= 3 {
            3
        } else {
            2
        };
        if stack.is_empty() {
            return Some(used);
        }
    }
    None
}

fn run_length(bytes: &[u8], start: usize, byte: u8) -> usize {
    bytes[start..].iter().take_while(|item| **item == byte).count()
}

fn comment_at(comments: &[Span], offset: usize) -> Option<Span> {
    comments
        .binary_search_by_key(&offset, |span| span.start)
        .ok()
        .map(|index| comments[index])
}

fn read_template_name(doc: &str, from: usize) -> &str {
    let rest = &doc[from.min(doc.len())..];
    let end = rest
        .find(['|', '}', '{', '\n', '<'])
        .unwrap_or(rest.len());
    rest[..end].trim()
}
