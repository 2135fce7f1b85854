use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::scanner::top_level_pipes;

/// Maps one parameter key onto another.
#[derive(Debug, Clone)]
pub struct ParameterRenameRule {
    pub from: String,
    pub to: String,
    pattern: Regex,
}

impl ParameterRenameRule {
    pub fn new(from: &str, to: &str) -> Result<Self, regex::Error> {
        let from = from.trim().to_lowercase();
        // Optional horizontal whitespace and at most one line break on each
        // side of the key; captured so the original layout survives.
        let pattern = Regex::new(&format!(
            r"(?i)\A([ \t]*(?:\r?\n[ \t]*)?){}([ \t]*(?:\r?\n[ \t]*)?=)",
            key_pattern(&from)
        ))?;
        Ok(Self {
            from,
            to: to.trim().to_string(),
            pattern,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRename {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDelete {
    pub key: String,
}

/// One top-level parameter: the range runs from its leading pipe up to the
/// next top-level pipe or the closing braces.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fragment {
    start: usize,
    end: usize,
    key: Option<String>,
    multi_line: bool,
}

/// Applies every rule in order to one `{{...}}` invocation; parameters of
/// nested templates are never touched. Each rule rewrites only the key, keeping the
/// pipe, the whitespace around the key and the value.
pub fn rename_parameters(text: &str, rules: &[ParameterRenameRule]) -> (String, Vec<AppliedRename>) {
    let mut current = text.to_string();
    let mut applied = Vec::new();

    for rule in rules {
        let mut output = String::with_capacity(current.len());
        let mut cursor = 0usize;
        for fragment in fragments(&current) {
            let body_start = fragment.start + 1;
            let body = &current[body_start..fragment.end];
            let Some(captures) = rule.pattern.captures(body) else {
                continue;
            };
            let (Some(whole), Some(lead), Some(tail)) =
                (captures.get(0), captures.get(1), captures.get(2))
            else {
                continue;
            };

            output.push_str(&current[cursor..body_start]);
            output.push_str(lead.as_str());
            output.push_str(&rule.to);
            output.push_str(tail.as_str());
            cursor = body_start + whole.end();
            applied.push(AppliedRename {
                from: rule.from.clone(),
                to: rule.to.clone(),
            });
        }
        if cursor > 0 {
            output.push_str(&current[cursor..]);
            current = output;
        }
    }

    (current, applied)
}

/// Removes whole parameter fragments whose key is listed in `names`.
///
/// Fragments with a single-line value go first; fragments whose value spans
/// lines are removed in a second pass. A key is reported once even when the
/// invocation repeats it.
pub fn delete_parameters<S: AsRef<str>>(text: &str, names: &[S]) -> (String, Vec<AppliedDelete>) {
    let wanted: BTreeMap<String, String> = names
        .iter()
        .map(|name| name.as_ref().trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .map(|name| (fold_key(&name), name))
        .collect();
    let mut reported = BTreeSet::new();
    let mut applied = Vec::new();
    let mut current = text.to_string();

    for multi_line_pass in [false, true] {
        let doomed: Vec<Fragment> = fragments(&current)
            .into_iter()
            .filter(|fragment| fragment.multi_line == multi_line_pass)
            .filter(|fragment| {
                fragment
                    .key
                    .as_ref()
                    .is_some_and(|key| wanted.contains_key(&fold_key(key)))
            })
            .collect();
        if doomed.is_empty() {
            continue;
        }

        let mut output = String::with_capacity(current.len());
        let mut cursor = 0usize;
        for fragment in &doomed {
            output.push_str(&current[cursor..fragment.start]);
            cursor = fragment.end;
            if let Some(name) = fragment
                .key
                .as_ref()
                .and_then(|key| wanted.get(&fold_key(key)))
                && reported.insert(name.clone())
            {
                applied.push(AppliedDelete { key: name.clone() });
            }
        }
        output.push_str(&current[cursor..]);
        current = output;
    }

    (current, applied)
}

// `(?i)` folds `I` to `i` only, so the dotless `ı` gets an explicit class.
fn key_pattern(key: &str) -> String {
    key.chars()
        .map(|ch| match ch {
            'ı' => "[ıI]".to_string(),
            other => regex::escape(other.encode_utf8(&mut [0; 4])),
        })
        .collect()
}

/// Parameter keys compare with `I`, `ı` and `i` treated as one letter.
fn fold_key(key: &str) -> String {
    key.to_lowercase().replace('ı', "i")
}

fn fragments(text: &str) -> Vec<Fragment> {
    if !text.ends_with("}}") {
        return Vec::new();
    }
    let body_end = text.len() - 2;
    let pipes = top_level_pipes(text);
    let mut out = Vec::with_capacity(pipes.len());

    for (index, pipe) in pipes.iter().enumerate() {
        let end = pipes.get(index + 1).copied().unwrap_or(body_end);
        let body = &text[pipe + 1..end];
        let (key, value) = match body.split_once('=') {
            Some((key, value)) => (Some(key.trim().to_lowercase()), value),
            None => (None, body),
        };
        out.push(Fragment {
            start: *pipe,
            end,
            key: key.filter(|key| !key.is_empty()),
            multi_line: value.trim().contains('\n'),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(from: &str, to: &str) -> ParameterRenameRule {
        ParameterRenameRule::new(from, to).expect("rule")
    }

    #[test]
    fn rename_replaces_only_the_key() {
        let (text, applied) =
            rename_parameters("{{Futbolcu bilgi kutusu|adı = Ali}}", &[rule("adı", "ad")]);
        assert_eq!(text, "{{Futbolcu bilgi kutusu|ad = Ali}}");
        assert_eq!(
            applied,
            vec![AppliedRename {
                from: "adı".to_string(),
                to: "ad".to_string()
            }]
        );
    }

    #[test]
    fn rename_preserves_layout_and_line_break_before_equals() {
        let input = "{{Futbolcu\n| boy\n  = 1,80\n|  doğduğuyer=Rize\n}}";
        let (text, applied) =
            rename_parameters(input, &[rule("boy", "boyu"), rule("doğduğuyer", "doğumyeri")]);
        assert_eq!(text, "{{Futbolcu\n| boyu\n  = 1,80\n|  doğumyeri=Rize\n}}");
        assert_eq!(applied.len(), 2);
    }

    #[test]
    fn rename_is_case_insensitive_and_exact_on_key() {
        let input = "{{Futbolcu|ad=Ali|isimler=x|BOY=1}}";
        let (text, applied) = rename_parameters(input, &[rule("boy", "boyu"), rule("isim", "ad")]);
        assert_eq!(text, "{{Futbolcu|ad=Ali|isimler=x|boyu=1}}");
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn rename_matches_uppercase_dotless_i() {
        let (text, applied) = rename_parameters("{{F|ADI=1}}", &[rule("adı", "ad")]);
        assert_eq!(text, "{{F|ad=1}}");
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn delete_matches_uppercase_dotless_i() {
        let (text, applied) = delete_parameters("{{F|TAM ADI=Ali|ad=A}}", &["tam adı"]);
        assert_eq!(text, "{{F|ad=A}}");
        assert_eq!(
            applied,
            vec![AppliedDelete {
                key: "tam adı".to_string()
            }]
        );
    }

    #[test]
    fn rename_skips_nested_template_parameters() {
        let input = "{{Futbolcu|kulüp={{bayrak|adı=TUR}}|adı=Ali}}";
        let (text, applied) = rename_parameters(input, &[rule("adı", "ad")]);
        assert_eq!(text, "{{Futbolcu|kulüp={{bayrak|adı=TUR}}|ad=Ali}}");
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn rename_onto_existing_key_is_applied_verbatim() {
        let (text, _) = rename_parameters("{{Futbolcu|isim=A|ad=B}}", &[rule("isim", "ad")]);
        assert_eq!(text, "{{Futbolcu|ad=A|ad=B}}");
    }

    #[test]
    fn rename_without_match_returns_input() {
        let input = "{{Futbolcu|ad=Ali}}";
        let (text, applied) = rename_parameters(input, &[rule("adı", "ad")]);
        assert_eq!(text, input);
        assert!(applied.is_empty());
    }

    #[test]
    fn delete_removes_single_and_multi_line_fragments() {
        let input = "{{Futbolcu\n| ad = Ali\n| kilo = 80\n| toplammaç = 12\n  (2020)\n| boyu = 1,80\n}}";
        let (text, applied) = delete_parameters(input, &["kilo", "toplammaç"]);
        assert_eq!(text, "{{Futbolcu\n| ad = Ali\n| boyu = 1,80\n}}");
        assert_eq!(
            applied,
            vec![
                AppliedDelete {
                    key: "kilo".to_string()
                },
                AppliedDelete {
                    key: "toplammaç".to_string()
                }
            ]
        );
    }

    #[test]
    fn delete_reports_repeated_key_once() {
        let (text, applied) = delete_parameters("{{Futbolcu|kilo=80|ad=A|kilo=81}}", &["kilo"]);
        assert_eq!(text, "{{Futbolcu|ad=A}}");
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn delete_handles_last_parameter_and_nested_values() {
        let input = "{{Futbolcu|ad=A|toplamgol={{sayı|12}}}}";
        let (text, applied) = delete_parameters(input, &["toplamgol"]);
        assert_eq!(text, "{{Futbolcu|ad=A}}");
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn delete_without_match_returns_input() {
        let input = "{{Futbolcu|ad=A}}";
        let (text, applied) = delete_parameters(input, &["kilo"]);
        assert_eq!(text, input);
        assert!(applied.is_empty());
    }
}
