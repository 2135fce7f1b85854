use std::cmp::Ordering;

use crate::scanner::normalize_spaces;

const TURKISH_ALPHABET: &str = "abcçdefgğhıijklmnoöprsştuüvyz";

/// Canonical page title: underscores become spaces, whitespace collapses.
pub fn normalize_title(title: &str) -> String {
    normalize_spaces(&title.replace('_', " "))
}

/// Removes `prefix:` from `title` when it is one of `prefixes`
/// (case-insensitive).
pub fn strip_namespace<'a>(title: &'a str, prefixes: &[&str]) -> &'a str {
    let trimmed = title.trim();
    match trimmed.split_once(':') {
        Some((prefix, rest))
            if prefixes
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(prefix.trim())) =>
        {
            rest.trim()
        }
        _ => trimmed,
    }
}

pub fn with_namespace(namespace: &str, title: &str) -> String {
    format!("{namespace}:{}", strip_namespace(title, &[namespace]))
}

/// Builds a page URL from a wiki base URL and an article path such as
/// `/wiki/$1`.
pub fn article_url(base_url: &str, article_path: &str, title: &str) -> String {
    let encoded = encode_title(&normalize_title(title));
    let path = if article_path.contains("$1") {
        article_path.replace("$1", &encoded)
    } else {
        format!("{}/{}", article_path.trim_end_matches('/'), encoded)
    };
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Orders titles by the Turkish alphabet (`ç` after `c`, `ı` before `i`),
/// ignoring case. Characters outside the alphabet sort after it by code
/// point.
pub fn compare_turkish(left: &str, right: &str) -> Ordering {
    turkish_key(left)
        .cmp(&turkish_key(right))
        .then_with(|| left.cmp(right))
}

fn turkish_key(value: &str) -> Vec<u32> {
    value
        .chars()
        .map(|ch| {
            let lower = match ch {
                'I' => 'ı',
                'İ' => 'i',
                other => other.to_lowercase().next().unwrap_or(other),
            };
            match TURKISH_ALPHABET.chars().position(|letter| letter == lower) {
                Some(rank) => 0x1_0000 + rank as u32,
                None if lower.is_ascii_digit() || lower.is_whitespace() || lower.is_ascii_punctuation() => {
                    lower as u32
                }
                None => 0x2_0000 + lower as u32,
            }
        })
        .collect()
}

fn encode_title(title: &str) -> String {
    let mut output = String::with_capacity(title.len());
    for byte in title.replace(' ', "_").bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'_'
            | b'-'
            | b'.'
            | b'~'
            | b':'
            | b'/'
            | b'('
            | b')'
            | b','
            | b'\'' => output.push(byte as char),
            other => output.push_str(&format!("%{other:02X}")),
        }
    }
    output
}
