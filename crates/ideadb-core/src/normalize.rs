//! Deterministic text cleanup applied to stored items and queries alike.
//!
//! Stored text and query text must pass through the exact same pipeline;
//! any divergence breaks similarity comparability. The pipeline keeps
//! Unicode word characters and Hangul syllables, drops everything else,
//! collapses whitespace, and lowercases.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+|www\S+").expect("url pattern"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

/// Cleans `text` for embedding and comparison. Pure and idempotent;
/// empty input yields empty output.
///
/// Steps: strip URL-like substrings, strip HTML tags, unescape HTML
/// entities, drop characters outside word/whitespace/Hangul, collapse
/// whitespace runs, trim, lowercase.
pub fn normalize(text: &str) -> String {
    // Deletions can splice new strippable substrings together
    // ("htt!p://x" -> "httpx"), so run the pass to a fixpoint. Each
    // extra pass strictly shrinks the text, so this terminates.
    let mut current = normalize_once(text);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(text: &str) -> String {
    let no_urls = URL_RE.replace_all(text, "");
    let no_tags = TAG_RE.replace_all(&no_urls, "");
    let unescaped = unescape_entities(&no_tags);
    let filtered: String = unescaped
        .chars()
        .filter(|&c| c.is_alphanumeric() || c == '_' || c.is_whitespace() || is_hangul(c))
        .collect();
    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Hangul syllables block (가..힣).
fn is_hangul(c: char) -> bool {
    matches!(c as u32, 0xAC00..=0xD7A3)
}

/// Decodes the common named entities plus `&#NNN;` / `&#xHHH;` numeric
/// forms. Unknown entities are left as-is (and their `&`/`;` fall to the
/// character filter). Single pass: `&amp;lt;` becomes `&lt;`, not `<`.
fn unescape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        // Entity names are short; cap the lookahead so a stray '&' does
        // not scan the rest of the document.
        match tail[1..].find(';') {
            Some(end) if (1..=9).contains(&end) => match decode_entity(&tail[1..=end]) {
                Some(c) => {
                    out.push(c);
                    rest = &tail[end + 2..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            },
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}
