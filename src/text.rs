// src/text.rs
//! Tokenizing, HTML-to-text conversion and snippet extraction for indexing and search
use regex::Regex;
use scraper::Html;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Split text into lower-cased alphanumeric words
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Mimetypes whose content is indexed for full-text search
pub fn is_indexable_mimetype(mimetype: &str) -> bool {
    mimetype.starts_with("text/html") || mimetype.starts_with("text/plain")
}

pub fn is_html_mimetype(mimetype: &str) -> bool {
    mimetype.starts_with("text/html")
}

fn space_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Elements whose text never shows up in the rendered page
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Visible text of an HTML document, entities decoded and whitespace collapsed
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len() / 2);
    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    space_regex().replace_all(&out, " ").trim().to_string()
}

/// Plain text of a content blob, based on its mimetype
pub fn content_to_text(mimetype: &str, data: &[u8]) -> String {
    let raw = String::from_utf8_lossy(data);
    if is_html_mimetype(mimetype) {
        html_to_text(&raw)
    } else {
        space_regex().replace_all(&raw, " ").trim().to_string()
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn word_matches(word: &str, terms: &HashSet<String>, prefix: Option<&str>) -> bool {
    let normalized: String = word
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect();
    if normalized.is_empty() {
        return false;
    }
    terms.contains(&normalized) || prefix.is_some_and(|p| normalized.starts_with(p))
}

/// Window of `max_words` words around the first matching term, matches in `<b>`
pub fn make_snippet(text: &str, terms: &[String], max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || max_words == 0 {
        return String::new();
    }
    let term_set: HashSet<String> = terms.iter().cloned().collect();

    let first_hit = words
        .iter()
        .position(|w| word_matches(w, &term_set, None))
        .unwrap_or(0);
    let start = first_hit.saturating_sub(max_words / 3);
    let end = (start + max_words).min(words.len());

    let mut out = Vec::with_capacity(end - start + 2);
    if start > 0 {
        out.push("...".to_string());
    }
    for word in &words[start..end] {
        let escaped = escape_html(word);
        if word_matches(word, &term_set, None) {
            out.push(format!("<b>{}</b>", escaped));
        } else {
            out.push(escaped);
        }
    }
    if end < words.len() {
        out.push("...".to_string());
    }
    out.join(" ")
}

/// Title with words matching the query highlighted; the last query word may match as a prefix
pub fn highlight_title(title: &str, exact: &[String], prefix: Option<&str>) -> String {
    let term_set: HashSet<String> = exact.iter().cloned().collect();
    title
        .split(' ')
        .map(|word| {
            let escaped = escape_html(word);
            if word_matches(word, &term_set, prefix) {
                format!("<b>{}</b>", escaped)
            } else {
                escaped
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
