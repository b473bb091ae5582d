// src/suggestion.rs
//! Title suggestions (autocomplete) over front articles
use crate::archive::Archive;
use crate::archive_format::{DirEntry, EntryTarget};
use crate::results::{self, ResultCursor, ResultSet};
use crate::text;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

/// Suggestion searcher bound to one archive
#[derive(Debug, Clone)]
pub struct SuggestionSearcher {
    archive: Archive,
    verbose: bool,
}

impl SuggestionSearcher {
    pub fn new(archive: &Archive) -> Self {
        Self {
            archive: archive.clone(),
            verbose: false,
        }
    }

    /// Diagnostic logging only; results are unaffected
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn suggest(&self, query: &str) -> Result<SuggestionSearch> {
        let started = std::time::Instant::now();
        let pattern = SuggestionPattern::parse(query);

        let matches = match (&pattern, self.archive.titles()) {
            (None, _) => Vec::new(),
            (Some(pattern), Some(titles)) => {
                let mut scored: Vec<(u32, u32)> = titles
                    .entries
                    .iter()
                    .filter_map(|&idx| {
                        let dir = self.archive.dir_entry(idx)?;
                        pattern.score(dir.display_title()).map(|score| (idx, score))
                    })
                    .collect();
                scored.sort_by(|a, b| {
                    let (ta, tb) = (self.title_of(a.0), self.title_of(b.0));
                    b.1.cmp(&a.1).then(ta.len().cmp(&tb.len())).then(ta.cmp(tb))
                });
                scored.into_iter().map(|(idx, _)| idx).collect()
            }
            (Some(_), None) => {
                let needle = query.trim().to_lowercase();
                let mut found: Vec<u32> = (0..self.archive.entry_count() as u32)
                    .filter(|&idx| {
                        self.archive.dir_entry(idx).is_some_and(|dir| {
                            is_content(dir) && dir.display_title().to_lowercase().starts_with(&needle)
                        })
                    })
                    .collect();
                found.sort_by(|&a, &b| self.title_of(a).cmp(self.title_of(b)));
                found
            }
        };

        if self.verbose {
            log::info!(
                "[Suggest] '{}' in {}: {} matches in {:?} (title index: {})",
                query,
                self.archive.path().display(),
                matches.len(),
                started.elapsed(),
                self.archive.has_title_index()
            );
        }

        let highlight = self.archive.has_title_index();
        Ok(SuggestionSearch {
            archive: self.archive.clone(),
            pattern,
            highlight,
            matches: Arc::new(matches),
        })
    }

    fn title_of(&self, idx: u32) -> &str {
        self.archive.dir_entry(idx).map(DirEntry::display_title).unwrap_or_default()
    }
}

fn is_content(dir: &DirEntry) -> bool {
    matches!(dir.target, EntryTarget::Content { .. })
}

/// Complete words plus an optional trailing prefix
#[derive(Debug, Clone)]
struct SuggestionPattern {
    exact: Vec<String>,
    prefix: Option<String>,
    phrase: String,
}

impl SuggestionPattern {
    fn parse(query: &str) -> Option<Self> {
        let mut words = text::tokenize(query);
        if words.is_empty() {
            return None;
        }
        let prefix = if query.ends_with(char::is_whitespace) {
            None
        } else {
            words.pop()
        };
        Some(Self {
            exact: words,
            prefix,
            phrase: query.trim().to_lowercase(),
        })
    }

    /// Higher is better; `None` when the title does not match
    fn score(&self, title: &str) -> Option<u32> {
        let words = text::tokenize(title);
        if !self.exact.iter().all(|w| words.contains(w)) {
            return None;
        }
        let mut score = self.exact.len() as u32;
        if let Some(prefix) = &self.prefix {
            if !words.iter().any(|w| w.starts_with(prefix.as_str())) {
                return None;
            }
            if words.contains(prefix) {
                score += 1;
            }
        }
        if title.to_lowercase().starts_with(&self.phrase) {
            score += 2;
        }
        Some(score)
    }
}

/// An executed suggestion query; immutable
#[derive(Debug, Clone)]
pub struct SuggestionSearch {
    archive: Archive,
    pattern: Option<SuggestionPattern>,
    highlight: bool,
    matches: Arc<Vec<u32>>,
}

impl SuggestionSearch {
    pub fn estimated_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn results(&self, start: usize, max: usize) -> SuggestionResultSet {
        let range = results::window(self.matches.len(), start, max);
        let records = self.matches[range]
            .iter()
            .filter_map(|&idx| {
                let dir = self.archive.dir_entry(idx)?;
                let title = dir.display_title();
                let snippet = match &self.pattern {
                    Some(p) if self.highlight => Some(text::highlight_title(title, &p.exact, p.prefix.as_deref())),
                    _ => None,
                };
                Some(SuggestionResult {
                    path: dir.path.clone(),
                    title: title.to_string(),
                    snippet,
                })
            })
            .collect();
        ResultSet::new(records)
    }
}

/// One suggestion; the snippet is optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionResult {
    pub path: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl SuggestionResult {
    pub fn has_snippet(&self) -> bool {
        self.snippet.is_some()
    }
}

pub type SuggestionResultSet = ResultSet<SuggestionResult>;
pub type SuggestionIterator = ResultCursor<SuggestionResult>;

impl ResultCursor<SuggestionResult> {
    pub fn path(&self) -> Option<&str> {
        self.current().map(|r| r.path.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.current().map(|r| r.title.as_str())
    }

    pub fn snippet(&self) -> Option<&str> {
        self.current().and_then(|r| r.snippet.as_deref())
    }

    pub fn has_snippet(&self) -> bool {
        self.current().is_some_and(SuggestionResult::has_snippet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_trailing_word_is_prefix() {
        let pattern = SuggestionPattern::parse("rust lang").unwrap();
        assert_eq!(pattern.exact, vec!["rust"]);
        assert_eq!(pattern.prefix.as_deref(), Some("lang"));

        let pattern = SuggestionPattern::parse("rust lang ").unwrap();
        assert_eq!(pattern.exact, vec!["rust", "lang"]);
        assert!(pattern.prefix.is_none());

        assert!(SuggestionPattern::parse("  ").is_none());
    }

    #[test]
    fn test_pattern_scoring() {
        let pattern = SuggestionPattern::parse("rust pro").unwrap();
        assert!(pattern.score("Programming in Rust").is_some());
        assert!(pattern.score("Rust Programming").unwrap() > pattern.score("Programming in Rust").unwrap());
        assert!(pattern.score("Python Programming").is_none());
        assert!(pattern.score("Rust Language").is_none());
    }
}
