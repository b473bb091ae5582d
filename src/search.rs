// src/search.rs
//! Full-text search: BM25 ranking over the inverted index stored in an archive
use crate::archive::Archive;
use crate::constants;
use crate::results::{self, ResultCursor, ResultSet};
use crate::text;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

// BM25 tuning
const K1: f64 = 1.2;
const B: f64 = 0.75;

/// A search request, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    query: String,
}

impl Query {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }

    /// Distinct lower-cased terms, in query order
    pub fn terms(&self) -> Vec<String> {
        let mut terms = Vec::new();
        for term in text::tokenize(&self.query) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms
    }
}

/// Searcher bound to one archive; reusable across queries
#[derive(Debug, Clone)]
pub struct Searcher {
    archive: Archive,
}

impl Searcher {
    pub fn new(archive: &Archive) -> Result<Self> {
        if !archive.has_fulltext_index() {
            anyhow::bail!("Archive {} has no full-text index", archive.path().display());
        }
        Ok(Self {
            archive: archive.clone(),
        })
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub fn search(&self, query: &Query) -> Result<Search> {
        let index = match self.archive.fulltext() {
            Some(index) => index,
            None => anyhow::bail!("Archive {} has no full-text index", self.archive.path().display()),
        };
        let terms = query.terms();

        let total_docs = index.documents.len() as f64;
        let avg_len = index.average_length().max(1.0);
        let mut scores: HashMap<u32, f64> = HashMap::new();

        for term in &terms {
            let Some(postings) = index.postings.get(term) else {
                continue;
            };
            let df = postings.len() as f64;
            let idf = (1.0 + (total_docs - df + 0.5) / (df + 0.5)).ln();
            for posting in postings {
                let Some(doc) = index.documents.get(posting.document as usize) else {
                    continue;
                };
                let tf = posting.frequency as f64;
                let norm = 1.0 - B + B * doc.word_count as f64 / avg_len;
                *scores.entry(posting.document).or_default() += idf * tf * (K1 + 1.0) / (tf + K1 * norm);
            }
        }

        let mut matches: Vec<Match> = scores
            .into_iter()
            .filter_map(|(document, score)| {
                let doc = index.documents.get(document as usize)?;
                self.archive.dir_entry(doc.entry)?;
                Some(Match {
                    entry: doc.entry,
                    score,
                    word_count: doc.word_count,
                })
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.entry.cmp(&b.entry)));

        log::debug!(
            "Search '{}' in {}: {} matches",
            query.as_str(),
            self.archive.path().display(),
            matches.len()
        );

        Ok(Search {
            archive: self.archive.clone(),
            terms,
            matches: Arc::new(matches),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Match {
    entry: u32,
    score: f64,
    word_count: u32,
}

/// An executed query; immutable
#[derive(Debug, Clone)]
pub struct Search {
    archive: Archive,
    terms: Vec<String>,
    matches: Arc<Vec<Match>>,
}

impl Search {
    pub fn estimated_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Materialize `[start, start + max)` of the ranked matches
    pub fn results(&self, start: usize, max: usize) -> SearchResultSet {
        let range = results::window(self.matches.len(), start, max);
        let best = self.matches.first().map(|m| m.score).unwrap_or(0.0);

        let records = self.matches[range]
            .iter()
            .filter_map(|m| {
                let dir = self.archive.dir_entry(m.entry)?;
                Some(SearchResult {
                    path: dir.path.clone(),
                    title: dir.display_title().to_string(),
                    snippet: self.snippet(m.entry),
                    score: percent(m.score, best),
                    word_count: m.word_count,
                })
            })
            .collect();
        ResultSet::new(records)
    }

    fn snippet(&self, entry: u32) -> String {
        let loaded = self
            .archive
            .entry_by_index(entry)
            .and_then(|e| e.item(true))
            .and_then(|item| Ok((item.mimetype().to_string(), item.data()?)));
        match loaded {
            Ok((mimetype, data)) => {
                text::make_snippet(&text::content_to_text(&mimetype, &data), &self.terms, constants::SNIPPET_WORDS)
            }
            Err(e) => {
                log::debug!("No snippet for entry {}: {}", entry, e);
                String::new()
            }
        }
    }
}

fn percent(score: f64, best: f64) -> i32 {
    if best <= 0.0 {
        return 0;
    }
    ((score / best) * 100.0).round().clamp(0.0, 100.0) as i32
}

/// One ranked full-text match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub path: String,
    pub title: String,
    pub snippet: String,
    pub score: i32,
    pub word_count: u32,
}

pub type SearchResultSet = ResultSet<SearchResult>;
pub type SearchIterator = ResultCursor<SearchResult>;

impl ResultCursor<SearchResult> {
    pub fn path(&self) -> Option<&str> {
        self.current().map(|r| r.path.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.current().map(|r| r.title.as_str())
    }

    pub fn snippet(&self) -> Option<&str> {
        self.current().map(|r| r.snippet.as_str())
    }

    pub fn score(&self) -> Option<i32> {
        self.current().map(|r| r.score)
    }

    pub fn word_count(&self) -> Option<u32> {
        self.current().map(|r| r.word_count)
    }
}
