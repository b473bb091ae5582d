// Full-text search and title suggestion endpoints

use crate::constants;
use crate::search::{Query as SearchQuery, SearchResult, Searcher};
use crate::server::ServerState;
use crate::server::error::{bad_request, engine_error, task_join_error};
use crate::suggestion::{SuggestionResult, SuggestionSearcher};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Upper bound on `pageLength` and `count`
const MAX_PAGE_LENGTH: usize = 500;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub content: Option<String>,
    pub pattern: Option<String>,
    pub start: Option<usize>,
    pub page_length: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    book: String,
    pattern: String,
    estimated_matches: usize,
    start: usize,
    results: Vec<SearchResult>,
}

pub async fn handle_search(State(state): State<ServerState>, Query(params): Query<SearchParams>) -> Response {
    let Some(book) = params.content else {
        return bad_request("Missing 'content' parameter");
    };
    let Some(pattern) = params.pattern.filter(|p| !p.trim().is_empty()) else {
        return bad_request("Missing 'pattern' parameter");
    };
    let start = params.start.unwrap_or(0);
    let page_length = params
        .page_length
        .unwrap_or(constants::DEFAULT_SEARCH_PAGE_LENGTH)
        .min(MAX_PAGE_LENGTH);

    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<Result<SearchResponse, String>> {
        let (book, archive) = state.book_archive(&book)?;
        let searcher = match Searcher::new(&archive) {
            Ok(searcher) => searcher,
            Err(e) => return Ok(Err(e.to_string())),
        };
        let search = searcher.search(&SearchQuery::new(pattern.clone()))?;
        let results = search.results(start, page_length);
        Ok(Ok(SearchResponse {
            book: book.id,
            pattern,
            estimated_matches: search.estimated_matches(),
            start,
            results: results.records().to_vec(),
        }))
    })
    .await;

    match result {
        Ok(Ok(Ok(response))) => (StatusCode::OK, axum::Json(response)).into_response(),
        Ok(Ok(Err(message))) => bad_request(&message),
        Ok(Err(e)) => engine_error(&e),
        Err(e) => task_join_error(e),
    }
}

#[derive(Deserialize)]
pub struct SuggestParams {
    pub content: Option<String>,
    pub term: Option<String>,
    pub count: Option<usize>,
}

pub async fn handle_suggest(State(state): State<ServerState>, Query(params): Query<SuggestParams>) -> Response {
    let Some(book) = params.content else {
        return bad_request("Missing 'content' parameter");
    };
    let term = params.term.unwrap_or_default();
    if term.trim().chars().count() < 2 {
        return (StatusCode::OK, axum::Json(Vec::<SuggestionResult>::new())).into_response();
    }
    let count = params
        .count
        .unwrap_or(constants::DEFAULT_SUGGESTION_COUNT)
        .min(MAX_PAGE_LENGTH);
    let verbose = state.config.verbose;

    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<SuggestionResult>> {
        let (_, archive) = state.book_archive(&book)?;
        let mut searcher = SuggestionSearcher::new(&archive);
        searcher.set_verbose(verbose);
        let search = searcher.suggest(&term)?;
        Ok(search.results(0, count).records().to_vec())
    })
    .await;

    match result {
        Ok(Ok(suggestions)) => (StatusCode::OK, axum::Json(suggestions)).into_response(),
        Ok(Err(e)) => engine_error(&e),
        Err(e) => task_join_error(e),
    }
}
