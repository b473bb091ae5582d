// Archive content, main page and random article handlers

use crate::constants;
use crate::server::ServerState;
use crate::server::error::{bad_request, engine_error, not_found, task_join_error};
use crate::server::utils::{content_headers, content_url, found, inject_link_blocker};
use crate::text;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

/// `/content/{book}`: 302 to the main page
pub async fn handle_book_root(State(state): State<ServerState>, Path(book): Path<String>) -> Response {
    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
        let (_, archive) = state.book_archive(&book)?;
        let entry = archive.main_entry()?;
        Ok(content_url(&book, entry.path()))
    })
    .await;

    match result {
        Ok(Ok(url)) => found(&url),
        Ok(Err(e)) => engine_error(&e),
        Err(e) => task_join_error(e),
    }
}

struct Content {
    mimetype: String,
    data: Vec<u8>,
}

/// `/content/{book}/{*path}`: item bytes, redirects followed
pub async fn handle_content(
    State(state): State<ServerState>,
    Path((book, path)): Path<(String, String)>,
) -> Response {
    let block_links = state.config.block_external_links;
    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<Content> {
        let (_, archive) = state.book_archive(&book)?;
        let item = archive.entry_by_path(&path)?.item(true)?;
        Ok(Content {
            mimetype: item.mimetype().to_string(),
            data: item.data()?,
        })
    })
    .await;

    let content = match result {
        Ok(Ok(content)) => content,
        Ok(Err(e)) => return engine_error(&e),
        Err(e) => return task_join_error(e),
    };

    let headers = content_headers(&content.mimetype);
    if block_links && text::is_html_mimetype(&content.mimetype) {
        let html = inject_link_blocker(&String::from_utf8_lossy(&content.data));
        return (StatusCode::OK, headers, html).into_response();
    }
    (StatusCode::OK, headers, content.data).into_response()
}

#[derive(Deserialize)]
pub struct RandomQuery {
    pub content: Option<String>,
}

/// `/random?content=`: 302 to a random HTML article
pub async fn handle_random(State(state): State<ServerState>, Query(params): Query<RandomQuery>) -> Response {
    let Some(book) = params.content else {
        return bad_request("Missing 'content' parameter");
    };

    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<String>> {
        let (_, archive) = state.book_archive(&book)?;
        for _ in 0..constants::RANDOM_ARTICLE_ATTEMPTS {
            let entry = archive.random_entry()?;
            let Ok(item) = entry.item(true) else {
                continue;
            };
            if text::is_html_mimetype(item.mimetype()) {
                return Ok(Some(content_url(&book, item.path())));
            }
        }
        Ok(None)
    })
    .await;

    match result {
        Ok(Ok(Some(url))) => found(&url),
        Ok(Ok(None)) => not_found("No article found"),
        Ok(Err(e)) => engine_error(&e),
        Err(e) => task_join_error(e),
    }
}
