// Landing page and JSON catalog

use crate::constants;
use crate::format::{format_bytes, format_duration_verbose, format_number};
use crate::server::ServerState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

pub async fn handle_root(State(state): State<ServerState>) -> impl IntoResponse {
    let books = state.library.books();
    let mut response = String::new();

    response.push_str(&format!("{} server {}\n\n", constants::BINARY_NAME, state.config.version));
    response.push_str(&format!("  Uptime: {}\n", format_duration_verbose(state.start_time.elapsed())));
    response.push_str(&format!("  Books:  {}\n\n", format_number(books.len())));

    if books.is_empty() {
        response.push_str("No books in the library.\n");
    }
    for book in &books {
        let key = if book.name.is_empty() { &book.id } else { &book.name };
        response.push_str(&format!("{}\n", book.title));
        response.push_str(&format!("  id:       {}\n", book.id));
        if !book.language.is_empty() {
            response.push_str(&format!("  language: {}\n", book.language));
        }
        response.push_str(&format!(
            "  articles: {} ({} media, {})\n",
            format_number(book.article_count),
            format_number(book.media_count),
            format_bytes(book.size)
        ));
        response.push_str(&format!("  browse:   /content/{}\n\n", key));
    }

    response.push_str("Endpoints\n");
    response.push_str("  GET /catalog\n");
    response.push_str("  GET /content/{book}/{path}\n");
    response.push_str("  GET /search?content={book}&pattern={text}&start=0&pageLength=25\n");
    response.push_str("  GET /suggest?content={book}&term={text}&count=10\n");
    response.push_str("  GET /random?content={book}\n");

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        response,
    )
}

pub async fn handle_catalog(State(state): State<ServerState>) -> impl IntoResponse {
    (StatusCode::OK, axum::Json(state.library.books()))
}
