// Route setup and configuration

use crate::server::ServerState;
use crate::server::handle_content::{handle_book_root, handle_content, handle_random};
use crate::server::handle_root::{handle_catalog, handle_root};
use crate::server::handle_search::{handle_search, handle_suggest};
use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/catalog", get(handle_catalog))
        .route("/content/{book}", get(handle_book_root))
        .route("/content/{book}/{*path}", get(handle_content))
        .route("/search", get(handle_search))
        .route("/suggest", get(handle_suggest))
        .route("/random", get(handle_random))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}
