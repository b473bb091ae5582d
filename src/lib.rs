// src/lib.rs
//! Offline content archives: reading, full-text search, title suggestions and
//! authoring, a book catalog with an embedded HTTP server, and a C-compatible
//! handle API over all of it (see [`ffi`]).

pub mod archive;
pub mod archive_format;
mod cache;
pub mod constants;
pub mod creator;
pub mod ffi;
pub mod format;
pub mod library;
pub mod manager;
pub mod results;
pub mod search;
pub mod suggestion;
pub mod text;

#[cfg(feature = "server")]
pub mod runtime;
#[cfg(feature = "server")]
pub mod server;

pub use archive::{Archive, Entry, Item};
pub use archive_format::Compression;
pub use creator::{Creator, CreatorConfig, ItemSource, WriterItem};
pub use library::{Book, Library};
pub use manager::Manager;
pub use results::{ResultCursor, ResultSet};
pub use search::{Query, Search, SearchIterator, SearchResult, SearchResultSet, Searcher};
pub use suggestion::{
    SuggestionIterator, SuggestionResult, SuggestionResultSet, SuggestionSearch, SuggestionSearcher,
};

#[cfg(feature = "server")]
pub use runtime::ServerRuntime;
#[cfg(feature = "server")]
pub use server::{Server, ServerConfig};
