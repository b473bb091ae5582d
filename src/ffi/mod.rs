//! C-compatible handle API over archives, search, authoring, the catalog and the server
//!
//! Every resource is a boxed `#[repr(C)]` wrapper handed out as a raw pointer
//! and released by its matching `*_free` call (null is a no-op). Failures and
//! panics never cross the boundary: each exported function returns null,
//! `false` or `0` instead. Returned strings are owned copies released with
//! `zim_free_string`; content buffers are released with `zim_free_buffer`.

mod marshal;

pub mod archive;
pub mod creator;
pub mod library;
pub mod search;
#[cfg(feature = "server")]
pub mod server;

pub use archive::{CArchive, CEntry, CItem};
pub use creator::{CCreator, CWriterItem};
pub use library::{CBook, CLibrary, CManager};
pub use marshal::{zim_free_buffer, zim_free_string};
pub use search::{
    CQuery, CSearch, CSearchIterator, CSearchResultSet, CSearcher, CSuggestionIterator, CSuggestionResultSet,
    CSuggestionSearch, CSuggestionSearcher,
};
#[cfg(feature = "server")]
pub use server::CServer;
