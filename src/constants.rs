//! Global constants and helpers for archive filenames, on-disk format parameters, search tuning and server defaults
use std::path::Path;

/// Binary name used in archive metadata and server banners
pub const BINARY_NAME: &str = "zimbridge";

/// Package version from Cargo.toml (set at compile time)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the created_by string for archive headers
pub fn created_by() -> String {
    format!("{}/{}", BINARY_NAME, VERSION)
}

// ============================================================================
// Archive Files
// ============================================================================

/// Filename extension recognized by directory ingestion
pub const ARCHIVE_EXTENSION: &str = "zim";

/// Returns true if the path carries the archive extension
pub fn is_archive_path(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .map(|ext| ext == ARCHIVE_EXTENSION)
        .unwrap_or(false)
}

/// Format identifier stored in every archive header
pub const FORMAT_NAME: &str = "zimbridge-v1";

/// Skippable frame magic number carrying the archive header
pub const SKIPPABLE_MAGIC_HEADER: u32 = 0x184D2A5A;

// ============================================================================
// Authoring
// ============================================================================

/// Uncompressed bytes packed into one cluster before it is flushed
pub const DEFAULT_CLUSTER_SIZE: usize = 1024 * 1024;

/// zstd level used for clusters and index sections
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Title occurrences count this many times towards term frequency
pub const TITLE_TERM_WEIGHT: u32 = 3;

/// Metadata name for an illustration of the given square size
pub fn illustration_name(size: u32) -> String {
    format!("Illustration_{}x{}@1", size, size)
}

// ============================================================================
// Reading
// ============================================================================

/// Maximum number of hops when resolving a redirect chain
pub const MAX_REDIRECT_DEPTH: usize = 32;

/// Number of decompressed clusters kept per open archive
pub const CLUSTER_CACHE_CAPACITY: usize = 16;

/// Words around the first hit in a search snippet
pub const SNIPPET_WORDS: usize = 30;

// ============================================================================
// Server
// ============================================================================

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Default listening address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default page length for `/search`
pub const DEFAULT_SEARCH_PAGE_LENGTH: usize = 25;

/// Default number of entries returned by `/suggest`
pub const DEFAULT_SUGGESTION_COUNT: usize = 10;

/// Attempts made by `/random` to land on an HTML article
pub const RANDOM_ARTICLE_ATTEMPTS: usize = 100;

/// Cache lifetime advertised for archive content
pub const CONTENT_CACHE_CONTROL: &str = "public, max-age=86400";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_archive_path() {
        assert!(is_archive_path("wiki/en.zim"));
        assert!(!is_archive_path("wiki/en.zim.part"));
        assert!(!is_archive_path("notes.txt"));
        assert!(!is_archive_path("zim"));
    }

    #[test]
    fn test_illustration_name() {
        assert_eq!(illustration_name(48), "Illustration_48x48@1");
    }
}
