//! Full-text search and suggestion handles
use super::archive::CArchive;
use super::marshal::*;
use crate::search::{Query, Search, SearchIterator, SearchResultSet, Searcher};
use crate::suggestion::{SuggestionIterator, SuggestionResultSet, SuggestionSearch, SuggestionSearcher};
use std::os::raw::{c_char, c_int};
use std::ptr;

#[repr(C)]
pub struct CQuery {
    query: Query,
}

#[repr(C)]
pub struct CSearcher {
    searcher: Searcher,
}

#[repr(C)]
pub struct CSearch {
    search: Search,
}

#[repr(C)]
pub struct CSearchResultSet {
    results: SearchResultSet,
}

#[repr(C)]
pub struct CSearchIterator {
    cursor: SearchIterator,
}

#[repr(C)]
pub struct CSuggestionSearcher {
    searcher: SuggestionSearcher,
}

#[repr(C)]
pub struct CSuggestionSearch {
    search: SuggestionSearch,
}

#[repr(C)]
pub struct CSuggestionResultSet {
    results: SuggestionResultSet,
}

#[repr(C)]
pub struct CSuggestionIterator {
    cursor: SuggestionIterator,
}

// ============================================================================
// Query / Searcher / Search
// ============================================================================

/// # Safety
///
/// `query_str` must be null or a NUL-terminated string. Release with `zim_query_free`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_query_new(query_str: *const c_char) -> *mut CQuery {
    guard(ptr::null_mut(), "zim_query_new", || {
        let query = unsafe { cstr_arg(query_str, "query") }?;
        Ok(into_handle(CQuery {
            query: Query::new(query),
        }))
    })
}

/// # Safety
///
/// `query` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_query_free(query: *mut CQuery) {
    unsafe { free_handle(query) }
}

/// Null when the archive has no full-text index.
///
/// # Safety
///
/// `archive` must be null or a live archive handle. The searcher keeps the
/// archive open on its own.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_searcher_new(archive: *const CArchive) -> *mut CSearcher {
    guard(ptr::null_mut(), "zim_searcher_new", || {
        let handle = unsafe { handle_ref(archive, "archive") }?;
        let searcher = Searcher::new(&handle.archive)?;
        Ok(into_handle(CSearcher { searcher }))
    })
}

/// # Safety
///
/// `searcher` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_searcher_free(searcher: *mut CSearcher) {
    unsafe { free_handle(searcher) }
}

/// # Safety
///
/// Both handles must be null or live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_searcher_search(searcher: *const CSearcher, query: *const CQuery) -> *mut CSearch {
    guard(ptr::null_mut(), "zim_searcher_search", || {
        let searcher = unsafe { handle_ref(searcher, "searcher") }?;
        let query = unsafe { handle_ref(query, "query") }?;
        let search = searcher.searcher.search(&query.query)?;
        Ok(into_handle(CSearch { search }))
    })
}

/// # Safety
///
/// `search` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_free(search: *mut CSearch) {
    unsafe { free_handle(search) }
}

/// # Safety
///
/// `search` must be null or a live search handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_get_estimated_matches(search: *const CSearch) -> c_int {
    guard(0, "zim_search_get_estimated_matches", || {
        Ok(clamp_count(unsafe { handle_ref(search, "search") }?.search.estimated_matches()))
    })
}

/// Page `[start, start + max_results)`; negative values read as 0.
///
/// # Safety
///
/// `search` must be null or a live search handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_get_results(
    search: *const CSearch,
    start: c_int,
    max_results: c_int,
) -> *mut CSearchResultSet {
    guard(ptr::null_mut(), "zim_search_get_results", || {
        let handle = unsafe { handle_ref(search, "search") }?;
        let results = handle.search.results(clamp_window(start), clamp_window(max_results));
        Ok(into_handle(CSearchResultSet { results }))
    })
}

/// # Safety
///
/// `set` must be null or a handle not freed yet. Iterators taken from it stay usable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_result_set_free(set: *mut CSearchResultSet) {
    unsafe { free_handle(set) }
}

/// # Safety
///
/// `set` must be null or a live result set handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_result_set_get_size(set: *const CSearchResultSet) -> c_int {
    guard(0, "zim_search_result_set_get_size", || {
        Ok(clamp_count(unsafe { handle_ref(set, "result set") }?.results.size()))
    })
}

// ============================================================================
// Search iterator
// ============================================================================

/// # Safety
///
/// `set` must be null or a live result set handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_result_set_begin(set: *const CSearchResultSet) -> *mut CSearchIterator {
    guard(ptr::null_mut(), "zim_search_result_set_begin", || {
        let cursor = unsafe { handle_ref(set, "result set") }?.results.begin();
        Ok(into_handle(CSearchIterator { cursor }))
    })
}

/// # Safety
///
/// `set` must be null or a live result set handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_result_set_end(set: *const CSearchResultSet) -> *mut CSearchIterator {
    guard(ptr::null_mut(), "zim_search_result_set_end", || {
        let cursor = unsafe { handle_ref(set, "result set") }?.results.end();
        Ok(into_handle(CSearchIterator { cursor }))
    })
}

/// # Safety
///
/// `it` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_iterator_free(it: *mut CSearchIterator) {
    unsafe { free_handle(it) }
}

/// True when both cursors walk the same set at the same position.
/// A null cursor never compares equal, not even to another null.
///
/// # Safety
///
/// Each argument must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_iterator_equal(a: *const CSearchIterator, b: *const CSearchIterator) -> bool {
    guard(false, "zim_search_iterator_equal", || {
        let a = unsafe { handle_ref(a, "iterator") }?;
        let b = unsafe { handle_ref(b, "iterator") }?;
        Ok(a.cursor == b.cursor)
    })
}

/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_iterator_next(it: *mut CSearchIterator) {
    guard_void("zim_search_iterator_next", || {
        unsafe { handle_mut(it, "iterator") }?.cursor.advance();
        Ok(())
    })
}

/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_iterator_get_path(it: *const CSearchIterator) -> *mut c_char {
    guard(ptr::null_mut(), "zim_search_iterator_get_path", || {
        let handle = unsafe { handle_ref(it, "iterator") }?;
        Ok(handle.cursor.path().map(into_c_string).unwrap_or(ptr::null_mut()))
    })
}

/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_iterator_get_title(it: *const CSearchIterator) -> *mut c_char {
    guard(ptr::null_mut(), "zim_search_iterator_get_title", || {
        let handle = unsafe { handle_ref(it, "iterator") }?;
        Ok(handle.cursor.title().map(into_c_string).unwrap_or(ptr::null_mut()))
    })
}

/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_iterator_get_snippet(it: *const CSearchIterator) -> *mut c_char {
    guard(ptr::null_mut(), "zim_search_iterator_get_snippet", || {
        let handle = unsafe { handle_ref(it, "iterator") }?;
        Ok(handle.cursor.snippet().map(into_c_string).unwrap_or(ptr::null_mut()))
    })
}

/// Relevance in percent of the best match; 0 at the end.
///
/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_iterator_get_score(it: *const CSearchIterator) -> c_int {
    guard(0, "zim_search_iterator_get_score", || {
        Ok(unsafe { handle_ref(it, "iterator") }?.cursor.score().unwrap_or(0))
    })
}

/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_search_iterator_get_word_count(it: *const CSearchIterator) -> c_int {
    guard(0, "zim_search_iterator_get_word_count", || {
        let words = unsafe { handle_ref(it, "iterator") }?.cursor.word_count().unwrap_or(0);
        Ok(clamp_count(words as usize))
    })
}

// ============================================================================
// Suggestions
// ============================================================================

/// # Safety
///
/// `archive` must be null or a live archive handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_searcher_new(archive: *const CArchive) -> *mut CSuggestionSearcher {
    guard(ptr::null_mut(), "zim_suggestion_searcher_new", || {
        let handle = unsafe { handle_ref(archive, "archive") }?;
        Ok(into_handle(CSuggestionSearcher {
            searcher: SuggestionSearcher::new(&handle.archive),
        }))
    })
}

/// # Safety
///
/// `searcher` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_searcher_free(searcher: *mut CSuggestionSearcher) {
    unsafe { free_handle(searcher) }
}

/// # Safety
///
/// `searcher` must be null or a live suggestion searcher handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_searcher_set_verbose(searcher: *mut CSuggestionSearcher, verbose: bool) {
    guard_void("zim_suggestion_searcher_set_verbose", || {
        unsafe { handle_mut(searcher, "suggestion searcher") }?
            .searcher
            .set_verbose(verbose);
        Ok(())
    })
}

/// # Safety
///
/// `searcher` must be null or a live handle; `query` a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_searcher_suggest(
    searcher: *const CSuggestionSearcher,
    query: *const c_char,
) -> *mut CSuggestionSearch {
    guard(ptr::null_mut(), "zim_suggestion_searcher_suggest", || {
        let handle = unsafe { handle_ref(searcher, "suggestion searcher") }?;
        let query = unsafe { cstr_arg(query, "query") }?;
        let search = handle.searcher.suggest(query)?;
        Ok(into_handle(CSuggestionSearch { search }))
    })
}

/// # Safety
///
/// `search` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_search_free(search: *mut CSuggestionSearch) {
    unsafe { free_handle(search) }
}

/// # Safety
///
/// `search` must be null or a live suggestion search handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_search_get_estimated_matches(search: *const CSuggestionSearch) -> c_int {
    guard(0, "zim_suggestion_search_get_estimated_matches", || {
        Ok(clamp_count(
            unsafe { handle_ref(search, "suggestion search") }?.search.estimated_matches(),
        ))
    })
}

/// # Safety
///
/// `search` must be null or a live suggestion search handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_search_get_results(
    search: *const CSuggestionSearch,
    start: c_int,
    max_results: c_int,
) -> *mut CSuggestionResultSet {
    guard(ptr::null_mut(), "zim_suggestion_search_get_results", || {
        let handle = unsafe { handle_ref(search, "suggestion search") }?;
        let results = handle.search.results(clamp_window(start), clamp_window(max_results));
        Ok(into_handle(CSuggestionResultSet { results }))
    })
}

/// # Safety
///
/// `set` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_result_set_free(set: *mut CSuggestionResultSet) {
    unsafe { free_handle(set) }
}

/// # Safety
///
/// `set` must be null or a live result set handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_result_set_get_size(set: *const CSuggestionResultSet) -> c_int {
    guard(0, "zim_suggestion_result_set_get_size", || {
        Ok(clamp_count(unsafe { handle_ref(set, "result set") }?.results.size()))
    })
}

/// # Safety
///
/// `set` must be null or a live result set handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_result_set_begin(set: *const CSuggestionResultSet) -> *mut CSuggestionIterator {
    guard(ptr::null_mut(), "zim_suggestion_result_set_begin", || {
        let cursor = unsafe { handle_ref(set, "result set") }?.results.begin();
        Ok(into_handle(CSuggestionIterator { cursor }))
    })
}

/// # Safety
///
/// `set` must be null or a live result set handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_result_set_end(set: *const CSuggestionResultSet) -> *mut CSuggestionIterator {
    guard(ptr::null_mut(), "zim_suggestion_result_set_end", || {
        let cursor = unsafe { handle_ref(set, "result set") }?.results.end();
        Ok(into_handle(CSuggestionIterator { cursor }))
    })
}

/// # Safety
///
/// `it` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_iterator_free(it: *mut CSuggestionIterator) {
    unsafe { free_handle(it) }
}

/// Two null cursors compare equal; null against a live cursor does not.
///
/// # Safety
///
/// Each argument must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_iterator_equal(
    a: *const CSuggestionIterator,
    b: *const CSuggestionIterator,
) -> bool {
    guard(false, "zim_suggestion_iterator_equal", || {
        match unsafe { (a.as_ref(), b.as_ref()) } {
            (None, None) => Ok(true),
            (Some(a), Some(b)) => Ok(a.cursor == b.cursor),
            _ => Ok(false),
        }
    })
}

/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_iterator_next(it: *mut CSuggestionIterator) {
    guard_void("zim_suggestion_iterator_next", || {
        unsafe { handle_mut(it, "iterator") }?.cursor.advance();
        Ok(())
    })
}

/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_iterator_get_path(it: *const CSuggestionIterator) -> *mut c_char {
    guard(ptr::null_mut(), "zim_suggestion_iterator_get_path", || {
        let handle = unsafe { handle_ref(it, "iterator") }?;
        Ok(handle.cursor.path().map(into_c_string).unwrap_or(ptr::null_mut()))
    })
}

/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_iterator_get_title(it: *const CSuggestionIterator) -> *mut c_char {
    guard(ptr::null_mut(), "zim_suggestion_iterator_get_title", || {
        let handle = unsafe { handle_ref(it, "iterator") }?;
        Ok(handle.cursor.title().map(into_c_string).unwrap_or(ptr::null_mut()))
    })
}

/// Highlighted title; an empty string when the record has no snippet, null at the end.
///
/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_iterator_get_snippet(it: *const CSuggestionIterator) -> *mut c_char {
    guard(ptr::null_mut(), "zim_suggestion_iterator_get_snippet", || {
        let handle = unsafe { handle_ref(it, "iterator") }?;
        if handle.cursor.is_end() {
            return Ok(ptr::null_mut());
        }
        Ok(into_c_string(handle.cursor.snippet().unwrap_or_default()))
    })
}

/// # Safety
///
/// `it` must be null or a live iterator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_suggestion_iterator_has_snippet(it: *const CSuggestionIterator) -> bool {
    guard(false, "zim_suggestion_iterator_has_snippet", || {
        Ok(unsafe { handle_ref(it, "iterator") }?.cursor.has_snippet())
    })
}
