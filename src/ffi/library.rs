//! Catalog handles: library, manager and book snapshots
use super::marshal::*;
use crate::library::{Book, Library};
use crate::manager::Manager;
use std::os::raw::{c_char, c_uint};
use std::ptr;
use std::sync::Arc;

#[repr(C)]
pub struct CLibrary {
    pub(crate) library: Arc<Library>,
}

/// Holds its own library reference
#[repr(C)]
pub struct CManager {
    manager: Manager,
}

/// Value snapshot; later catalog changes do not affect it
#[repr(C)]
pub struct CBook {
    book: Book,
}

// ============================================================================
// Library
// ============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn kiwix_library_new() -> *mut CLibrary {
    guard(ptr::null_mut(), "kiwix_library_new", || {
        Ok(into_handle(CLibrary {
            library: Library::create(),
        }))
    })
}

/// Drops this handle's reference; managers and servers keep theirs.
///
/// # Safety
///
/// `lib` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_library_free(lib: *mut CLibrary) {
    unsafe { free_handle(lib) }
}

/// # Safety
///
/// `lib` must be null or a live library handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_library_get_book_count(lib: *const CLibrary, local: bool, remote: bool) -> c_uint {
    guard(0, "kiwix_library_get_book_count", || {
        let count = unsafe { handle_ref(lib, "library") }?.library.book_count(local, remote);
        Ok(count.min(c_uint::MAX as usize) as c_uint)
    })
}

/// A fresh snapshot on every call; each must be released with `kiwix_book_free`.
///
/// # Safety
///
/// `lib` must be null or a live handle; `id` a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_library_get_book_by_id(lib: *const CLibrary, id: *const c_char) -> *mut CBook {
    guard(ptr::null_mut(), "kiwix_library_get_book_by_id", || {
        let handle = unsafe { handle_ref(lib, "library") }?;
        let id = unsafe { cstr_arg(id, "id") }?;
        let Some(book) = handle.library.book_by_id(id) else {
            anyhow::bail!("Book not found: {}", id);
        };
        Ok(into_handle(CBook { book }))
    })
}

// ============================================================================
// Manager
// ============================================================================

/// # Safety
///
/// `lib` must be null or a live library handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_manager_new(lib: *const CLibrary) -> *mut CManager {
    guard(ptr::null_mut(), "kiwix_manager_new", || {
        let handle = unsafe { handle_ref(lib, "library") }?;
        Ok(into_handle(CManager {
            manager: Manager::new(Arc::clone(&handle.library)),
        }))
    })
}

/// # Safety
///
/// `mgr` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_manager_free(mgr: *mut CManager) {
    unsafe { free_handle(mgr) }
}

/// # Safety
///
/// `mgr` must be null or a live handle; `path` a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_manager_add_book_from_path(mgr: *const CManager, path: *const c_char) -> bool {
    guard(false, "kiwix_manager_add_book_from_path", || {
        let handle = unsafe { handle_ref(mgr, "manager") }?;
        let path = unsafe { cstr_arg(path, "path") }?;
        handle.manager.add_book_from_path(path)?;
        Ok(true)
    })
}

/// Recursive scan for `.zim` files. Failures are skipped silently.
///
/// # Safety
///
/// `mgr` must be null or a live handle; `dir_path` a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_manager_add_books_from_directory(mgr: *const CManager, dir_path: *const c_char) {
    guard_void("kiwix_manager_add_books_from_directory", || {
        let handle = unsafe { handle_ref(mgr, "manager") }?;
        let dir_path = unsafe { cstr_arg(dir_path, "dir_path") }?;
        let added = handle.manager.add_books_from_directory(dir_path);
        log::debug!("[ffi] Added {} books from {}", added, dir_path);
        Ok(())
    })
}

// ============================================================================
// Book
// ============================================================================

/// # Safety
///
/// `book` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_book_free(book: *mut CBook) {
    unsafe { free_handle(book) }
}

/// Shared body of the string accessors
unsafe fn book_string(book: *const CBook, what: &str, field: impl FnOnce(&Book) -> &str) -> *mut c_char {
    guard(ptr::null_mut(), what, || {
        let handle = unsafe { handle_ref(book, "book") }?;
        Ok(into_c_string(field(&handle.book)))
    })
}

/// # Safety
///
/// `book` must be null or a live book handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_book_get_id(book: *const CBook) -> *mut c_char {
    unsafe { book_string(book, "kiwix_book_get_id", |b| &b.id) }
}

/// # Safety
///
/// `book` must be null or a live book handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_book_get_title(book: *const CBook) -> *mut c_char {
    unsafe { book_string(book, "kiwix_book_get_title", |b| &b.title) }
}

/// # Safety
///
/// `book` must be null or a live book handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_book_get_description(book: *const CBook) -> *mut c_char {
    unsafe { book_string(book, "kiwix_book_get_description", |b| &b.description) }
}

/// # Safety
///
/// `book` must be null or a live book handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_book_get_path(book: *const CBook) -> *mut c_char {
    unsafe { book_string(book, "kiwix_book_get_path", |b| &b.path) }
}

/// # Safety
///
/// `book` must be null or a live book handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_book_get_language(book: *const CBook) -> *mut c_char {
    unsafe { book_string(book, "kiwix_book_get_language", |b| &b.language) }
}

/// # Safety
///
/// `book` must be null or a live book handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_book_get_name(book: *const CBook) -> *mut c_char {
    unsafe { book_string(book, "kiwix_book_get_name", |b| &b.name) }
}

/// # Safety
///
/// `book` must be null or a live book handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_book_get_article_count(book: *const CBook) -> u64 {
    guard(0, "kiwix_book_get_article_count", || {
        Ok(unsafe { handle_ref(book, "book") }?.book.article_count)
    })
}

/// Archive file size in bytes
///
/// # Safety
///
/// `book` must be null or a live book handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_book_get_size(book: *const CBook) -> u64 {
    guard(0, "kiwix_book_get_size", || Ok(unsafe { handle_ref(book, "book") }?.book.size))
}
