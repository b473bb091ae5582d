//! Archive, entry and item handles
use super::marshal::*;
use crate::archive::{Archive, Entry, Item};
use std::os::raw::c_char;
use std::ptr;

#[repr(C)]
pub struct CArchive {
    pub(crate) archive: Archive,
}

#[repr(C)]
pub struct CEntry {
    entry: Entry,
}

#[repr(C)]
pub struct CItem {
    item: Item,
}

// ============================================================================
// Archive
// ============================================================================

/// Open an archive. Returns null if the file is missing or malformed.
///
/// # Safety
///
/// `path` must be a NUL-terminated string or null. The handle must be released
/// with `zim_archive_free`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_new(path: *const c_char) -> *mut CArchive {
    guard(ptr::null_mut(), "zim_archive_new", || {
        let path = unsafe { cstr_arg(path, "path") }?;
        let archive = Archive::open(path)?;
        Ok(into_handle(CArchive { archive }))
    })
}

/// # Safety
///
/// `archive` must be null or a handle from `zim_archive_new` not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_free(archive: *mut CArchive) {
    unsafe { free_handle(archive) }
}

/// # Safety
///
/// `archive` must be null or a live archive handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_get_entry_count(archive: *const CArchive) -> u64 {
    guard(0, "zim_archive_get_entry_count", || {
        Ok(unsafe { handle_ref(archive, "archive") }?.archive.entry_count())
    })
}

/// # Safety
///
/// `archive` must be null or a live archive handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_get_article_count(archive: *const CArchive) -> u64 {
    guard(0, "zim_archive_get_article_count", || {
        Ok(unsafe { handle_ref(archive, "archive") }?.archive.article_count())
    })
}

/// Archive uuid; release with `zim_free_string`.
///
/// # Safety
///
/// `archive` must be null or a live archive handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_get_uuid(archive: *const CArchive) -> *mut c_char {
    guard(ptr::null_mut(), "zim_archive_get_uuid", || {
        let handle = unsafe { handle_ref(archive, "archive") }?;
        Ok(into_c_string(handle.archive.uuid()))
    })
}

/// # Safety
///
/// `archive` must be a live handle and `path` a NUL-terminated string (either may be null).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_has_entry_by_path(archive: *const CArchive, path: *const c_char) -> bool {
    guard(false, "zim_archive_has_entry_by_path", || {
        let handle = unsafe { handle_ref(archive, "archive") }?;
        let path = unsafe { cstr_arg(path, "path") }?;
        Ok(handle.archive.has_entry_by_path(path))
    })
}

/// Returns null when no entry has this path.
///
/// # Safety
///
/// `archive` must be a live handle and `path` a NUL-terminated string (either may be null).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_get_entry_by_path(archive: *const CArchive, path: *const c_char) -> *mut CEntry {
    guard(ptr::null_mut(), "zim_archive_get_entry_by_path", || {
        let handle = unsafe { handle_ref(archive, "archive") }?;
        let path = unsafe { cstr_arg(path, "path") }?;
        let entry = handle.archive.entry_by_path(path)?;
        Ok(into_handle(CEntry { entry }))
    })
}

/// Returns null when the archive declares no main entry.
///
/// # Safety
///
/// `archive` must be null or a live archive handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_get_main_entry(archive: *const CArchive) -> *mut CEntry {
    guard(ptr::null_mut(), "zim_archive_get_main_entry", || {
        let handle = unsafe { handle_ref(archive, "archive") }?;
        let entry = handle.archive.main_entry()?;
        Ok(into_handle(CEntry { entry }))
    })
}

/// Entry at `idx` in path order; null when out of range.
///
/// # Safety
///
/// `archive` must be null or a live archive handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_get_entry_by_index(archive: *const CArchive, idx: u32) -> *mut CEntry {
    guard(ptr::null_mut(), "zim_archive_get_entry_by_index", || {
        let handle = unsafe { handle_ref(archive, "archive") }?;
        let entry = handle.archive.entry_by_index(idx)?;
        Ok(into_handle(CEntry { entry }))
    })
}

/// # Safety
///
/// `archive` must be null or a live archive handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_has_fulltext_index(archive: *const CArchive) -> bool {
    guard(false, "zim_archive_has_fulltext_index", || {
        Ok(unsafe { handle_ref(archive, "archive") }?.archive.has_fulltext_index())
    })
}

/// Metadata value as an owned buffer; release with `zim_free_buffer(ptr, *size)`.
/// Returns null and sets `*size = 0` when the name is unknown.
///
/// # Safety
///
/// `archive` must be a live handle, `name` a NUL-terminated string and `size`
/// null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_get_metadata(
    archive: *const CArchive,
    name: *const c_char,
    size: *mut u64,
) -> *mut c_char {
    unsafe { clear_size(size) };
    guard(ptr::null_mut(), "zim_archive_get_metadata", || {
        let handle = unsafe { handle_ref(archive, "archive") }?;
        let name = unsafe { cstr_arg(name, "name") }?;
        let data = handle.archive.metadata(name)?;
        Ok(unsafe { into_buffer(data, size) })
    })
}

/// Recompute the checksum and decode every cluster.
///
/// # Safety
///
/// `archive` must be null or a live archive handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_archive_check_integrity(archive: *const CArchive) -> bool {
    guard(false, "zim_archive_check_integrity", || {
        unsafe { handle_ref(archive, "archive") }?.archive.check_integrity()
    })
}

// ============================================================================
// Entry
// ============================================================================

/// # Safety
///
/// `entry` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_entry_free(entry: *mut CEntry) {
    unsafe { free_handle(entry) }
}

/// # Safety
///
/// `entry` must be null or a live entry handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_entry_is_redirect(entry: *const CEntry) -> bool {
    guard(false, "zim_entry_is_redirect", || {
        Ok(unsafe { handle_ref(entry, "entry") }?.entry.is_redirect())
    })
}

/// # Safety
///
/// `entry` must be null or a live entry handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_entry_get_path(entry: *const CEntry) -> *mut c_char {
    guard(ptr::null_mut(), "zim_entry_get_path", || {
        Ok(into_c_string(unsafe { handle_ref(entry, "entry") }?.entry.path()))
    })
}

/// # Safety
///
/// `entry` must be null or a live entry handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_entry_get_title(entry: *const CEntry) -> *mut c_char {
    guard(ptr::null_mut(), "zim_entry_get_title", || {
        Ok(into_c_string(unsafe { handle_ref(entry, "entry") }?.entry.title()))
    })
}

/// Resolve to an item. With `follow` false a redirect entry yields null.
///
/// # Safety
///
/// `entry` must be null or a live entry handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_entry_get_item(entry: *const CEntry, follow: bool) -> *mut CItem {
    guard(ptr::null_mut(), "zim_entry_get_item", || {
        let handle = unsafe { handle_ref(entry, "entry") }?;
        let item = handle.entry.item(follow)?;
        Ok(into_handle(CItem { item }))
    })
}

// ============================================================================
// Item
// ============================================================================

/// # Safety
///
/// `item` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_item_free(item: *mut CItem) {
    unsafe { free_handle(item) }
}

/// # Safety
///
/// `item` must be null or a live item handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_item_get_path(item: *const CItem) -> *mut c_char {
    guard(ptr::null_mut(), "zim_item_get_path", || {
        Ok(into_c_string(unsafe { handle_ref(item, "item") }?.item.path()))
    })
}

/// # Safety
///
/// `item` must be null or a live item handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_item_get_title(item: *const CItem) -> *mut c_char {
    guard(ptr::null_mut(), "zim_item_get_title", || {
        Ok(into_c_string(unsafe { handle_ref(item, "item") }?.item.title()))
    })
}

/// # Safety
///
/// `item` must be null or a live item handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_item_get_mimetype(item: *const CItem) -> *mut c_char {
    guard(ptr::null_mut(), "zim_item_get_mimetype", || {
        Ok(into_c_string(unsafe { handle_ref(item, "item") }?.item.mimetype()))
    })
}

/// # Safety
///
/// `item` must be null or a live item handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_item_get_size(item: *const CItem) -> u64 {
    guard(0, "zim_item_get_size", || Ok(unsafe { handle_ref(item, "item") }?.item.size()))
}

/// Full content as an owned buffer; release with `zim_free_buffer(ptr, *size)`.
///
/// # Safety
///
/// `item` must be null or a live item handle; `size` null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_item_get_data(item: *const CItem, size: *mut u64) -> *mut c_char {
    unsafe { clear_size(size) };
    guard(ptr::null_mut(), "zim_item_get_data", || {
        let handle = unsafe { handle_ref(item, "item") }?;
        let data = handle.item.data()?;
        Ok(unsafe { into_buffer(data, size) })
    })
}
