//! Authoring handles: creator and writer items
use super::marshal::*;
use crate::archive_format::Compression;
use crate::creator::{Creator, WriterItem};
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;
use std::sync::Arc;

#[repr(C)]
pub struct CCreator {
    creator: Creator,
}

/// Shared with the creator on add; the caller still frees its handle once
#[repr(C)]
pub struct CWriterItem {
    item: Arc<WriterItem>,
}

// ============================================================================
// Creator
// ============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn zim_creator_new() -> *mut CCreator {
    guard(ptr::null_mut(), "zim_creator_new", || {
        Ok(into_handle(CCreator {
            creator: Creator::new(),
        }))
    })
}

/// Dropping an unfinished creator waits for its worker; the partial file is left as is.
///
/// # Safety
///
/// `creator` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_free(creator: *mut CCreator) {
    unsafe { free_handle(creator) }
}

/// # Safety
///
/// `creator` must be null or a live creator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_config_verbose(creator: *mut CCreator, verbose: bool) {
    guard_void("zim_creator_config_verbose", || {
        unsafe { handle_mut(creator, "creator") }?.creator.config_verbose(verbose)
    })
}

/// `1` = none, `5` = zstd. Other codes are ignored.
///
/// # Safety
///
/// `creator` must be null or a live creator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_config_compression(creator: *mut CCreator, compression: c_int) {
    guard_void("zim_creator_config_compression", || {
        let handle = unsafe { handle_mut(creator, "creator") }?;
        match Compression::from_code(compression) {
            Some(compression) => handle.creator.config_compression(compression),
            None => {
                log::warn!("[ffi] Ignoring unknown compression code {}", compression);
                Ok(())
            }
        }
    })
}

/// # Safety
///
/// `creator` must be null or a live creator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_config_indexing(creator: *mut CCreator, indexing: bool) {
    guard_void("zim_creator_config_indexing", || {
        unsafe { handle_mut(creator, "creator") }?.creator.config_indexing(indexing)
    })
}

/// # Safety
///
/// `creator` must be null or a live creator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_config_cluster_size(creator: *mut CCreator, bytes: u64) {
    guard_void("zim_creator_config_cluster_size", || {
        let bytes = usize::try_from(bytes)?;
        unsafe { handle_mut(creator, "creator") }?.creator.config_cluster_size(bytes)
    })
}

/// False when the output cannot be created; the creator is unusable afterwards.
///
/// # Safety
///
/// `creator` must be null or a live handle; `filepath` a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_start_zim_creation(creator: *mut CCreator, filepath: *const c_char) -> bool {
    guard(false, "zim_creator_start_zim_creation", || {
        let handle = unsafe { handle_mut(creator, "creator") }?;
        let filepath = unsafe { cstr_arg(filepath, "filepath") }?;
        handle.creator.start_zim_creation(filepath)?;
        Ok(true)
    })
}

/// Queue an item. True means accepted, not yet written.
///
/// # Safety
///
/// Both handles must be null or live. `item` stays owned by the caller.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_add_item(creator: *mut CCreator, item: *const CWriterItem) -> bool {
    guard(false, "zim_creator_add_item", || {
        let handle = unsafe { handle_mut(creator, "creator") }?;
        let item = unsafe { handle_ref(item, "writer item") }?;
        handle.creator.add_item(Arc::clone(&item.item))?;
        Ok(true)
    })
}

/// # Safety
///
/// `creator` must be null or a live handle; `name` and `content` NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_add_metadata(
    creator: *mut CCreator,
    name: *const c_char,
    content: *const c_char,
) -> bool {
    guard(false, "zim_creator_add_metadata", || {
        let handle = unsafe { handle_mut(creator, "creator") }?;
        let name = unsafe { cstr_arg(name, "name") }?;
        let content = unsafe { cstr_or_empty(content, "content") }?;
        handle.creator.add_metadata(name, content)?;
        Ok(true)
    })
}

/// Store a square PNG illustration of `size` pixels.
///
/// # Safety
///
/// `creator` must be null or a live handle; `content` valid for `content_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_add_illustration(
    creator: *mut CCreator,
    size: c_uint,
    content: *const c_char,
    content_len: u64,
) -> bool {
    guard(false, "zim_creator_add_illustration", || {
        let handle = unsafe { handle_mut(creator, "creator") }?;
        let content = unsafe { bytes_arg(content, content_len, "content") }?;
        handle.creator.add_illustration(size, content)?;
        Ok(true)
    })
}

/// # Safety
///
/// `creator` must be null or a live handle; the strings NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_add_redirection(
    creator: *mut CCreator,
    path: *const c_char,
    title: *const c_char,
    target: *const c_char,
) -> bool {
    guard(false, "zim_creator_add_redirection", || {
        let handle = unsafe { handle_mut(creator, "creator") }?;
        let path = unsafe { cstr_arg(path, "path") }?;
        let title = unsafe { cstr_or_empty(title, "title") }?;
        let target = unsafe { cstr_arg(target, "target") }?;
        handle.creator.add_redirection(path, title, target)?;
        Ok(true)
    })
}

/// # Safety
///
/// `creator` must be null or a live handle; `main_path` a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_set_main_path(creator: *mut CCreator, main_path: *const c_char) -> bool {
    guard(false, "zim_creator_set_main_path", || {
        let handle = unsafe { handle_mut(creator, "creator") }?;
        let main_path = unsafe { cstr_arg(main_path, "main_path") }?;
        handle.creator.set_main_path(main_path)?;
        Ok(true)
    })
}

/// Wait for queued items and write the archive. Only success here means durable.
///
/// # Safety
///
/// `creator` must be null or a live creator handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_creator_finish_zim_creation(creator: *mut CCreator) -> bool {
    guard(false, "zim_creator_finish_zim_creation", || {
        unsafe { handle_mut(creator, "creator") }?.creator.finish_zim_creation()?;
        Ok(true)
    })
}

// ============================================================================
// Writer items
// ============================================================================

/// Item whose content is copied now. A null `title` reads as empty.
///
/// # Safety
///
/// `path` and `mimetype` must be NUL-terminated strings and `content` valid for
/// `content_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_writer_string_item_new(
    path: *const c_char,
    mimetype: *const c_char,
    title: *const c_char,
    content: *const c_char,
    content_len: u64,
    front_article: bool,
) -> *mut CWriterItem {
    guard(ptr::null_mut(), "zim_writer_string_item_new", || {
        let path = unsafe { cstr_arg(path, "path") }?;
        let mimetype = unsafe { cstr_arg(mimetype, "mimetype") }?;
        let title = unsafe { cstr_or_empty(title, "title") }?;
        let content = unsafe { bytes_arg(content, content_len, "content") }?;
        let item = WriterItem::string_item(path, mimetype, title, content, front_article);
        Ok(into_handle(CWriterItem { item: Arc::new(item) }))
    })
}

/// Item read from `filepath` when the archive is written. Null if the file is missing.
///
/// # Safety
///
/// The string arguments must be NUL-terminated (`title` may be null).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_writer_file_item_new(
    path: *const c_char,
    mimetype: *const c_char,
    title: *const c_char,
    filepath: *const c_char,
    front_article: bool,
) -> *mut CWriterItem {
    guard(ptr::null_mut(), "zim_writer_file_item_new", || {
        let path = unsafe { cstr_arg(path, "path") }?;
        let mimetype = unsafe { cstr_arg(mimetype, "mimetype") }?;
        let title = unsafe { cstr_or_empty(title, "title") }?;
        let filepath = unsafe { cstr_arg(filepath, "filepath") }?;
        let item = WriterItem::file_item(path, mimetype, title, filepath, front_article)?;
        Ok(into_handle(CWriterItem { item: Arc::new(item) }))
    })
}

/// # Safety
///
/// `item` must be null or a handle not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_writer_item_free(item: *mut CWriterItem) {
    unsafe { free_handle(item) }
}
