//! Sentinel conversion, handle boxing and string/buffer ownership transfer
use anyhow::{Context, Result};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Run `f`, turning errors and panics into `sentinel`
pub(crate) fn guard<T>(sentinel: T, what: &str, f: impl FnOnce() -> Result<T>) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            log::debug!("[ffi] {} failed: {:#}", what, e);
            sentinel
        }
        Err(_) => {
            log::debug!("[ffi] {} panicked", what);
            sentinel
        }
    }
}

/// Like `guard` for calls that return nothing
pub(crate) fn guard_void(what: &str, f: impl FnOnce() -> Result<()>) {
    guard((), what, f)
}

pub(crate) fn into_handle<T>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

/// Release a boxed handle; null is a no-op
///
/// # Safety
///
/// `ptr` must be null or come from `into_handle` and not be freed yet.
pub(crate) unsafe fn free_handle<T>(ptr: *mut T) {
    if !ptr.is_null() {
        drop(unsafe { Box::from_raw(ptr) });
    }
}

/// # Safety
///
/// `ptr` must be null or a live handle of type `T`.
pub(crate) unsafe fn handle_ref<'a, T>(ptr: *const T, name: &str) -> Result<&'a T> {
    match unsafe { ptr.as_ref() } {
        Some(handle) => Ok(handle),
        None => anyhow::bail!("{} handle is null", name),
    }
}

/// # Safety
///
/// `ptr` must be null or a live handle of type `T` not aliased elsewhere.
pub(crate) unsafe fn handle_mut<'a, T>(ptr: *mut T, name: &str) -> Result<&'a mut T> {
    match unsafe { ptr.as_mut() } {
        Some(handle) => Ok(handle),
        None => anyhow::bail!("{} handle is null", name),
    }
}

/// # Safety
///
/// `ptr` must be null or a NUL-terminated string valid for the call.
pub(crate) unsafe fn cstr_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str> {
    if ptr.is_null() {
        anyhow::bail!("{} is null", name);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .with_context(|| format!("{} is not valid UTF-8", name))
}

/// Optional string argument; null reads as empty
///
/// # Safety
///
/// Same as `cstr_arg`.
pub(crate) unsafe fn cstr_or_empty<'a>(ptr: *const c_char, name: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Ok("");
    }
    unsafe { cstr_arg(ptr, name) }
}

/// # Safety
///
/// `ptr` must be null (only when `len` is 0) or valid for `len` bytes.
pub(crate) unsafe fn bytes_arg<'a>(ptr: *const c_char, len: u64, name: &str) -> Result<&'a [u8]> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        anyhow::bail!("{} is null but its length is {}", name, len);
    }
    let len = usize::try_from(len).with_context(|| format!("{} is too large", name))?;
    Ok(unsafe { std::slice::from_raw_parts(ptr as *const u8, len) })
}

/// Owned NUL-terminated copy; interior NULs are dropped
pub(crate) fn into_c_string(s: &str) -> *mut c_char {
    let owned = if s.contains('\0') { s.replace('\0', "") } else { s.to_string() };
    match CString::new(owned) {
        Ok(c) => c.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Owned byte buffer; length goes to `*size`
///
/// # Safety
///
/// `size` must be null or writable.
pub(crate) unsafe fn into_buffer(data: Vec<u8>, size: *mut u64) -> *mut c_char {
    let boxed = data.into_boxed_slice();
    if !size.is_null() {
        unsafe { *size = boxed.len() as u64 };
    }
    Box::into_raw(boxed) as *mut u8 as *mut c_char
}

/// Zero `*size` before a buffer-returning call can fail
///
/// # Safety
///
/// `size` must be null or writable.
pub(crate) unsafe fn clear_size(size: *mut u64) {
    if !size.is_null() {
        unsafe { *size = 0 };
    }
}

pub(crate) fn clamp_count(n: usize) -> i32 {
    n.min(i32::MAX as usize) as i32
}

pub(crate) fn clamp_window(value: i32) -> usize {
    value.max(0) as usize
}

// ============================================================================
// Release of returned strings and buffers
// ============================================================================

/// Release a string returned by any `*_get_*` accessor.
///
/// # Safety
///
/// `s` must be null or a pointer returned by this library and not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Release a buffer returned by `zim_item_get_data` or `zim_archive_get_metadata`.
///
/// # Safety
///
/// `ptr` must be null or a buffer returned by this library, and `len` the size
/// reported alongside it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zim_free_buffer(ptr: *mut c_char, len: u64) {
    if ptr.is_null() {
        return;
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr as *mut u8, len as usize);
    drop(unsafe { Box::from_raw(slice) });
}
