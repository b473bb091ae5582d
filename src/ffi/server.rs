//! Server control handle
use super::library::CLibrary;
use super::marshal::*;
use crate::server::Server;
use std::os::raw::c_int;
use std::ptr;
use std::sync::Arc;

/// Holds its own library reference
#[repr(C)]
pub struct CServer {
    server: Server,
}

/// # Safety
///
/// `lib` must be null or a live library handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_server_new(lib: *const CLibrary) -> *mut CServer {
    guard(ptr::null_mut(), "kiwix_server_new", || {
        let handle = unsafe { handle_ref(lib, "library") }?;
        Ok(into_handle(CServer {
            server: Server::new(Arc::clone(&handle.library)),
        }))
    })
}

/// Stops a running server before releasing it.
///
/// # Safety
///
/// `server` must be null or a handle not freed yet. Must not be called from
/// inside an async runtime.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_server_free(server: *mut CServer) {
    guard_void("kiwix_server_free", || {
        unsafe { free_handle(server) };
        Ok(())
    })
}

/// Port 0 asks for an ephemeral port; read it back with `kiwix_server_get_port`.
///
/// # Safety
///
/// `server` must be null or a live server handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_server_set_port(server: *mut CServer, port: c_int) {
    guard_void("kiwix_server_set_port", || {
        let port = u16::try_from(port).map_err(|_| anyhow::anyhow!("Port {} is out of range", port))?;
        unsafe { handle_mut(server, "server") }?.server.set_port(port)
    })
}

/// # Safety
///
/// `server` must be null or a live server handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_server_set_block_external_links(server: *mut CServer, block: bool) {
    guard_void("kiwix_server_set_block_external_links", || {
        unsafe { handle_mut(server, "server") }?
            .server
            .set_block_external_links(block)
    })
}

/// False when the socket cannot be bound or the server already runs.
///
/// # Safety
///
/// `server` must be null or a live server handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_server_start(server: *mut CServer) -> bool {
    guard(false, "kiwix_server_start", || {
        unsafe { handle_mut(server, "server") }?.server.start()?;
        Ok(true)
    })
}

/// Blocks until the socket is closed and in-flight requests are done. Idempotent.
///
/// # Safety
///
/// `server` must be null or a live server handle. Must not be called from
/// inside an async runtime.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_server_stop(server: *mut CServer) {
    guard_void("kiwix_server_stop", || {
        unsafe { handle_mut(server, "server") }?.server.stop();
        Ok(())
    })
}

/// # Safety
///
/// `server` must be null or a live server handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_server_is_running(server: *const CServer) -> bool {
    guard(false, "kiwix_server_is_running", || {
        Ok(unsafe { handle_ref(server, "server") }?.server.is_running())
    })
}

/// Bound port while running, the configured port otherwise
///
/// # Safety
///
/// `server` must be null or a live server handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiwix_server_get_port(server: *const CServer) -> c_int {
    guard(0, "kiwix_server_get_port", || {
        Ok(c_int::from(unsafe { handle_ref(server, "server") }?.server.port()))
    })
}
